mod common;

use common::{setup_harness, test_client};
use miloapps_auth::services::bootstrap;
use miloapps_auth::types::internal::auth::LoginOutcome;

#[tokio::test]
async fn seeding_creates_roles_apps_and_admin() {
    let h = setup_harness().await;
    bootstrap::seed_defaults(&h.user_store, &h.role_store, &h.password_service)
        .await
        .expect("seeding should succeed");

    for role_name in ["admin", "user", "ALLMILO"] {
        assert!(
            h.role_store
                .find_role_by_name(role_name)
                .await
                .unwrap()
                .is_some(),
            "role {} should be seeded",
            role_name
        );
    }
    let allmilo = h
        .role_store
        .find_role_by_name("ALLMILO")
        .await
        .unwrap()
        .unwrap();
    assert!(allmilo.is_allmilo);

    for app_key in ["milosign", "contratacion", "presupuesto"] {
        let app = h
            .role_store
            .find_application_by_key(app_key)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("application {} should be seeded", app_key));
        let functionalities = h.role_store.list_functionalities(app.id).await.unwrap();
        let keys: Vec<&str> = functionalities.iter().map(|f| f.key.as_str()).collect();
        for fn_key in ["view", "create", "edit", "delete"] {
            assert!(keys.contains(&fn_key), "{}/{} should be seeded", app_key, fn_key);
        }
    }

    let admin = h
        .user_store
        .find_by_email("admin@miloapps.com")
        .await
        .unwrap()
        .expect("admin account should be seeded");
    assert_eq!(admin.username, "admin");
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let h = setup_harness().await;
    bootstrap::seed_defaults(&h.user_store, &h.role_store, &h.password_service)
        .await
        .unwrap();
    bootstrap::seed_defaults(&h.user_store, &h.role_store, &h.password_service)
        .await
        .expect("second run should not fail on existing rows");

    let roles = h.role_store.list_roles().await.unwrap();
    assert_eq!(
        roles.iter().filter(|r| r.name == "admin").count(),
        1,
        "admin role should not be duplicated"
    );
}

#[tokio::test]
async fn seeded_admin_can_log_in_and_holds_allmilo() {
    let h = setup_harness().await;
    bootstrap::seed_defaults(&h.user_store, &h.role_store, &h.password_service)
        .await
        .unwrap();

    let outcome = h
        .login_service
        .attempt_login("admin@miloapps.com", "admin123", None, &test_client())
        .await
        .expect("seeded admin credentials should work");
    let session = match outcome {
        LoginOutcome::Authenticated(session) => session,
        other => panic!("expected authenticated outcome, got {:?}", other),
    };

    let admin = h
        .session_service
        .authenticate(&session.token(), &test_client())
        .await
        .unwrap();
    let roles = h.permission_service.effective_roles(&admin).await.unwrap();
    assert!(roles.has_role("admin"));
    assert!(roles.has_allmilo());
    assert!(roles.has_functionality("milosign", "delete"));

    h.permission_service
        .require_role(&admin, "admin", &test_client())
        .await
        .expect("admin role check should pass");
}

#[tokio::test]
async fn seeded_admin_sessions_are_exclusive_end_to_end() {
    let h = setup_harness().await;
    bootstrap::seed_defaults(&h.user_store, &h.role_store, &h.password_service)
        .await
        .unwrap();

    let first = match h
        .login_service
        .attempt_login("admin@miloapps.com", "admin123", None, &test_client())
        .await
        .unwrap()
    {
        LoginOutcome::Authenticated(s) => s.token(),
        other => panic!("expected authenticated outcome, got {:?}", other),
    };
    let second = match h
        .login_service
        .attempt_login("admin@miloapps.com", "admin123", None, &test_client())
        .await
        .unwrap()
    {
        LoginOutcome::Authenticated(s) => s.token(),
        other => panic!("expected authenticated outcome, got {:?}", other),
    };

    assert!(h
        .session_service
        .authenticate(&second, &test_client())
        .await
        .is_ok());
    assert!(h
        .session_service
        .authenticate(&first, &test_client())
        .await
        .is_err());
}
