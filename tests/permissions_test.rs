mod common;

use common::{setup_harness, test_client, TestHarness};
use miloapps_auth::errors::AuthError;
use miloapps_auth::stores::FunctionalityGrantSpec;

/// Seed two applications with view/edit functionalities.
async fn seed_apps(h: &TestHarness) {
    for key in ["milosign", "contratacion"] {
        let app = h.role_store.create_application(key, key, None).await.unwrap();
        for fn_key in ["view", "edit"] {
            h.role_store
                .create_functionality(app.id, fn_key, fn_key, None)
                .await
                .unwrap();
        }
    }
}

fn grant(app: &str, func: &str) -> FunctionalityGrantSpec {
    FunctionalityGrantSpec {
        application_key: app.to_string(),
        functionality_key: func.to_string(),
    }
}

#[tokio::test]
async fn granular_grant_allows_only_that_functionality() {
    let h = setup_harness().await;
    seed_apps(&h).await;
    let user_id = h.create_user("alice@example.com", "pw").await;

    let viewer = h
        .role_store
        .create_role("viewer", "Viewer", None, false)
        .await
        .unwrap();
    h.role_store
        .replace_role_permissions(viewer.id, &[], &[grant("milosign", "view")])
        .await
        .unwrap();
    h.role_store
        .replace_user_roles(user_id, &[viewer.id], None)
        .await
        .unwrap();

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(roles.has_app_access("milosign"));
    assert!(roles.has_functionality("milosign", "view"));
    assert!(!roles.has_functionality("milosign", "edit"));
    assert!(!roles.has_app_access("contratacion"));
}

#[tokio::test]
async fn full_access_implies_every_functionality() {
    let h = setup_harness().await;
    seed_apps(&h).await;
    let user_id = h.create_user("bob@example.com", "pw").await;

    let editor = h
        .role_store
        .create_role("editor", "Editor", None, false)
        .await
        .unwrap();
    h.role_store
        .replace_role_permissions(editor.id, &["milosign".to_string()], &[])
        .await
        .unwrap();
    h.role_store
        .replace_user_roles(user_id, &[editor.id], None)
        .await
        .unwrap();

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(roles.has_functionality("milosign", "view"));
    assert!(roles.has_functionality("milosign", "edit"));
    assert!(!roles.has_functionality("contratacion", "view"));
}

#[tokio::test]
async fn allmilo_bypasses_every_check() {
    let h = setup_harness().await;
    seed_apps(&h).await;
    let user_id = h.create_user("carol@example.com", "pw").await;

    let superrole = h
        .role_store
        .create_role("ALLMILO", "All Milo", None, true)
        .await
        .unwrap();
    h.role_store
        .replace_user_roles(user_id, &[superrole.id], None)
        .await
        .unwrap();

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(roles.has_allmilo());
    assert!(roles.has_app_access("milosign"));
    assert!(roles.has_functionality("contratacion", "edit"));
    // Even for applications that were never configured.
    assert!(roles.has_functionality("not-a-real-app", "anything"));
}

#[tokio::test]
async fn permissions_are_additive_across_roles() {
    let h = setup_harness().await;
    seed_apps(&h).await;
    let user_id = h.create_user("dave@example.com", "pw").await;

    let signer = h
        .role_store
        .create_role("signer", "Signer", None, false)
        .await
        .unwrap();
    h.role_store
        .replace_role_permissions(signer.id, &[], &[grant("milosign", "view")])
        .await
        .unwrap();
    let contractor = h
        .role_store
        .create_role("contractor", "Contractor", None, false)
        .await
        .unwrap();
    h.role_store
        .replace_role_permissions(contractor.id, &[], &[grant("contratacion", "edit")])
        .await
        .unwrap();

    h.role_store
        .replace_user_roles(user_id, &[signer.id, contractor.id], None)
        .await
        .unwrap();

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    // Union of both roles, no deny anywhere.
    assert!(roles.has_functionality("milosign", "view"));
    assert!(roles.has_functionality("contratacion", "edit"));
    assert!(!roles.has_functionality("milosign", "edit"));
}

#[tokio::test]
async fn primary_role_counts_toward_the_effective_set() {
    let h = setup_harness().await;
    seed_apps(&h).await;

    let viewer = h
        .role_store
        .create_role("viewer", "Viewer", None, false)
        .await
        .unwrap();
    h.role_store
        .replace_role_permissions(viewer.id, &[], &[grant("milosign", "view")])
        .await
        .unwrap();

    let hash = h.password_service.hash("pw").unwrap();
    let user = h
        .user_store
        .create_user("erin@example.com", "erin", hash, "Erin", "Tester", Some(viewer.id))
        .await
        .unwrap();

    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(roles.has_role("viewer"));
    assert!(roles.has_functionality("milosign", "view"));
}

#[tokio::test]
async fn replacing_assignments_leaves_the_primary_role_alone() {
    let h = setup_harness().await;
    seed_apps(&h).await;

    let viewer = h
        .role_store
        .create_role("viewer", "Viewer", None, false)
        .await
        .unwrap();
    let editor = h
        .role_store
        .create_role("editor", "Editor", None, false)
        .await
        .unwrap();

    let hash = h.password_service.hash("pw").unwrap();
    let user = h
        .user_store
        .create_user("frank@example.com", "frank", hash, "Frank", "Tester", Some(viewer.id))
        .await
        .unwrap();

    h.role_store
        .replace_user_roles(user.id, &[editor.id], None)
        .await
        .unwrap();
    // Replace again with an empty set; the primary must survive.
    h.role_store
        .replace_user_roles(user.id, &[], None)
        .await
        .unwrap();

    let user = h.user_store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(user.role_id, Some(viewer.id));
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(roles.has_role("viewer"));
    assert!(!roles.has_role("editor"));
}

#[tokio::test]
async fn replacing_role_permissions_removes_old_grants() {
    let h = setup_harness().await;
    seed_apps(&h).await;
    let user_id = h.create_user("grace@example.com", "pw").await;

    let role = h
        .role_store
        .create_role("shifting", "Shifting", None, false)
        .await
        .unwrap();
    h.role_store
        .replace_user_roles(user_id, &[role.id], None)
        .await
        .unwrap();

    h.role_store
        .replace_role_permissions(role.id, &[], &[grant("milosign", "view")])
        .await
        .unwrap();
    h.role_store
        .replace_role_permissions(role.id, &[], &[grant("contratacion", "view")])
        .await
        .unwrap();

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(!roles.has_functionality("milosign", "view"));
    assert!(roles.has_functionality("contratacion", "view"));
}

#[tokio::test]
async fn inactive_roles_grant_nothing() {
    let h = setup_harness().await;
    seed_apps(&h).await;
    let user_id = h.create_user("heidi@example.com", "pw").await;

    let role = h
        .role_store
        .create_role("dormant", "Dormant", None, false)
        .await
        .unwrap();
    h.role_store
        .replace_role_permissions(role.id, &["milosign".to_string()], &[])
        .await
        .unwrap();
    h.role_store
        .replace_user_roles(user_id, &[role.id], None)
        .await
        .unwrap();

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(roles.has_app_access("milosign"));

    h.role_store.set_role_active(role.id, false).await.unwrap();

    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(!roles.has_role("dormant"));
    assert!(!roles.has_app_access("milosign"));
}

#[tokio::test]
async fn denied_permission_checks_are_audited() {
    let h = setup_harness().await;
    seed_apps(&h).await;
    let user_id = h.create_user("ivan@example.com", "pw").await;

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let err = h
        .permission_service
        .require_functionality(&user, "milosign", "edit", &test_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionDenied(_)));

    let events = h.audit_store.recent_for_user(user_id, 10).await.unwrap();
    assert!(events.iter().any(|e| e.event_type == "permission_denied"));
}
