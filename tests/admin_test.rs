mod common;

use chrono::Utc;
use common::{setup_harness, test_client};
use miloapps_auth::errors::AuthError;
use miloapps_auth::stores::FunctionalityGrantSpec;
use miloapps_auth::types::db::audit_log;
use miloapps_auth::types::internal::audit::{AuditEvent, EventType};
use sea_orm::{ActiveModelTrait, Set};

#[tokio::test]
async fn admin_unlock_clears_lockout_early() {
    let h = setup_harness().await;
    let admin_id = h.create_user("admin@example.com", "admin pw").await;
    let user_id = h.create_user("victim@example.com", "user pw").await;

    for _ in 0..3 {
        let _ = h
            .login_service
            .attempt_login("victim@example.com", "wrong", None, &test_client())
            .await;
    }
    let stored = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    assert!(stored.is_locked(Utc::now().timestamp()));

    h.admin_service
        .unlock_user(user_id, admin_id, &test_client())
        .await
        .expect("unlock should succeed");

    let stored = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    assert!(!stored.is_locked(Utc::now().timestamp()));

    let events = h.audit_store.recent_for_user(user_id, 10).await.unwrap();
    assert!(events.iter().any(|e| e.event_type == "account_unlocked"));
}

#[tokio::test]
async fn role_permission_replace_rejects_unknown_keys_atomically() {
    let h = setup_harness().await;
    let app = h
        .role_store
        .create_application("milosign", "MiloSign", None)
        .await
        .unwrap();
    h.role_store
        .create_functionality(app.id, "view", "View", None)
        .await
        .unwrap();
    let role = h
        .role_store
        .create_role("viewer", "Viewer", None, false)
        .await
        .unwrap();
    let user_id = h.create_user("alice@example.com", "pw").await;
    h.role_store
        .replace_user_roles(user_id, &[role.id], None)
        .await
        .unwrap();

    h.admin_service
        .replace_role_permissions(
            role.id,
            vec![],
            vec![FunctionalityGrantSpec {
                application_key: "milosign".to_string(),
                functionality_key: "view".to_string(),
            }],
        )
        .await
        .unwrap();

    // A request naming an unknown functionality fails without clobbering
    // the existing grants.
    let err = h
        .admin_service
        .replace_role_permissions(
            role.id,
            vec![],
            vec![FunctionalityGrantSpec {
                application_key: "milosign".to_string(),
                functionality_key: "does-not-exist".to_string(),
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));

    let user = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let roles = h.permission_service.effective_roles(&user).await.unwrap();
    assert!(roles.has_functionality("milosign", "view"));
}

#[tokio::test]
async fn duplicate_role_and_application_names_are_rejected() {
    let h = setup_harness().await;
    h.admin_service
        .create_role("viewer", "Viewer", None, false)
        .await
        .unwrap();
    let err = h
        .admin_service
        .create_role("viewer", "Viewer Again", None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict(_)));

    h.admin_service
        .create_application("milosign", "MiloSign", None)
        .await
        .unwrap();
    let err = h
        .admin_service
        .create_application("milosign", "MiloSign Again", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict(_)));
}

#[tokio::test]
async fn operations_on_unknown_users_return_not_found() {
    let h = setup_harness().await;
    let admin_id = h.create_user("admin@example.com", "admin pw").await;

    let err = h
        .admin_service
        .unlock_user(9999, admin_id, &test_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));

    let err = h
        .admin_service
        .assign_user_roles(9999, vec![], admin_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));

    let err = h
        .admin_service
        .set_user_active(9999, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}

#[tokio::test]
async fn audit_prune_removes_only_old_events() {
    let h = setup_harness().await;

    // One old event, one fresh.
    let mut old_event = AuditEvent::new(EventType::LoginSuccess);
    old_event.user_id = Some(1);
    h.audit_store.write_event(old_event).await.unwrap();
    let mut fresh_event = AuditEvent::new(EventType::Logout);
    fresh_event.user_id = Some(1);
    h.audit_store.write_event(fresh_event).await.unwrap();

    // Nothing is older than 30 days yet.
    let deleted = h.admin_service.prune_audit(30).await.unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(h.audit_store.count_events().await.unwrap(), 2);

    // With a zero-day retention everything goes.
    let deleted = h.admin_service.prune_audit(0).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(h.audit_store.count_events().await.unwrap(), 0);
}

#[tokio::test]
async fn negative_retention_never_deletes_newer_events() {
    let h = setup_harness().await;

    // A row stamped ahead of the clock stands in for anything written after
    // the cutoff is computed; an unclamped negative window would sweep it.
    let row = audit_log::ActiveModel {
        user_id: Set(Some(1)),
        event_type: Set("login_success".to_string()),
        success: Set(true),
        created_at: Set(Utc::now().timestamp() + 3600),
        ..Default::default()
    };
    row.insert(&h.audit_db).await.unwrap();

    let deleted = h.admin_service.prune_audit(-7).await.unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(h.audit_store.count_events().await.unwrap(), 1);
}

#[tokio::test]
async fn audit_events_store_client_details_and_data() {
    let h = setup_harness().await;

    let mut event = AuditEvent::new(EventType::LoginFailed).with_client(&test_client());
    event.user_id = Some(7);
    event.success = false;
    event
        .data
        .insert("reason".to_string(), serde_json::json!("wrong password"));
    h.audit_store.write_event(event).await.unwrap();

    let rows = h.audit_store.recent_for_user(7, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.event_type, "login_failed");
    assert_eq!(row.ip_address.as_deref(), Some("127.0.0.1"));
    assert!(!row.success);
    let data: serde_json::Value =
        serde_json::from_str(row.additional_data.as_deref().unwrap()).unwrap();
    assert_eq!(data["reason"], "wrong password");
}
