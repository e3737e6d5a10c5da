mod common;

use chrono::Utc;
use common::{setup_harness, test_client};
use miloapps_auth::errors::AuthError;
use miloapps_auth::types::internal::auth::LoginOutcome;

#[tokio::test]
async fn valid_credentials_start_a_session() {
    let h = setup_harness().await;
    let user_id = h.create_user("alice@example.com", "correct horse").await;

    let outcome = h
        .login_service
        .attempt_login("alice@example.com", "correct horse", None, &test_client())
        .await
        .expect("login should succeed");

    let session = match outcome {
        LoginOutcome::Authenticated(session) => session,
        other => panic!("expected authenticated outcome, got {:?}", other),
    };
    assert_eq!(session.user_id, user_id);

    let stored = h
        .user_store
        .find_by_id(user_id)
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(stored.current_session_id.as_deref(), Some(session.session_id.as_str()));
    assert!(stored.last_login.is_some());
    assert_eq!(stored.last_login_ip.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn email_lookup_is_case_insensitive() {
    let h = setup_harness().await;
    h.create_user("bob@example.com", "secret pw").await;

    let outcome = h
        .login_service
        .attempt_login("BOB@Example.COM", "secret pw", None, &test_client())
        .await
        .expect("login should succeed regardless of email case");
    assert!(matches!(outcome, LoginOutcome::Authenticated(_)));
}

#[tokio::test]
async fn unknown_email_and_wrong_password_give_the_same_error() {
    let h = setup_harness().await;
    h.create_user("carol@example.com", "right pw").await;

    let unknown = h
        .login_service
        .attempt_login("nobody@example.com", "whatever", None, &test_client())
        .await
        .unwrap_err();
    let wrong = h
        .login_service
        .attempt_login("carol@example.com", "wrong pw", None, &test_client())
        .await
        .unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials(_)));
    assert!(matches!(wrong, AuthError::InvalidCredentials(_)));
}

#[tokio::test]
async fn third_failed_attempt_locks_the_account() {
    let h = setup_harness().await;
    let user_id = h.create_user("dave@example.com", "right pw").await;

    for _ in 0..2 {
        let err = h
            .login_service
            .attempt_login("dave@example.com", "wrong", None, &test_client())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }

    let err = h
        .login_service
        .attempt_login("dave@example.com", "wrong", None, &test_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked(_)));

    let stored = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    let now = Utc::now().timestamp();
    assert!(stored.is_locked(now));
    // The counter resets when the lock is applied.
    assert_eq!(stored.failed_login_attempts, 0);
    let until = stored.locked_until.unwrap();
    assert!(until > now + 29 * 60 && until <= now + 30 * 60 + 5);
}

#[tokio::test]
async fn locked_account_rejects_even_the_correct_password() {
    let h = setup_harness().await;
    h.create_user("erin@example.com", "right pw").await;

    for _ in 0..3 {
        let _ = h
            .login_service
            .attempt_login("erin@example.com", "wrong", None, &test_client())
            .await;
    }

    let err = h
        .login_service
        .attempt_login("erin@example.com", "right pw", None, &test_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked(_)));
}

#[tokio::test]
async fn successful_login_resets_the_failure_counter() {
    let h = setup_harness().await;
    let user_id = h.create_user("frank@example.com", "right pw").await;

    for _ in 0..2 {
        let _ = h
            .login_service
            .attempt_login("frank@example.com", "wrong", None, &test_client())
            .await;
    }
    let stored = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 2);

    h.login_service
        .attempt_login("frank@example.com", "right pw", None, &test_client())
        .await
        .expect("login should succeed");

    let stored = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 0);

    // The window starts over: two more failures do not lock.
    for _ in 0..2 {
        let err = h
            .login_service
            .attempt_login("frank@example.com", "wrong", None, &test_client())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }
}

#[tokio::test]
async fn expired_lock_admits_the_correct_password() {
    let h = setup_harness().await;
    let user_id = h.create_user("grace@example.com", "right pw").await;

    for _ in 0..3 {
        let _ = h
            .login_service
            .attempt_login("grace@example.com", "wrong", None, &test_client())
            .await;
    }

    // Simulate the lock window passing.
    let stored = h.user_store.find_by_id(user_id).await.unwrap().unwrap();
    assert!(stored.is_locked(Utc::now().timestamp()));
    assert!(!stored.is_locked(stored.locked_until.unwrap() + 1));

    h.user_store.unlock(user_id).await.unwrap();
    let outcome = h
        .login_service
        .attempt_login("grace@example.com", "right pw", None, &test_client())
        .await
        .expect("login should succeed after unlock");
    assert!(matches!(outcome, LoginOutcome::Authenticated(_)));
}

#[tokio::test]
async fn deactivated_account_cannot_log_in() {
    let h = setup_harness().await;
    let user_id = h.create_user("heidi@example.com", "right pw").await;
    h.user_store.set_active(user_id, false).await.unwrap();

    let err = h
        .login_service
        .attempt_login("heidi@example.com", "right pw", None, &test_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountDisabled(_)));
}

#[tokio::test]
async fn failed_logins_are_audited() {
    let h = setup_harness().await;
    let user_id = h.create_user("ivan@example.com", "right pw").await;

    let _ = h
        .login_service
        .attempt_login("ivan@example.com", "wrong", None, &test_client())
        .await;

    let events = h.audit_store.recent_for_user(user_id, 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "login_failed");
    assert!(!events[0].success);
    assert_eq!(events[0].ip_address.as_deref(), Some("127.0.0.1"));
}
