// Common test utilities for integration tests

use std::sync::Arc;

use migration::{AuditMigrator, AuthMigrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use miloapps_auth::audit::AuditLogger;
use miloapps_auth::config::AuthSettings;
use miloapps_auth::services::{
    AccountService, AdminService, LoginService, NoopNotifier, PasswordService, PermissionService,
    SessionService, TotpService,
};
use miloapps_auth::stores::{AuditStore, RoleStore, UserStore};
use miloapps_auth::types::internal::client_info::ClientInfo;

/// Creates a test auth database with migrations applied
pub async fn setup_test_auth_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    AuthMigrator::up(&db, None)
        .await
        .expect("Failed to run auth migrations");

    db
}

/// Creates a test audit database with migrations applied
pub async fn setup_test_audit_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create audit database");

    AuditMigrator::up(&db, None)
        .await
        .expect("Failed to run audit migrations");

    db
}

/// The full service graph over in-memory databases, with notifications
/// disabled.
pub struct TestHarness {
    pub audit_db: DatabaseConnection,
    pub user_store: Arc<UserStore>,
    pub role_store: Arc<RoleStore>,
    pub audit_store: Arc<AuditStore>,
    pub password_service: Arc<PasswordService>,
    pub totp_service: Arc<TotpService>,
    pub session_service: Arc<SessionService>,
    pub login_service: Arc<LoginService>,
    pub account_service: Arc<AccountService>,
    pub permission_service: Arc<PermissionService>,
    pub admin_service: Arc<AdminService>,
}

pub async fn setup_harness() -> TestHarness {
    let auth_db = setup_test_auth_db().await;
    let audit_db = setup_test_audit_db().await;

    let settings = AuthSettings::default();
    let user_store = Arc::new(UserStore::new(auth_db.clone()));
    let role_store = Arc::new(RoleStore::new(auth_db));
    let audit_store = Arc::new(AuditStore::new(audit_db.clone()));
    let audit_logger = Arc::new(AuditLogger::new(Arc::clone(&audit_store)));

    let password_service = Arc::new(PasswordService::new("test-pepper".to_string()));
    let totp_service = Arc::new(TotpService::new("MiloApps".to_string()));
    let notifier = Arc::new(NoopNotifier);

    let session_service = Arc::new(SessionService::new(
        Arc::clone(&user_store),
        Arc::clone(&audit_logger),
    ));
    let login_service = Arc::new(LoginService::new(
        Arc::clone(&user_store),
        Arc::clone(&session_service),
        Arc::clone(&password_service),
        Arc::clone(&totp_service),
        Arc::clone(&audit_logger),
        notifier.clone(),
        settings.clone(),
    ));
    let account_service = Arc::new(AccountService::new(
        Arc::clone(&user_store),
        Arc::clone(&password_service),
        Arc::clone(&totp_service),
        Arc::clone(&audit_logger),
        notifier,
        settings,
    ));
    let permission_service = Arc::new(PermissionService::new(
        Arc::clone(&role_store),
        Arc::clone(&audit_logger),
    ));
    let admin_service = Arc::new(AdminService::new(
        Arc::clone(&user_store),
        Arc::clone(&role_store),
        Arc::clone(&audit_store),
        Arc::clone(&audit_logger),
    ));

    TestHarness {
        audit_db,
        user_store,
        role_store,
        audit_store,
        password_service,
        totp_service,
        session_service,
        login_service,
        account_service,
        permission_service,
        admin_service,
    }
}

impl TestHarness {
    /// Create a user with a known password and return its id.
    pub async fn create_user(&self, email: &str, password: &str) -> i32 {
        let hash = self
            .password_service
            .hash(password)
            .expect("Failed to hash password");
        let username = email.split('@').next().unwrap().to_string();
        let user = self
            .user_store
            .create_user(email, &username, hash, "Test", "User", None)
            .await
            .expect("Failed to create user");
        user.id
    }
}

/// A client for tests that do not care about IP or user agent.
pub fn test_client() -> ClientInfo {
    ClientInfo::new(Some("127.0.0.1".to_string()), Some("tests".to_string()))
}

/// A client pinned to a specific IP.
pub fn client_from(ip: &str) -> ClientInfo {
    ClientInfo::new(Some(ip.to_string()), Some("tests".to_string()))
}
