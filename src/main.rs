use std::sync::Arc;

use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;

use miloapps_auth::api::{AdminApi, AuthApi, HealthApi};
use miloapps_auth::audit::AuditLogger;
use miloapps_auth::config::{
    init_audit_database, init_database, init_logging, AuthSettings, ServerSettings,
};
use miloapps_auth::services::{
    bootstrap, AccountService, AdminService, LoginService, NoopNotifier, Notifier,
    PasswordService, PermissionService, SessionService, SmtpNotifier, TotpService,
};
use miloapps_auth::stores::{AuditStore, RoleStore, UserStore};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let server_settings = ServerSettings::from_env();
    let auth_settings = AuthSettings::from_env();

    let db = init_database(&server_settings.database_url)
        .await
        .expect("Failed to initialize auth database");
    tracing::info!(url = %server_settings.database_url, "auth database ready");

    let audit_db = init_audit_database(&server_settings.audit_database_url)
        .await
        .expect("Failed to initialize audit database");
    tracing::info!(url = %server_settings.audit_database_url, "audit database ready");

    let user_store = Arc::new(UserStore::new(db.clone()));
    let role_store = Arc::new(RoleStore::new(db));
    let audit_store = Arc::new(AuditStore::new(audit_db));
    let audit_logger = Arc::new(AuditLogger::new(Arc::clone(&audit_store)));

    let password_service = Arc::new(PasswordService::new(
        server_settings.password_pepper.clone(),
    ));
    let totp_service = Arc::new(TotpService::new(auth_settings.totp_issuer.clone()));

    let notifier: Arc<dyn Notifier> = match SmtpNotifier::from_env() {
        Some(Ok(smtp)) => {
            tracing::info!("SMTP notifier configured");
            Arc::new(smtp)
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "SMTP configuration invalid, notifications disabled");
            Arc::new(NoopNotifier)
        }
        None => {
            tracing::info!("SMTP_HOST not set, notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    bootstrap::seed_defaults(&user_store, &role_store, &password_service)
        .await
        .expect("Failed to seed defaults");

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
        Arc::clone(&notifier),
        auth_settings.clone(),
    ));
    let account_service = Arc::new(AccountService::new(
        Arc::clone(&user_store),
        Arc::clone(&password_service),
        Arc::clone(&totp_service),
        Arc::clone(&audit_logger),
        Arc::clone(&notifier),
        auth_settings,
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

    let auth_api = AuthApi::new(
        Arc::clone(&login_service),
        Arc::clone(&session_service),
        Arc::clone(&account_service),
    );
    let admin_api = AdminApi::new(
        Arc::clone(&admin_service),
        Arc::clone(&permission_service),
        Arc::clone(&session_service),
    );

    let api_service = OpenApiService::new(
        (HealthApi, auth_api, admin_api),
        "MiloApps Auth",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("http://{}/api", server_settings.listen_addr));
    let ui = api_service.swagger_ui();

    let app = Route::new().nest("/api", api_service).nest("/swagger", ui);

    tracing::info!(addr = %server_settings.listen_addr, "starting server");
    Server::new(TcpListener::bind(server_settings.listen_addr))
        .run(app)
        .await
}
