pub mod account_service;
pub mod admin_service;
pub mod bootstrap;
pub mod login_service;
pub mod notifier;
pub mod password;
pub mod permission_service;
pub mod session_service;
pub mod totp_service;

pub use account_service::AccountService;
pub use admin_service::AdminService;
pub use login_service::LoginService;
pub use notifier::{NoopNotifier, Notifier, SmtpNotifier};
pub use password::PasswordService;
pub use permission_service::PermissionService;
pub use session_service::SessionService;
pub use totp_service::TotpService;
