// Database entities. Auth schema lives in the auth database; audit_log in
// the audit database.
pub mod application;
pub mod audit_log;
pub mod functionality;
pub mod role;
pub mod role_app_access;
pub mod role_functionality;
pub mod user;
pub mod user_role;
