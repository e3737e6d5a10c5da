mod database;
mod logging;
mod settings;

pub use database::{init_audit_database, init_database};
pub use logging::init_logging;
pub use settings::{AuthSettings, ServerSettings};
