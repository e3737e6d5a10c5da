pub mod audit_store;
pub mod role_store;
pub mod user_store;

pub use audit_store::AuditStore;
pub use role_store::{FunctionalityGrantSpec, RoleStore};
pub use user_store::{FailedAttemptOutcome, UserStore};
