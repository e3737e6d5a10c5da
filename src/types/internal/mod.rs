pub mod audit;
pub mod auth;
pub mod client_info;
pub mod permissions;

pub use audit::{AuditEvent, EventType};
pub use auth::{AuthenticatedSession, LoginOutcome, PendingTwoFactorAuth};
pub use client_info::ClientInfo;
pub use permissions::{EffectiveRoleSet, RoleGrants};
