use std::collections::HashMap;
use std::fmt;

use crate::types::internal::client_info::ClientInfo;

/// Event types for audit logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    LoginSuccess,
    LoginFailed,
    Logout,
    SessionDisplaced,
    PasswordChange,
    PasswordResetRequest,
    PasswordResetSuccess,
    TwoFactorEnabled,
    TwoFactorDisabled,
    AccountLocked,
    AccountUnlocked,
    UserCreated,
    PermissionDenied,
}

impl EventType {
    /// String representation stored in the event_type column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::SessionDisplaced => "session_displaced",
            Self::PasswordChange => "password_change",
            Self::PasswordResetRequest => "password_reset_request",
            Self::PasswordResetSuccess => "password_reset_success",
            Self::TwoFactorEnabled => "two_factor_enabled",
            Self::TwoFactorDisabled => "two_factor_disabled",
            Self::AccountLocked => "account_locked",
            Self::AccountUnlocked => "account_unlocked",
            Self::UserCreated => "user_created",
            Self::PermissionDenied => "permission_denied",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit event structure for building and storing audit logs.
///
/// user_id is None for events with no known account (e.g. failed login for
/// an unknown email).
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_type: EventType,
    pub user_id: Option<i32>,
    pub description: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub browser: Option<String>,
    pub operating_system: Option<String>,
    pub success: bool,
    pub data: HashMap<String, serde_json::Value>,
}

impl AuditEvent {
    /// Create a new audit event with the specified event type
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            user_id: None,
            description: None,
            resource_type: None,
            resource_id: None,
            ip_address: None,
            user_agent: None,
            browser: None,
            operating_system: None,
            success: true,
            data: HashMap::new(),
        }
    }

    /// Stamp the client fields (IP, user agent, parsed browser/OS) onto the event
    pub fn with_client(mut self, client: &ClientInfo) -> Self {
        self.ip_address = client.ip_address.clone();
        self.user_agent = client.user_agent.clone();
        self.browser = client.browser.clone();
        self.operating_system = client.operating_system.clone();
        self
    }
}
