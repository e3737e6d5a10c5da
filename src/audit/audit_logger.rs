use std::sync::Arc;

use serde_json::json;

use crate::errors::InternalError;
use crate::stores::AuditStore;
use crate::types::internal::audit::{AuditEvent, EventType};
use crate::types::internal::client_info::ClientInfo;

/// Typed front-end over the audit store. Every security-relevant event goes
/// through one of these methods so the event vocabulary stays fixed.
///
/// Callers treat audit failures as non-fatal: log and continue, never abort
/// the user-facing operation.
pub struct AuditLogger {
    audit_store: Arc<AuditStore>,
}

impl AuditLogger {
    pub fn new(audit_store: Arc<AuditStore>) -> Self {
        Self { audit_store }
    }

    pub async fn log_login_success(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::LoginSuccess).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("User logged in".to_string());
        self.audit_store.write_event(event).await
    }

    /// Failed login; user_id is None when the email did not match an account.
    pub async fn log_login_failed(
        &self,
        user_id: Option<i32>,
        email: &str,
        reason: &str,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::LoginFailed).with_client(client);
        event.user_id = user_id;
        event.success = false;
        event.description = Some(format!("Login failed: {}", reason));
        event.data.insert("email".to_string(), json!(email));
        event.data.insert("reason".to_string(), json!(reason));
        self.audit_store.write_event(event).await
    }

    pub async fn log_logout(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::Logout).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("User logged out".to_string());
        self.audit_store.write_event(event).await
    }

    /// Recorded when a request presents a session that has since been
    /// replaced by a newer login elsewhere.
    pub async fn log_session_displaced(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::SessionDisplaced).with_client(client);
        event.user_id = Some(user_id);
        event.success = false;
        event.description = Some("Session displaced by a newer login".to_string());
        self.audit_store.write_event(event).await
    }

    pub async fn log_account_locked(
        &self,
        user_id: i32,
        locked_until: i64,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::AccountLocked).with_client(client);
        event.user_id = Some(user_id);
        event.success = false;
        event.description = Some("Account locked after repeated failed logins".to_string());
        event
            .data
            .insert("locked_until".to_string(), json!(locked_until));
        self.audit_store.write_event(event).await
    }

    pub async fn log_account_unlocked(
        &self,
        user_id: i32,
        unlocked_by: Option<i32>,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::AccountUnlocked).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("Account unlocked".to_string());
        if let Some(admin_id) = unlocked_by {
            event.data.insert("unlocked_by".to_string(), json!(admin_id));
        }
        self.audit_store.write_event(event).await
    }

    pub async fn log_password_change(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::PasswordChange).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("Password changed".to_string());
        self.audit_store.write_event(event).await
    }

    pub async fn log_password_reset_request(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::PasswordResetRequest).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("Password reset requested".to_string());
        self.audit_store.write_event(event).await
    }

    pub async fn log_password_reset_success(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::PasswordResetSuccess).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("Password reset completed".to_string());
        self.audit_store.write_event(event).await
    }

    pub async fn log_two_factor_enabled(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::TwoFactorEnabled).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("Two-factor authentication enabled".to_string());
        self.audit_store.write_event(event).await
    }

    pub async fn log_two_factor_disabled(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::TwoFactorDisabled).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("Two-factor authentication disabled".to_string());
        self.audit_store.write_event(event).await
    }

    pub async fn log_user_created(
        &self,
        user_id: i32,
        email: &str,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::UserCreated).with_client(client);
        event.user_id = Some(user_id);
        event.description = Some("User account created".to_string());
        event.resource_type = Some("user".to_string());
        event.resource_id = Some(user_id.to_string());
        event.data.insert("email".to_string(), json!(email));
        self.audit_store.write_event(event).await
    }

    pub async fn log_permission_denied(
        &self,
        user_id: i32,
        application_key: &str,
        functionality_key: Option<&str>,
        client: &ClientInfo,
    ) -> Result<(), InternalError> {
        let mut event = AuditEvent::new(EventType::PermissionDenied).with_client(client);
        event.user_id = Some(user_id);
        event.success = false;
        event.description = Some("Permission denied".to_string());
        event
            .data
            .insert("application".to_string(), json!(application_key));
        if let Some(func) = functionality_key {
            event.data.insert("functionality".to_string(), json!(func));
        }
        self.audit_store.write_event(event).await
    }
}
