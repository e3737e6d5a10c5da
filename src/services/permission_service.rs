use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::errors::AuthError;
use crate::stores::RoleStore;
use crate::types::db::user;
use crate::types::internal::client_info::ClientInfo;
use crate::types::internal::permissions::EffectiveRoleSet;

/// Authorization checks over a user's effective role set. Denials are
/// audited; grants are not.
pub struct PermissionService {
    role_store: Arc<RoleStore>,
    audit_logger: Arc<AuditLogger>,
}

impl PermissionService {
    pub fn new(role_store: Arc<RoleStore>, audit_logger: Arc<AuditLogger>) -> Self {
        Self {
            role_store,
            audit_logger,
        }
    }

    /// Load the resolved role set for a user. Resolved per request; there is
    /// no cache, so grant changes apply immediately.
    pub async fn effective_roles(
        &self,
        user: &user::Model,
    ) -> Result<EffectiveRoleSet, AuthError> {
        Ok(self.role_store.effective_role_set(user).await?)
    }

    pub async fn require_role(
        &self,
        user: &user::Model,
        role_name: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let roles = self.effective_roles(user).await?;
        if roles.has_allmilo() || roles.has_role(role_name) {
            return Ok(());
        }
        self.audit_denial(user.id, role_name, None, client).await;
        Err(AuthError::permission_denied())
    }

    pub async fn require_app_access(
        &self,
        user: &user::Model,
        app_key: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let roles = self.effective_roles(user).await?;
        if roles.has_app_access(app_key) {
            return Ok(());
        }
        self.audit_denial(user.id, app_key, None, client).await;
        Err(AuthError::permission_denied())
    }

    pub async fn require_functionality(
        &self,
        user: &user::Model,
        app_key: &str,
        functionality_key: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let roles = self.effective_roles(user).await?;
        if roles.has_functionality(app_key, functionality_key) {
            return Ok(());
        }
        self.audit_denial(user.id, app_key, Some(functionality_key), client)
            .await;
        Err(AuthError::permission_denied())
    }

    async fn audit_denial(
        &self,
        user_id: i32,
        target: &str,
        functionality: Option<&str>,
        client: &ClientInfo,
    ) {
        if let Err(e) = self
            .audit_logger
            .log_permission_denied(user_id, target, functionality, client)
            .await
        {
            tracing::error!(user_id, error = %e, "failed to audit permission denial");
        }
    }
}
