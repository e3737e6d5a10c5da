use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::errors::{AuthError, InternalError};
use crate::stores::{AuditStore, FunctionalityGrantSpec, RoleStore, UserStore};
use crate::types::db::{application, functionality, role};
use crate::types::internal::client_info::ClientInfo;

/// Administrative operations over the permission model and user accounts.
/// The API layer has already verified the caller holds the admin role.
pub struct AdminService {
    user_store: Arc<UserStore>,
    role_store: Arc<RoleStore>,
    audit_store: Arc<AuditStore>,
    audit_logger: Arc<AuditLogger>,
}

impl AdminService {
    pub fn new(
        user_store: Arc<UserStore>,
        role_store: Arc<RoleStore>,
        audit_store: Arc<AuditStore>,
        audit_logger: Arc<AuditLogger>,
    ) -> Self {
        Self {
            user_store,
            role_store,
            audit_store,
            audit_logger,
        }
    }

    pub async fn create_role(
        &self,
        name: &str,
        display_name: &str,
        description: Option<String>,
        is_allmilo: bool,
    ) -> Result<role::Model, AuthError> {
        if self.role_store.find_role_by_name(name).await?.is_some() {
            return Err(AuthError::conflict(format!("role '{}' already exists", name)));
        }
        Ok(self
            .role_store
            .create_role(name, display_name, description, is_allmilo)
            .await?)
    }

    pub async fn list_roles(&self) -> Result<Vec<role::Model>, AuthError> {
        Ok(self.role_store.list_roles().await?)
    }

    /// Replace a role's grants wholesale. Bad application or functionality
    /// keys fail the whole request and leave the existing grants untouched.
    pub async fn replace_role_permissions(
        &self,
        role_id: i32,
        full_access: Vec<String>,
        grants: Vec<FunctionalityGrantSpec>,
    ) -> Result<(), AuthError> {
        if self.role_store.find_role_by_id(role_id).await?.is_none() {
            return Err(AuthError::not_found(format!("role {} not found", role_id)));
        }
        self.role_store
            .replace_role_permissions(role_id, &full_access, &grants)
            .await
            .map_err(|e| match e {
                InternalError::ApplicationMissing(key) => {
                    AuthError::not_found(format!("unknown application or functionality: {}", key))
                }
                other => other.into(),
            })
    }

    /// Replace a user's additional roles. The legacy primary role on the
    /// users row is not touched by this operation.
    pub async fn assign_user_roles(
        &self,
        user_id: i32,
        role_ids: Vec<i32>,
        granted_by: i32,
    ) -> Result<(), AuthError> {
        if self.user_store.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::not_found(format!("user {} not found", user_id)));
        }
        Ok(self
            .role_store
            .replace_user_roles(user_id, &role_ids, Some(granted_by))
            .await?)
    }

    pub async fn create_application(
        &self,
        key: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<application::Model, AuthError> {
        if self
            .role_store
            .find_application_by_key(key)
            .await?
            .is_some()
        {
            return Err(AuthError::conflict(format!(
                "application '{}' already exists",
                key
            )));
        }
        Ok(self
            .role_store
            .create_application(key, name, description)
            .await?)
    }

    pub async fn list_applications(&self) -> Result<Vec<application::Model>, AuthError> {
        Ok(self.role_store.list_applications().await?)
    }

    pub async fn create_functionality(
        &self,
        application_key: &str,
        key: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<functionality::Model, AuthError> {
        let app = self
            .role_store
            .find_application_by_key(application_key)
            .await?
            .ok_or_else(|| {
                AuthError::not_found(format!("unknown application: {}", application_key))
            })?;
        Ok(self
            .role_store
            .create_functionality(app.id, key, name, description)
            .await?)
    }

    pub async fn list_functionalities(
        &self,
        application_key: &str,
    ) -> Result<Vec<functionality::Model>, AuthError> {
        let app = self
            .role_store
            .find_application_by_key(application_key)
            .await?
            .ok_or_else(|| {
                AuthError::not_found(format!("unknown application: {}", application_key))
            })?;
        Ok(self.role_store.list_functionalities(app.id).await?)
    }

    /// Clear a lockout ahead of its expiry.
    pub async fn unlock_user(
        &self,
        user_id: i32,
        unlocked_by: i32,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        if self.user_store.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::not_found(format!("user {} not found", user_id)));
        }
        self.user_store.unlock(user_id).await?;
        if let Err(e) = self
            .audit_logger
            .log_account_unlocked(user_id, Some(unlocked_by), client)
            .await
        {
            tracing::error!(user_id, error = %e, "failed to audit unlock");
        }
        Ok(())
    }

    pub async fn set_user_active(&self, user_id: i32, is_active: bool) -> Result<(), AuthError> {
        if self.user_store.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::not_found(format!("user {} not found", user_id)));
        }
        Ok(self.user_store.set_active(user_id, is_active).await?)
    }

    /// Drop audit events older than the retention window.
    pub async fn prune_audit(&self, retain_days: i64) -> Result<u64, AuthError> {
        Ok(self.audit_store.prune_older_than(retain_days).await?)
    }
}
