use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;

use crate::audit::AuditLogger;
use crate::config::AuthSettings;
use crate::errors::AuthError;
use crate::services::notifier::Notifier;
use crate::services::password::PasswordService;
use crate::services::totp_service::TotpService;
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::client_info::ClientInfo;

/// Account lifecycle: registration, password change and reset, TOTP
/// enrollment.
pub struct AccountService {
    user_store: Arc<UserStore>,
    password_service: Arc<PasswordService>,
    totp_service: Arc<TotpService>,
    audit_logger: Arc<AuditLogger>,
    notifier: Arc<dyn Notifier>,
    settings: AuthSettings,
}

impl AccountService {
    pub fn new(
        user_store: Arc<UserStore>,
        password_service: Arc<PasswordService>,
        totp_service: Arc<TotpService>,
        audit_logger: Arc<AuditLogger>,
        notifier: Arc<dyn Notifier>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            user_store,
            password_service,
            totp_service,
            audit_logger,
            notifier,
            settings,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role_id: Option<i32>,
        client: &ClientInfo,
    ) -> Result<user::Model, AuthError> {
        if self.user_store.find_by_email(email).await?.is_some()
            || self.user_store.find_by_username(username).await?.is_some()
        {
            return Err(AuthError::duplicate_account());
        }

        let hash = self.password_service.hash(password)?;
        let created = self
            .user_store
            .create_user(email, username, hash, first_name, last_name, role_id)
            .await
            .map_err(|e| {
                // The existence checks race with concurrent registrations;
                // the unique constraints are the backstop.
                if e.to_string().contains("UNIQUE") {
                    AuthError::duplicate_account()
                } else {
                    e.into()
                }
            })?;

        if let Err(e) = self
            .audit_logger
            .log_user_created(created.id, &created.email, client)
            .await
        {
            tracing::error!(user_id = created.id, error = %e, "failed to audit registration");
        }
        self.notifier
            .welcome(&created.email, &created.full_name())
            .await;

        Ok(created)
    }

    /// Change the password of an authenticated user. The current password is
    /// re-verified even though the caller holds a valid session.
    pub async fn change_password(
        &self,
        user: &user::Model,
        current_password: &str,
        new_password: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        if !self
            .password_service
            .verify(current_password, &user.password_hash)?
        {
            return Err(AuthError::invalid_credentials());
        }

        let hash = self.password_service.hash(new_password)?;
        self.user_store.set_password_hash(user.id, hash).await?;

        if let Err(e) = self.audit_logger.log_password_change(user.id, client).await {
            tracing::error!(user_id = user.id, error = %e, "failed to audit password change");
        }
        self.notifier
            .password_changed(&user.email, &user.full_name())
            .await;
        Ok(())
    }

    /// Start a password reset. Always succeeds from the caller's view;
    /// whether the email matched an account is never revealed.
    pub async fn request_password_reset(
        &self,
        email: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let user = match self.user_store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::debug!(email, "password reset requested for unknown email");
                return Ok(());
            }
        };

        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);
        let expires_at = Utc::now().timestamp() + self.settings.reset_token_lifetime_secs();

        self.user_store
            .set_reset_token(user.id, &token, expires_at)
            .await?;

        if let Err(e) = self
            .audit_logger
            .log_password_reset_request(user.id, client)
            .await
        {
            tracing::error!(user_id = user.id, error = %e, "failed to audit reset request");
        }
        self.notifier
            .password_reset_requested(&user.email, &user.full_name(), &token)
            .await;
        Ok(())
    }

    /// Finish a password reset with the emailed token. A successful reset
    /// consumes the token, clears any lockout, and ends the active session
    /// so the new credentials must be used.
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let user = self
            .user_store
            .find_by_reset_token(token)
            .await?
            .ok_or_else(AuthError::reset_token_invalid)?;

        let now = Utc::now().timestamp();
        match user.reset_token_expires {
            Some(expires) if expires > now => {}
            _ => {
                self.user_store.clear_reset_token(user.id).await?;
                return Err(AuthError::reset_token_invalid());
            }
        }

        let hash = self.password_service.hash(new_password)?;
        self.user_store.set_password_hash(user.id, hash).await?;
        self.user_store.clear_reset_token(user.id).await?;
        self.user_store.unlock(user.id).await?;
        self.user_store.clear_session(user.id).await?;

        if let Err(e) = self
            .audit_logger
            .log_password_reset_success(user.id, client)
            .await
        {
            tracing::error!(user_id = user.id, error = %e, "failed to audit reset completion");
        }
        self.notifier
            .password_changed(&user.email, &user.full_name())
            .await;
        Ok(())
    }

    /// Begin TOTP enrollment: store a provisional secret and hand back the
    /// provisioning URI. 2FA is not active until confirmed. An existing
    /// secret is reused rather than silently overwritten, so re-opening the
    /// enrollment screen does not invalidate a half-scanned QR code.
    pub async fn setup_two_factor(
        &self,
        user: &user::Model,
    ) -> Result<(String, String), AuthError> {
        let secret = match &user.two_factor_secret {
            Some(existing) => existing.clone(),
            None => {
                let secret = self.totp_service.generate_secret();
                self.user_store
                    .set_two_factor_secret(user.id, &secret)
                    .await?;
                secret
            }
        };
        let uri = self.totp_service.provisioning_uri(&secret, &user.email)?;
        Ok((secret, uri))
    }

    /// Confirm enrollment with a code from the authenticator app.
    pub async fn confirm_two_factor(
        &self,
        user: &user::Model,
        code: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let secret = user
            .two_factor_secret
            .as_deref()
            .ok_or_else(AuthError::two_factor_invalid)?;
        if !self.totp_service.verify(secret, &user.email, code)? {
            return Err(AuthError::two_factor_invalid());
        }
        self.user_store.enable_two_factor(user.id).await?;

        if let Err(e) = self
            .audit_logger
            .log_two_factor_enabled(user.id, client)
            .await
        {
            tracing::error!(user_id = user.id, error = %e, "failed to audit 2FA enable");
        }
        self.notifier
            .two_factor_enabled(&user.email, &user.full_name())
            .await;
        Ok(())
    }

    /// Disabling requires the current password; a hijacked session alone is
    /// not enough to strip the second factor.
    pub async fn disable_two_factor(
        &self,
        user: &user::Model,
        password: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        if !self
            .password_service
            .verify(password, &user.password_hash)?
        {
            return Err(AuthError::invalid_credentials());
        }
        self.user_store.disable_two_factor(user.id).await?;

        if let Err(e) = self
            .audit_logger
            .log_two_factor_disabled(user.id, client)
            .await
        {
            tracing::error!(user_id = user.id, error = %e, "failed to audit 2FA disable");
        }
        Ok(())
    }
}
