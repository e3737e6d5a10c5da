use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::audit::AuditLogger;
use crate::config::AuthSettings;
use crate::errors::AuthError;
use crate::services::notifier::Notifier;
use crate::services::password::PasswordService;
use crate::services::session_service::SessionService;
use crate::services::totp_service::TotpService;
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::auth::{LoginOutcome, PendingTwoFactorAuth};
use crate::types::internal::client_info::ClientInfo;

/// The login state machine: credential check, lockout accounting, optional
/// TOTP step, single-session establishment, suspicious-login alerting.
pub struct LoginService {
    user_store: Arc<UserStore>,
    session_service: Arc<SessionService>,
    password_service: Arc<PasswordService>,
    totp_service: Arc<TotpService>,
    audit_logger: Arc<AuditLogger>,
    notifier: Arc<dyn Notifier>,
    settings: AuthSettings,
    /// Checkpoints between password verification and TOTP entry. In-memory
    /// on purpose: a restart just forces those logins to start over.
    pending_two_factor: Mutex<HashMap<Uuid, PendingTwoFactorAuth>>,
}

impl LoginService {
    pub fn new(
        user_store: Arc<UserStore>,
        session_service: Arc<SessionService>,
        password_service: Arc<PasswordService>,
        totp_service: Arc<TotpService>,
        audit_logger: Arc<AuditLogger>,
        notifier: Arc<dyn Notifier>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            user_store,
            session_service,
            password_service,
            totp_service,
            audit_logger,
            notifier,
            settings,
            pending_two_factor: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt a login with email and password, plus an optional TOTP code
    /// submitted inline.
    ///
    /// Order of checks matters: lockout before the password so a locked
    /// account gives no signal about credential validity, and the active
    /// flag before the password for the same reason.
    pub async fn attempt_login(
        &self,
        email: &str,
        password: &str,
        totp_code: Option<&str>,
        client: &ClientInfo,
    ) -> Result<LoginOutcome, AuthError> {
        let user = match self.user_store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                self.audit_failed(None, email, "unknown email", client).await;
                return Err(AuthError::invalid_credentials());
            }
        };

        let now = Utc::now().timestamp();
        if user.is_locked(now) {
            self.audit_failed(Some(user.id), email, "account locked", client)
                .await;
            let minutes_remaining = (user.locked_until.unwrap_or(now) - now + 59) / 60;
            return Err(AuthError::account_locked(minutes_remaining));
        }

        if !user.is_active {
            self.audit_failed(Some(user.id), email, "account disabled", client)
                .await;
            return Err(AuthError::account_disabled());
        }

        if !self
            .password_service
            .verify(password, &user.password_hash)?
        {
            self.audit_failed(Some(user.id), email, "wrong password", client)
                .await;
            return Err(self
                .register_failure(&user, client, AuthError::invalid_credentials())
                .await);
        }

        if user.two_factor_enabled {
            let secret = user
                .two_factor_secret
                .as_deref()
                .ok_or_else(|| AuthError::internal_error("2FA enabled without secret".into()))?;
            match totp_code {
                Some(code) => {
                    if !self.totp_service.verify(secret, &user.email, code)? {
                        self.audit_failed(Some(user.id), email, "invalid TOTP code", client)
                            .await;
                        return Err(self
                            .register_failure(&user, client, AuthError::two_factor_invalid())
                            .await);
                    }
                }
                None => {
                    let pending =
                        PendingTwoFactorAuth::new(user.id, self.settings.pending_two_factor_ttl_secs);
                    let mut map = self
                        .pending_two_factor
                        .lock()
                        .expect("pending 2FA lock poisoned");
                    // Abandoned checkpoints are never retried, so each
                    // insert also sweeps the expired ones.
                    let now = Utc::now().timestamp();
                    map.retain(|_, p| !p.is_expired(now));
                    map.insert(pending.id, pending.clone());
                    return Ok(LoginOutcome::TwoFactorRequired(pending));
                }
            }
        }

        let session = self.finish_login(&user, client).await?;
        Ok(LoginOutcome::Authenticated(session))
    }

    /// Number of checkpoints currently held, for operational visibility.
    pub fn pending_checkpoint_count(&self) -> usize {
        self.pending_two_factor
            .lock()
            .expect("pending 2FA lock poisoned")
            .len()
    }

    /// Complete a login that stopped at the TOTP checkpoint.
    pub async fn complete_two_factor(
        &self,
        pending_id: Uuid,
        totp_code: &str,
        client: &ClientInfo,
    ) -> Result<LoginOutcome, AuthError> {
        let pending = {
            let mut map = self
                .pending_two_factor
                .lock()
                .expect("pending 2FA lock poisoned");
            match map.get(&pending_id) {
                Some(p) if p.is_expired(Utc::now().timestamp()) => {
                    map.remove(&pending_id);
                    return Err(AuthError::two_factor_required());
                }
                Some(p) => p.clone(),
                None => return Err(AuthError::two_factor_required()),
            }
        };

        let user = self
            .user_store
            .find_by_id(pending.user_id)
            .await?
            .ok_or_else(AuthError::invalid_credentials)?;

        let now = Utc::now().timestamp();
        if user.is_locked(now) {
            let minutes_remaining = (user.locked_until.unwrap_or(now) - now + 59) / 60;
            return Err(AuthError::account_locked(minutes_remaining));
        }
        if !user.is_active {
            return Err(AuthError::account_disabled());
        }

        let secret = user
            .two_factor_secret
            .as_deref()
            .ok_or_else(|| AuthError::internal_error("2FA enabled without secret".into()))?;
        if !self.totp_service.verify(secret, &user.email, totp_code)? {
            self.audit_failed(Some(user.id), &user.email, "invalid TOTP code", client)
                .await;
            // The checkpoint stays valid for a retry unless this failure
            // tripped the lockout.
            let err = self
                .register_failure(&user, client, AuthError::two_factor_invalid())
                .await;
            if matches!(err, AuthError::AccountLocked(_)) {
                self.pending_two_factor
                    .lock()
                    .expect("pending 2FA lock poisoned")
                    .remove(&pending_id);
            }
            return Err(err);
        }

        self.pending_two_factor
            .lock()
            .expect("pending 2FA lock poisoned")
            .remove(&pending_id);

        let session = self.finish_login(&user, client).await?;
        Ok(LoginOutcome::Authenticated(session))
    }

    /// Shared tail of every successful login: suspicious-login check before
    /// the session write clobbers the previous login markers, then counter
    /// reset, session start, audit.
    async fn finish_login(
        &self,
        user: &user::Model,
        client: &ClientInfo,
    ) -> Result<crate::types::internal::auth::AuthenticatedSession, AuthError> {
        let suspicious = self.is_suspicious(user, client);

        // Zero the counter and drop any stale (expired) lock.
        self.user_store.unlock(user.id).await?;
        let session = self.session_service.start_session(user.id, client).await?;

        if let Err(e) = self.audit_logger.log_login_success(user.id, client).await {
            tracing::error!(user_id = user.id, error = %e, "failed to audit login");
        }

        if suspicious {
            let ip = client.ip_address.clone().unwrap_or_else(|| "unknown".into());
            self.notifier
                .login_alert(&user.email, &user.full_name(), &ip)
                .await;
        }

        Ok(session)
    }

    /// Notify-only heuristic: a login from an IP different from the last one,
    /// or the first login in over the configured number of days.
    fn is_suspicious(&self, user: &user::Model, client: &ClientInfo) -> bool {
        let ip_changed = match (&user.last_login_ip, &client.ip_address) {
            (Some(last), Some(current)) => last != current,
            _ => false,
        };
        let long_absence = match user.last_login {
            Some(last) => {
                Utc::now().timestamp() - last > self.settings.suspicious_login_days * 86_400
            }
            None => false,
        };
        ip_changed || long_absence
    }

    /// Record one failed attempt and pick the error the client sees.
    /// Reaching the threshold fires the lockout audit event and email alert
    /// and overrides `otherwise` with the lockout error.
    async fn register_failure(
        &self,
        user: &user::Model,
        client: &ClientInfo,
        otherwise: AuthError,
    ) -> AuthError {
        let outcome = match self
            .user_store
            .record_failed_attempt(
                user.id,
                self.settings.lockout_threshold,
                self.settings.lockout_duration_secs(),
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return e.into(),
        };

        if outcome.locked {
            let locked_until = outcome.locked_until.unwrap_or_default();
            if let Err(e) = self
                .audit_logger
                .log_account_locked(user.id, locked_until, client)
                .await
            {
                tracing::error!(user_id = user.id, error = %e, "failed to audit lockout");
            }
            self.notifier
                .account_locked(
                    &user.email,
                    &user.full_name(),
                    self.settings.lockout_duration_minutes,
                )
                .await;
            return AuthError::account_locked(self.settings.lockout_duration_minutes);
        }

        otherwise
    }

    async fn audit_failed(
        &self,
        user_id: Option<i32>,
        email: &str,
        reason: &str,
        client: &ClientInfo,
    ) {
        if let Err(e) = self
            .audit_logger
            .log_login_failed(user_id, email, reason, client)
            .await
        {
            tracing::error!(email, error = %e, "failed to audit login failure");
        }
    }
}
