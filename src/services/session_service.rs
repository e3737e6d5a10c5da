use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

use crate::audit::AuditLogger;
use crate::errors::AuthError;
use crate::stores::UserStore;
use crate::types::db::user;
use crate::types::internal::auth::AuthenticatedSession;
use crate::types::internal::client_info::ClientInfo;

/// Single-active-session enforcement.
///
/// Each login stores a fresh random session id on the user row, silently
/// displacing whatever was there. A displaced client finds out on its next
/// request, when the id it presents no longer matches the stored one.
pub struct SessionService {
    user_store: Arc<UserStore>,
    audit_logger: Arc<AuditLogger>,
}

impl SessionService {
    pub fn new(user_store: Arc<UserStore>, audit_logger: Arc<AuditLogger>) -> Self {
        Self {
            user_store,
            audit_logger,
        }
    }

    fn generate_session_id() -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Start a new session for a fully authenticated user. Overwrites any
    /// existing session state in one update.
    pub async fn start_session(
        &self,
        user_id: i32,
        client: &ClientInfo,
    ) -> Result<AuthenticatedSession, AuthError> {
        let session_id = Self::generate_session_id();
        self.user_store
            .start_session(
                user_id,
                &session_id,
                client.ip_address.as_deref(),
                client.user_agent.as_deref(),
            )
            .await?;
        Ok(AuthenticatedSession {
            user_id,
            session_id,
        })
    }

    /// Validate a presented session token and return the owning user.
    ///
    /// A token whose session id no longer matches the stored one means a
    /// newer login displaced it; the caller gets SessionDisplaced and the
    /// event is audited. Valid requests bump last_activity.
    pub async fn authenticate(
        &self,
        token: &str,
        client: &ClientInfo,
    ) -> Result<user::Model, AuthError> {
        let (user_id, session_id) =
            AuthenticatedSession::parse_token(token).ok_or_else(AuthError::unauthenticated)?;

        let user = self
            .user_store
            .find_by_id(user_id)
            .await?
            .ok_or_else(AuthError::unauthenticated)?;

        if !user.is_active {
            return Err(AuthError::account_disabled());
        }

        match user.current_session_id.as_deref() {
            Some(current) if current == session_id => {}
            Some(_) => {
                if let Err(e) = self
                    .audit_logger
                    .log_session_displaced(user_id, client)
                    .await
                {
                    tracing::error!(user_id, error = %e, "failed to audit session displacement");
                }
                return Err(AuthError::session_displaced());
            }
            None => return Err(AuthError::unauthenticated()),
        }

        self.user_store.touch_activity(user_id).await?;
        Ok(user)
    }

    pub async fn end_session(&self, user_id: i32, client: &ClientInfo) -> Result<(), AuthError> {
        self.user_store.clear_session(user_id).await?;
        if let Err(e) = self.audit_logger.log_logout(user_id, client).await {
            tracing::error!(user_id, error = %e, "failed to audit logout");
        }
        Ok(())
    }
}
