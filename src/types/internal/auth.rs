use chrono::Utc;
use uuid::Uuid;

/// Short-lived checkpoint between password verification and TOTP entry.
///
/// Issued when a 2FA-enabled user submits valid credentials without a code.
/// The login only completes when the matching code arrives before expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTwoFactorAuth {
    pub id: Uuid,
    pub user_id: i32,
    pub expires_at: i64,
}

impl PendingTwoFactorAuth {
    pub fn new(user_id: i32, ttl_secs: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            expires_at: Utc::now().timestamp() + ttl_secs,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Result of a fully authenticated login.
///
/// `session_token` is the opaque value handed to the client; it embeds the
/// user id so the enforcement point can load the stored session id and
/// compare.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user_id: i32,
    pub session_id: String,
}

impl AuthenticatedSession {
    /// Wire format presented by clients on authenticated requests
    pub fn token(&self) -> String {
        format!("{}:{}", self.user_id, self.session_id)
    }

    /// Parse a presented token back into (user_id, session_id)
    pub fn parse_token(token: &str) -> Option<(i32, &str)> {
        let (user_id, session_id) = token.split_once(':')?;
        let user_id = user_id.parse().ok()?;
        if session_id.is_empty() {
            return None;
        }
        Some((user_id, session_id))
    }
}

/// Outcome of a login attempt that did not fail outright
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated(AuthenticatedSession),
    TwoFactorRequired(PendingTwoFactorAuth),
}
