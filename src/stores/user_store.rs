use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::errors::InternalError;
use crate::types::db::user::{self, Entity as User};

/// UserStore owns all reads and writes against the users table.
///
/// Session fields and lockout counters are mutated here and only here, so the
/// invariants (counter/lock interplay, all-or-nothing session state) live in
/// one place.
pub struct UserStore {
    db: DatabaseConnection,
}

/// Result of recording a failed login attempt.
pub struct FailedAttemptOutcome {
    pub attempts: i32,
    pub locked: bool,
    pub locked_until: Option<i64>,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, user_id: i32) -> Result<Option<user::Model>, InternalError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_by_id", e))
    }

    /// Email lookup is case-insensitive; addresses are stored lowercased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_by_email", e))
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_by_username", e))
    }

    pub async fn find_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(user::Column::ResetToken.eq(token))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_by_reset_token", e))
    }

    /// Insert a new user row. Email is lowercased before storage; the caller
    /// has already hashed the password.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: String,
        first_name: &str,
        last_name: &str,
        role_id: Option<i32>,
    ) -> Result<user::Model, InternalError> {
        let now = Utc::now().timestamp();
        let new_user = user::ActiveModel {
            email: Set(email.trim().to_lowercase()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            role_id: Set(role_id),
            is_active: Set(true),
            is_verified: Set(false),
            two_factor_enabled: Set(false),
            failed_login_attempts: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        new_user
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("create_user", e))
    }

    /// Increment the failed-attempt counter inside a transaction; on reaching
    /// the threshold, set locked_until and reset the counter to zero so the
    /// next window starts clean after the lock expires.
    pub async fn record_failed_attempt(
        &self,
        user_id: i32,
        threshold: i32,
        lockout_secs: i64,
    ) -> Result<FailedAttemptOutcome, InternalError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InternalError::database("record_failed_attempt.begin", e))?;

        let found = User::find_by_id(user_id)
            .one(&txn)
            .await
            .map_err(|e| InternalError::database("record_failed_attempt.find", e))?
            .ok_or(InternalError::UserMissing(user_id))?;

        let attempts = found.failed_login_attempts + 1;
        let now = Utc::now().timestamp();

        let mut active: user::ActiveModel = found.into();
        let outcome = if attempts >= threshold {
            let until = now + lockout_secs;
            active.failed_login_attempts = Set(0);
            active.locked_until = Set(Some(until));
            FailedAttemptOutcome {
                attempts,
                locked: true,
                locked_until: Some(until),
            }
        } else {
            active.failed_login_attempts = Set(attempts);
            FailedAttemptOutcome {
                attempts,
                locked: false,
                locked_until: None,
            }
        };
        active.updated_at = Set(now);
        active
            .update(&txn)
            .await
            .map_err(|e| InternalError::database("record_failed_attempt.update", e))?;

        txn.commit()
            .await
            .map_err(|e| InternalError::database("record_failed_attempt.commit", e))?;

        Ok(outcome)
    }

    /// Clear both the lock and the counter: after a successful login, an
    /// admin unlock, or a completed password reset.
    pub async fn unlock(&self, user_id: i32) -> Result<(), InternalError> {
        let found = self.require(user_id, "unlock").await?;
        let mut active: user::ActiveModel = found.into();
        active.locked_until = Set(None);
        active.failed_login_attempts = Set(0);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("unlock", e))?;
        Ok(())
    }

    pub async fn set_password_hash(
        &self,
        user_id: i32,
        password_hash: String,
    ) -> Result<(), InternalError> {
        let found = self.require(user_id, "set_password_hash").await?;
        let mut active: user::ActiveModel = found.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("set_password_hash", e))?;
        Ok(())
    }

    /// Record a new active session. All four session fields plus the
    /// last-login markers are written in one update; the previous session id
    /// is simply overwritten, which is what displaces the earlier session.
    pub async fn start_session(
        &self,
        user_id: i32,
        session_id: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), InternalError> {
        let found = self.require(user_id, "start_session").await?;
        let now = Utc::now().timestamp();
        let mut active: user::ActiveModel = found.into();
        active.current_session_id = Set(Some(session_id.to_string()));
        active.session_ip = Set(ip.map(str::to_string));
        active.session_user_agent = Set(user_agent.map(str::to_string));
        active.last_activity = Set(Some(now));
        active.last_login = Set(Some(now));
        active.last_login_ip = Set(ip.map(str::to_string));
        active.updated_at = Set(now);
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("start_session", e))?;
        Ok(())
    }

    pub async fn clear_session(&self, user_id: i32) -> Result<(), InternalError> {
        let found = self.require(user_id, "clear_session").await?;
        let mut active: user::ActiveModel = found.into();
        active.current_session_id = Set(None);
        active.session_ip = Set(None);
        active.session_user_agent = Set(None);
        active.last_activity = Set(None);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("clear_session", e))?;
        Ok(())
    }

    pub async fn touch_activity(&self, user_id: i32) -> Result<(), InternalError> {
        let found = self.require(user_id, "touch_activity").await?;
        let mut active: user::ActiveModel = found.into();
        active.last_activity = Set(Some(Utc::now().timestamp()));
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("touch_activity", e))?;
        Ok(())
    }

    pub async fn set_reset_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: i64,
    ) -> Result<(), InternalError> {
        let found = self.require(user_id, "set_reset_token").await?;
        let mut active: user::ActiveModel = found.into();
        active.reset_token = Set(Some(token.to_string()));
        active.reset_token_expires = Set(Some(expires_at));
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("set_reset_token", e))?;
        Ok(())
    }

    pub async fn clear_reset_token(&self, user_id: i32) -> Result<(), InternalError> {
        let found = self.require(user_id, "clear_reset_token").await?;
        let mut active: user::ActiveModel = found.into();
        active.reset_token = Set(None);
        active.reset_token_expires = Set(None);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("clear_reset_token", e))?;
        Ok(())
    }

    /// Store a provisional TOTP secret. two_factor_enabled stays false until
    /// the user confirms with a valid code.
    pub async fn set_two_factor_secret(
        &self,
        user_id: i32,
        secret: &str,
    ) -> Result<(), InternalError> {
        let found = self.require(user_id, "set_two_factor_secret").await?;
        let mut active: user::ActiveModel = found.into();
        active.two_factor_secret = Set(Some(secret.to_string()));
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("set_two_factor_secret", e))?;
        Ok(())
    }

    pub async fn enable_two_factor(&self, user_id: i32) -> Result<(), InternalError> {
        let found = self.require(user_id, "enable_two_factor").await?;
        let mut active: user::ActiveModel = found.into();
        active.two_factor_enabled = Set(true);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("enable_two_factor", e))?;
        Ok(())
    }

    pub async fn disable_two_factor(&self, user_id: i32) -> Result<(), InternalError> {
        let found = self.require(user_id, "disable_two_factor").await?;
        let mut active: user::ActiveModel = found.into();
        active.two_factor_enabled = Set(false);
        active.two_factor_secret = Set(None);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("disable_two_factor", e))?;
        Ok(())
    }

    pub async fn set_active(&self, user_id: i32, is_active: bool) -> Result<(), InternalError> {
        let found = self.require(user_id, "set_active").await?;
        let mut active: user::ActiveModel = found.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().timestamp());
        active
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("set_active", e))?;
        Ok(())
    }

    async fn require(
        &self,
        user_id: i32,
        operation: &'static str,
    ) -> Result<user::Model, InternalError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database(operation, e))?
            .ok_or(InternalError::UserMissing(user_id))
    }
}
