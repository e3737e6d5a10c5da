use sea_orm::entity::prelude::*;

/// SeaORM entity for the users table.
///
/// Session fields (current_session_id, session_ip, session_user_agent,
/// last_activity) are always written together; partial session state is
/// invalid.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,

    // Legacy primary role; additional roles live in user_roles
    pub role_id: Option<i32>,
    pub is_active: bool,
    pub is_verified: bool,

    pub two_factor_enabled: bool,
    pub two_factor_secret: Option<String>,

    pub failed_login_attempts: i32,
    pub locked_until: Option<i64>,
    pub last_login: Option<i64>,
    pub last_login_ip: Option<String>,

    pub current_session_id: Option<String>,
    pub session_ip: Option<String>,
    pub session_user_agent: Option<String>,
    pub last_activity: Option<i64>,

    pub reset_token: Option<String>,
    pub reset_token_expires: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A lockout is only effective while its expiry is in the future.
    pub fn is_locked(&self, now: i64) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
