use sea_orm::DbErr;

/// Errors internal to stores and services. These never cross the API
/// boundary directly; the API layer converts them to AuthError.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: DbErr,
    },

    #[error("audit log write failed: {0}")]
    AuditWrite(String),

    #[error("user {0} not found")]
    UserMissing(i32),

    #[error("role {0} not found")]
    RoleMissing(String),

    #[error("application {0} not found")]
    ApplicationMissing(String),

    #[error("password hashing failed: {0}")]
    Crypto(String),

    #[error("TOTP error: {0}")]
    Totp(String),
}

impl InternalError {
    pub fn database(operation: &'static str, source: DbErr) -> Self {
        Self::Database { operation, source }
    }
}
