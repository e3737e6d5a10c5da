use poem_openapi::{payload::Json, ApiResponse, Object};
use std::fmt;

/// Standardized error response for authentication endpoints
#[derive(Object, Debug)]
pub struct AuthErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Authentication and authorization error taxonomy.
///
/// InvalidCredentials deliberately covers both unknown email and wrong
/// password so callers cannot enumerate accounts.
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Invalid email or password
    #[oai(status = 401)]
    InvalidCredentials(Json<AuthErrorResponse>),

    /// Account temporarily locked after repeated failures
    #[oai(status = 403)]
    AccountLocked(Json<AuthErrorResponse>),

    /// Account deactivated by an administrator
    #[oai(status = 403)]
    AccountDisabled(Json<AuthErrorResponse>),

    /// A TOTP code is required to finish this login
    #[oai(status = 401)]
    TwoFactorRequired(Json<AuthErrorResponse>),

    /// The submitted TOTP code did not verify
    #[oai(status = 401)]
    TwoFactorInvalid(Json<AuthErrorResponse>),

    /// The presented session id was superseded by a newer login
    #[oai(status = 401)]
    SessionDisplaced(Json<AuthErrorResponse>),

    /// Missing or malformed session token
    #[oai(status = 401)]
    Unauthenticated(Json<AuthErrorResponse>),

    /// Password reset token does not match or has expired
    #[oai(status = 400)]
    ResetTokenInvalid(Json<AuthErrorResponse>),

    /// Caller lacks the required role/functionality grant
    #[oai(status = 403)]
    PermissionDenied(Json<AuthErrorResponse>),

    /// Email or username already registered
    #[oai(status = 400)]
    DuplicateAccount(Json<AuthErrorResponse>),

    /// Referenced user, role or application does not exist
    #[oai(status = 404)]
    NotFound(Json<AuthErrorResponse>),

    /// Name or key is already in use
    #[oai(status = 409)]
    Conflict(Json<AuthErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<AuthErrorResponse>),
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials(Json(AuthErrorResponse {
            error: "invalid_credentials".to_string(),
            message: "Invalid email or password".to_string(),
            status_code: 401,
        }))
    }

    pub fn account_locked(minutes_remaining: i64) -> Self {
        AuthError::AccountLocked(Json(AuthErrorResponse {
            error: "account_locked".to_string(),
            message: format!(
                "Account temporarily locked. Try again in {} minutes",
                minutes_remaining.max(1)
            ),
            status_code: 403,
        }))
    }

    pub fn account_disabled() -> Self {
        AuthError::AccountDisabled(Json(AuthErrorResponse {
            error: "account_disabled".to_string(),
            message: "Account is deactivated. Contact an administrator".to_string(),
            status_code: 403,
        }))
    }

    pub fn two_factor_required() -> Self {
        AuthError::TwoFactorRequired(Json(AuthErrorResponse {
            error: "two_factor_required".to_string(),
            message: "A two-factor authentication code is required".to_string(),
            status_code: 401,
        }))
    }

    pub fn two_factor_invalid() -> Self {
        AuthError::TwoFactorInvalid(Json(AuthErrorResponse {
            error: "two_factor_invalid".to_string(),
            message: "Invalid two-factor authentication code".to_string(),
            status_code: 401,
        }))
    }

    pub fn session_displaced() -> Self {
        AuthError::SessionDisplaced(Json(AuthErrorResponse {
            error: "session_displaced".to_string(),
            message: "Your session was displaced by another login".to_string(),
            status_code: 401,
        }))
    }

    pub fn unauthenticated() -> Self {
        AuthError::Unauthenticated(Json(AuthErrorResponse {
            error: "unauthenticated".to_string(),
            message: "Authentication required".to_string(),
            status_code: 401,
        }))
    }

    pub fn reset_token_invalid() -> Self {
        AuthError::ResetTokenInvalid(Json(AuthErrorResponse {
            error: "reset_token_invalid".to_string(),
            message: "Reset link is invalid or has expired. Request a new one".to_string(),
            status_code: 400,
        }))
    }

    pub fn permission_denied() -> Self {
        AuthError::PermissionDenied(Json(AuthErrorResponse {
            error: "permission_denied".to_string(),
            message: "You do not have permission to perform this action".to_string(),
            status_code: 403,
        }))
    }

    pub fn duplicate_account() -> Self {
        AuthError::DuplicateAccount(Json(AuthErrorResponse {
            error: "duplicate_account".to_string(),
            message: "Email or username is already registered".to_string(),
            status_code: 400,
        }))
    }

    pub fn not_found(message: String) -> Self {
        AuthError::NotFound(Json(AuthErrorResponse {
            error: "not_found".to_string(),
            message,
            status_code: 404,
        }))
    }

    pub fn conflict(message: String) -> Self {
        AuthError::Conflict(Json(AuthErrorResponse {
            error: "conflict".to_string(),
            message,
            status_code: 409,
        }))
    }

    pub fn internal_error(message: String) -> Self {
        AuthError::InternalError(Json(AuthErrorResponse {
            error: "internal_error".to_string(),
            message,
            status_code: 500,
        }))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(json) => json.0.message.clone(),
            AuthError::AccountLocked(json) => json.0.message.clone(),
            AuthError::AccountDisabled(json) => json.0.message.clone(),
            AuthError::TwoFactorRequired(json) => json.0.message.clone(),
            AuthError::TwoFactorInvalid(json) => json.0.message.clone(),
            AuthError::SessionDisplaced(json) => json.0.message.clone(),
            AuthError::Unauthenticated(json) => json.0.message.clone(),
            AuthError::ResetTokenInvalid(json) => json.0.message.clone(),
            AuthError::PermissionDenied(json) => json.0.message.clone(),
            AuthError::DuplicateAccount(json) => json.0.message.clone(),
            AuthError::NotFound(json) => json.0.message.clone(),
            AuthError::Conflict(json) => json.0.message.clone(),
            AuthError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<crate::errors::InternalError> for AuthError {
    fn from(err: crate::errors::InternalError) -> Self {
        AuthError::internal_error(err.to_string())
    }
}
