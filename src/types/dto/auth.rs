use poem_openapi::Object;

/// Login request payload
#[derive(Object, Debug)]
pub struct LoginRequest {
    /// Account email (matched case-insensitively)
    pub email: String,
    pub password: String,
    /// TOTP code, required when the account has 2FA enabled
    pub two_factor_code: Option<String>,
}

/// Second step of a 2FA login: the pending checkpoint plus the code
#[derive(Object, Debug)]
pub struct TwoFactorLoginRequest {
    pub pending_id: String,
    pub code: String,
}

/// Minimal user view returned after login (no sensitive fields)
#[derive(Object, Debug)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub two_factor_enabled: bool,
    pub last_login: Option<i64>,
}

/// Login response. `status` is "ok" when a session was started, or
/// "two_factor_required" when the caller must follow up with a code.
#[derive(Object, Debug)]
pub struct LoginResponse {
    pub status: String,
    pub session_token: Option<String>,
    pub pending_id: Option<String>,
    pub user: Option<UserSummary>,
}

/// Current session information
#[derive(Object, Debug)]
pub struct SessionResponse {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub last_activity: Option<i64>,
}

/// Self-service registration payload
#[derive(Object, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Generic confirmation message
#[derive(Object, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Object, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Object, Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Object, Debug)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// First phase of 2FA enrollment: secret plus otpauth:// URI to render as QR
#[derive(Object, Debug)]
pub struct TwoFactorSetupResponse {
    pub secret: String,
    pub provisioning_uri: String,
}

#[derive(Object, Debug)]
pub struct TwoFactorConfirmRequest {
    pub code: String,
}

/// Disabling 2FA requires the current password, not just a live session
#[derive(Object, Debug)]
pub struct TwoFactorDisableRequest {
    pub password: String,
}
