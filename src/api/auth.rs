use std::sync::Arc;

use poem::Request;
use poem_openapi::{auth::ApiKey, payload::Json, OpenApi, SecurityScheme, Tags};
use uuid::Uuid;

use crate::errors::auth::AuthError;
use crate::services::{AccountService, LoginService, SessionService};
use crate::types::db::user;
use crate::types::dto::auth::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, ResetPasswordRequest, SessionResponse, TwoFactorConfirmRequest,
    TwoFactorDisableRequest, TwoFactorLoginRequest, TwoFactorSetupResponse, UserSummary,
};
use crate::types::internal::auth::LoginOutcome;
use crate::types::internal::client_info::ClientInfo;

/// Opaque session token issued at login, presented on every authenticated
/// request.
#[derive(SecurityScheme)]
#[oai(ty = "api_key", key_name = "X-Session-Token", key_in = "header")]
pub struct SessionAuth(pub ApiKey);

#[derive(Tags)]
enum AuthTags {
    /// Login, logout and session endpoints
    Authentication,
    /// Self-service account management
    Account,
}

/// Authentication and account API endpoints
pub struct AuthApi {
    login_service: Arc<LoginService>,
    session_service: Arc<SessionService>,
    account_service: Arc<AccountService>,
}

impl AuthApi {
    pub fn new(
        login_service: Arc<LoginService>,
        session_service: Arc<SessionService>,
        account_service: Arc<AccountService>,
    ) -> Self {
        Self {
            login_service,
            session_service,
            account_service,
        }
    }

    async fn current_user(
        &self,
        auth: &SessionAuth,
        client: &ClientInfo,
    ) -> Result<user::Model, AuthError> {
        self.session_service.authenticate(&auth.0.key, client).await
    }
}

fn summarize(user: &user::Model) -> UserSummary {
    UserSummary {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        full_name: user.full_name(),
        two_factor_enabled: user.two_factor_enabled,
        last_login: user.last_login,
    }
}

fn login_response(outcome: LoginOutcome, user: Option<&user::Model>) -> LoginResponse {
    match outcome {
        LoginOutcome::Authenticated(session) => LoginResponse {
            status: "ok".to_string(),
            session_token: Some(session.token()),
            pending_id: None,
            user: user.map(summarize),
        },
        LoginOutcome::TwoFactorRequired(pending) => LoginResponse {
            status: "two_factor_required".to_string(),
            session_token: None,
            pending_id: Some(pending.id.to_string()),
            user: None,
        },
    }
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Login with email and password. Accounts with 2FA enabled may submit
    /// the code inline or complete it via /auth/login/2fa.
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(
        &self,
        req: &Request,
        body: Json<LoginRequest>,
    ) -> Result<Json<LoginResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let outcome = self
            .login_service
            .attempt_login(
                &body.email,
                &body.password,
                body.two_factor_code.as_deref(),
                &client,
            )
            .await?;

        // Reload for the summary so last_login reflects this login.
        let user = match &outcome {
            LoginOutcome::Authenticated(session) => {
                self.session_service
                    .authenticate(&session.token(), &client)
                    .await
                    .ok()
            }
            LoginOutcome::TwoFactorRequired(_) => None,
        };
        Ok(Json(login_response(outcome, user.as_ref())))
    }

    /// Complete a login that stopped at the two-factor checkpoint
    #[oai(path = "/login/2fa", method = "post", tag = "AuthTags::Authentication")]
    async fn login_two_factor(
        &self,
        req: &Request,
        body: Json<TwoFactorLoginRequest>,
    ) -> Result<Json<LoginResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let pending_id =
            Uuid::parse_str(&body.pending_id).map_err(|_| AuthError::two_factor_required())?;
        let outcome = self
            .login_service
            .complete_two_factor(pending_id, &body.code, &client)
            .await?;
        let user = match &outcome {
            LoginOutcome::Authenticated(session) => {
                self.session_service
                    .authenticate(&session.token(), &client)
                    .await
                    .ok()
            }
            LoginOutcome::TwoFactorRequired(_) => None,
        };
        Ok(Json(login_response(outcome, user.as_ref())))
    }

    /// Current session details. Fails with 401 if the session was displaced
    /// by a newer login.
    #[oai(path = "/session", method = "get", tag = "AuthTags::Authentication")]
    async fn session(
        &self,
        req: &Request,
        auth: SessionAuth,
    ) -> Result<Json<SessionResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let user = self.current_user(&auth, &client).await?;
        Ok(Json(SessionResponse {
            user_id: user.id,
            username: user.username,
            email: user.email,
            last_activity: user.last_activity,
        }))
    }

    /// End the current session
    #[oai(path = "/logout", method = "post", tag = "AuthTags::Authentication")]
    async fn logout(
        &self,
        req: &Request,
        auth: SessionAuth,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let user = self.current_user(&auth, &client).await?;
        self.session_service.end_session(user.id, &client).await?;
        Ok(Json(MessageResponse {
            message: "Logged out".to_string(),
        }))
    }

    /// Register a new account
    #[oai(path = "/register", method = "post", tag = "AuthTags::Account")]
    async fn register(
        &self,
        req: &Request,
        body: Json<RegisterRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.account_service
            .register(
                &body.email,
                &body.username,
                &body.password,
                &body.first_name,
                &body.last_name,
                None,
                &client,
            )
            .await?;
        Ok(Json(MessageResponse {
            message: "Account created".to_string(),
        }))
    }

    /// Request a password reset email. Responds identically whether or not
    /// the email matches an account.
    #[oai(path = "/forgot-password", method = "post", tag = "AuthTags::Account")]
    async fn forgot_password(
        &self,
        req: &Request,
        body: Json<ForgotPasswordRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.account_service
            .request_password_reset(&body.email, &client)
            .await?;
        Ok(Json(MessageResponse {
            message: "If that email exists, a reset link has been sent".to_string(),
        }))
    }

    /// Complete a password reset with the emailed token
    #[oai(path = "/reset-password", method = "post", tag = "AuthTags::Account")]
    async fn reset_password(
        &self,
        req: &Request,
        body: Json<ResetPasswordRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        self.account_service
            .complete_password_reset(&body.token, &body.new_password, &client)
            .await?;
        Ok(Json(MessageResponse {
            message: "Password has been reset. Please log in".to_string(),
        }))
    }

    /// Change password while logged in
    #[oai(path = "/change-password", method = "post", tag = "AuthTags::Account")]
    async fn change_password(
        &self,
        req: &Request,
        auth: SessionAuth,
        body: Json<ChangePasswordRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let user = self.current_user(&auth, &client).await?;
        self.account_service
            .change_password(&user, &body.current_password, &body.new_password, &client)
            .await?;
        Ok(Json(MessageResponse {
            message: "Password changed".to_string(),
        }))
    }

    /// Begin two-factor enrollment: returns the secret and provisioning URI
    #[oai(path = "/2fa/setup", method = "post", tag = "AuthTags::Account")]
    async fn two_factor_setup(
        &self,
        req: &Request,
        auth: SessionAuth,
    ) -> Result<Json<TwoFactorSetupResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let user = self.current_user(&auth, &client).await?;
        let (secret, provisioning_uri) = self.account_service.setup_two_factor(&user).await?;
        Ok(Json(TwoFactorSetupResponse {
            secret,
            provisioning_uri,
        }))
    }

    /// Confirm two-factor enrollment with a code from the authenticator app
    #[oai(path = "/2fa/confirm", method = "post", tag = "AuthTags::Account")]
    async fn two_factor_confirm(
        &self,
        req: &Request,
        auth: SessionAuth,
        body: Json<TwoFactorConfirmRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let user = self.current_user(&auth, &client).await?;
        self.account_service
            .confirm_two_factor(&user, &body.code, &client)
            .await?;
        Ok(Json(MessageResponse {
            message: "Two-factor authentication enabled".to_string(),
        }))
    }

    /// Disable two-factor authentication (requires the current password)
    #[oai(path = "/2fa/disable", method = "post", tag = "AuthTags::Account")]
    async fn two_factor_disable(
        &self,
        req: &Request,
        auth: SessionAuth,
        body: Json<TwoFactorDisableRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let client = ClientInfo::from_request(req);
        let user = self.current_user(&auth, &client).await?;
        self.account_service
            .disable_two_factor(&user, &body.password, &client)
            .await?;
        Ok(Json(MessageResponse {
            message: "Two-factor authentication disabled".to_string(),
        }))
    }
}
