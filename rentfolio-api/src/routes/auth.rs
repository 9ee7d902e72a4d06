/// Authentication endpoints
///
/// One handler per use case; each validates its input, sequences the
/// identity/token services, and maps outcomes to the transport. The
/// enumeration-safety rules live in the services; handlers only add the
/// security-monitoring log on failed logins and the fire-and-forget email
/// dispatch.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new account + owner user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/logout` - Revoke one refresh token (idempotent)
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
/// - `POST /v1/auth/verify-email` - Consume a verification link token
/// - `POST /v1/auth/forgot-password` - Request a reset link
/// - `POST /v1/auth/reset-password` - Consume a reset link token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    services::{identity, invitations, tokens},
};
use axum::{extract::State, Json};
use rentfolio_shared::models::{
    account::Account,
    user::{User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Constant forgot-password response, identical whether or not the email
/// exists
pub const MSG_FORGOT_PASSWORD: &str =
    "If that email address is registered, a password reset link has been sent";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (policy enforced at the credential layer)
    pub password: String,

    /// Name of the account (tenant) to create
    #[validate(length(min = 1, max = 255, message = "Account name must be 1-255 characters"))]
    pub account_name: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// New user ID
    pub user_id: String,

    /// New account ID
    pub account_id: String,

    /// Always true: login is blocked until the email is verified
    pub requires_email_verification: bool,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,

    /// Optional device label stored on the refresh token
    pub device_name: Option<String>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// Account ID
    pub account_id: String,

    /// Role within the account
    pub role: UserRole,

    /// Signed access token
    pub access_token: String,

    /// Access-token lifetime in seconds
    pub expires_in: i64,

    /// Opaque refresh token (handed out exactly once)
    pub refresh_token: String,
}

/// Logout request; the token is optional so logout succeeds with no session
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to revoke, if the caller has one
    pub refresh_token: Option<String>,
}

/// Refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,

    /// Optional device label for the replacement token (rotation only)
    pub device_name: Option<String>,
}

/// Refresh response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token
    pub access_token: String,

    /// Access-token lifetime in seconds
    pub expires_in: i64,

    /// Replacement refresh token, present only when rotation is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Verify-email request
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    /// Encoded verification token from the emailed link
    pub token: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset-password request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    /// Encoded reset token from the emailed link
    pub token: String,

    /// Replacement password
    pub new_password: String,
}

/// Simple message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

/// Maps `validator` errors onto the API validation shape
pub(crate) fn map_validation_errors(e: validator::ValidationErrors) -> ApiError {
    let errors: Vec<ValidationErrorDetail> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    ApiError::ValidationError(errors)
}

/// Register a new account and its owner user
///
/// Checks email existence first and fails field-level. This leak is
/// deliberate: the caller is actively choosing that email, unlike login.
/// Account and user creation are two writes; a failure after the first is
/// compensated by deleting the account.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: invalid email, account name, or password
///   policy violations (all violations listed)
/// - `500 Internal Server Error`: server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    req.validate().map_err(map_validation_errors)?;

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::field_violations(
            "email",
            vec!["Email already exists".to_string()],
        ));
    }

    let account = Account::create(&state.db, &req.account_name).await?;

    let user = match identity::create_user(
        &state.db,
        account.id,
        &req.email,
        &req.password,
        UserRole::Owner,
        false,
    )
    .await
    {
        Ok(user) => user,
        Err(err) => {
            invitations::compensate_account_creation(&state.db, account.id).await;
            return Err(err);
        }
    };

    let token = identity::generate_email_verification_token(&state.db, user.id).await?;
    state.mailer.send_verification_email(&user.email, &token).await;

    Ok(Json(RegisterResponse {
        user_id: user.id.to_string(),
        account_id: account.id.to_string(),
        requires_email_verification: true,
    }))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: one generic message for unknown email and wrong
///   password; a distinct message for an unverified email
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(map_validation_errors)?;

    let user = match identity::validate_credentials(&state.db, &req.email, &req.password).await? {
        identity::CredentialCheck::Valid(user) => user,
        identity::CredentialCheck::InvalidCredentials => {
            tracing::warn!(email = %req.email, "failed login attempt");
            return Err(ApiError::Unauthorized(
                identity::MSG_INVALID_CREDENTIALS.to_string(),
            ));
        }
        identity::CredentialCheck::EmailNotVerified => {
            tracing::warn!(email = %req.email, "login attempt on unverified email");
            return Err(ApiError::Unauthorized(
                identity::MSG_EMAIL_NOT_VERIFIED.to_string(),
            ));
        }
    };

    User::update_last_login(&state.db, user.id).await?;

    let (access_token, expires_in) = tokens::issue_access_token(&user, &state.jwt_settings())?;
    let refresh_token = tokens::issue_refresh_token(
        &state.db,
        &user,
        req.device_name,
        state.config.tokens.refresh_token_days,
    )
    .await?;

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        account_id: user.account_id.to_string(),
        role: user.role,
        access_token,
        expires_in,
        refresh_token,
    }))
}

/// Logout endpoint
///
/// Idempotent: succeeds with no token, with an unknown token, and with an
/// already-revoked token. When a token is supplied, exactly that token is
/// revoked so other devices' sessions survive.
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if let Some(raw) = req.refresh_token {
        tokens::revoke_refresh_token(&state.db, &raw).await?;
    }

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Token refresh endpoint
///
/// Exchanges a valid refresh token for a new access token bound to the
/// user's current role. When rotation is enabled in configuration, the
/// presented token is revoked and a replacement is returned.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown, revoked, or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let (_, user) = tokens::validate_refresh_token(&state.db, &req.refresh_token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let (access_token, expires_in) = tokens::issue_access_token(&user, &state.jwt_settings())?;

    let refresh_token = if state.config.tokens.rotate_refresh_tokens {
        tokens::revoke_refresh_token(&state.db, &req.refresh_token).await?;
        Some(
            tokens::issue_refresh_token(
                &state.db,
                &user,
                req.device_name,
                state.config.tokens.refresh_token_days,
            )
            .await?,
        )
    } else {
        None
    };

    Ok(Json(RefreshResponse {
        access_token,
        expires_in,
        refresh_token,
    }))
}

/// Email verification endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: malformed, unknown, or expired link (one message)
/// - `409 Conflict`: the account is already verified
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    identity::verify_email(&state.db, &req.token).await?;

    Ok(Json(MessageResponse {
        message: "Email verified".to_string(),
    }))
}

/// Forgot-password endpoint
///
/// Always returns the identical success shape whether or not the email
/// exists. Internally a reset link is dispatched only when it does.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(map_validation_errors)?;

    match identity::user_by_email(&state.db, &req.email).await? {
        Some(user) => {
            let token = identity::generate_password_reset_token(&state.db, user.id).await?;
            state.mailer.send_password_reset_email(&user.email, &token).await;
        }
        None => {
            tracing::info!("password reset requested for unknown email");
        }
    }

    Ok(Json(MessageResponse {
        message: MSG_FORGOT_PASSWORD.to_string(),
    }))
}

/// Reset-password endpoint
///
/// On success every refresh token for the user is revoked, forcing re-login
/// on all devices.
///
/// # Errors
///
/// - `401 Unauthorized`: one generic message for every token failure
/// - `422 Unprocessable Entity`: new-password policy violations
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = identity::reset_password(&state.db, &req.token, &req.new_password).await?;

    let revoked = tokens::revoke_all_for_user(&state.db, user_id).await?;
    tracing::info!(%user_id, revoked, "password reset; all refresh tokens revoked");

    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}
