/// Invitation endpoints
///
/// # Endpoints
///
/// - `POST /v1/invitations` - Create an invitation (authenticated Owner)
/// - `POST /v1/invitations/validate` - Check a code without consuming it
/// - `POST /v1/invitations/accept` - Accept a code, provisioning account + user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::map_validation_errors,
    services::invitations::{self, InvitationCheck},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use rentfolio_shared::auth::middleware::SessionContext;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create-invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    /// Email address to invite
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Create-invitation response
///
/// The raw code is delivered out-of-band by email and never appears here.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvitationResponse {
    /// Invitation ID
    pub invitation_id: String,

    /// Invited email
    pub email: String,

    /// When the invitation stops being acceptable
    pub expires_at: DateTime<Utc>,
}

/// Validate-invitation request
#[derive(Debug, Deserialize)]
pub struct ValidateInvitationRequest {
    /// Raw invitation code
    pub code: String,
}

/// Validate-invitation response
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateInvitationResponse {
    /// Whether the code is currently acceptable
    pub valid: bool,

    /// Invited email, present only when valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Failure reason, present only when invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Accept-invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    /// Raw invitation code
    pub code: String,

    /// Password for the new user
    pub password: String,

    /// Optional name for the new account; defaults to one derived from the
    /// invited email
    #[validate(length(min = 1, max = 255, message = "Account name must be 1-255 characters"))]
    pub account_name: Option<String>,
}

/// Accept-invitation response
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptInvitationResponse {
    /// Newly created user ID
    pub user_id: String,

    /// Newly created account ID
    pub account_id: String,
}

/// Creates an invitation
///
/// Owner-only: the session context carries the caller's role and the check
/// happens here, at the authorization boundary.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an account Owner
/// - `409 Conflict`: email already registered or already invited
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(req): Json<CreateInvitationRequest>,
) -> ApiResult<Json<CreateInvitationResponse>> {
    if !session.is_owner() {
        return Err(ApiError::Forbidden(
            "Only account owners can send invitations".to_string(),
        ));
    }

    req.validate().map_err(map_validation_errors)?;

    let (invitation, raw_code) = invitations::create_invitation(&state.db, &req.email).await?;
    state.mailer.send_invitation_email(&invitation.email, &raw_code).await;

    Ok(Json(CreateInvitationResponse {
        invitation_id: invitation.id.to_string(),
        email: invitation.email,
        expires_at: invitation.expires_at,
    }))
}

/// Validates an invitation code without consuming it
///
/// Always returns 200; the body carries validity and a distinct reason for
/// each invalid case (the code itself is the secret, so the distinction
/// leaks nothing).
pub async fn validate_invitation(
    State(state): State<AppState>,
    Json(req): Json<ValidateInvitationRequest>,
) -> ApiResult<Json<ValidateInvitationResponse>> {
    let check = invitations::validate_invitation(&state.db, &req.code).await?;

    Ok(Json(match check {
        InvitationCheck::Valid { email } => ValidateInvitationResponse {
            valid: true,
            email: Some(email),
            message: None,
        },
        invalid => ValidateInvitationResponse {
            valid: false,
            email: None,
            message: invalid.error_message().map(str::to_string),
        },
    }))
}

/// Accepts an invitation
///
/// # Errors
///
/// - `409 Conflict`: code not found / already used / expired, or the email
///   was registered in the window since validation
/// - `422 Unprocessable Entity`: password policy violations
pub async fn accept_invitation(
    State(state): State<AppState>,
    Json(req): Json<AcceptInvitationRequest>,
) -> ApiResult<Json<AcceptInvitationResponse>> {
    req.validate().map_err(map_validation_errors)?;

    let account_name = match &req.account_name {
        Some(name) => name.clone(),
        None => default_account_name(&state, &req.code).await?,
    };

    let (user_id, account_id) =
        invitations::accept_invitation(&state.db, &req.code, &req.password, &account_name).await?;

    Ok(Json(AcceptInvitationResponse {
        user_id: user_id.to_string(),
        account_id: account_id.to_string(),
    }))
}

/// Derives an account name from the invited email's local part
async fn default_account_name(state: &AppState, code: &str) -> ApiResult<String> {
    let email = match invitations::validate_invitation(&state.db, code).await? {
        InvitationCheck::Valid { email } => email,
        // accept_invitation will produce the precise failure
        _ => return Ok("New Account".to_string()),
    };

    let local_part = email.split('@').next().unwrap_or("New");
    Ok(format!("{local_part}'s Account"))
}
