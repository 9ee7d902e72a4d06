/// Invitation service
///
/// Invitation issuance, validation, and acceptance. Unlike login, the
/// failure messages here are distinct ("not found" / "already used" /
/// "expired") because the code itself is the secret; knowing an invitation's
/// state reveals nothing about any email address.
///
/// Acceptance performs the two-write provisioning (Account then User) with
/// an idempotent compensating delete, the same shape open registration uses.

use chrono::Utc;
use rentfolio_shared::models::{
    account::Account,
    invitation::{Invitation, InvitationState},
    user::{User, UserRole},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::identity;
use crate::error::{ApiError, ApiResult};

/// Message for an unknown invitation code
pub const MSG_INVITATION_NOT_FOUND: &str = "Invitation not found";

/// Message for an already-accepted invitation
pub const MSG_INVITATION_USED: &str = "Invitation already used";

/// Message for an expired invitation
pub const MSG_INVITATION_EXPIRED: &str = "Invitation expired";

/// Outcome of checking an invitation code
#[derive(Debug, PartialEq, Eq)]
pub enum InvitationCheck {
    /// Outstanding and acceptable; carries the invited email
    Valid {
        /// Email address the invitation was issued for
        email: String,
    },

    /// No invitation matches the code
    NotFound,

    /// Already accepted
    AlreadyUsed,

    /// Past its 24-hour expiry
    Expired,
}

impl InvitationCheck {
    /// The user-facing message for an invalid check, `None` when valid
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            InvitationCheck::Valid { .. } => None,
            InvitationCheck::NotFound => Some(MSG_INVITATION_NOT_FOUND),
            InvitationCheck::AlreadyUsed => Some(MSG_INVITATION_USED),
            InvitationCheck::Expired => Some(MSG_INVITATION_EXPIRED),
        }
    }
}

/// Creates an invitation for an email address
///
/// Fails if the email already has a credential record in any account, or an
/// outstanding unused invitation. Returns the stored record and the raw
/// code; the code is handed out exactly once and only its hash is kept.
pub async fn create_invitation(pool: &PgPool, email: &str) -> ApiResult<(Invitation, String)> {
    if User::email_exists(pool, email).await? {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }

    if Invitation::has_outstanding_for_email(pool, email).await? {
        return Err(ApiError::Conflict(
            "An invitation for this email is already outstanding".to_string(),
        ));
    }

    let raw_code = Invitation::generate_code();
    let code_hash = Invitation::hash_code(&raw_code);
    let invitation = Invitation::create(pool, email, &code_hash).await?;

    Ok((invitation, raw_code))
}

/// Checks an invitation code without consuming it
pub async fn validate_invitation(pool: &PgPool, code: &str) -> ApiResult<InvitationCheck> {
    let code_hash = Invitation::hash_code(code);

    let invitation = match Invitation::find_by_code_hash(pool, &code_hash).await? {
        Some(invitation) => invitation,
        None => return Ok(InvitationCheck::NotFound),
    };

    Ok(match invitation.state_at(Utc::now()) {
        InvitationState::Usable => InvitationCheck::Valid {
            email: invitation.email,
        },
        InvitationState::Used => InvitationCheck::AlreadyUsed,
        InvitationState::Expired => InvitationCheck::Expired,
    })
}

/// Accepts an invitation, provisioning a new account and user
///
/// Re-validates the code and re-checks email registration (the race window
/// between validate and accept), then creates the Account and the User with
/// the email pre-verified. If user creation fails after the account row was
/// written, the account is deleted as compensation and the original failure
/// is surfaced. On success the invitation is consumed so it cannot be
/// replayed.
pub async fn accept_invitation(
    pool: &PgPool,
    code: &str,
    plaintext_password: &str,
    account_name: &str,
) -> ApiResult<(Uuid, Uuid)> {
    let email = match validate_invitation(pool, code).await? {
        InvitationCheck::Valid { email } => email,
        check => {
            // error_message is Some for every non-valid variant
            let message = check
                .error_message()
                .unwrap_or(MSG_INVITATION_NOT_FOUND)
                .to_string();
            return Err(ApiError::Conflict(message));
        }
    };

    // Closes the race window between validation and acceptance
    if User::email_exists(pool, &email).await? {
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }

    let account = Account::create(pool, account_name).await?;

    let user = match identity::create_user(
        pool,
        account.id,
        &email,
        plaintext_password,
        UserRole::Owner,
        true,
    )
    .await
    {
        Ok(user) => user,
        Err(err) => {
            compensate_account_creation(pool, account.id).await;
            return Err(err);
        }
    };

    let code_hash = Invitation::hash_code(code);
    if let Some(invitation) = Invitation::find_by_code_hash(pool, &code_hash).await? {
        if !Invitation::mark_used(pool, invitation.id).await? {
            // A concurrent acceptance consumed it between our validate and
            // mark; the other winner keeps its user, we roll ours back.
            compensate_account_creation(pool, account.id).await;
            return Err(ApiError::Conflict(MSG_INVITATION_USED.to_string()));
        }
    }

    Ok((user.id, account.id))
}

/// Deletes an account written before a later provisioning step failed
///
/// Idempotent and log-observable; a failure here is logged but never
/// surfaced, since the original error is what the caller needs to see.
pub(crate) async fn compensate_account_creation(pool: &PgPool, account_id: Uuid) {
    match Account::delete(pool, account_id).await {
        Ok(deleted) => {
            tracing::warn!(%account_id, deleted, "rolled back account after failed provisioning");
        }
        Err(err) => {
            tracing::error!(%account_id, error = %err, "failed to roll back account");
        }
    }
}
