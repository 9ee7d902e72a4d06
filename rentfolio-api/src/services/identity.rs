/// Identity service
///
/// Credential creation and validation plus the email-verification and
/// password-reset link flows. This module owns the enumeration-safety
/// wording: unknown email and wrong password are the same variant with the
/// same message, and every failure branch of the link flows collapses to one
/// generic message (except password-policy violations, which are not
/// security-sensitive and are returned field-level).

use rentfolio_shared::{
    auth::{
        one_time::{decode_link_token, encode_link_token},
        password,
    },
    models::{
        one_time_token::{OneTimeToken, TokenPurpose},
        user::{CreateUser, User, UserRole},
    },
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Shared message for unknown email and wrong password. The two cases MUST
/// be indistinguishable to the caller.
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Message for a correct password on an unverified account
pub const MSG_EMAIL_NOT_VERIFIED: &str = "Please verify your email before signing in";

/// Shared message for malformed, unknown, and expired verification links
pub const MSG_INVALID_VERIFICATION_LINK: &str = "Invalid verification link";

/// Message for verifying an already-verified account
pub const MSG_VERIFICATION_ALREADY_USED: &str = "Verification link already used";

/// Shared message for every reset-link failure except password policy
pub const MSG_INVALID_RESET_LINK: &str = "Invalid or expired password reset link";

/// Outcome of a credential check
#[derive(Debug)]
pub enum CredentialCheck {
    /// Email found, password correct, email verified
    Valid(User),

    /// Unknown email or wrong password - deliberately one variant
    InvalidCredentials,

    /// Email found and password correct, but the address is unverified
    EmailNotVerified,
}

/// Creates a credential record for an already-provisioned account
///
/// The password policy is enforced here, at the credential layer, and every
/// violation is reported (never just the first).
pub async fn create_user(
    pool: &PgPool,
    account_id: Uuid,
    email: &str,
    plaintext_password: &str,
    role: UserRole,
    email_verified: bool,
) -> ApiResult<User> {
    if let Err(violations) = password::validate_password_policy(plaintext_password) {
        return Err(ApiError::field_violations("password", violations));
    }

    let password_hash = password::hash_password(plaintext_password)?;

    let user = User::create(
        pool,
        CreateUser {
            account_id,
            email: email.to_string(),
            password_hash,
            role,
            email_verified,
        },
    )
    .await?;

    Ok(user)
}

/// Validates an email/password pair
///
/// Looks up by normalized email across all accounts. When the email is
/// unknown, a verification is still run against a dummy hash so the timing
/// of the two failure cases stays indistinguishable.
pub async fn validate_credentials(
    pool: &PgPool,
    email: &str,
    plaintext_password: &str,
) -> ApiResult<CredentialCheck> {
    let user = match User::find_by_email(pool, email).await? {
        Some(user) => user,
        None => {
            let _ = password::verify_password(plaintext_password, password::DUMMY_PASSWORD_HASH);
            return Ok(CredentialCheck::InvalidCredentials);
        }
    };

    if !password::verify_password(plaintext_password, &user.password_hash)? {
        return Ok(CredentialCheck::InvalidCredentials);
    }

    if !user.email_verified {
        return Ok(CredentialCheck::EmailNotVerified);
    }

    Ok(CredentialCheck::Valid(user))
}

/// Issues an encoded email-verification token for a user
pub async fn generate_email_verification_token(pool: &PgPool, user_id: Uuid) -> ApiResult<String> {
    let opaque = OneTimeToken::issue(pool, user_id, TokenPurpose::VerifyEmail).await?;
    Ok(encode_link_token(user_id, &opaque))
}

/// Consumes a verification token and marks the user's email verified
///
/// # Errors
///
/// - `Conflict` with [`MSG_VERIFICATION_ALREADY_USED`] when the account is
///   already verified
/// - `Unauthorized` with [`MSG_INVALID_VERIFICATION_LINK`] for every other
///   failure (malformed, unknown user, expired or spent token)
pub async fn verify_email(pool: &PgPool, token: &str) -> ApiResult<()> {
    let (user_id, opaque) = decode_link_token(token)
        .map_err(|_| ApiError::Unauthorized(MSG_INVALID_VERIFICATION_LINK.to_string()))?;

    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(MSG_INVALID_VERIFICATION_LINK.to_string()))?;

    if user.email_verified {
        return Err(ApiError::Conflict(MSG_VERIFICATION_ALREADY_USED.to_string()));
    }

    let consumed = OneTimeToken::consume(pool, user_id, TokenPurpose::VerifyEmail, &opaque).await?;
    if !consumed {
        return Err(ApiError::Unauthorized(MSG_INVALID_VERIFICATION_LINK.to_string()));
    }

    User::mark_email_verified(pool, user_id).await?;

    Ok(())
}

/// Issues an encoded password-reset token for a user
pub async fn generate_password_reset_token(pool: &PgPool, user_id: Uuid) -> ApiResult<String> {
    let opaque = OneTimeToken::issue(pool, user_id, TokenPurpose::ResetPassword).await?;
    Ok(encode_link_token(user_id, &opaque))
}

/// Consumes a reset token and replaces the user's password hash
///
/// Returns the user id so the caller can revoke that user's refresh tokens.
///
/// # Errors
///
/// - `ValidationError` when the new password fails the policy (field-level,
///   not security-sensitive)
/// - `Unauthorized` with [`MSG_INVALID_RESET_LINK`] for every other failure
pub async fn reset_password(pool: &PgPool, token: &str, new_password: &str) -> ApiResult<Uuid> {
    let (user_id, opaque) = decode_link_token(token)
        .map_err(|_| ApiError::Unauthorized(MSG_INVALID_RESET_LINK.to_string()))?;

    if let Err(violations) = password::validate_password_policy(new_password) {
        return Err(ApiError::field_violations("new_password", violations));
    }

    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(MSG_INVALID_RESET_LINK.to_string()))?;

    let consumed =
        OneTimeToken::consume(pool, user_id, TokenPurpose::ResetPassword, &opaque).await?;
    if !consumed {
        return Err(ApiError::Unauthorized(MSG_INVALID_RESET_LINK.to_string()));
    }

    let password_hash = password::hash_password(new_password)?;
    User::update_password_hash(pool, user.id, &password_hash).await?;

    Ok(user.id)
}

/// Resolves an email to a user, for the forgot-password flow only
///
/// Case-insensitive, across all accounts. The caller must not let the
/// `None` case change any externally observable behavior.
pub async fn user_by_email(pool: &PgPool, email: &str) -> ApiResult<Option<User>> {
    Ok(User::find_by_email(pool, email).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages_are_distinct_constants() {
        // Login failures share one message; the verification and reset flows
        // each collapse to their own.
        assert_ne!(MSG_INVALID_CREDENTIALS, MSG_EMAIL_NOT_VERIFIED);
        assert_ne!(MSG_INVALID_VERIFICATION_LINK, MSG_INVALID_RESET_LINK);
        assert_ne!(MSG_INVALID_VERIFICATION_LINK, MSG_VERIFICATION_ALREADY_USED);
    }

    // Credential-store behavior is covered by the integration tests, which
    // exercise validate_credentials against a real database.
}
