/// Token service
///
/// Issues short-lived signed access tokens and long-lived opaque refresh
/// tokens, and validates/revokes the latter against the refresh-token
/// ledger. Access tokens carry no revocation list; their short lifetime is
/// the mitigation.

use chrono::{Duration, Utc};
use rentfolio_shared::{
    auth::jwt::{create_access_token, JwtSettings},
    models::{
        refresh_token::{CreateRefreshToken, RefreshToken},
        user::User,
    },
};
use sqlx::PgPool;

use crate::error::ApiResult;

/// Issues a signed access token for a user
///
/// Returns the token and its lifetime in seconds.
pub fn issue_access_token(user: &User, settings: &JwtSettings) -> ApiResult<(String, i64)> {
    let (token, expires_in) = create_access_token(user.id, user.account_id, user.role, settings)?;
    Ok((token, expires_in))
}

/// Issues an opaque refresh token for a user
///
/// Returns the raw token; only its hash is persisted. The raw value must
/// never be stored or logged.
pub async fn issue_refresh_token(
    pool: &PgPool,
    user: &User,
    device_name: Option<String>,
    lifetime_days: i64,
) -> ApiResult<String> {
    let raw = RefreshToken::generate_token();
    let token_hash = RefreshToken::hash_token(&raw);

    RefreshToken::create(
        pool,
        CreateRefreshToken {
            user_id: user.id,
            account_id: user.account_id,
            token_hash,
            device_name,
            lifetime: Duration::days(lifetime_days),
        },
    )
    .await?;

    Ok(raw)
}

/// Validates a raw refresh token
///
/// Hashes and looks up the token, checks revocation and expiry, then
/// re-fetches the user so role changes (and user deletion) take effect on
/// the next refresh rather than at token expiry. Returns `None` for every
/// invalid case; callers see only validity.
pub async fn validate_refresh_token(
    pool: &PgPool,
    raw: &str,
) -> ApiResult<Option<(RefreshToken, User)>> {
    let token_hash = RefreshToken::hash_token(raw);

    let token = match RefreshToken::find_by_hash(pool, &token_hash).await? {
        Some(token) => token,
        None => return Ok(None),
    };

    if !token.is_valid_at(Utc::now()) {
        return Ok(None);
    }

    let user = match User::find_by_id(pool, token.user_id).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    Ok(Some((token, user)))
}

/// Revokes a raw refresh token
///
/// Idempotent: revoking an unknown or already-revoked token is a no-op, not
/// an error.
pub async fn revoke_refresh_token(pool: &PgPool, raw: &str) -> ApiResult<()> {
    let token_hash = RefreshToken::hash_token(raw);
    RefreshToken::revoke_by_hash(pool, &token_hash).await?;
    Ok(())
}

/// Revokes every live refresh token for a user
///
/// Used after a password reset to force re-authentication on all devices.
pub async fn revoke_all_for_user(pool: &PgPool, user_id: uuid::Uuid) -> ApiResult<u64> {
    Ok(RefreshToken::revoke_all_for_user(pool, user_id).await?)
}
