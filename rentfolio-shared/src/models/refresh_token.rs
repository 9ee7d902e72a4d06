/// Refresh token ledger
///
/// Refresh tokens are long-lived opaque secrets exchanged for new access
/// tokens. The raw value is 64 bytes of OS randomness, base64-encoded, and
/// handed to the caller exactly once; only its SHA-256 hash is persisted.
/// Lookups go by hash, so the database never sees the secret.
///
/// # State machine
///
/// `Active -> Expired` (time-driven, no mutation) or `Active -> Revoked`
/// (explicit, terminal). Both terminal states read as "invalid"; callers are
/// never told which one applied.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     device_name VARCHAR(255),
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     revoked_at TIMESTAMPTZ
/// );
/// ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Number of random bytes in a raw refresh token
const TOKEN_BYTES: usize = 64;

/// Refresh token record
///
/// Holds only the hash of the secret. Multiple live tokens per user are
/// expected (one per device/session).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    /// Unique token record ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Account the owning user belongs to
    pub account_id: Uuid,

    /// SHA-256 hex hash of the raw token (never the raw token)
    pub token_hash: String,

    /// Optional device label supplied at issue time
    pub device_name: Option<String>,

    /// Hard expiry; a token at exactly this instant is already invalid
    pub expires_at: DateTime<Utc>,

    /// When the token was issued
    pub created_at: DateTime<Utc>,

    /// When the token was revoked; None while active
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Input for persisting a new refresh token
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    /// Owning user
    pub user_id: Uuid,

    /// Account the owning user belongs to
    pub account_id: Uuid,

    /// SHA-256 hex hash of the raw token
    pub token_hash: String,

    /// Optional device label
    pub device_name: Option<String>,

    /// Token lifetime
    pub lifetime: Duration,
}

impl RefreshToken {
    /// Generates a raw refresh token: 64 bytes of OS randomness, base64
    ///
    /// The returned string is the caller-facing secret. It must never be
    /// persisted or logged; store [`RefreshToken::hash_token`] of it instead.
    pub fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        BASE64.encode(bytes)
    }

    /// Hashes a raw refresh token with SHA-256
    ///
    /// Returns a hex string (64 characters). Deterministic, so the hash is
    /// the lookup key.
    pub fn hash_token(raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Whether this token is valid at the given instant
    ///
    /// Valid iff not revoked and strictly before expiry: a token at exactly
    /// `expires_at` is invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }

    /// Persists a new refresh token record
    pub async fn create(pool: &PgPool, data: CreateRefreshToken) -> Result<Self, sqlx::Error> {
        let expires_at = Utc::now() + data.lifetime;

        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (user_id, account_id, token_hash, device_name, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, account_id, token_hash, device_name,
                      expires_at, created_at, revoked_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.account_id)
        .bind(data.token_hash)
        .bind(data.device_name)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Finds a refresh token record by its hash
    ///
    /// Returns the record regardless of validity; callers decide with
    /// [`RefreshToken::is_valid_at`].
    pub async fn find_by_hash(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, account_id, token_hash, device_name,
                   expires_at, created_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Revokes the token with the given hash
    ///
    /// Idempotent: revoking an already-revoked or unknown token is a no-op.
    /// Returns `true` only when a live token was actually revoked.
    pub async fn revoke_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE token_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes every currently-unrevoked token for a user
    ///
    /// Used after a password reset to force re-authentication on all devices.
    /// Returns the number of tokens revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE user_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists all live tokens for a user (diagnostics / device overview)
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tokens = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, account_id, token_hash, device_name,
                   expires_at, created_at, revoked_at
            FROM refresh_tokens
            WHERE user_id = $1
              AND revoked_at IS NULL
              AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_record(expires_at: DateTime<Utc>, revoked_at: Option<DateTime<Utc>>) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            token_hash: RefreshToken::hash_token("raw"),
            device_name: None,
            expires_at,
            created_at: Utc::now(),
            revoked_at,
        }
    }

    #[test]
    fn test_generate_token_is_random_and_decodable() {
        let a = RefreshToken::generate_token();
        let b = RefreshToken::generate_token();

        assert_ne!(a, b);
        assert_eq!(BASE64.decode(&a).unwrap().len(), TOKEN_BYTES);
        assert_eq!(BASE64.decode(&b).unwrap().len(), TOKEN_BYTES);
    }

    #[test]
    fn test_hash_token_deterministic() {
        let raw = RefreshToken::generate_token();
        let hash = RefreshToken::hash_token(&raw);

        assert_eq!(hash.len(), 64); // SHA-256 hex
        assert_eq!(hash, RefreshToken::hash_token(&raw));
        assert_ne!(hash, RefreshToken::hash_token("something else"));
    }

    #[test]
    fn test_valid_before_expiry() {
        let now = Utc::now();
        let token = token_record(now + Duration::days(7), None);
        assert!(token.is_valid_at(now));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();

        // Exactly at expiry: invalid
        let token = token_record(now, None);
        assert!(!token.is_valid_at(now));

        // One microsecond before expiry: valid
        let token = token_record(now + Duration::microseconds(1), None);
        assert!(token.is_valid_at(now));
    }

    #[test]
    fn test_revoked_token_is_invalid_even_before_expiry() {
        let now = Utc::now();
        let token = token_record(now + Duration::days(7), Some(now));
        assert!(!token.is_valid_at(now));
    }

    // Integration tests for database operations are in the API crate's tests/
}
