/// One-time token ledger backing verification and password-reset links
///
/// This is the time-boxed, consume-once mechanism behind the opaque half of
/// an encoded link token (see [`crate::auth::one_time`]). Secrets are 32
/// bytes of OS randomness, handed out base64url-encoded and stored only as
/// SHA-256 hashes. Issuing a new token for the same user and purpose
/// invalidates any outstanding one, and consumption is a single conditional
/// `UPDATE` so a token can never be spent twice, even concurrently.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE one_time_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     purpose TEXT NOT NULL CHECK (purpose IN ('verify_email', 'reset_password')),
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     used_at TIMESTAMPTZ
/// );
/// ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Number of random bytes in a raw one-time secret
const SECRET_BYTES: usize = 32;

/// What a one-time token authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Confirms ownership of the registered email address
    VerifyEmail,

    /// Authorizes replacing the password
    ResetPassword,
}

impl TokenPurpose {
    /// Purpose as the string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::VerifyEmail => "verify_email",
            TokenPurpose::ResetPassword => "reset_password",
        }
    }

    /// How long a token for this purpose stays consumable
    ///
    /// Verification links live a day; reset links are short because they
    /// grant a password change.
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenPurpose::VerifyEmail => Duration::hours(24),
            TokenPurpose::ResetPassword => Duration::hours(1),
        }
    }
}

/// One-time token record (hash only, never the secret)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OneTimeToken {
    /// Unique record ID
    pub id: Uuid,

    /// User the token was issued for
    pub user_id: Uuid,

    /// What the token authorizes
    pub purpose: TokenPurpose,

    /// SHA-256 hex hash of the raw secret
    pub token_hash: String,

    /// Hard expiry
    pub expires_at: DateTime<Utc>,

    /// When the token was issued
    pub created_at: DateTime<Utc>,

    /// When the token was consumed; None while outstanding
    pub used_at: Option<DateTime<Utc>>,
}

impl OneTimeToken {
    /// Generates a raw one-time secret: 32 bytes of OS randomness, base64url
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hashes a raw secret with SHA-256 (hex, 64 chars)
    pub fn hash_secret(raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Issues a fresh token for a user and purpose, returning the raw secret
    ///
    /// Any outstanding unused token for the same user and purpose is removed
    /// first, so at most one link per purpose is live at a time.
    pub async fn issue(
        pool: &PgPool,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> Result<String, sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM one_time_tokens
            WHERE user_id = $1 AND purpose = $2 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .execute(pool)
        .await?;

        let raw = Self::generate_secret();
        let token_hash = Self::hash_secret(&raw);
        let expires_at = Utc::now() + purpose.lifetime();

        sqlx::query(
            r#"
            INSERT INTO one_time_tokens (user_id, purpose, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(raw)
    }

    /// Consumes a token: valid exactly once
    ///
    /// Returns `true` iff a live, matching token existed. The check and the
    /// `used_at` write are one conditional `UPDATE`, so a concurrent second
    /// consumption of the same secret observes `false`.
    pub async fn consume(
        pool: &PgPool,
        user_id: Uuid,
        purpose: TokenPurpose,
        raw: &str,
    ) -> Result<bool, sqlx::Error> {
        let token_hash = Self::hash_secret(raw);

        let result = sqlx::query(
            r#"
            UPDATE one_time_tokens
            SET used_at = NOW()
            WHERE user_id = $1
              AND purpose = $2
              AND token_hash = $3
              AND used_at IS NULL
              AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .bind(token_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
