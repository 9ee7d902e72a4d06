/// Invitation ledger
///
/// An invitation is a single-use, time-boxed secret that authorizes
/// self-service account creation outside open registration. The raw code is
/// 32 bytes of OS randomness, base64url-encoded, returned exactly once to
/// the inviting Owner; only its SHA-256 hash is stored. Invitations expire
/// 24 hours after creation and are consumed at most once.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL,
///     code_hash VARCHAR(64) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL,
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

/// Number of random bytes in a raw invitation code
const CODE_BYTES: usize = 32;

/// How long an invitation stays acceptable
pub const INVITATION_LIFETIME_HOURS: i64 = 24;

/// Invitation record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    /// Unique invitation ID
    pub id: Uuid,

    /// Invited email address (case-insensitive)
    pub email: String,

    /// SHA-256 hex hash of the raw code (never the raw code)
    pub code_hash: String,

    /// When the invitation was created
    pub created_at: DateTime<Utc>,

    /// Creation time + 24 hours
    pub expires_at: DateTime<Utc>,

    /// When the invitation was accepted; None while outstanding
    pub used_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of an invitation at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationState {
    /// Unused and not yet expired
    Usable,

    /// Already accepted
    Used,

    /// Past its expiry without being accepted
    Expired,
}

impl Invitation {
    /// Generates a raw invitation code: 32 bytes of OS randomness, base64url
    pub fn generate_code() -> String {
        let mut bytes = [0u8; CODE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hashes a raw invitation code with SHA-256 (hex, 64 chars)
    pub fn hash_code(raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Lifecycle state at the given instant
    ///
    /// An invitation at exactly `expires_at` is still acceptable (`<=` per
    /// the validity rule); `Used` wins over `Expired` when both apply.
    pub fn state_at(&self, now: DateTime<Utc>) -> InvitationState {
        if self.used_at.is_some() {
            InvitationState::Used
        } else if now > self.expires_at {
            InvitationState::Expired
        } else {
            InvitationState::Usable
        }
    }

    /// Persists a new invitation with the standard 24-hour expiry
    pub async fn create(pool: &PgPool, email: &str, code_hash: &str) -> Result<Self, sqlx::Error> {
        let expires_at = Utc::now() + Duration::hours(INVITATION_LIFETIME_HOURS);

        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (email, code_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, code_hash, created_at, expires_at, used_at
            "#,
        )
        .bind(email)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(invitation)
    }

    /// Finds an invitation by the hash of its code
    pub async fn find_by_code_hash(
        pool: &PgPool,
        code_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, email, code_hash, created_at, expires_at, used_at
            FROM invitations
            WHERE code_hash = $1
            "#,
        )
        .bind(code_hash)
        .fetch_optional(pool)
        .await?;

        Ok(invitation)
    }

    /// Checks whether the email has an outstanding (unused, unexpired)
    /// invitation — the duplicate-invite guard
    pub async fn has_outstanding_for_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM invitations
                WHERE email = $1
                  AND used_at IS NULL
                  AND expires_at >= NOW()
            )
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Marks an invitation as used
    ///
    /// Conditional on `used_at IS NULL`, so a concurrent second acceptance
    /// loses: only one caller ever observes `true`.
    pub async fn mark_used(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET used_at = NOW()
            WHERE id = $1 AND used_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
