/// User model and database operations
///
/// A user is a credential record scoped to one account (tenant). Emails are
/// case-insensitively unique across *all* accounts via CITEXT, which is what
/// makes the cross-tenant existence checks for registration and invitation
/// issuance a single indexed lookup.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role TEXT NOT NULL CHECK (role IN ('owner', 'contributor')),
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user within their account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Account owner: full control, can invite other users
    Owner,

    /// Contributor: day-to-day access, cannot manage membership
    Contributor,
}

impl UserRole {
    /// Role as the string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "owner",
            UserRole::Contributor => "contributor",
        }
    }

    /// Parses a role from its stored string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(UserRole::Owner),
            "contributor" => Some(UserRole::Contributor),
            _ => None,
        }
    }
}

/// User model representing a credential record
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Account (tenant) this user belongs to
    pub account_id: Uuid,

    /// Email address (case-insensitive via CITEXT, unique across accounts)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Role within the account
    pub role: UserRole,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Account the user belongs to (must already exist)
    pub account_id: Uuid,

    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Role within the account
    pub role: UserRole,

    /// Whether the email is pre-verified (true for invitation acceptance,
    /// false for open registration)
    pub email_verified: bool,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (account_id, email, password_hash, role, email_verified)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, account_id, email, password_hash, role, email_verified,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.account_id)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.email_verified)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, account_id, email, password_hash, role, email_verified,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Case-insensitive via the CITEXT column type, and deliberately *not*
    /// scoped to an account: login and the forgot-password flow identify
    /// users by email alone.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, account_id, email, password_hash, role, email_verified,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether any user (in any account) holds this email
    ///
    /// Case-insensitive. Used for duplicate-registration detection and the
    /// invitation duplicate guard.
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Marks a user's email as verified
    ///
    /// Returns `false` if the user doesn't exist.
    pub async fn mark_email_verified(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email_verified = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces a user's password hash
    ///
    /// Called only by the reset-password flow with an already-hashed value.
    pub async fn update_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the last login timestamp for a user
    ///
    /// Called after successful authentication.
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_as_str() {
        assert_eq!(UserRole::Owner.as_str(), "owner");
        assert_eq!(UserRole::Contributor.as_str(), "contributor");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("owner"), Some(UserRole::Owner));
        assert_eq!(UserRole::from_str("contributor"), Some(UserRole::Contributor));
        assert_eq!(UserRole::from_str("admin"), None);
    }

    #[test]
    fn test_user_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Owner).unwrap(), "\"owner\"");
        assert_eq!(
            serde_json::from_str::<UserRole>("\"contributor\"").unwrap(),
            UserRole::Contributor
        );
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::Owner,
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "owner@example.com");
    }

    // Integration tests for database operations are in the API crate's tests/
}
