/// JWT access-token generation and validation
///
/// Access tokens are signed with HS256 (HMAC-SHA256) and are the only
/// self-validating credential in the system: downstream consumers check the
/// signature and expiry, nothing else. There is no revocation list for access
/// tokens; the short lifetime (default 60 minutes) is the mitigation.
/// Long-lived refresh tokens are opaque random secrets handled by
/// [`crate::models::refresh_token`], not JWTs.
///
/// # Claims
///
/// Standard: `sub` (user id), `jti` (unique token id), `iat`, `exp`, `iss`,
/// `aud`. Custom: `user_id`, `account_id`, `role`. The role is additionally
/// duplicated into a `roles` array claim for consumers that expect the
/// conventional array-shaped claim.
///
/// # Example
///
/// ```
/// use rentfolio_shared::auth::jwt::{create_access_token, validate_access_token, JwtSettings};
/// use rentfolio_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = JwtSettings {
///     secret: "test-secret-key-at-least-32-bytes-long".to_string(),
///     issuer: "rentfolio".to_string(),
///     audience: "rentfolio-api".to_string(),
///     access_token_minutes: 60,
/// };
///
/// let user_id = Uuid::new_v4();
/// let account_id = Uuid::new_v4();
///
/// let (token, expires_in) = create_access_token(user_id, account_id, UserRole::Owner, &settings)?;
/// assert_eq!(expires_in, 3600);
///
/// let claims = validate_access_token(&token, &settings)?;
/// assert_eq!(claims.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer or audience
    #[error("Token issued for a different service")]
    WrongService,
}

/// Signing and lifetime settings for access tokens
///
/// Derived from the API configuration; the secret must be at least 32 bytes.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// Symmetric signing secret (>= 32 bytes)
    pub secret: String,

    /// Expected `iss` claim
    pub issuer: String,

    /// Expected `aud` claim
    pub audience: String,

    /// Access-token lifetime in minutes
    pub access_token_minutes: i64,
}

/// Access-token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Unique token ID
    pub jti: Uuid,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// User ID (custom claim, same value as `sub`)
    pub user_id: Uuid,

    /// Account (tenant) ID
    pub account_id: Uuid,

    /// User role within the account
    pub role: UserRole,

    /// Role duplicated as an array for consumers reading the conventional
    /// array-shaped claim
    pub roles: Vec<UserRole>,
}

impl AccessClaims {
    /// Builds claims for a user with the configured lifetime
    pub fn new(user_id: Uuid, account_id: Uuid, role: UserRole, settings: &JwtSettings) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::minutes(settings.access_token_minutes);

        Self {
            sub: user_id,
            jti: Uuid::new_v4(),
            iss: settings.issuer.clone(),
            aud: settings.audience.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            user_id,
            account_id,
            role,
            roles: vec![role],
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Seconds until expiration, measured from issue time
    pub fn lifetime_seconds(&self) -> i64 {
        self.exp - self.iat
    }
}

/// Creates a signed access token for a user
///
/// Returns the encoded token and its lifetime in seconds so callers can
/// report `expires_in` without re-decoding.
pub fn create_access_token(
    user_id: Uuid,
    account_id: Uuid,
    role: UserRole,
    settings: &JwtSettings,
) -> Result<(String, i64), JwtError> {
    let claims = AccessClaims::new(user_id, account_id, role, settings);
    let token = sign_claims(&claims, &settings.secret)?;
    Ok((token, claims.lifetime_seconds()))
}

fn sign_claims(claims: &AccessClaims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates an access token and extracts its claims
///
/// Verifies the signature, expiry, issuer, and audience. Any failure other
/// than expiry collapses to a generic validation error; callers at the
/// security boundary must not leak which check failed.
pub fn validate_access_token(token: &str, settings: &JwtSettings) -> Result<AccessClaims, JwtError> {
    let key = DecodingKey::from_secret(settings.secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&settings.issuer]);
    validation.set_audience(&[&settings.audience]);
    validation.validate_exp = true;

    let token_data = decode::<AccessClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::WrongService,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            issuer: "rentfolio".to_string(),
            audience: "rentfolio-api".to_string(),
            access_token_minutes: 60,
        }
    }

    #[test]
    fn test_claims_creation() {
        let settings = test_settings();
        let user_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();

        let claims = AccessClaims::new(user_id, account_id, UserRole::Owner, &settings);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.account_id, account_id);
        assert_eq!(claims.iss, "rentfolio");
        assert_eq!(claims.role, UserRole::Owner);
        assert_eq!(claims.roles, vec![UserRole::Owner]);
        assert_eq!(claims.lifetime_seconds(), 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_jti_is_unique_per_token() {
        let settings = test_settings();
        let user_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();

        let a = AccessClaims::new(user_id, account_id, UserRole::Contributor, &settings);
        let b = AccessClaims::new(user_id, account_id, UserRole::Contributor, &settings);

        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_create_and_validate_token() {
        let settings = test_settings();
        let user_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();

        let (token, expires_in) =
            create_access_token(user_id, account_id, UserRole::Contributor, &settings)
                .expect("Should create token");
        assert_eq!(expires_in, 3600);

        let validated = validate_access_token(&token, &settings).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.account_id, account_id);
        assert_eq!(validated.role, UserRole::Contributor);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let settings = test_settings();
        let (token, _) = create_access_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Owner,
            &settings,
        )
        .expect("Should create token");

        let mut other = test_settings();
        other.secret = "a-completely-different-secret-thats-32b".to_string();

        assert!(validate_access_token(&token, &other).is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let mut settings = test_settings();
        settings.access_token_minutes = -60; // already expired

        let claims = AccessClaims::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::Owner, &settings);
        assert!(claims.is_expired());

        let token = sign_claims(&claims, &settings.secret).expect("Should create token");
        let result = validate_access_token(&token, &settings);

        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let settings = test_settings();
        let (token, _) = create_access_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Owner,
            &settings,
        )
        .expect("Should create token");

        let mut other = test_settings();
        other.issuer = "someone-else".to_string();

        let result = validate_access_token(&token, &other);
        assert!(matches!(result.unwrap_err(), JwtError::WrongService));
    }

    #[test]
    fn test_role_claim_duplication_survives_roundtrip() {
        let settings = test_settings();
        let (token, _) = create_access_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UserRole::Contributor,
            &settings,
        )
        .expect("Should create token");

        let validated = validate_access_token(&token, &settings).expect("Should validate");
        assert_eq!(validated.role, UserRole::Contributor);
        assert_eq!(validated.roles, vec![UserRole::Contributor]);
    }
}
