/// Authentication and session primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`jwt`]: access-token creation and validation
/// - [`one_time`]: encoding/decoding of single-use link tokens
/// - [`middleware`]: bearer-token session context for Axum
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Access Tokens**: HS256 signing with issuer and audience checks
/// - **Opaque Secrets**: OS randomness, stored only as SHA-256 hashes
///
/// # Example
///
/// ```no_run
/// use rentfolio_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod one_time;
pub mod password;
