/// Database models for Rentfolio's identity core
///
/// # Models
///
/// - `account`: Tenant boundary; every credential and token record belongs
///   to exactly one account
/// - `user`: Credential records (email, password hash, role, verification)
/// - `refresh_token`: Long-lived opaque session secrets, stored hashed
/// - `invitation`: Single-use, hashed, time-boxed onboarding codes
/// - `one_time_token`: The ledger backing email-verification and
///   password-reset links

pub mod account;
pub mod invitation;
pub mod one_time_token;
pub mod refresh_token;
pub mod user;
