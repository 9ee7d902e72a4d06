/// Business services for the identity core
///
/// Route handlers stay thin; the sequencing and security invariants live
/// here:
///
/// - `identity`: credential creation/validation and single-use link tokens
/// - `tokens`: access-token and refresh-token issuance and revocation
/// - `invitations`: invitation issuance, validation, and acceptance

pub mod identity;
pub mod invitations;
pub mod tokens;
