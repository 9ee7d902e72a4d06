/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, logout, refresh,
///   forgot/reset password, verify email)
/// - `invitations`: Invitation endpoints (create, validate, accept)

pub mod auth;
pub mod health;
pub mod invitations;
