/// Session context middleware for Axum
///
/// Validates the `Authorization: Bearer <token>` header on protected routes
/// and inserts a [`SessionContext`] into the request extensions, so handlers
/// see only the identity triple and never touch raw tokens.
///
/// # Example
///
/// ```no_run
/// use axum::{Extension, Router, routing::get, middleware};
/// use rentfolio_shared::auth::jwt::JwtSettings;
/// use rentfolio_shared::auth::middleware::{session_context, SessionContext};
///
/// async fn whoami(Extension(session): Extension<SessionContext>) -> String {
///     format!("user {} in account {}", session.user_id, session.account_id)
/// }
///
/// let settings = JwtSettings {
///     secret: "a-secret-that-is-at-least-32-bytes!".to_string(),
///     issuer: "rentfolio".to_string(),
///     audience: "rentfolio-api".to_string(),
///     access_token_minutes: 60,
/// };
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(session_context(settings)));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError, JwtSettings};
use crate::models::user::UserRole;

/// Authenticated identity attached to every protected request
///
/// Built from validated access-token claims; holds exactly the triple the
/// rest of the application needs to scope its queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Account (tenant) the user belongs to
    pub account_id: Uuid,

    /// Role within the account, as recorded at token issue time
    pub role: UserRole,
}

impl SessionContext {
    /// Whether the session belongs to an account Owner
    pub fn is_owner(&self) -> bool {
        self.role == UserRole::Owner
    }
}

/// Error type for the session middleware
#[derive(Debug)]
pub enum SessionError {
    /// Missing Authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat,

    /// Token validation failed (expired, bad signature, wrong service)
    InvalidToken(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        match self {
            SessionError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            SessionError::InvalidFormat => {
                (StatusCode::UNAUTHORIZED, "Expected Bearer token").into_response()
            }
            SessionError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

/// Validates the bearer token and attaches a [`SessionContext`]
///
/// # Errors
///
/// Returns 401 Unauthorized if the Authorization header is missing, is not a
/// Bearer token, or the token fails validation.
pub async fn session_context_middleware(
    settings: JwtSettings,
    mut req: Request,
    next: Next,
) -> Result<Response, SessionError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(SessionError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(SessionError::InvalidFormat)?;

    let claims = validate_access_token(token, &settings).map_err(|e| match e {
        JwtError::Expired => SessionError::InvalidToken("Token expired".to_string()),
        JwtError::WrongService => {
            SessionError::InvalidToken("Token issued for a different service".to_string())
        }
        _ => SessionError::InvalidToken("Invalid token".to_string()),
    })?;

    let session = SessionContext {
        user_id: claims.user_id,
        account_id: claims.account_id,
        role: claims.role,
    };
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Creates a session-context middleware closure
///
/// Helper that captures the JWT settings and returns a function suitable for
/// `axum::middleware::from_fn`.
pub fn session_context(
    settings: JwtSettings,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Response, SessionError>> + Send>,
> + Clone {
    move |req, next| {
        let settings = settings.clone();
        Box::pin(session_context_middleware(settings, req, next))
    }
}
