/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use rentfolio_api::{app::{AppState, build_router}, config::Config, email::LogMailer};
/// use std::sync::Arc;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(LogMailer));
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, email::DynMailer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use rentfolio_shared::auth::{jwt::JwtSettings, middleware::session_context};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound email collaborator
    pub mailer: DynMailer,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: DynMailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Signing settings for token operations
    pub fn jwt_settings(&self) -> JwtSettings {
        self.config.jwt_settings()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /v1/                           # API v1 (versioned)
///     ├── /auth/                     # Authentication endpoints (public)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /logout
///     │   ├── POST /refresh
///     │   ├── POST /verify-email
///     │   ├── POST /forgot-password
///     │   └── POST /reset-password
///     └── /invitations/
///         ├── POST /                 # Create invitation (Owner, bearer auth)
///         ├── POST /validate         # Check a code (public)
///         └── POST /accept           # Accept a code (public)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session context (bearer validation, protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public by design: they establish the session)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/verify-email", post(routes::auth::verify_email))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    // Invitation creation requires an authenticated session; validation and
    // acceptance are reached by invitees who have no session yet
    let invitation_protected = Router::new()
        .route("/", post(routes::invitations::create_invitation))
        .layer(axum::middleware::from_fn(session_context(
            state.jwt_settings(),
        )));

    let invitation_public = Router::new()
        .route("/validate", post(routes::invitations::validate_invitation))
        .route("/accept", post(routes::invitations::accept_invitation));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/invitations", invitation_protected.merge(invitation_public));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
