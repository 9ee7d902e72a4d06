/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `JWT_SECRET`: Secret key for token signing, >= 32 bytes (required)
/// - `JWT_ISSUER`: `iss` claim (default: rentfolio)
/// - `JWT_AUDIENCE`: `aud` claim (default: rentfolio-api)
/// - `ACCESS_TOKEN_MINUTES`: Access-token lifetime (default: 60)
/// - `REFRESH_TOKEN_DAYS`: Refresh-token lifetime (default: 7)
/// - `ROTATE_REFRESH_TOKENS`: Rotate on every refresh (default: false)
///
/// # Example
///
/// ```no_run
/// use rentfolio_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use rentfolio_shared::auth::jwt::JwtSettings;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token configuration
    pub tokens: TokenConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive (development)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Secret key for access-token signing
    ///
    /// IMPORTANT: This must be kept secret and must be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub jwt_secret: String,

    /// `iss` claim on issued tokens
    pub jwt_issuer: String,

    /// `aud` claim on issued tokens
    pub jwt_audience: String,

    /// Access-token lifetime in minutes
    pub access_token_minutes: i64,

    /// Refresh-token lifetime in days
    pub refresh_token_days: i64,

    /// Whether a refresh revokes the presented refresh token and issues a
    /// replacement
    pub rotate_refresh_tokens: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    /// - `JWT_SECRET` is shorter than 32 bytes
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "rentfolio".to_string());
        let jwt_audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| "rentfolio-api".to_string());

        let access_token_minutes = env::var("ACCESS_TOKEN_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i64>()?;

        let refresh_token_days = env::var("REFRESH_TOKEN_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()?;

        let rotate_refresh_tokens = env::var("ROTATE_REFRESH_TOKENS")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            tokens: TokenConfig {
                jwt_secret,
                jwt_issuer,
                jwt_audience,
                access_token_minutes,
                refresh_token_days,
                rotate_refresh_tokens,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Signing settings for the shared JWT helpers
    pub fn jwt_settings(&self) -> JwtSettings {
        JwtSettings {
            secret: self.tokens.jwt_secret.clone(),
            issuer: self.tokens.jwt_issuer.clone(),
            audience: self.tokens.jwt_audience.clone(),
            access_token_minutes: self.tokens.access_token_minutes,
        }
    }
}
