//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_REDIS_URL, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    MIN_TOKEN_SECRET_LENGTH,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    access_token_secret: String,
    refresh_token_secret: String,
    pub server_host: String,
    pub server_port: u16,
    /// Production mode toggles the Secure attribute on the refresh cookie
    pub production: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("access_token_secret", &"[REDACTED]")
            .field("refresh_token_secret", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("production", &self.production)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a token secret is not set in production or is too short
    /// (security requirement). Access and refresh secrets must differ so a
    /// leaked refresh token cannot be replayed as an access token.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let access_token_secret =
            load_secret("ACCESS_TOKEN_SECRET", "dev-access-secret-minimum-32-chars!!");
        let refresh_token_secret =
            load_secret("REFRESH_TOKEN_SECRET", "dev-refresh-secret-minimum-32-chars!");

        if access_token_secret == refresh_token_secret {
            panic!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must be distinct");
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            access_token_secret,
            refresh_token_secret,
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            production: env::var("APP_ENV")
                .map(|v| v == "production")
                .unwrap_or(false),
        }
    }

    /// Build a config directly from secrets (used by tests).
    pub fn for_secrets(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            access_token_secret: access.into(),
            refresh_token_secret: refresh.into(),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            production: false,
        }
    }

    /// Get access token secret bytes for signing/verification.
    pub fn access_secret_bytes(&self) -> &[u8] {
        self.access_token_secret.as_bytes()
    }

    /// Get refresh token secret bytes for signing/verification.
    pub fn refresh_secret_bytes(&self) -> &[u8] {
        self.refresh_token_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Load a secret from the environment, falling back to a development default
/// in debug builds and panicking in release builds.
fn load_secret(var: &str, dev_default: &str) -> String {
    let secret = env::var(var).unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            tracing::warn!("{} not set, using insecure default for development", var);
            dev_default.to_string()
        } else {
            panic!("{} environment variable must be set in production", var);
        }
    });

    if secret.len() < MIN_TOKEN_SECRET_LENGTH {
        panic!(
            "{} must be at least {} characters long",
            var, MIN_TOKEN_SECRET_LENGTH
        );
    }

    secret
}
