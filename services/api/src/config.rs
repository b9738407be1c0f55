//! API service configuration loaded from the environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use config::{Config, Environment as EnvSource};
use serde::Deserialize;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    /// Origins allowed when `ALLOWED_ORIGINS` is not set
    pub fn default_origins(self) -> &'static [&'static str] {
        match self {
            Environment::Production => &["https://your-domain.com", "https://www.your-domain.com"],
            Environment::Development => &[
                "http://localhost:3000",
                "http://127.0.0.1:3000",
                "http://localhost:8080",
            ],
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("Unknown APP_ENV value: {}", other),
        }
    }
}

/// Values as read from the environment, before validation
#[derive(Debug, Deserialize)]
struct RawConfig {
    port: u16,
    app_env: String,
    jwt_secret: Option<String>,
    jwt_expiry_seconds: u64,
    default_password: String,
    allowed_origins: Option<String>,
    upload_dir: PathBuf,
    rate_limit_max_requests: u32,
    rate_limit_window_seconds: u64,
}

/// API service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listening port
    pub port: u16,
    pub environment: Environment,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime
    pub jwt_expiry: Duration,
    /// Password accepted on first login, before the account exists
    pub default_password: String,
    pub allowed_origins: Vec<HeaderValue>,
    /// Content directory for uploaded photos
    pub upload_dir: PathBuf,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PORT`: listening port (default: 3000)
    /// - `APP_ENV`: `development` or `production` (default: development)
    /// - `JWT_SECRET`: token signing secret (required)
    /// - `JWT_EXPIRY_SECONDS`: token lifetime (default: 604800, 7 days)
    /// - `DEFAULT_PASSWORD`: first-login password (default: love2024)
    /// - `ALLOWED_ORIGINS`: comma separated CORS origins (default depends on APP_ENV)
    /// - `UPLOAD_DIR`: photo content directory (default: uploads)
    /// - `RATE_LIMIT_MAX_REQUESTS`: requests per window and address (default: 100)
    /// - `RATE_LIMIT_WINDOW_SECONDS`: rate limit window (default: 900, 15 minutes)
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("port", 3000_i64)?
            .set_default("app_env", "development")?
            .set_default("jwt_expiry_seconds", 604_800_i64)?
            .set_default("default_password", "love2024")?
            .set_default("upload_dir", "uploads")?
            .set_default("rate_limit_max_requests", 100_i64)?
            .set_default("rate_limit_window_seconds", 900_i64)?
            .add_source(EnvSource::default())
            .build()
            .context("Failed to read configuration")?;

        let raw: RawConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let environment: Environment = raw.app_env.parse()?;

        let jwt_secret = raw
            .jwt_secret
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if raw.default_password.is_empty() {
            anyhow::bail!("DEFAULT_PASSWORD must not be empty");
        }

        let origins: Vec<String> = match raw.allowed_origins.as_deref() {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            _ => environment
                .default_origins()
                .iter()
                .map(|o| o.to_string())
                .collect(),
        };

        let allowed_origins = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{}'", o))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            port: raw.port,
            environment,
            jwt_secret,
            jwt_expiry: Duration::from_secs(raw.jwt_expiry_seconds),
            default_password: raw.default_password,
            allowed_origins,
            upload_dir: raw.upload_dir,
            rate_limit_max_requests: raw.rate_limit_max_requests,
            rate_limit_window: Duration::from_secs(raw.rate_limit_window_seconds),
        })
    }
}
