//! Configuration management for Promptshare.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use crate::error::{PromptshareError, Result};
use crate::ratelimit::WindowPolicy;

/// Environment variable prefix; nested keys are separated by `__`,
/// e.g. `PROMPTSHARE__AUTH__JWT_SECRET`.
const ENV_PREFIX: &str = "PROMPTSHARE";

/// Main configuration for the Promptshare service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Use `X-Forwarded-For` / `X-Real-IP` for the client address.
    ///
    /// Only enable behind a proxy that overwrites these headers; otherwise
    /// clients can pick their own rate limit key.
    #[serde(default)]
    pub trust_proxy: bool,

    /// Janitor sweep period in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Per client IP policy applied to every API request
    #[serde(default = "WindowPolicy::global_default")]
    pub global: WindowPolicy,

    /// Per user policy applied to prompt creation
    #[serde(default = "WindowPolicy::write_path_default")]
    pub write_path: WindowPolicy,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            trust_proxy: false,
            cleanup_interval_secs: default_cleanup_interval(),
            global: WindowPolicy::global_default(),
            write_path: WindowPolicy::write_path_default(),
        }
    }
}

impl RateLimitingConfig {
    /// The janitor sweep period.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

fn default_cleanup_interval() -> u64 {
    60
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to verify bearer tokens
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Allowed request methods
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,

    /// Allowed request headers
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,

    /// Send `Access-Control-Allow-Credentials`; requires explicit origins
    #[serde(default)]
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_allowed_headers(),
            allow_credentials: false,
            max_age_secs: default_max_age(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allowed_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_allowed_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "Authorization".to_string()]
}

fn default_max_age() -> u64 {
    86400
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from an optional YAML file layered under
    /// `PROMPTSHARE__*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path, "Loading configuration file");
            builder = builder.add_source(
                config::File::with_name(path).format(config::FileFormat::Yaml),
            );
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Check settings the service cannot start without.
    pub fn validate(&self) -> Result<()> {
        match self.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {}
            _ => {
                return Err(PromptshareError::Config(
                    "auth.jwt_secret must be set".to_string(),
                ));
            }
        }

        if self.rate_limiting.cleanup_interval_secs == 0 {
            return Err(PromptshareError::Config(
                "rate_limiting.cleanup_interval_secs must be greater than zero".to_string(),
            ));
        }

        if self.cors.allow_credentials && self.cors.allowed_origins.iter().any(|o| o == "*") {
            return Err(PromptshareError::Config(
                "cors.allow_credentials cannot be combined with a wildcard origin".to_string(),
            ));
        }

        Ok(())
    }
}
