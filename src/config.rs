//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables, with a `.env` file
//! read first when present. Everything except `API_KEY` has a development
//! default.
//!
//! # Security Configuration
//!
//! - `API_KEY`: Shared secret expected in the `X-API-Key` header (required)
//! - `PUBLIC_PATHS`: Comma-separated exact paths that skip authentication
//! - `CORS_ORIGINS`: Comma-separated list of allowed origins (default: `*` for dev)
//!
//! # Upload Policy
//!
//! - `UPLOAD_DIR`: Directory holding stored images (default: `uploads`)
//! - `MAX_FILE_SIZE`: Maximum upload size in bytes (default: 5 MiB)
//! - `ALLOWED_CONTENT_TYPES`: MIME allow-list (default: `image/jpeg,image/png`)
//! - `ALLOWED_EXTENSIONS`: Ordered extension list, also the lookup probe order
//!   (default: `.jpg,.jpeg,.png`)

use std::env;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Extra bytes allowed on top of `max_file_size` for multipart framing
/// (boundaries, part headers) before the body limit kicks in.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// API key used by `Config::default()`. Never use it outside development.
pub const DEV_API_KEY: &str = "dev-api-key-change-me";

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{other}' (expected json or pretty)")),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Application
    // =========================================================================
    /// Service name reported by the health endpoints
    pub app_name: String,

    /// Service version reported by the health endpoints
    pub app_version: String,

    /// Deployment environment label (informational)
    pub environment: String,

    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    /// Prefix of the versioned API routes (default: "/api/v1")
    pub api_v1_prefix: String,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Shared secret clients send in `X-API-Key`
    pub api_key: String,

    /// Paths that bypass authentication (exact match).
    pub public_paths: Vec<String>,

    /// Allowed CORS origins, `*` allows any
    pub cors_origins: Vec<String>,

    // =========================================================================
    // Upload Policy
    // =========================================================================
    /// Directory where uploaded images are stored
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    pub max_file_size: usize,

    /// Accepted MIME types for uploads
    pub allowed_content_types: Vec<String>,

    /// Accepted file extensions, in lookup order
    pub allowed_extensions: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log filter directive (e.g., "info", "debug", "image_analysis_api=trace")
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if `API_KEY` is missing or any value
    /// is unparseable or inconsistent.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_v1_prefix = env::var("API_V1_PREFIX").unwrap_or_else(|_| "/api/v1".to_string());

        let config = Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Image Analysis API".to_string()),
            app_version: env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 8000)?,
            public_paths: Self::parse_list("PUBLIC_PATHS")
                .unwrap_or_else(|| default_public_paths(&api_v1_prefix)),
            api_v1_prefix,

            api_key: env::var("API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| AppError::ConfigError("API_KEY must be set".to_string()))?,
            cors_origins: Self::parse_list("CORS_ORIGINS").unwrap_or_else(|| vec!["*".into()]),

            upload_dir: PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into())),
            max_file_size: Self::parse_env("MAX_FILE_SIZE", 5 * 1024 * 1024)?, // 5MB
            allowed_content_types: Self::parse_list("ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(default_content_types),
            allowed_extensions: Self::parse_list("ALLOWED_EXTENSIONS")
                .map(|exts| exts.into_iter().map(|e| e.to_ascii_lowercase()).collect())
                .unwrap_or_else(default_extensions),

            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
            log_format: Self::parse_env("LOG_FORMAT", LogFormat::Json)?,
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.api_key.is_empty() {
            return Err(AppError::ConfigError("API_KEY must not be empty".to_string()));
        }

        if self.max_file_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_FILE_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.allowed_content_types.is_empty() {
            return Err(AppError::ConfigError(
                "ALLOWED_CONTENT_TYPES must list at least one MIME type".to_string(),
            ));
        }

        if self.allowed_extensions.is_empty() {
            return Err(AppError::ConfigError(
                "ALLOWED_EXTENSIONS must list at least one extension".to_string(),
            ));
        }

        if let Some(bad) = self
            .allowed_extensions
            .iter()
            .find(|e| !e.starts_with('.') || e.len() < 2)
        {
            return Err(AppError::ConfigError(format!(
                "ALLOWED_EXTENSIONS entries must look like '.jpg' (got '{bad}')"
            )));
        }

        if !self.api_v1_prefix.starts_with('/') || self.api_v1_prefix.ends_with('/') {
            return Err(AppError::ConfigError(format!(
                "API_V1_PREFIX must start with '/' and not end with '/' (got '{}')",
                self.api_v1_prefix
            )));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request body limit: the largest accepted file plus multipart framing.
    pub fn max_request_body_size(&self) -> usize {
        self.max_file_size.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }

    /// Route path under the versioned API prefix.
    pub fn api_path(&self, path: &str) -> String {
        format!("{}{}", self.api_v1_prefix, path)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a comma-separated list. `None` when the variable is unset or empty.
    fn parse_list(name: &str) -> Option<Vec<String>> {
        env::var(name).ok().filter(|s| !s.trim().is_empty()).map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
    }
}

fn default_public_paths(prefix: &str) -> Vec<String> {
    vec![
        "/".to_string(),
        "/health".to_string(),
        format!("{prefix}/docs"),
        format!("{prefix}/redoc"),
        format!("{prefix}/openapi.json"),
    ]
}

fn default_content_types() -> Vec<String> {
    vec!["image/jpeg".to_string(), "image/png".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec![".jpg".to_string(), ".jpeg".to_string(), ".png".to_string()]
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        let api_v1_prefix = "/api/v1".to_string();
        Self {
            app_name: "Image Analysis API".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_paths: default_public_paths(&api_v1_prefix),
            api_v1_prefix,
            api_key: DEV_API_KEY.to_string(),
            cors_origins: vec!["*".to_string()],
            upload_dir: PathBuf::from("uploads"),
            max_file_size: 5 * 1024 * 1024, // 5MB
            allowed_content_types: default_content_types(),
            allowed_extensions: default_extensions(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_port: 9090,
        }
    }
}
