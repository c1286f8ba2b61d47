//! Service configuration.

use std::path::Path;
use std::time::Duration;

use rimborsi_core::DEFAULT_MAX_ENTRY_BYTES;
use rimborsi_store::{ExportLimits, DEFAULT_MAX_ARCHIVE_BYTES, DEFAULT_MAX_FILES_PER_ARCHIVE};
use serde::Deserialize;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/rimborsi").
    pub data_dir: String,

    /// Shared bearer token required on every API request.
    pub auth_token: String,

    /// Administrative secret required to replace the people roster.
    pub admin_token: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes. Must leave room for a base64
    /// attachment of `max_entry_bytes`.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Maximum decoded size of a single attachment.
    pub max_entry_bytes: u64,

    /// Maximum number of files in one archive slice.
    pub max_archive_files: usize,

    /// Maximum decoded bytes in one archive slice.
    pub max_archive_bytes: u64,

    /// Requests allowed per window for a caller in good standing.
    pub rate_limit_requests: u32,

    /// Window length for the normal rate limit tier.
    pub rate_limit_window_seconds: u64,

    /// Requests allowed per window, across all callers, once a caller has
    /// presented a wrong token.
    pub strict_rate_limit_requests: u32,

    /// Window length for the strict rate limit tier.
    pub strict_rate_limit_window_seconds: u64,
}

/// Secrets file structure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenSecrets {
    auth_token: String,
    admin_token: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the secrets file.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Try to load tokens from file first, then fall back to env vars
        let (auth_token, admin_token) = load_token_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            auth_token,
            admin_token,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_or("MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: env_or(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
            max_entry_bytes: env_or("MAX_ENTRY_BYTES", defaults.max_entry_bytes),
            max_archive_files: env_or("MAX_ARCHIVE_FILES", defaults.max_archive_files),
            max_archive_bytes: env_or("MAX_ARCHIVE_BYTES", defaults.max_archive_bytes),
            rate_limit_requests: env_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests),
            rate_limit_window_seconds: env_or(
                "RATE_LIMIT_WINDOW_SECONDS",
                defaults.rate_limit_window_seconds,
            ),
            strict_rate_limit_requests: env_or(
                "STRICT_RATE_LIMIT_REQUESTS",
                defaults.strict_rate_limit_requests,
            ),
            strict_rate_limit_window_seconds: env_or(
                "STRICT_RATE_LIMIT_WINDOW_SECONDS",
                defaults.strict_rate_limit_window_seconds,
            ),
        }
    }

    /// Archive export budgets.
    #[must_use]
    pub fn export_limits(&self) -> ExportLimits {
        ExportLimits::new(self.max_archive_files, self.max_archive_bytes)
    }

    /// Normal rate limit window.
    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    /// Strict rate limit window.
    #[must_use]
    pub fn strict_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.strict_rate_limit_window_seconds)
    }
}

/// Parse an environment variable, falling back to `default` when unset or
/// malformed.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = %name, value = %raw, "Ignoring malformed configuration value");
            default
        }),
        Err(_) => default,
    }
}

/// Load the bearer and admin tokens from file or environment.
fn load_token_secrets() -> (String, String) {
    let secret_paths = [".secrets/rimborsi.json", "../.secrets/rimborsi.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<TokenSecrets>(path) {
            tracing::info!(path = %path, "Loaded tokens from secrets file");
            return (secrets.auth_token, secrets.admin_token);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Secrets file not found, using environment variables");
    (
        std::env::var("AUTH_TOKEN").unwrap_or_default(),
        std::env::var("ADMIN_TOKEN").unwrap_or_default(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/rimborsi".into(),
            auth_token: String::new(),
            admin_token: String::new(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_seconds: 30,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
            max_archive_files: DEFAULT_MAX_FILES_PER_ARCHIVE,
            max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
            rate_limit_requests: 60,
            rate_limit_window_seconds: 60,
            strict_rate_limit_requests: 1,
            strict_rate_limit_window_seconds: 10,
        }
    }
}
