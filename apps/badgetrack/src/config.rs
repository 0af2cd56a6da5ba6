//! # Configuration
//!
//! Settings are resolved in layers, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. `BADGETRACK_*` environment variables
//! 4. command-line flags (applied by the CLI)
//!
//! ## Environment Variables
//!
//! - `BADGETRACK_HOST`, `BADGETRACK_PORT`: listen address
//! - `BADGETRACK_DATABASE`: redb file path
//! - `BADGETRACK_SUPER_ADMIN_EMAIL`: the undeletable admin account
//! - `BADGETRACK_INVITATION_TTL_HOURS`, `BADGETRACK_SESSION_TTL_HOURS`
//! - `BADGETRACK_RATE_LIMIT`: requests per second (0 disables)
//! - `BADGETRACK_CORS_ORIGINS`: comma-separated origins, or `*`

use crate::api::HttpConfig;
use badgetrack_core::primitives::{
    DEFAULT_INVITATION_TTL_HOURS, DEFAULT_SESSION_TTL_HOURS, DEFAULT_SUPER_ADMIN_EMAIL,
};
use badgetrack_core::{TrackerConfig, TrackerError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Default request rate limit (requests per second).
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default maximum request body (1 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Fully resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub super_admin_email: String,
    pub invitation_ttl_hours: u32,
    pub session_ttl_hours: u32,
    pub rate_limit: u32,
    /// `None` means localhost only.
    pub cors_origins: Option<String>,
    pub body_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: PathBuf::from("badgetrack.redb"),
            super_admin_email: DEFAULT_SUPER_ADMIN_EMAIL.to_string(),
            invitation_ttl_hours: DEFAULT_INVITATION_TTL_HOURS,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, TrackerError> {
    raw.trim()
        .parse()
        .map_err(|_| TrackerError::Validation(format!("{} has an invalid value '{}'", key, raw)))
}

impl AppConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, TrackerError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| TrackerError::Validation(format!("Invalid configuration: {}", e)))?;
        config.tracker_config().validate()?;
        Ok(config)
    }

    /// Read the TOML file at `path` (if any) and apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, TrackerError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, TrackerError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            TrackerError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(TrackerError::Io(format!(
                "Config path '{}' is not a regular file",
                path.display()
            )));
        }
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(TrackerError::Validation(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Override fields from `BADGETRACK_*` variables, as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), TrackerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("BADGETRACK_HOST") {
            self.host = v.trim().to_string();
        }
        if let Some(v) = var("BADGETRACK_PORT") {
            self.port = parse_env("BADGETRACK_PORT", &v)?;
        }
        if let Some(v) = var("BADGETRACK_DATABASE") {
            self.database = PathBuf::from(v.trim());
        }
        if let Some(v) = var("BADGETRACK_SUPER_ADMIN_EMAIL") {
            self.super_admin_email = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = var("BADGETRACK_INVITATION_TTL_HOURS") {
            self.invitation_ttl_hours = parse_env("BADGETRACK_INVITATION_TTL_HOURS", &v)?;
        }
        if let Some(v) = var("BADGETRACK_SESSION_TTL_HOURS") {
            self.session_ttl_hours = parse_env("BADGETRACK_SESSION_TTL_HOURS", &v)?;
        }
        if let Some(v) = var("BADGETRACK_RATE_LIMIT") {
            self.rate_limit = parse_env("BADGETRACK_RATE_LIMIT", &v)?;
        }
        if let Some(v) = var("BADGETRACK_CORS_ORIGINS") {
            self.cors_origins = Some(v);
        }
        self.tracker_config().validate()
    }

    /// `host:port`, ready for binding.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            super_admin_email: self.super_admin_email.clone(),
            invitation_ttl_hours: self.invitation_ttl_hours,
            session_ttl_hours: self.session_ttl_hours,
        }
    }

    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            cors_origins: self.cors_origins.clone(),
            rate_limit: self.rate_limit,
            body_limit_bytes: self.body_limit_bytes,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
