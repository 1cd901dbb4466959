//! Application configuration loaded from environment variables.
//!
//! Everything has a sensible default so the server starts with no
//! environment at all; only malformed values are rejected.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Directory holding the persisted key-value files
    pub data_dir: PathBuf,
    /// Base URL of the remote portal directory (no trailing slash)
    pub remote_base_url: String,
    /// Per-request timeout for the remote directory
    pub remote_timeout_secs: u64,
    /// Default auxiliary time zone (signed hours) for duration displays
    pub zone_offset_hours: Option<f64>,
}

impl Config {
    /// Config for tests: in-repo data dir and an unroutable remote.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            data_dir: PathBuf::from("data"),
            remote_base_url: "http://127.0.0.1:9".to_string(),
            remote_timeout_secs: 1,
            zone_offset_hours: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let zone_offset_hours = match env::var("ZONE_OFFSET_HOURS") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_zone(&raw)?),
            _ => None,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            remote_base_url: env::var("REMOTE_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://lanched.ru/PortalGet".to_string()),
            remote_timeout_secs: env::var("REMOTE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("REMOTE_TIMEOUT_SECS"))?,
            zone_offset_hours,
        })
    }
}

/// Parse a signed, possibly fractional hour offset such as `+5.5` or `-3`.
fn parse_zone(raw: &str) -> Result<f64, ConfigError> {
    let zone: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid("ZONE_OFFSET_HOURS"))?;
    if !zone.is_finite() || zone.abs() >= 24.0 {
        return Err(ConfigError::Invalid("ZONE_OFFSET_HOURS"));
    }
    Ok(zone)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
