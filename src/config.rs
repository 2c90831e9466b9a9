// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default REST API base path.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST API base path (no trailing slash)
    pub api_url: String,
    /// File backing the persisted session (token + profile)
    pub session_file: PathBuf,
    /// Per-request timeout for API calls
    pub http_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(".dojo-session.json"),
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("DOJO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = normalize_api_url(&api_url)?;

        let session_file = env::var("DOJO_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".dojo-session.json"));

        let http_timeout = match env::var("DOJO_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid("DOJO_HTTP_TIMEOUT_SECS", raw))?,
            Err(_) => Duration::from_secs(15),
        };

        Ok(Self {
            api_url,
            session_file,
            http_timeout,
        })
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Invalid("DOJO_API_URL", raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
