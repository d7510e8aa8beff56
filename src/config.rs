//! Runtime configuration parsed from environment variables.

use crate::error::ConfigError;
use crate::layout::{Direction, LayoutConfig};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3001";
pub const DEFAULT_STREAM_PATH: &str = "/api/ai/stream";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub stream_path: String,
    pub timeouts: Timeouts,
    pub layout: LayoutConfig,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `ATTACKFLOW_API_BASE_URL`: analysis backend, default `http://127.0.0.1:3001`
    /// - `ATTACKFLOW_STREAM_PATH`: streaming endpoint, default `/api/ai/stream`
    /// - `ATTACKFLOW_REQUEST_TIMEOUT_SECS`: default 300
    /// - `ATTACKFLOW_CONNECT_TIMEOUT_SECS`: default 10
    /// - `ATTACKFLOW_LAYOUT_DIRECTION`: `TB` (default) or `LR`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDirection`] for an unsupported direction.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = std::env::var("ATTACKFLOW_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let stream_path = std::env::var("ATTACKFLOW_STREAM_PATH").unwrap_or_else(|_| DEFAULT_STREAM_PATH.to_string());
        let timeouts = Timeouts {
            request_secs: env_parse_u64("ATTACKFLOW_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ATTACKFLOW_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let direction = parse_direction(std::env::var("ATTACKFLOW_LAYOUT_DIRECTION").ok().as_deref())?;

        Ok(Self {
            api_base_url,
            stream_path,
            timeouts,
            layout: LayoutConfig::default().with_direction(direction),
        })
    }

    /// Full URL of the streaming endpoint.
    #[must_use]
    pub fn stream_url(&self) -> String {
        if self.stream_path.starts_with('/') {
            format!("{}{}", self.api_base_url, self.stream_path)
        } else {
            format!("{}/{}", self.api_base_url, self.stream_path)
        }
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_direction(raw: Option<&str>) -> Result<Direction, ConfigError> {
    raw.map_or(Ok(Direction::default()), str::parse)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
