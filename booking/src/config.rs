//! Runtime configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the sync engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API client settings
    pub api: ApiConfig,
    /// Realtime channel settings
    pub realtime: RealtimeConfig,
}

/// API client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the booking server, no trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    /// Per-request timeout as a [`Duration`]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Realtime channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of the push event channel before backpressure
    pub channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables, with local defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig {
                base_url: std::env::var("BOOKING_API_URL")
                    .unwrap_or_else(|_| "http://localhost:4000/api".to_string()),
                request_timeout_secs: std::env::var("BOOKING_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            },
            realtime: RealtimeConfig {
                channel_capacity: std::env::var("BOOKING_PUSH_CAPACITY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(64),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
