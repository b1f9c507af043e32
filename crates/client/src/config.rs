//! Client configuration, read from the environment.

use std::env;
use std::time::Duration;

use compute::DEFAULT_OVERLAP_THRESHOLD;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 20;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Fixed poll budget: no backoff, no distinction between "still processing" and "failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid backend url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("poll max attempts must be at least 1")]
    ZeroAttempts,
    #[error("overlap threshold must be in [0, 1), got {0}")]
    Threshold(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub backend_url: String,
    pub poll: PollPolicy,
    pub overlap_threshold: f64,
    pub http_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            poll: PollPolicy::default(),
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            backend_url: env::var("MINEWATCH_BACKEND_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            poll: PollPolicy {
                max_attempts: env_var_u32("MINEWATCH_POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS),
                interval: Duration::from_millis(env_var_u64(
                    "MINEWATCH_POLL_INTERVAL_MS",
                    DEFAULT_POLL_INTERVAL_MS,
                )),
            },
            overlap_threshold: env_var_f64("MINEWATCH_OVERLAP_THRESHOLD", DEFAULT_OVERLAP_THRESHOLD),
            http_timeout: Duration::from_secs(env_var_u64(
                "MINEWATCH_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match reqwest::Url::parse(&self.backend_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::InvalidUrl {
                    url: self.backend_url.clone(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError::InvalidUrl {
                    url: self.backend_url.clone(),
                    reason: e.to_string(),
                })
            }
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if !(0.0..1.0).contains(&self.overlap_threshold) {
            return Err(ConfigError::Threshold(self.overlap_threshold));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
