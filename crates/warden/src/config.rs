// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the session client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the API (e.g. `http://localhost:8080/api/v1`).
    #[arg(long, default_value = "http://localhost:8080/api/v1", env = "WARDEN_API_URL")]
    pub api_url: String,

    /// Directory for the persisted session. Defaults to the XDG state dir.
    #[arg(long, env = "WARDEN_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Inactivity after which the session is terminated, in seconds.
    #[arg(long, default_value_t = 600, env = "WARDEN_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: u64,

    /// How long before the idle logout the warning fires, in seconds.
    #[arg(long, default_value_t = 60, env = "WARDEN_IDLE_WARNING_SECS")]
    pub idle_warning_secs: u64,

    /// Proactive credential refresh interval, in seconds.
    #[arg(long, default_value_t = 600, env = "WARDEN_REFRESH_INTERVAL_SECS")]
    pub refresh_interval_secs: u64,

    /// Credential expiry check interval, in seconds.
    #[arg(long, default_value_t = 30, env = "WARDEN_EXPIRY_CHECK_SECS")]
    pub expiry_check_secs: u64,

    /// Credentials expiring within this margin count as expired, in seconds.
    #[arg(long, default_value_t = 5, env = "WARDEN_EXPIRY_MARGIN_SECS")]
    pub expiry_margin_secs: u64,

    /// Minimum spacing between recorded activity signals, in milliseconds.
    #[arg(long, default_value_t = 1000, env = "WARDEN_ACTIVITY_THROTTLE_MS")]
    pub activity_throttle_ms: u64,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 30, env = "WARDEN_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Consecutive proactive refresh transport failures before giving up.
    #[arg(long, default_value_t = 3, env = "WARDEN_MAX_REFRESH_FAILURES")]
    pub max_refresh_failures: u32,

    /// Login endpoint path, relative to the API URL.
    #[arg(long, default_value = "/auth/login", env = "WARDEN_LOGIN_PATH")]
    pub login_path: String,

    /// Credential renewal endpoint path, relative to the API URL.
    #[arg(long, default_value = "/auth/refresh", env = "WARDEN_REFRESH_PATH")]
    pub refresh_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/v1".to_owned(),
            state_dir: None,
            idle_timeout_secs: 600,
            idle_warning_secs: 60,
            refresh_interval_secs: 600,
            expiry_check_secs: 30,
            expiry_margin_secs: 5,
            activity_throttle_ms: 1000,
            request_timeout_secs: 30,
            max_refresh_failures: 3,
            login_path: "/auth/login".to_owned(),
            refresh_path: "/auth/refresh".to_owned(),
        }
    }
}

impl ClientConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Inactivity after which the idle warning fires.
    pub fn idle_warning_after(&self) -> Duration {
        self.idle_timeout().saturating_sub(Duration::from_secs(self.idle_warning_secs))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_check_secs.max(1))
    }

    pub fn expiry_margin(&self) -> Duration {
        Duration::from_secs(self.expiry_margin_secs)
    }

    pub fn activity_throttle(&self) -> Duration {
        Duration::from_millis(self.activity_throttle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    /// Whether `path` is a login or renewal call, which never trigger a refresh.
    pub fn is_auth_exempt(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        path == self.login_path || path == self.refresh_path
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
