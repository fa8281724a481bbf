use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::ReconnectPolicy;

/// Notification timing (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Visible lifetime of a notification when the caller gives no duration.
    pub default_duration_ms: i64,
    /// Time spent in the dismissing state before removal (exit animation).
    pub exit_window_ms: u64,
    /// Optional cap on simultaneously visible notifications; the oldest is dismissed when exceeded.
    #[serde(default)]
    pub max_visible: Option<usize>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 5000,
            exit_window_ms: 300,
            max_visible: None,
        }
    }
}

/// Bounded reconnect for the progress channel (optional section in config.toml).
/// When absent, a transport error closes the subscription for good.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum number of reconnect attempts after a transport error.
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
    /// Uptime in seconds after which a connection resets the attempt count.
    #[serde(default = "default_stable_after_secs")]
    pub stable_after_secs: u64,
}

fn default_stable_after_secs() -> u64 {
    30
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
            stable_after_secs: default_stable_after_secs(),
        }
    }
}

impl ReconnectConfig {
    pub fn to_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
            stable_after: Duration::from_secs(self.stable_after_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/harvest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Base URL of the extraction API (e.g. `https://api.example.com/`).
    pub api_base_url: String,
    /// Path of the progress stream relative to `api_base_url`; `{job_id}` is substituted.
    pub progress_path: String,
    /// Query parameter carrying the bearer token (the push channel cannot send headers).
    pub token_param: String,
    /// Connect timeout for opening the push channel, in seconds.
    pub connect_timeout_secs: u64,
    /// Optional notification timing; built-in defaults when missing.
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
    /// Optional reconnect policy; no reconnect when missing.
    #[serde(default)]
    pub reconnect: Option<ReconnectConfig>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/".to_string(),
            progress_path: "api/v1/jobs/{job_id}/progress/stream".to_string(),
            token_param: "token".to_string(),
            connect_timeout_secs: 15,
            notifications: None,
            reconnect: None,
        }
    }
}

impl HarvestConfig {
    pub fn notifications(&self) -> NotificationConfig {
        self.notifications.clone().unwrap_or_default()
    }

    /// Reconnect policy in effect; `ReconnectPolicy::disabled()` unless configured.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.reconnect
            .as_ref()
            .map(ReconnectConfig::to_policy)
            .unwrap_or_else(ReconnectPolicy::disabled)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HarvestConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HarvestConfig::default();
        let toml = default_cfg.to_toml_string()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: HarvestConfig = toml::from_str(&data)?;
    Ok(cfg)
}
