//! Configuration types for the watchpost dashboard

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `backend.base_url`
pub const BACKEND_URL_ENV: &str = "WATCHPOST_BACKEND_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Where the surveillance backend lives and how to log in to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub login: LoginConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login: LoginConfig::default(),
        }
    }
}

/// Login endpoint contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    #[serde(default)]
    pub mode: LoginMode,
    /// Path of the login endpoint; defaults depend on `mode`
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            mode: LoginMode::Password,
            path: None,
        }
    }
}

impl LoginConfig {
    pub fn endpoint_path(&self) -> &str {
        match (&self.path, self.mode) {
            (Some(path), _) => path,
            (None, LoginMode::Password) => "/auth/login",
            (None, LoginMode::Passwordless) => "/login",
        }
    }
}

/// Shape of the credentials the backend expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMode {
    /// Form-encoded `username` and `password`
    #[default]
    Password,
    /// Form-encoded `email` only
    Passwordless,
}

/// Session lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    #[serde(default = "default_camera_refresh_interval")]
    pub camera_refresh_interval_seconds: u64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
            camera_refresh_interval_seconds: default_camera_refresh_interval(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl SessionConfig {
    pub fn camera_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.camera_refresh_interval_seconds)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Alert feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_alert_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub tiers: TierThresholds,
    /// Whether detections may raise notifications at all
    #[serde(default = "default_true")]
    pub notify: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            capacity: default_alert_capacity(),
            tiers: TierThresholds::default(),
            notify: true,
        }
    }
}

/// Score boundaries between the three confidence tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_low_below")]
    pub low_below: f64,
    #[serde(default = "default_medium_below")]
    pub medium_below: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            low_below: default_low_below(),
            medium_below: default_medium_below(),
        }
    }
}

/// Notifier configuration with tagged enum for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "pushover")]
    Pushover {
        api_token: String,
        user_key: String,
        #[serde(default = "default_pushover_title")]
        default_title: String,
        #[serde(default)]
        default_priority: i8,
        #[serde(default = "default_pushover_sound")]
        default_sound: String,
    },
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Pushover { .. } => "pushover",
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Pages carry the backend token, so the default is loopback only
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    /// How often the page refreshes the alerts panel
    #[serde(default = "default_alerts_refresh")]
    pub alerts_refresh_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_bind_address(),
            port: default_dashboard_port(),
            alerts_refresh_ms: default_alerts_refresh(),
        }
    }
}

impl Config {
    /// Apply environment overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Backend URL overridden by {}", BACKEND_URL_ENV);
            self.backend.base_url = url.trim().to_string();
        }
    }

    /// Reject settings the dashboard cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let url = reqwest::Url::parse(&self.backend.base_url).map_err(|e| {
            crate::WatchpostError::Config(format!(
                "Invalid backend base_url '{}': {}",
                self.backend.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(crate::WatchpostError::Config(format!(
                "Backend base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.session.camera_refresh_interval_seconds == 0 {
            return Err(crate::WatchpostError::Config(
                "session.camera_refresh_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.session.reconnect_delay_ms == 0 {
            return Err(crate::WatchpostError::Config(
                "session.reconnect_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.dashboard.alerts_refresh_ms == 0 {
            return Err(crate::WatchpostError::Config(
                "dashboard.alerts_refresh_ms must be greater than zero".to_string(),
            ));
        }
        if self.alerts.capacity == 0 {
            return Err(crate::WatchpostError::Config(
                "alerts.capacity must be greater than zero".to_string(),
            ));
        }
        let tiers = self.alerts.tiers;
        if tiers.low_below >= tiers.medium_below {
            return Err(crate::WatchpostError::Config(format!(
                "alerts.tiers.low_below ({}) must be below medium_below ({})",
                tiers.low_below, tiers.medium_below
            )));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_token_path() -> PathBuf {
    PathBuf::from(".watchpost/session.json")
}

fn default_camera_refresh_interval() -> u64 {
    15
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_alert_capacity() -> usize {
    100
}

fn default_low_below() -> f64 {
    0.35
}

fn default_medium_below() -> f64 {
    0.6
}

fn default_pushover_title() -> String {
    "Watchpost Detection".to_string()
}

fn default_pushover_sound() -> String {
    "pushover".to_string()
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_alerts_refresh() -> u64 {
    2000
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::WatchpostError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
