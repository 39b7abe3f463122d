//! Shared display state for the controller, the session tasks and the dashboard

use std::fmt;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::alerts::AlertFeed;
use crate::grid::FullscreenOverlay;
use crate::models::Camera;

/// Lifecycle of the push channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    RetryPending,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ChannelStatus::Disconnected => "disconnected",
            ChannelStatus::Connecting => "connecting",
            ChannelStatus::Connected => "connected",
            ChannelStatus::RetryPending => "retry pending",
        };
        f.write_str(text)
    }
}

/// State read by the dashboard and written by the session tasks
#[derive(Debug)]
pub struct DashboardState {
    pub cameras: Vec<Camera>,
    pub alerts: AlertFeed,
    pub channel: ChannelStatus,
    /// Reconnection attempts made in the current session
    pub reconnect_attempts: u32,
    /// Last login failure, shown until dismissed or a login succeeds
    pub login_error: Option<String>,
    pub fullscreen: FullscreenOverlay,
    /// Start of the current session; doubles as the stream cache-buster
    pub session_started_epoch_ms: Option<u64>,
    pub started_at: Instant,
}

impl DashboardState {
    pub fn new(alert_capacity: usize) -> Self {
        Self {
            cameras: Vec::new(),
            alerts: AlertFeed::new(alert_capacity),
            channel: ChannelStatus::Disconnected,
            reconnect_attempts: 0,
            login_error: None,
            fullscreen: FullscreenOverlay::default(),
            session_started_epoch_ms: None,
            started_at: Instant::now(),
        }
    }

    /// Replace the camera set wholesale
    pub fn replace_cameras(&mut self, cameras: Vec<Camera>) {
        self.fullscreen.retain(&cameras);
        self.cameras = cameras;
    }

    /// Reset everything tied to a session, keeping the login error
    pub fn reset_session(&mut self) {
        self.replace_cameras(Vec::new());
        self.alerts.clear();
        self.channel = ChannelStatus::Disconnected;
        self.reconnect_attempts = 0;
        self.session_started_epoch_ms = None;
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<DashboardState>>;

pub fn new_state_handle(alert_capacity: usize) -> StateHandle {
    Arc::new(RwLock::new(DashboardState::new(alert_capacity)))
}

pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
