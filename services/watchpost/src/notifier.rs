//! Notifier trait for advisory detection notifications

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Alert;

/// A notification to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: i8,
    pub sound: Option<String>,
    /// Link attached to the notification, e.g. the detection snapshot
    pub url: Option<String>,
}

impl Notification {
    /// Advisory notification for a detection, using the notifier's defaults
    pub fn for_detection(alert: &Alert, snapshot_url: Option<String>) -> Self {
        let subject = alert.subject_name().unwrap_or("Unknown person");
        let mut message = format!("{} seen on {}", subject, alert.camera_id);
        if let Some(score) = alert.confidence {
            message.push_str(&format!(" (distance {:.3})", score));
        }
        Self {
            title: String::new(),
            message,
            priority: 0,
            sound: None,
            url: snapshot_url,
        }
    }
}

/// Trait for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "pushover")
    fn type_name(&self) -> &str;

    /// Send a notification
    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}
