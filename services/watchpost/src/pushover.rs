//! Pushover notification client

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::NotifierConfig;
use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier};

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Pushover notification sender
pub struct PushoverNotifier {
    api_token: String,
    user_key: String,
    default_title: String,
    default_priority: i8,
    default_sound: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverNotifier")
            .field("default_title", &self.default_title)
            .finish()
    }
}

impl PushoverNotifier {
    pub fn new(config: &NotifierConfig, http: Arc<dyn HttpClient>) -> Self {
        let NotifierConfig::Pushover {
            api_token,
            user_key,
            default_title,
            default_priority,
            default_sound,
        } = config;

        tracing::debug!("Created PushoverNotifier with title '{}'", default_title);

        Self {
            api_token: api_token.clone(),
            user_key: user_key.clone(),
            default_title: default_title.clone(),
            default_priority: *default_priority,
            default_sound: default_sound.clone(),
            http,
        }
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn type_name(&self) -> &str {
        "pushover"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let title = Some(notification.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.default_title);
        let priority = match notification.priority {
            0 => self.default_priority,
            explicit => explicit,
        }
        .to_string();
        let sound = notification.sound.as_deref().unwrap_or(&self.default_sound);

        let mut params = vec![
            ("token", self.api_token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", title),
            ("message", notification.message.as_str()),
            ("priority", priority.as_str()),
            ("sound", sound),
        ];
        if let Some(url) = notification.url.as_deref() {
            params.push(("url", url));
            params.push(("url_title", "Snapshot"));
        }

        tracing::debug!("Sending Pushover notification '{}'", notification.message);

        let response = self.http.post_form(PUSHOVER_API_URL, &params).await?;
        if !response.is_success() {
            return Err(crate::WatchpostError::Notifier(format!(
                "Pushover API returned status {}: {}",
                response.status, response.body
            )));
        }
        Ok(())
    }
}
