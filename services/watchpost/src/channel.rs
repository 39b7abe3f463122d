//! Alert push channel: connection lifecycle and fixed-delay reconnection

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::backend::BackendClient;
use crate::models::Alert;
use crate::notifier::{Notification, Notifier};
use crate::push::{self, PushConnector, PushMessage, PushStream};
use crate::state::{current_epoch_ms, ChannelStatus, StateHandle};

/// How a connected stream stopped
#[derive(Debug)]
enum StreamEnd {
    Cancelled,
    Closed,
    Failed(crate::WatchpostError),
}

/// The push channel task for one session.
///
/// Runs `connecting -> connected -> retry pending -> connecting ...` until the
/// session's cancellation token fires.
pub struct AlertChannel {
    url: String,
    connector: Arc<dyn PushConnector>,
    state: StateHandle,
    notifiers: Vec<Arc<dyn Notifier>>,
    backend: BackendClient,
    retry_delay: Duration,
    cancel: CancellationToken,
}

impl AlertChannel {
    pub fn new(
        backend: BackendClient,
        connector: Arc<dyn PushConnector>,
        state: StateHandle,
        notifiers: Vec<Arc<dyn Notifier>>,
        retry_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            url: backend.alerts_channel_url(),
            connector,
            state,
            notifiers,
            backend,
            retry_delay,
            cancel,
        }
    }

    /// Run until cancelled
    pub async fn run(self) {
        loop {
            self.set_status(ChannelStatus::Connecting).await;

            let connected = tokio::select! {
                result = self.connector.connect(&self.url) => result,
                _ = self.cancel.cancelled() => break,
            };

            match connected {
                Ok(mut stream) => {
                    tracing::info!("Alert channel connected to {}", self.url);
                    self.set_status(ChannelStatus::Connected).await;

                    match self.pump(stream.as_mut()).await {
                        StreamEnd::Cancelled => {
                            stream.close().await;
                            break;
                        }
                        StreamEnd::Closed => tracing::warn!("Alert channel closed by backend"),
                        StreamEnd::Failed(e) => tracing::warn!("Alert channel failed: {}", e),
                    }
                }
                Err(e) => tracing::warn!("Alert channel connect failed: {}", e),
            }

            if !self.wait_before_retry().await {
                break;
            }
        }

        self.set_status(ChannelStatus::Disconnected).await;
        tracing::debug!("Alert channel stopped");
    }

    /// Read messages until the stream ends or the session is cancelled
    async fn pump(&self, stream: &mut dyn PushStream) -> StreamEnd {
        loop {
            let next = tokio::select! {
                next = stream.next_message() => next,
                _ = self.cancel.cancelled() => return StreamEnd::Cancelled,
            };

            match next {
                Ok(Some(text)) => self.handle_message(&text).await,
                Ok(None) => return StreamEnd::Closed,
                Err(e) => return StreamEnd::Failed(e),
            }
        }
    }

    async fn handle_message(&self, text: &str) {
        match push::parse_message(text) {
            Ok(PushMessage::Detection(alert)) => self.ingest(alert).await,
            Ok(PushMessage::Ignored(kind)) => {
                tracing::debug!("Ignoring push message of type '{}'", kind);
            }
            Err(e) => tracing::debug!("Dropping malformed push message: {}", e),
        }
    }

    async fn ingest(&self, alert: Alert) {
        let seq = {
            let mut state = self.state.write().await;
            if self.cancel.is_cancelled() {
                return;
            }
            state.alerts.push(alert.clone(), current_epoch_ms())
        };
        tracing::debug!("Detection #{} on camera '{}'", seq, alert.camera_id);

        if !self.notifiers.is_empty() {
            let snapshot_url = alert
                .snapshot
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| self.backend.snapshot_url(s));
            dispatch_notification(
                &self.notifiers,
                Notification::for_detection(&alert, snapshot_url),
            );
        }
    }

    /// Schedule exactly one reconnection after the fixed delay.
    ///
    /// Returns false if the session ended first.
    async fn wait_before_retry(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        {
            let mut state = self.state.write().await;
            state.channel = ChannelStatus::RetryPending;
            state.reconnect_attempts += 1;
        }
        tracing::info!("Reconnecting alert channel in {:?}", self.retry_delay);

        tokio::select! {
            _ = tokio::time::sleep(self.retry_delay) => true,
            _ = self.cancel.cancelled() => {
                tracing::debug!("Pending reconnect cancelled");
                false
            }
        }
    }

    async fn set_status(&self, status: ChannelStatus) {
        self.state.write().await.channel = status;
    }
}

/// Send `notification` through every notifier without waiting for delivery
pub fn dispatch_notification(notifiers: &[Arc<dyn Notifier>], notification: Notification) {
    for notifier in notifiers {
        let notifier = Arc::clone(notifier);
        let notification = notification.clone();
        tokio::spawn(async move {
            match notifier.notify(&notification).await {
                Ok(()) => tracing::debug!("Sent {} notification", notifier.type_name()),
                Err(e) => tracing::warn!(
                    "Notification via '{}' failed: {}",
                    notifier.type_name(),
                    e
                ),
            }
        });
    }
}
