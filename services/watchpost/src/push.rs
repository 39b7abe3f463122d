//! Push channel transport and message decoding
//!
//! The backend publishes detections as JSON text frames on a WebSocket. The
//! transport sits behind [`PushConnector`] / [`PushStream`] so the reconnect
//! logic can be driven by scripted streams in tests.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::models::Alert;

/// An open push channel
#[async_trait]
pub trait PushStream: Send {
    /// Read the next text message
    ///
    /// Returns `Ok(Some(text))` for a message, `Ok(None)` once the server closed
    /// the channel, or an error if the transport failed.
    async fn next_message(&mut self) -> crate::Result<Option<String>>;

    /// Close the channel from our side
    async fn close(&mut self);
}

/// Opens push channels
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, url: &str) -> crate::Result<Box<dyn PushStream>>;
}

/// WebSocket implementation of [`PushConnector`]
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self, url: &str) -> crate::Result<Box<dyn PushStream>> {
        tracing::debug!("Opening push channel {}", url);
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                crate::WatchpostError::PushChannel(format!("Connecting to {} failed: {}", url, e))
            })?;
        tracing::debug!(
            "Push channel {} open (status {})",
            url,
            response.status().as_u16()
        );
        Ok(Box::new(WsPushStream { inner: stream }))
    }
}

/// WebSocket implementation of [`PushStream`]
pub struct WsPushStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushStream for WsPushStream {
    async fn next_message(&mut self) -> crate::Result<Option<String>> {
        loop {
            match self.inner.next().await {
                None => return Ok(None),
                Some(Err(e)) => {
                    return Err(crate::WatchpostError::PushChannel(format!(
                        "Read failed: {}",
                        e
                    )))
                }
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => {
                        tracing::debug!("Ignoring non UTF-8 binary frame ({} bytes)", bytes.len());
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!("Push channel closed by server: {:?}", frame);
                    return Ok(None);
                }
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            tracing::debug!("Error closing push channel: {}", e);
        }
    }
}

/// Envelope every push message is wrapped in
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// A decoded push message
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    Detection(Alert),
    /// Any other message type; not acted upon
    Ignored(String),
}

/// Decode one push message
pub fn parse_message(text: &str) -> crate::Result<PushMessage> {
    let envelope: Envelope = serde_json::from_str(text)?;
    if envelope.kind != "detection" {
        return Ok(PushMessage::Ignored(envelope.kind));
    }
    let alert: Alert = serde_json::from_value(envelope.data)?;
    Ok(PushMessage::Detection(alert))
}
