//! Client for the surveillance backend's HTTP contract

use std::sync::Arc;

use reqwest::Url;

use crate::config::{BackendConfig, LoginConfig, LoginMode};
use crate::error::AuthError;
use crate::io::HttpClient;
use crate::models::{Camera, TokenResponse};
use crate::session::Session;

/// Login form contents
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    pub fn passwordless(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
        }
    }
}

/// Thin wrapper over the backend's login, camera, stream and snapshot endpoints
#[derive(Clone)]
pub struct BackendClient {
    base_url: Url,
    login: LoginConfig,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("login_mode", &self.login.mode)
            .finish()
    }
}

impl BackendClient {
    pub fn new(config: &BackendConfig, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            crate::WatchpostError::Config(format!(
                "Invalid backend base_url '{}': {}",
                config.base_url, e
            ))
        })?;

        tracing::debug!("Created BackendClient for {}", base_url);

        Ok(Self {
            base_url,
            login: config.login.clone(),
            http,
        })
    }

    pub fn login_mode(&self) -> LoginMode {
        self.login.mode
    }

    /// Resolve `path` against the base URL, keeping any base path prefix
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Exchange credentials for a session
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let username = credentials.username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let url = self.endpoint(self.login.endpoint_path());
        let password = credentials.password.as_deref().unwrap_or("");
        let params: Vec<(&str, &str)> = match self.login.mode {
            LoginMode::Password => vec![("username", username), ("password", password)],
            LoginMode::Passwordless => vec![("email", username)],
        };

        tracing::debug!("Logging in as '{}' via {}", username, url);

        let response = self
            .http
            .post_form(&url, &params)
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        match response.status {
            401 | 403 | 404 => return Err(AuthError::InvalidCredentials),
            status if !response.is_success() => return Err(AuthError::Rejected(status)),
            _ => {}
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        if parsed.access_token.is_empty() {
            return Err(AuthError::MalformedResponse(
                "empty access_token".to_string(),
            ));
        }

        tracing::info!("Logged in as '{}'", username);
        Ok(Session::new(parsed.access_token))
    }

    /// Fetch the camera registry snapshot
    pub async fn list_cameras(&self, session: &Session) -> crate::Result<Vec<Camera>> {
        let url = self.endpoint("/api/cameras");
        let response = self.http.get_bearer(&url, session.token()).await?;

        if !response.is_success() {
            return Err(crate::WatchpostError::Backend(format!(
                "Camera list returned status {}",
                response.status
            )));
        }

        let cameras: Vec<Camera> = serde_json::from_str(&response.body)?;
        tracing::debug!("Camera list has {} entries", cameras.len());
        Ok(cameras)
    }

    /// Live stream URL for a camera tile
    pub fn stream_url(&self, camera_id: &str, token: &str, discriminator: u64) -> String {
        let mut url = self.base_url.clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push("stream").push(camera_id);
            }
            Err(()) => return self.endpoint(&format!("/stream/{}", camera_id)),
        }
        url.query_pairs_mut()
            .append_pair("token", token)
            .append_pair("t", &discriminator.to_string());
        url.to_string()
    }

    /// Stored detection snapshot URL
    pub fn snapshot_url(&self, snapshot_id: &str) -> String {
        let mut url = self.base_url.clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push("snapshots").push(snapshot_id);
            }
            Err(()) => return self.endpoint(&format!("/snapshots/{}", snapshot_id)),
        }
        url.to_string()
    }

    /// WebSocket URL of the detection push channel
    pub fn alerts_channel_url(&self) -> String {
        let mut url = self.base_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http(s) -> ws(s) is always an allowed scheme change
        let _ = url.set_scheme(scheme);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("ws").push("alerts");
        }
        url.to_string()
    }
}
