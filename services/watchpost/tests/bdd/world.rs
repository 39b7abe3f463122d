//! BDD test world for the watchpost dashboard

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cucumber::World;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::Instant;

use watchpost::backend::BackendClient;
use watchpost::config::{BackendConfig, SessionConfig};
use watchpost::controller::SessionController;
use watchpost::io::{HttpClient, HttpResponse};
use watchpost::push::{PushConnector, PushStream};
use watchpost::session::{Session, SessionContext};
use watchpost::state::new_state_handle;
use watchpost::storage::FileTokenStore;
use watchpost::{AuthError, WatchpostError};

/// In-process stand-in for the backend's HTTP endpoints
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub token: Mutex<String>,
    pub password: Mutex<String>,
    pub cameras_json: Mutex<String>,
    pub cameras_failing: AtomicBool,
    /// Bearer token of every camera list request
    pub camera_requests: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn camera_request_count(&self) -> usize {
        self.camera_requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeBackend {
    async fn get_bearer(&self, _url: &str, token: &str) -> watchpost::Result<HttpResponse> {
        self.camera_requests.lock().unwrap().push(token.to_string());
        if self.cameras_failing.load(Ordering::SeqCst) {
            return Err(WatchpostError::Http("connection refused".to_string()));
        }
        Ok(HttpResponse {
            status: 200,
            body: self.cameras_json.lock().unwrap().clone(),
        })
    }

    async fn post_form(
        &self,
        _url: &str,
        params: &[(&str, &str)],
    ) -> watchpost::Result<HttpResponse> {
        let password = self.password.lock().unwrap().clone();
        if params.contains(&("password", password.as_str())) {
            Ok(HttpResponse {
                status: 200,
                body: format!(
                    r#"{{"access_token":"{}","token_type":"bearer"}}"#,
                    self.token.lock().unwrap()
                ),
            })
        } else {
            Ok(HttpResponse {
                status: 401,
                body: r#"{"detail":"Invalid credentials"}"#.to_string(),
            })
        }
    }
}

/// In-process stand-in for the detection push channel
#[derive(Debug, Default)]
pub struct FakePushServer {
    /// Sender for the open connection; `None` frames close it
    current: Mutex<Option<mpsc::UnboundedSender<Option<String>>>>,
    pub connects: Mutex<Vec<Instant>>,
    pub refuse: AtomicBool,
}

impl FakePushServer {
    pub fn publish(&self, text: &str) {
        if let Some(tx) = self.current.lock().unwrap().as_ref() {
            let _ = tx.send(Some(text.to_string()));
        }
    }

    pub fn drop_connection(&self) {
        if let Some(tx) = self.current.lock().unwrap().take() {
            let _ = tx.send(None);
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }
}

struct FakePushStream {
    rx: mpsc::UnboundedReceiver<Option<String>>,
}

#[async_trait::async_trait]
impl PushStream for FakePushStream {
    async fn next_message(&mut self) -> watchpost::Result<Option<String>> {
        Ok(self.rx.recv().await.flatten())
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}

#[async_trait::async_trait]
impl PushConnector for FakePushServer {
    async fn connect(&self, _url: &str) -> watchpost::Result<Box<dyn PushStream>> {
        self.connects.lock().unwrap().push(Instant::now());
        if self.refuse.load(Ordering::SeqCst) {
            return Err(WatchpostError::PushChannel("connection refused".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.current.lock().unwrap() = Some(tx);
        Ok(Box::new(FakePushStream { rx }))
    }
}

#[derive(Debug, Default, World)]
pub struct WatchpostWorld {
    pub backend: Arc<FakeBackend>,
    pub push: Arc<FakePushServer>,
    pub token_dir: Option<TempDir>,
    pub reconnect_delay_ms: Option<u64>,
    pub controller: Option<Arc<SessionController>>,

    pub login_result: Option<Result<Session, AuthError>>,
    pub response_body: Option<String>,
}

impl WatchpostWorld {
    pub fn token_path(&mut self) -> std::path::PathBuf {
        self.token_dir
            .get_or_insert_with(|| TempDir::new().expect("temp dir"))
            .path()
            .join("session.json")
    }

    /// Build the controller on first use
    pub fn controller(&mut self) -> Arc<SessionController> {
        if let Some(controller) = &self.controller {
            return Arc::clone(controller);
        }

        let config = SessionConfig {
            token_path: self.token_path(),
            camera_refresh_interval_seconds: 1,
            reconnect_delay_ms: self.reconnect_delay_ms.unwrap_or(100),
        };
        let http: Arc<dyn HttpClient> = self.backend.clone();
        let backend = BackendClient::new(&BackendConfig::default(), http).expect("backend client");
        let controller = Arc::new(SessionController::new(
            backend,
            SessionContext::new(Arc::new(FileTokenStore::new(config.token_path.clone()))),
            new_state_handle(100),
            self.push.clone(),
            vec![],
            &config,
        ));
        self.controller = Some(Arc::clone(&controller));
        controller
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
