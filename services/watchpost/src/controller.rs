//! Session controller: login and logout, and the per-session tasks
//!
//! A session owns two tasks, the camera refresh loop and the alert push
//! channel. Both stop when the session's cancellation token fires, which
//! happens on logout, on a replacing login, and on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendClient, Credentials};
use crate::channel::AlertChannel;
use crate::config::SessionConfig;
use crate::error::AuthError;
use crate::notifier::Notifier;
use crate::push::PushConnector;
use crate::session::{Session, SessionContext};
use crate::state::{current_epoch_ms, StateHandle};

/// Tasks running on behalf of the current session
struct ActiveSession {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Page root: owns the session and everything that runs while it is active
pub struct SessionController {
    backend: BackendClient,
    session: SessionContext,
    state: StateHandle,
    connector: Arc<dyn PushConnector>,
    notifiers: Vec<Arc<dyn Notifier>>,
    refresh_interval: Duration,
    reconnect_delay: Duration,
    active: Mutex<Option<ActiveSession>>,
    /// Fired once by `shutdown`
    closing: CancellationToken,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("backend", &self.backend)
            .field("notifiers", &self.notifiers.len())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// `notifiers` should be empty when notifications are not permitted
    pub fn new(
        backend: BackendClient,
        session: SessionContext,
        state: StateHandle,
        connector: Arc<dyn PushConnector>,
        notifiers: Vec<Arc<dyn Notifier>>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            backend,
            session,
            state,
            connector,
            notifiers,
            refresh_interval: config.camera_refresh_interval(),
            reconnect_delay: config.reconnect_delay(),
            active: Mutex::new(None),
            closing: CancellationToken::new(),
        }
    }

    /// Submit credentials and, on success, start a new session.
    ///
    /// A failed attempt records a dismissable error and leaves any existing
    /// session running.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        // Runs outside the session lock
        let attempt = tokio::select! {
            biased;
            _ = self.closing.cancelled() => Err(AuthError::Cancelled),
            result = self.backend.login(credentials) => result,
        };
        let session = match attempt {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.state.write().await.login_error = Some(e.to_string());
                return Err(e);
            }
        };

        let mut active = self.active.lock().await;
        if self.closing.is_cancelled() {
            return Err(AuthError::Cancelled);
        }
        stop_tasks(&mut active).await;
        if let Err(e) = self.session.establish(session.clone()).await {
            tracing::warn!("Session could not be persisted: {}", e);
        }
        {
            let mut state = self.state.write().await;
            state.reset_session();
            state.login_error = None;
        }
        *active = Some(self.start_tasks().await);

        Ok(session)
    }

    /// End the session: stop its tasks, forget the token and clear the display
    pub async fn logout(&self) -> crate::Result<()> {
        let mut active = self.active.lock().await;
        stop_tasks(&mut active).await;

        let cleared = self.session.destroy().await;
        self.state.write().await.reset_session();
        tracing::info!("Logged out");
        cleared
    }

    /// Resume a session persisted by a previous run.
    ///
    /// Returns whether a session was restored.
    pub async fn rehydrate(&self) -> crate::Result<bool> {
        let mut active = self.active.lock().await;
        if self.session.rehydrate().await?.is_none() {
            return Ok(false);
        }

        stop_tasks(&mut active).await;
        self.state.write().await.reset_session();
        *active = Some(self.start_tasks().await);
        Ok(true)
    }

    /// Stop the session tasks, keeping the persisted token for the next run.
    ///
    /// Logins still in flight are abandoned and later ones are refused.
    pub async fn shutdown(&self) {
        self.closing.cancel();
        let mut active = self.active.lock().await;
        stop_tasks(&mut active).await;
        tracing::debug!("Session controller shut down");
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.login_error = None;
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    async fn start_tasks(&self) -> ActiveSession {
        let cancel = CancellationToken::new();
        self.state.write().await.session_started_epoch_ms = Some(current_epoch_ms());

        let refresh = tokio::spawn(camera_refresh_loop(
            self.backend.clone(),
            self.session.clone(),
            Arc::clone(&self.state),
            self.refresh_interval,
            cancel.clone(),
        ));

        let channel = AlertChannel::new(
            self.backend.clone(),
            Arc::clone(&self.connector),
            Arc::clone(&self.state),
            self.notifiers.clone(),
            self.reconnect_delay,
            cancel.clone(),
        );
        let push = tokio::spawn(channel.run());

        tracing::info!("Session started");
        ActiveSession {
            cancel,
            tasks: vec![refresh, push],
        }
    }
}

/// Cancel the running session, if any, and wait for its tasks to finish
async fn stop_tasks(active: &mut Option<ActiveSession>) {
    let Some(session) = active.take() else {
        return;
    };
    session.cancel.cancel();
    for task in session.tasks {
        if let Err(e) = task.await {
            tracing::warn!("Session task ended abnormally: {}", e);
        }
    }
}

/// Replace the camera set on a fixed interval while the session lasts
async fn camera_refresh_loop(
    backend: BackendClient,
    session: SessionContext,
    state: StateHandle,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        let Some(current) = session.current().await else {
            tracing::debug!("No session, camera refresh stopping");
            break;
        };

        let result = tokio::select! {
            result = backend.list_cameras(&current) => result,
            _ = cancel.cancelled() => break,
        };
        let cameras = result.unwrap_or_else(|e| {
            tracing::warn!("Camera refresh failed: {}", e);
            Vec::new()
        });

        {
            let mut state = state.write().await;
            if cancel.is_cancelled() {
                break;
            }
            state.replace_cameras(cameras);
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => break,
        }
    }
    tracing::debug!("Camera refresh loop stopped");
}
