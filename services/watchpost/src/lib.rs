//! Watchpost - Multi-camera surveillance dashboard
//!
//! Logs in to the surveillance backend, keeps the camera list fresh, listens
//! for face-detection alerts on the push channel and serves the live grid and
//! alerts panel to a local browser.

pub mod alerts;
pub mod backend;
pub mod channel;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod grid;
pub mod io;
pub mod models;
pub mod notifier;
pub mod panel;
pub mod push;
pub mod pushover;
pub mod session;
pub mod state;
pub mod storage;

pub use config::{load_config, Config};
pub use error::{AuthError, Result, WatchpostError};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::BackendClient;
use crate::config::NotifierConfig;
use crate::controller::SessionController;
use crate::io::ReqwestHttpClient;
use crate::notifier::Notifier;
use crate::push::WsConnector;
use crate::pushover::PushoverNotifier;
use crate::session::SessionContext;
use crate::storage::FileTokenStore;

/// Build the notifiers detections are forwarded to.
///
/// Empty when notifications are switched off.
pub fn build_notifiers(config: &Config, http: &Arc<dyn io::HttpClient>) -> Vec<Arc<dyn Notifier>> {
    if !config.alerts.notify {
        tracing::debug!("Detection notifications disabled");
        return Vec::new();
    }
    config
        .notifiers
        .iter()
        .map(|notifier_config| -> Arc<dyn Notifier> {
            match notifier_config {
                NotifierConfig::Pushover { .. } => {
                    Arc::new(PushoverNotifier::new(notifier_config, Arc::clone(http)))
                }
            }
        })
        .collect()
}

/// Run the dashboard with the given configuration until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new());
    let cancel = CancellationToken::new();

    let backend = BackendClient::new(&config.backend, Arc::clone(&http))?;
    let session = SessionContext::new(Arc::new(FileTokenStore::new(&config.session.token_path)));
    let notifiers = build_notifiers(&config, &http);
    let state = state::new_state_handle(config.alerts.capacity);

    let controller = Arc::new(SessionController::new(
        backend,
        session,
        state,
        Arc::new(WsConnector::new()),
        notifiers,
        &config.session,
    ));

    match controller.rehydrate().await {
        Ok(true) => {}
        Ok(false) => tracing::info!("No stored session, waiting for login"),
        Err(e) => tracing::warn!("Stored session could not be restored: {}", e),
    }

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    if config.dashboard.enabled {
        let router = dashboard::build_router(
            Arc::clone(&controller),
            config.alerts.tiers,
            config.dashboard.alerts_refresh_ms,
        );
        let addr = SocketAddr::new(config.dashboard.bind_address, config.dashboard.port);
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            WatchpostError::Dashboard(format!(
                "Failed to bind dashboard to port {}: {}",
                config.dashboard.port, e
            ))
        })?;
        tracing::info!("Dashboard listening on http://{}", addr);

        let cancel_for_dashboard = cancel.clone();
        let controller_for_dashboard = Arc::clone(&controller);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_for_dashboard.cancelled().await;
                // Releases login requests still waiting on the backend
                controller_for_dashboard.shutdown().await;
            })
            .await?;
        tracing::debug!("Dashboard stopped");
    } else {
        tracing::info!("Dashboard disabled, running headless");
        cancel.cancelled().await;
    }

    controller.shutdown().await;
    tracing::info!("Watchpost stopped");
    Ok(())
}
