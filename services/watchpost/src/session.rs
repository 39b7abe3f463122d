//! Session context: the bearer token and its persisted copy

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::storage::TokenStore;

/// An authenticated session identified by an opaque bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Explicit holder of the current session, injected wherever the token is needed.
///
/// Only the session controller mutates it. Clones share the same session.
#[derive(Clone)]
pub struct SessionContext {
    current: Arc<RwLock<Option<Session>>>,
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            store,
        }
    }

    /// Restore the session persisted by a previous run
    pub async fn rehydrate(&self) -> crate::Result<Option<Session>> {
        let restored = self.store.load().await?.map(Session::new);
        *self.current.write().await = restored.clone();
        if restored.is_some() {
            tracing::info!("Restored persisted session");
        }
        Ok(restored)
    }

    /// Make `session` current and persist it.
    ///
    /// The in-memory session is kept even when persisting fails.
    pub async fn establish(&self, session: Session) -> crate::Result<()> {
        let token = session.token().to_string();
        *self.current.write().await = Some(session);
        self.store.save(&token).await
    }

    /// Drop the session from memory, then from storage
    pub async fn destroy(&self) -> crate::Result<()> {
        self.current.write().await.take();
        self.store.clear().await
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.current.read().await.is_some()
    }
}
