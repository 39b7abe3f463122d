//! Error types for the watchpost dashboard

/// Errors that can occur in the watchpost dashboard
#[derive(Debug, thiserror::Error)]
pub enum WatchpostError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Push channel error: {0}")]
    PushChannel(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a login attempt can fail
///
/// The `Display` text is what the operator sees in the login error banner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Username is required")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login rejected by backend (status {0})")]
    Rejected(u16),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Unexpected login response: {0}")]
    MalformedResponse(String),

    #[error("Login cancelled, dashboard is shutting down")]
    Cancelled,
}

/// Result type alias for watchpost operations
pub type Result<T> = std::result::Result<T, WatchpostError>;
