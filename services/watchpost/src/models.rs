//! Records exchanged with the surveillance backend

use std::fmt;

use serde::{Deserialize, Serialize};

/// A camera known to the backend's camera registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// The person a detection was matched against
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub name: Option<String>,
}

/// Track identifiers arrive as numbers from some workers and strings from others
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackId::Number(n) => write!(f, "{}", n),
            TrackId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A single face-detection event pushed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub person: Option<Subject>,
    pub camera_id: String,
    #[serde(default)]
    pub track_id: Option<TrackId>,
    pub timestamp: String,
    /// Match distance reported by the recognizer; lower is a closer match
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub snapshot: Option<String>,
}

impl Alert {
    /// Subject name, if the backend identified one
    pub fn subject_name(&self) -> Option<&str> {
        self.person
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// Body of a successful login response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}
