//! Alerts panel: display-ready views of the alert feed

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::alerts::{AlertEntry, AlertFeed};
use crate::backend::BackendClient;
use crate::config::TierThresholds;

/// Display classification of a detection score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Classify a score. Scores at a threshold fall into the upper tier.
    pub fn classify(score: f64, thresholds: &TierThresholds) -> Self {
        if score < thresholds.low_below {
            ConfidenceTier::Low
        } else if score < thresholds.medium_below {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::High
        }
    }

    /// (text colour, background colour)
    pub fn colors(&self) -> (&'static str, &'static str) {
        match self {
            ConfidenceTier::Low => ("#155724", "#d4edda"),
            ConfidenceTier::Medium => ("#856404", "#fff3cd"),
            ConfidenceTier::High => ("#721c24", "#f8d7da"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::Low => "low",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::High => "high",
        }
    }
}

/// Render a backend timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// RFC 3339 and naive ISO 8601 (taken as UTC) are understood; anything else is
/// returned verbatim.
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S UTC";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc).format(DISPLAY).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format(DISPLAY).to_string();
    }
    raw.to_string()
}

/// Render-ready description of one alert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertView {
    pub seq: u64,
    pub subject: String,
    pub camera_id: String,
    pub track_label: Option<String>,
    pub time: String,
    pub raw_timestamp: String,
    pub score: Option<String>,
    pub tier: Option<ConfidenceTier>,
    pub snapshot_url: Option<String>,
    pub is_new: bool,
    pub expanded: bool,
    pub received_at_epoch_ms: u64,
}

impl AlertView {
    fn from_entry(
        entry: &AlertEntry,
        feed: &AlertFeed,
        thresholds: &TierThresholds,
        backend: &BackendClient,
    ) -> Self {
        let alert = &entry.alert;
        Self {
            seq: entry.seq,
            subject: alert.subject_name().unwrap_or("Unknown").to_string(),
            camera_id: alert.camera_id.clone(),
            track_label: alert.track_id.as_ref().map(|t| format!("Track #{}", t)),
            time: format_timestamp(&alert.timestamp),
            raw_timestamp: alert.timestamp.clone(),
            score: alert.confidence.map(|c| format!("{:.3}", c)),
            tier: alert
                .confidence
                .map(|c| ConfidenceTier::classify(c, thresholds)),
            snapshot_url: alert
                .snapshot
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| backend.snapshot_url(s)),
            is_new: feed.newest_seq() == Some(entry.seq),
            expanded: feed.selected() == Some(entry.seq),
            received_at_epoch_ms: entry.received_at_epoch_ms,
        }
    }
}

/// Views for every entry in the feed, newest first
pub fn build_views(
    feed: &AlertFeed,
    thresholds: &TierThresholds,
    backend: &BackendClient,
) -> Vec<AlertView> {
    feed.iter()
        .map(|entry| AlertView::from_entry(entry, feed, thresholds, backend))
        .collect()
}
