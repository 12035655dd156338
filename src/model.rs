// ABOUTME: Serde data models for the Granola API, token exchange, and local files
// ABOUTME: Tolerant parsing with optional fields and flexible timestamps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of the remote document listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Notes panel the app last showed for this meeting (ProseMirror JSON).
    #[serde(default)]
    pub last_viewed_panel: Option<NotesPanel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesPanel {
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub start: Option<TimestampValue>,
    #[serde(default)]
    pub end: Option<TimestampValue>,
    pub text: String,
}

/// Transcript timestamps arrive either as fractional seconds or "HH:MM:SS" strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    Seconds(f64),
    String(String),
}

/// Response body of the token refresh exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Long-lived credential set; exactly one per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub refresh_token: String,
    pub client_id: String,
    pub extracted_at: DateTime<Utc>,
}

/// Short-lived bearer token; never persisted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Durable record of which document ids have been delivered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub synced_ids: BTreeSet<String>,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// One transcript line inside a delivery payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadSegment {
    #[serde(default)]
    pub offset: Option<String>,
    pub speaker: String,
    pub text: String,
}

/// What the webhook receives, one object per document. Built fresh per
/// attempt and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub source: String,
    pub document_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub transcript: Vec<PayloadSegment>,
    pub notes: String,
    pub attendees: Vec<String>,
    pub synced_at: DateTime<Utc>,
}
