use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's raw answer to a tick. `processed_text` is filled in by the
/// text-processing pipeline after the row is created, never at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub tenant_id: String,
    pub id: String,
    pub collection_id: String,
    pub user_id: String,
    pub received_at: DateTime<Utc>,
    pub raw_text: String,
    pub processed_text: Option<String>,
    /// External event id; uniqueness on (tenant_id, dedupe_key) is the sole
    /// defense against redelivery of the same upstream event.
    pub dedupe_key: Option<String>,
}
