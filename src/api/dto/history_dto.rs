//! History DTOs

use serde::{Deserialize, Serialize};

/// Interaction to record
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordHistoryRequest {
    pub user_message: Option<String>,
    pub bot_reply: Option<String>,
    pub detected_intent: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RecordHistoryResponse {
    pub success: bool,
    pub id: String,
}

/// History list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}
