//! Chat DTOs

use serde::Deserialize;

/// Chat request; `message` is optional so that its absence maps to 400
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub message: Option<String>,
}
