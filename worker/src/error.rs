//! FILENAME: worker/src/error.rs

use engine::EngineError;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Malformed request: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("Worker panicked: {0}")]
    Panic(String),
}

impl WorkerError {
    /// The response sent in place of a result when a request fails.
    pub fn to_envelope(&self) -> JsonValue {
        json!({
            "error": self.to_string(),
            "chartData": [],
            "payload": {},
        })
    }
}
