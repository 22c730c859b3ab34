use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Context information for errors, providing additional debugging and tracking data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique identifier for this error instance.
    pub error_id: String,
    /// The event being processed when this error occurred, if any.
    pub event_id: Option<String>,
    /// The entity key (`type:id`) being processed when this error occurred, if any.
    pub entity_key: Option<String>,
    /// Additional structured data.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Stack of error origins (for chained errors).
    pub trace: Vec<String>,
    /// Timestamp when the error occurred.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            error_id: Uuid::new_v4().to_string(),
            event_id: None,
            entity_key: None,
            metadata: HashMap::new(),
            trace: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_entity_key(mut self, entity_key: impl Into<String>) -> Self {
        self.entity_key = Some(entity_key.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn add_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace.push(trace.into());
        self
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}
