use serde::{Deserialize, Serialize};

/// An event buffered in a run, waiting to be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
  pub topic: String,
  pub message: serde_json::Value,
}

impl QueuedEvent {
  pub fn new(topic: impl Into<String>, message: serde_json::Value) -> Self {
    Self {
      topic: topic.into(),
      message,
    }
  }
}
