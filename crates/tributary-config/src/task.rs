use serde::{Deserialize, Serialize};

/// The essence of a single task.
///
/// Generic operators carry none of the event fields; only event-driven
/// operators declare `topic`/`model_name` and `key_field`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskEssence {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub task_id: Option<String>,

  /// Explicit event topic.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub topic: Option<String>,

  /// Shorthand for the `datamodel.{model_name}.{create,update,delete}` topics.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model_name: Option<String>,

  /// Message attribute used to correlate events with a run.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key_field: Option<String>,

  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}
