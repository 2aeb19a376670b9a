use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::topics;

/// A single message on a session channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
  pub topic: String,
  #[serde(default)]
  pub message: Value,
}

impl Frame {
  pub fn new(topic: impl Into<String>, message: Value) -> Self {
    Self {
      topic: topic.into(),
      message,
    }
  }
}

/// Identifies a run on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRef {
  pub workflow_id: String,
  pub workflow_run_id: String,
}

impl RunRef {
  pub fn new(workflow_id: impl Into<String>, workflow_run_id: impl Into<String>) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      workflow_run_id: workflow_run_id.into(),
    }
  }
}

/// Reply to a request, sent back on the request's topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
  pub req_id: Value,
  pub error: bool,
  pub result: Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl Response {
  pub fn ok(req_id: Value, result: impl Into<Value>) -> Self {
    Self {
      req_id,
      error: false,
      result: result.into(),
      message: None,
    }
  }

  pub fn err(req_id: Value, message: impl Into<String>) -> Self {
    Self {
      req_id,
      error: true,
      result: Value::Bool(false),
      message: Some(message.into()),
    }
  }
}

/// Messages the broker pushes to sessions.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
  /// Sent once a session is admitted.
  Greeting { to: String, message: String },
  /// Ask managers to start a newly created run.
  Kickstart(RunRef),
  /// Ask managers for the status of every listed run.
  CheckStatusBulk(Vec<RunRef>),
  /// Tell a run executor that an event for `topic` was queued.
  NotifyEvent { topic: String },
  /// Reply to a request received on `topic`.
  Response { topic: String, response: Response },
}

impl ServerMessage {
  pub fn topic(&self) -> &str {
    match self {
      Self::Greeting { .. } => topics::GREETING,
      Self::Kickstart(_) => topics::WORKFLOW_KICKSTART,
      Self::CheckStatusBulk(_) => topics::WORKFLOW_CHECK_STATUS_BULK,
      Self::NotifyEvent { .. } => topics::WORKFLOW_RUN_NOTIFY_EVENT,
      Self::Response { topic, .. } => topic.as_str(),
    }
  }

  pub fn into_frame(self) -> Frame {
    let topic = self.topic().to_string();
    let message = match self {
      Self::Greeting { to, message } => json!({ "to": to, "message": message }),
      Self::Kickstart(run) => json!(run),
      Self::CheckStatusBulk(runs) => json!(runs),
      Self::NotifyEvent { topic } => json!({ "topic": topic }),
      Self::Response { response, .. } => json!(response),
    };
    Frame { topic, message }
  }
}
