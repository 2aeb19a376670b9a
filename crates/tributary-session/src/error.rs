use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("session has no id")]
  MissingId,

  #[error("session {id} has unknown type: {role}")]
  UnknownRole { id: String, role: String },

  #[error("run executor session {0} has no workflow_id")]
  MissingWorkflowId(String),

  #[error("run executor session {0} has no workflow_run_id")]
  MissingWorkflowRunId(String),

  #[error("session already exists: {0}")]
  Duplicate(String),
}
