use thiserror::Error;
use tributary_session::SessionError;
use tributary_workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum RouterError {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("workflow already exists: {0}")]
  DuplicateWorkflow(String),

  #[error("workflow run already exists: {0}")]
  DuplicateRun(String),

  #[error("session already exists: {0}")]
  DuplicateSession(String),

  #[error("workflow not found: {0}")]
  WorkflowNotFound(String),

  #[error("workflow run not found: {0}")]
  RunNotFound(String),

  #[error("task not found in workflow {workflow_id}: {task_id}")]
  TaskNotFound { workflow_id: String, task_id: String },

  #[error("workflow has active runs: {0}")]
  WorkflowInUse(String),

  #[error(transparent)]
  Workflow(#[from] WorkflowError),

  #[error(transparent)]
  Session(#[from] SessionError),
}

/// Coarse classification of router failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  DuplicateId,
  NotFound,
  InUse,
  MalformedDefinition,
}

impl RouterError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::DuplicateWorkflow(_) | Self::DuplicateRun(_) | Self::DuplicateSession(_) => {
        ErrorKind::DuplicateId
      }
      Self::WorkflowNotFound(_) | Self::RunNotFound(_) | Self::TaskNotFound { .. } => {
        ErrorKind::NotFound
      }
      Self::WorkflowInUse(_) => ErrorKind::InUse,
      Self::Workflow(WorkflowError::NoKickstartTask(_)) => ErrorKind::Validation,
      Self::Workflow(_) => ErrorKind::MalformedDefinition,
      Self::Session(SessionError::Duplicate(_)) => ErrorKind::DuplicateId,
      Self::Session(_) => ErrorKind::Validation,
    }
  }
}
