use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
  #[error("task not found in run {run_id}: {task_id}")]
  TaskNotFound { run_id: String, task_id: String },
}
