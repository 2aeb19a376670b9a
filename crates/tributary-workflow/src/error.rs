use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("workflow essence has no dag.dag_id")]
  MissingDagId,

  #[error("malformed workflow definition {id}: {reason}")]
  Malformed { id: String, reason: String },

  #[error("duplicate task id in workflow {workflow_id}: {task_id}")]
  DuplicateTask {
    workflow_id: String,
    task_id: String,
  },

  #[error("workflow has no kickstart task: {0}")]
  NoKickstartTask(String),
}
