use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tributary_config::{EssenceDocument, WorkflowEssence};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::task::WorkflowTask;

/// A loaded workflow ready to be registered with the router.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
  id: String,
  tasks: BTreeMap<String, WorkflowTask>,
  /// topic -> ids of the tasks consuming it, in task order.
  topic_index: BTreeMap<String, Vec<String>>,
  essence: WorkflowEssence,
}

impl Workflow {
  /// Build a workflow from its essence.
  ///
  /// A task is a kickstart task iff it has no parents in `dependencies`.
  pub fn from_essence(essence: WorkflowEssence) -> Result<Self, WorkflowError> {
    let id = essence
      .dag_id()
      .filter(|id| !id.is_empty())
      .ok_or(WorkflowError::MissingDagId)?
      .to_string();

    // Resolve task ids first so the graph can be built over them
    let mut resolved: Vec<(String, &str)> = Vec::with_capacity(essence.tasks.len());
    let mut seen = BTreeSet::new();
    for (key, task) in &essence.tasks {
      let task_id = task
        .task_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| key.clone());
      if !seen.insert(task_id.clone()) {
        return Err(WorkflowError::DuplicateTask {
          workflow_id: id,
          task_id,
        });
      }
      resolved.push((task_id, key.as_str()));
    }

    let mut edges = Vec::new();
    for (task_id, _) in &resolved {
      if let Some(dependency) = essence.dependencies.get(task_id) {
        for parent in dependency.parents() {
          edges.push((parent.clone(), task_id.clone()));
        }
      }
    }

    let graph = Graph::new(resolved.iter().map(|(id, _)| id.as_str()), &edges);

    let mut tasks = BTreeMap::new();
    let mut topic_index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (task_id, key) in &resolved {
      let task_essence = essence.tasks[*key].clone();
      let kickstart = graph.is_entry_point(task_id);
      let task = WorkflowTask::from_essence(task_id.clone(), task_essence, kickstart);
      for topic in &task.topics {
        topic_index
          .entry(topic.clone())
          .or_default()
          .push(task_id.clone());
      }
      tasks.insert(task_id.clone(), task);
    }

    Ok(Self {
      id,
      tasks,
      topic_index,
      essence,
    })
  }

  /// Build a workflow from a raw JSON essence.
  pub fn from_value(value: &Value) -> Result<Self, WorkflowError> {
    let essence: WorkflowEssence =
      serde_json::from_value(value.clone()).map_err(|e| WorkflowError::Malformed {
        id: value
          .pointer("/dag/dag_id")
          .and_then(Value::as_str)
          .unwrap_or("<unknown>")
          .to_string(),
        reason: e.to_string(),
      })?;
    Self::from_essence(essence)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn essence(&self) -> &WorkflowEssence {
    &self.essence
  }

  /// Get a task by ID.
  pub fn task(&self, task_id: &str) -> Option<&WorkflowTask> {
    self.tasks.get(task_id)
  }

  pub fn tasks(&self) -> impl Iterator<Item = &WorkflowTask> {
    self.tasks.values()
  }

  /// Tasks consuming `topic`, in task order.
  pub fn tasks_for_topic(&self, topic: &str) -> Vec<&WorkflowTask> {
    self
      .topic_index
      .get(topic)
      .map(|ids| ids.iter().filter_map(|id| self.tasks.get(id)).collect())
      .unwrap_or_default()
  }

  /// Every topic consumed by some task.
  pub fn topics(&self) -> impl Iterator<Item = &str> {
    self.topic_index.keys().map(String::as_str)
  }

  /// Whether some kickstart task consumes `topic`.
  pub fn is_kickstart_topic(&self, topic: &str) -> bool {
    self.tasks_for_topic(topic).iter().any(|task| task.kickstart)
  }

  pub fn kickstart_topics(&self) -> BTreeSet<&str> {
    self
      .tasks
      .values()
      .filter(|task| task.kickstart)
      .flat_map(|task| task.topics.iter().map(String::as_str))
      .collect()
  }

  /// Check that the workflow can ever be started.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    if self.id.is_empty() {
      return Err(WorkflowError::MissingDagId);
    }
    if !self.tasks.values().any(|task| task.kickstart) {
      return Err(WorkflowError::NoKickstartTask(self.id.clone()));
    }
    Ok(())
  }
}

/// Load every workflow in a multi-workflow document.
///
/// Entries are parsed independently; one failure does not abort the others.
/// Results are returned in document key order, paired with the document key.
pub fn load_workflows_from_essence(
  document: &EssenceDocument,
) -> Vec<(String, Result<Workflow, WorkflowError>)> {
  document
    .iter()
    .map(|(key, value)| {
      let result = Workflow::from_value(value).map_err(|e| match e {
        WorkflowError::Malformed { reason, .. } => WorkflowError::Malformed {
          id: key.clone(),
          reason,
        },
        other => other,
      });
      (key.clone(), result)
    })
    .collect()
}
