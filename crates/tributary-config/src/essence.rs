use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dependency::DependencyEssence;
use crate::task::TaskEssence;

/// A document holding several workflow essences keyed by workflow id.
///
/// Entries are kept as raw JSON so that one malformed workflow does not
/// prevent the others from being parsed.
pub type EssenceDocument = serde_json::Map<String, serde_json::Value>;

/// DAG-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagEssence {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dag_id: Option<String>,

  /// Anything else the exporter attached (schedule, owner, ...).
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The essence of a single workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowEssence {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dag: Option<DagEssence>,

  #[serde(default)]
  pub tasks: BTreeMap<String, TaskEssence>,

  #[serde(default)]
  pub dependencies: BTreeMap<String, DependencyEssence>,
}

impl WorkflowEssence {
  /// The DAG id, if the essence declares one.
  pub fn dag_id(&self) -> Option<&str> {
    self.dag.as_ref().and_then(|dag| dag.dag_id.as_deref())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_minimal_essence() {
    let essence: WorkflowEssence = serde_json::from_value(json!({
      "dag": { "dag_id": "att_workflow", "schedule_interval": null },
      "tasks": {
        "onu_event_handler": {
          "task_id": "onu_event_handler",
          "topic": "onu.events",
          "key_field": "serialNumber"
        }
      },
      "dependencies": {
        "onu_event_handler": {}
      }
    }))
    .unwrap();

    assert_eq!(essence.dag_id(), Some("att_workflow"));
    assert!(essence.dag.as_ref().unwrap().extra.contains_key("schedule_interval"));
    assert_eq!(essence.tasks.len(), 1);
  }

  #[test]
  fn test_null_parents_read_as_empty() {
    let essence: WorkflowEssence = serde_json::from_value(json!({
      "dag": { "dag_id": "wf" },
      "tasks": {},
      "dependencies": {
        "a": { "children": ["b"] },
        "b": { "parents": ["a"] },
        "c": { "parents": [] },
        "d": { "parents": null }
      }
    }))
    .unwrap();

    assert!(essence.dependencies["a"].parents().is_empty());
    assert_eq!(essence.dependencies["a"].children(), &["b".to_string()]);
    assert_eq!(essence.dependencies["b"].parents(), &["a".to_string()]);
    assert!(essence.dependencies["c"].parents().is_empty());
    assert!(essence.dependencies["d"].parents().is_empty());
  }

  #[test]
  fn test_missing_dag() {
    let essence: WorkflowEssence = serde_json::from_value(json!({ "tasks": {} })).unwrap();
    assert_eq!(essence.dag_id(), None);
  }
}
