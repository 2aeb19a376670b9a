use std::collections::BTreeSet;

use tributary_config::TaskEssence;

/// The three data-model topics synthesized from a task's `model_name`.
pub(crate) fn datamodel_topics(model_name: &str) -> [String; 3] {
  ["create", "update", "delete"].map(|op| format!("datamodel.{model_name}.{op}"))
}

/// A task within a loaded workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTask {
  pub id: String,
  /// Every topic this task consumes.
  pub topics: BTreeSet<String>,
  pub key_field: Option<String>,
  pub kickstart: bool,
  pub essence: TaskEssence,
}

impl WorkflowTask {
  pub(crate) fn from_essence(id: String, essence: TaskEssence, kickstart: bool) -> Self {
    let mut topics = BTreeSet::new();
    if let Some(topic) = essence.topic.as_deref().filter(|t| !t.is_empty()) {
      topics.insert(topic.to_string());
    }
    if let Some(model_name) = essence.model_name.as_deref().filter(|m| !m.is_empty()) {
      topics.extend(datamodel_topics(model_name));
    }

    let key_field = essence
      .key_field
      .clone()
      .filter(|field| !field.is_empty());

    Self {
      id,
      topics,
      key_field,
      kickstart,
      essence,
    }
  }

  pub fn consumes(&self, topic: &str) -> bool {
    self.topics.contains(topic)
  }
}
