use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tributary_workflow::Workflow;

/// A key field of a topic and the value it was bound to, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyBinding {
  pub field: String,
  pub value: Option<Value>,
}

impl KeyBinding {
  pub fn is_bound(&self) -> bool {
    self.value.is_some()
  }
}

/// Per-topic correlation state of a run.
///
/// Values start unbound and are fixed by the first event carrying the field.
/// A bound value never changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Correlation {
  entries: BTreeMap<String, Vec<KeyBinding>>,
}

/// The non-null value of `field` in an object message.
fn field_value<'a>(message: &'a Value, field: &str) -> Option<&'a Value> {
  message.get(field).filter(|value| !value.is_null())
}

impl Correlation {
  /// One entry per topic of every task, with one unbound binding per distinct
  /// key field consuming that topic.
  pub fn for_workflow(workflow: &Workflow) -> Self {
    let mut entries: BTreeMap<String, Vec<KeyBinding>> = BTreeMap::new();
    for task in workflow.tasks() {
      for topic in &task.topics {
        let bindings = entries.entry(topic.clone()).or_default();
        if let Some(field) = &task.key_field
          && !bindings.iter().any(|b| &b.field == field)
        {
          bindings.push(KeyBinding {
            field: field.clone(),
            value: None,
          });
        }
      }
    }
    Self { entries }
  }

  pub fn topics(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn contains_topic(&self, topic: &str) -> bool {
    self.entries.contains_key(topic)
  }

  pub fn bindings(&self, topic: &str) -> &[KeyBinding] {
    self
      .entries
      .get(topic)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// The bound value of `field` under `topic`.
  pub fn value(&self, topic: &str, field: &str) -> Option<&Value> {
    self
      .bindings(topic)
      .iter()
      .find(|b| b.field == field)
      .and_then(|b| b.value.as_ref())
  }

  /// Every binding under `topic` whose field the message carries is either
  /// unbound or bound to the same value.
  pub fn matches(&self, topic: &str, message: &Value) -> bool {
    self.bindings(topic).iter().all(|binding| {
      match (field_value(message, &binding.field), &binding.value) {
        (Some(incoming), Some(bound)) => incoming == bound,
        _ => true,
      }
    })
  }

  /// Fix unbound values under `topic` from the message, then propagate them to
  /// unbound bindings of the same field under every other topic.
  ///
  /// Returns the number of bindings that were fixed.
  pub fn bind_from_message(&mut self, topic: &str, message: &Value) -> usize {
    let mut fixed: Vec<(String, Value)> = Vec::new();
    if let Some(bindings) = self.entries.get_mut(topic) {
      for binding in bindings.iter_mut().filter(|b| !b.is_bound()) {
        if let Some(value) = field_value(message, &binding.field) {
          binding.value = Some(value.clone());
          fixed.push((binding.field.clone(), value.clone()));
        }
      }
    }

    let mut count = fixed.len();
    for (field, value) in &fixed {
      for (other_topic, bindings) in self.entries.iter_mut() {
        if other_topic == topic {
          continue;
        }
        for binding in bindings
          .iter_mut()
          .filter(|b| !b.is_bound() && &b.field == field)
        {
          binding.value = Some(value.clone());
          count += 1;
        }
      }
    }
    count
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn workflow() -> Workflow {
    Workflow::from_value(&json!({
      "dag": { "dag_id": "wf" },
      "tasks": {
        "t1": { "topic": "onu.events", "key_field": "serialNumber" },
        "t2": { "topic": "auth.events", "key_field": "serialNumber" },
        "t3": { "topic": "dhcp.events", "key_field": "macAddress" },
        "t4": { "topic": "timer.tick" }
      },
      "dependencies": {
        "t2": { "parents": ["t1"] },
        "t3": { "parents": ["t2"] },
        "t4": { "parents": ["t3"] }
      }
    }))
    .unwrap()
  }

  #[test]
  fn test_entries_per_topic() {
    let correlation = Correlation::for_workflow(&workflow());

    assert_eq!(correlation.topics().count(), 4);
    assert_eq!(correlation.bindings("onu.events").len(), 1);
    assert!(correlation.contains_topic("timer.tick"));
    assert!(correlation.bindings("timer.tick").is_empty());
    assert!(!correlation.bindings("onu.events")[0].is_bound());
  }

  #[test]
  fn test_bind_propagates_across_topics() {
    let mut correlation = Correlation::for_workflow(&workflow());

    let fixed = correlation.bind_from_message("onu.events", &json!({ "serialNumber": "A" }));

    assert_eq!(fixed, 2);
    assert_eq!(
      correlation.value("onu.events", "serialNumber"),
      Some(&json!("A"))
    );
    assert_eq!(
      correlation.value("auth.events", "serialNumber"),
      Some(&json!("A"))
    );
    assert_eq!(correlation.value("dhcp.events", "macAddress"), None);
  }

  #[test]
  fn test_bound_values_never_change() {
    let mut correlation = Correlation::for_workflow(&workflow());
    correlation.bind_from_message("onu.events", &json!({ "serialNumber": "A" }));

    let fixed = correlation.bind_from_message("onu.events", &json!({ "serialNumber": "B" }));

    assert_eq!(fixed, 0);
    assert_eq!(
      correlation.value("onu.events", "serialNumber"),
      Some(&json!("A"))
    );
  }

  #[test]
  fn test_matches() {
    let mut correlation = Correlation::for_workflow(&workflow());
    let a = json!({ "serialNumber": "A" });

    // unbound accepts anything
    assert!(correlation.matches("onu.events", &a));

    correlation.bind_from_message("onu.events", &a);
    assert!(correlation.matches("onu.events", &a));
    assert!(correlation.matches("auth.events", &a));
    assert!(!correlation.matches("auth.events", &json!({ "serialNumber": "B" })));
    // a message without the key field, or with a null one, does not conflict
    assert!(correlation.matches("auth.events", &json!({ "other": 1 })));
    assert!(correlation.matches("auth.events", &json!({ "serialNumber": null })));
  }

  #[test]
  fn test_null_does_not_bind() {
    let mut correlation = Correlation::for_workflow(&workflow());

    let fixed = correlation.bind_from_message("onu.events", &json!({ "serialNumber": null }));

    assert_eq!(fixed, 0);
    assert!(!correlation.bindings("onu.events")[0].is_bound());
  }
}
