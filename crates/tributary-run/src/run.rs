use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;
use tributary_workflow::Workflow;

use crate::correlation::Correlation;
use crate::error::RunError;
use crate::event::QueuedEvent;
use crate::limits::{RunLimits, exceeds};
use crate::status::{RunState, TaskStatus};

/// Generate a run id of the form `{workflow_id}_{yyyymmdd_HHMMSSmmm}`.
pub fn generate_run_id(workflow_id: &str, at: DateTime<Utc>) -> String {
  format!("{}_{}", workflow_id, at.format("%Y%m%d_%H%M%S%3f"))
}

/// One in-flight execution of a workflow.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
  id: String,
  workflow_id: String,
  correlation: Correlation,
  queue: VecDeque<QueuedEvent>,
  trash: VecDeque<QueuedEvent>,
  task_status: BTreeMap<String, TaskStatus>,
  attached_clients: Vec<String>,
  kickstarted: bool,
  finished: bool,
  limits: RunLimits,
}

impl WorkflowRun {
  /// Create a run with a fresh id and default limits.
  pub fn new(workflow: &Workflow) -> Self {
    Self::with_id(
      generate_run_id(workflow.id(), Utc::now()),
      workflow,
      RunLimits::default(),
    )
  }

  /// Create a run with an explicit id.
  pub fn with_id(id: impl Into<String>, workflow: &Workflow, limits: RunLimits) -> Self {
    let task_status = workflow
      .tasks()
      .map(|task| (task.id.clone(), TaskStatus::Unknown))
      .collect();

    Self {
      id: id.into(),
      workflow_id: workflow.id().to_string(),
      correlation: Correlation::for_workflow(workflow),
      queue: VecDeque::new(),
      trash: VecDeque::new(),
      task_status,
      attached_clients: Vec::new(),
      kickstarted: false,
      finished: false,
      limits,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn workflow_id(&self) -> &str {
    &self.workflow_id
  }

  pub fn correlation(&self) -> &Correlation {
    &self.correlation
  }

  pub fn limits(&self) -> RunLimits {
    self.limits
  }

  /// Bind unbound correlation values from an event. See
  /// [`Correlation::bind_from_message`].
  pub fn bind_from_message(&mut self, topic: &str, message: &Value) -> usize {
    self.correlation.bind_from_message(topic, message)
  }

  /// Whether some task consuming `topic` has not ended yet.
  pub fn is_topic_acceptable(&self, workflow: &Workflow, topic: &str) -> bool {
    workflow.tasks_for_topic(topic).iter().any(|task| {
      self
        .task_status
        .get(&task.id)
        .is_none_or(|status| *status != TaskStatus::End)
    })
  }

  /// Whether the run wants this event: the topic is still acceptable and the
  /// message does not conflict with any bound correlation value.
  pub fn is_event_acceptable(&self, workflow: &Workflow, topic: &str, message: &Value) -> bool {
    self.is_topic_acceptable(workflow, topic) && self.correlation.matches(topic, message)
  }

  /// Append an event to the tail of the queue.
  pub fn enqueue(&mut self, topic: impl Into<String>, message: Value) {
    self.queue.push_back(QueuedEvent::new(topic, message));

    if exceeds(self.queue.len(), self.limits.max_queue_len)
      && let Some(evicted) = self.queue.pop_front()
    {
      warn!(
        workflow_run_id = %self.id,
        topic = %evicted.topic,
        max_queue_len = self.limits.max_queue_len,
        "queue_full_evicted_oldest"
      );
      self.push_trash(evicted);
    }
  }

  /// Pop the oldest event, moving it into the trash.
  pub fn dequeue_head(&mut self) -> Option<QueuedEvent> {
    let event = self.queue.pop_front()?;
    self.push_trash(event.clone());
    Some(event)
  }

  /// Pop the oldest event with the given topic, moving it into the trash.
  pub fn dequeue_by_topic(&mut self, topic: &str) -> Option<QueuedEvent> {
    let position = self.queue.iter().position(|e| e.topic == topic)?;
    let event = self.queue.remove(position)?;
    self.push_trash(event.clone());
    Some(event)
  }

  pub fn peek_head(&self) -> Option<&QueuedEvent> {
    self.queue.front()
  }

  pub fn peek_by_topic(&self, topic: &str) -> Option<&QueuedEvent> {
    self.queue.iter().find(|e| e.topic == topic)
  }

  pub fn queue_len(&self) -> usize {
    self.queue.len()
  }

  pub fn queue(&self) -> impl Iterator<Item = &QueuedEvent> {
    self.queue.iter()
  }

  /// Previously dequeued events, oldest first.
  pub fn trash(&self) -> impl Iterator<Item = &QueuedEvent> {
    self.trash.iter()
  }

  pub fn trash_len(&self) -> usize {
    self.trash.len()
  }

  fn push_trash(&mut self, event: QueuedEvent) {
    self.trash.push_back(event);
    while exceeds(self.trash.len(), self.limits.max_trash_len) {
      self.trash.pop_front();
    }
  }

  pub fn task_status(&self, task_id: &str) -> Option<TaskStatus> {
    self.task_status.get(task_id).copied()
  }

  pub fn set_task_status(&mut self, task_id: &str, status: TaskStatus) -> Result<(), RunError> {
    let slot = self
      .task_status
      .get_mut(task_id)
      .ok_or_else(|| RunError::TaskNotFound {
        run_id: self.id.clone(),
        task_id: task_id.to_string(),
      })?;
    *slot = status;
    Ok(())
  }

  pub fn set_kickstarted(&mut self) {
    self.kickstarted = true;
  }

  pub fn is_kickstarted(&self) -> bool {
    self.kickstarted
  }

  pub fn set_finished(&mut self) {
    self.finished = true;
  }

  pub fn is_finished(&self) -> bool {
    self.finished
  }

  pub fn state(&self) -> RunState {
    if self.finished {
      RunState::Finished
    } else if self.kickstarted {
      RunState::Kickstarted
    } else {
      RunState::Pending
    }
  }

  /// Attach a session. Attaching twice is a no-op.
  pub fn attach_client(&mut self, session_id: &str) {
    if !self.attached_clients.iter().any(|id| id == session_id) {
      self.attached_clients.push(session_id.to_string());
    }
  }

  /// Detach a session. Detaching an unknown session is a no-op.
  pub fn detach_client(&mut self, session_id: &str) {
    self.attached_clients.retain(|id| id != session_id);
  }

  pub fn attached_clients(&self) -> &[String] {
    &self.attached_clients
  }
}
