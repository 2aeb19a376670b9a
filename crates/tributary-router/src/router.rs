use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use tributary_config::EssenceDocument;
use tributary_protocol::{RunRef, RunStatusReport, ServerMessage};
use tributary_run::{
  QueuedEvent, RunError, RunStatus, TaskStatus, WorkflowRun, generate_run_id,
};
use tributary_session::{Session, SessionRegistry, SessionRole};
use tributary_workflow::{Workflow, load_workflows_from_essence};

use crate::config::{FetchMode, RouterConfig};
use crate::error::RouterError;
use crate::outcome::RouteOutcome;

/// Owns workflows, runs and sessions, and dispatches events between them.
#[derive(Debug, Default)]
pub struct Router {
  config: RouterConfig,
  workflows: HashMap<String, Workflow>,
  /// Workflow ids in registration order.
  workflow_order: Vec<String>,
  runs: HashMap<String, WorkflowRun>,
  /// Run ids in registration order.
  run_order: Vec<String>,
  sessions: SessionRegistry,
}

impl Router {
  pub fn new(config: RouterConfig) -> Self {
    Self {
      config,
      ..Default::default()
    }
  }

  pub fn config(&self) -> &RouterConfig {
    &self.config
  }

  // Workflows

  /// Register a workflow. It must validate and its id must be new.
  pub fn register_workflow(&mut self, workflow: Workflow) -> Result<(), RouterError> {
    workflow.validate()?;

    let workflow_id = workflow.id().to_string();
    if self.workflows.contains_key(&workflow_id) {
      warn!(workflow_id = %workflow_id, "workflow_already_registered");
      return Err(RouterError::DuplicateWorkflow(workflow_id));
    }

    info!(
      workflow_id = %workflow_id,
      kickstart_topics = ?workflow.kickstart_topics(),
      "workflow_registered"
    );
    self.workflow_order.push(workflow_id.clone());
    self.workflows.insert(workflow_id, workflow);
    Ok(())
  }

  /// Load and register every workflow in a multi-workflow document.
  ///
  /// Each entry succeeds or fails on its own; results are keyed by document
  /// key.
  pub fn register_workflows_from_essence(
    &mut self,
    document: &EssenceDocument,
  ) -> Vec<(String, Result<(), RouterError>)> {
    load_workflows_from_essence(document)
      .into_iter()
      .map(|(key, loaded)| {
        let result = loaded
          .map_err(RouterError::from)
          .and_then(|workflow| self.register_workflow(workflow));
        if let Err(e) = &result {
          warn!(workflow_key = %key, error = %e, "workflow_registration_failed");
        }
        (key, result)
      })
      .collect()
  }

  pub fn workflow(&self, workflow_id: &str) -> Option<&Workflow> {
    self.workflows.get(workflow_id)
  }

  /// Registered workflow ids, in registration order.
  pub fn list_workflows(&self) -> Vec<String> {
    self.workflow_order.clone()
  }

  pub fn check_workflow(&self, workflow_id: &str) -> bool {
    self.workflows.contains_key(workflow_id)
  }

  /// Remove a workflow. Rejected while any run references it.
  pub fn remove_workflow(&mut self, workflow_id: &str) -> Result<Workflow, RouterError> {
    if !self.workflows.contains_key(workflow_id) {
      return Err(RouterError::WorkflowNotFound(workflow_id.to_string()));
    }
    if self.runs.values().any(|run| run.workflow_id() == workflow_id) {
      warn!(workflow_id = %workflow_id, "workflow_remove_rejected_active_runs");
      return Err(RouterError::WorkflowInUse(workflow_id.to_string()));
    }

    self.workflow_order.retain(|id| id != workflow_id);
    let workflow = self
      .workflows
      .remove(workflow_id)
      .ok_or_else(|| RouterError::WorkflowNotFound(workflow_id.to_string()))?;
    info!(workflow_id = %workflow_id, "workflow_removed");
    Ok(workflow)
  }

  // Runs

  /// Register a run created outside the router.
  pub fn register_run(&mut self, run: WorkflowRun) -> Result<(), RouterError> {
    let run_id = run.id().to_string();
    if self.runs.contains_key(&run_id) {
      warn!(workflow_run_id = %run_id, "workflow_run_already_registered");
      return Err(RouterError::DuplicateRun(run_id));
    }
    if !self.workflows.contains_key(run.workflow_id()) {
      return Err(RouterError::WorkflowNotFound(run.workflow_id().to_string()));
    }

    self.run_order.push(run_id.clone());
    self.runs.insert(run_id, run);
    Ok(())
  }

  pub fn run(&self, run_id: &str) -> Option<&WorkflowRun> {
    self.runs.get(run_id)
  }

  /// Active run ids, in registration order.
  pub fn list_workflow_runs(&self) -> Vec<String> {
    self.run_order.clone()
  }

  pub fn check_workflow_run(&self, run_id: &str) -> bool {
    self.runs.contains_key(run_id)
  }

  /// Drop a run from the active set and mark it finished. Attached sessions
  /// stay connected.
  pub fn remove_workflow_run(&mut self, run_id: &str) -> Result<WorkflowRun, RouterError> {
    let mut run = self
      .runs
      .remove(run_id)
      .ok_or_else(|| RouterError::RunNotFound(run_id.to_string()))?;
    self.run_order.retain(|id| id != run_id);
    run.set_finished();

    info!(
      workflow_id = %run.workflow_id(),
      workflow_run_id = %run_id,
      queued = run.queue_len(),
      "workflow_run_removed"
    );
    Ok(run)
  }

  /// A fresh run id for `workflow_id` that no active run uses.
  fn next_run_id(&self, workflow_id: &str) -> String {
    let base = generate_run_id(workflow_id, Utc::now());
    let mut run_id = base.clone();
    let mut suffix = 1;
    while self.runs.contains_key(&run_id) {
      run_id = format!("{base}_{suffix}");
      suffix += 1;
    }
    run_id
  }

  fn run_mut(&mut self, run_id: &str) -> Result<&mut WorkflowRun, RouterError> {
    self
      .runs
      .get_mut(run_id)
      .ok_or_else(|| RouterError::RunNotFound(run_id.to_string()))
  }

  pub fn set_kickstarted(&mut self, run_id: &str) -> Result<(), RouterError> {
    self.run_mut(run_id)?.set_kickstarted();
    info!(workflow_run_id = %run_id, "workflow_run_kickstarted");
    Ok(())
  }

  /// Apply a status reported by a manager. Terminal statuses (`success`,
  /// `failed`, `end`) remove the run; others are accepted and ignored.
  pub fn set_run_status(&mut self, run_id: &str, status: &str) -> Result<(), RouterError> {
    if !self.runs.contains_key(run_id) {
      warn!(workflow_run_id = %run_id, status = %status, "status_for_unknown_run");
      return Err(RouterError::RunNotFound(run_id.to_string()));
    }

    let status = RunStatus::parse(status);
    if status.is_terminal() {
      self.remove_workflow_run(run_id)?;
    } else {
      debug!(workflow_run_id = %run_id, status = ?status, "non_terminal_run_status");
    }
    Ok(())
  }

  pub fn report_run_status_bulk(
    &mut self,
    reports: &[RunStatusReport],
  ) -> Vec<Result<(), RouterError>> {
    reports
      .iter()
      .map(|report| self.set_run_status(&report.workflow_run_id, &report.status))
      .collect()
  }

  pub fn update_task_status(
    &mut self,
    run_id: &str,
    task_id: &str,
    status: TaskStatus,
  ) -> Result<(), RouterError> {
    let run = self.run_mut(run_id)?;
    let workflow_id = run.workflow_id().to_string();
    run
      .set_task_status(task_id, status)
      .map_err(|e| match e {
        RunError::TaskNotFound { task_id, .. } => RouterError::TaskNotFound {
          workflow_id,
          task_id,
        },
      })?;

    debug!(
      workflow_run_id = %run_id,
      task_id = %task_id,
      status = %status,
      "task_status_updated"
    );
    Ok(())
  }

  // Events

  /// Route an event into every run that accepts it, kickstarting new runs
  /// for workflows that matched nothing.
  #[instrument(name = "router_route_event", skip_all, fields(topic = %topic))]
  pub fn route_event(&mut self, topic: &str, message: Value) -> RouteOutcome {
    let mut outcome = RouteOutcome::default();
    let mut matched_workflows: HashSet<String> = HashSet::new();

    for run_id in &self.run_order {
      let Some(run) = self.runs.get_mut(run_id) else {
        continue;
      };
      let Some(workflow) = self.workflows.get(run.workflow_id()) else {
        continue;
      };
      if run.is_finished() || !run.is_event_acceptable(workflow, topic, &message) {
        continue;
      }

      run.enqueue(topic, message.clone());
      run.bind_from_message(topic, &message);
      matched_workflows.insert(run.workflow_id().to_string());
      outcome.routed.push(run_id.clone());
      debug!(workflow_run_id = %run_id, queued = run.queue_len(), "event_routed");
    }

    let to_kickstart: Vec<String> = self
      .workflow_order
      .iter()
      .filter(|id| !matched_workflows.contains(*id))
      .filter(|id| {
        self
          .workflows
          .get(*id)
          .is_some_and(|workflow| workflow.is_kickstart_topic(topic))
      })
      .cloned()
      .collect();

    for workflow_id in to_kickstart {
      if let Some(run_id) = self.kickstart_new_run(&workflow_id, topic, &message) {
        outcome.kickstarted.push(run_id);
      }
    }

    for run_id in &outcome.routed {
      self.notify_run_executors(run_id, topic);
    }

    if outcome.is_dropped() {
      debug!("event_dropped_no_interested_run");
    }
    outcome
  }

  fn kickstart_new_run(
    &mut self,
    workflow_id: &str,
    topic: &str,
    message: &Value,
  ) -> Option<String> {
    let run_id = self.next_run_id(workflow_id);
    let workflow = self.workflows.get(workflow_id)?;

    let mut run = WorkflowRun::with_id(run_id.clone(), workflow, self.config.limits);
    run.bind_from_message(topic, message);
    run.enqueue(topic, message.clone());

    if let Err(e) = self.register_run(run) {
      warn!(workflow_id = %workflow_id, error = %e, "kickstart_run_registration_failed");
      return None;
    }

    let delivered = self.sessions.broadcast(
      SessionRole::Manager,
      &ServerMessage::Kickstart(RunRef::new(workflow_id, run_id.clone())),
    );
    if delivered == 0 {
      warn!(workflow_id = %workflow_id, workflow_run_id = %run_id, "kickstart_without_manager");
    }
    info!(
      workflow_id = %workflow_id,
      workflow_run_id = %run_id,
      managers = delivered,
      "workflow_run_created"
    );
    Some(run_id)
  }

  fn notify_run_executors(&self, run_id: &str, topic: &str) {
    let Some(run) = self.runs.get(run_id) else {
      return;
    };
    for session_id in run.attached_clients() {
      if let Some(session) = self.sessions.get(session_id) {
        session.send(ServerMessage::NotifyEvent {
          topic: topic.to_string(),
        });
      }
    }
  }

  /// Dequeue the next event for a task of a run. `Ok(None)` means nothing is
  /// queued.
  #[instrument(
    name = "router_fetch_event",
    skip_all,
    fields(workflow_run_id = %run_id, task_id = %task_id, topic = %topic)
  )]
  pub fn fetch_event(
    &mut self,
    run_id: &str,
    task_id: &str,
    topic: &str,
  ) -> Result<Option<QueuedEvent>, RouterError> {
    let fetch_mode = self.config.fetch_mode;
    let run = self
      .runs
      .get_mut(run_id)
      .ok_or_else(|| RouterError::RunNotFound(run_id.to_string()))?;
    let workflow = self
      .workflows
      .get(run.workflow_id())
      .ok_or_else(|| RouterError::WorkflowNotFound(run.workflow_id().to_string()))?;
    if workflow.task(task_id).is_none() {
      return Err(RouterError::TaskNotFound {
        workflow_id: workflow.id().to_string(),
        task_id: task_id.to_string(),
      });
    }

    let event = match fetch_mode {
      FetchMode::Head => run.dequeue_head(),
      FetchMode::ByTopic => run.dequeue_by_topic(topic),
    };
    debug!(found = event.is_some(), remaining = run.queue_len(), "event_fetched");
    Ok(event)
  }

  pub fn count_queued(&self, run_id: &str) -> Result<usize, RouterError> {
    self
      .runs
      .get(run_id)
      .map(WorkflowRun::queue_len)
      .ok_or_else(|| RouterError::RunNotFound(run_id.to_string()))
  }

  /// Ask every manager for the status of every active run.
  ///
  /// Nothing is sent when there are no active runs.
  pub fn check_status_bulk(&self) -> Vec<RunRef> {
    let requests: Vec<RunRef> = self
      .run_order
      .iter()
      .filter_map(|id| self.runs.get(id))
      .filter(|run| !run.is_finished())
      .map(|run| RunRef::new(run.workflow_id(), run.id()))
      .collect();

    if !requests.is_empty() {
      let delivered = self.sessions.broadcast(
        SessionRole::Manager,
        &ServerMessage::CheckStatusBulk(requests.clone()),
      );
      debug!(runs = requests.len(), managers = delivered, "check_status_bulk_sent");
    }
    requests
  }

  // Sessions

  pub fn sessions(&self) -> &SessionRegistry {
    &self.sessions
  }

  /// Admit a session.
  ///
  /// A run executor must reference an existing workflow and one of its
  /// active runs; it is attached to that run.
  #[instrument(
    name = "router_add_session",
    skip_all,
    fields(session_id = %session.id(), role = %session.role())
  )]
  pub fn add_session(&mut self, session: Session) -> Result<(), RouterError> {
    session.validate()?;

    if self.sessions.contains(session.id()) {
      warn!("session_already_registered");
      return Err(RouterError::DuplicateSession(session.id().to_string()));
    }

    let attach_to = match (session.role(), session.workflow_id(), session.workflow_run_id()) {
      (SessionRole::RunExecutor, Some(workflow_id), Some(run_id)) => {
        if !self.workflows.contains_key(workflow_id) {
          return Err(RouterError::WorkflowNotFound(workflow_id.to_string()));
        }
        let run = self
          .runs
          .get(run_id)
          .ok_or_else(|| RouterError::RunNotFound(run_id.to_string()))?;
        if run.workflow_id() != workflow_id {
          return Err(RouterError::Validation(format!(
            "workflow run {run_id} belongs to workflow {}, not {workflow_id}",
            run.workflow_id()
          )));
        }
        Some(run_id.to_string())
      }
      _ => None,
    };

    let session_id = session.id().to_string();
    self.sessions.insert(session)?;
    if let Some(run_id) = attach_to
      && let Some(run) = self.runs.get_mut(&run_id)
    {
      run.attach_client(&session_id);
    }

    info!("session_added");
    Ok(())
  }

  /// Remove a session and detach it from its run, if any.
  pub fn remove_session(&mut self, session_id: &str) -> Option<Session> {
    let session = self.sessions.remove(session_id)?;
    if let Some(run_id) = session.workflow_run_id()
      && let Some(run) = self.runs.get_mut(run_id)
    {
      run.detach_client(session.id());
    }
    info!(session_id = %session.id(), role = %session.role(), "session_removed");
    Some(session)
  }

  /// Close every session and clear all state.
  pub fn destroy_all(&mut self) {
    let sessions = self.sessions.drain();
    for session in &sessions {
      session.close();
    }
    for run in self.runs.values_mut() {
      run.set_finished();
    }
    info!(
      sessions = sessions.len(),
      runs = self.runs.len(),
      workflows = self.workflows.len(),
      "router_destroyed"
    );
    self.runs.clear();
    self.run_order.clear();
    self.workflows.clear();
    self.workflow_order.clear();
  }
}
