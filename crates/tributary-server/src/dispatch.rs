//! Per-role request handling for websocket frames.

use serde_json::{Value, json};
use tracing::warn;
use tributary_protocol::{
  Frame, ManagerRequest, ProbeRequest, ProtocolError, Response, RunRequest, ServerMessage, req_id,
  topics,
};
use tributary_router::{Router, RouterError};
use tributary_run::TaskStatus;
use tributary_session::SessionRole;
use tributary_workflow::Workflow;

#[derive(Debug, thiserror::Error)]
enum DispatchError {
  #[error(transparent)]
  Protocol(#[from] ProtocolError),

  #[error(transparent)]
  Router(#[from] RouterError),

  #[error("session role {0} cannot send requests")]
  Role(SessionRole),
}

/// Decode a frame for the session's role, apply it to the router and build
/// the response sent back on the frame's topic.
pub fn handle_frame(router: &mut Router, role: SessionRole, frame: &Frame) -> ServerMessage {
  let req_id = req_id(&frame.message);
  let response = match dispatch(router, role, frame) {
    Ok(result) => Response::ok(req_id, result),
    Err(e) => {
      warn!(topic = %frame.topic, role = %role, error = %e, "request_failed");
      Response::err(req_id, e.to_string())
    }
  };
  ServerMessage::Response {
    topic: frame.topic.clone(),
    response,
  }
}

fn dispatch(router: &mut Router, role: SessionRole, frame: &Frame) -> Result<Value, DispatchError> {
  let topic = frame.topic.as_str();
  match role {
    SessionRole::Probe => probe(router, ProbeRequest::decode(topic, &frame.message)?),
    SessionRole::Manager => manager(router, ManagerRequest::decode(topic, &frame.message)?),
    SessionRole::RunExecutor => run_executor(router, RunRequest::decode(topic, &frame.message)?),
    SessionRole::Unknown => Err(DispatchError::Role(role)),
  }
}

fn probe(router: &mut Router, request: ProbeRequest) -> Result<Value, DispatchError> {
  match request {
    ProbeRequest::Emit { topic, message } => {
      router.route_event(&topic, message);
      Ok(json!(true))
    }
  }
}

fn manager(router: &mut Router, request: ManagerRequest) -> Result<Value, DispatchError> {
  match request {
    ManagerRequest::Register { workflow } => {
      let workflow = Workflow::from_value(&workflow).map_err(RouterError::from)?;
      router.register_workflow(workflow)?;
      Ok(json!(true))
    }
    ManagerRequest::RegisterEssence { essence } => {
      let failures: Vec<String> = router
        .register_workflows_from_essence(&essence)
        .into_iter()
        .filter_map(|(key, result)| result.err().map(|e| format!("{key}: {e}")))
        .collect();
      if failures.is_empty() {
        Ok(json!(true))
      } else {
        Err(DispatchError::Router(RouterError::Validation(format!(
          "failed to register workflows: {}",
          failures.join("; ")
        ))))
      }
    }
    ManagerRequest::List => Ok(json!(router.list_workflows())),
    ManagerRequest::ListRuns => Ok(json!(router.list_workflow_runs())),
    ManagerRequest::Check { workflow_id } => Ok(json!(router.check_workflow(&workflow_id))),
    ManagerRequest::Remove { workflow_id } => {
      router.remove_workflow(&workflow_id)?;
      Ok(json!(true))
    }
    ManagerRequest::RemoveRun(run) => {
      router.remove_workflow_run(&run.workflow_run_id)?;
      Ok(json!(true))
    }
    ManagerRequest::ReportNewRun(run) => {
      router.set_kickstarted(&run.workflow_run_id)?;
      Ok(json!(true))
    }
    ManagerRequest::ReportRunStatus(report) => {
      router.set_run_status(&report.workflow_run_id, &report.status)?;
      Ok(json!(true))
    }
    ManagerRequest::ReportRunStatusBulk(reports) => {
      let results: Vec<bool> = router
        .report_run_status_bulk(&reports)
        .iter()
        .map(Result::is_ok)
        .collect();
      Ok(json!(results))
    }
  }
}

fn run_executor(router: &mut Router, request: RunRequest) -> Result<Value, DispatchError> {
  match request {
    RunRequest::Count(run) => Ok(json!(router.count_queued(&run.workflow_run_id)?)),
    RunRequest::Fetch { run, task_id, topic } => {
      let event = router.fetch_event(&run.workflow_run_id, &task_id, &topic)?;
      Ok(event.map_or_else(|| json!({}), |event| json!(event)))
    }
    RunRequest::ReportTaskStatus {
      run,
      task_id,
      status,
    } => {
      let status = TaskStatus::parse_reported(&status).ok_or_else(|| {
        ProtocolError::InvalidField {
          topic: topics::WORKFLOW_RUN_REPORT_TASK_STATUS.to_string(),
          field: "status".to_string(),
          expected: "begin or end",
        }
      })?;
      router.update_task_status(&run.workflow_run_id, &task_id, status)?;
      Ok(json!(true))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame(topic: &str, message: Value) -> Frame {
    Frame::new(topic, message)
  }

  fn response(message: ServerMessage) -> Response {
    match message {
      ServerMessage::Response { response, .. } => response,
      other => panic!("expected response, got {other:?}"),
    }
  }

  fn essence() -> Value {
    json!({
      "dag": { "dag_id": "wf" },
      "tasks": { "t1": { "topic": "onu.events", "key_field": "serialNumber" } }
    })
  }

  #[test]
  fn test_manager_register_and_list() {
    let mut router = Router::default();

    let reply = handle_frame(
      &mut router,
      SessionRole::Manager,
      &frame(topics::WORKFLOW_REGISTER, json!({ "req_id": 5, "workflow": essence() })),
    );
    let reply = response(reply);
    assert!(!reply.error);
    assert_eq!(reply.req_id, json!(5));

    let reply = response(handle_frame(
      &mut router,
      SessionRole::Manager,
      &frame(topics::WORKFLOW_LIST, Value::Null),
    ));
    assert_eq!(reply.result, json!(["wf"]));
    assert_eq!(reply.req_id, json!(101010));
  }

  #[test]
  fn test_register_essence_reports_failures() {
    let mut router = Router::default();

    let reply = response(handle_frame(
      &mut router,
      SessionRole::Manager,
      &frame(
        topics::WORKFLOW_REGISTER_ESSENCE,
        json!({ "essence": { "wf": essence(), "broken": { "tasks": {} } } }),
      ),
    ));

    assert!(reply.error);
    assert!(reply.message.unwrap().contains("broken"));
    assert!(router.check_workflow("wf"));
  }

  #[test]
  fn test_role_operation_sets_are_disjoint() {
    let mut router = Router::default();

    let reply = response(handle_frame(
      &mut router,
      SessionRole::Probe,
      &frame(topics::WORKFLOW_LIST, json!({})),
    ));
    assert!(reply.error);

    let reply = response(handle_frame(
      &mut router,
      SessionRole::Manager,
      &frame(topics::EVENT_EMIT, json!({ "topic": "t", "message": {} })),
    ));
    assert!(reply.error);
  }

  #[test]
  fn test_probe_emit_then_executor_fetch() {
    let mut router = Router::default();
    router
      .register_workflow(Workflow::from_value(&essence()).unwrap())
      .unwrap();

    let reply = response(handle_frame(
      &mut router,
      SessionRole::Probe,
      &frame(
        topics::EVENT_EMIT,
        json!({ "topic": "onu.events", "message": { "serialNumber": "X" } }),
      ),
    ));
    assert_eq!(reply.result, json!(true));
    let run_id = router.list_workflow_runs()[0].clone();

    let run = json!({ "workflow_id": "wf", "workflow_run_id": run_id });
    let reply = response(handle_frame(
      &mut router,
      SessionRole::RunExecutor,
      &frame(topics::WORKFLOW_RUN_COUNT_EVENTS, run.clone()),
    ));
    assert_eq!(reply.result, json!(1));

    let mut fetch = run.clone();
    fetch["task_id"] = json!("t1");
    fetch["topic"] = json!("onu.events");
    let reply = response(handle_frame(
      &mut router,
      SessionRole::RunExecutor,
      &frame(topics::WORKFLOW_RUN_FETCH_EVENT, fetch.clone()),
    ));
    assert_eq!(
      reply.result,
      json!({ "topic": "onu.events", "message": { "serialNumber": "X" } })
    );

    let reply = response(handle_frame(
      &mut router,
      SessionRole::RunExecutor,
      &frame(topics::WORKFLOW_RUN_FETCH_EVENT, fetch),
    ));
    assert_eq!(reply.result, json!({}));
  }

  #[test]
  fn test_missing_field_error_names_field() {
    let mut router = Router::default();

    let reply = response(handle_frame(
      &mut router,
      SessionRole::RunExecutor,
      &frame(topics::WORKFLOW_RUN_COUNT_EVENTS, json!({ "workflow_id": "wf" })),
    ));

    assert!(reply.error);
    assert_eq!(reply.result, json!(false));
    assert!(reply.message.unwrap().contains("workflow_run_id"));
  }

  #[test]
  fn test_bulk_status_results() {
    let mut router = Router::default();
    router
      .register_workflow(Workflow::from_value(&essence()).unwrap())
      .unwrap();
    let run_id = router
      .route_event("onu.events", json!({ "serialNumber": "X" }))
      .kickstarted[0]
      .clone();

    let reply = response(handle_frame(
      &mut router,
      SessionRole::Manager,
      &frame(
        topics::WORKFLOW_REPORT_RUN_STATUS_BULK,
        json!({ "data": [
          { "workflow_id": "wf", "workflow_run_id": run_id, "status": "end" },
          { "workflow_id": "wf", "workflow_run_id": "ghost", "status": "end" }
        ]}),
      ),
    ));

    assert_eq!(reply.result, json!([true, false]));
    assert!(router.list_workflow_runs().is_empty());
  }

  #[test]
  fn test_unrecognized_task_status_is_rejected() {
    let mut router = Router::default();
    router
      .register_workflow(Workflow::from_value(&essence()).unwrap())
      .unwrap();
    let run_id = router
      .route_event("onu.events", json!({ "serialNumber": "X" }))
      .kickstarted[0]
      .clone();
    let report = |status: &str| {
      json!({
        "workflow_id": "wf",
        "workflow_run_id": run_id,
        "task_id": "t1",
        "status": status
      })
    };

    let reply = response(handle_frame(
      &mut router,
      SessionRole::RunExecutor,
      &frame(topics::WORKFLOW_RUN_REPORT_TASK_STATUS, report("end")),
    ));
    assert!(!reply.error);

    let reply = response(handle_frame(
      &mut router,
      SessionRole::RunExecutor,
      &frame(topics::WORKFLOW_RUN_REPORT_TASK_STATUS, report("done")),
    ));
    assert!(reply.error);
    assert!(reply.message.unwrap().contains("status"));
    assert_eq!(
      router.run(&run_id).unwrap().task_status("t1"),
      Some(TaskStatus::End)
    );

    // the ended topic stays closed for the run
    let outcome = router.route_event("onu.events", json!({ "serialNumber": "X" }));
    assert!(outcome.routed.is_empty());
  }
}
