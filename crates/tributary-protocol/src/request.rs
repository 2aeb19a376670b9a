use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::frame::RunRef;
use crate::topics;

/// `req_id` used in responses when the request did not carry one.
pub const DEFAULT_REQ_ID: i64 = 101010;

/// The `req_id` to echo back for a request body.
pub fn req_id(message: &Value) -> Value {
  message
    .get("req_id")
    .cloned()
    .unwrap_or_else(|| Value::from(DEFAULT_REQ_ID))
}

/// Field access over a request body with errors naming the topic and field.
struct Body<'a> {
  topic: &'a str,
  fields: Option<&'a Map<String, Value>>,
}

impl<'a> Body<'a> {
  /// A null body is treated as empty; any other non-object body is rejected.
  fn parse(topic: &'a str, message: &'a Value) -> Result<Self, ProtocolError> {
    match message {
      Value::Null => Ok(Self { topic, fields: None }),
      Value::Object(fields) => Ok(Self {
        topic,
        fields: Some(fields),
      }),
      _ => Err(ProtocolError::EmptyBody(topic.to_string())),
    }
  }

  fn value(&self, field: &str) -> Result<&'a Value, ProtocolError> {
    self
      .fields
      .and_then(|fields| fields.get(field))
      .filter(|value| !value.is_null())
      .ok_or_else(|| ProtocolError::MissingField {
        topic: self.topic.to_string(),
        field: field.to_string(),
      })
  }

  fn invalid(&self, field: &str, expected: &'static str) -> ProtocolError {
    ProtocolError::InvalidField {
      topic: self.topic.to_string(),
      field: field.to_string(),
      expected,
    }
  }

  fn string(&self, field: &str) -> Result<String, ProtocolError> {
    self
      .value(field)?
      .as_str()
      .map(str::to_string)
      .ok_or_else(|| self.invalid(field, "a string"))
  }

  fn object(&self, field: &str) -> Result<&'a Map<String, Value>, ProtocolError> {
    self
      .value(field)?
      .as_object()
      .ok_or_else(|| self.invalid(field, "an object"))
  }

  fn array(&self, field: &str) -> Result<&'a Vec<Value>, ProtocolError> {
    self
      .value(field)?
      .as_array()
      .ok_or_else(|| self.invalid(field, "an array"))
  }

  fn run_ref(&self) -> Result<RunRef, ProtocolError> {
    Ok(RunRef {
      workflow_id: self.string("workflow_id")?,
      workflow_run_id: self.string("workflow_run_id")?,
    })
  }
}

/// Requests a probe may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeRequest {
  Emit { topic: String, message: Value },
}

impl ProbeRequest {
  pub fn decode(topic: &str, message: &Value) -> Result<Self, ProtocolError> {
    match topic {
      topics::EVENT_EMIT => {
        let body = Body::parse(topic, message)?;
        Ok(Self::Emit {
          topic: body.string("topic")?,
          message: body.value("message")?.clone(),
        })
      }
      _ => Err(ProtocolError::UnknownTopic(topic.to_string())),
    }
  }
}

/// One item of a bulk run status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatusReport {
  pub workflow_id: String,
  pub workflow_run_id: String,
  pub status: String,
}

/// Requests a workflow manager may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerRequest {
  Register { workflow: Value },
  RegisterEssence { essence: Map<String, Value> },
  List,
  ListRuns,
  Check { workflow_id: String },
  Remove { workflow_id: String },
  RemoveRun(RunRef),
  ReportNewRun(RunRef),
  ReportRunStatus(RunStatusReport),
  ReportRunStatusBulk(Vec<RunStatusReport>),
}

impl ManagerRequest {
  pub fn decode(topic: &str, message: &Value) -> Result<Self, ProtocolError> {
    let body = Body::parse(topic, message)?;
    match topic {
      topics::WORKFLOW_REGISTER => Ok(Self::Register {
        workflow: Value::Object(body.object("workflow")?.clone()),
      }),
      topics::WORKFLOW_REGISTER_ESSENCE => Ok(Self::RegisterEssence {
        essence: body.object("essence")?.clone(),
      }),
      topics::WORKFLOW_LIST => Ok(Self::List),
      topics::WORKFLOW_LIST_RUN => Ok(Self::ListRuns),
      topics::WORKFLOW_CHECK => Ok(Self::Check {
        workflow_id: body.string("workflow_id")?,
      }),
      topics::WORKFLOW_REMOVE => Ok(Self::Remove {
        workflow_id: body.string("workflow_id")?,
      }),
      topics::WORKFLOW_REMOVE_RUN => Ok(Self::RemoveRun(body.run_ref()?)),
      topics::WORKFLOW_REPORT_NEW_RUN => Ok(Self::ReportNewRun(body.run_ref()?)),
      topics::WORKFLOW_REPORT_RUN_STATUS => Ok(Self::ReportRunStatus(status_report(&body)?)),
      topics::WORKFLOW_REPORT_RUN_STATUS_BULK => {
        let reports = body
          .array("data")?
          .iter()
          .map(|item| status_report(&Body::parse(topic, item)?))
          .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::ReportRunStatusBulk(reports))
      }
      _ => Err(ProtocolError::UnknownTopic(topic.to_string())),
    }
  }
}

fn status_report(body: &Body<'_>) -> Result<RunStatusReport, ProtocolError> {
  let run = body.run_ref()?;
  Ok(RunStatusReport {
    workflow_id: run.workflow_id,
    workflow_run_id: run.workflow_run_id,
    status: body.string("status")?,
  })
}

/// Requests a workflow run executor may send.
#[derive(Debug, Clone, PartialEq)]
pub enum RunRequest {
  Count(RunRef),
  Fetch {
    run: RunRef,
    task_id: String,
    topic: String,
  },
  ReportTaskStatus {
    run: RunRef,
    task_id: String,
    status: String,
  },
}

impl RunRequest {
  pub fn decode(topic: &str, message: &Value) -> Result<Self, ProtocolError> {
    let body = Body::parse(topic, message)?;
    match topic {
      topics::WORKFLOW_RUN_COUNT_EVENTS => Ok(Self::Count(body.run_ref()?)),
      topics::WORKFLOW_RUN_FETCH_EVENT => Ok(Self::Fetch {
        run: body.run_ref()?,
        task_id: body.string("task_id")?,
        topic: body.string("topic")?,
      }),
      topics::WORKFLOW_RUN_REPORT_TASK_STATUS => Ok(Self::ReportTaskStatus {
        run: body.run_ref()?,
        task_id: body.string("task_id")?,
        status: body.string("status")?,
      }),
      _ => Err(ProtocolError::UnknownTopic(topic.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_req_id_defaults() {
    assert_eq!(req_id(&json!({ "req_id": "abc" })), json!("abc"));
    assert_eq!(req_id(&json!({})), json!(101010));
    assert_eq!(req_id(&Value::Null), json!(101010));
  }

  #[test]
  fn test_decode_emit() {
    let request = ProbeRequest::decode(
      topics::EVENT_EMIT,
      &json!({ "req_id": 1, "topic": "onu.events", "message": { "serialNumber": "X" } }),
    )
    .unwrap();

    assert_eq!(
      request,
      ProbeRequest::Emit {
        topic: "onu.events".to_string(),
        message: json!({ "serialNumber": "X" }),
      }
    );
  }

  #[test]
  fn test_emit_missing_message_names_field() {
    let err = ProbeRequest::decode(topics::EVENT_EMIT, &json!({ "topic": "onu.events" })).unwrap_err();

    assert!(matches!(err, ProtocolError::MissingField { ref field, .. } if field == "message"));
    assert!(err.to_string().contains("'message'"));
  }

  #[test]
  fn test_probe_cannot_use_manager_topics() {
    let err = ProbeRequest::decode(topics::WORKFLOW_LIST, &json!({})).unwrap_err();

    assert!(matches!(err, ProtocolError::UnknownTopic(_)));
  }

  #[test]
  fn test_decode_manager_requests() {
    assert_eq!(
      ManagerRequest::decode(topics::WORKFLOW_LIST, &Value::Null).unwrap(),
      ManagerRequest::List
    );
    assert_eq!(
      ManagerRequest::decode(topics::WORKFLOW_CHECK, &json!({ "workflow_id": "wf" })).unwrap(),
      ManagerRequest::Check {
        workflow_id: "wf".to_string()
      }
    );
    assert_eq!(
      ManagerRequest::decode(
        topics::WORKFLOW_REPORT_NEW_RUN,
        &json!({ "workflow_id": "wf", "workflow_run_id": "wf_1" })
      )
      .unwrap(),
      ManagerRequest::ReportNewRun(RunRef::new("wf", "wf_1"))
    );
  }

  #[test]
  fn test_decode_bulk_status() {
    let request = ManagerRequest::decode(
      topics::WORKFLOW_REPORT_RUN_STATUS_BULK,
      &json!({ "data": [
        { "workflow_id": "wf", "workflow_run_id": "wf_1", "status": "success" },
        { "workflow_id": "wf", "workflow_run_id": "wf_2", "status": "running" }
      ]}),
    )
    .unwrap();

    let ManagerRequest::ReportRunStatusBulk(reports) = request else {
      panic!("expected bulk report");
    };
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].status, "running");
  }

  #[test]
  fn test_bulk_item_missing_status_fails_whole_request() {
    let err = ManagerRequest::decode(
      topics::WORKFLOW_REPORT_RUN_STATUS_BULK,
      &json!({ "data": [ { "workflow_id": "wf", "workflow_run_id": "wf_1" } ] }),
    )
    .unwrap_err();

    assert!(matches!(err, ProtocolError::MissingField { ref field, .. } if field == "status"));
  }

  #[test]
  fn test_wrong_field_type() {
    let err = ManagerRequest::decode(topics::WORKFLOW_CHECK, &json!({ "workflow_id": 3 })).unwrap_err();

    assert!(matches!(err, ProtocolError::InvalidField { expected: "a string", .. }));
  }

  #[test]
  fn test_non_object_body() {
    let err = RunRequest::decode(topics::WORKFLOW_RUN_COUNT_EVENTS, &json!("hello")).unwrap_err();

    assert!(matches!(err, ProtocolError::EmptyBody(_)));
  }

  #[test]
  fn test_decode_fetch() {
    let request = RunRequest::decode(
      topics::WORKFLOW_RUN_FETCH_EVENT,
      &json!({
        "workflow_id": "wf",
        "workflow_run_id": "wf_1",
        "task_id": "t1",
        "topic": "onu.events"
      }),
    )
    .unwrap();

    assert_eq!(
      request,
      RunRequest::Fetch {
        run: RunRef::new("wf", "wf_1"),
        task_id: "t1".to_string(),
        topic: "onu.events".to_string(),
      }
    );
  }

  #[test]
  fn test_fetch_requires_task_id() {
    let err = RunRequest::decode(
      topics::WORKFLOW_RUN_FETCH_EVENT,
      &json!({ "workflow_id": "wf", "workflow_run_id": "wf_1", "topic": "onu.events" }),
    )
    .unwrap_err();

    assert!(matches!(err, ProtocolError::MissingField { ref field, .. } if field == "task_id"));
  }
}
