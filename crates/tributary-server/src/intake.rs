use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct FieldError {
  param: &'static str,
  msg: String,
}

fn bad_request(errors: Vec<FieldError>) -> Response {
  (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

/// Accept an event `{topic, message}` over HTTP and route it.
pub async fn intake(
  State(state): State<AppState>,
  payload: Result<Json<Value>, JsonRejection>,
) -> Response {
  let body = match payload {
    Ok(Json(body)) => body,
    Err(rejection) => {
      debug!(error = %rejection, "intake_body_rejected");
      return bad_request(vec![FieldError {
        param: "body",
        msg: rejection.body_text(),
      }]);
    }
  };

  let topic = body
    .get("topic")
    .and_then(Value::as_str)
    .filter(|topic| !topic.is_empty());
  let message = body.get("message").filter(|message| !message.is_null());

  let mut errors = Vec::new();
  if topic.is_none() {
    errors.push(FieldError {
      param: "topic",
      msg: "Message topic is null or empty".to_string(),
    });
  }
  if message.is_none() {
    errors.push(FieldError {
      param: "message",
      msg: "Message body is null or empty".to_string(),
    });
  }

  let (Some(topic), Some(message)) = (topic, message) else {
    return bad_request(errors);
  };

  debug!(topic = %topic, "intake_event_received");
  let outcome = state
    .router
    .lock()
    .await
    .route_event(topic, message.clone());
  debug!(
    topic = %topic,
    routed = outcome.routed.len(),
    kickstarted = outcome.kickstarted.len(),
    "intake_event_routed"
  );

  Json(json!({ "result": true })).into_response()
}
