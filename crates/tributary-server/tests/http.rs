use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tributary_router::{Router, RouterConfig};
use tributary_server::{AppState, build_router};
use tributary_workflow::Workflow;

fn state() -> AppState {
  let mut router = Router::new(RouterConfig::default());
  router
    .register_workflow(
      Workflow::from_value(&json!({
        "dag": { "dag_id": "att_workflow" },
        "tasks": {
          "onu_event_handler": { "topic": "onu.events", "key_field": "serialNumber" }
        }
      }))
      .unwrap(),
    )
    .unwrap();
  AppState::new(router)
}

async fn body_json(response: axum::response::Response) -> Value {
  let bytes = response.into_body().collect().await.unwrap().to_bytes();
  serde_json::from_slice(&bytes).unwrap()
}

fn post_intake(body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri("/intake")
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

#[tokio::test]
async fn test_health() {
  let app = build_router(state());

  let response = app
    .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::OK);
  let body = body_json(response).await;
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["workflows"], 1);
}

#[tokio::test]
async fn test_intake_routes_event() {
  let state = state();
  let app = build_router(state.clone());

  let response = app
    .oneshot(post_intake(json!({
      "topic": "onu.events",
      "message": { "serialNumber": "X" }
    })))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(body_json(response).await, json!({ "result": true }));
  let router = state.router.lock().await;
  let runs = router.list_workflow_runs();
  assert_eq!(runs.len(), 1);
  assert_eq!(router.count_queued(&runs[0]).unwrap(), 1);
}

#[tokio::test]
async fn test_intake_missing_fields() {
  let app = build_router(state());

  let response = app
    .oneshot(post_intake(json!({ "topic": "onu.events" })))
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  let body = body_json(response).await;
  let errors = body["errors"].as_array().unwrap();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0]["param"], "message");
}

#[tokio::test]
async fn test_intake_empty_body_lists_both_fields() {
  let app = build_router(state());

  let response = app.oneshot(post_intake(json!({}))).await.unwrap();

  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  let body = body_json(response).await;
  assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_intake_invalid_json_uses_error_shape() {
  let app = build_router(state());

  let response = app
    .oneshot(
      Request::builder()
        .method("POST")
        .uri("/intake")
        .header("content-type", "application/json")
        .body(Body::from("{\"topic\": "))
        .unwrap(),
    )
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  let body = body_json(response).await;
  let errors = body["errors"].as_array().unwrap();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0]["param"], "body");
}

#[tokio::test]
async fn test_intake_without_content_type_uses_error_shape() {
  let app = build_router(state());

  let response = app
    .oneshot(
      Request::builder()
        .method("POST")
        .uri("/intake")
        .body(Body::from(json!({ "topic": "t", "message": {} }).to_string()))
        .unwrap(),
    )
    .await
    .unwrap();

  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(body_json(response).await["errors"][0]["param"], "body");
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
  let app = build_router(state());

  let response = app
    .oneshot(
      Request::builder()
        .uri("/ws?id=probe-1&type=probe")
        .body(Body::empty())
        .unwrap(),
    )
    .await
    .unwrap();

  assert!(response.status().is_client_error());
}
