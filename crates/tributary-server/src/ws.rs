use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{Instrument, debug, info, info_span, warn};
use tributary_protocol::{DEFAULT_REQ_ID, Frame, ServerMessage, topics};
use tributary_session::{ChannelTransport, Session, SessionParams};
use uuid::Uuid;

use crate::dispatch::handle_frame;
use crate::state::AppState;

const GREETING_MESSAGE: &str = "Welcome to Tributary";

/// Upgrade to a websocket session. Connect parameters come from the query
/// string: `id`, `type`, `name`, `workflow_id`, `workflow_run_id`.
pub async fn ws_handler(
  ws: WebSocketUpgrade,
  Query(params): Query<HashMap<String, String>>,
  State(state): State<AppState>,
) -> Response {
  let connection_id = Uuid::new_v4();
  let params: SessionParams = params.into_iter().collect();
  let span = info_span!("ws_session", connection_id = %connection_id);
  ws.on_upgrade(move |socket| handle_socket(socket, params, state).instrument(span))
}

async fn send_frame(
  sink: &mut SplitSink<WebSocket, Message>,
  message: ServerMessage,
) -> Result<(), axum::Error> {
  let frame = message.into_frame();
  let text = serde_json::to_string(&frame).map_err(axum::Error::new)?;
  sink.send(Message::Text(text)).await
}

async fn handle_socket(socket: WebSocket, params: SessionParams, state: AppState) {
  debug!(params = ?params, "ws_connect");
  let (mut sink, mut stream) = socket.split();
  let (transport, mut outbound) = ChannelTransport::pair();
  let cancel = transport.cancellation_token();

  let admitted = match Session::from_params(params, Box::new(transport)) {
    Ok(session) => {
      let session_id = session.id().to_string();
      let role = session.role();
      state
        .router
        .lock()
        .await
        .add_session(session)
        .map(|()| (session_id, role))
        .map_err(|e| e.to_string())
    }
    Err(e) => Err(e.to_string()),
  };

  let (session_id, role) = match admitted {
    Ok(admitted) => admitted,
    Err(reason) => {
      warn!(reason = %reason, "ws_session_rejected");
      let rejection = ServerMessage::Response {
        topic: topics::GREETING.to_string(),
        response: tributary_protocol::Response::err(DEFAULT_REQ_ID.into(), reason),
      };
      let _ = send_frame(&mut sink, rejection).await;
      let _ = sink.close().await;
      return;
    }
  };

  info!(session_id = %session_id, role = %role, "ws_session_admitted");
  let greeting = ServerMessage::Greeting {
    to: session_id.clone(),
    message: GREETING_MESSAGE.to_string(),
  };
  if send_frame(&mut sink, greeting).await.is_err() {
    state.router.lock().await.remove_session(&session_id);
    return;
  }

  loop {
    tokio::select! {
      _ = cancel.cancelled() => {
        debug!(session_id = %session_id, "ws_session_closed_by_broker");
        let _ = sink.close().await;
        break;
      }
      outgoing = outbound.recv() => {
        let Some(message) = outgoing else {
          break;
        };
        if let Err(e) = send_frame(&mut sink, message).await {
          debug!(session_id = %session_id, error = %e, "ws_send_failed");
          break;
        }
      }
      incoming = stream.next() => {
        match incoming {
          Some(Ok(Message::Text(text))) => {
            let frame: Frame = match serde_json::from_str(&text) {
              Ok(frame) => frame,
              Err(e) => {
                warn!(session_id = %session_id, error = %e, "ws_malformed_frame");
                continue;
              }
            };
            let reply = handle_frame(&mut *state.router.lock().await, role, &frame);
            if let Err(e) = send_frame(&mut sink, reply).await {
              debug!(session_id = %session_id, error = %e, "ws_send_failed");
              break;
            }
          }
          Some(Ok(Message::Close(_))) | None => break,
          Some(Ok(_)) => {}
          Some(Err(e)) => {
            debug!(session_id = %session_id, error = %e, "ws_receive_failed");
            break;
          }
        }
      }
    }
  }

  state.router.lock().await.remove_session(&session_id);
  info!(session_id = %session_id, "ws_session_disconnected");
}
