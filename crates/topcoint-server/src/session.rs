//! Per-connection WebSocket sessions.
//!
//! Each live connection runs its own read loop; outbound frames go through
//! a dedicated writer task so a slow socket never blocks message handling.
//! Lookups are submitted to the shared [`RequestBroker`] and the session
//! suspends until its reply arrives.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

use topcoint_core::{ClientMessage, RequestBroker, Response};

/// Shared application state.
pub struct AppState {
    pub broker: RequestBroker,
}

/// Router: the WebSocket endpoint plus the static home page.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/coindesk", get(ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new("public"))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if ws_tx.send(frame).await.is_err() {
                break;
            }
        }
    });

    info!(%session_id, "client connected");

    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(error) => {
                warn!(%session_id, %error, "websocket read failed");
                break;
            }
        };

        let raw = match frame {
            Message::Text(text) => text.to_string(),
            Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    let _ = send_json(&out_tx, &Response::error("binary frames must be UTF-8 JSON"));
                    continue;
                }
            },
            Message::Ping(data) => {
                let _ = out_tx.send(Message::Pong(data));
                continue;
            }
            Message::Pong(_) => continue,
            Message::Close(_) => break,
        };

        debug!(%session_id, message = %raw, "lookup received");
        let response = handle_lookup(&state, &raw).await;
        if send_json(&out_tx, &response).is_err() {
            break;
        }
    }

    // Teardown releases any reply still in flight; the broker's delivery
    // to the dropped channel is a no-op.
    writer.abort();
    info!(%session_id, "client disconnected");
}

/// Decode one inbound message, run it through the broker, and produce the
/// response to write back. Every failure maps to an error envelope on this
/// connection only.
async fn handle_lookup(state: &AppState, raw: &str) -> Response {
    let message: ClientMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(error) => return Response::error(format!("invalid message: {error}")),
    };

    let receiver = match state.broker.submit(message.into_query()).await {
        Ok(receiver) => receiver,
        Err(error) => return Response::error(error.to_string()),
    };

    match receiver.await {
        Ok(response) => response,
        Err(_) => Response::error("request was dropped before completion"),
    }
}

fn send_json(
    out_tx: &mpsc::UnboundedSender<Message>,
    response: &Response,
) -> Result<(), mpsc::error::SendError<Message>> {
    match serde_json::to_string(response) {
        Ok(json) => out_tx.send(Message::Text(json.into())),
        Err(error) => {
            warn!(%error, "failed to encode response");
            out_tx.send(Message::Text(
                String::from(r#"{"error":"internal encoding failure"}"#).into(),
            ))
        }
    }
}
