//! WebSocket execute channel
//!
//! A client may keep one socket open and send any number of `execute_ssh`
//! messages. Each one is answered with `status`, then `output` or `error`,
//! then `complete`. Output is sent whole once the command has finished.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tapssh_api::{ExecuteRequest, WsEvent, WsRequest};
use tracing::{debug, info, warn};

use crate::api::ssh::run_and_record;
use crate::state::AppState;

/// `GET /api/ws/{client_id}`
pub async fn connect(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| serve(socket, state, client_id))
}

async fn serve(mut socket: WebSocket, state: Arc<AppState>, client_id: String) {
    info!(%client_id, "websocket client connected");

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(%client_id, error = %e, "websocket receive failed");
                break;
            }
        };

        let request = match serde_json::from_str::<WsRequest>(text.as_str()) {
            Ok(request) => request,
            Err(e) => {
                warn!(%client_id, error = %e, "ignoring malformed message");
                continue;
            }
        };

        if let Err(e) = handle(&mut socket, &state, request).await {
            warn!(%client_id, error = %e, "websocket send failed");
            break;
        }
    }

    info!(%client_id, "websocket client disconnected");
}

async fn handle(
    socket: &mut WebSocket,
    state: &AppState,
    request: WsRequest,
) -> Result<(), axum::Error> {
    match request {
        WsRequest::ExecuteSsh { ssh, button_id } => {
            debug!(%button_id, host = %ssh.host, "execute over websocket");
            send(
                socket,
                &WsEvent::Status {
                    status: "connecting".to_string(),
                    message: format!("Connecting to {}...", ssh.host),
                },
            )
            .await?;

            let response = run_and_record(state, ExecuteRequest { ssh, button_id }).await;
            let success = response.success;
            let event = if success {
                WsEvent::Output {
                    data: response.output,
                    success,
                }
            } else {
                WsEvent::Error {
                    data: response.error.unwrap_or(response.output),
                    success,
                    error_category: response.error_category,
                }
            };

            send(socket, &event).await?;
            send(socket, &WsEvent::Complete { success }).await
        }
    }
}

async fn send(socket: &mut WebSocket, event: &WsEvent) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}
