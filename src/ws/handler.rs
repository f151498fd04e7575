//! WebSocket session gateway

use std::fmt::Display;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{EngineCommand, EngineHandle};
use crate::ws::protocol::{ClientMsg, Outbound, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.engine))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, engine: EngineHandle) {
    // Opaque to the simulation, unique per connection
    let session_id = Uuid::new_v4();
    let (ws_sink, ws_stream) = socket.split();

    serve_session(session_id, ws_sink, ws_stream, &engine).await;
}

/// Drive one session over any message sink/stream pair until it closes
async fn serve_session<S, R, E>(session_id: Uuid, ws_sink: S, ws_stream: R, engine: &EngineHandle)
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    info!(session_id = %session_id, "New WebSocket connection");

    // Subscribe before any command so the join snapshot cannot be missed
    let events_rx = engine.subscribe();

    run_session(session_id, ws_sink, ws_stream, engine, events_rx).await;

    // Cleanup on disconnect
    let _ = engine.send(EngineCommand::Disconnect { session_id }).await;

    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session<S, R, E>(
    session_id: Uuid,
    mut ws_sink: S,
    mut ws_stream: R,
    engine: &EngineHandle,
    mut events_rx: broadcast::Receiver<Outbound>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    // Spawn writer task: engine events -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(outbound) => {
                    if !outbound.audience.includes(session_id) {
                        continue;
                    }
                    if let Err(e) = send_msg(&mut ws_sink, &outbound.msg).await {
                        debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        session_id = %session_id,
                        lagged_count = n,
                        "Client lagged, skipping {} events", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(session_id = %session_id, "Event channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> engine
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(client_msg) => {
                    let cmd = EngineCommand::from_client(session_id, client_msg);
                    if engine.send(cmd).await.is_err() {
                        debug!(session_id = %session_id, "Engine command channel closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg<S>(sink: &mut S, msg: &ServerMsg) -> Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
