use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::session::{OutboundRoute, SessionController};
use crate::state::AppState;

/// Optimized channel buffer size for audio workloads
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket message size (1 MB); media frames are a few hundred bytes
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Media stream WebSocket handler
///
/// Upgrades the HTTP connection to the Twilio media stream protocol.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    info!(%peer, "Media stream connection upgrade requested");

    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_stream_socket(socket, state, peer))
}

async fn handle_media_stream_socket(socket: WebSocket, app_state: Arc<AppState>, peer: SocketAddr) {
    info!(%peer, "Media stream connection established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<OutboundRoute>(CHANNEL_BUFFER_SIZE);

    // Single writer: every outbound message goes through this task
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                OutboundRoute::Message(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                OutboundRoute::Close => {
                    info!("Closing media stream connection");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let mut controller = SessionController::new(
        app_state.services.clone(),
        app_state.session_settings.clone(),
        message_tx,
    );

    while let Some(msg_result) = receiver.next().await {
        let continue_processing = match msg_result {
            Ok(Message::Text(text)) => controller.handle_text(text.as_str()).await,
            Ok(Message::Binary(data)) => {
                warn!(len = data.len(), "Ignoring binary frame on media stream");
                true
            }
            Ok(Message::Close(_)) => {
                info!(%peer, "Media stream closed by client");
                false
            }
            // Ping/pong are answered by axum
            Ok(_) => true,
            Err(e) => {
                warn!("Media stream WebSocket error: {}", e);
                false
            }
        };

        if !continue_processing {
            break;
        }
    }

    // No-op when a stop event already tore the session down
    controller.shutdown().await;
    drop(controller);

    if let Err(e) = sender_task.await {
        error!("Media stream writer task failed: {}", e);
    }
    info!(%peer, "Media stream connection finished");
}
