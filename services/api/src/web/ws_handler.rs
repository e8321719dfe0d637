//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket search session.
//! Each connection owns one search pipeline and mirrors its state to the client.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{stream::{SplitSink, StreamExt}, SinkExt};
use lookup_core::{PipelineState, SearchPipeline, SubmitError};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Serializes and sends one message. Returns false once the client is gone.
async fn send_message(ws_sender: &WsSender, msg: &ServerMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return false;
        }
    };
    ws_sender.lock().await.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!("New WebSocket connection {} established.", connection_id);

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Session Gate ---
    // The lookup screen is only reachable once logged in with a platform picked.
    let snapshot = match app_state.preferences.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Failed to read session preferences: {}", e);
            let msg = ServerMessage::Error { message: "Failed to load session data.".to_string() };
            send_message(&ws_sender, &msg).await;
            return;
        }
    };
    if !snapshot.is_logged_in {
        let msg = ServerMessage::Error { message: "Not logged in.".to_string() };
        send_message(&ws_sender, &msg).await;
        return;
    }
    let Some(platform) = snapshot.selected_platform else {
        let msg = ServerMessage::Error { message: "No platform selected.".to_string() };
        send_message(&ws_sender, &msg).await;
        return;
    };

    let pipeline = app_state.new_pipeline(platform);
    let ready = ServerMessage::SessionReady { platform, mode: app_state.config.lookup_mode };
    if !send_message(&ws_sender, &ready).await {
        error!("Failed to send session ready message.");
        return;
    }

    // --- 2. State Forwarding ---
    let forward_task = tokio::spawn(forward_states(pipeline.subscribe(), ws_sender.clone()));

    // --- 3. Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => handle_text_message(text.as_str(), &pipeline, &ws_sender).await,
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- 4. Cleanup ---
    // Abandon any in-flight search so its timers go inert.
    pipeline.reset();
    forward_task.abort();
    info!("WebSocket connection {} closed.", connection_id);
}

/// Pushes every pipeline state change to the client until either side goes away.
async fn forward_states(mut states: watch::Receiver<PipelineState>, ws_sender: WsSender) {
    while states.changed().await.is_ok() {
        let msg = ServerMessage::from_state(&states.borrow_and_update());
        if !send_message(&ws_sender, &msg).await {
            warn!("Client went away while receiving search progress.");
            break;
        }
    }
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(text: &str, pipeline: &Arc<SearchPipeline>, ws_sender: &WsSender) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Submit { username }) => match pipeline.submit(&username) {
            Ok(_) => info!("Search submitted for '{}' on {}.", username, pipeline.platform()),
            Err(SubmitError::Invalid(e)) => {
                let msg = ServerMessage::ValidationFailed { message: e.to_string() };
                send_message(ws_sender, &msg).await;
            }
            Err(SubmitError::Busy) => {
                send_message(ws_sender, &ServerMessage::Busy).await;
            }
        },
        Ok(ClientMessage::Reset) => {
            info!("Reset message received.");
            pipeline.reset();
        }
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
        }
    }
}
