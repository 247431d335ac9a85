//! Streaming surface: `/listen/ws`, one bidirectional connection per
//! client, plus the background bridge forwarding the listener's blocking
//! event stream onto a tokio broadcast channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info};

use auris_core::{ListenerEvent, ListenerService, ListenerState};

use crate::http::AppState;

const EVENT_READ_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WireListenerState {
    Idle,
    Armed,
    Listening,
    Stopped,
}

impl From<ListenerState> for WireListenerState {
    fn from(state: ListenerState) -> Self {
        match state {
            ListenerState::Idle => Self::Idle,
            ListenerState::Armed => Self::Armed,
            ListenerState::Listening => Self::Listening,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WireEvent {
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "state_change")]
    StateChange {
        state: WireListenerState,
        timestamp: SystemTime,
    },
    #[serde(rename = "result")]
    Result {
        recording_id: String,
        path: PathBuf,
        text: String,
        captured_at: SystemTime,
        transcribed_at: SystemTime,
    },
    #[serde(rename = "error")]
    Error { message: String, timestamp: SystemTime },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientCommand {
    Start,
    Stop,
}

/// Runs for the life of the process on a dedicated thread: the listener's
/// event stream is a blocking read, so it cannot live on a tokio worker.
pub fn spawn_event_bridge(listener: Arc<ListenerService>, broadcast_tx: broadcast::Sender<WireEvent>) {
    std::thread::spawn(move || {
        let reader = listener.events();
        loop {
            let Some(event) = reader.read(EVENT_READ_TIMEOUT) else {
                continue;
            };
            let wire = match event {
                ListenerEvent::StateChange(state) => WireEvent::StateChange {
                    state: state.into(),
                    timestamp: SystemTime::now(),
                },
                ListenerEvent::Result { recording, transcript } => WireEvent::Result {
                    recording_id: recording.id().unwrap_or_default(),
                    path: recording.path.clone().unwrap_or_default(),
                    text: transcript.text,
                    captured_at: recording.captured_at,
                    transcribed_at: transcript.generated_at,
                },
                ListenerEvent::Error(message) => WireEvent::Error {
                    message,
                    timestamp: SystemTime::now(),
                },
            };
            // No subscribers is fine; ignore the send error.
            let _ = broadcast_tx.send(wire);
        }
    });
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    use futures_util::{SinkExt, StreamExt};

    let mut broadcast_rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    if let Ok(json) = serde_json::to_string(&WireEvent::Connected) {
        if sender.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = broadcast_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(err) => {
                    error!(error = %err, "failed to serialize listener event");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let listener = state.listener.clone();
    let broadcast_tx = state.broadcast_tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let Message::Text(text) = msg else { continue };
            match serde_json::from_str::<ClientCommand>(&text) {
                Ok(ClientCommand::Start) => {
                    if let Err(err) = listener.start() {
                        error!(error = %err, "listen/ws start failed");
                    }
                }
                Ok(ClientCommand::Stop) => match listener.stop() {
                    Ok(()) => {
                        let _ = broadcast_tx.send(WireEvent::StateChange {
                            state: WireListenerState::Stopped,
                            timestamp: SystemTime::now(),
                        });
                    }
                    Err(err) => error!(error = %err, "listen/ws stop failed"),
                },
                Err(err) => error!(error = %err, "failed to parse client command"),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("listen/ws connection closed");
}
