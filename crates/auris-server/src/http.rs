//! REST surface: one axum handler per route, each performing the one core
//! call the route names and mapping the result through `ApiError`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use auris_core::{
    EnhancementService, ListenerService, ListenerState, RecorderService, RecordingRegistry,
    TranscriptionService,
};

use crate::error::{ApiError, ApiResult};
use crate::ws::{ws_handler, WireEvent, WireListenerState};

#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<RecorderService>,
    pub listener: Arc<ListenerService>,
    pub registry: Arc<RecordingRegistry>,
    pub transcription: Arc<TranscriptionService>,
    pub enhancement: Arc<EnhancementService>,
    pub broadcast_tx: broadcast::Sender<WireEvent>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/start_recording", post(start_recording))
        .route("/stop_recording", post(stop_recording))
        .route("/transcribe", post(transcribe))
        .route("/enhance", post(enhance))
        .route("/listen/start", post(listen_start))
        .route("/listen/stop", post(listen_stop))
        .route("/listen/status", get(listen_status))
        .route("/listen/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
struct StartRecordingResponse {
    status: &'static str,
    started_at: SystemTime,
    max_duration_seconds: f64,
}

async fn start_recording(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let started = state.recorder.start_recording().map_err(ApiError::from)?;
    Ok(Json(StartRecordingResponse {
        status: "recording",
        started_at: started.started_at,
        max_duration_seconds: started.max_duration_seconds,
    }))
}

#[derive(Serialize)]
struct StopRecordingResponse {
    recording_id: String,
    path: PathBuf,
    captured_at: SystemTime,
}

async fn stop_recording(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let stopped = state.recorder.stop_recording().map_err(ApiError::from)?;
    Ok(Json(StopRecordingResponse {
        recording_id: stopped.recording_id,
        path: stopped.path,
        captured_at: stopped.captured_at,
    }))
}

#[derive(Deserialize)]
struct TranscribeRequest {
    recording_id: String,
}

#[derive(Serialize)]
struct TranscribeResponse {
    recording_id: String,
    text: String,
    generated_at: SystemTime,
}

async fn transcribe(
    State(state): State<AppState>,
    Json(payload): Json<TranscribeRequest>,
) -> ApiResult<impl IntoResponse> {
    let recording = state.registry.get(&payload.recording_id).map_err(ApiError::from)?;
    let transcript = state
        .transcription
        .transcribe(&recording)
        .map_err(ApiError::from)?;
    Ok(Json(TranscribeResponse {
        recording_id: payload.recording_id,
        text: transcript.text,
        generated_at: transcript.generated_at,
    }))
}

#[derive(Deserialize)]
struct EnhanceRequest {
    text: String,
    recording_id: Option<String>,
}

#[derive(Serialize)]
struct EnhanceResponse {
    title: String,
    body: String,
    tags: Vec<String>,
    created_at: SystemTime,
    recording_id: Option<String>,
}

async fn enhance(
    State(state): State<AppState>,
    Json(payload): Json<EnhanceRequest>,
) -> ApiResult<impl IntoResponse> {
    let note = state.enhancement.enhance(&payload.text).map_err(ApiError::from)?;
    Ok(Json(EnhanceResponse {
        title: note.title,
        body: note.body,
        tags: note.tags,
        created_at: note.created_at,
        recording_id: payload.recording_id,
    }))
}

#[derive(Serialize)]
struct ListenStartResponse {
    state: ListenerState,
    started_at: SystemTime,
}

async fn listen_start(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let started = state.listener.start().map_err(ApiError::from)?;
    Ok(Json(ListenStartResponse {
        state: started.state,
        started_at: started.started_at,
    }))
}

async fn listen_stop(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.listener.stop().map_err(ApiError::from)?;
    let _ = state.broadcast_tx.send(WireEvent::StateChange {
        state: WireListenerState::Stopped,
        timestamp: SystemTime::now(),
    });
    // Any utterance in flight is delivered asynchronously as a `result`
    // event over /listen/ws rather than synchronously from this call.
    Ok(Json(Option::<()>::None))
}

#[derive(Serialize)]
struct ListenStatusResponse {
    is_listening: bool,
    state: ListenerState,
}

async fn listen_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ListenStatusResponse {
        is_listening: state.listener.is_listening(),
        state: state.listener.state(),
    })
}
