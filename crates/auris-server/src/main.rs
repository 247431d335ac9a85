mod error;
mod http;
mod ws;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::{broadcast, Notify};
use tracing_subscriber::EnvFilter;

use auris_core::adapters::{EnergyWakeWord, FfmpegEncoder, SileroVad, StubTranscriber, TemplateEnhancer};
use auris_core::{
    EnhancementService, ListenerConfig, ListenerService, RecorderService, RecordingRegistry,
    ServiceConfig, StreamHub, TranscriptionService,
};

use crate::http::{create_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "auris-server", version, about = "Voice-activated capture and transcription service")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ServiceConfig::load()?;

    // Construction order follows dependency order: format -> hub -> ports
    // -> services -> HTTP listener. Teardown below is the reverse.
    let format = config.audio_format()?;
    let hub = Arc::new(StreamHub::new(format));

    std::fs::create_dir_all(&config.encoder.tmp_dir)?;
    let encoder = Arc::new(FfmpegEncoder::new(
        config.encoder.ffmpeg_bin.clone(),
        config.encoder.output_codec.clone(),
        config.encoder.container_ext.clone(),
        config.encoder.tmp_dir.clone(),
    ));
    let stt = Arc::new(StubTranscriber);
    let enhancer = Arc::new(TemplateEnhancer);

    let registry = Arc::new(RecordingRegistry::new());
    let recorder = Arc::new(RecorderService::new(
        hub.clone(),
        encoder.clone(),
        registry.clone(),
        config.recording.max_duration_seconds,
    ));

    let wake = Box::new(EnergyWakeWord::new(
        config.listener.wake_models.clone(),
        config.listener.wake_threshold,
    ));
    let vad = Box::new(SileroVad::new(config.listener.vad_threshold)?);
    let listener = Arc::new(ListenerService::new(
        hub.clone(),
        wake,
        vad,
        encoder.clone(),
        stt.clone(),
        registry.clone(),
        ListenerConfig {
            armed_timeout_seconds: config.listener.armed_timeout_seconds,
            max_utterance_seconds: config.listener.max_utterance_seconds,
            vad_speech_pad_ms: config.listener.vad_speech_pad_ms,
            end_hangover_ms: config.listener.end_hangover_ms,
        },
    ));

    let transcription = Arc::new(TranscriptionService::new(stt.clone()));
    let enhancement = Arc::new(EnhancementService::new(enhancer.clone()));

    hub.start()?;
    let (broadcast_tx, _rx) = broadcast::channel(64);
    ws::spawn_event_bridge(listener.clone(), broadcast_tx.clone());

    let state = AppState {
        recorder: recorder.clone(),
        listener: listener.clone(),
        registry: registry.clone(),
        transcription,
        enhancement,
        broadcast_tx,
    };
    let app = create_router(state);

    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = shutdown.clone();
    ctrlc::set_handler(move || shutdown_signal.notify_one())?;

    let addr = format!("{}:{}", args.host, args.port);
    let listener_socket = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "auris-server listening");

    axum::serve(listener_socket, app)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await?;

    if listener.is_listening() {
        let _ = listener.stop();
    }
    if recorder.is_recording() {
        let _ = recorder.stop_recording();
    }
    hub.stop();

    Ok(())
}
