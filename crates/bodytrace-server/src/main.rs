//! Bodytrace server binary.
//!
//! Hosts two websocket channels: the frames channel an edge sensor publishes
//! raw heatmap/pose samples to, and the app channel downstream
//! visualizations listen on for processed frames. In replay mode the frames
//! channel is replaced by a driver that plays back recorded messages with
//! their original timing.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use bodytrace_server::{fanout, ingest, replay, sensor::SensorSupervisor, SceneState};

#[derive(Parser, Debug)]
#[command(name = "bodytrace-server", about = "Silhouette tracing and person tracking server")]
struct Args {
    /// WebSocket port the edge sensor publishes raw frames to
    #[arg(long, default_value = "8080")]
    frames_port: u16,

    /// WebSocket port processed frames are fanned out on
    #[arg(long, default_value = "7070")]
    app_port: u16,

    /// Record each raw inbound message into this directory
    #[arg(long, value_name = "DIR")]
    record_dir: Option<PathBuf>,

    /// Replay recorded messages from this directory instead of ingesting
    #[arg(long, value_name = "DIR")]
    replay_dir: Option<PathBuf>,

    /// Start the segmentation sensor on this host over ssh
    #[arg(long, value_name = "HOST")]
    sensor_host: Option<String>,

    /// Command launched on the sensor host
    #[arg(
        long,
        value_name = "CMD",
        default_value = "cd ~/bodytrace-sensor && python3 segment_stream.py --videosrc /dev/video1 --width 1280 --height 720 --mirror"
    )]
    sensor_command: String,

    /// Pattern passed to `pkill -f` on the sensor host at shutdown
    #[arg(long, value_name = "PATTERN", default_value = "segment_stream")]
    sensor_kill_pattern: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    if let Some(dir) = &args.record_dir {
        std::fs::create_dir_all(dir)?;
        info!(dir = %dir.display(), "recording inbound frames");
    }

    let state = SceneState::new(args.record_dir.clone());

    // App channel runs in every mode.
    let app_listener = TcpListener::bind(("0.0.0.0", args.app_port)).await?;
    info!(port = args.app_port, "app channel listening");
    let app_router = fanout::router(state.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(app_listener, app_router).await {
            error!(error = %err, "app channel server failed");
        }
    });

    // Replay mode: recorded frames stand in for the sensor.
    if let Some(dir) = args.replay_dir {
        replay::run(state, dir).await?;
        return Ok(());
    }

    let frames_listener = TcpListener::bind(("0.0.0.0", args.frames_port)).await?;
    info!(port = args.frames_port, "frames channel listening");

    // The sensor is started only once its target channel is up.
    let supervisor = match &args.sensor_host {
        Some(host) => Some(SensorSupervisor::spawn(
            host,
            &args.sensor_command,
            &args.sensor_kill_pattern,
        )?),
        None => None,
    };

    let frames_router = ingest::router(state);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(frames_listener, frames_router).await {
            error!(error = %err, "frames channel server failed");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    if let Some(supervisor) = supervisor {
        supervisor.shutdown().await;
    }

    Ok(())
}
