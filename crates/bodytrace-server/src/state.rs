//! Shared per-process scene state.
//!
//! One process hosts one logical tracked scene: every inbound connection
//! funnels its messages through the same mutex-guarded pipeline, which keeps
//! the strict frame ordering the tracker's history depends on, and every
//! open app listener taps the same broadcast channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use bodytrace_core::{CoreResult, Frame};
use bodytrace_trace::FramePipeline;

/// Broadcast buffer depth; listeners further behind than this drop frames.
const BROADCAST_CAPACITY: usize = 64;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct SceneState {
    inner: Arc<SceneInner>,
}

struct SceneInner {
    /// The single pipeline for this scene; the lock serializes frames.
    pipeline: Mutex<FramePipeline>,
    /// Fan-out channel carrying serialized frame envelopes.
    frames_tx: broadcast::Sender<String>,
    /// Directory for raw message recordings, when enabled.
    record_dir: Option<PathBuf>,
}

impl SceneState {
    /// Creates the scene state with a fresh tracking context.
    #[must_use]
    pub fn new(record_dir: Option<PathBuf>) -> Self {
        let (frames_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(SceneInner {
                pipeline: Mutex::new(FramePipeline::new()),
                frames_tx,
                record_dir,
            }),
        }
    }

    /// Runs one raw message through the pipeline.
    ///
    /// # Errors
    ///
    /// Propagates decode errors; tracking history stays untouched on failure.
    pub fn process_message(&self, body: &str) -> CoreResult<Frame> {
        self.inner.pipeline.lock().process_raw(body)
    }

    /// Subscribes a new listener to the processed-frame stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.frames_tx.subscribe()
    }

    /// Fire-and-forget broadcast to all currently open listeners.
    pub fn broadcast(&self, message: String) {
        // Send errors just mean nobody is listening right now.
        let _ = self.inner.frames_tx.send(message);
    }

    /// Number of currently subscribed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.frames_tx.receiver_count()
    }

    /// Recording directory, when recording is enabled.
    #[must_use]
    pub fn record_dir(&self) -> Option<&Path> {
        self.inner.record_dir.as_deref()
    }
}
