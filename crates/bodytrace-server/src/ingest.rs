//! Frames channel: the websocket endpoint the edge sensor publishes to.
//!
//! Each text message is one sensor sample. Messages are processed fully and
//! in arrival order before the next is handled; a message that fails to
//! decode is logged and dropped without affecting the connection or the
//! tracking history. Processed frames are broadcast to whichever app
//! listeners happen to be open; there is no buffering or retry for absent
//! listeners.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use chrono::Utc;

use bodytrace_core::wire::FrameMessage;

use crate::state::SceneState;

/// Router for the frames channel.
pub fn router(state: SceneState) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}

async fn ws_handler(State(state): State<SceneState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: SceneState) {
    tracing::info!("sensor connected");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(body) => process_and_broadcast(&state, &body),
            Message::Close(_) => break,
            // Pings are answered by axum; binary samples are not part of
            // the sensor protocol.
            _ => {}
        }
    }

    tracing::info!("sensor disconnected");
}

/// Runs one raw message through the pipeline and fans the frame out.
///
/// Shared with the replay driver, which feeds recorded messages through the
/// same path a live sensor would.
pub(crate) fn process_and_broadcast(state: &SceneState, body: &str) {
    if let Some(dir) = state.record_dir() {
        record_message(dir.to_path_buf(), body.to_string());
    }

    let frame = match state.process_message(body) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(error = %err, "dropping unprocessable sensor message");
            return;
        }
    };

    match serde_json::to_string(&FrameMessage::new(frame)) {
        Ok(json) => state.broadcast(json),
        Err(err) => tracing::error!(error = %err, "failed to serialize frame envelope"),
    }
}

/// Persists one raw message as `frame.<epoch_ms>.json`, off the hot path.
fn record_message(dir: std::path::PathBuf, body: String) {
    let path = dir.join(format!("frame.{}.json", Utc::now().timestamp_millis()));
    tokio::spawn(async move {
        if let Err(err) = tokio::fs::write(&path, body).await {
            tracing::warn!(error = %err, path = %path.display(), "failed to record frame");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcasts_processed_frames() {
        let state = SceneState::new(None);
        let mut rx = state.subscribe();

        process_and_broadcast(&state, r#"{"heatmap": [[1.0]], "poses": []}"#);

        let json = rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "frame");
        assert_eq!(value["payload"]["width"], 1);
    }

    #[test]
    fn malformed_messages_are_dropped_silently() {
        let state = SceneState::new(None);
        let mut rx = state.subscribe();

        process_and_broadcast(&state, "{broken");
        assert!(rx.try_recv().is_err());

        // The scene keeps working afterwards.
        process_and_broadcast(&state, r#"{"heatmap": [], "poses": []}"#);
        assert!(rx.try_recv().is_ok());
    }
}
