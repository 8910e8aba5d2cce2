//! App channel: the websocket endpoint downstream visualizations listen on.
//!
//! Every listener receives each processed frame envelope as it is produced.
//! Delivery is fire-and-forget: a listener that falls behind the broadcast
//! buffer misses frames and is told so, and nothing is replayed for late
//! joiners. Messages sent *by* app clients are rebroadcast verbatim to all
//! app listeners, which lets presentation clients coordinate among
//! themselves through the same channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::state::SceneState;

/// Router for the app channel.
pub fn router(state: SceneState) -> Router {
    Router::new().route("/", get(ws_handler)).with_state(state)
}

async fn ws_handler(State(state): State<SceneState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SceneState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.subscribe();

    tracing::info!(listeners = state.listener_count(), "app listener connected");

    loop {
        tokio::select! {
            result = rx.recv() => match result {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "slow app listener missed frames");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => state.broadcast(text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "app listener socket error");
                    break;
                }
            },
        }
    }

    tracing::info!("app listener disconnected");
}
