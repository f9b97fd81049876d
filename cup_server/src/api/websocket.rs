//! WebSocket handler for live score updates.
//!
//! Every connection joins the single "scores" group. Whenever a result or a
//! bracket change is saved, each connection receives the in-progress matches
//! as one JSON text frame. Nothing is sent on connect; clients that need the
//! current state pull `/api/v1/scores/live` first.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8000/ws/scores');
//!
//! ws.onmessage = (event) => {
//!   const { matches } = JSON.parse(event.data);
//!   renderLiveMatches(matches);
//! };
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, warn};

use super::AppState;
use crate::{logging, metrics};

/// Upgrade the connection and subscribe it to the live feed
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forward published snapshots until either side goes away.
///
/// Client frames are read only to notice a close; their content is ignored.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let subscription = state.feed.subscribe().await;
    let subscriber_id = subscription.id;
    let mut snapshots = subscription.receiver;

    let active = state.feed.subscriber_count().await;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(active);
    logging::log_feed_connection(subscriber_id, true, active);

    let mut send_task = tokio::spawn(async move {
        while let Some(snapshot) = snapshots.recv().await {
            let json = match serde_json::to_string(snapshot.as_ref()) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize score snapshot: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
            metrics::snapshots_sent_total();
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error for subscriber {}: {}", subscriber_id, e);
                    break;
                }
            }
        }
    });

    // Whichever side finishes first ends the connection
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.feed.unsubscribe(subscriber_id).await;

    let active = state.feed.subscriber_count().await;
    metrics::websocket_connections_active(active);
    logging::log_feed_connection(subscriber_id, false, active);
    debug!("Live feed connection {} cleaned up", subscriber_id);
}
