//! Realtime websocket endpoint
//!
//! Upgrades the connection, wraps the socket's send half in a
//! [`RealtimeChannel`], and acknowledges each structured event. Malformed
//! payloads come back as realtime error events instead of closing the
//! session.

use async_trait::async_trait;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tracing::debug;

use streamgate_core::{realtime_event_id, ApiError, Error, Result};
use streamgate_delivery::{DuplexConnection, RealtimeChannel};

use crate::routes::request_trace_id;

/// Websocket handler for realtime duplex sessions
pub async fn realtime_handler(ws: WebSocketUpgrade, headers: HeaderMap) -> impl IntoResponse {
    let trace_id = request_trace_id(&headers);
    ws.on_upgrade(move |socket| handle_socket(socket, trace_id))
}

/// Send half of an upgraded websocket, one text frame per logical event
struct WsConnection {
    sender: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl DuplexConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sender
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e)))
    }
}

async fn handle_socket(socket: WebSocket, trace_id: String) {
    let (sender, mut receiver) = socket.split();
    let mut channel = RealtimeChannel::new(WsConnection { sender }, trace_id.clone());

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                metrics::counter!("streamgate_realtime_events_total").increment(1);
                match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(received) => {
                        let ack = serde_json::json!({
                            "type": "ack",
                            "event_id": realtime_event_id(&trace_id),
                            "received": received,
                        });
                        if channel.send_object(&ack).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        channel
                            .send_error(ApiError::new("invalid_request_error", e.to_string()))
                            .await;
                    }
                }
            }
            Message::Ping(data) => {
                // Pong is handled automatically by axum
                tracing::trace!("received ping: {:?}", data);
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!(trace_id = %trace_id, "realtime session closed");
}
