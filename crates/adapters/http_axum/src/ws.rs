//! Real-time viewer connections over WebSocket.
//!
//! Each connection registers one viewer with the hub, sends the `state`
//! snapshot, then multiplexes three things until the first failure:
//! inbound `set` requests, outbound `update`s from the viewer's
//! subscription, and keep-alive pings. Every failure is local to the
//! connection; the hub and the other viewers never notice.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::time::{Duration, Instant};

use vshome_app::hub::{Hub, Viewer};
use vshome_domain::error::{InvalidRequestError, TransportError};
use vshome_domain::message::ServerMessage;

use crate::state::{AppState, ViewerLimits};

/// `GET /ws` — upgrade to a viewer connection.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limits = state.limits;
    ws.max_message_size(limits.max_message_bytes)
        .on_upgrade(move |socket| serve(socket, state.hub, limits))
}

/// Drive one viewer connection to completion.
pub async fn serve(socket: WebSocket, hub: Arc<Hub>, limits: ViewerLimits) {
    let mut viewer = hub.connect().await;
    let viewer_id = viewer.id;
    let (mut sink, mut stream) = socket.split();

    match run(&hub, &mut viewer, &mut sink, &mut stream, limits).await {
        Ok(()) => tracing::debug!(%viewer_id, "viewer connection closed"),
        Err(err) => tracing::warn!(%viewer_id, error = %err, "dropping viewer"),
    }

    hub.disconnect(viewer_id).await;
    // Best effort; the peer may already be gone.
    let _ = tokio::time::timeout(limits.write_timeout, sink.close()).await;
}

async fn run(
    hub: &Hub,
    viewer: &mut Viewer,
    sink: &mut SplitSink<WebSocket, Message>,
    stream: &mut SplitStream<WebSocket>,
    limits: ViewerLimits,
) -> Result<(), TransportError> {
    send(sink, &viewer.take_snapshot(), limits.write_timeout).await?;

    let idle = tokio::time::sleep(limits.idle_timeout);
    tokio::pin!(idle);
    let mut ping =
        tokio::time::interval_at(Instant::now() + limits.ping_interval, limits.ping_interval);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = stream.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                let frame = frame.map_err(|err| TransportError::Socket(Box::new(err)))?;
                idle.as_mut().reset(Instant::now() + limits.idle_timeout);

                let reply = match frame {
                    Message::Text(text) => hub.handle_message(text.as_str()).await,
                    Message::Binary(_) => {
                        Some(ServerMessage::error(&InvalidRequestError::UnsupportedMessageType))
                    }
                    Message::Close(_) => return Ok(()),
                    Message::Ping(_) | Message::Pong(_) => None,
                };
                if let Some(reply) = reply {
                    send(sink, &reply, limits.write_timeout).await?;
                }
            }
            update = viewer.updates.recv() => {
                let device = update?;
                send(sink, &ServerMessage::Update { device }, limits.write_timeout).await?;
            }
            _ = &mut viewer.closed => return Ok(()),
            () = &mut idle => return Err(TransportError::IdleTimeout),
            _ = ping.tick() => {
                write(sink, Message::Ping(Bytes::new()), limits.write_timeout).await?;
            }
        }
    }
}

async fn send(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
    timeout: Duration,
) -> Result<(), TransportError> {
    let text = serde_json::to_string(message)?;
    write(sink, Message::Text(text.into()), timeout).await
}

async fn write(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: Message,
    timeout: Duration,
) -> Result<(), TransportError> {
    match tokio::time::timeout(timeout, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(TransportError::Socket(Box::new(err))),
        Err(_) => Err(TransportError::WriteTimeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use vshome_domain::device::{Device, DeviceKind};

    #[tokio::test]
    async fn should_reject_plain_http_request() {
        let device = Device::builder()
            .id("lamp")
            .name("Lamp")
            .kind(DeviceKind::Toggle)
            .build()
            .unwrap();
        let state = AppState::new(Hub::new(vec![device], 4).unwrap());
        let app = axum::Router::new()
            .route("/ws", axum::routing::get(upgrade))
            .with_state(state.clone());

        let response = app
            .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert_eq!(state.hub.viewer_count().await, 0);
    }
}
