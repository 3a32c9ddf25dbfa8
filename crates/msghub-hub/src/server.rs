//! WebSocket front end for the hub.
//!
//! Every WebSocket upgrade on `/` becomes one agent. Text and binary frames
//! are both accepted; outbound frames are sent as text when they are valid
//! UTF-8, which the codec always produces.

use crate::connection::serve_connection;
use crate::hub::Hub;
use crate::transport::{FrameReader, FrameWriter};
use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use msghub_types::{HubResult, TransportError};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Read half of an upgraded WebSocket.
pub struct WsFrameReader(SplitStream<WebSocket>);

/// Write half of an upgraded WebSocket.
pub struct WsFrameWriter(SplitSink<WebSocket, WsMessage>);

#[async_trait]
impl FrameReader for WsFrameReader {
    async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            match self.0.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(text.as_str().as_bytes().to_vec()),
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(bytes.to_vec()),
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
                Some(Ok(WsMessage::Close(_))) | None => return Err(TransportError::Closed),
                Some(Err(e)) => return Err(TransportError::Io(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl FrameWriter for WsFrameWriter {
    async fn write_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let msg = match String::from_utf8(frame) {
            Ok(text) => WsMessage::Text(text.into()),
            Err(e) => WsMessage::Binary(e.into_bytes().into()),
        };
        self.0
            .send(msg)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.0.close().await;
    }
}

/// Router serving WebSocket upgrades at `/`.
pub fn router<U>(hub: Hub<U>) -> Router
where
    U: Default + Send + 'static,
{
    Router::new().route("/", get(ws_upgrade::<U>)).with_state(hub)
}

async fn ws_upgrade<U>(State(hub): State<Hub<U>>, ws: WebSocketUpgrade) -> Response
where
    U: Default + Send + 'static,
{
    ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        if let Err(e) =
            serve_connection(hub, WsFrameReader(stream), WsFrameWriter(sink)).await
        {
            warn!(error = %e, "Connection rejected");
        }
    })
}

/// Serve WebSocket connections from `listener` until the listener fails.
pub async fn serve<U>(listener: TcpListener, hub: Hub<U>) -> HubResult<()>
where
    U: Default + Send + 'static,
{
    info!(addr = ?listener.local_addr().ok(), "msghub listening");
    axum::serve(listener, router(hub)).await?;
    Ok(())
}
