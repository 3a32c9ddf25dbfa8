//! Client-side peer.
//!
//! The mirror image of a server connection, without a registry: one pending
//! outbound queue, a dial entry point and a callback per inbound message.
//! The queue outlives individual sessions, so messages sent while
//! disconnected go out on the next successful dial.

use crate::connection::{write_loop, FrameAddress};
use crate::queue::{EnqueueError, OutboundQueue};
use crate::transport::{ConnectionGuard, FrameReader, FrameWriter};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use msghub_types::{
    codec, ClientConfig, HubError, HubResult, Id, Message, OverflowPolicy, TransportError,
};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Callback = Arc<dyn Fn(Message) + Send + Sync>;

/// Minimal hub peer.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    outbound: OutboundQueue,
    on_message: Callback,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let outbound = OutboundQueue::new(config.outbound_capacity, OverflowPolicy::RejectNewest);
        Self {
            config,
            outbound,
            on_message: Arc::new(|_| {}),
        }
    }

    /// Set the callback invoked for every inbound message.
    ///
    /// The callback receives `{from, to: "", data}` and runs on the reader
    /// task, so it should return quickly.
    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.on_message = Arc::new(f);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Queue a message for the hub, waiting while the queue is full.
    /// Only `to` and `data` travel; the hub fills in the sender.
    pub async fn send(&self, msg: Message) -> Result<(), EnqueueError> {
        self.outbound.push_wait(msg).await
    }

    /// Queue a message if there is room right now.
    pub fn try_send(&self, msg: Message) -> Result<(), EnqueueError> {
        self.outbound.push(msg).map(|_| ())
    }

    /// Connect to the configured URL and run the session until it ends.
    ///
    /// Returns [`HubError::Connect`] if the connection could not be made and
    /// `Ok(())` once an established session has ended. Reconnecting is the
    /// caller's decision.
    pub async fn dial(&self) -> HubResult<()> {
        let url = self.config.url.as_str();
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| HubError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        info!(url, "Connected to hub");

        let (sink, stream) = stream.split();
        self.attach(TungsteniteReader(stream), TungsteniteWriter(sink))
            .await;
        info!(url, "Disconnected from hub");
        Ok(())
    }

    /// Run one session over an already-established transport.
    pub async fn attach<R: FrameReader, W: FrameWriter>(&self, mut reader: R, writer: W) {
        let guard = ConnectionGuard::new();
        let writer_task = tokio::spawn(write_loop(
            self.outbound.clone(),
            writer,
            Arc::clone(&guard),
            self.config.write_timeout(),
            FrameAddress::Destination,
        ));

        let read_timeout = self.config.read_timeout();
        loop {
            let frame = tokio::select! {
                _ = guard.closed() => break,
                read = tokio::time::timeout(read_timeout, reader.read_frame()) => read,
            };
            match frame.unwrap_or(Err(TransportError::Timeout(read_timeout))) {
                Ok(frame) => {
                    let (from, data) = codec::decode(&frame);
                    (self.on_message)(Message {
                        from,
                        to: Id::empty(),
                        data,
                    });
                }
                Err(e) => {
                    debug!(error = %e, "Read ended");
                    break;
                }
            }
        }

        guard.close();
        let _ = writer_task.await;
    }
}

struct TungsteniteReader(SplitStream<WsStream>);

struct TungsteniteWriter(SplitSink<WsStream, WsMessage>);

#[async_trait]
impl FrameReader for TungsteniteReader {
    async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            match self.0.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(bytes),
                Some(Ok(WsMessage::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Io(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl FrameWriter for TungsteniteWriter {
    async fn write_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let msg = match String::from_utf8(frame) {
            Ok(text) => WsMessage::Text(text),
            Err(e) => WsMessage::Binary(e.into_bytes()),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dial_failure_is_distinguishable() {
        let config = ClientConfig {
            url: "ws://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let err = Client::new(config).dial().await.unwrap_err();
        assert!(matches!(err, HubError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_attach_encodes_destination_and_decodes_sender() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let client = Client::new(ClientConfig::default()).on_message(move |msg| {
            sink.lock().unwrap().push(msg);
        });

        let (client_end, hub_end) = memory::duplex(4);
        let (reader, writer) = client_end.split();
        let (mut hub_rx, mut hub_tx) = hub_end.split();

        client.send(Message::new("", "@echo", ["hi"])).await.unwrap();
        let session = {
            let client = client.clone();
            tokio::spawn(async move { client.attach(reader, writer).await })
        };

        assert_eq!(hub_rx.read_frame().await.unwrap(), b"@echo\x1Fhi");
        hub_tx.write_frame(b"7\x1Fhello".to_vec()).await.unwrap();
        hub_tx.close().await;

        tokio::time::timeout(Duration::from_secs(1), session)
            .await
            .expect("session should end when the hub hangs up")
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.as_slice(), &[Message::new("7", "", ["hello"])]);
    }

    #[tokio::test]
    async fn test_queue_survives_session() {
        let client = Client::new(ClientConfig::default());
        let (client_end, hub_end) = memory::duplex(4);
        drop(hub_end);
        let (reader, writer) = client_end.split();
        client.attach(reader, writer).await;

        client.try_send(Message::new("", "3", ["later"])).unwrap();
        let (client_end, hub_end) = memory::duplex(4);
        let (reader, writer) = client_end.split();
        let (mut hub_rx, mut hub_tx) = hub_end.split();
        let session = {
            let client = client.clone();
            tokio::spawn(async move { client.attach(reader, writer).await })
        };

        assert_eq!(hub_rx.read_frame().await.unwrap(), b"3\x1Flater");
        hub_tx.close().await;
        session.await.unwrap();
    }
}
