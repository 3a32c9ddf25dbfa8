//! Per-connection reader and writer.
//!
//! Each accepted connection is served by two tasks. The reader decodes
//! inbound frames into [`Message`]s and posts them to the hub. The writer
//! drains the agent's outbound queue onto the transport. Both stop when the
//! shared [`ConnectionGuard`] closes. The writer also stops on its first write
//! failure; it is the only task that closes the transport itself.

use crate::hub::Hub;
use crate::queue::OutboundQueue;
use crate::transport::{ConnectionGuard, FrameReader, FrameWriter};
use msghub_types::{codec, HubResult, Id, Message, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which address a writer puts in front of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAddress {
    /// `(from, data)`: the hub telling an agent who sent the message.
    Sender,
    /// `(to, data)`: a client telling the hub where the message goes.
    Destination,
}

impl FrameAddress {
    pub fn encode(self, msg: &Message) -> Vec<u8> {
        match self {
            FrameAddress::Sender => msg.encode_inbound(),
            FrameAddress::Destination => msg.encode_outbound(),
        }
    }
}

/// Serve one connection until it ends.
///
/// Registers an agent, runs the writer in its own task and the reader on the
/// current one, then deregisters the agent. Fails only if the hub has
/// stopped before the agent could be registered.
pub async fn serve_connection<U, R, W>(hub: Hub<U>, reader: R, writer: W) -> HubResult<()>
where
    U: Default + Send + 'static,
    R: FrameReader,
    W: FrameWriter,
{
    let guard = ConnectionGuard::new();
    let registration = hub.register_agent(Arc::clone(&guard)).await?;
    let id = registration.id.clone();

    let writer_task = tokio::spawn(write_loop(
        registration.outbound.clone(),
        writer,
        Arc::clone(&guard),
        hub.config().write_timeout(),
        FrameAddress::Sender,
    ));

    read_loop(&hub, &id, reader, &guard, hub.config().read_timeout()).await;

    if hub.unregister_agent(id.clone()).await.is_err() {
        // Executor gone: nobody else will close the queue.
        registration.outbound.close();
        guard.close();
    }
    let _ = writer_task.await;
    info!(agent = %id, "Agent disconnected");
    Ok(())
}

async fn read_loop<U, R>(
    hub: &Hub<U>,
    id: &Id,
    mut reader: R,
    guard: &ConnectionGuard,
    read_timeout: Duration,
) where
    U: Default + Send + 'static,
    R: FrameReader,
{
    loop {
        let frame = tokio::select! {
            _ = guard.closed() => break,
            read = tokio::time::timeout(read_timeout, reader.read_frame()) => read,
        };
        let frame = match frame.unwrap_or(Err(TransportError::Timeout(read_timeout))) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(agent = %id, error = %e, "Read ended");
                break;
            }
        };

        let (to, data) = codec::decode(&frame);
        let msg = Message {
            from: id.clone(),
            to,
            data,
        };
        if hub.post(msg).await.is_err() {
            warn!(agent = %id, "Hub stopped, dropping connection");
            break;
        }
    }
}

/// Drain `queue` onto `writer` until the queue or the guard closes, or a
/// write fails. Closes the guard and the transport on the way out.
pub(crate) async fn write_loop<W: FrameWriter>(
    queue: OutboundQueue,
    mut writer: W,
    guard: Arc<ConnectionGuard>,
    write_timeout: Duration,
    address: FrameAddress,
) {
    loop {
        let msg = tokio::select! {
            _ = guard.closed() => break,
            next = queue.pop() => match next {
                Some(msg) => msg,
                None => break,
            },
        };

        let frame = address.encode(&msg);
        let written = tokio::time::timeout(write_timeout, writer.write_frame(frame))
            .await
            .unwrap_or(Err(TransportError::Timeout(write_timeout)));
        if let Err(e) = written {
            warn!(to = %msg.to, error = %e, "Write failed, closing connection");
            break;
        }
    }
    guard.close();
    writer.close().await;
}
