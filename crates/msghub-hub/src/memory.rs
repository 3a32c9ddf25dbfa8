//! In-process transport backed by tokio channels.
//!
//! Used to attach connections to a hub without a network, e.g. for embedding
//! or tests. Dropping one end makes reads on the other end fail with
//! [`TransportError::Closed`].

use crate::transport::{FrameReader, FrameWriter};
use async_trait::async_trait;
use msghub_types::TransportError;
use tokio::sync::mpsc;

/// Receiving half of a memory connection.
#[derive(Debug)]
pub struct MemoryReader {
    rx: mpsc::Receiver<Vec<u8>>,
}

/// Sending half of a memory connection.
#[derive(Debug)]
pub struct MemoryWriter {
    tx: Option<mpsc::Sender<Vec<u8>>>,
}

/// One end of a memory connection.
#[derive(Debug)]
pub struct MemoryEnd {
    pub reader: MemoryReader,
    pub writer: MemoryWriter,
}

impl MemoryEnd {
    pub fn split(self) -> (MemoryReader, MemoryWriter) {
        (self.reader, self.writer)
    }
}

/// Create a connected pair of ends, each buffering up to `capacity` frames.
pub fn duplex(capacity: usize) -> (MemoryEnd, MemoryEnd) {
    let (a_tx, a_rx) = mpsc::channel(capacity.max(1));
    let (b_tx, b_rx) = mpsc::channel(capacity.max(1));
    (
        MemoryEnd {
            reader: MemoryReader { rx: b_rx },
            writer: MemoryWriter { tx: Some(a_tx) },
        },
        MemoryEnd {
            reader: MemoryReader { rx: a_rx },
            writer: MemoryWriter { tx: Some(b_tx) },
        },
    )
}

#[async_trait]
impl FrameReader for MemoryReader {
    async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl FrameWriter for MemoryWriter {
    async fn write_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame).await.map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) {
        self.tx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_cross_over() {
        let (a, b) = duplex(2);
        let (mut a_rx, mut a_tx) = a.split();
        let (mut b_rx, mut b_tx) = b.split();

        a_tx.write_frame(b"to-b".to_vec()).await.unwrap();
        b_tx.write_frame(b"to-a".to_vec()).await.unwrap();
        assert_eq!(b_rx.read_frame().await.unwrap(), b"to-b");
        assert_eq!(a_rx.read_frame().await.unwrap(), b"to-a");
    }

    #[tokio::test]
    async fn test_close_ends_peer_reads() {
        let (a, b) = duplex(2);
        let (_a_rx, mut a_tx) = a.split();
        let (mut b_rx, _b_tx) = b.split();

        a_tx.close().await;
        assert!(matches!(b_rx.read_frame().await, Err(TransportError::Closed)));
        assert!(matches!(
            a_tx.write_frame(b"late".to_vec()).await,
            Err(TransportError::Closed)
        ));
    }
}
