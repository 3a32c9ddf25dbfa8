//! Transport collaborator contract.
//!
//! The hub does not care how frames travel. A connection is split into a
//! [`FrameReader`] and a [`FrameWriter`], each owned by exactly one task, and
//! a shared [`ConnectionGuard`] that records the decision to close.
//! Deadlines are applied by the connection pair, not by the transport.

use async_trait::async_trait;
use msghub_types::TransportError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Read half of a message-framed connection.
#[async_trait]
pub trait FrameReader: Send + 'static {
    /// Read the next frame. Returns [`TransportError::Closed`] once the peer
    /// has gone away.
    async fn read_frame(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// Write half of a message-framed connection.
#[async_trait]
pub trait FrameWriter: Send + 'static {
    /// Write one frame.
    async fn write_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Close the underlying connection. Called once, by the writer task on exit.
    async fn close(&mut self);
}

/// Close-once flag shared by a connection's reader, writer and agent record.
#[derive(Debug)]
pub struct ConnectionGuard {
    closed: AtomicBool,
    signal: watch::Sender<bool>,
}

impl ConnectionGuard {
    pub fn new() -> Arc<Self> {
        let (signal, _) = watch::channel(false);
        Arc::new(Self {
            closed: AtomicBool::new(false),
            signal,
        })
    }

    /// Request the connection be closed. Only the first call returns `true`;
    /// later calls from racing readers, writers or deregistration are no-ops.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.signal.send_replace(true);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        let mut rx = self.signal.subscribe();
        // The sender lives in `self`, so the only exit is the value turning true.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_close_exactly_once() {
        let guard = ConnectionGuard::new();
        assert!(!guard.is_closed());
        assert!(guard.close());
        assert!(!guard.close());
        assert!(guard.is_closed());
    }

    #[tokio::test]
    async fn test_closed_resolves_for_waiters() {
        let guard = ConnectionGuard::new();
        let waiter = {
            let guard = Arc::clone(&guard);
            tokio::spawn(async move { guard.closed().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        guard.close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter not released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_after_close_is_immediate() {
        let guard = ConnectionGuard::new();
        guard.close();
        tokio::time::timeout(Duration::from_millis(100), guard.closed())
            .await
            .expect("already-closed guard should resolve");
    }
}
