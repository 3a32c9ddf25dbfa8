//! Server-side agent records.

use crate::queue::OutboundQueue;
use crate::transport::ConnectionGuard;
use msghub_types::Id;
use std::sync::Arc;

/// A connected peer as seen by the hub.
///
/// Created and destroyed only by the executor. The outbound queue is the one
/// piece shared with another task (the connection's writer).
#[derive(Debug)]
pub struct Agent<U = ()> {
    id: Id,
    outbound: OutboundQueue,
    connection: Arc<ConnectionGuard>,
    /// Per-deployment context (authentication state, presence data, ...).
    pub user_data: U,
}

impl<U: Default> Agent<U> {
    pub(crate) fn new(id: Id, outbound: OutboundQueue, connection: Arc<ConnectionGuard>) -> Self {
        Self {
            id,
            outbound,
            connection,
            user_data: U::default(),
        }
    }
}

impl<U> Agent<U> {
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn outbound(&self) -> &OutboundQueue {
        &self.outbound
    }

    /// Close the outbound queue (stopping the writer) and the connection.
    pub(crate) fn shutdown(&self) {
        self.outbound.close();
        self.connection.close();
    }
}

/// What the connection pair receives back from a registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The identifier assigned by the hub.
    pub id: Id,
    /// Queue the connection's writer drains.
    pub outbound: OutboundQueue,
}
