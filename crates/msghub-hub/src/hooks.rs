//! Extension points injected into the hub.
//!
//! Every hook runs on the executor with exclusive access to [`HubCore`], so
//! hooks may inspect the registries and route further messages. All default
//! implementations are no-ops.

use crate::hub::HubCore;
use msghub_types::{Id, Message};
use std::fmt;

/// Source of fresh agent identifiers.
pub trait IdGenerator: Send + 'static {
    fn next_id(&mut self) -> Id;
}

impl<F> IdGenerator for F
where
    F: FnMut() -> Id + Send + 'static,
{
    fn next_id(&mut self) -> Id {
        self()
    }
}

/// Default generator: `"1"`, `"2"`, `"3"`, ...
///
/// Unique only within one hub instance and one process lifetime.
#[derive(Debug, Default)]
pub struct CounterIdGenerator {
    last: u64,
}

impl CounterIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for CounterIdGenerator {
    fn next_id(&mut self) -> Id {
        self.last += 1;
        Id::new(self.last.to_string())
    }
}

/// Why a `Send` did not reach its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// `To` has the service prefix but no such service is registered.
    NoSuchService,
    /// No live agent has the `To` identifier.
    NoSuchAgent,
    /// The agent's outbound queue is full and rejects new messages.
    QueueFull,
    /// The agent's outbound queue has been closed.
    QueueClosed,
    /// The message was queued once but evicted to make room for a newer one.
    Evicted,
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendFailure::NoSuchService => write!(f, "no such service"),
            SendFailure::NoSuchAgent => write!(f, "no such agent"),
            SendFailure::QueueFull => write!(f, "queue full"),
            SendFailure::QueueClosed => write!(f, "queue closed"),
            SendFailure::Evicted => write!(f, "evicted"),
        }
    }
}

/// Hub lifecycle and routing hooks.
pub trait HubHooks<U = ()>: Send + Sync + 'static {
    /// Runs before a service handler, with the message it will receive.
    fn before_service(&self, _hub: &mut HubCore<U>, _msg: &mut Message) {}

    /// Runs whenever a message is not delivered. `msg` is the message as it
    /// was submitted, before any `before_service` mutation.
    fn on_send_failure(&self, _hub: &mut HubCore<U>, _msg: &Message, _reason: SendFailure) {}

    /// Runs right after an agent is registered.
    fn on_connect(&self, _hub: &mut HubCore<U>, _id: &Id) {}

    /// Runs right after an agent is removed from the registry.
    fn on_disconnect(&self, _hub: &mut HubCore<U>, _id: &Id) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl<U> HubHooks<U> for NoopHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_one() {
        let mut gen = CounterIdGenerator::new();
        assert_eq!(gen.next_id(), "1");
        assert_eq!(gen.next_id(), "2");
        assert_eq!(gen.next_id(), "3");
    }

    #[test]
    fn test_closure_generator() {
        let mut n = 100;
        let mut gen = move || {
            n += 1;
            Id::new(format!("peer-{n}"))
        };
        assert_eq!(IdGenerator::next_id(&mut gen), "peer-101");
    }
}
