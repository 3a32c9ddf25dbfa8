//! Bounded outbound message queue.
//!
//! The queue is the only state shared between the executor (producer) and a
//! connection's writer (consumer). Producers never wait on the executor side:
//! [`OutboundQueue::push`] applies the configured [`OverflowPolicy`] and
//! returns immediately. The client-side peer uses [`OutboundQueue::push_wait`]
//! instead, which waits for free space.
//!
//! Closing the queue discards whatever is still buffered, wakes the consumer
//! (which then sees `None`) and makes every later push fail.

use crossbeam::queue::ArrayQueue;
use msghub_types::{Message, OverflowPolicy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;

/// Why a message could not be queued. The rejected message is handed back.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// The queue is at capacity and the policy rejects new messages.
    #[error("outbound queue full")]
    Full(Message),
    /// The queue has been closed.
    #[error("outbound queue closed")]
    Closed(Message),
}

impl EnqueueError {
    /// Recover the message that was not queued.
    pub fn into_message(self) -> Message {
        match self {
            EnqueueError::Full(m) | EnqueueError::Closed(m) => m,
        }
    }
}

struct Inner {
    ring: ArrayQueue<Message>,
    policy: OverflowPolicy,
    closed: AtomicBool,
    /// Signalled when an item is pushed or the queue closes.
    item: Notify,
    /// Signalled when an item is popped or the queue closes.
    space: Notify,
}

/// Cloneable handle to a bounded FIFO of messages.
#[derive(Clone)]
pub struct OutboundQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for OutboundQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("policy", &self.inner.policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl OutboundQueue {
    /// Create a queue. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                ring: ArrayQueue::new(capacity.max(1)),
                policy,
                closed: AtomicBool::new(false),
                item: Notify::new(),
                space: Notify::new(),
            }),
        }
    }

    /// Queue a message without waiting.
    ///
    /// Returns `Ok(Some(evicted))` when the drop-oldest policy had to make
    /// room, `Ok(None)` for a plain enqueue.
    pub fn push(&self, msg: Message) -> Result<Option<Message>, EnqueueError> {
        if self.is_closed() {
            return Err(EnqueueError::Closed(msg));
        }
        let evicted = match self.inner.policy {
            OverflowPolicy::RejectNewest => {
                self.inner.ring.push(msg).map_err(EnqueueError::Full)?;
                None
            }
            OverflowPolicy::DropOldest => self.inner.ring.force_push(msg),
        };
        self.inner.item.notify_one();
        Ok(evicted)
    }

    /// Queue a message, waiting for free space when full.
    pub async fn push_wait(&self, mut msg: Message) -> Result<(), EnqueueError> {
        loop {
            let space = self.inner.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            if self.is_closed() {
                return Err(EnqueueError::Closed(msg));
            }
            match self.inner.ring.push(msg) {
                Ok(()) => {
                    self.inner.item.notify_one();
                    return Ok(());
                }
                Err(back) => msg = back,
            }
            space.await;
        }
    }

    /// Take the next message, waiting while empty. `None` once closed.
    pub async fn pop(&self) -> Option<Message> {
        loop {
            let item = self.inner.item.notified();
            tokio::pin!(item);
            item.as_mut().enable();

            if self.is_closed() {
                return None;
            }
            if let Some(msg) = self.inner.ring.pop() {
                self.inner.space.notify_one();
                return Some(msg);
            }
            item.await;
        }
    }

    /// Take the next message if one is ready.
    pub fn try_pop(&self) -> Option<Message> {
        if self.is_closed() {
            return None;
        }
        let msg = self.inner.ring.pop()?;
        self.inner.space.notify_one();
        Some(msg)
    }

    /// Close the queue and discard buffered messages. Returns `false` if it
    /// was already closed.
    pub fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        while self.inner.ring.pop().is_some() {}
        self.inner.item.notify_waiters();
        self.inner.space.notify_waiters();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.ring.capacity()
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.inner.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    fn msg(n: u32) -> Message {
        Message::new("a", "b", [n.to_string()])
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let q = OutboundQueue::new(0, OverflowPolicy::RejectNewest);
        assert_eq!(q.capacity(), 1);
        assert!(q.push(msg(1)).is_ok());
        assert!(matches!(q.push(msg(2)), Err(EnqueueError::Full(_))));
    }

    #[test]
    fn test_reject_newest_returns_message() {
        let q = OutboundQueue::new(1, OverflowPolicy::RejectNewest);
        q.push(msg(1)).unwrap();
        let err = q.push(msg(2)).unwrap_err();
        assert_eq!(err.into_message(), msg(2));
        assert_eq!(q.try_pop(), Some(msg(1)));
    }

    #[test]
    fn test_drop_oldest_evicts_front() {
        let q = OutboundQueue::new(2, OverflowPolicy::DropOldest);
        assert_eq!(q.push(msg(1)).unwrap(), None);
        assert_eq!(q.push(msg(2)).unwrap(), None);
        assert_eq!(q.push(msg(3)).unwrap(), Some(msg(1)));
        assert_eq!(q.try_pop(), Some(msg(2)));
        assert_eq!(q.try_pop(), Some(msg(3)));
    }

    #[test]
    fn test_close_drains_and_rejects() {
        let q = OutboundQueue::new(4, OverflowPolicy::RejectNewest);
        q.push(msg(1)).unwrap();
        assert!(q.close());
        assert!(!q.close());
        assert!(q.is_empty());
        assert!(q.try_pop().is_none());
        assert!(matches!(q.push(msg(2)), Err(EnqueueError::Closed(_))));
    }

    #[tokio::test]
    async fn test_pop_preserves_fifo_order() {
        let q = OutboundQueue::new(8, OverflowPolicy::RejectNewest);
        for n in 0..5 {
            q.push(msg(n)).unwrap();
        }
        for n in 0..5 {
            assert_eq!(q.pop().await, Some(msg(n)));
        }
    }

    #[test]
    fn test_pop_wakes_on_push() {
        let q = OutboundQueue::new(1, OverflowPolicy::RejectNewest);
        let mut pop = task::spawn(q.pop());
        assert_pending!(pop.poll());

        q.push(msg(7)).unwrap();
        assert!(pop.is_woken());
        assert_ready_eq!(pop.poll(), Some(msg(7)));
    }

    #[tokio::test]
    async fn test_pop_wakes_on_close() {
        let q = OutboundQueue::new(1, OverflowPolicy::RejectNewest);
        let consumer = {
            let q = q.clone();
            tokio::spawn(async move { q.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        q.close();
        let result = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer did not wake")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_push_wait_blocks_until_space() {
        let q = OutboundQueue::new(1, OverflowPolicy::RejectNewest);
        q.push(msg(1)).unwrap();

        let producer = {
            let q = q.clone();
            tokio::spawn(async move { q.push_wait(msg(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!producer.is_finished());

        assert_eq!(q.pop().await, Some(msg(1)));
        producer.await.unwrap().unwrap();
        assert_eq!(q.pop().await, Some(msg(2)));
    }

    #[tokio::test]
    async fn test_push_wait_fails_after_close() {
        let q = OutboundQueue::new(1, OverflowPolicy::RejectNewest);
        q.push(msg(1)).unwrap();
        let producer = {
            let q = q.clone();
            tokio::spawn(async move { q.push_wait(msg(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        q.close();
        assert!(matches!(
            producer.await.unwrap(),
            Err(EnqueueError::Closed(_))
        ));
    }
}
