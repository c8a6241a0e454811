//! Queue discipline shared by the push/event listeners and the Vision worker
//! (§5 "Concurrency").
//!
//! Push and event telegrams arrive faster than a slow consumer might drain
//! them; the spec calls for drop-newest backpressure there, so a full queue
//! simply discards the incoming record and counts it. Vision frames instead
//! want "latest wins" (drop-oldest, single slot) — grounded on the reference
//! `RTDESubscriber`'s use of `tokio::sync::watch` for its single most-recent
//! telemetry sample.

use tokio::sync::{mpsc, watch};

/// Bounded, drop-newest queue: when full, a `push` silently discards the new
/// item and returns `false` rather than blocking the producer.
pub struct DropNewestQueue<T> {
    tx: mpsc::Sender<T>,
    rx: mpsc::Receiver<T>,
}

impl<T: Send + 'static> DropNewestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self { tx, rx }
    }

    pub fn handle(&self) -> DropNewestSender<T> {
        DropNewestSender { tx: self.tx.clone() }
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

#[derive(Clone)]
pub struct DropNewestSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> DropNewestSender<T> {
    /// Returns `true` if the item was enqueued, `false` if the queue was full
    /// and the item was dropped.
    pub fn offer(&self, item: T) -> bool {
        match self.tx.try_send(item) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => false,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Single-slot, drop-oldest channel: every `set` overwrites whatever hadn't
/// been consumed yet. Readers always observe the most recent value.
pub struct LatestSlot<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone + Send + Sync + 'static> LatestSlot<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn set(&self, value: T) {
        let _ = self.tx.send(Some(value));
    }

    pub fn subscribe(&self) -> LatestSlotReceiver<T> {
        LatestSlotReceiver { rx: self.tx.subscribe() }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LatestSlotReceiver<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> LatestSlotReceiver<T> {
    /// Block (async) until a value newer than the last one observed arrives.
    pub async fn changed(&mut self) -> Option<T> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        self.rx.borrow().clone()
    }

    pub fn current(&self) -> Option<T> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drop_newest_queue_discards_when_full() {
        let queue = DropNewestQueue::<i32>::new(1);
        let handle = queue.handle();
        assert!(handle.offer(1));
        assert!(!handle.offer(2));
    }

    #[tokio::test]
    async fn drop_newest_queue_delivers_in_order() {
        let mut queue = DropNewestQueue::<i32>::new(4);
        let handle = queue.handle();
        handle.offer(1);
        handle.offer(2);
        assert_eq!(queue.recv().await, Some(1));
        assert_eq!(queue.recv().await, Some(2));
    }

    #[tokio::test]
    async fn latest_slot_overwrites_unread_value() {
        let slot = LatestSlot::<i32>::new();
        let mut rx = slot.subscribe();
        slot.set(1);
        slot.set(2);
        assert_eq!(rx.changed().await, Some(2));
    }
}
