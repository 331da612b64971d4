//! Hand-off queue from light event producers to the display consumer.
//!
//! Producers (the round controller and the reset timer) append under a
//! short lock and never wait for the consumer. The consumer either polls
//! with [`EventChannel::drain_pending`] on its own cadence or awaits the
//! next event with [`EventChannel::recv`].
//!
//! The queue is bounded. When it is full the oldest event is evicted,
//! counted and logged; the only other way events leave without being
//! consumed is an explicit [`EventChannel::replace_pending`] during a
//! manual reset.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use liftlights_types::{LightEvent, Position};
use tokio::sync::{Mutex, Notify};
use tracing::warn;

/// Smallest usable capacity: one full round of `Set` events.
pub const MIN_EVENT_CAPACITY: usize = Position::ALL.len();

/// Bounded FIFO of [`LightEvent`]s shared by producers and one consumer.
#[derive(Debug)]
pub struct EventChannel {
    queue: Mutex<VecDeque<LightEvent>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl EventChannel {
    /// Create a channel holding at most `capacity` unconsumed events.
    ///
    /// Capacities below [`MIN_EVENT_CAPACITY`] are raised to it, so a
    /// round's batch never evicts its own head.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_EVENT_CAPACITY);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Append one event.
    pub async fn publish(&self, event: LightEvent) {
        let mut queue = self.queue.lock().await;
        self.push_locked(&mut queue, event);
        drop(queue);
        self.notify.notify_one();
    }

    /// Append several events as one contiguous run.
    ///
    /// No other producer's event can land between them.
    pub async fn publish_batch<I>(&self, events: I)
    where
        I: IntoIterator<Item = LightEvent>,
    {
        let mut queue = self.queue.lock().await;
        for event in events {
            self.push_locked(&mut queue, event);
        }
        drop(queue);
        self.notify.notify_one();
    }

    /// Take the oldest event without waiting.
    pub async fn try_recv(&self) -> Option<LightEvent> {
        self.queue.lock().await.pop_front()
    }

    /// Wait for and take the oldest event.
    pub async fn recv(&self) -> LightEvent {
        loop {
            if let Some(event) = self.queue.lock().await.pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }

    /// Take every pending event, oldest first.
    pub async fn drain_pending(&self) -> Vec<LightEvent> {
        self.queue.lock().await.drain(..).collect()
    }

    /// Throw away every pending event, then enqueue `event` in their place.
    ///
    /// Both steps happen under one lock, so the consumer sees either the
    /// old backlog or `event` alone. Returns how many events were
    /// discarded.
    pub async fn replace_pending(&self, event: LightEvent) -> usize {
        let mut queue = self.queue.lock().await;
        let discarded = queue.len();
        queue.clear();
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
        discarded
    }

    /// Number of pending events.
    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Whether no events are pending.
    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Maximum number of pending events.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events evicted because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push_locked(&self, queue: &mut VecDeque<LightEvent>, event: LightEvent) {
        if queue.len() >= self.capacity
            && let Some(evicted) = queue.pop_front()
        {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed).saturating_add(1);
            warn!(
                ?evicted,
                capacity = self.capacity,
                dropped_total = total,
                "light event queue full, evicted oldest event"
            );
        }
        queue.push_back(event);
    }
}
