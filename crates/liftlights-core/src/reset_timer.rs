//! Cancellable single-shot timer for the automatic light reset.
//!
//! At most one action is outstanding at any instant: arming while a
//! previous action is pending cancels it first. Each arming bumps a
//! generation counter and the spawned task re-checks that counter under
//! the timer lock before running its action, so once [`ResetTimer::cancel`]
//! or [`ResetTimer::arm`] returns, a superseded action can never fire,
//! even if its sleep had already elapsed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct TimerSlot {
    /// Bumped on every arm and cancel.
    generation: u64,
    /// Task for the pending action; `None` once fired or cancelled.
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Invalidate the current generation and abort its task.
    ///
    /// Returns `true` if an action was pending.
    fn cancel_pending(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        self.handle.take().is_some_and(|handle| {
            handle.abort();
            true
        })
    }
}

/// A delayed action that can be cancelled or re-armed.
#[derive(Debug, Default)]
pub struct ResetTimer {
    slot: Arc<Mutex<TimerSlot>>,
}

impl ResetTimer {
    /// Create a timer with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once after `delay`, replacing any pending action.
    ///
    /// Returns `true` if a pending action was cancelled to make room.
    /// The action runs while holding the timer lock; it must not call
    /// back into this timer.
    pub async fn arm<F>(&self, delay: Duration, action: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock().await;
        let replaced = slot.cancel_pending();
        let armed = slot.generation;

        let shared = Arc::clone(&self.slot);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = shared.lock().await;
            if slot.generation != armed {
                return;
            }
            slot.handle = None;
            debug!(generation = armed, "reset timer fired");
            action.await;
        });
        slot.handle = Some(handle);

        debug!(generation = armed, delay_ms = delay.as_millis(), replaced, "reset timer armed");
        replaced
    }

    /// Cancel the pending action, if any.
    ///
    /// Returns `true` if an action was pending. Cancelling an idle or
    /// already-fired timer is a no-op.
    pub async fn cancel(&self) -> bool {
        let cancelled = self.slot.lock().await.cancel_pending();
        if cancelled {
            debug!("reset timer cancelled");
        }
        cancelled
    }

    /// Whether an armed action has not fired yet.
    pub async fn is_pending(&self) -> bool {
        self.slot.lock().await.handle.is_some()
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.try_lock() {
            slot.cancel_pending();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::sleep;

    use super::*;

    fn counting_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let timer = ResetTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        assert!(!timer.arm(Duration::from_secs(10), counting_action(&fired)).await);
        assert!(timer.is_pending().await);

        sleep(Duration::from_secs(9)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending().await);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let timer = ResetTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        timer.arm(Duration::from_secs(10), counting_action(&fired)).await;
        sleep(Duration::from_secs(5)).await;
        assert!(timer.cancel().await);
        assert!(!timer.is_pending().await);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_when_idle_is_noop() {
        let timer = ResetTimer::new();
        assert!(!timer.cancel().await);

        let fired = Arc::new(AtomicUsize::new(0));
        timer.arm(Duration::from_millis(10), counting_action(&fired)).await;
        sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        // Already fired: nothing left to cancel.
        assert!(!timer.cancel().await);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_pending_action() {
        let timer = ResetTimer::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        timer.arm(Duration::from_secs(10), counting_action(&first)).await;
        sleep(Duration::from_secs(5)).await;
        assert!(timer.arm(Duration::from_secs(10), counting_action(&second)).await);

        // The first deadline passes without firing.
        sleep(Duration::from_secs(7)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(4)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
