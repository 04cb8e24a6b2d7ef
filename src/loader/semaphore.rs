//! Counting semaphore with a FIFO wait queue.
//!
//! Admission control for the resource loader: logical gating of async
//! operations in flight, not thread parallelism. Callers past the
//! concurrency bound suspend on a queued `oneshot` waiter and are resumed
//! in request order; queued (not yet admitted) waiters can be canceled in
//! bulk, which is how a navigation rejects every pending load.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

// ============================================================================
// Canceled
// ============================================================================

/// A queued acquisition was canceled before a slot became available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canceled;

impl fmt::Display for Canceled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("acquisition canceled")
    }
}

impl std::error::Error for Canceled {}

// ============================================================================
// FifoSemaphore
// ============================================================================

/// A slot in transit from a releasing permit to a queued waiter.
///
/// Owns the slot until the waiter takes it over; dropping an untaken grant
/// (the waiter's future was abandoned after the handoff) releases the slot
/// again instead of leaking it.
struct SlotGrant {
    semaphore: Option<Arc<FifoSemaphore>>,
}

impl SlotGrant {
    fn new(semaphore: Arc<FifoSemaphore>) -> Self {
        Self {
            semaphore: Some(semaphore),
        }
    }

    /// Takes ownership of the slot away from the grant.
    fn defuse(&mut self) {
        self.semaphore = None;
    }
}

impl Drop for SlotGrant {
    fn drop(&mut self) {
        if let Some(semaphore) = self.semaphore.take() {
            semaphore.release();
        }
    }
}

/// Counter and wait queue behind one lock.
struct SemaphoreState {
    /// Currently admitted operations.
    running: usize,
    /// Suspended callers in request order. A dropped sender rejects its
    /// waiter; that is the cancellation path.
    waiters: VecDeque<oneshot::Sender<SlotGrant>>,
}

/// A counting semaphore with strict FIFO admission.
///
/// Permits release on drop. Unlike `tokio::sync::Semaphore`, queued waiters
/// can be rejected in bulk without touching admitted operations.
pub struct FifoSemaphore {
    /// Maximum concurrently admitted operations.
    max: usize,
    state: Mutex<SemaphoreState>,
}

impl FifoSemaphore {
    /// Creates a semaphore admitting at most `max` concurrent operations.
    #[must_use]
    pub fn new(max: usize) -> Arc<Self> {
        Arc::new(Self {
            max,
            state: Mutex::new(SemaphoreState {
                running: 0,
                waiters: VecDeque::new(),
            }),
        })
    }

    /// Acquires a slot, suspending in FIFO order when none is free.
    ///
    /// # Errors
    ///
    /// [`Canceled`] if the waiter was rejected by [`cancel_queued`] before
    /// a slot became available.
    ///
    /// [`cancel_queued`]: FifoSemaphore::cancel_queued
    pub async fn acquire(self: &Arc<Self>) -> Result<Permit, Canceled> {
        let waiter = {
            let mut state = self.state.lock();
            if state.running < self.max {
                state.running += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                trace!(queued = state.waiters.len(), "Admission queued");
                Some(rx)
            }
        };

        if let Some(rx) = waiter {
            // A completing load hands its slot over; a dropped sender means
            // the queue was canceled. The grant is defused here because the
            // returned permit owns the slot from now on.
            let mut grant = rx.await.map_err(|_| Canceled)?;
            grant.defuse();
        }

        Ok(Permit {
            semaphore: Arc::clone(self),
        })
    }

    /// Rejects every queued (not yet admitted) waiter.
    ///
    /// Admitted operations are unaffected; they complete and release their
    /// slots normally. Returns the number of waiters rejected.
    pub fn cancel_queued(&self) -> usize {
        let mut state = self.state.lock();
        let canceled = state.waiters.len();
        state.waiters.clear();
        canceled
    }

    /// Returns the number of admitted operations.
    #[must_use]
    pub fn running(&self) -> usize {
        self.state.lock().running
    }

    /// Returns the number of queued waiters.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Releases one slot, handing it to the first live waiter when one
    /// exists.
    ///
    /// The handoff travels as a [`SlotGrant`]: a waiter abandoned after the
    /// grant was sent drops it unreceived, which releases the slot again.
    fn release(self: &Arc<Self>) {
        let mut state = self.state.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            match waiter.send(SlotGrant::new(Arc::clone(self))) {
                // Slot transferred; running count unchanged.
                Ok(()) => return,
                // Receiver gone (caller dropped its future); defuse under
                // the lock and try the next.
                Err(mut grant) => grant.defuse(),
            }
        }
        state.running -= 1;
    }
}

// ============================================================================
// Permit
// ============================================================================

/// One admitted slot; released on drop.
pub struct Permit {
    semaphore: Arc<FifoSemaphore>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::task::yield_now;

    #[tokio::test]
    async fn test_acquire_within_bound_is_immediate() {
        let semaphore = FifoSemaphore::new(2);
        let first = semaphore.acquire().await.unwrap();
        let second = semaphore.acquire().await.unwrap();

        assert_eq!(semaphore.running(), 2);
        assert_eq!(semaphore.queued(), 0);

        drop(first);
        drop(second);
        assert_eq!(semaphore.running(), 0);
    }

    #[tokio::test]
    async fn test_excess_acquire_suspends_until_release() {
        let semaphore = FifoSemaphore::new(1);
        let held = semaphore.acquire().await.unwrap();

        let resumed = Arc::new(AtomicUsize::new(0));
        let resumed_clone = Arc::clone(&resumed);
        let semaphore_clone = Arc::clone(&semaphore);
        let waiter = tokio::spawn(async move {
            let permit = semaphore_clone.acquire().await.unwrap();
            resumed_clone.fetch_add(1, Ordering::SeqCst);
            drop(permit);
        });

        yield_now().await;
        assert_eq!(semaphore.queued(), 1);
        assert_eq!(resumed.load(Ordering::SeqCst), 0);

        drop(held);
        waiter.await.unwrap();
        assert_eq!(resumed.load(Ordering::SeqCst), 1);
        assert_eq!(semaphore.running(), 0);
    }

    #[tokio::test]
    async fn test_waiters_resume_in_fifo_order() {
        let semaphore = FifoSemaphore::new(1);
        let held = semaphore.acquire().await.unwrap();

        let order: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();

        for n in 0..3 {
            let semaphore_clone = Arc::clone(&semaphore);
            let order_clone = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let permit = semaphore_clone.acquire().await.unwrap();
                order_clone.lock().push(n);
                drop(permit);
            }));
            // Current-thread runtime: the task registers its waiter before
            // the next spawn.
            yield_now().await;
        }

        assert_eq!(semaphore.queued(), 3);
        drop(held);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_cancel_queued_rejects_waiters_only() {
        let semaphore = FifoSemaphore::new(1);
        let held = semaphore.acquire().await.unwrap();

        let semaphore_clone = Arc::clone(&semaphore);
        let waiter = tokio::spawn(async move { semaphore_clone.acquire().await });
        yield_now().await;
        assert_eq!(semaphore.queued(), 1);

        assert_eq!(semaphore.cancel_queued(), 1);
        assert!(waiter.await.unwrap().is_err());

        // The admitted slot is untouched.
        assert_eq!(semaphore.running(), 1);
        drop(held);
        assert_eq!(semaphore.running(), 0);
    }

    #[tokio::test]
    async fn test_waiter_abandoned_after_handoff_returns_slot() {
        let semaphore = FifoSemaphore::new(1);
        let held = semaphore.acquire().await.unwrap();

        let semaphore_clone = Arc::clone(&semaphore);
        let waiter = tokio::spawn(async move {
            let _ = semaphore_clone.acquire().await;
        });
        yield_now().await;
        assert_eq!(semaphore.queued(), 1);

        // The release hands the slot to the queued waiter, which is then
        // dropped before it ever polls the granted slot.
        drop(held);
        waiter.abort();
        let _ = waiter.await;

        assert_eq!(semaphore.running(), 0);
        let permit = semaphore.acquire().await.unwrap();
        drop(permit);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_does_not_leak_slot() {
        let semaphore = FifoSemaphore::new(1);
        let held = semaphore.acquire().await.unwrap();

        let semaphore_clone = Arc::clone(&semaphore);
        let abandoned = tokio::spawn(async move {
            let _ = semaphore_clone.acquire().await;
        });
        yield_now().await;
        abandoned.abort();
        let _ = abandoned.await;

        drop(held);
        // The abandoned waiter is skipped; the slot is free again.
        assert_eq!(semaphore.running(), 0);
        let permit = semaphore.acquire().await.unwrap();
        drop(permit);
    }
}
