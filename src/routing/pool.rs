//! Bounded per-key message backlog.
//!
//! Undelivered frames are pooled per routing key until a consumer registers
//! a listener. Each key's pool is a FIFO bounded at a fixed capacity;
//! inserting past capacity evicts the oldest frame, never the newest.
//! Eviction is silent data loss by design (a backpressure valve), but it is
//! counted so it stays observable.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::identifiers::{ClientId, SessionId};
use crate::protocol::Frame;

// ============================================================================
// Constants
// ============================================================================

/// Default per-key backlog capacity.
pub const DEFAULT_BACKLOG_CAPACITY: usize = 100;

// ============================================================================
// RoutingKey
// ============================================================================

/// The addressing unit of the dispatcher: one `(client, session)` pair.
///
/// Never split or merged across the two identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingKey {
    /// The UI consumer the frame belongs to.
    pub client_id: ClientId,
    /// The session slot within that consumer.
    pub session_id: SessionId,
}

impl RoutingKey {
    /// Creates a routing key.
    #[inline]
    #[must_use]
    pub const fn new(client_id: ClientId, session_id: SessionId) -> Self {
        Self {
            client_id,
            session_id,
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.client_id, self.session_id)
    }
}

// ============================================================================
// MessagePool
// ============================================================================

/// Per-key bounded FIFO pools of undelivered frames.
///
/// Stored as `client → session → frames`, created lazily on the first
/// undeliverable frame for a key.
#[derive(Debug)]
pub struct MessagePool {
    /// Per-key capacity bound.
    capacity: usize,

    /// Pending frames by client, then session.
    pools: FxHashMap<ClientId, FxHashMap<SessionId, VecDeque<Frame>>>,

    /// Total frames evicted under overflow since construction.
    evicted: u64,
}

impl MessagePool {
    /// Creates an empty pool set with the given per-key capacity.
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pools: FxHashMap::default(),
            evicted: 0,
        }
    }

    /// Appends a frame to the key's pool, evicting the oldest frame first
    /// when the pool is at capacity.
    pub fn push(&mut self, key: RoutingKey, frame: Frame) {
        let pool = self
            .pools
            .entry(key.client_id)
            .or_default()
            .entry(key.session_id)
            .or_default();

        if pool.len() >= self.capacity {
            pool.pop_front();
            self.evicted += 1;
            trace!(key = %key, "Backlog full, evicted oldest frame");
        }

        pool.push_back(frame);
    }

    /// Removes and returns the key's full backlog in arrival order.
    ///
    /// The pool for the key is reset to empty.
    #[must_use]
    pub fn drain(&mut self, key: RoutingKey) -> Vec<Frame> {
        let Some(sessions) = self.pools.get_mut(&key.client_id) else {
            return Vec::new();
        };

        sessions
            .remove(&key.session_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Returns the number of frames currently pooled for the key.
    #[must_use]
    pub fn len(&self, key: RoutingKey) -> usize {
        self.pools
            .get(&key.client_id)
            .and_then(|sessions| sessions.get(&key.session_id))
            .map_or(0, VecDeque::len)
    }

    /// Returns `true` if no frame is pooled for the key.
    #[inline]
    #[must_use]
    pub fn is_empty(&self, key: RoutingKey) -> bool {
        self.len(key) == 0
    }

    /// Returns the total number of frames evicted under overflow.
    #[inline]
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(client: u32, session: u32) -> RoutingKey {
        RoutingKey::new(ClientId::new(client), SessionId::new(session))
    }

    fn frame(n: u64) -> Frame {
        Frame::new("cdp-event", json!({ "seq": n }))
    }

    #[test]
    fn test_push_and_drain_preserves_order() {
        let mut pool = MessagePool::new(DEFAULT_BACKLOG_CAPACITY);
        let k = key(1, 1);

        for n in 0..5 {
            pool.push(k, frame(n));
        }

        let drained = pool.drain(k);
        let seqs: Vec<u64> = drained
            .iter()
            .map(|f| f.data["seq"].as_u64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
        assert!(pool.is_empty(k));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut pool = MessagePool::new(DEFAULT_BACKLOG_CAPACITY);
        let k = key(1, 1);

        for n in 0..(DEFAULT_BACKLOG_CAPACITY as u64 + 1) {
            pool.push(k, frame(n));
        }

        assert_eq!(pool.len(k), DEFAULT_BACKLOG_CAPACITY);
        assert_eq!(pool.evicted(), 1);

        let drained = pool.drain(k);
        // Frame 0 was evicted; the newest frame survives.
        assert_eq!(drained[0].data["seq"], 1);
        assert_eq!(
            drained.last().unwrap().data["seq"],
            DEFAULT_BACKLOG_CAPACITY as u64
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let mut pool = MessagePool::new(2);
        pool.push(key(1, 1), frame(1));
        pool.push(key(1, 2), frame(2));
        pool.push(key(2, 1), frame(3));

        assert_eq!(pool.len(key(1, 1)), 1);
        assert_eq!(pool.len(key(1, 2)), 1);
        assert_eq!(pool.len(key(2, 1)), 1);

        let drained = pool.drain(key(1, 2));
        assert_eq!(drained.len(), 1);
        assert_eq!(pool.len(key(1, 1)), 1);
        assert_eq!(pool.len(key(2, 1)), 1);
    }

    #[test]
    fn test_drain_unknown_key_is_empty() {
        let mut pool = MessagePool::new(2);
        assert!(pool.drain(key(9, 9)).is_empty());
    }

    #[test]
    fn test_routing_key_display() {
        assert_eq!(key(1, 4).to_string(), "client-1/session-4");
    }
}
