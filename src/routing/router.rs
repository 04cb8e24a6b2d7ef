//! Message router / dispatcher.
//!
//! Single point of ingress for all inbound protocol frames. Each frame is
//! addressed by its [`RoutingKey`]; a key is either **bound** (one listener,
//! live synchronous delivery) or **unbound** (frames accumulate in a bounded
//! backlog). The two states are mutually exclusive per key at any instant.
//!
//! # State Machine
//!
//! ```text
//!            listen(key, cb)
//!  unbound ──────────────────► bound
//!     ▲                          │
//!     └──────────────────────────┘
//!            remove(key)
//! ```
//!
//! `listen` drains the accumulated backlog and registers the callback in one
//! critical section, so no frame is both returned in the backlog and
//! delivered live, and no frame arriving in between is lost.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::identifiers::{ClientId, SessionId};
use crate::protocol::Frame;
use crate::routing::pool::{DEFAULT_BACKLOG_CAPACITY, MessagePool, RoutingKey};

// ============================================================================
// Types
// ============================================================================

/// Listener callback type.
///
/// Called synchronously for each frame delivered to a bound key, while the
/// router's lock is held: the callback must not call back into the router
/// and must not block.
pub type Listener = Box<dyn Fn(&Frame) + Send + Sync>;

// ============================================================================
// RouterConfig
// ============================================================================

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Per-key backlog capacity (frames pooled while a key is unbound).
    pub backlog_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            backlog_capacity: DEFAULT_BACKLOG_CAPACITY,
        }
    }
}

impl RouterConfig {
    /// Creates the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-key backlog capacity.
    #[inline]
    #[must_use]
    pub fn with_backlog_capacity(mut self, capacity: usize) -> Self {
        self.backlog_capacity = capacity;
        self
    }
}

// ============================================================================
// RouterStats
// ============================================================================

/// Drop counters for diagnostics.
///
/// Both kinds of drop are silent by design; these counters are the only
/// place they surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouterStats {
    /// Frames evicted from full backlogs (oldest-first).
    pub evicted: u64,
    /// Frames dropped for missing addressing fields.
    pub unroutable: u64,
}

// ============================================================================
// MessageRouter
// ============================================================================

/// State behind the router's single lock.
struct RouterState {
    /// At most one listener per key.
    listeners: FxHashMap<RoutingKey, Listener>,
    /// Backlogs for unbound keys.
    pool: MessagePool,
    /// Frames dropped for missing addressing fields.
    unroutable: u64,
}

/// The central pub-sub and buffering dispatcher.
///
/// Construct once per shell context and inject into consumers; independent
/// instances are fully isolated (tests rely on this).
pub struct MessageRouter {
    state: Mutex<RouterState>,
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl MessageRouter {
    /// Creates a router with the given configuration.
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            state: Mutex::new(RouterState {
                listeners: FxHashMap::default(),
                pool: MessagePool::new(config.backlog_capacity),
                unroutable: 0,
            }),
        }
    }

    /// Registers a listener for a key and returns its accumulated backlog.
    ///
    /// Replaces any prior listener for the exact key. The returned frames
    /// are in arrival order; the backlog is reset to empty. Draining and
    /// registration happen in one critical section, so no frame can be both
    /// returned here and delivered to the callback.
    pub fn listen(
        &self,
        client_id: ClientId,
        session_id: SessionId,
        listener: Listener,
    ) -> Vec<Frame> {
        let key = RoutingKey::new(client_id, session_id);
        let mut state = self.state.lock();

        let backlog = state.pool.drain(key);
        state.listeners.insert(key, listener);

        debug!(key = %key, backlog = backlog.len(), "Listener bound");
        backlog
    }

    /// Deregisters the listener for a key.
    ///
    /// Frames arriving afterwards accumulate again; a later [`listen`] call
    /// for the same key receives them. Removing an unbound key is a no-op.
    ///
    /// [`listen`]: MessageRouter::listen
    pub fn remove(&self, client_id: ClientId, session_id: SessionId) {
        let key = RoutingKey::new(client_id, session_id);
        let mut state = self.state.lock();

        if state.listeners.remove(&key).is_some() {
            debug!(key = %key, "Listener removed");
        }
    }

    /// Routes one inbound frame.
    ///
    /// Frames without both addressing fields are dropped (counted). Bound
    /// keys get synchronous delivery; unbound keys pool the frame with
    /// bounded FIFO eviction.
    pub fn on_inbound_message(&self, frame: Frame) {
        let (Some(client_id), Some(session_id)) = (frame.client_id(), frame.session_id()) else {
            let mut state = self.state.lock();
            state.unroutable += 1;
            trace!(kind = %frame.kind, "Dropped unroutable frame");
            return;
        };

        let key = RoutingKey::new(client_id, session_id);
        let mut state = self.state.lock();

        if let Some(listener) = state.listeners.get(&key) {
            listener(&frame);
        } else {
            state.pool.push(key, frame);
        }
    }

    /// Returns `true` if a listener is bound for the key.
    #[must_use]
    pub fn has_listener(&self, client_id: ClientId, session_id: SessionId) -> bool {
        let key = RoutingKey::new(client_id, session_id);
        self.state.lock().listeners.contains_key(&key)
    }

    /// Returns the number of frames currently pooled for the key.
    #[must_use]
    pub fn backlog_len(&self, client_id: ClientId, session_id: SessionId) -> usize {
        let key = RoutingKey::new(client_id, session_id);
        self.state.lock().pool.len(key)
    }

    /// Returns the drop counters.
    #[must_use]
    pub fn stats(&self) -> RouterStats {
        let state = self.state.lock();
        RouterStats {
            evicted: state.pool.evicted(),
            unroutable: state.unroutable,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
