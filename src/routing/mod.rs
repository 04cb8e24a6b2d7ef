//! Frame routing and buffering layer.
//!
//! This module is the single point of ingress for inbound protocol frames
//! from the device bridge, fanning out to whichever UI consumer is bound to
//! each `(client, session)` key and pooling frames for keys nobody listens
//! to yet.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               MessageRouter                  │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ (client-1, session-1) → listener       │  │
//! │  │ (client-1, session-2) → backlog [....] │  │
//! │  │ (client-2, session-1) → listener       │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! A key is either bound (live delivery) or unbound (bounded backlog);
//! never both. Late-attaching consumers receive their backlog atomically
//! when they bind.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `pool` | Bounded per-key FIFO backlog with oldest-first eviction |
//! | `router` | The dispatcher: listen / remove / inbound routing |

// ============================================================================
// Submodules
// ============================================================================

/// Bounded per-key message backlog.
pub mod pool;

/// Message router / dispatcher.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use pool::{DEFAULT_BACKLOG_CAPACITY, MessagePool, RoutingKey};
pub use router::{Listener, MessageRouter, RouterConfig, RouterStats};
