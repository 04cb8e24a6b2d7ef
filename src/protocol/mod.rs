//! Protocol message and target description types.
//!
//! This module defines the shapes the routing core exchanges with its
//! collaborators: the inbound frame envelope from the device bridge and the
//! target lifecycle payloads of the remote-debugging protocol.
//!
//! # Message Overview
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Frame`] | Bridge → Router | Inbound protocol frame, keyed by `(client_id, session_id)` |
//! | [`TargetInfo`] | Peer → Registry | Description of one debuggable context |
//! | [`RegistryEvent`] | Registry → Observer | Tagged lifecycle notification |
//! | [`HostSignal`] | Registry → Host window | Side-channel attach/detach broadcast |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | Inbound frame envelope |
//! | `target` | Target descriptions and registry events |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound frame envelope.
pub mod frame;

/// Target descriptions and registry event types.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::Frame;
pub use target::{HostSignal, RegistryEvent, TargetInfo, TargetKind};
