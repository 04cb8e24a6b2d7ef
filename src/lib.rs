//! Devtools Mux - Session routing core for a multi-device devtools shell.
//!
//! This library multiplexes a CDP-like remote-debugging protocol across
//! many physical devices, each exposing multiple debuggable sessions
//! (pages, iframes, workers), to one or more UI surfaces.
//!
//! # Architecture
//!
//! Four components form the core, each depended on by the next:
//!
//! - **Target Registry**: tracks known targets per parent connection and
//!   their lifecycle (created, info-changed, destroyed, attached, detached)
//! - **Parallel Connection Factory**: negotiates session-bound virtual
//!   transports multiplexed over one physical channel
//! - **Message Router**: fans inbound frames out by `(client, session)`
//!   key, pooling frames for keys nobody listens to yet
//! - **Resource Loader**: concurrency-bounded, timeout-enforced fetches of
//!   auxiliary resources with a layered fallback chain
//!
//! The physical wire and the UI layer live outside this crate, behind the
//! traits in [`transport`].
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use devtools_mux::{MessageRouter, RouterConfig, TargetRegistry};
//! use devtools_mux::identifiers::{ClientId, SessionId};
//!
//! // One router per shell; the bridge feeds it every inbound frame.
//! let router = Arc::new(MessageRouter::new(RouterConfig::default()));
//!
//! // A late-mounting inspector picks up its backlog atomically.
//! let backlog = router.listen(
//!     ClientId::new(1),
//!     SessionId::new(4),
//!     Box::new(|frame| render(frame)),
//! );
//!
//! // One registry per parent connection.
//! let registry = TargetRegistry::new(transport);
//! let channel = registry.create_parallel_connection().await?;
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`loader`] | Bounded resource loading |
//! | [`protocol`] | Frame envelope and target descriptions |
//! | [`routing`] | Frame routing and buffering |
//! | [`targets`] | Target lifecycle and parallel connections |
//! | [`transport`] | External collaborator traits |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for routing and protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Bounded resource loading subsystem.
pub mod loader;

/// Protocol message and target description types.
pub mod protocol;

/// Frame routing and buffering layer.
pub mod routing;

/// Target lifecycle and virtual transports.
pub mod targets;

/// External collaborator boundaries.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ClientId, FrameId, SessionId, TargetId, TargetSessionId};

// Loader types
pub use loader::{
    LoaderConfig, LoaderStatus, PageResource, ResourceContent, ResourceInitiator, ResourceLoader,
};

// Protocol types
pub use protocol::{Frame, HostSignal, RegistryEvent, TargetInfo, TargetKind};

// Routing types
pub use routing::{MessageRouter, RouterConfig, RouterStats, RoutingKey};

// Target types
pub use targets::{
    AttachHook, AttachState, ParallelConnection, ParallelConnectionFactory, Target, TargetRegistry,
};

// Transport traits
pub use transport::{HostNotifier, NetworkManager, RegistryObserver, SessionSink, TargetTransport};
