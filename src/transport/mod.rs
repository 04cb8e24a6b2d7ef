//! External collaborator boundaries.
//!
//! The physical wire (device bridge, IPC channel, WebSocket) lives outside
//! this crate; the routing core talks to it through the traits defined here.
//! Hosts provide implementations, tests provide mocks.
//!
//! # Collaborators
//!
//! | Trait | Provided by | Consumed by |
//! |-------|-------------|-------------|
//! | [`TargetTransport`] | Host transport layer | Registry, parallel connections, loader |
//! | [`SessionSink`] | This crate ([`ParallelConnection`]) | Host session router |
//! | [`NetworkManager`] | Host network layer | Resource loader fallback |
//! | [`HostNotifier`] | Host window broadcast | Registry side-channel |
//! | [`RegistryObserver`] | UI consumers | Registry lifecycle events |
//!
//! [`ParallelConnection`]: crate::targets::ParallelConnection

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::identifiers::{FrameId, TargetId, TargetSessionId};
use crate::loader::ResourceContent;
use crate::protocol::{HostSignal, RegistryEvent};

// ============================================================================
// SessionSink
// ============================================================================

/// Receives inbound protocol messages addressed to one registered session.
///
/// Registered with the transport's session router by the parallel
/// connection factory, after (and only after) a successful attach.
pub trait SessionSink: Send + Sync {
    /// Delivers one protocol message tagged with the sink's session id.
    fn on_session_message(&self, message: Value);
}

// ============================================================================
// TargetTransport
// ============================================================================

/// The parent connection's protocol surface.
///
/// Wraps the target-domain calls this crate consumes but does not
/// reimplement: attach/detach negotiation, parent-id resolution, resume, and
/// target-scoped resource fetches, plus session-sink registration on the
/// underlying session router.
#[async_trait]
pub trait TargetTransport: Send + Sync {
    /// Attaches to a target, negotiating a fresh session id.
    ///
    /// `flatten` requests session-tagged frames on the parent channel
    /// instead of a nested protocol tunnel.
    async fn attach_to_target(&self, target_id: &TargetId, flatten: bool)
    -> Result<TargetSessionId>;

    /// Requests the peer detach the session.
    ///
    /// Detaching an already-dead session is a no-op at the peer.
    async fn detach_from_target(&self, session_id: &TargetSessionId) -> Result<()>;

    /// Resolves the parent connection's own target id.
    async fn get_target_info(&self) -> Result<TargetId>;

    /// Instructs a session's target to run past any debugger pause.
    async fn run_if_waiting_for_debugger(&self, session_id: &TargetSessionId) -> Result<()>;

    /// Fetches a resource through a specific target's own network stack.
    ///
    /// Either the session (target-bound initiator) or the frame id
    /// (frame-bound initiator) identifies whose network stack to use; the
    /// transport resolves frame ids itself.
    async fn fetch_via_target(
        &self,
        session_id: Option<&TargetSessionId>,
        frame_id: Option<&FrameId>,
        url: &Url,
    ) -> Result<ResourceContent>;

    /// Registers a sink for inbound frames tagged with a session id.
    fn register_session(&self, session_id: TargetSessionId, sink: Arc<dyn SessionSink>);

    /// Unregisters a session's sink.
    ///
    /// Unregistering an unknown session is a no-op.
    fn unregister_session(&self, session_id: &TargetSessionId);
}

// ============================================================================
// NetworkManager
// ============================================================================

/// Transport-level fetch not tied to any specific inspected page.
///
/// Final stage of the loader's fallback chain; also the shape of the
/// caller-supplied override fetcher.
#[async_trait]
pub trait NetworkManager: Send + Sync {
    /// Fetches a resource.
    async fn fetch(&self, url: &Url) -> Result<ResourceContent>;
}

// ============================================================================
// HostNotifier
// ============================================================================

/// Cross-window broadcast consumed by the host UI layer.
///
/// Observability side channel only; the core never depends on delivery.
pub trait HostNotifier: Send + Sync {
    /// Broadcasts one signal to the host window.
    fn notify(&self, signal: HostSignal);
}

// ============================================================================
// RegistryObserver
// ============================================================================

/// Receiver for target lifecycle notifications.
pub trait RegistryObserver: Send + Sync {
    /// Delivers one registry event.
    fn on_event(&self, event: RegistryEvent);
}
