//! Parallel connections: virtual transports multiplexed over one socket.
//!
//! A [`ParallelConnection`] gives a consumer an independent read/write
//! channel to one child target without seeing any other session's traffic.
//! The factory negotiates a fresh session id for the parent's own resolved
//! target id, registers the connection as that session's sink, and hands it
//! out.
//!
//! At most one parallel connection exists per live session; teardown
//! (caller-initiated or peer-initiated) runs exactly once even when both
//! paths race.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::{TargetId, TargetSessionId};
use crate::transport::{SessionSink, TargetTransport};

// ============================================================================
// Types
// ============================================================================

/// Callback for inbound messages on a parallel connection.
pub type MessageCallback = Box<dyn Fn(Value) + Send + Sync>;

/// Callback fired once when the connection is torn down.
pub type DisconnectCallback = Box<dyn FnOnce() + Send>;

// ============================================================================
// ParallelConnection
// ============================================================================

/// Callback and buffer state behind one lock.
struct ConnectionState {
    /// Live delivery callback, absent until the consumer wires it.
    on_message: Option<MessageCallback>,
    /// Messages received before the callback was wired.
    pending: Vec<Value>,
    /// Teardown notification.
    on_disconnect: Option<DisconnectCallback>,
}

/// A virtual transport bound to one session.
///
/// Messages arriving before [`set_on_message`] is called are buffered and
/// flushed, in order, when the consumer wires its callback; the caller
/// controls when backpressure begins.
///
/// [`set_on_message`]: ParallelConnection::set_on_message
pub struct ParallelConnection {
    /// The session this connection is bound to.
    session_id: TargetSessionId,

    /// Parent connection's protocol surface.
    transport: Arc<dyn TargetTransport>,

    /// Callback and pre-wire buffer.
    state: Mutex<ConnectionState>,

    /// Set once by whichever teardown path runs first.
    closed: AtomicBool,
}

impl ParallelConnection {
    /// Creates a connection bound to a freshly negotiated session.
    pub(crate) fn new(session_id: TargetSessionId, transport: Arc<dyn TargetTransport>) -> Self {
        Self {
            session_id,
            transport,
            state: Mutex::new(ConnectionState {
                on_message: None,
                pending: Vec::new(),
                on_disconnect: None,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the session this connection is bound to.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &TargetSessionId {
        &self.session_id
    }

    /// Returns `true` once the connection has been torn down.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wires the message callback and flushes any buffered messages.
    ///
    /// Buffered messages are delivered in arrival order before live
    /// delivery begins.
    pub fn set_on_message(&self, callback: MessageCallback) {
        let mut state = self.state.lock();
        for message in state.pending.drain(..) {
            callback(message);
        }
        state.on_message = Some(callback);
    }

    /// Sets the teardown notification callback.
    pub fn set_on_disconnect(&self, callback: DisconnectCallback) {
        self.state.lock().on_disconnect = Some(callback);
    }

    /// Tears the connection down.
    ///
    /// Unregisters the session from the underlying router synchronously,
    /// then requests the peer detach. Runs at most once; later calls (and
    /// the peer-initiated path) are no-ops.
    pub async fn disconnect(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.transport.unregister_session(&self.session_id);
        self.fire_disconnect();

        debug!(session_id = %self.session_id, "Parallel connection disconnecting");
        self.transport.detach_from_target(&self.session_id).await
    }

    /// Peer-initiated teardown: the detach was already observed, so only
    /// local unregistration remains.
    pub(crate) fn on_peer_detached(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.transport.unregister_session(&self.session_id);
        self.fire_disconnect();
        debug!(session_id = %self.session_id, "Parallel connection dropped by peer");
    }

    /// Fires the disconnect callback, at most once.
    fn fire_disconnect(&self) {
        let callback = self.state.lock().on_disconnect.take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl SessionSink for ParallelConnection {
    fn on_session_message(&self, message: Value) {
        let mut state = self.state.lock();
        match &state.on_message {
            Some(callback) => callback(message),
            None => {
                trace!(session_id = %self.session_id, "Buffered pre-wire message");
                state.pending.push(message);
            }
        }
    }
}

// ============================================================================
// ParallelConnectionFactory
// ============================================================================

/// Produces parallel connections over one parent connection.
///
/// The parent's real target id (not the logical "main" alias) is resolved
/// once and cached; negotiation failures reject creation with no partial
/// session registration left behind.
pub struct ParallelConnectionFactory {
    /// Parent connection's protocol surface.
    transport: Arc<dyn TargetTransport>,

    /// Lazily resolved parent target id.
    root_target_id: OnceCell<TargetId>,
}

impl ParallelConnectionFactory {
    /// Creates a factory over a parent connection.
    #[must_use]
    pub fn new(transport: Arc<dyn TargetTransport>) -> Self {
        Self {
            transport,
            root_target_id: OnceCell::new(),
        }
    }

    /// Resolves the parent's own target id, caching the first success.
    ///
    /// Failures are not cached; the next call retries.
    pub async fn resolve_root_target_id(&self) -> Result<&TargetId> {
        self.root_target_id
            .get_or_try_init(|| self.transport.get_target_info())
            .await
    }

    /// Creates a new parallel connection.
    ///
    /// Attaches to the parent's resolved target id with flattening enabled,
    /// then registers the connection as the new session's sink. The
    /// returned connection delivers no message until the consumer calls
    /// [`ParallelConnection::set_on_message`].
    ///
    /// # Errors
    ///
    /// [`Error::AttachFailed`] (or a transport error) if the peer rejects
    /// the attach; nothing is registered in that case.
    ///
    /// [`Error::AttachFailed`]: crate::Error::AttachFailed
    pub async fn create(&self) -> Result<Arc<ParallelConnection>> {
        let target_id = self.resolve_root_target_id().await?.clone();
        let session_id = self.transport.attach_to_target(&target_id, true).await?;

        debug!(target_id = %target_id, session_id = %session_id, "Parallel connection attached");

        let connection = Arc::new(ParallelConnection::new(
            session_id.clone(),
            Arc::clone(&self.transport),
        ));
        self.transport
            .register_session(session_id, Arc::clone(&connection) as Arc<dyn SessionSink>);

        Ok(connection)
    }
}

// ============================================================================
// Tests
// ============================================================================
