//! Attached target entity.
//!
//! A [`Target`] is one live attach session to a debuggable execution
//! context. It is keyed by its session id, not its target id: the same
//! underlying context can be attached and detached repeatedly, and each
//! cycle produces a distinct entity.
//!
//! # Attach State Machine
//!
//! ```text
//! Attaching ──► WaitingForHook ──► Running ──► Detached
//!     │                              ▲
//!     └──────────────────────────────┘
//!          (no attach hook installed)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::identifiers::{TargetId, TargetSessionId};
use crate::protocol::{TargetInfo, TargetKind};
use crate::transport::TargetTransport;

// ============================================================================
// AttachState
// ============================================================================

/// Lifecycle state of an attached target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    /// Attach observed, not yet resumed.
    Attaching,
    /// Attach hook task in flight; resume deferred until it completes.
    WaitingForHook,
    /// Resumed and running.
    Running,
    /// Detached; terminal.
    Detached,
}

// ============================================================================
// Target
// ============================================================================

/// One attached debuggable execution context.
///
/// Exclusively owned by the registry of its parent connection.
pub struct Target {
    /// Peer-assigned session id for this attach cycle.
    session_id: TargetSessionId,

    /// Derived human-readable name.
    name: String,

    /// Classified kind, fixed at attach time.
    kind: TargetKind,

    /// Live protocol description, updated on info-changed events.
    info: Mutex<TargetInfo>,

    /// Attach lifecycle state.
    state: Mutex<AttachState>,

    /// Parent connection's protocol surface.
    transport: Arc<dyn TargetTransport>,
}

impl Target {
    /// Creates a target in the `Attaching` state.
    pub(crate) fn new(
        session_id: TargetSessionId,
        name: String,
        info: TargetInfo,
        transport: Arc<dyn TargetTransport>,
    ) -> Arc<Self> {
        let kind = info.kind();
        Arc::new(Self {
            session_id,
            name,
            kind,
            info: Mutex::new(info),
            state: Mutex::new(AttachState::Attaching),
            transport,
        })
    }

    /// Returns the session id of this attach cycle.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &TargetSessionId {
        &self.session_id
    }

    /// Returns the peer-assigned target id.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> TargetId {
        self.info.lock().target_id.clone()
    }

    /// Returns the derived name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the classified kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Returns a snapshot of the current protocol description.
    #[must_use]
    pub fn info(&self) -> TargetInfo {
        self.info.lock().clone()
    }

    /// Returns the current attach state.
    #[must_use]
    pub fn state(&self) -> AttachState {
        *self.state.lock()
    }

    /// Replaces the stored protocol description.
    pub(crate) fn update_info(&self, info: TargetInfo) {
        *self.info.lock() = info;
    }

    /// Marks the target as waiting on the attach hook.
    pub(crate) fn mark_waiting_for_hook(&self) {
        *self.state.lock() = AttachState::WaitingForHook;
    }

    /// Instructs the target to run past any debugger pause.
    ///
    /// Transitions to `Running`. A no-op at the peer when the target was
    /// not paused.
    pub(crate) async fn resume(&self) -> Result<()> {
        self.transport
            .run_if_waiting_for_debugger(&self.session_id)
            .await?;
        *self.state.lock() = AttachState::Running;
        debug!(session_id = %self.session_id, name = %self.name, "Target resumed");
        Ok(())
    }

    /// Disposes the target locally.
    ///
    /// The session is already gone at the peer; this only records the
    /// terminal state.
    pub(crate) fn dispose(&self, reason: &str) {
        *self.state.lock() = AttachState::Detached;
        debug!(session_id = %self.session_id, reason, "Target disposed");
    }
}

// ============================================================================
// Name Derivation
// ============================================================================

/// Derives a human name from a target description.
///
/// Title wins; otherwise the URL's last non-empty path segment; `None` when
/// neither yields anything usable (the registry then falls back to an
/// anonymous counter).
#[must_use]
pub(crate) fn name_from_info(info: &TargetInfo) -> Option<String> {
    let title = info.title.trim();
    if !title.is_empty() {
        return Some(title.to_string());
    }

    let url = Url::parse(&info.url).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn info(title: &str, url: &str) -> TargetInfo {
        TargetInfo {
            target_id: TargetId::new("T1"),
            target_type: "iframe".into(),
            title: title.into(),
            url: url.into(),
            attached: true,
        }
    }

    #[test]
    fn test_name_from_title() {
        assert_eq!(
            name_from_info(&info("Checkout", "https://a.com/x")),
            Some("Checkout".into())
        );
    }

    #[test]
    fn test_name_from_url_last_segment() {
        assert_eq!(
            name_from_info(&info("", "https://a.com/x")),
            Some("x".into())
        );
        assert_eq!(
            name_from_info(&info("  ", "https://a.com/assets/app.js")),
            Some("app.js".into())
        );
        // Trailing slash leaves the last non-empty segment.
        assert_eq!(
            name_from_info(&info("", "https://a.com/deep/path/")),
            Some("path".into())
        );
    }

    #[test]
    fn test_name_unavailable() {
        assert_eq!(name_from_info(&info("", "https://a.com/")), None);
        assert_eq!(name_from_info(&info("", "not a url")), None);
        assert_eq!(name_from_info(&info("", "")), None);
    }
}
