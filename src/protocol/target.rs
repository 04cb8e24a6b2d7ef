//! Target descriptions and registry event types.
//!
//! [`TargetInfo`] is the peer's description of one debuggable execution
//! context. [`RegistryEvent`] is the tagged union of lifecycle notifications
//! the registry emits to its observer; [`HostSignal`] is the side-channel
//! broadcast consumed by the host window.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{TargetId, TargetSessionId};

// ============================================================================
// TargetKind
// ============================================================================

/// Classification of a target derived from the raw protocol type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A page or iframe context.
    Frame,
    /// A dedicated worker.
    Worker,
    /// A service worker.
    ServiceWorker,
    /// Anything else, including the browser-level target.
    Browser,
}

impl TargetKind {
    /// Classifies a raw protocol type string.
    ///
    /// `iframe` and `page` both map to [`TargetKind::Frame`]; unknown
    /// strings fall back to [`TargetKind::Browser`].
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        match raw {
            "iframe" | "page" => Self::Frame,
            "worker" => Self::Worker,
            "service_worker" => Self::ServiceWorker,
            _ => Self::Browser,
        }
    }
}

// ============================================================================
// TargetInfo
// ============================================================================

/// Protocol description of one debuggable execution context.
///
/// # Format
///
/// ```json
/// {
///   "targetId": "A1B2",
///   "type": "iframe",
///   "title": "Checkout",
///   "url": "https://shop.example/checkout",
///   "attached": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Peer-assigned target id.
    pub target_id: TargetId,

    /// Raw protocol type string (`page`, `iframe`, `worker`, ...).
    #[serde(rename = "type")]
    pub target_type: String,

    /// Human title, possibly empty.
    #[serde(default)]
    pub title: String,

    /// Context URL, possibly empty.
    #[serde(default)]
    pub url: String,

    /// Whether a debugger is currently attached.
    #[serde(default)]
    pub attached: bool,
}

impl TargetInfo {
    /// Returns the classified kind for this description.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        TargetKind::classify(&self.target_type)
    }
}

// ============================================================================
// RegistryEvent
// ============================================================================

/// Lifecycle notification emitted by the target registry.
///
/// One payload shape per tag; observers match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A target became known under the parent connection.
    TargetCreated(TargetInfo),

    /// A known target's description changed.
    TargetInfoChanged(TargetInfo),

    /// A target was destroyed and removed.
    TargetDestroyed(TargetId),

    /// The aggregate set of known targets changed.
    AvailableTargetsChanged(Vec<TargetInfo>),
}

// ============================================================================
// HostSignal
// ============================================================================

/// Side-channel event broadcast to the host window.
///
/// Observability signal only; nothing in the core depends on its delivery.
///
/// # Format
///
/// ```json
/// { "type": "target_attached", "sessionId": "S1" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostSignal {
    /// A session was attached under the parent connection.
    TargetAttached {
        /// The newly attached session.
        #[serde(rename = "sessionId")]
        session_id: TargetSessionId,
    },

    /// A session was detached.
    TargetDetached {
        /// The detached session.
        #[serde(rename = "sessionId")]
        session_id: TargetSessionId,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(TargetKind::classify("iframe"), TargetKind::Frame);
        assert_eq!(TargetKind::classify("page"), TargetKind::Frame);
        assert_eq!(TargetKind::classify("worker"), TargetKind::Worker);
        assert_eq!(
            TargetKind::classify("service_worker"),
            TargetKind::ServiceWorker
        );
        assert_eq!(TargetKind::classify("background_page"), TargetKind::Browser);
        assert_eq!(TargetKind::classify(""), TargetKind::Browser);
    }

    #[test]
    fn test_target_info_deserialization() {
        let info: TargetInfo = serde_json::from_str(
            r#"{ "targetId": "A1", "type": "iframe", "url": "https://a.com/x" }"#,
        )
        .unwrap();
        assert_eq!(info.target_id, TargetId::new("A1"));
        assert_eq!(info.kind(), TargetKind::Frame);
        assert_eq!(info.title, "");
        assert!(!info.attached);
    }

    #[test]
    fn test_host_signal_wire_shape() {
        let signal = HostSignal::TargetAttached {
            session_id: TargetSessionId::new("S1"),
        };
        let json = serde_json::to_string(&signal).unwrap();
        assert_eq!(json, r#"{"type":"target_attached","sessionId":"S1"}"#);
    }
}
