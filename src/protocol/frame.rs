//! Inbound frame envelope.
//!
//! Every message arriving from the device bridge is wrapped in a thin
//! envelope carrying a kind tag and an opaque payload. The payload's
//! `client_id` / `session_id` fields address the frame to one routing key;
//! frames without both fields cannot be routed and are dropped by the
//! dispatcher.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{ClientId, SessionId};

// ============================================================================
// Frame
// ============================================================================

/// One inbound protocol frame from the device bridge.
///
/// # Format
///
/// ```json
/// {
///   "type": "cdp-event",
///   "data": { "client_id": 1, "session_id": 4, "params": { ... } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame kind tag (e.g. `"cdp-event"`).
    #[serde(rename = "type")]
    pub kind: String,

    /// Frame-specific payload, including the addressing fields.
    pub data: Value,
}

impl Frame {
    /// Creates a new frame.
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Returns the client id from the payload, if present.
    #[inline]
    #[must_use]
    pub fn client_id(&self) -> Option<ClientId> {
        self.get_u32("client_id").map(ClientId::new)
    }

    /// Returns the session id from the payload, if present.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.get_u32("session_id").map(SessionId::new)
    }

    /// Returns a numeric payload field as `u32`.
    #[must_use]
    fn get_u32(&self, field: &str) -> Option<u32> {
        self.data
            .get(field)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_addressing_fields() {
        let frame = Frame::new("cdp-event", json!({ "client_id": 2, "session_id": 9 }));
        assert_eq!(frame.client_id(), Some(ClientId::new(2)));
        assert_eq!(frame.session_id(), Some(SessionId::new(9)));
    }

    #[test]
    fn test_frame_missing_fields() {
        let frame = Frame::new("cdp-event", json!({ "client_id": 2 }));
        assert_eq!(frame.session_id(), None);

        let frame = Frame::new("cdp-event", json!({}));
        assert_eq!(frame.client_id(), None);
    }

    #[test]
    fn test_frame_non_numeric_id_ignored() {
        let frame = Frame::new("cdp-event", json!({ "client_id": "2", "session_id": 1 }));
        assert_eq!(frame.client_id(), None);
    }

    #[test]
    fn test_frame_deserialization() {
        let frame: Frame = serde_json::from_str(
            r#"{ "type": "cdp-event", "data": { "client_id": 1, "session_id": 4 } }"#,
        )
        .unwrap();
        assert_eq!(frame.kind, "cdp-event");
        assert_eq!(frame.client_id(), Some(ClientId::new(1)));
    }
}
