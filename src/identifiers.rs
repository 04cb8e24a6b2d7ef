//! Type-safe identifiers for routing and protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//! Two id families exist and must never be confused:
//!
//! | Family | Types | Assigned by |
//! |--------|-------|-------------|
//! | Routing | [`ClientId`], [`SessionId`] | the shell, numeric, per UI surface |
//! | Protocol | [`TargetId`], [`TargetSessionId`], [`FrameId`] | the remote peer, opaque strings |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ClientId
// ============================================================================

/// Identifies one UI consumer (inspector iframe, renderer plugin).
///
/// Assigned by the shell when the consumer surface is created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ClientId(u32);

impl ClientId {
    /// Creates a client id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Identifies one debug session slot within a client, as addressed by the
/// message router.
///
/// This is the shell-assigned numeric half of a [`RoutingKey`]; it is not
/// the peer-assigned [`TargetSessionId`].
///
/// [`RoutingKey`]: crate::routing::RoutingKey
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SessionId(u32);

impl SessionId {
    /// Creates a session id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// ============================================================================
// TargetId
// ============================================================================

/// Identifies one debuggable execution context, assigned by the remote peer.
///
/// Stable across attach/detach cycles of the same underlying target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a target id from a raw protocol string.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw string value.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TargetSessionId
// ============================================================================

/// Identifies one negotiated attach session to a target.
///
/// Assigned by the remote peer at attach time; unique per attach, so two
/// attach cycles for the same [`TargetId`] never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TargetSessionId(String);

impl TargetSessionId {
    /// Creates a target session id from a raw protocol string.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw string value.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// FrameId
// ============================================================================

/// Identifies one frame within an inspected page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    /// Creates a frame id from a raw protocol string.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw string value.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_display() {
        assert_eq!(ClientId::new(3).to_string(), "client-3");
        assert_eq!(SessionId::new(7).to_string(), "session-7");
    }

    #[test]
    fn test_string_ids_distinct_types() {
        let target = TargetId::new("T1");
        let session = TargetSessionId::new("T1");
        assert_eq!(target.as_str(), session.as_str());
        // Same raw value, different types; only raw comparison is possible.
    }

    #[test]
    fn test_serde_transparent() {
        let id: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(id, SessionId::new(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let tid: TargetId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(tid.as_str(), "abc");
    }
}
