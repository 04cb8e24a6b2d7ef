//! Error types for the devtools routing core.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devtools_mux::{Result, Error};
//!
//! async fn example(loader: &ResourceLoader) -> Result<()> {
//!     let content = loader.load_resource(url, initiator, None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | [`Error::Transport`], [`Error::TransportClosed`], [`Error::Protocol`] |
//! | Targets | [`Error::AttachFailed`], [`Error::SessionNotFound`] |
//! | Loader | [`Error::LoadTimeout`], [`Error::LoadCanceled`], [`Error::LoadFailed`], [`Error::InvalidInitiator`] |
//! | External | [`Error::Json`], [`Error::Url`], [`Error::ChannelClosed`] |
//!
//! Routing and pooling paths never surface errors: unroutable frames and
//! backlog evictions are counted drops (see `RouterStats`), by design.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::{TargetId, TargetSessionId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Transport-level failure reported by the underlying connection.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The underlying physical connection is gone.
    #[error("Transport closed")]
    TransportClosed,

    /// Protocol violation or malformed payload.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Target Errors
    // ========================================================================
    /// The peer rejected an attach request.
    ///
    /// No partial session registration is left behind when this is returned.
    #[error("Attach to target {target_id} failed: {message}")]
    AttachFailed {
        /// The target that could not be attached.
        target_id: TargetId,
        /// Rejection reason from the peer.
        message: String,
    },

    /// No live session with this id exists.
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// The missing session id.
        session_id: TargetSessionId,
    },

    // ========================================================================
    // Loader Errors
    // ========================================================================
    /// A resource load exceeded the configured deadline.
    ///
    /// The underlying operation is abandoned, not actively canceled.
    #[error("load canceled due to timeout")]
    LoadTimeout {
        /// Resource that timed out.
        url: String,
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    /// A queued (not yet admitted) load was rejected by a top-frame
    /// navigation.
    #[error("canceled due to reload")]
    LoadCanceled {
        /// Resource whose queued admission was rejected.
        url: String,
    },

    /// A resource load failed in the fetch chain.
    ///
    /// When a target-path attempt failed before the generic fallback also
    /// failed, `message` is prefixed with the target-path failure reason.
    #[error("Failed to load {url}: {message}")]
    LoadFailed {
        /// Resource that failed to load.
        url: String,
        /// Final-stage error, possibly annotated with the earlier one.
        message: String,
    },

    /// A resource initiator carried neither a frame id nor a target.
    ///
    /// This is a programming error at the call site and fails fast.
    #[error("Invalid initiator")]
    InvalidInitiator,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an attach failed error.
    #[inline]
    pub fn attach_failed(target_id: TargetId, message: impl Into<String>) -> Self {
        Self::AttachFailed {
            target_id,
            message: message.into(),
        }
    }

    /// Creates a session not found error.
    #[inline]
    pub fn session_not_found(session_id: TargetSessionId) -> Self {
        Self::SessionNotFound { session_id }
    }

    /// Creates a load timeout error.
    #[inline]
    pub fn load_timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self::LoadTimeout {
            url: url.into(),
            timeout_ms,
        }
    }

    /// Creates a load canceled error.
    #[inline]
    pub fn load_canceled(url: impl Into<String>) -> Self {
        Self::LoadCanceled { url: url.into() }
    }

    /// Creates a load failed error.
    #[inline]
    pub fn load_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            url: url.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::LoadTimeout { .. })
    }

    /// Returns `true` if this is a cancellation (reload) error.
    #[inline]
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::LoadCanceled { .. })
    }

    /// Returns `true` if this is any loader error.
    #[inline]
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::LoadTimeout { .. }
                | Self::LoadCanceled { .. }
                | Self::LoadFailed { .. }
                | Self::InvalidInitiator
        )
    }

    /// Returns `true` if this is a transport error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::TransportClosed | Self::Protocol { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::transport("socket reset");
        assert_eq!(err.to_string(), "Transport error: socket reset");
    }

    #[test]
    fn test_load_timeout_message_is_fixed() {
        let err = Error::load_timeout("https://a.com/map.json", 5000);
        assert_eq!(err.to_string(), "load canceled due to timeout");
    }

    #[test]
    fn test_load_canceled_message_is_fixed() {
        let err = Error::load_canceled("https://a.com/map.json");
        assert_eq!(err.to_string(), "canceled due to reload");
    }

    #[test]
    fn test_invalid_initiator_message() {
        assert_eq!(Error::InvalidInitiator.to_string(), "Invalid initiator");
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::load_timeout("u", 1).is_timeout());
        assert!(!Error::load_canceled("u").is_timeout());
    }

    #[test]
    fn test_is_canceled() {
        assert!(Error::load_canceled("u").is_canceled());
        assert!(!Error::load_timeout("u", 1).is_canceled());
    }

    #[test]
    fn test_is_load_error() {
        assert!(Error::InvalidInitiator.is_load_error());
        assert!(Error::load_failed("u", "net down").is_load_error());
        assert!(!Error::TransportClosed.is_load_error());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::TransportClosed.is_transport_error());
        assert!(Error::protocol("bad frame").is_transport_error());
        assert!(!Error::InvalidInitiator.is_transport_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
