//! Resource tracking entries and initiators.
//!
//! Every load is tracked under a key derived from its URL and initiator
//! identity, with a tri-state outcome: `None` while the outcome is unknown,
//! then `Some(true)` / `Some(false)`. A new load for the same key overwrites
//! the tracking entry (last-write-wins for observability; concurrent
//! fetches are unaffected).

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::identifiers::{FrameId, TargetId};
use crate::targets::Target;

// ============================================================================
// ResourceContent
// ============================================================================

/// A successfully fetched resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceContent {
    /// The resource body.
    pub content: String,
}

impl ResourceContent {
    /// Creates resource content from a body.
    #[inline]
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Returns the body size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

// ============================================================================
// ResourceInitiator
// ============================================================================

/// Who asked for a resource: a frame, a target, or both.
///
/// At least one of `frame_id` / `target` must be present; an initiator with
/// neither cannot be keyed and fails fast.
#[derive(Clone, Default)]
pub struct ResourceInitiator {
    /// Frame the resource belongs to.
    pub frame_id: Option<FrameId>,

    /// Target whose network stack should attribute the load.
    pub target: Option<Arc<Target>>,

    /// URL of the document that referenced the resource.
    pub initiator_url: Option<String>,
}

impl ResourceInitiator {
    /// Creates a frame-bound initiator.
    #[must_use]
    pub fn for_frame(frame_id: FrameId) -> Self {
        Self {
            frame_id: Some(frame_id),
            ..Self::default()
        }
    }

    /// Creates a target-bound initiator.
    #[must_use]
    pub fn for_target(target: Arc<Target>) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    /// Sets the referencing document URL.
    #[must_use]
    pub fn with_initiator_url(mut self, url: impl Into<String>) -> Self {
        self.initiator_url = Some(url.into());
        self
    }
}

impl std::fmt::Debug for ResourceInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceInitiator")
            .field("frame_id", &self.frame_id)
            .field("target_id", &self.target.as_ref().map(|t| t.target_id()))
            .field("initiator_url", &self.initiator_url)
            .finish()
    }
}

// ============================================================================
// Resource Key
// ============================================================================

/// Derives the tracking key for a load: `"{url}-{frame_id}"` when the
/// initiator is frame-bound, else `"{url}-{target_id}"`.
///
/// # Errors
///
/// [`Error::InvalidInitiator`] when the initiator carries neither.
pub fn resource_key(url: &str, initiator: &ResourceInitiator) -> Result<String> {
    if let Some(frame_id) = &initiator.frame_id {
        return Ok(format!("{url}-{frame_id}"));
    }
    if let Some(target) = &initiator.target {
        return Ok(format!("{url}-{}", target.target_id()));
    }
    Err(Error::InvalidInitiator)
}

// ============================================================================
// PageResource
// ============================================================================

/// One outstanding or completed auxiliary load.
///
/// Retained in the loader's table until the next top-frame navigation
/// clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResource {
    /// Resource URL.
    pub url: String,

    /// Frame identity, for frame-bound initiators.
    pub frame_id: Option<FrameId>,

    /// Target identity, for target-bound initiators.
    pub target_id: Option<TargetId>,

    /// Referencing document URL.
    pub initiator_url: Option<String>,

    /// `None` while the outcome is not yet known.
    pub success: Option<bool>,

    /// Body size in bytes, once loaded.
    pub size: Option<u64>,

    /// Failure reason, once failed.
    pub error_message: Option<String>,
}

impl PageResource {
    /// Creates a pending entry for a starting load.
    #[must_use]
    pub fn pending(url: &str, initiator: &ResourceInitiator) -> Self {
        Self {
            url: url.to_string(),
            frame_id: initiator.frame_id.clone(),
            target_id: initiator.target.as_ref().map(|t| t.target_id()),
            initiator_url: initiator.initiator_url.clone(),
            success: None,
            size: None,
            error_message: None,
        }
    }

    /// Records a successful outcome.
    pub(crate) fn mark_loaded(&mut self, size: u64) {
        self.success = Some(true);
        self.size = Some(size);
        self.error_message = None;
    }

    /// Records a failed outcome.
    pub(crate) fn mark_failed(&mut self, message: String) {
        self.success = Some(false);
        self.error_message = Some(message);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::TargetSessionId;
    use crate::protocol::TargetInfo;
    use crate::targets::testing::MockTransport;

    fn target(target_id: &str) -> Arc<Target> {
        Target::new(
            TargetSessionId::new("S1"),
            "test".into(),
            TargetInfo {
                target_id: TargetId::new(target_id),
                target_type: "page".into(),
                title: String::new(),
                url: String::new(),
                attached: true,
            },
            MockTransport::with_own_id("ROOT"),
        )
    }

    #[test]
    fn test_key_for_frame_initiator() {
        let initiator = ResourceInitiator::for_frame(FrameId::new("F1"));
        let key = resource_key("https://a.com/map", &initiator).unwrap();
        assert_eq!(key, "https://a.com/map-F1");
    }

    #[test]
    fn test_key_for_target_initiator() {
        let initiator = ResourceInitiator::for_target(target("T1"));
        let key = resource_key("https://a.com/map", &initiator).unwrap();
        assert_eq!(key, "https://a.com/map-T1");
    }

    #[test]
    fn test_keys_distinct_for_same_url() {
        let by_frame =
            resource_key("https://a.com/map", &ResourceInitiator::for_frame(FrameId::new("F1")))
                .unwrap();
        let by_other_frame =
            resource_key("https://a.com/map", &ResourceInitiator::for_frame(FrameId::new("F2")))
                .unwrap();
        let by_target =
            resource_key("https://a.com/map", &ResourceInitiator::for_target(target("T9")))
                .unwrap();

        assert_ne!(by_frame, by_other_frame);
        assert_ne!(by_frame, by_target);
    }

    #[test]
    fn test_frame_wins_over_target() {
        let mut initiator = ResourceInitiator::for_target(target("T1"));
        initiator.frame_id = Some(FrameId::new("F1"));
        let key = resource_key("u", &initiator).unwrap();
        assert_eq!(key, "u-F1");
    }

    #[test]
    fn test_empty_initiator_fails_fast() {
        let err = resource_key("u", &ResourceInitiator::default()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid initiator");
    }

    #[test]
    fn test_pending_entry_tri_state() {
        let initiator = ResourceInitiator::for_frame(FrameId::new("F1"));
        let mut resource = PageResource::pending("u", &initiator);
        assert_eq!(resource.success, None);

        resource.mark_loaded(12);
        assert_eq!(resource.success, Some(true));
        assert_eq!(resource.size, Some(12));

        resource.mark_failed("boom".into());
        assert_eq!(resource.success, Some(false));
        assert_eq!(resource.error_message.as_deref(), Some("boom"));
    }
}
