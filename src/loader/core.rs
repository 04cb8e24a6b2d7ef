//! Bounded resource loader.
//!
//! Fetches auxiliary resources referenced by protocol activity (source
//! maps, scripts) under concurrency admission control, with a hard timeout
//! and a layered fallback chain:
//!
//! 1. caller-supplied override fetcher (fully replaces the chain);
//! 2. the initiating target's own network stack, for http/https when
//!    enabled (keeps attribution consistent with the inspected page);
//! 3. the generic network manager.
//!
//! When step 2 was attempted and failed, the step-3 error is prefixed with
//! the step-2 failure reason, so callers can tell "target load failed,
//! fallback also failed" from a plain failure.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::loader::resource::{PageResource, ResourceContent, ResourceInitiator, resource_key};
use crate::loader::semaphore::FifoSemaphore;
use crate::transport::{NetworkManager, TargetTransport};

// ============================================================================
// Constants
// ============================================================================

/// Default cap on concurrently running loads.
pub const DEFAULT_MAX_CONCURRENT_LOADS: usize = 500;

/// Default per-load deadline.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// LoaderConfig
// ============================================================================

/// Resource loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Loads admitted concurrently before callers queue.
    pub max_concurrent_loads: usize,

    /// Deadline for one admitted load.
    pub load_timeout: Duration,

    /// Whether to attempt loads through the initiating target's network
    /// stack before the generic fallback.
    pub load_through_target: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: DEFAULT_MAX_CONCURRENT_LOADS,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            load_through_target: true,
        }
    }
}

impl LoaderConfig {
    /// Creates the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the concurrent load cap.
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_loads(mut self, max: usize) -> Self {
        self.max_concurrent_loads = max;
        self
    }

    /// Sets the per-load deadline.
    #[inline]
    #[must_use]
    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    /// Enables or disables the target-path load stage.
    #[inline]
    #[must_use]
    pub fn with_load_through_target(mut self, enabled: bool) -> Self {
        self.load_through_target = enabled;
        self
    }
}

// ============================================================================
// LoaderStatus
// ============================================================================

/// Observability snapshot of the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoaderStatus {
    /// Admitted and running loads.
    pub loading: usize,
    /// Loads waiting for an admission slot.
    pub queued: usize,
    /// Entries in the resource table, completed ones included.
    pub resources: usize,
}

// ============================================================================
// ResourceLoader
// ============================================================================

/// Concurrency-admission-controlled, timeout-enforced resource loader.
///
/// Construct once per shell context and inject into consumers.
pub struct ResourceLoader {
    config: LoaderConfig,

    /// Admission gate.
    semaphore: Arc<FifoSemaphore>,

    /// Parent connection, for target-path loads.
    transport: Arc<dyn TargetTransport>,

    /// Generic transport-level fetch, the final fallback stage.
    network: Arc<dyn NetworkManager>,

    /// When present, fully replaces the fallback chain (offline/mocked
    /// environments).
    override_fetcher: Option<Arc<dyn NetworkManager>>,

    /// Tracked loads, keyed by [`resource_key`]. Cleared on top-frame
    /// navigation.
    resources: Mutex<FxHashMap<String, PageResource>>,
}

impl ResourceLoader {
    /// Creates a loader over a parent connection and a network manager.
    #[must_use]
    pub fn new(
        config: LoaderConfig,
        transport: Arc<dyn TargetTransport>,
        network: Arc<dyn NetworkManager>,
    ) -> Self {
        Self {
            semaphore: FifoSemaphore::new(config.max_concurrent_loads),
            config,
            transport,
            network,
            override_fetcher: None,
            resources: Mutex::new(FxHashMap::default()),
        }
    }

    /// Installs an override fetcher that replaces the whole fallback chain.
    #[must_use]
    pub fn with_override(mut self, fetcher: Arc<dyn NetworkManager>) -> Self {
        self.override_fetcher = Some(fetcher);
        self
    }

    /// Loads one auxiliary resource.
    ///
    /// Suspends when the concurrency cap is reached, in FIFO order behind
    /// earlier waiters. The admitted load races the configured deadline;
    /// on expiry the underlying operation is abandoned (not aborted) and
    /// the load fails with the timeout error.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInitiator`] when `initiator` has neither frame nor
    ///   target.
    /// - [`Error::LoadCanceled`] when a navigation rejected the queued
    ///   admission.
    /// - [`Error::LoadTimeout`] on deadline expiry.
    /// - [`Error::LoadFailed`] when every chain stage failed.
    pub async fn load_resource(
        &self,
        url: &str,
        initiator: ResourceInitiator,
        file_name: Option<&str>,
    ) -> Result<ResourceContent> {
        let key = resource_key(url, &initiator)?;
        self.resources
            .lock()
            .insert(key.clone(), PageResource::pending(url, &initiator));

        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| Error::load_canceled(url))?;

        let timeout_ms = self.config.load_timeout.as_millis() as u64;
        let outcome = match timeout(self.config.load_timeout, self.dispatch(url, &initiator)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::load_timeout(url, timeout_ms)),
        };
        drop(permit);

        // A table cleared by navigation discards this result; only a
        // surviving entry is updated.
        {
            let mut resources = self.resources.lock();
            if let Some(entry) = resources.get_mut(&key) {
                match &outcome {
                    Ok(content) => entry.mark_loaded(content.size()),
                    Err(error) => entry.mark_failed(error.to_string()),
                }
            }
        }

        if let Err(error) = &outcome {
            warn!(url, file_name = ?file_name, error = %error, "Resource load failed");
        }
        outcome
    }

    /// Runs the fallback chain for one admitted load.
    async fn dispatch(&self, url: &str, initiator: &ResourceInitiator) -> Result<ResourceContent> {
        let parsed = Url::parse(url)?;

        if let Some(fetcher) = &self.override_fetcher {
            return fetcher.fetch(&parsed).await;
        }

        let mut target_failure = None;
        if self.config.load_through_target
            && matches!(parsed.scheme(), "http" | "https")
            && (initiator.target.is_some() || initiator.frame_id.is_some())
        {
            let session_id = initiator.target.as_ref().map(|target| target.session_id());
            match self
                .transport
                .fetch_via_target(session_id, initiator.frame_id.as_ref(), &parsed)
                .await
            {
                Ok(content) => return Ok(content),
                Err(error) => {
                    debug!(url, error = %error, "Target-path load failed, falling back");
                    target_failure = Some(error.to_string());
                }
            }
        }

        match self.network.fetch(&parsed).await {
            Ok(content) => Ok(content),
            Err(error) => {
                let message = match target_failure {
                    Some(reason) => format!("{reason}; {error}"),
                    None => error.to_string(),
                };
                Err(Error::load_failed(url, message))
            }
        }
    }

    /// Handles a top-frame navigation.
    ///
    /// Rejects every queued (not yet admitted) load and clears the resource
    /// table. Admitted loads are not aborted; they complete or time out
    /// normally, release their slots, and have their results discarded.
    pub fn on_top_frame_navigated(&self) {
        let canceled = self.semaphore.cancel_queued();
        self.resources.lock().clear();
        debug!(canceled, "Top-frame navigation cleared loader state");
    }

    /// Returns the observability snapshot.
    #[must_use]
    pub fn status(&self) -> LoaderStatus {
        LoaderStatus {
            loading: self.semaphore.running(),
            queued: self.semaphore.queued(),
            resources: self.resources.lock().len(),
        }
    }

    /// Returns a snapshot of every tracked resource.
    #[must_use]
    pub fn resources_loaded(&self) -> Vec<PageResource> {
        self.resources.lock().values().cloned().collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
