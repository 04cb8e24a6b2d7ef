//! Target lifecycle and virtual transports.
//!
//! One parent connection exposes many debuggable contexts (pages, iframes,
//! workers). This module tracks them, classifies them, and hands consumers
//! independent session-bound channels to individual targets.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              TargetRegistry                   │
//! │  known:    targetId  → TargetInfo             │
//! │  attached: sessionId → Target                 │
//! │  parallel: sessionId → ParallelConnection     │
//! └──────────────────────┬────────────────────────┘
//!                        │ attach / detach / resume
//!                        ▼
//!              TargetTransport (host)
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `target` | Attached target entity and state machine |
//! | `registry` | Lifecycle event handling and bookkeeping |
//! | `parallel` | Parallel connections and their factory |

// ============================================================================
// Submodules
// ============================================================================

/// Attached target entity.
pub mod target;

/// Target registry.
pub mod registry;

/// Parallel connections.
pub mod parallel;

// ============================================================================
// Re-exports
// ============================================================================

pub use parallel::{
    DisconnectCallback, MessageCallback, ParallelConnection, ParallelConnectionFactory,
};
pub use registry::{AttachHook, HookTask, TargetRegistry};
pub use target::{AttachState, Target};

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! Shared in-test collaborators.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;
    use url::Url;

    use crate::error::{Error, Result};
    use crate::identifiers::{FrameId, TargetId, TargetSessionId};
    use crate::loader::ResourceContent;
    use crate::protocol::{HostSignal, RegistryEvent};
    use crate::transport::{
        HostNotifier, RegistryObserver, SessionSink, TargetTransport,
    };

    /// Scripted transport recording every protocol call.
    pub(crate) struct MockTransport {
        /// Parent's own target id; `None` makes resolution fail.
        pub own_id: Mutex<Option<TargetId>>,
        /// Number of `get_target_info` calls observed.
        pub get_info_calls: AtomicUsize,
        /// Session id counter.
        pub next_session: AtomicUsize,
        /// When set, the next attach is rejected.
        pub fail_attach: AtomicBool,
        /// Recorded attach requests.
        pub attaches: Mutex<Vec<(TargetId, bool)>>,
        /// Recorded detach requests.
        pub detaches: Mutex<Vec<TargetSessionId>>,
        /// Recorded resume requests.
        pub resumed: Mutex<Vec<TargetSessionId>>,
        /// Registered session sinks.
        pub sinks: Mutex<FxHashMap<TargetSessionId, Arc<dyn SessionSink>>>,
        /// Scripted `fetch_via_target` outcome; `None` means unavailable.
        pub via_target: Mutex<Option<std::result::Result<String, String>>>,
        /// Recorded `fetch_via_target` calls.
        pub via_target_calls: AtomicUsize,
    }

    impl MockTransport {
        pub(crate) fn with_own_id(id: &str) -> Arc<Self> {
            let transport = Self::unresolvable();
            transport.set_own_id(id);
            transport
        }

        pub(crate) fn unresolvable() -> Arc<Self> {
            Arc::new(Self {
                own_id: Mutex::new(None),
                get_info_calls: AtomicUsize::new(0),
                next_session: AtomicUsize::new(0),
                fail_attach: AtomicBool::new(false),
                attaches: Mutex::new(Vec::new()),
                detaches: Mutex::new(Vec::new()),
                resumed: Mutex::new(Vec::new()),
                sinks: Mutex::new(FxHashMap::default()),
                via_target: Mutex::new(None),
                via_target_calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn set_own_id(&self, id: &str) {
            *self.own_id.lock() = Some(TargetId::new(id));
        }

        pub(crate) fn fail_next_attach(&self) {
            self.fail_attach.store(true, Ordering::SeqCst);
        }

        pub(crate) fn set_via_target(&self, result: std::result::Result<String, String>) {
            *self.via_target.lock() = Some(result);
        }
    }

    #[async_trait]
    impl TargetTransport for MockTransport {
        async fn attach_to_target(
            &self,
            target_id: &TargetId,
            flatten: bool,
        ) -> Result<TargetSessionId> {
            if self.fail_attach.swap(false, Ordering::SeqCst) {
                return Err(Error::attach_failed(target_id.clone(), "rejected by peer"));
            }
            self.attaches.lock().push((target_id.clone(), flatten));
            let n = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TargetSessionId::new(format!("PS{n}")))
        }

        async fn detach_from_target(&self, session_id: &TargetSessionId) -> Result<()> {
            self.detaches.lock().push(session_id.clone());
            Ok(())
        }

        async fn get_target_info(&self) -> Result<TargetId> {
            self.get_info_calls.fetch_add(1, Ordering::SeqCst);
            self.own_id
                .lock()
                .clone()
                .ok_or_else(|| Error::transport("target info unavailable"))
        }

        async fn run_if_waiting_for_debugger(&self, session_id: &TargetSessionId) -> Result<()> {
            self.resumed.lock().push(session_id.clone());
            Ok(())
        }

        async fn fetch_via_target(
            &self,
            _session_id: Option<&TargetSessionId>,
            _frame_id: Option<&FrameId>,
            _url: &Url,
        ) -> Result<ResourceContent> {
            self.via_target_calls.fetch_add(1, Ordering::SeqCst);
            match self.via_target.lock().clone() {
                Some(Ok(content)) => Ok(ResourceContent::new(content)),
                Some(Err(message)) => Err(Error::transport(message)),
                None => Err(Error::transport("target path unavailable")),
            }
        }

        fn register_session(&self, session_id: TargetSessionId, sink: Arc<dyn SessionSink>) {
            self.sinks.lock().insert(session_id, sink);
        }

        fn unregister_session(&self, session_id: &TargetSessionId) {
            self.sinks.lock().remove(session_id);
        }
    }

    /// Observer recording every registry event.
    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        pub events: Mutex<Vec<RegistryEvent>>,
    }

    impl RegistryObserver for RecordingObserver {
        fn on_event(&self, event: RegistryEvent) {
            self.events.lock().push(event);
        }
    }

    /// Notifier recording every host signal.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub signals: Mutex<Vec<HostSignal>>,
    }

    impl HostNotifier for RecordingNotifier {
        fn notify(&self, signal: HostSignal) {
            self.signals.lock().push(signal);
        }
    }
}
