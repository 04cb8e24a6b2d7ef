//! Target registry.
//!
//! Tracks the set of known targets under one parent connection and
//! broadcasts lifecycle changes. Attached targets are keyed by session id,
//! never target id: repeated attach/detach cycles for one underlying target
//! must not collide.
//!
//! The registry also owns the parent's parallel connections, so a
//! `detachedFromTarget` event can tell a solicited detach (our own parallel
//! connection going away) apart from a terminated target.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::identifiers::{TargetId, TargetSessionId};
use crate::protocol::{HostSignal, RegistryEvent, TargetInfo};
use crate::targets::parallel::{ParallelConnection, ParallelConnectionFactory};
use crate::targets::target::{Target, name_from_info};
use crate::transport::{HostNotifier, RegistryObserver, TargetTransport};

// ============================================================================
// AttachHook
// ============================================================================

/// Task returned by an attach hook; the target resumes after it completes.
pub type HookTask = BoxFuture<'static, Result<()>>;

/// Two-phase attach extension point.
///
/// When installed, newly attached targets enter the `WaitingForHook` state
/// until the hook's task completes, and only then are resumed past any
/// debugger pause.
pub trait AttachHook: Send + Sync {
    /// Called for each newly attached target.
    fn on_attach(&self, target: &Arc<Target>) -> HookTask;
}

// ============================================================================
// TargetRegistry
// ============================================================================

/// The set of known and attached targets under one parent connection.
///
/// Construct once per parent connection and inject into consumers;
/// independent instances are fully isolated.
pub struct TargetRegistry {
    /// Parent connection's protocol surface.
    transport: Arc<dyn TargetTransport>,

    /// Parallel connection factory (owns the cached parent target id).
    factory: ParallelConnectionFactory,

    /// Lifecycle event receiver.
    observer: Option<Arc<dyn RegistryObserver>>,

    /// Host window side channel.
    notifier: Option<Arc<dyn HostNotifier>>,

    /// Optional two-phase attach extension.
    attach_hook: Option<Arc<dyn AttachHook>>,

    /// Known targets by target id (attached or not).
    known: Mutex<FxHashMap<TargetId, TargetInfo>>,

    /// Attached targets by session id.
    attached: Mutex<FxHashMap<TargetSessionId, Arc<Target>>>,

    /// Live parallel connections by session id.
    parallel: Mutex<FxHashMap<TargetSessionId, Arc<ParallelConnection>>>,

    /// Counter for anonymous target names.
    anonymous_counter: AtomicUsize,
}

// ============================================================================
// TargetRegistry - Construction
// ============================================================================

impl TargetRegistry {
    /// Creates a registry over a parent connection.
    #[must_use]
    pub fn new(transport: Arc<dyn TargetTransport>) -> Self {
        Self {
            factory: ParallelConnectionFactory::new(Arc::clone(&transport)),
            transport,
            observer: None,
            notifier: None,
            attach_hook: None,
            known: Mutex::new(FxHashMap::default()),
            attached: Mutex::new(FxHashMap::default()),
            parallel: Mutex::new(FxHashMap::default()),
            anonymous_counter: AtomicUsize::new(0),
        }
    }

    /// Installs the lifecycle event receiver.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RegistryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Installs the host window side channel.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn HostNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Installs the two-phase attach hook.
    #[must_use]
    pub fn with_attach_hook(mut self, hook: Arc<dyn AttachHook>) -> Self {
        self.attach_hook = Some(hook);
        self
    }
}

// ============================================================================
// TargetRegistry - Lifecycle Events
// ============================================================================

impl TargetRegistry {
    /// Handles a `targetCreated` event.
    ///
    /// Inserts or overwrites the known target by id, then recomputes and
    /// emits the available-targets aggregate.
    pub fn on_target_created(&self, info: TargetInfo) {
        self.known.lock().insert(info.target_id.clone(), info.clone());
        debug!(target_id = %info.target_id, kind = %info.target_type, "Target created");

        self.emit(RegistryEvent::TargetCreated(info));
        self.emit(RegistryEvent::AvailableTargetsChanged(
            self.available_targets(),
        ));
    }

    /// Handles a `targetInfoChanged` event.
    ///
    /// Overwrites the stored description and pushes the update into the
    /// attached target object for this id, when one exists.
    pub fn on_target_info_changed(&self, info: TargetInfo) {
        self.known.lock().insert(info.target_id.clone(), info.clone());

        let attached = self.attached.lock();
        if let Some(target) = attached
            .values()
            .find(|target| target.target_id() == info.target_id)
        {
            target.update_info(info.clone());
        }
        drop(attached);

        self.emit(RegistryEvent::TargetInfoChanged(info));
    }

    /// Handles a `targetDestroyed` event.
    pub fn on_target_destroyed(&self, target_id: TargetId) {
        self.known.lock().remove(&target_id);
        debug!(target_id = %target_id, "Target destroyed");

        self.emit(RegistryEvent::TargetDestroyed(target_id));
    }

    /// Handles an `attachedToTarget` event.
    ///
    /// Ignores attachments to the parent's own target (self-attachment
    /// loop). Derives a name and kind, stores the target keyed by session
    /// id (overwriting a colliding entry), runs the attach hook when one is
    /// installed, and resumes the target afterwards.
    ///
    /// # Errors
    ///
    /// Propagates transport failure of the resume call. A failed parent-id
    /// resolution is not an error: the event is processed without the
    /// self-attachment check and resolution is retried on the next call.
    pub async fn on_attached_to_target(
        &self,
        session_id: TargetSessionId,
        info: TargetInfo,
        waiting_for_debugger: bool,
    ) -> Result<()> {
        match self.factory.resolve_root_target_id().await {
            Ok(own_id) if *own_id == info.target_id => {
                debug!(target_id = %info.target_id, "Ignored self-attachment");
                return Ok(());
            }
            Ok(_) => {}
            Err(error) => {
                warn!(error = %error, "Parent target id unresolved, skipping self-attach check");
            }
        }

        let name = name_from_info(&info).unwrap_or_else(|| {
            format!("#{}", self.anonymous_counter.fetch_add(1, Ordering::SeqCst) + 1)
        });

        let target = Target::new(
            session_id.clone(),
            name,
            info,
            Arc::clone(&self.transport),
        );
        self.attached
            .lock()
            .insert(session_id.clone(), Arc::clone(&target));

        debug!(
            session_id = %session_id,
            name = %target.name(),
            waiting_for_debugger,
            "Target attached"
        );

        if let Some(hook) = &self.attach_hook {
            target.mark_waiting_for_hook();
            if let Err(error) = hook.on_attach(&target).await {
                warn!(session_id = %session_id, error = %error, "Attach hook failed");
            }
        }
        target.resume().await?;

        self.notify(HostSignal::TargetAttached { session_id });
        Ok(())
    }

    /// Handles a `detachedFromTarget` event.
    ///
    /// A session backed by a live parallel connection means the detach was
    /// solicited by us: the connection is dropped. Otherwise the stored
    /// target is disposed as terminated. A session matching neither is an
    /// idempotent no-op.
    pub fn on_detached_from_target(&self, session_id: &TargetSessionId) {
        if let Some(connection) = self.parallel.lock().remove(session_id) {
            connection.on_peer_detached();
            self.notify(HostSignal::TargetDetached {
                session_id: session_id.clone(),
            });
            return;
        }

        if let Some(target) = self.attached.lock().remove(session_id) {
            target.dispose("target terminated");
            self.notify(HostSignal::TargetDetached {
                session_id: session_id.clone(),
            });
        }
    }

    /// Detaches every currently tracked session.
    ///
    /// This is the self-initiated teardown path, so unlike a
    /// `detachedFromTarget` event the peer has not seen the detach yet:
    /// every session is detached at the peer as well. Parallel connections
    /// go through their own disconnect, which is race-safe against a
    /// concurrent peer detach. Idempotent.
    pub async fn dispose(&self) {
        let parallel: Vec<Arc<ParallelConnection>> =
            self.parallel.lock().drain().map(|(_, conn)| conn).collect();
        let attached: Vec<(TargetSessionId, Arc<Target>)> =
            self.attached.lock().drain().collect();

        debug!(
            sessions = parallel.len() + attached.len(),
            "Registry disposing"
        );

        for connection in parallel {
            let session_id = connection.session_id().clone();
            if let Err(error) = connection.disconnect().await {
                warn!(session_id = %session_id, error = %error, "Detach request failed during dispose");
            }
            self.notify(HostSignal::TargetDetached { session_id });
        }

        for (session_id, target) in attached {
            target.dispose("target terminated");
            if let Err(error) = self.transport.detach_from_target(&session_id).await {
                warn!(session_id = %session_id, error = %error, "Detach request failed during dispose");
            }
            self.notify(HostSignal::TargetDetached { session_id });
        }
    }
}

// ============================================================================
// TargetRegistry - Parallel Connections
// ============================================================================

impl TargetRegistry {
    /// Opens a parallel connection over the parent's physical channel and
    /// tracks it for detach bookkeeping.
    pub async fn create_parallel_connection(&self) -> Result<Arc<ParallelConnection>> {
        let connection = self.factory.create().await?;
        self.parallel
            .lock()
            .insert(connection.session_id().clone(), Arc::clone(&connection));
        Ok(connection)
    }
}

// ============================================================================
// TargetRegistry - Accessors
// ============================================================================

impl TargetRegistry {
    /// Returns a snapshot of all known targets, ordered by target id.
    #[must_use]
    pub fn available_targets(&self) -> Vec<TargetInfo> {
        let mut targets: Vec<TargetInfo> = self.known.lock().values().cloned().collect();
        targets.sort_by(|a, b| a.target_id.cmp(&b.target_id));
        targets
    }

    /// Returns the attached target for a session, if any.
    #[must_use]
    pub fn target_by_session(&self, session_id: &TargetSessionId) -> Option<Arc<Target>> {
        self.attached.lock().get(session_id).cloned()
    }

    /// Returns the number of attached targets.
    #[inline]
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.attached.lock().len()
    }

    /// Returns the number of live parallel connections.
    #[inline]
    #[must_use]
    pub fn parallel_count(&self) -> usize {
        self.parallel.lock().len()
    }
}

// ============================================================================
// TargetRegistry - Emission
// ============================================================================

impl TargetRegistry {
    /// Delivers one lifecycle event to the observer, if installed.
    fn emit(&self, event: RegistryEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(event);
        }
    }

    /// Broadcasts one side-channel signal, if a notifier is installed.
    fn notify(&self, signal: HostSignal) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(signal);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
