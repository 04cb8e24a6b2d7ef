//! Bounded resource loading subsystem.
//!
//! Protocol payloads reference auxiliary resources (source maps, scripts)
//! that the shell fetches opportunistically. This module caps the fan-out
//! to the transport layer with FIFO admission control, enforces a per-load
//! deadline, and tracks every load's outcome for diagnostics.
//!
//! The cap is logical admission control over async operations that may all
//! be in flight on one executor, not thread parallelism.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `semaphore` | Counting semaphore with FIFO wait queue |
//! | `resource` | Tracking entries, initiators, and keys |
//! | `core` | The loader: admission, timeout, fallback chain |

// ============================================================================
// Submodules
// ============================================================================

/// The resource loader.
pub mod core;

/// Resource tracking entries and initiators.
pub mod resource;

/// Counting semaphore with a FIFO wait queue.
pub mod semaphore;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{
    DEFAULT_LOAD_TIMEOUT, DEFAULT_MAX_CONCURRENT_LOADS, LoaderConfig, LoaderStatus, ResourceLoader,
};
pub use resource::{PageResource, ResourceContent, ResourceInitiator, resource_key};
pub use semaphore::{Canceled, FifoSemaphore, Permit};
