//! Error types for worker registry operations.

use marten_core::WorkerId;
use thiserror::Error;

/// Errors returned by the registry and the script-facing binding.
///
/// These are always returned as values to the caller on the calling
/// thread; nothing here is ever thrown across the thread boundary.
/// Redundant termination is not represented - `terminate` reports an
/// already-gone worker as a `false` no-op, not an error.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The identifier does not name a live (Starting/Running) worker.
    ///
    /// Covers never-allocated identifiers, stale generations from reused
    /// slots, and workers already terminating or terminated.
    #[error("invalid worker handle: {0}")]
    InvalidHandle(WorkerId),

    /// The entry-script specifier did not resolve to a loadable path.
    #[error("entry script not resolvable: {0}")]
    Unresolvable(String),

    /// Worker creation failed before the worker could start.
    #[error("failed to create worker: {0}")]
    Creation(String),
}

/// Result alias for registry operations.
pub type WorkerResult<T> = Result<T, WorkerError>;
