//! Errors produced at the scripting environment boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from constructing an environment or running script inside one.
///
/// These stay local to the worker that produced them: the registry logs
/// them and flips the worker's lifecycle state, but never rethrows them
/// across the thread boundary.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The engine could not construct a fresh scripting context.
    #[error("failed to construct scripting environment: {0}")]
    Construct(String),

    /// The entry script could not be read or compiled.
    #[error("failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Script code raised an uncaught error.
    #[error("script error: {0}")]
    Script(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
