//! marten-worker - worker registry and cross-thread message passing for
//! the marten scripting host.
//!
//! Script code can spawn isolated workers: independent scripting contexts
//! running on dedicated OS threads that communicate with their creator
//! only by moving serialized buffers, never by sharing script objects.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      WorkerRegistry                      │
//! │   slot table (generation-checked)  thread → worker map   │
//! │              one mutex, short critical sections          │
//! └──────────────────────────────────────────────────────────┘
//!        │ create / terminate / post          ▲ enter / exit
//!        ▼                                    │
//! ┌──────────────────┐   inbox + wake   ┌──────────────────┐
//! │  WorkerBinding   │ ───────────────▶ │  worker thread   │
//! │ (wrapper class)  │ ◀─────────────── │  WorkerRuntime + │
//! └──────────────────┘   CreatorPort    │  environment     │
//!                                       └──────────────────┘
//! ```
//!
//! Lifecycle: a slot is Starting while its thread loads the entry script,
//! Running while serving its inbox, Terminating once teardown is claimed,
//! and released back to the allocator when the thread is joined. The
//! wrapper's finalizer reaches the same teardown path as an explicit
//! `terminate` and is idempotent with it.

mod alloc;
pub mod binding;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod stats;

pub use binding::{WorkerBinding, WorkerHandle};
pub use error::{WorkerError, WorkerResult};
pub use registry::WorkerRegistry;
pub use runtime::WorkerRuntime;
pub use stats::{RegistryStats, RegistryStatsSnapshot};

// Boundary types, re-exported for embedders.
pub use marten_core::{
    Buffer, CreatorPort, EnvError, FinalizeKind, HostEnvironment, ObjectToken, WorkerEnvironment,
    WorkerId,
};
