//! The native half of the script-facing `Worker` class.
//!
//! The embedding engine registers a wrapper class whose constructor,
//! `post_message`, `terminate`, and finalizer delegate here. Errors are
//! returned as values for the engine to raise as script-level errors;
//! an invalid handle is never a native crash.

use std::sync::Arc;

use marten_core::{Buffer, FinalizeKind, HostEnvironment, ObjectToken, WorkerId};
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};
use crate::registry::{JoinMode, WorkerRegistry};

/// State held by a script-visible wrapper object: the worker identifier
/// paired with the opaque token naming the wrapper itself.
#[derive(Debug, Clone, Copy)]
pub struct WorkerHandle {
    id: WorkerId,
    token: ObjectToken,
}

impl WorkerHandle {
    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn token(&self) -> ObjectToken {
        self.token
    }
}

/// Adapter between the wrapper class and the registry.
pub struct WorkerBinding {
    registry: Arc<WorkerRegistry>,
}

impl WorkerBinding {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Script-invoked constructor.
    ///
    /// On failure the error is returned for the engine to raise; no
    /// half-valid worker is handed to script code.
    pub fn construct(
        &self,
        host: Arc<dyn HostEnvironment>,
        spec: &str,
        token: ObjectToken,
    ) -> WorkerResult<WorkerHandle> {
        let id = self.registry.create(host, spec, token)?;
        Ok(WorkerHandle { id, token })
    }

    /// Script-facing `post_message` on the creator's wrapper object.
    pub fn post_message(&self, handle: &WorkerHandle, data: Buffer) -> WorkerResult<()> {
        if !self.registry.is_valid(handle.id) {
            return Err(WorkerError::InvalidHandle(handle.id));
        }
        self.registry.post(handle.id, data)
    }

    /// Script-facing `terminate`. `false` means the worker was already
    /// gone - a no-op, not an error.
    pub fn terminate(&self, handle: &WorkerHandle) -> bool {
        self.registry.terminate(handle.id)
    }

    /// Finalizer hook, invoked by the engine's garbage collector when a
    /// wrapper becomes unreachable without an explicit `terminate`.
    ///
    /// May run on any thread, including a collector thread that must not
    /// block: the thread join is deferred to the registry's reaper list
    /// and performed by `finish`. Safe to call after an explicit
    /// `terminate`.
    pub fn finalizer(&self, handle: &WorkerHandle, kind: FinalizeKind) {
        debug!(worker = %handle.id, ?kind, "finalizing worker wrapper");
        self.registry.request_terminate(handle.id, JoinMode::Defer);
    }
}
