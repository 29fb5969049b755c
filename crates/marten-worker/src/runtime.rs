//! Per-worker runtime state and the worker thread main loop.
//!
//! Each worker owns a dedicated OS thread. The thread registers itself,
//! builds its own scripting environment, loads the entry script, then
//! blocks on its inbox until a message arrives or termination is
//! requested. All blocking here is real OS-thread blocking; there is no
//! shared scheduler between workers.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use marten_core::{Buffer, CreatorPort, HostEnvironment, ObjectToken, WorkerId};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info_span, warn};

use crate::registry::WorkerRegistry;

/// Shared per-worker state: the inbound queue and its wake primitive.
///
/// Shared between the registry slot and the worker thread for the
/// Running/Terminating window only; the scripting environment itself
/// lives on the worker thread's stack and is never part of this.
pub struct WorkerRuntime {
    id: WorkerId,
    inbox: Mutex<VecDeque<Buffer>>,
    wake: Condvar,
    terminating: AtomicBool,
}

impl WorkerRuntime {
    pub(crate) fn new(id: WorkerId) -> Self {
        Self {
            id,
            inbox: Mutex::new(VecDeque::new()),
            wake: Condvar::new(),
            terminating: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn is_terminating(&self) -> bool {
        self.terminating.load(Ordering::SeqCst)
    }

    /// Append a buffer to the inbox and wake the worker.
    pub(crate) fn push(&self, data: Buffer) {
        let mut inbox = self.inbox.lock();
        inbox.push_back(data);
        self.wake.notify_one();
    }

    /// Request termination and wake the worker out of any wait.
    ///
    /// The flag is flipped while holding the inbox lock: a worker between
    /// its flag check and `wait` cannot miss the wake.
    pub(crate) fn interrupt(&self) {
        let _inbox = self.inbox.lock();
        self.terminating.store(true, Ordering::SeqCst);
        self.wake.notify_all();
    }

    /// Block until the next message, or `None` once termination has been
    /// requested.
    ///
    /// Termination preempts delivery: pending queued messages are not
    /// drained once the terminating flag is observed.
    fn next_message(&self) -> Option<Buffer> {
        let mut inbox = self.inbox.lock();
        loop {
            if self.terminating.load(Ordering::SeqCst) {
                return None;
            }
            if let Some(data) = inbox.pop_front() {
                return Some(data);
            }
            self.wake.wait(&mut inbox);
        }
    }
}

/// Worker thread main.
///
/// Thread-map registration is the first action and deregistration the
/// last, including on abnormal script-driven exits - the scope guard
/// runs during unwinding too.
pub(crate) fn run_worker(
    registry: Arc<WorkerRegistry>,
    runtime: Arc<WorkerRuntime>,
    host: Arc<dyn HostEnvironment>,
    entry: PathBuf,
    token: ObjectToken,
) {
    let id = runtime.id();
    registry.on_thread_enter(id);
    let registry_exit = registry.clone();
    let _deregister = scopeguard::guard((), move |_| registry_exit.on_thread_exit());

    let _span = info_span!("worker", id = %id).entered();
    debug!("worker thread starting");

    let port = CreatorPort::new(host.clone(), id, token);
    let mut env = match host.spawn_environment(port) {
        Ok(env) => env,
        Err(e) => {
            error!(error = %e, "failed to construct scripting environment");
            registry.mark_load_failed(id);
            return;
        }
    };

    match catch_unwind(AssertUnwindSafe(|| env.load(&entry))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(error = %e, entry = %entry.display(), "entry script failed to load");
            registry.mark_load_failed(id);
            return;
        }
        Err(_) => {
            error!(entry = %entry.display(), "entry script panicked during load");
            registry.mark_load_failed(id);
            return;
        }
    }

    if !registry.mark_running(id) {
        // Termination raced the startup; never enter the wait loop.
        debug!("terminated during startup");
        return;
    }
    debug!("worker running");

    while let Some(data) = runtime.next_message() {
        match catch_unwind(AssertUnwindSafe(|| env.on_message(data))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "message handler failed"),
            Err(_) => warn!("message handler panicked"),
        }
    }

    debug!("worker thread stopping");
}
