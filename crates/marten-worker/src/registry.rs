//! The process-wide worker table.
//!
//! One registry instance tracks every live worker: a generation-checked
//! slot per worker plus a reverse index from OS-thread identity to worker
//! identifier, both guarded by a single mutex. The mutex is held only for
//! short slot and map operations - never across thread spawn, thread
//! join, or script execution.
//!
//! The registry is a process-scoped object with explicit init and
//! teardown: the host constructs it once (`WorkerRegistry::new`) and
//! drains it deterministically at shutdown (`finish`).

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use marten_core::{Buffer, HostEnvironment, ObjectToken, WorkerId};
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use tracing::{debug, error, trace, warn};

use crate::alloc::HandleAllocator;
use crate::error::{WorkerError, WorkerResult};
use crate::runtime::{WorkerRuntime, run_worker};
use crate::stats::RegistryStats;

/// Lifecycle state of a registry slot.
///
/// A vacant allocator entry is the Empty state; it has no representation
/// here because a vacant slot carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Thread spawned; entry script not yet loaded.
    Starting,
    /// Entry script loaded; worker is serving its inbox.
    Running,
    /// Termination requested; the winner of the state transition owns
    /// the teardown.
    Terminating,
    /// The worker failed to load. The slot is parked here, holding the
    /// thread handle, until `finish` reaps it.
    Terminated,
}

/// How a termination request disposes of the worker's join handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinMode {
    /// Join the worker thread on the calling thread before returning.
    Block,
    /// Hand the join handle to the reaper list; `finish` joins it.
    ///
    /// Used by the finalizer path (which may run on a collector thread
    /// that must not block) and whenever the caller is the worker's own
    /// thread.
    Defer,
}

struct Slot {
    state: SlotState,
    runtime: Arc<WorkerRuntime>,
    thread: Option<JoinHandle<()>>,
    token: ObjectToken,
}

struct RegistryState {
    slots: HandleAllocator<Slot>,
    threads: HashMap<ThreadId, WorkerId>,
    /// Join handles nobody is blocking on: deferred terminations and
    /// spawn races. Drained by `finish`.
    reaper: Vec<JoinHandle<()>>,
}

/// The shared worker table.
pub struct WorkerRegistry {
    state: Mutex<RegistryState>,
    stats: RegistryStats,
}

impl WorkerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(RegistryState {
                slots: HandleAllocator::new(),
                threads: HashMap::new(),
                reaper: Vec::new(),
            }),
            stats: RegistryStats::new(),
        })
    }

    /// Create a worker running `spec` in a fresh scripting environment on
    /// a dedicated thread.
    ///
    /// Resolution and thread-spawn failures are reported here and leave
    /// no slot behind. Load and compile failures happen asynchronously on
    /// the worker thread: the slot flips to Terminated and the returned
    /// identifier stops being valid - callers observe this via
    /// [`is_valid`](Self::is_valid).
    pub fn create(
        self: &Arc<Self>,
        host: Arc<dyn HostEnvironment>,
        spec: &str,
        token: ObjectToken,
    ) -> WorkerResult<WorkerId> {
        let entry = host
            .resolve_entry(spec)
            .ok_or_else(|| WorkerError::Unresolvable(spec.to_string()))?;

        let (id, runtime) = {
            let mut state = self.state.lock();
            let id = state.slots.insert_with(|id| Slot {
                state: SlotState::Starting,
                runtime: Arc::new(WorkerRuntime::new(id)),
                thread: None,
                token,
            });
            let runtime = state
                .slots
                .get(id)
                .expect("slot was just inserted")
                .runtime
                .clone();
            (id, runtime)
        };

        // Spawn outside the lock: one worker's slow startup must not
        // stall unrelated registry operations.
        let spawned = thread::Builder::new()
            .name(format!("marten-worker-{}", id.index()))
            .spawn({
                let registry = Arc::clone(self);
                let runtime = runtime.clone();
                move || run_worker(registry, runtime, host, entry, token)
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.state.lock().slots.remove(id);
                return Err(WorkerError::Creation(format!(
                    "failed to spawn worker thread: {e}"
                )));
            }
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.slots.get_mut(id) {
            // A terminate request can land in the window before the
            // handle is recorded; the requester could not take the
            // handle, so it goes to the reaper.
            Some(slot) if slot.state == SlotState::Terminating => state.reaper.push(handle),
            Some(slot) => slot.thread = Some(handle),
            None => state.reaper.push(handle),
        }
        drop(guard);

        self.stats.workers_spawned.fetch_add(1, Ordering::Relaxed);
        debug!(worker = %id, spec, "worker created");
        Ok(id)
    }

    /// Whether `id` names a live (Starting or Running) worker.
    pub fn is_valid(&self, id: WorkerId) -> bool {
        let state = self.state.lock();
        matches!(
            state.slots.get(id).map(|slot| slot.state),
            Some(SlotState::Starting | SlotState::Running)
        )
    }

    /// Lock-held snapshot of a live worker's runtime and wrapper token.
    ///
    /// Long-running operations (delivery, termination) work on the
    /// snapshot so the registry lock is never held while touching the
    /// runtime itself.
    pub fn try_get_worker(&self, id: WorkerId) -> Option<(Arc<WorkerRuntime>, ObjectToken)> {
        let state = self.state.lock();
        let slot = state.slots.get(id)?;
        match slot.state {
            SlotState::Starting | SlotState::Running => {
                Some((slot.runtime.clone(), slot.token))
            }
            SlotState::Terminating | SlotState::Terminated => None,
        }
    }

    /// Deliver a buffer to the worker named by `id` and wake it.
    ///
    /// If the worker is not valid the buffer is dropped and the failure
    /// is reported to the caller; nothing is thrown across the thread
    /// boundary.
    pub fn post(&self, id: WorkerId, data: Buffer) -> WorkerResult<()> {
        let Some((runtime, _token)) = self.try_get_worker(id) else {
            self.stats.messages_dropped.fetch_add(1, Ordering::Relaxed);
            trace!(worker = %id, "dropping message for invalid worker");
            return Err(WorkerError::InvalidHandle(id));
        };
        runtime.push(data);
        self.stats.messages_delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Terminate the worker named by `id`. Idempotent.
    ///
    /// The first caller to observe a live slot wins the Terminating
    /// transition, wakes the worker out of any wait, joins its thread,
    /// and releases the slot. An already terminating, terminated, or
    /// released worker is reported as a `false` no-op.
    ///
    /// Never joins from the worker's own thread: a worker terminating
    /// itself defers the join to the reaper list.
    pub fn terminate(&self, id: WorkerId) -> bool {
        self.request_terminate(id, JoinMode::Block)
    }

    pub(crate) fn request_terminate(&self, id: WorkerId, mode: JoinMode) -> bool {
        let (runtime, handle) = {
            let mut state = self.state.lock();
            let Some(slot) = state.slots.get_mut(id) else {
                return false;
            };
            match slot.state {
                SlotState::Starting | SlotState::Running => {}
                SlotState::Terminating | SlotState::Terminated => return false,
            }
            slot.state = SlotState::Terminating;
            (slot.runtime.clone(), slot.thread.take())
        };

        runtime.interrupt();

        match handle {
            Some(handle)
                if mode == JoinMode::Block && handle.thread().id() != thread::current().id() =>
            {
                if handle.join().is_err() {
                    error!(worker = %id, "worker thread panicked outside the script sandbox");
                }
            }
            Some(handle) => self.state.lock().reaper.push(handle),
            // The spawn has not recorded its handle yet; `create` routes
            // it to the reaper when it observes the Terminating state.
            None => {}
        }

        self.state.lock().slots.remove(id);
        self.stats.workers_terminated.fetch_add(1, Ordering::Relaxed);
        debug!(worker = %id, ?mode, "worker terminated");
        true
    }

    /// Tear down every still-live worker and join every worker thread.
    ///
    /// Call once, from the creator/main thread, at shutdown; concurrent
    /// `create` calls are outside the contract. This is a deterministic
    /// drain, not graceful cancellation: pending messages are discarded
    /// with their workers. Safe with zero live workers and safe to call
    /// twice.
    ///
    /// # Panics
    ///
    /// If a worker thread failed to deregister itself - a worker thread
    /// that never ran `on_thread_exit` means the registry is corrupt, and
    /// aborting beats silently continuing.
    pub fn finish(&self) {
        loop {
            let next = {
                let state = self.state.lock();
                state
                    .slots
                    .iter()
                    .find(|(_, slot)| {
                        matches!(slot.state, SlotState::Starting | SlotState::Running)
                    })
                    .map(|(id, _)| id)
            };
            match next {
                Some(id) => {
                    self.terminate(id);
                }
                None => break,
            }
        }

        // Reap load-failed workers and every deferred join.
        let pending = {
            let mut state = self.state.lock();
            let mut pending = std::mem::take(&mut state.reaper);
            let dead: Vec<WorkerId> = state
                .slots
                .iter()
                .filter(|(_, slot)| slot.state == SlotState::Terminated)
                .map(|(id, _)| id)
                .collect();
            for id in dead {
                if let Some(mut slot) = state.slots.remove(id) {
                    if let Some(handle) = slot.thread.take() {
                        pending.push(handle);
                    }
                    self.stats.workers_terminated.fetch_add(1, Ordering::Relaxed);
                }
            }
            pending
        };
        for handle in pending {
            if handle.join().is_err() {
                error!("worker thread panicked outside the script sandbox");
            }
        }

        let state = self.state.lock();
        assert!(
            state.threads.is_empty(),
            "worker thread exited without calling on_thread_exit"
        );
        debug!("worker registry drained");
    }

    /// Register the calling thread in the thread-identity map.
    ///
    /// Every worker thread calls this as its first action; the worker
    /// thread main does so automatically.
    pub fn on_thread_enter(&self, id: WorkerId) {
        let mut state = self.state.lock();
        state.threads.insert(thread::current().id(), id);
    }

    /// Remove the calling thread from the thread-identity map.
    ///
    /// Every worker thread calls this as its last action, including on
    /// abnormal script-driven exits.
    pub fn on_thread_exit(&self) {
        let mut state = self.state.lock();
        if state.threads.remove(&thread::current().id()).is_none() {
            warn!("on_thread_exit from a thread that never entered");
        }
    }

    /// The worker the calling thread belongs to, if it is a worker
    /// thread. The creator thread always answers `None`.
    pub fn current_worker(&self) -> Option<WorkerId> {
        let state = self.state.lock();
        state.threads.get(&thread::current().id()).copied()
    }

    /// Number of live (Starting/Running/Terminating/Terminated) slots.
    pub fn live_count(&self) -> usize {
        self.state.lock().slots.live_count()
    }

    /// Number of worker threads currently registered in the
    /// thread-identity map.
    pub fn thread_count(&self) -> usize {
        self.state.lock().threads.len()
    }

    /// Registry counters; lock-free reads.
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Starting -> Running transition, made by the worker thread once its
    /// entry script has loaded. `false` means termination won the race
    /// and the worker must exit without serving its inbox.
    pub(crate) fn mark_running(&self, id: WorkerId) -> bool {
        let mut state = self.state.lock();
        let Some(slot) = state.slots.get_mut(id) else {
            return false;
        };
        match slot.state {
            SlotState::Starting => {
                slot.state = SlotState::Running;
                true
            }
            SlotState::Running | SlotState::Terminating | SlotState::Terminated => false,
        }
    }

    /// Park a worker whose environment or entry script failed to load.
    ///
    /// Made by the worker thread itself. If a terminate request already
    /// won the slot, the requester owns the teardown and nothing changes
    /// here.
    pub(crate) fn mark_load_failed(&self, id: WorkerId) {
        let mut state = self.state.lock();
        if let Some(slot) = state.slots.get_mut(id) {
            if slot.state == SlotState::Starting {
                slot.state = SlotState::Terminated;
            }
        }
    }
}
