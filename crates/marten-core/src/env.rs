//! The seam between the worker registry and the embedding scripting engine.
//!
//! The registry owns threads and lifecycle state; the engine owns script
//! compilation, execution, and the creator-side message sink. These traits
//! are the whole of what each side may ask of the other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::buffer::Buffer;
use crate::error::EnvError;
use crate::id::{ObjectToken, WorkerId};

/// Why a wrapper object's finalizer ran.
///
/// The teardown behavior is identical either way; the kind is recorded so
/// logs can distinguish collector-driven teardown from engine shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeKind {
    /// The script-side wrapper became unreachable and was collected.
    Collected,
    /// The creator's environment is being torn down.
    Shutdown,
}

/// The creator-side collaborator: the environment that spawned a worker.
///
/// Implementations must be callable from any thread. `spawn_environment`
/// in particular runs on the freshly spawned worker thread, and
/// `receive_from_worker` is invoked from worker threads whenever their
/// script posts a message back.
pub trait HostEnvironment: Send + Sync {
    /// Resolve an entry-script specifier to a loadable path.
    ///
    /// Returning `None` fails worker creation before any thread is spawned.
    fn resolve_entry(&self, spec: &str) -> Option<PathBuf>;

    /// Construct a fresh scripting context for a worker.
    ///
    /// Called on the worker's own thread. The `port` is the context's only
    /// route back to its creator; implementations hand it to whatever
    /// binds the script-visible `post_message`.
    fn spawn_environment(&self, port: CreatorPort) -> Result<Box<dyn WorkerEnvironment>, EnvError>;

    /// The creator-side message sink.
    ///
    /// `token` is the value supplied when the worker was created, so the
    /// engine can route the payload to the matching wrapper object.
    fn receive_from_worker(&self, worker: WorkerId, token: ObjectToken, data: Buffer);
}

/// A worker's own scripting context.
///
/// Owned by the worker thread for its whole life; never shared. The
/// registry drives it strictly from that one thread.
pub trait WorkerEnvironment: Send {
    /// Compile and run the entry script.
    fn load(&mut self, entry: &Path) -> Result<(), EnvError>;

    /// Deliver one inbound payload to the script's message handler.
    ///
    /// Errors are local to this worker: the caller logs them and carries
    /// on. Only explicit messages cross back to the creator.
    fn on_message(&mut self, data: Buffer) -> Result<(), EnvError>;
}

/// The worker-side half of the message channel.
///
/// Handed to each [`WorkerEnvironment`] at construction; cloning is cheap
/// and clones stay bound to the same worker.
#[derive(Clone)]
pub struct CreatorPort {
    host: Arc<dyn HostEnvironment>,
    worker: WorkerId,
    token: ObjectToken,
}

impl CreatorPort {
    pub fn new(host: Arc<dyn HostEnvironment>, worker: WorkerId, token: ObjectToken) -> Self {
        Self { host, worker, token }
    }

    /// The worker this port belongs to.
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Deliver a payload to the creator's registered sink.
    ///
    /// Move-only: the buffer is gone from the sender's side once posted.
    pub fn post_message(&self, data: Buffer) {
        self.host.receive_from_worker(self.worker, self.token, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingHost {
        received: Mutex<Vec<(WorkerId, ObjectToken, Vec<u8>)>>,
    }

    impl HostEnvironment for RecordingHost {
        fn resolve_entry(&self, _spec: &str) -> Option<PathBuf> {
            None
        }

        fn spawn_environment(
            &self,
            _port: CreatorPort,
        ) -> Result<Box<dyn WorkerEnvironment>, EnvError> {
            Err(EnvError::Construct("not supported in this test".into()))
        }

        fn receive_from_worker(&self, worker: WorkerId, token: ObjectToken, data: Buffer) {
            self.received
                .lock()
                .unwrap()
                .push((worker, token, data.into_vec()));
        }
    }

    #[test]
    fn port_routes_to_creator_sink_with_token() {
        let host = Arc::new(RecordingHost {
            received: Mutex::new(Vec::new()),
        });
        let id = WorkerId::new(5, 0);
        let token = ObjectToken::from_raw(0xBEEF);

        let port = CreatorPort::new(host.clone(), id, token);
        port.post_message(Buffer::from_vec(b"pong".to_vec()));

        let received = host.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], (id, token, b"pong".to_vec()));
    }

    #[test]
    fn clones_stay_bound_to_the_same_worker() {
        let host = Arc::new(RecordingHost {
            received: Mutex::new(Vec::new()),
        });
        let port = CreatorPort::new(host, WorkerId::new(1, 3), ObjectToken::from_raw(9));
        let clone = port.clone();
        assert_eq!(clone.worker(), port.worker());
    }
}
