//! Shared test host: a scripted stand-in for the embedding engine.
//!
//! Programs are tiny built-in behaviors selected by entry-script name:
//! `"echo"` posts every inbound buffer back to the creator, `"silent"`
//! absorbs them, `"broken"` is resolvable but fails to load. Everything
//! else is unresolvable.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use marten_core::{
    Buffer, CreatorPort, EnvError, HostEnvironment, ObjectToken, WorkerEnvironment, WorkerId,
};

/// Bound on every wait in these tests.
pub const RECV_WAIT: Duration = Duration::from_secs(5);

/// One worker-to-creator delivery observed by the test.
pub struct Delivery {
    pub worker: WorkerId,
    pub token: ObjectToken,
    pub payload: Vec<u8>,
}

pub struct TestHost {
    outbound: Sender<Delivery>,
}

/// Build a host plus the receiving end of its creator-side sink.
pub fn test_host() -> (Arc<TestHost>, Receiver<Delivery>) {
    let (outbound, rx) = unbounded();
    (Arc::new(TestHost { outbound }), rx)
}

impl HostEnvironment for TestHost {
    fn resolve_entry(&self, spec: &str) -> Option<PathBuf> {
        matches!(spec, "echo" | "silent" | "broken").then(|| PathBuf::from(spec))
    }

    fn spawn_environment(&self, port: CreatorPort) -> Result<Box<dyn WorkerEnvironment>, EnvError> {
        Ok(Box::new(StubEnv {
            port,
            program: Program::Unloaded,
        }))
    }

    fn receive_from_worker(&self, worker: WorkerId, token: ObjectToken, data: Buffer) {
        let _ = self.outbound.send(Delivery {
            worker,
            token,
            payload: data.into_vec(),
        });
    }
}

enum Program {
    Unloaded,
    Echo,
    Silent,
}

struct StubEnv {
    port: CreatorPort,
    program: Program,
}

impl WorkerEnvironment for StubEnv {
    fn load(&mut self, entry: &Path) -> Result<(), EnvError> {
        match entry.to_str() {
            Some("echo") => {
                self.program = Program::Echo;
                Ok(())
            }
            Some("silent") => {
                self.program = Program::Silent;
                Ok(())
            }
            Some("broken") => Err(EnvError::Script("broken program refuses to load".into())),
            _ => Err(EnvError::Load {
                path: entry.to_path_buf(),
                reason: "unknown program".into(),
            }),
        }
    }

    fn on_message(&mut self, data: Buffer) -> Result<(), EnvError> {
        match self.program {
            Program::Echo => {
                self.port.post_message(data);
                Ok(())
            }
            Program::Silent => Ok(()),
            Program::Unloaded => Err(EnvError::Script("message before load".into())),
        }
    }
}

/// Poll `cond` until it holds or the bounded wait elapses.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + RECV_WAIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}
