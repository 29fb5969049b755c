//! Registry counters.
//!
//! All counters are atomic and can be read at any time without taking the
//! registry lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the worker registry.
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Workers whose threads were spawned.
    pub workers_spawned: AtomicU64,
    /// Workers fully torn down (explicitly, via finalizer, or at shutdown).
    pub workers_terminated: AtomicU64,
    /// Buffers enqueued to a worker inbox.
    pub messages_delivered: AtomicU64,
    /// Buffers dropped because the target worker was not valid.
    pub messages_dropped: AtomicU64,
}

impl RegistryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
            workers_terminated: self.workers_terminated.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`RegistryStats`].
#[derive(Debug, Clone, Copy)]
pub struct RegistryStatsSnapshot {
    pub workers_spawned: u64,
    pub workers_terminated: u64,
    pub messages_delivered: u64,
    pub messages_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = RegistryStats::new();
        stats.workers_spawned.fetch_add(3, Ordering::Relaxed);
        stats.messages_dropped.fetch_add(1, Ordering::Relaxed);

        let snap = stats.snapshot();
        assert_eq!(snap.workers_spawned, 3);
        assert_eq!(snap.workers_terminated, 0);
        assert_eq!(snap.messages_delivered, 0);
        assert_eq!(snap.messages_dropped, 1);
    }
}
