//! Integration tests for the script-facing binding and its finalizer.

mod common;

use common::{RECV_WAIT, test_host, wait_until};
use marten_core::{Buffer, FinalizeKind, ObjectToken};
use marten_worker::{WorkerBinding, WorkerError, WorkerRegistry};

fn token(raw: u64) -> ObjectToken {
    ObjectToken::from_raw(raw)
}

#[test]
fn construct_post_terminate() {
    let registry = WorkerRegistry::new();
    let binding = WorkerBinding::new(registry.clone());
    let (host, rx) = test_host();

    let handle = binding.construct(host, "echo", token(11)).unwrap();
    binding
        .post_message(&handle, Buffer::from_vec(b"ping".to_vec()))
        .unwrap();

    let delivery = rx.recv_timeout(RECV_WAIT).unwrap();
    assert_eq!(delivery.worker, handle.id());
    assert_eq!(delivery.token, token(11));
    assert_eq!(delivery.payload, b"ping".to_vec());

    assert!(binding.terminate(&handle));

    // The wrapper's stored id is now invalid: script-level error, not a
    // native crash.
    assert!(matches!(
        binding.post_message(&handle, Buffer::from_vec(vec![0])),
        Err(WorkerError::InvalidHandle(_))
    ));
    assert!(!binding.terminate(&handle));

    registry.finish();
}

#[test]
fn construct_failure_raises_instead_of_half_creating() {
    let registry = WorkerRegistry::new();
    let binding = WorkerBinding::new(registry.clone());
    let (host, _rx) = test_host();

    let err = binding.construct(host, "no-such-program", token(1)).unwrap_err();
    assert!(matches!(err, WorkerError::Unresolvable(_)));
    assert_eq!(registry.live_count(), 0);

    registry.finish();
}

#[test]
fn finalizer_tears_down_an_uncollected_worker() {
    let registry = WorkerRegistry::new();
    let binding = WorkerBinding::new(registry.clone());
    let (host, _rx) = test_host();

    let handle = binding.construct(host, "echo", token(3)).unwrap();
    let id = handle.id();
    assert!(registry.is_valid(id));

    // The wrapper was collected without an explicit terminate. The
    // finalizer must not block on the join; teardown completes
    // asynchronously within a bounded wait.
    binding.finalizer(&handle, FinalizeKind::Collected);

    assert!(wait_until(|| !registry.is_valid(id)));
    assert!(wait_until(|| registry.thread_count() == 0));

    registry.finish();
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn finalizer_after_explicit_terminate_is_a_noop() {
    let registry = WorkerRegistry::new();
    let binding = WorkerBinding::new(registry.clone());
    let (host, _rx) = test_host();

    let handle = binding.construct(host, "echo", token(4)).unwrap();
    assert!(binding.terminate(&handle));

    // Explicit-then-finalizer is the common collection order; it must
    // stay idempotent.
    binding.finalizer(&handle, FinalizeKind::Collected);
    binding.finalizer(&handle, FinalizeKind::Shutdown);

    assert!(!registry.is_valid(handle.id()));
    registry.finish();
}
