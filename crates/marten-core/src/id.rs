//! Worker identifiers.

use std::fmt;

/// Generation-checked identifier naming a worker registry slot.
///
/// The registry recycles slot indices; the generation counter is bumped on
/// every release so a stale copy of an old `WorkerId` can never resolve to
/// the slot's next occupant. Two live allocations never share an
/// (index, generation) pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WorkerId {
    index: u32,
    generation: u32,
}

impl WorkerId {
    /// Assemble an identifier from its raw parts.
    ///
    /// Valid identifiers are normally produced by the registry's handle
    /// allocator; this exists for logging, test fixtures, and embedders
    /// that persist the raw pair across a native boundary.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the registry's backing array.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Reuse counter for the slot at `index`.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}

/// Opaque token naming the creator-side wrapper object.
///
/// The registry stores it alongside the worker slot and hands it back on
/// every worker-to-creator delivery so the embedding engine can route the
/// message to the right wrapper. The registry itself never interprets it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct ObjectToken(u64);

impl ObjectToken {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}
