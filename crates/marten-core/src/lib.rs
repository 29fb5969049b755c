//! marten-core - boundary types for the marten worker subsystem.
//!
//! The worker registry in `marten-worker` is engine-agnostic: it never
//! compiles or runs script source itself. This crate defines the seam it
//! shares with the embedding scripting engine:
//!
//! - [`Buffer`] - the opaque, move-only byte payload exchanged between a
//!   worker and its creator. Copy-semantics messaging is the mechanism that
//!   keeps the two scripting contexts from ever aliasing a live object.
//! - [`WorkerId`] / [`ObjectToken`] - generation-checked worker identifiers
//!   and the opaque token naming the creator-side wrapper object.
//! - [`HostEnvironment`] / [`WorkerEnvironment`] - the creator-side
//!   collaborator (script resolution, fresh context construction, inbound
//!   sink) and the per-worker scripting context it produces.
//! - [`CreatorPort`] - the worker-side half of the message channel, handed
//!   to each environment at construction.

pub mod buffer;
pub mod env;
pub mod error;
pub mod id;

pub use buffer::Buffer;
pub use env::{CreatorPort, FinalizeKind, HostEnvironment, WorkerEnvironment};
pub use error::EnvError;
pub use id::{ObjectToken, WorkerId};
