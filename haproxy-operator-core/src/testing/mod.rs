//! Hermetic collaborators and model builders for tests.
//!
//! Available to this crate's unit tests and, through the `test-util`
//! feature, to the integration tests.

pub mod builder;
mod host;
mod pki;

pub use builder::{RelationBuilder, SnapshotBuilder, apply_outcome, json_databag, raw_databag};
pub use host::{FakeHaproxyService, MemoryFile, MemoryFileSystem};
pub use pki::TestCa;
