//! Collaborators that touch the machine: files on disk and the HAProxy
//! service.
//!
//! Everything above this module talks to the host through [`FileSystem`]
//! and [`HaproxyService`], so reconciles can run against in-memory fakes.

mod error;
mod fs;
mod service;


pub use error::HostError;
pub use fs::{FileSystem, HostFileSystem, PUBLIC_FILE_MODE, write_if_changed};
pub use service::{HaproxyService, SystemdHaproxy};
