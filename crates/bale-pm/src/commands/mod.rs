//! Package manager commands
//!
//! Implements the two workflows: `create` (build and upload an archive) and
//! `update` (resolve and install packages from the remote store).

pub mod create;
pub mod update;

pub use create::{create_package, CreateError, CreateOptions, CreateOutcome};
pub use update::{update_packages, UpdateOptions};
