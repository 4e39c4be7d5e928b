//! Create command
//!
//! Builds a package archive from a build spec and uploads it to the remote
//! store when a transport is available.

use crate::archive::{self, ArchiveError};
use crate::config::BuildSpec;
use crate::manifest::Manifest;
use crate::transport::{Transport, TransportError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while creating a package
#[derive(Debug, Error)]
pub enum CreateError {
    /// Archive build error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Upload error
    #[error("Upload failed: {0}")]
    Transport(#[from] TransportError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Create options
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Directory the targets are resolved against (default: current directory)
    pub working_dir: Option<PathBuf>,

    /// Archive path (default: `<working_dir>/<name>-<version>.tar.gz`)
    pub output: Option<PathBuf>,

    /// Remote directory to upload into
    pub remote_dir: String,
}

/// Create result
#[derive(Debug)]
pub struct CreateOutcome {
    pub archive_path: PathBuf,
    pub manifest: Manifest,

    /// Remote path of the uploaded archive, if it was uploaded
    pub remote_path: Option<String>,
}

/// Build the archive for `spec` and upload it through `transport`, if any
pub fn create_package(
    spec: &BuildSpec,
    options: &CreateOptions,
    transport: Option<&dyn Transport>,
) -> Result<CreateOutcome, CreateError> {
    let working_dir = match &options.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    let (archive_path, manifest) =
        archive::build(spec, &working_dir, options.output.as_deref())?;

    let remote_path = match transport {
        Some(transport) => {
            let remote = transport.upload(&archive_path, &options.remote_dir)?;
            info!(remote = %remote, "uploaded {}", archive_path.display());
            Some(remote)
        }
        None => None,
    };

    Ok(CreateOutcome {
        archive_path,
        manifest,
        remote_path,
    })
}
