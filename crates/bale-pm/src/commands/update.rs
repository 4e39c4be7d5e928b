//! Update command
//!
//! Lists the remote store, then installs the requested packages and their
//! transitive dependencies into the local directory.

use crate::catalog::{list_remote, Catalog};
use crate::config::UpdateSpec;
use crate::resolver::{InstallError, InstallResult, Installer, DEFAULT_MAX_DEPTH};
use crate::transport::Transport;
use std::path::PathBuf;
use tracing::{info, warn};

/// Update options
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Remote directory holding the archives (default: remote login directory)
    pub remote_dir: String,

    /// Destination for downloads and extracted files
    pub local_dir: PathBuf,

    /// Limit on the depth of transitive installs
    pub max_depth: usize,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            remote_dir: String::new(),
            local_dir: PathBuf::from("."),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Install the packages of `spec` from the remote store
pub fn update_packages(
    spec: &UpdateSpec,
    options: &UpdateOptions,
    transport: &dyn Transport,
) -> Result<Vec<InstallResult>, InstallError> {
    let entries = list_remote(transport, &options.remote_dir)?;
    let catalog = Catalog::from_entries(entries);
    if catalog.is_empty() {
        warn!(remote_dir = %options.remote_dir, "no packages found on remote");
    } else {
        info!(packages = catalog.len(), "remote catalog loaded");
    }

    Installer::new(&catalog, transport, &options.local_dir)
        .with_max_depth(options.max_depth)
        .install(&spec.packages)
}
