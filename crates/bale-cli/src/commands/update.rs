//! `bale update`: install packages from the remote store.

use super::RemoteArgs;
use anyhow::{anyhow, Context};
use bale_pm::commands::{update_packages, UpdateOptions};
use bale_pm::UpdateSpec;
use std::path::{Path, PathBuf};

pub fn execute(
    spec_path: &Path,
    local_dir: PathBuf,
    max_depth: usize,
    remote: &RemoteArgs,
) -> anyhow::Result<()> {
    let transport = remote
        .transport()
        .ok_or_else(|| anyhow!("ssh host is required for update"))?;

    let spec = UpdateSpec::from_file(spec_path)
        .with_context(|| format!("failed to load update spec {}", spec_path.display()))?;

    let options = UpdateOptions {
        remote_dir: remote.remote_dir(),
        local_dir,
        max_depth,
    };
    let results = update_packages(&spec, &options, &transport)?;

    for result in &results {
        let manifest_info = result
            .manifest
            .as_ref()
            .map(|path| format!(", manifest {}", path.display()))
            .unwrap_or_default();
        println!(
            "Downloaded {} {} to {} (archive {}{})",
            result.name,
            result.version,
            result.extracted_to.display(),
            result.archive_path.display(),
            manifest_info
        );
    }
    Ok(())
}
