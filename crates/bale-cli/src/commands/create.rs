//! `bale create`: build a package archive and upload it.

use super::RemoteArgs;
use anyhow::Context;
use bale_pm::commands::{create_package, CreateOptions};
use bale_pm::{BuildSpec, Transport};
use std::path::{Path, PathBuf};

pub fn execute(spec_path: &Path, output: Option<PathBuf>, remote: &RemoteArgs) -> anyhow::Result<()> {
    let spec = BuildSpec::from_file(spec_path)
        .with_context(|| format!("failed to load build spec {}", spec_path.display()))?;

    let transport = remote.transport();
    let options = CreateOptions {
        working_dir: None,
        output,
        remote_dir: remote.remote_dir(),
    };
    let outcome = create_package(
        &spec,
        &options,
        transport.as_ref().map(|t| t as &dyn Transport),
    )?;

    println!(
        "Created archive {} containing {} files",
        outcome.archive_path.display(),
        outcome.manifest.files.len()
    );
    match outcome.remote_path {
        Some(remote_path) => println!("Uploaded to {}", remote_path),
        None => println!("SSH host not provided, skipping upload"),
    }
    Ok(())
}
