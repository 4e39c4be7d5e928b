//! Remote package catalog
//!
//! The remote store is a flat directory of `<name>-<version>.tar.gz` files.
//! Its listing is grouped by package name with versions sorted highest first.

use crate::archive::ARCHIVE_SUFFIX;
use crate::semver::Version;
use crate::transport::{join_remote, shell_escape, Transport, TransportError};
use std::collections::HashMap;
use tracing::debug;

/// One archive available on the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePackage {
    pub name: String,
    pub version: Version,
    /// Path on the remote host
    pub path: String,
}

impl AsRef<Version> for RemotePackage {
    fn as_ref(&self) -> &Version {
        &self.version
    }
}

/// Split `<name>-<version>.tar.gz` at the last hyphen
///
/// The name keeps any hyphens of its own. Returns `None` when the file is
/// not an archive or the trailing part is not a valid version.
pub fn parse_archive_name(file_name: &str) -> Option<(String, Version)> {
    let stem = file_name.strip_suffix(ARCHIVE_SUFFIX)?;
    let (name, version) = stem.rsplit_once('-')?;
    if name.is_empty() {
        return None;
    }
    let version = Version::parse(version).ok()?;
    Some((name.to_string(), version))
}

/// Parse `ls -1` output of `remote_dir` into packages, skipping other files
pub fn parse_listing(remote_dir: &str, listing: &str) -> Vec<RemotePackage> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse_archive_name(line) {
            Some((name, version)) => Some(RemotePackage {
                name,
                version,
                path: remote_path(remote_dir, line),
            }),
            None => {
                debug!(entry = line, "ignoring remote entry");
                None
            }
        })
        .collect()
}

fn remote_path(remote_dir: &str, file_name: &str) -> String {
    if remote_dir.is_empty() || remote_dir == "." {
        file_name.to_string()
    } else {
        join_remote(remote_dir, file_name)
    }
}

/// List the packages stored in `remote_dir` (the login directory when empty)
pub fn list_remote(
    transport: &dyn Transport,
    remote_dir: &str,
) -> Result<Vec<RemotePackage>, TransportError> {
    let dir = if remote_dir.is_empty() { "." } else { remote_dir };
    let listing = transport.run(&format!("ls -1 {}", shell_escape(dir)))?;
    Ok(parse_listing(dir, &listing))
}

/// Remote packages grouped by name, each group sorted highest version first
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: HashMap<String, Vec<RemotePackage>>,
}

impl Catalog {
    pub fn from_entries(entries: impl IntoIterator<Item = RemotePackage>) -> Self {
        let mut packages: HashMap<String, Vec<RemotePackage>> = HashMap::new();
        for entry in entries {
            packages.entry(entry.name.clone()).or_default().push(entry);
        }
        // Stable sort: equal versions keep their listing order.
        for group in packages.values_mut() {
            group.sort_by(|a, b| b.version.cmp(&a.version));
        }
        Self { packages }
    }

    /// Candidates for `name`, highest version first; empty when unknown
    pub fn candidates(&self, name: &str) -> &[RemotePackage] {
        self.packages.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct package names
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
