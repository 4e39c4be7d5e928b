//! Dependency resolution and installation
//!
//! Requested packages are installed depth-first: each package is downloaded,
//! extracted, and then its own manifest dependencies are installed (in
//! declared order, each subtree completing before the next sibling starts).
//!
//! A run installs at most one version of any package name. A later request
//! for an installed name is a no-op when its constraint is empty or already
//! satisfied and a [`InstallError::Conflict`] otherwise. Dependency cycles end
//! at that check, since the package on the cycle is already installed.

use crate::archive::{extract_archive, ArchiveError};
use crate::catalog::Catalog;
use crate::manifest::{Dependency, Manifest, ManifestError, MANIFEST_FILE};
use crate::semver::{select_best, Constraint, Version, VersionError};
use crate::transport::{Transport, TransportError};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Default limit on the length of a chain of first-time installs
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors that can occur during resolution and installation
#[derive(Debug, Error)]
pub enum InstallError {
    /// Package already installed at a version the new constraint rejects
    #[error("Package {package} already installed with version {installed} which does not satisfy constraint {constraint}")]
    Conflict {
        package: String,
        installed: String,
        constraint: String,
    },

    /// Package not present on the remote store
    #[error("Package {0} not found on remote")]
    PackageNotFound(String),

    /// No remote version satisfies the constraint
    #[error("No versions of {package} satisfy constraint {constraint}")]
    NoMatchingVersion { package: String, constraint: String },

    /// Failed to parse version constraint
    #[error("Failed to parse version constraint for {package}: {error}")]
    InvalidConstraint {
        package: String,
        #[source]
        error: VersionError,
    },

    /// Chain of transitive dependencies too long
    #[error("Dependency chain exceeds {limit} levels at package {package}")]
    DepthExceeded { package: String, limit: usize },

    /// `manifest.json` in the destination is a directory
    #[error("{} is a directory, expected a manifest file", .0.display())]
    ManifestIsDirectory(PathBuf),

    /// Remote store error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Archive extraction error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Installed manifest could not be read
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// One installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub name: String,
    pub version: String,
    /// Downloaded archive
    pub archive_path: PathBuf,
    /// Directory the archive was extracted into
    pub extracted_to: PathBuf,
    /// The package's renamed manifest, if the archive had one
    pub manifest: Option<PathBuf>,
}

/// State of a single resolution run
#[derive(Debug, Default)]
struct Resolution {
    installed: HashMap<String, Version>,
    results: Vec<InstallResult>,
}

/// Installs packages from a [`Catalog`] into a local directory
pub struct Installer<'a> {
    catalog: &'a Catalog,
    transport: &'a dyn Transport,
    local_dir: PathBuf,
    max_depth: usize,
}

impl<'a> Installer<'a> {
    /// Create an installer; an empty `local_dir` means the current directory
    pub fn new(catalog: &'a Catalog, transport: &'a dyn Transport, local_dir: &Path) -> Self {
        let local_dir = if local_dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            local_dir.to_path_buf()
        };
        Self {
            catalog,
            transport,
            local_dir,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the maximum depth of transitive installs
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Install `requested` and everything they depend on
    ///
    /// Results are in installation order. Any error aborts the run; files
    /// already downloaded or extracted are left in place.
    pub fn install(&self, requested: &[Dependency]) -> Result<Vec<InstallResult>, InstallError> {
        let mut run = Resolution::default();
        for dep in requested {
            self.install_package(dep, 0, &mut run)?;
        }
        Ok(run.results)
    }

    fn install_package(
        &self,
        dep: &Dependency,
        depth: usize,
        run: &mut Resolution,
    ) -> Result<(), InstallError> {
        if let Some(installed) = run.installed.get(&dep.name) {
            let Some(text) = dep.constraint() else {
                debug!(package = %dep.name, "already installed");
                return Ok(());
            };
            let constraint = parse_constraint(&dep.name, text)?;
            if constraint.matches(installed) {
                debug!(package = %dep.name, %constraint, "already installed and satisfied");
                return Ok(());
            }
            return Err(InstallError::Conflict {
                package: dep.name.clone(),
                installed: installed.to_string(),
                constraint: text.to_string(),
            });
        }

        if depth > self.max_depth {
            return Err(InstallError::DepthExceeded {
                package: dep.name.clone(),
                limit: self.max_depth,
            });
        }

        let candidates = self.catalog.candidates(&dep.name);
        if candidates.is_empty() {
            return Err(InstallError::PackageNotFound(dep.name.clone()));
        }

        let constraint = dep
            .constraint()
            .map(|text| parse_constraint(&dep.name, text))
            .transpose()?;
        let selected = select_best(candidates, constraint.as_ref()).ok_or_else(|| {
            InstallError::NoMatchingVersion {
                package: dep.name.clone(),
                constraint: dep.constraint().unwrap_or_default().to_string(),
            }
        })?;
        let version = selected.version.to_string();

        info!(package = %dep.name, %version, depth, "installing");
        let archive_path = self.transport.download(&selected.path, &self.local_dir)?;
        extract_archive(&archive_path, &self.local_dir)?;
        let manifest_path = ensure_manifest_unique(&self.local_dir, &dep.name, &version)?;

        run.installed
            .insert(dep.name.clone(), selected.version.clone());
        run.results.push(InstallResult {
            name: dep.name.clone(),
            version,
            archive_path,
            extracted_to: self.local_dir.clone(),
            manifest: manifest_path.clone(),
        });

        let children = match manifest_path {
            Some(path) => Manifest::from_file(&path)?.dependencies,
            None => Vec::new(),
        };
        for child in &children {
            self.install_package(child, depth + 1, run)?;
        }
        Ok(())
    }
}

fn parse_constraint(package: &str, text: &str) -> Result<Constraint, InstallError> {
    Constraint::parse(text).map_err(|error| InstallError::InvalidConstraint {
        package: package.to_string(),
        error,
    })
}

/// Move an extracted `manifest.json` to a per-package name
///
/// Returns `None` when the archive did not contain a manifest.
pub fn ensure_manifest_unique(
    dir: &Path,
    package: &str,
    version: &str,
) -> Result<Option<PathBuf>, InstallError> {
    let src = dir.join(MANIFEST_FILE);
    match fs::metadata(&src) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
        Ok(metadata) if metadata.is_dir() => return Err(InstallError::ManifestIsDirectory(src)),
        Ok(_) => {}
    }

    let target = dir.join(manifest_filename(package, version));
    fs::rename(&src, &target)?;
    Ok(Some(target))
}

/// `manifest-<name>-<version>.json`, with unsafe characters replaced by `_`
pub fn manifest_filename(package: &str, version: &str) -> String {
    format!("manifest-{}-{}.json", sanitize(package), sanitize(version))
}

fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}
