//! Package archives (`<name>-<version>.tar.gz`)
//!
//! An archive is a gzip-compressed tar file. The first member is
//! `manifest.json`; the remaining members are the selected files in sorted
//! order, stored under their working-directory-relative paths.

use crate::config::{BuildSpec, Target};
use crate::manifest::{Manifest, ManifestError, MANIFEST_FILE};
use crate::pattern::{ExcludeSet, PathPattern, PatternError};
use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File extension of package archives
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Mode of the generated `manifest.json` member
const MANIFEST_MODE: u32 = 0o644;

/// Errors that can occur while building or reading archives
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// A target pattern or exclude entry is not a valid glob
    #[error(transparent)]
    PatternError(#[from] PatternError),

    /// The targets selected no files
    #[error("No files matched targets of package {0}")]
    NoMatch(String),

    /// Manifest could not be serialized or parsed
    #[error(transparent)]
    ManifestError(#[from] ManifestError),

    /// Archive has no manifest member
    #[error("Archive {} does not contain {}", .0.display(), MANIFEST_FILE)]
    MissingManifest(PathBuf),
}

/// Conventional archive file name for a package
pub fn archive_file_name(name: &str, version: &str) -> String {
    format!("{}-{}{}", name, version, ARCHIVE_SUFFIX)
}

/// Build an archive for `spec` from the files under `working_dir`
///
/// Writes to `output` when given, otherwise to
/// `<working_dir>/<name>-<version>.tar.gz`. Returns the archive path and the
/// manifest stored inside it.
pub fn build(
    spec: &BuildSpec,
    working_dir: &Path,
    output: Option<&Path>,
) -> Result<(PathBuf, Manifest), ArchiveError> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => working_dir.join(archive_file_name(&spec.name, &spec.version)),
    };

    // Never archive the file we are about to overwrite.
    let skip = output_within(&output, working_dir)?;
    let files = collect_files(&spec.targets, working_dir, skip.as_deref())?;
    if files.is_empty() {
        return Err(ArchiveError::NoMatch(spec.name.clone()));
    }

    let manifest = Manifest {
        name: spec.name.clone(),
        version: spec.version.clone(),
        created_at: Utc::now(),
        dependencies: spec.dependencies.clone(),
        files,
    };

    write_archive(&output, working_dir, &manifest)?;
    info!(
        archive = %output.display(),
        files = manifest.files.len(),
        "created package {}-{}",
        manifest.name,
        manifest.version
    );

    Ok((output, manifest))
}

/// Select the files matched by `targets`, sorted and without duplicates
///
/// Targets are applied in order. A path taken by an earlier target is not
/// checked again against a later target's excludes.
pub fn collect_files(
    targets: &[Target],
    base_dir: &Path,
    skip: Option<&str>,
) -> Result<Vec<String>, ArchiveError> {
    let mut tree = Vec::new();
    walk_files(base_dir, base_dir, &mut tree)?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for target in targets {
        let pattern = PathPattern::new(&clean_pattern(&target.pattern, base_dir))?;
        let excludes = ExcludeSet::new(target.exclude.as_slice())?;

        for rel in &tree {
            if Some(rel.as_str()) == skip || !pattern.matches(rel) {
                continue;
            }
            if excludes.excludes(rel) {
                debug!(file = %rel, pattern = %target.pattern, "excluded");
                continue;
            }
            if seen.insert(rel.clone()) {
                files.push(rel.clone());
            }
        }
    }

    files.sort();
    Ok(files)
}

fn clean_pattern(pattern: &str, base_dir: &Path) -> String {
    let pattern = pattern.replace('\\', "/");
    let pattern = pattern.strip_prefix("./").unwrap_or(&pattern);
    let base = format!("{}/", base_dir.to_string_lossy().replace('\\', "/"));
    pattern.strip_prefix(base.as_str()).unwrap_or(pattern).to_string()
}

/// Path of `output` relative to `base_dir`, if it lies inside it
///
/// Both sides are canonicalized so a relative output and an absolute working
/// directory still compare. A missing output directory cannot hold a previous
/// archive, so it yields `None`.
fn output_within(output: &Path, base_dir: &Path) -> io::Result<Option<String>> {
    let Some(file_name) = output.file_name() else {
        return Ok(None);
    };
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = match fs::canonicalize(parent) {
        Ok(parent) => parent,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let base = fs::canonicalize(base_dir)?;
    Ok(parent
        .join(file_name)
        .strip_prefix(&base)
        .ok()
        .map(relative_text))
}

fn relative_text(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Recursively list regular files under `dir` as paths relative to `base`
///
/// Symlinks to files are included; symlinked directories are not entered.
/// Symlinks that cannot be followed are listed too, so selecting one fails
/// with the underlying IO error when the archive is written.
fn walk_files(base: &Path, dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        let is_file = if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(metadata) => metadata.is_file(),
                Err(_) => true,
            }
        } else {
            file_type.is_file()
        };

        if file_type.is_dir() {
            walk_files(base, &path, out)?;
        } else if is_file {
            if let Ok(rel) = path.strip_prefix(base) {
                out.push(relative_text(rel));
            }
        }
    }
    Ok(())
}

fn write_archive(output: &Path, base_dir: &Path, manifest: &Manifest) -> Result<(), ArchiveError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let manifest_data = manifest.to_json_pretty()?;
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(manifest_data.len() as u64);
    header.set_mode(MANIFEST_MODE);
    header.set_mtime(manifest.created_at.timestamp().max(0) as u64);
    builder.append_data(&mut header, MANIFEST_FILE, manifest_data.as_slice())?;

    for rel in &manifest.files {
        let mut file = File::open(base_dir.join(rel))?;
        let metadata = file.metadata()?;
        let mut header = tar::Header::new_gnu();
        header.set_metadata(&metadata);
        debug!(file = %rel, size = metadata.len(), "adding");
        builder.append_data(&mut header, rel, &mut file)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

/// Extract an archive into `dest`, keeping each member's permission bits
///
/// Existing files at the same paths are overwritten.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<(), ArchiveError> {
    fs::create_dir_all(dest)?;
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    archive.unpack(dest)?;
    Ok(())
}

/// Member paths of an archive, in stored order
pub fn list_members(archive_path: &Path) -> Result<Vec<String>, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut members = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        members.push(relative_text(&entry.path()?));
    }
    Ok(members)
}

/// Read the manifest stored in an archive without extracting it
pub fn read_manifest(archive_path: &Path) -> Result<Manifest, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.path()?.as_os_str() == MANIFEST_FILE {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            return Ok(Manifest::from_json(&content)?);
        }
    }
    Err(ArchiveError::MissingManifest(archive_path.to_path_buf()))
}
