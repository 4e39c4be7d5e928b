//! Shared helpers for integration tests
//!
//! `DirTransport` serves a local directory as the remote store so the
//! resolver can be driven end to end without ssh.

#![allow(dead_code)]

use bale_pm::archive::archive_file_name;
use bale_pm::transport::join_remote;
use bale_pm::{BuildSpec, Dependency, Target, Transport, TransportError};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct DirTransport {
    root: PathBuf,
    pub commands: RefCell<Vec<String>>,
    pub downloads: RefCell<Vec<String>>,
}

impl DirTransport {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            commands: RefCell::new(Vec::new()),
            downloads: RefCell::new(Vec::new()),
        }
    }

    fn resolve(&self, remote: &str) -> PathBuf {
        let remote = remote.trim_matches('\'');
        if remote.is_empty() || remote == "." {
            self.root.clone()
        } else {
            self.root.join(remote.trim_start_matches('/'))
        }
    }

    fn failed(&self, detail: &str) -> TransportError {
        TransportError::CommandFailed {
            program: "fake".to_string(),
            status: "exit status: 1".to_string(),
            stderr: detail.to_string(),
        }
    }
}

impl Transport for DirTransport {
    fn run(&self, command: &str) -> Result<String, TransportError> {
        self.commands.borrow_mut().push(command.to_string());

        if let Some(dir) = command.strip_prefix("ls -1 ") {
            let dir = self.resolve(dir);
            let mut names: Vec<String> = fs::read_dir(&dir)
                .map_err(|e| self.failed(&e.to_string()))?
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            return Ok(names.join("\n") + "\n");
        }
        if let Some(dir) = command.strip_prefix("mkdir -p ") {
            fs::create_dir_all(self.resolve(dir))?;
            return Ok(String::new());
        }
        Err(self.failed(&format!("unsupported command: {}", command)))
    }

    fn upload(&self, local_path: &Path, remote_dir: &str) -> Result<String, TransportError> {
        if !remote_dir.is_empty() {
            self.run(&format!("mkdir -p {}", remote_dir))?;
        }
        let file_name = local_path.file_name().unwrap().to_string_lossy().into_owned();
        let remote_path = join_remote(remote_dir, &file_name);
        fs::copy(local_path, self.resolve(&remote_path))?;
        Ok(remote_path)
    }

    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<PathBuf, TransportError> {
        self.downloads.borrow_mut().push(remote_path.to_string());
        fs::create_dir_all(local_dir)?;
        let file_name = remote_path.rsplit('/').next().unwrap();
        let local_path = local_dir.join(file_name);
        fs::copy(self.resolve(remote_path), &local_path)
            .map_err(|e| self.failed(&format!("{}: {}", remote_path, e)))?;
        Ok(local_path)
    }
}

/// Build `<name>-<version>.tar.gz` into `store` with one payload file
///
/// The payload lives at `<name>/VERSION` and contains the version text.
pub fn publish(store: &Path, name: &str, version: &str, deps: Vec<Dependency>) -> PathBuf {
    let work = TempDir::new().unwrap();
    let payload = work.path().join(name);
    fs::create_dir_all(&payload).unwrap();
    fs::write(payload.join("VERSION"), version).unwrap();

    let spec = BuildSpec {
        name: name.to_string(),
        version: version.to_string(),
        targets: vec![Target::new("**")],
        dependencies: deps,
    };
    let output = store.join(archive_file_name(name, version));
    let (path, _) = bale_pm::build(&spec, work.path(), Some(&output)).unwrap();
    path
}

/// Write `files` (relative path, contents) under `root`
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

pub fn names(results: &[bale_pm::InstallResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| format!("{}@{}", r.name, r.version))
        .collect()
}
