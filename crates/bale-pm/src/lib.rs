//! Bale package manager library
//!
//! This crate provides the building blocks of the `bale` tool:
//! - Version parsing and constraint matching
//! - Glob path patterns with `**` support
//! - Build/update spec loading (JSON, YAML, TOML)
//! - Deterministic package archives with an embedded manifest
//! - Remote catalog listing and the SSH transport
//! - Depth-first dependency resolution and installation

pub mod archive;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod manifest;
pub mod pattern;
pub mod resolver;
pub mod semver;
pub mod transport;

pub use archive::{build, extract_archive, ArchiveError};
pub use catalog::{Catalog, RemotePackage};
pub use config::{BuildSpec, ConfigError, Target, UpdateSpec};
pub use manifest::{Dependency, Manifest, ManifestError};
pub use pattern::{match_path, ExcludeSet, PathPattern, PatternError};
pub use resolver::{InstallError, InstallResult, Installer};
pub use semver::{select_best, Constraint, Operator, Version, VersionError};
pub use transport::{shell_escape, SshConfig, SshTransport, Transport, TransportError};
