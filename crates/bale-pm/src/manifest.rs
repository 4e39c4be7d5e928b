//! Package manifest (manifest.json)
//!
//! Every archive carries a `manifest.json` as its first member. The resolver
//! reads it back after extraction to discover transitive dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// File name of the manifest inside an archive
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors that can occur while reading or writing a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse or serialize JSON
    #[error("Invalid manifest JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A named dependency with an optional version constraint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    /// Package name
    pub name: String,

    /// Version constraint (`>=1.2`, `=2.0`, ...); empty means the highest version
    #[serde(rename = "ver", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Dependency {
    /// Dependency on the highest available version
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Dependency with a version constraint
    pub fn with_constraint(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(constraint.into()),
        }
    }

    /// The constraint text, or `None` when unset or blank
    pub fn constraint(&self) -> Option<&str> {
        self.version
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub created_at: DateTime<Utc>,

    /// Declared dependencies, in declaration order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: Vec<Dependency>,

    /// Archived files: relative paths, sorted and unique
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<String>,
}

impl Manifest {
    /// Read a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Parse a manifest from JSON text
    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize as indented JSON
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, ManifestError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

// Manifests written by older tools store an empty list as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
