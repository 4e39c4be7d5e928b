//! Build and update spec files
//!
//! A build spec names the package, its version, the file-selection targets
//! and the dependencies recorded in the archive manifest:
//!
//! ```yaml
//! name: libfoo
//! ver: 1.2.0
//! targets:
//!   - "bin/*"
//!   - path: "src/**/*.go"
//!     exclude: ["*_test.go", "src/internal/gen.go"]
//! packets:
//!   - name: libbar
//!     ver: ">=2.0"
//! ```
//!
//! An update spec lists the packages to install under `packages`.
//! JSON, YAML and TOML are accepted; the format is picked by extension.

use crate::manifest::Dependency;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a spec file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read spec file
    #[error("Failed to read spec file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Failed to parse TOML
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid spec: {0}")]
    ValidationError(String),
}

/// A file-selection rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TargetEntry")]
pub struct Target {
    /// Glob pattern relative to the working directory
    pub pattern: String,

    /// Exclusion globs; entries without `/` match file names anywhere
    pub exclude: Vec<String>,
}

impl Target {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            exclude: Vec::new(),
        }
    }

    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(exclude.into_iter().map(Into::into));
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Pattern(String),
    Detailed {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        exclude: Option<OneOrMany>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<TargetEntry> for Target {
    type Error = String;

    fn try_from(entry: TargetEntry) -> Result<Self, Self::Error> {
        match entry {
            TargetEntry::Pattern(pattern) => Ok(Target::new(pattern)),
            TargetEntry::Detailed { path, exclude } => {
                let pattern = path
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| "target object must have non-empty path".to_string())?;
                let exclude = match exclude {
                    None => Vec::new(),
                    Some(OneOrMany::One(entry)) => vec![entry],
                    Some(OneOrMany::Many(entries)) => entries,
                };
                Ok(Target { pattern, exclude })
            }
        }
    }
}

/// Build spec: what goes into one archive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildSpec {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "ver", default)]
    pub version: String,

    #[serde(default)]
    pub targets: Vec<Target>,

    /// Dependencies recorded in the manifest
    #[serde(rename = "packets", default)]
    pub dependencies: Vec<Dependency>,
}

/// Update spec: which packages to install
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateSpec {
    #[serde(default)]
    pub packages: Vec<Dependency>,
}

impl BuildSpec {
    /// Load and validate a build spec
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let spec: BuildSpec = parse_by_extension(path, &content)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the spec
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "package spec missing name".to_string(),
            ));
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "package spec missing version".to_string(),
            ));
        }
        if self.targets.is_empty() {
            return Err(ConfigError::ValidationError(
                "package spec must define at least one target".to_string(),
            ));
        }
        validate_dependencies(&self.dependencies)
    }
}

impl UpdateSpec {
    /// Load and validate an update spec
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let spec: UpdateSpec = parse_by_extension(path, &content)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the spec
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packages.is_empty() {
            return Err(ConfigError::ValidationError(
                "update spec must declare packages".to_string(),
            ));
        }
        validate_dependencies(&self.packages)
    }
}

fn validate_dependencies(deps: &[Dependency]) -> Result<(), ConfigError> {
    if deps.iter().any(|dep| dep.name.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "dependency name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_by_extension<T>(path: &Path, content: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("json") => Ok(serde_json::from_str(content)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(content)?),
        Some("toml") => Ok(toml::from_str(content)?),
        _ => match serde_json::from_str(content) {
            Ok(spec) => Ok(spec),
            Err(json_err) => serde_yaml::from_str(content)
                .or_else(|_| toml::from_str(content))
                .map_err(|_: toml::de::Error| ConfigError::JsonError(json_err)),
        },
    }
}
