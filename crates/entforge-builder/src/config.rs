/// Configuration documents read at invocation start
///
/// Three JSON documents feed a build, all owned by external tooling and
/// consumed here as tolerant typed structures:
/// - `entforge.json`: build options (project identity, dependency lists,
///   feature toggles)
/// - `extension.json`: package identity (name, version, author, description,
///   update source)
/// - `unit.json`: a compilation unit's local inclusion rules, present in each
///   sub-project of a multi-project repository

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BuildError, Result};

/// Sentinel project name that enables sub-project auto-discovery.
pub const AUTO_PROJECT: &str = "@auto";

pub const OPTIONS_FILE: &str = "entforge.json";
pub const PACKAGE_FILE: &str = "extension.json";
pub const UNIT_FILE: &str = "unit.json";
pub const METADATA_TEMPLATE: &str = "metadata.xml";

/// Build options document (`entforge.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// Concrete project name, or [`AUTO_PROJECT`] for auto-discovery.
    pub project_name: String,
    /// Synthesize a project descriptor entity per project.
    pub generate_project_entity: bool,
    /// Propagate configured and inferred dependencies into the descriptor.
    pub include_project_dependencies: bool,
    pub extension_dependencies: Vec<String>,
    pub project_dependencies: Vec<String>,
    /// Overrides the package's declared minimum platform version.
    pub minimum_platform_version: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            generate_project_entity: false,
            include_project_dependencies: false,
            extension_dependencies: Vec::new(),
            project_dependencies: Vec::new(),
            minimum_platform_version: None,
        }
    }
}

impl BuildOptions {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    pub fn is_multi_project(&self) -> bool {
        self.project_name == AUTO_PROJECT
    }
}

/// Package identity document (`extension.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub minimum_platform_version: Option<String>,
    pub auto_update: Option<AutoUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutoUpdate {
    #[serde(rename = "gitHubURL")]
    pub github_url: Option<String>,
}

impl PackageIdentity {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }
}

/// A compilation unit's local configuration (`unit.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Compiler-inclusion paths; sibling-project references are inferred
    /// from these when dependency propagation is enabled.
    pub include: Vec<String>,
}

impl UnitConfig {
    /// Load the unit configuration if present. Sub-projects carry one; a
    /// single-project repository may not.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        read_json(path).map(Some)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(BuildError::FileNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| BuildError::config(path, e.to_string()))
}
