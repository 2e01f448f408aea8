/// Project resolution and output-directory management
///
/// Decides whether the repository builds as a single project or as a set of
/// auto-discovered sub-projects, and where each project's package lands.
/// Sub-projects are the directories under `src/` that carry a `unit.json`,
/// visited in name order so repeated builds are deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BuildOptions, UNIT_FILE};
use crate::error::{BuildError, Result};

/// Directory under the repository root that receives all build output.
pub const BUILD_DIR: &str = "build";

/// How sub-project output is packaged in auto-discovery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingMode {
    /// All sub-projects share one output directory and form one package.
    Merged,
    /// Each sub-project gets its own output directory and package.
    Separate,
}

impl PackagingMode {
    /// Resolve the requested flags into a mode. Requesting both is a fatal
    /// configuration conflict, raised before anything touches the
    /// filesystem; requesting neither defaults to separate packaging.
    pub fn resolve(merged: bool, separate: bool) -> Result<Self> {
        match (merged, separate) {
            (true, true) => Err(BuildError::ConflictingModes),
            (true, false) => Ok(PackagingMode::Merged),
            _ => Ok(PackagingMode::Separate),
        }
    }
}

/// One project to compile: its name, where its sources live, and where its
/// package is written. Constructed fresh per invocation and never mutated.
#[derive(Debug, Clone)]
pub struct ProjectUnit {
    pub name: String,
    pub source_root: PathBuf,
    pub out_dir: PathBuf,
}

pub struct ProjectResolver<'a> {
    repo_root: &'a Path,
    options: &'a BuildOptions,
    mode: PackagingMode,
}

impl<'a> ProjectResolver<'a> {
    pub fn new(repo_root: &'a Path, options: &'a BuildOptions, mode: PackagingMode) -> Self {
        Self {
            repo_root,
            options,
            mode,
        }
    }

    /// Determine the projects to build and prepare their output directories.
    ///
    /// Any pre-existing build output is removed in full first, so entities
    /// deleted from the sources do not survive into the new package.
    pub fn resolve(&self) -> Result<Vec<ProjectUnit>> {
        let build_root = self.repo_root.join(BUILD_DIR);
        if build_root.exists() {
            fs::remove_dir_all(&build_root)?;
        }
        fs::create_dir_all(&build_root)?;

        if !self.options.is_multi_project() {
            return Ok(vec![ProjectUnit {
                name: self.options.project_name.clone(),
                source_root: self.repo_root.to_path_buf(),
                out_dir: build_root,
            }]);
        }

        let mut projects = Vec::new();
        for (name, source_root) in self.discover()? {
            let out_dir = match self.mode {
                PackagingMode::Merged => build_root.clone(),
                PackagingMode::Separate => build_root.join(&name),
            };
            fs::create_dir_all(&out_dir)?;
            projects.push(ProjectUnit {
                name,
                source_root,
                out_dir,
            });
        }
        Ok(projects)
    }

    /// Sub-projects are directories under `src/` containing a unit
    /// configuration, sorted by name.
    fn discover(&self) -> Result<Vec<(String, PathBuf)>> {
        let src_root = self.repo_root.join("src");
        if !src_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(&src_root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() || !path.join(UNIT_FILE).exists() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            found.push((name, path));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }
}
