/// Error types for the build orchestrator

use std::path::PathBuf;

use entforge_entities::{Diagnostic, EntityKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration in {file}: {message}")]
    Config { file: PathBuf, message: String },

    #[error("the --merged and --separate options cannot be used together")]
    ConflictingModes,

    #[error("required file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("compilation of {project} failed:\n{}", format_diagnostics(.diagnostics))]
    Compilation {
        project: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("entity '{key}' from {project} collides with an entity already written to the package")]
    DuplicateEntity { key: String, project: String },

    #[error("entity '{name}' of kind {kind:?} cannot be exported; only things and data shapes expose an API")]
    UnsupportedExport { name: String, kind: EntityKind },
}

impl BuildError {
    pub fn config(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BuildError::Config {
            file: file.into(),
            message: message.into(),
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  - {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}
