/// Writes compiled entities into a package output directory
///
/// Emission is the only place deployment endpoints are collected; dropping
/// one here is silent data loss, so the store walk and the endpoint append
/// live in the same loop. The emitter also tracks every document path
/// written during the invocation: in a merged build two sub-projects may
/// declare the same entity, and that collision is flagged instead of
/// letting the later writer win.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use entforge_entities::{EntityKind, EntityStore};
use tracing::debug;

use crate::error::{BuildError, Result};

pub struct EntityEmitter<'a> {
    out_dir: &'a Path,
    project: &'a str,
    /// Document paths written so far in this invocation, shared across
    /// projects so merged builds detect cross-project collisions.
    written: &'a mut HashSet<PathBuf>,
}

impl<'a> EntityEmitter<'a> {
    pub fn new(out_dir: &'a Path, project: &'a str, written: &'a mut HashSet<PathBuf>) -> Self {
        Self {
            out_dir,
            project,
            written,
        }
    }

    /// Walk the store in insertion order, write each entity's document, and
    /// append its deployment endpoints (in declaration order) to the
    /// invocation-wide list. Reserved bookkeeping keys are skipped.
    pub fn emit_store(&mut self, store: &EntityStore, endpoints: &mut Vec<String>) -> Result<()> {
        for (_, entity) in store.emittable() {
            self.write_document(entity.kind, &entity.name, &entity.body)?;
            endpoints.extend(entity.deployment_endpoints.iter().cloned());
        }
        Ok(())
    }

    /// Write a single document under `Entities/<Kind>/<name>.xml`, flagging
    /// a collision if the path was already produced this invocation.
    pub fn write_document(&mut self, kind: EntityKind, name: &str, body: &str) -> Result<()> {
        let dir = self.out_dir.join("Entities").join(kind.collection());
        let path = dir.join(format!("{}.xml", name));
        if !self.written.insert(path.clone()) {
            return Err(BuildError::DuplicateEntity {
                key: name.to_string(),
                project: self.project.to_string(),
            });
        }

        fs::create_dir_all(&dir)?;
        fs::write(&path, body)?;
        debug!(path = %path.display(), "wrote entity document");
        Ok(())
    }
}
