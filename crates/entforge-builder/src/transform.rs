/// Reference compiler pass over declarative entity sources
///
/// Source modules are `*.entity.json` files describing one entity each. The
/// analysis pass collects and validates them into the store; the emit pass
/// renders the final document bodies. This keeps the pass boundary honest
/// without tying the orchestrator to any particular source language.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use entforge_entities::{
    Diagnostic, EntityDescriptor, EntityKind, EntityStore, ExportedApi, FieldDef, ServiceDef,
};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use serde::Deserialize;
use tracing::debug;

use crate::config::BuildOptions;
use crate::error::Result;
use crate::pass::{CompilerPass, PassFactory, PassOutcome, PassPhase};
use crate::project::{BUILD_DIR, ProjectUnit};

const SOURCE_SUFFIX: &str = ".entity.json";

/// One declared entity as authored in a source module.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntitySource {
    kind: EntityKind,
    name: String,
    #[serde(default)]
    endpoints: Vec<String>,
    #[serde(default)]
    exported: bool,
    #[serde(default)]
    exported_name: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDef>,
    #[serde(default)]
    services: Vec<ServiceDef>,
}

pub struct TransformerFactory;

impl PassFactory for TransformerFactory {
    fn create_pass(
        &self,
        project: &ProjectUnit,
        phase: PassPhase,
        debug: bool,
        _options: &BuildOptions,
    ) -> Box<dyn CompilerPass> {
        Box::new(TransformerPass {
            source_root: project.source_root.clone(),
            phase,
            debug,
        })
    }
}

struct TransformerPass {
    source_root: PathBuf,
    phase: PassPhase,
    debug: bool,
}

impl CompilerPass for TransformerPass {
    fn run(&mut self, store: &mut EntityStore) -> Result<PassOutcome> {
        match self.phase {
            PassPhase::Analysis => self.analyze(store),
            PassPhase::Emit => self.emit(store),
        }
    }
}

impl TransformerPass {
    /// Collect every source module into the store, reporting validation
    /// problems as diagnostics.
    fn analyze(&self, store: &mut EntityStore) -> Result<PassOutcome> {
        let mut diagnostics = Vec::new();

        for path in self.source_files()? {
            let source = match self.parse(&path) {
                Ok(source) => source,
                Err(message) => {
                    diagnostics.push(Diagnostic::error(message).with_file(&path));
                    continue;
                }
            };

            if store.get(&source.name).is_some() {
                diagnostics.push(
                    Diagnostic::error(format!("duplicate entity '{}'", source.name))
                        .with_file(&path),
                );
                continue;
            }
            if source.endpoints.is_empty() && self.debug {
                debug!(entity = %source.name, "entity declares no deployment endpoints");
            }

            let descriptor = self.descriptor(&source, String::new());
            store.insert(source.name.clone(), descriptor);
        }

        Ok(PassOutcome {
            diagnostics,
            emit_skipped: false,
        })
    }

    /// Render the final document bodies. Parse failures and duplicate names
    /// were already reported by the analysis pass; here they only decide
    /// whether emission happens at all. A duplicate must not reach the store
    /// again, or the later declaration would overwrite the earlier one and
    /// drop its deployment endpoints.
    fn emit(&self, store: &mut EntityStore) -> Result<PassOutcome> {
        let skipped = PassOutcome {
            diagnostics: Vec::new(),
            emit_skipped: true,
        };

        let mut sources = Vec::new();
        let mut names = HashSet::new();
        for path in self.source_files()? {
            match self.parse(&path) {
                Ok(source) => {
                    if !names.insert(source.name.clone()) {
                        return Ok(skipped);
                    }
                    sources.push(source);
                }
                Err(_) => return Ok(skipped),
            }
        }

        let mut diagnostics = Vec::new();
        for source in sources {
            let body = body_xml(&source)?;
            if source.services.is_empty() && source.kind == EntityKind::Thing {
                diagnostics.push(Diagnostic::warning(format!(
                    "thing '{}' declares no services",
                    source.name
                )));
            }
            let descriptor = self.descriptor(&source, body);
            store.insert(source.name.clone(), descriptor);
        }

        Ok(PassOutcome {
            diagnostics,
            emit_skipped: false,
        })
    }

    fn descriptor(&self, source: &EntitySource, body: String) -> EntityDescriptor {
        let mut descriptor = EntityDescriptor::new(source.kind, source.name.clone(), body);
        for endpoint in &source.endpoints {
            descriptor = descriptor.endpoint(endpoint.clone());
        }
        if source.exported {
            descriptor = descriptor.exported(ExportedApi {
                name: source
                    .exported_name
                    .clone()
                    .unwrap_or_else(|| source.name.clone()),
                fields: source.fields.clone(),
                services: source.services.clone(),
            });
        }
        descriptor
    }

    fn parse(&self, path: &Path) -> std::result::Result<EntitySource, String> {
        let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&text).map_err(|e| e.to_string())
    }

    /// Source modules under the project root, in path order so the store's
    /// insertion order is stable across builds.
    fn source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_sources(&self.source_root, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn collect_sources(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if path.is_dir() {
            // Never descend into build output or hidden directories
            if name == BUILD_DIR || name == "api" || name.starts_with('.') {
                continue;
            }
            collect_sources(&path, out)?;
        } else if name.ends_with(SOURCE_SUFFIX) {
            out.push(path);
        }
    }
    Ok(())
}

fn body_xml(source: &EntitySource) -> Result<String> {
    let collection = source.kind.collection();
    let element = match source.kind {
        EntityKind::Thing => "Thing",
        EntityKind::Template => "Template",
        EntityKind::DataShape => "DataShape",
        EntityKind::Project => "Project",
    };

    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("Entities")))?;
    writer.write_event(Event::Start(BytesStart::new(collection)))?;

    let mut root = BytesStart::new(element);
    root.push_attribute(("name", source.name.as_str()));
    writer.write_event(Event::Start(root))?;

    if !source.fields.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("FieldDefinitions")))?;
        for field in &source.fields {
            let mut def = BytesStart::new("FieldDefinition");
            def.push_attribute(("name", field.name.as_str()));
            def.push_attribute(("baseType", field.base_type.as_str()));
            writer.write_event(Event::Empty(def))?;
        }
        writer.write_event(Event::End(BytesEnd::new("FieldDefinitions")))?;
    }

    if !source.services.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("ServiceDefinitions")))?;
        for service in &source.services {
            let mut def = BytesStart::new("ServiceDefinition");
            def.push_attribute(("name", service.name.as_str()));
            def.push_attribute(("resultType", service.result_type.as_str()));
            writer.write_event(Event::Empty(def))?;
        }
        writer.write_event(Event::End(BytesEnd::new("ServiceDefinitions")))?;
    }

    writer.write_event(Event::End(BytesEnd::new(element)))?;
    writer.write_event(Event::End(BytesEnd::new(collection)))?;
    writer.write_event(Event::End(BytesEnd::new("Entities")))?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
