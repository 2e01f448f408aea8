/// Exported-API declaration generation
///
/// Walks a compiled store and produces a declarations file for downstream
/// consumers: an interface per exported data shape and a class per exported
/// thing. Any other exported kind is a fatal error rather than a silently
/// dropped entity.

use std::fmt::Write;

use entforge_entities::{EntityKind, EntityStore, ExportedApi};

use crate::error::{BuildError, Result};

/// File the declarations are written to, under the `api/` directory.
pub const DECLARATIONS_FILE: &str = "declarations.d.ts";

pub fn generate_declarations(store: &EntityStore) -> Result<String> {
    let mut out = String::new();

    for (_, entity) in store.emittable() {
        let Some(api) = &entity.exported_api else {
            continue;
        };

        match entity.kind {
            EntityKind::DataShape => write_shape_interface(&mut out, api),
            EntityKind::Thing => write_thing_class(&mut out, api),
            kind => {
                return Err(BuildError::UnsupportedExport {
                    name: entity.name.clone(),
                    kind,
                });
            }
        }
    }

    Ok(out)
}

fn write_shape_interface(out: &mut String, api: &ExportedApi) {
    // Infallible writes to a String
    let _ = writeln!(out, "export interface {} {{", api.name);
    for field in &api.fields {
        let _ = writeln!(out, "    {}: {};", field.name, field.base_type);
    }
    let _ = writeln!(out, "}}");
}

fn write_thing_class(out: &mut String, api: &ExportedApi) {
    let _ = writeln!(out, "export class {} {{", api.name);
    for service in &api.services {
        let params = service
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.base_type))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "    {}({}): {};", service.name, params, service.result_type);
    }
    let _ = writeln!(out, "}}");
}
