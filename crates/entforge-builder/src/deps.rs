/// Project dependency synthesis and the project descriptor document
///
/// Sub-projects declare cross-references through their compilation unit's
/// inclusion rules rather than a dedicated dependency manifest, so the
/// dependency list is partly inferred: an include path shaped like
/// `../<Name>` names a sibling project, while wildcard patterns and
/// extension-bearing paths denote file inclusion and are ignored.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::config::{BuildOptions, UnitConfig};
use crate::error::Result;

/// Dependencies carried by a project descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencySummary {
    pub extensions: Vec<String>,
    pub projects: Vec<String>,
}

/// Derive a project's dependency summary from its configuration and, for a
/// sub-project, its local inclusion paths. Empty when propagation is
/// disabled.
pub fn synthesize(options: &BuildOptions, unit: Option<&UnitConfig>) -> DependencySummary {
    if !options.include_project_dependencies {
        return DependencySummary::default();
    }

    let mut summary = DependencySummary {
        extensions: options.extension_dependencies.clone(),
        projects: options.project_dependencies.clone(),
    };
    if let Some(unit) = unit {
        summary.projects.extend(sibling_references(&unit.include));
    }
    summary
}

/// Extract sibling-project names from inclusion paths.
///
/// A path qualifies only if it has exactly two `/`-separated segments, the
/// first is the parent-directory sentinel, and the second contains neither a
/// wildcard nor a dot.
pub fn sibling_references(include: &[String]) -> Vec<String> {
    include
        .iter()
        .filter_map(|path| {
            let segments: Vec<&str> = path.split('/').collect();
            if segments.len() != 2 || segments[0] != ".." {
                return None;
            }
            let name = segments[1];
            if name.contains('*') || name.contains('.') {
                return None;
            }
            Some(name.to_string())
        })
        .collect()
}

/// Render the project descriptor document for a project with the given
/// dependency summary. The `dependsOn` payload carries the dependency lists
/// as comma-joined strings.
pub fn project_descriptor_xml(name: &str, deps: &DependencySummary) -> Result<String> {
    let depends_on = serde_json::json!({
        "extensions": deps.extensions.join(","),
        "projects": deps.projects.join(","),
    })
    .to_string();

    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("Entities")))?;
    writer.write_event(Event::Start(BytesStart::new("Projects")))?;

    let mut project = BytesStart::new("Project");
    project.push_attribute(("artifactId", ""));
    project.push_attribute(("aspect.projectType", "Component"));
    project.push_attribute(("dependsOn", depends_on.as_str()));
    project.push_attribute(("description", ""));
    project.push_attribute(("documentationContent", ""));
    project.push_attribute(("groupId", ""));
    project.push_attribute(("homeMashup", ""));
    project.push_attribute(("minPlatformVersion", ""));
    project.push_attribute(("name", name));
    project.push_attribute(("packageVersion", "1.0.0"));
    project.push_attribute(("projectName", name));
    project.push_attribute(("publishResult", ""));
    project.push_attribute(("state", "DRAFT"));
    project.push_attribute(("tags", ""));
    writer.write_event(Event::Empty(project))?;

    writer.write_event(Event::End(BytesEnd::new("Projects")))?;
    writer.write_event(Event::End(BytesEnd::new("Entities")))?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
