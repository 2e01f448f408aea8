/// End-to-end orchestration tests over scaffolded repositories
///
/// A static in-test pass factory stands in for the external compiler pass,
/// so these tests exercise exactly the orchestration contract: topology,
/// packaging modes, emission, metadata, and failure propagation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use entforge_builder::{
    BuildError, BuildOptions, BuildRequest, Builder, CompilerPass, PassFactory, PassOutcome,
    PassPhase, ProjectUnit, Result, TransformerFactory,
};
use entforge_entities::{Diagnostic, EntityDescriptor, EntityKind, EntityStore};

const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Entities>
    <ExtensionPackages>
        <ExtensionPackage name="placeholder" packageVersion="0.0.0"/>
    </ExtensionPackages>
</Entities>"#;

/// Pass factory that emits a fixed entity set per project.
#[derive(Default)]
struct StaticFactory {
    entities: HashMap<String, Vec<EntityDescriptor>>,
    fail_emit: bool,
}

impl StaticFactory {
    fn with_project(mut self, project: &str, entities: Vec<EntityDescriptor>) -> Self {
        self.entities.insert(project.to_string(), entities);
        self
    }

    fn failing() -> Self {
        Self {
            fail_emit: true,
            ..Self::default()
        }
    }
}

impl PassFactory for StaticFactory {
    fn create_pass(
        &self,
        project: &ProjectUnit,
        phase: PassPhase,
        _debug: bool,
        _options: &BuildOptions,
    ) -> Box<dyn CompilerPass> {
        Box::new(StaticPass {
            entities: self.entities.get(&project.name).cloned().unwrap_or_default(),
            phase,
            fail_emit: self.fail_emit,
        })
    }
}

struct StaticPass {
    entities: Vec<EntityDescriptor>,
    phase: PassPhase,
    fail_emit: bool,
}

impl CompilerPass for StaticPass {
    fn run(&mut self, store: &mut EntityStore) -> Result<PassOutcome> {
        match self.phase {
            PassPhase::Analysis => Ok(PassOutcome {
                diagnostics: vec![Diagnostic::warning("unused declaration")],
                emit_skipped: false,
            }),
            PassPhase::Emit => {
                if self.fail_emit {
                    return Ok(PassOutcome {
                        diagnostics: vec![Diagnostic::error("type mismatch in Sensor")],
                        emit_skipped: true,
                    });
                }
                for entity in &self.entities {
                    store.insert(entity.name.clone(), entity.clone());
                }
                Ok(PassOutcome::default())
            }
        }
    }
}

fn thing(name: &str, endpoints: &[&str]) -> EntityDescriptor {
    let mut entity =
        EntityDescriptor::new(EntityKind::Thing, name, format!("<Entities name=\"{name}\"/>"));
    for endpoint in endpoints {
        entity = entity.endpoint(*endpoint);
    }
    entity
}

/// Write the three configuration documents for a repository.
fn scaffold(root: &Path, project_name: &str, subprojects: &[&str]) {
    fs::write(
        root.join("entforge.json"),
        format!(
            r#"{{
                "projectName": "{project_name}",
                "generateProjectEntity": true,
                "includeProjectDependencies": true
            }}"#
        ),
    )
    .unwrap();
    fs::write(
        root.join("extension.json"),
        r#"{
            "name": "demo-extension",
            "version": "2.3.0-beta.1",
            "author": "Acme",
            "description": "Demo"
        }"#,
    )
    .unwrap();
    fs::write(root.join("metadata.xml"), TEMPLATE).unwrap();

    for name in subprojects {
        let dir = root.join("src").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("unit.json"), "{}").unwrap();
    }
}

fn builder(root: &Path, factory: StaticFactory) -> Builder {
    Builder::new(BuildRequest::new(root), Box::new(factory))
}

#[test]
fn test_merged_build_produces_one_package() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "@auto", &["Alpha", "Beta"]);

    let factory = StaticFactory::default()
        .with_project("Alpha", vec![thing("AlphaThing", &[])])
        .with_project("Beta", vec![thing("BetaThing", &[])]);
    let builder = Builder::new(
        BuildRequest::new(repo.path()).merged(true),
        Box::new(factory),
    );
    builder.build().unwrap();

    let build = repo.path().join("build");
    assert!(build.join("Entities/Things/AlphaThing.xml").exists());
    assert!(build.join("Entities/Things/BetaThing.xml").exists());
    assert!(build.join("metadata.xml").exists());
    // One shared package: no per-project directories
    assert!(!build.join("Alpha").exists());
    assert!(!build.join("Beta").exists());

    // Merged packages keep the base package name
    let metadata = fs::read_to_string(build.join("metadata.xml")).unwrap();
    assert!(metadata.contains(r#"name="demo-extension""#));
    assert!(!metadata.contains("demo-extension-"));
}

#[test]
fn test_separate_build_namespaces_each_package() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "@auto", &["Alpha", "Beta"]);

    let factory = StaticFactory::default()
        .with_project("Alpha", vec![thing("AlphaThing", &[])])
        .with_project("Beta", vec![thing("BetaThing", &[])]);
    builder(repo.path(), factory).build().unwrap();

    let build = repo.path().join("build");
    for name in ["Alpha", "Beta"] {
        let package = build.join(name);
        assert!(package.join("metadata.xml").exists());
        let metadata = fs::read_to_string(package.join("metadata.xml")).unwrap();
        assert!(metadata.contains(&format!(r#"name="demo-extension-{name}""#)));
    }
    assert!(build.join("Alpha/Entities/Things/AlphaThing.xml").exists());
    assert!(build.join("Beta/Entities/Things/BetaThing.xml").exists());
}

#[test]
fn test_conflicting_modes_fail_before_any_output() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "@auto", &["Alpha"]);

    let request = BuildRequest::new(repo.path()).merged(true).separate(true);
    let builder = Builder::new(request, Box::new(StaticFactory::default()));
    let err = builder.build().unwrap_err();

    assert!(matches!(err, BuildError::ConflictingModes));
    assert!(!repo.path().join("build").exists());
}

#[test]
fn test_rebuild_drops_removed_entities() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);

    let factory = StaticFactory::default()
        .with_project("Gateway", vec![thing("A", &[]), thing("B", &[])]);
    builder(repo.path(), factory).build().unwrap();

    let a_path = repo.path().join("build/Entities/Things/A.xml");
    assert!(a_path.exists());

    // Entity A's source declaration is gone on the second build
    let factory = StaticFactory::default().with_project("Gateway", vec![thing("B", &[])]);
    builder(repo.path(), factory).build().unwrap();

    assert!(!a_path.exists());
    assert!(repo.path().join("build/Entities/Things/B.xml").exists());
}

#[test]
fn test_endpoints_returned_in_emission_order() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);

    let factory = StaticFactory::default().with_project(
        "Gateway",
        vec![thing("A", &["e1"]), thing("B", &["e2", "e3"])],
    );
    let endpoints = builder(repo.path(), factory).build().unwrap();

    assert_eq!(endpoints, vec!["e1", "e2", "e3"]);
}

#[test]
fn test_endpoints_accumulate_across_projects() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "@auto", &["Alpha", "Beta"]);

    let factory = StaticFactory::default()
        .with_project("Alpha", vec![thing("AlphaThing", &["alpha/deploy"])])
        .with_project("Beta", vec![thing("BetaThing", &["beta/deploy"])]);
    let endpoints = builder(repo.path(), factory).build().unwrap();

    // Projects build in name order, endpoints in discovery order
    assert_eq!(endpoints, vec!["alpha/deploy", "beta/deploy"]);
}

#[test]
fn test_package_version_drops_prerelease_suffix() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);

    let factory = StaticFactory::default().with_project("Gateway", vec![thing("A", &[])]);
    builder(repo.path(), factory).build().unwrap();

    let metadata = fs::read_to_string(repo.path().join("build/metadata.xml")).unwrap();
    assert!(metadata.contains(r#"packageVersion="2.3.0""#));
    assert!(metadata.contains(r#"vendor="Acme""#));
}

#[test]
fn test_project_descriptor_carries_inferred_dependencies() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "@auto", &["Common", "Gateway"]);
    fs::write(
        repo.path().join("src/Gateway/unit.json"),
        r#"{"include": ["../Common", "../Shared/*", "./local.ts"]}"#,
    )
    .unwrap();

    let factory = StaticFactory::default()
        .with_project("Common", vec![])
        .with_project("Gateway", vec![]);
    builder(repo.path(), factory).build().unwrap();

    let descriptor = fs::read_to_string(
        repo.path()
            .join("build/Gateway/Entities/Projects/Gateway.xml"),
    )
    .unwrap();
    assert!(descriptor.contains("&quot;projects&quot;:&quot;Common&quot;"));
}

#[test]
fn test_debug_build_adds_one_unique_notifier_per_project() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);

    let notifier_names = |root: &Path| -> Vec<String> {
        let dir = root.join("build/Entities/Things");
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| *n != "Gadget.xml")
            .collect();
        names.sort();
        names
    };

    let factory = StaticFactory::default().with_project("Gateway", vec![thing("Gadget", &[])]);
    let builder = Builder::new(
        BuildRequest::new(repo.path()).debug(true),
        Box::new(factory),
    );
    builder.build().unwrap();
    let first = notifier_names(repo.path());
    assert_eq!(first.len(), 1);

    builder.build().unwrap();
    let second = notifier_names(repo.path());
    assert_eq!(second.len(), 1);
    assert_ne!(first, second);
}

#[test]
fn test_non_debug_build_has_no_notifier() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);

    let factory = StaticFactory::default().with_project("Gateway", vec![thing("Gadget", &[])]);
    builder(repo.path(), factory).build().unwrap();

    let entries: Vec<_> = fs::read_dir(repo.path().join("build/Entities/Things"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["Gadget.xml"]);
}

#[test]
fn test_merged_entity_collision_is_flagged() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "@auto", &["Alpha", "Beta"]);

    let factory = StaticFactory::default()
        .with_project("Alpha", vec![thing("Shared", &[])])
        .with_project("Beta", vec![thing("Shared", &[])]);
    let builder = Builder::new(
        BuildRequest::new(repo.path()).merged(true),
        Box::new(factory),
    );
    let err = builder.build().unwrap_err();

    match err {
        BuildError::DuplicateEntity { key, project } => {
            assert_eq!(key, "Shared");
            assert_eq!(project, "Beta");
        }
        other => panic!("expected DuplicateEntity, got {other}"),
    }
}

#[test]
fn test_skipped_emission_halts_remaining_projects() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "@auto", &["Alpha", "Beta"]);

    let err = builder(repo.path(), StaticFactory::failing())
        .build()
        .unwrap_err();

    match &err {
        BuildError::Compilation {
            project,
            diagnostics,
        } => {
            assert_eq!(project, "Alpha");
            // Warnings from the analysis pass and errors from the emit pass
            // are surfaced together, verbatim
            assert!(diagnostics.iter().any(|d| d.message.contains("unused declaration")));
            assert!(diagnostics.iter().any(|d| d.message.contains("type mismatch")));
        }
        other => panic!("expected Compilation, got {other}"),
    }

    // Beta was never attempted
    assert!(!repo.path().join("build/Alpha/metadata.xml").exists());
    assert!(!repo.path().join("build/Beta/metadata.xml").exists());
}

#[test]
fn test_duplicate_source_declarations_fail_the_build() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);
    fs::write(
        repo.path().join("A.entity.json"),
        r#"{"kind": "Thing", "name": "Sensor", "endpoints": ["from-a"]}"#,
    )
    .unwrap();
    fs::write(
        repo.path().join("B.entity.json"),
        r#"{"kind": "Thing", "name": "Sensor", "endpoints": ["from-b"]}"#,
    )
    .unwrap();

    let builder = Builder::new(
        BuildRequest::new(repo.path()),
        Box::new(TransformerFactory),
    );
    let err = builder.build().unwrap_err();

    match &err {
        BuildError::Compilation { diagnostics, .. } => {
            assert!(diagnostics.iter().any(|d| d.message.contains("duplicate entity")));
        }
        other => panic!("expected Compilation, got {other}"),
    }
    // Neither declaration's document is written
    assert!(!repo.path().join("build/Entities/Things/Sensor.xml").exists());
}

#[test]
fn test_skipped_emission_is_fatal_from_any_phase() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);

    // A pass that declines emission already during analysis
    struct EarlySkipFactory;
    impl PassFactory for EarlySkipFactory {
        fn create_pass(
            &self,
            _project: &ProjectUnit,
            phase: PassPhase,
            _debug: bool,
            _options: &BuildOptions,
        ) -> Box<dyn CompilerPass> {
            Box::new(EarlySkipPass { phase })
        }
    }
    struct EarlySkipPass {
        phase: PassPhase,
    }
    impl CompilerPass for EarlySkipPass {
        fn run(&mut self, _store: &mut EntityStore) -> Result<PassOutcome> {
            Ok(PassOutcome {
                diagnostics: vec![Diagnostic::error("unresolved reference")],
                emit_skipped: self.phase == PassPhase::Analysis,
            })
        }
    }

    let builder = Builder::new(BuildRequest::new(repo.path()), Box::new(EarlySkipFactory));
    let err = builder.build().unwrap_err();

    match &err {
        BuildError::Compilation { project, diagnostics } => {
            assert_eq!(project, "Gateway");
            assert!(diagnostics.iter().any(|d| d.message.contains("unresolved reference")));
        }
        other => panic!("expected Compilation, got {other}"),
    }
    assert!(!repo.path().join("build/metadata.xml").exists());
}

#[test]
fn test_missing_template_is_fatal_before_compilation() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);
    fs::remove_file(repo.path().join("metadata.xml")).unwrap();

    let factory = StaticFactory::default().with_project("Gateway", vec![thing("A", &[])]);
    let err = builder(repo.path(), factory).build().unwrap_err();

    assert!(matches!(err, BuildError::FileNotFound(_)));
    assert!(!repo.path().join("build").exists());
}

#[test]
fn test_reserved_store_keys_never_reach_the_package() {
    let repo = TempDir::new().unwrap();
    scaffold(repo.path(), "Gateway", &[]);

    let bookkeeping = thing("GlobalBlocks", &["should-not-appear"]);
    let factory = StaticFactory::default().with_project(
        "Gateway",
        vec![thing("Visible", &["visible/deploy"])],
    );

    // Wrapper pass that sneaks a reserved bookkeeping entry into the store
    // ahead of the real entities
    struct ReservedFactory(StaticFactory, EntityDescriptor);
    impl PassFactory for ReservedFactory {
        fn create_pass(
            &self,
            project: &ProjectUnit,
            phase: PassPhase,
            debug: bool,
            options: &BuildOptions,
        ) -> Box<dyn CompilerPass> {
            let inner = self.0.create_pass(project, phase, debug, options);
            Box::new(ReservedPass {
                inner,
                entity: self.1.clone(),
                phase,
            })
        }
    }
    struct ReservedPass {
        inner: Box<dyn CompilerPass>,
        entity: EntityDescriptor,
        phase: PassPhase,
    }
    impl CompilerPass for ReservedPass {
        fn run(&mut self, store: &mut EntityStore) -> Result<PassOutcome> {
            if self.phase == PassPhase::Emit {
                store.insert("@globalBlocks", self.entity.clone());
            }
            self.inner.run(store)
        }
    }

    let builder = Builder::new(
        BuildRequest::new(repo.path()),
        Box::new(ReservedFactory(factory, bookkeeping)),
    );
    let endpoints = builder.build().unwrap();

    assert_eq!(endpoints, vec!["visible/deploy"]);
    assert!(!repo.path().join("build/Entities/Things/GlobalBlocks.xml").exists());
}
