/// Build orchestrator
///
/// Coordinates the whole invocation: resolve the projects to build, drive
/// the compiler pass over each one, emit the resulting entities, synthesize
/// the project descriptor and debug notifier, and stamp the package
/// metadata. Projects build strictly in sequence; each owns a fresh entity
/// store and a fresh per-project context, and every write for a project
/// completes (or fails) before the next project starts. Any failure aborts
/// the remaining work; there are no retries.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use entforge_entities::{Diagnostic, EntityKind, EntityStore};
use tracing::debug;

use crate::api;
use crate::config::{
    BuildOptions, METADATA_TEMPLATE, OPTIONS_FILE, PACKAGE_FILE, PackageIdentity, UNIT_FILE,
    UnitConfig,
};
use crate::deps;
use crate::emit::EntityEmitter;
use crate::error::{BuildError, Result};
use crate::metadata::MetadataWriter;
use crate::notifier;
use crate::pass::{PassFactory, PassPhase};
use crate::project::{PackagingMode, ProjectResolver, ProjectUnit};
use crate::report::{NullReporter, Reporter};

/// What the caller asked for: where the repository lives and which flags
/// were passed on the command line.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub repo_root: PathBuf,
    pub merged: bool,
    pub separate: bool,
    pub debug: bool,
}

impl BuildRequest {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            merged: false,
            separate: false,
            debug: false,
        }
    }

    pub fn merged(mut self, merged: bool) -> Self {
        self.merged = merged;
        self
    }

    pub fn separate(mut self, separate: bool) -> Self {
        self.separate = separate;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// The build orchestrator.
pub struct Builder {
    request: BuildRequest,
    factory: Box<dyn PassFactory>,
    reporter: Box<dyn Reporter>,
}

impl Builder {
    pub fn new(request: BuildRequest, factory: Box<dyn PassFactory>) -> Self {
        Self {
            request,
            factory,
            reporter: Box::new(NullReporter),
        }
    }

    pub fn reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Build every project and return the deployment endpoints discovered
    /// across all of them, in emission order.
    pub fn build(&self) -> Result<Vec<String>> {
        let root = &self.request.repo_root;
        let options = BuildOptions::load(&root.join(OPTIONS_FILE))?;
        let identity = PackageIdentity::load(&root.join(PACKAGE_FILE))?;

        // Mode conflicts and a missing template are fatal before anything
        // touches the output directory
        let mode = PackagingMode::resolve(self.request.merged, self.request.separate)?;
        let metadata = MetadataWriter::load(&root.join(METADATA_TEMPLATE))?;

        let projects = ProjectResolver::new(root, &options, mode).resolve()?;
        debug!(count = projects.len(), "resolved projects");

        let suffix_project = options.is_multi_project() && mode == PackagingMode::Separate;
        let mut endpoints = Vec::new();
        let mut written = HashSet::new();

        for project in &projects {
            self.build_project(
                project,
                &options,
                &identity,
                &metadata,
                suffix_project,
                &mut endpoints,
                &mut written,
            )?;
        }

        Ok(endpoints)
    }

    /// Run the analysis pass over the repository and write the exported-API
    /// declarations file.
    pub fn generate_api(&self) -> Result<PathBuf> {
        let root = &self.request.repo_root;
        let options = BuildOptions::load(&root.join(OPTIONS_FILE))?;

        let out_dir = root.join("api");
        let project = ProjectUnit {
            name: options.project_name.clone(),
            source_root: root.clone(),
            out_dir: out_dir.clone(),
        };

        let mut store = EntityStore::new();
        let mut pass = self
            .factory
            .create_pass(&project, PassPhase::Analysis, false, &options);
        let outcome = pass.run(&mut store)?;
        if outcome.diagnostics.iter().any(Diagnostic::is_error) {
            return Err(BuildError::Compilation {
                project: project.name,
                diagnostics: outcome.diagnostics,
            });
        }

        let declarations = api::generate_declarations(&store)?;
        fs::create_dir_all(&out_dir)?;
        let path = out_dir.join(api::DECLARATIONS_FILE);
        fs::write(&path, declarations)?;
        Ok(path)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_project(
        &self,
        project: &ProjectUnit,
        options: &BuildOptions,
        identity: &PackageIdentity,
        metadata: &MetadataWriter,
        suffix_project: bool,
        endpoints: &mut Vec<String>,
        written: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        self.reporter.project_started(&project.name);

        let (store, diagnostics) = self.compile_project(project, options)?;
        debug!(project = %project.name, entities = store.len(), "compiled");

        let mut emitter = EntityEmitter::new(&project.out_dir, &project.name, written);
        emitter.emit_store(&store, endpoints)?;

        if options.generate_project_entity {
            let unit = UnitConfig::load_optional(&project.source_root.join(UNIT_FILE))?;
            let summary = deps::synthesize(options, unit.as_ref());
            let descriptor = deps::project_descriptor_xml(&project.name, &summary)?;
            emitter.write_document(EntityKind::Project, &project.name, &descriptor)?;
        }

        if self.request.debug {
            let name = notifier::notifier_name();
            let body = notifier::notifier_xml(&name, &project.name, &store)?;
            emitter.write_document(EntityKind::Thing, &name, &body)?;
        }

        metadata.write(
            &project.out_dir,
            identity,
            options,
            &project.name,
            suffix_project,
        )?;

        self.reporter.project_finished(&project.name, &diagnostics);
        Ok(())
    }

    /// Drive both compiler passes over one project. The store is created
    /// here, lent to each pass in turn, and handed back immutably on
    /// success. Skipped emission is fatal whichever phase reports it, and
    /// carries every accumulated diagnostic.
    fn compile_project(
        &self,
        project: &ProjectUnit,
        options: &BuildOptions,
    ) -> Result<(EntityStore, Vec<Diagnostic>)> {
        let mut store = EntityStore::new();
        let mut diagnostics = Vec::new();

        for phase in [PassPhase::Analysis, PassPhase::Emit] {
            let mut pass =
                self.factory
                    .create_pass(project, phase, self.request.debug, options);
            let outcome = pass.run(&mut store)?;
            diagnostics.extend(outcome.diagnostics);

            if outcome.emit_skipped {
                self.reporter.project_failed(&project.name);
                return Err(BuildError::Compilation {
                    project: project.name.clone(),
                    diagnostics,
                });
            }
        }

        Ok((store, diagnostics))
    }
}
