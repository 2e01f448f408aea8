/// Boundary to the external source-to-entity compiler pass
///
/// The orchestrator does not know how source modules become entities. It
/// asks a [`PassFactory`] for a pass per phase, lends the pass the project's
/// entity store, and reads the outcome. The store is owned by the driver
/// throughout; passes only ever see it as an explicit mutable argument.

use entforge_entities::{Diagnostic, EntityStore};

use crate::config::BuildOptions;
use crate::error::Result;
use crate::project::ProjectUnit;

/// The two phases a project is compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    /// Pre-emission analysis: collect and validate entity declarations.
    Analysis,
    /// Emission: produce the final entity bodies.
    Emit,
}

/// What a pass reports back to the driver.
#[derive(Debug, Default)]
pub struct PassOutcome {
    pub diagnostics: Vec<Diagnostic>,
    /// True when the pass declined to emit. Fatal for the invocation: no
    /// entity files are written and accumulated diagnostics are surfaced.
    pub emit_skipped: bool,
}

/// A single pass over one project's compilation unit.
pub trait CompilerPass {
    fn run(&mut self, store: &mut EntityStore) -> Result<PassOutcome>;
}

/// Produces compiler passes for the driver.
pub trait PassFactory {
    fn create_pass(
        &self,
        project: &ProjectUnit,
        phase: PassPhase,
        debug: bool,
        options: &BuildOptions,
    ) -> Box<dyn CompilerPass>;
}
