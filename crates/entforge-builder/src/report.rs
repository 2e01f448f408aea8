/// Build progress reporting
///
/// The orchestrator itself is silent: it emits events through this sink and
/// returns structured results. Presentation lives entirely behind the trait;
/// the CLI installs [`ConsoleReporter`], library callers and tests get
/// [`NullReporter`] unless they say otherwise.

use entforge_entities::Diagnostic;

pub trait Reporter {
    fn project_started(&self, _project: &str) {}

    /// A project built successfully; `diagnostics` holds its accumulated
    /// warnings, never suppressed.
    fn project_finished(&self, _project: &str, _diagnostics: &[Diagnostic]) {}

    fn project_failed(&self, _project: &str) {}
}

/// Discards all events.
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Prints progress to stderr.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn project_started(&self, project: &str) {
        eprintln!("❯ Building {}", label(project));
    }

    fn project_finished(&self, project: &str, diagnostics: &[Diagnostic]) {
        if diagnostics.is_empty() {
            eprintln!("✔ Built {}", label(project));
        } else {
            eprintln!("✔ Built {} (with warnings):", label(project));
            for diagnostic in diagnostics {
                eprintln!("  {}", diagnostic);
            }
        }
    }

    fn project_failed(&self, project: &str) {
        eprintln!("✖ Failed building {}", label(project));
    }
}

fn label(project: &str) -> &str {
    if project.is_empty() { "project" } else { project }
}
