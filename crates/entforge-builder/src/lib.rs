/// Entity package build orchestration
///
/// Drives an external compiler pass over one or more projects and assembles
/// the resulting entity documents into deployable extension packages. The
/// core is silent: progress is surfaced through the [`Reporter`] sink and
/// structured results or a [`BuildError`] come back to the caller.

pub mod api;
pub mod config;
pub mod deps;
pub mod driver;
pub mod emit;
pub mod error;
pub mod metadata;
pub mod notifier;
pub mod pass;
pub mod project;
pub mod report;
pub mod transform;

pub use config::{BuildOptions, PackageIdentity, UnitConfig};
pub use driver::{BuildRequest, Builder};
pub use error::{BuildError, Result};
pub use pass::{CompilerPass, PassFactory, PassOutcome, PassPhase};
pub use project::{PackagingMode, ProjectResolver, ProjectUnit};
pub use report::{ConsoleReporter, NullReporter, Reporter};
pub use transform::TransformerFactory;
