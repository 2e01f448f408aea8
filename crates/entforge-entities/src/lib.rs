/// Shared entity model for the entforge build pipeline
///
/// This crate holds the vocabulary that the build orchestrator and the
/// compiler passes exchange: entity descriptors, the per-project entity
/// store, and compilation diagnostics. It deliberately knows nothing about
/// the filesystem layout of a package or about how entities are compiled.

pub mod diagnostic;
pub mod entity;
pub mod store;

pub use diagnostic::{Diagnostic, Severity};
pub use entity::{EntityDescriptor, EntityKind, ExportedApi, FieldDef, ServiceDef};
pub use store::EntityStore;
