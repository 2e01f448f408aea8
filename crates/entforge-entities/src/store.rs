/// Ordered store of compiled entities for one project build
///
/// Exactly one store is live per project compilation. The driver creates it,
/// lends it to the compiler passes, and takes it back for emission; stores
/// are replaced (never merged) between projects so entities from one project
/// cannot leak into another's output.

use indexmap::IndexMap;

use crate::entity::EntityDescriptor;

/// Keys starting with this prefix are internal bookkeeping entries written by
/// compiler passes and must never reach the output directory.
pub const RESERVED_PREFIX: char = '@';

#[derive(Debug, Default)]
pub struct EntityStore {
    entities: IndexMap<String, EntityDescriptor>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for internal bookkeeping keys that are skipped during emission.
    pub fn is_reserved(key: &str) -> bool {
        key.starts_with(RESERVED_PREFIX)
    }

    /// Insert an entity under the given key, returning the previous entry if
    /// the key was already present. Re-inserting keeps the original position,
    /// so a two-pass compilation preserves discovery order.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        entity: EntityDescriptor,
    ) -> Option<EntityDescriptor> {
        self.entities.insert(key.into(), entity)
    }

    pub fn get(&self, key: &str) -> Option<&EntityDescriptor> {
        self.entities.get(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entries in insertion order, reserved keys included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityDescriptor)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries eligible for emission, in insertion order.
    pub fn emittable(&self) -> impl Iterator<Item = (&str, &EntityDescriptor)> {
        self.iter().filter(|(key, _)| !Self::is_reserved(key))
    }
}
