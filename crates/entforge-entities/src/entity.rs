/// Entity descriptors produced by a compilation pass
///
/// An entity is one compiled declarative unit: a data shape, an addressable
/// service-bearing thing, a reusable template, or a synthesized project
/// descriptor. The compiler pass owns the translation from source modules to
/// descriptors; the orchestrator only reads them back out.

use serde::{Deserialize, Serialize};

/// The kind of a compiled entity, which determines where its document lands
/// in the package layout (`Entities/<collection>/<name>.xml`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Thing,
    Template,
    DataShape,
    Project,
}

impl EntityKind {
    /// The collection directory this kind is grouped under in a package.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Thing => "Things",
            EntityKind::Template => "Templates",
            EntityKind::DataShape => "DataShapes",
            EntityKind::Project => "Projects",
        }
    }
}

/// A field of an exported data shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    pub base_type: String,
}

/// A service exposed by an exported thing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDef {
    pub name: String,
    pub result_type: String,
    #[serde(default)]
    pub params: Vec<FieldDef>,
}

/// Metadata registered on an entity that exposes an API to downstream
/// consumers. Only data shapes (fields) and things (services) can carry this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportedApi {
    /// Name the entity is exported under.
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub services: Vec<ServiceDef>,
}

/// One compiled declarative unit, owned by the [`EntityStore`] for the
/// duration of a single project build.
///
/// [`EntityStore`]: crate::store::EntityStore
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    /// Stable entity name, also the document file name.
    pub name: String,
    /// Serialized document body, written out verbatim.
    pub body: String,
    /// Deployment endpoints declared by this entity, in declaration order.
    pub deployment_endpoints: Vec<String>,
    /// API export metadata, if the entity is exported.
    pub exported_api: Option<ExportedApi>,
}

impl EntityDescriptor {
    pub fn new(kind: EntityKind, name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            body: body.into(),
            deployment_endpoints: Vec::new(),
            exported_api: None,
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.deployment_endpoints.push(endpoint.into());
        self
    }

    pub fn exported(mut self, api: ExportedApi) -> Self {
        self.exported_api = Some(api);
        self
    }
}
