//! Schema metadata.
//!
//! Entity shapes and their relationships are described at runtime and stored
//! in an arena-style [`SchemaRegistry`] addressed by [`SchemaId`]. Relations
//! hold ids rather than references, so cyclic entity graphs (member ↔ team)
//! need no cyclic ownership. The registry is read-only once built; queries
//! hold it behind an `Arc` and may be constructed concurrently.

use crate::error::{Error, Result};
use crate::types::SemanticType;

/// Stable identifier of a registered schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Arena index. Executors may use this to address per-schema storage.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// To-one: many members belong to one team.
    One,
    /// To-many: one team has many members.
    Many,
}

/// Metadata about a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name.
    pub name: &'static str,
    /// Semantic type, used for construction-time checking.
    pub ty: SemanticType,
    /// Whether NULL is a legal value.
    pub nullable: bool,
}

impl FieldDef {
    /// Create a non-nullable field.
    pub const fn new(name: &'static str, ty: SemanticType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
        }
    }

    /// Mark the field nullable.
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Metadata about a relationship to another schema.
///
/// The implied join condition is always
/// `owner.local_key = target.remote_key`, which covers both directions:
/// a to-one relation pairs the owner's foreign key with the target's key
/// (`member.team_id = team.id`), a to-many relation pairs the owner's key
/// with the target's foreign key (`team.id = member.team_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    /// Relationship name, used in path traversals.
    pub name: &'static str,
    /// The related schema.
    pub target: SchemaId,
    /// Single or collection.
    pub cardinality: Cardinality,
    /// Join column on the owning schema.
    pub local_key: &'static str,
    /// Join column on the target schema.
    pub remote_key: &'static str,
}

/// A registered entity schema.
#[derive(Debug, Clone)]
pub struct SchemaDef {
    /// Entity name (doubles as the relation name in rendered SQL).
    pub name: &'static str,
    /// Primary key field name.
    pub key: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Relationships to other schemas.
    pub relations: Vec<RelationDef>,
}

impl SchemaDef {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnresolvedPath {
                schema: self.name.to_string(),
                kind: "field",
                name: name.to_string(),
            })
    }

    /// Look up a relation by name.
    pub fn relation(&self, name: &str) -> Result<&RelationDef> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::UnresolvedPath {
                schema: self.name.to_string(),
                kind: "relation",
                name: name.to_string(),
            })
    }
}

/// Arena of schema definitions.
///
/// Build once at startup: register every schema, then add relations (targets
/// must already have ids, which is what permits cycles). Treated as immutable
/// afterwards by every other crate in the workspace.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: Vec<SchemaDef>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema and return its id.
    pub fn register(
        &mut self,
        name: &'static str,
        key: &'static str,
        fields: Vec<FieldDef>,
    ) -> SchemaId {
        let id = SchemaId(self.schemas.len());
        self.schemas.push(SchemaDef {
            name,
            key,
            fields,
            relations: Vec::new(),
        });
        id
    }

    /// Attach a relation to an owning schema.
    pub fn relate(
        &mut self,
        owner: SchemaId,
        name: &'static str,
        target: SchemaId,
        cardinality: Cardinality,
        local_key: &'static str,
        remote_key: &'static str,
    ) {
        self.schemas[owner.0].relations.push(RelationDef {
            name,
            target,
            cardinality,
            local_key,
            remote_key,
        });
    }

    /// The schema behind an id.
    pub fn schema(&self, id: SchemaId) -> &SchemaDef {
        &self.schemas[id.0]
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
