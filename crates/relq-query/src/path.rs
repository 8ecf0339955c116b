//! Relational paths.
//!
//! An [`EntityPath`] is a typed reference into the schema graph: either a
//! query root (with a caller-chosen alias) or a relationship traversal off
//! another path. Every path resolves to exactly one schema and one
//! cardinality. Field access produces typed [`crate::Expr`] nodes; traversals
//! are identified by [`PathKey`] so the plan builder can deduplicate the joins
//! they imply.

use std::sync::Arc;

use relq_core::schema::{Cardinality, SchemaId, SchemaRegistry};
use relq_core::{Result, SemanticType};

use crate::expr::Expr;

/// Identity of a traversal: the root alias plus the relation names walked.
///
/// Two paths with equal keys denote the same join and are resolved to a
/// single join clause regardless of where they appeared in the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey {
    /// Alias of the root the traversal starts from.
    pub root: String,
    /// Relation names walked from the root, in order.
    pub segments: Vec<String>,
}

impl PathKey {
    /// Key of a bare root.
    pub fn root(alias: impl Into<String>) -> Self {
        Self {
            root: alias.into(),
            segments: Vec::new(),
        }
    }

    /// Whether this key denotes a root rather than a traversal.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Key of the owning path (the traversal minus its last segment).
    pub fn parent(&self) -> Option<PathKey> {
        if self.segments.is_empty() {
            return None;
        }
        Some(PathKey {
            root: self.root.clone(),
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Dotted rendering of the segments, used as a column-label prefix.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

/// A typed reference to a field reached through a path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// The traversal the field hangs off.
    pub key: PathKey,
    /// Schema at the end of the traversal.
    pub schema: SchemaId,
    /// Field name on that schema.
    pub field: String,
    /// Semantic type of the field.
    pub ty: SemanticType,
    /// Whether the field may be NULL.
    pub nullable: bool,
}

impl FieldRef {
    /// The label this field contributes to a result row when not aliased:
    /// the bare field name for root fields, `relation.field` for traversals.
    pub fn label(&self) -> String {
        if self.key.is_root() {
            self.field.clone()
        } else {
            format!("{}.{}", self.key.dotted(), self.field)
        }
    }
}

/// A root entity or relationship traversal, bound to the schema registry.
#[derive(Debug, Clone)]
pub struct EntityPath {
    registry: Arc<SchemaRegistry>,
    key: PathKey,
    schema: SchemaId,
    cardinality: Cardinality,
}

impl EntityPath {
    /// Create a query root over `schema` with a stable alias.
    pub fn root(registry: Arc<SchemaRegistry>, schema: SchemaId, alias: impl Into<String>) -> Self {
        Self {
            registry,
            key: PathKey::root(alias),
            schema,
            cardinality: Cardinality::One,
        }
    }

    /// Traverse a named relationship, producing the path of the related
    /// entity. Fails with `UnresolvedPath` when the relation is not in the
    /// schema metadata.
    pub fn traverse(&self, relation: &str) -> Result<EntityPath> {
        let def = self.registry.schema(self.schema).relation(relation)?;
        let mut segments = self.key.segments.clone();
        segments.push(relation.to_string());
        let cardinality = match (self.cardinality, def.cardinality) {
            (Cardinality::Many, _) | (_, Cardinality::Many) => Cardinality::Many,
            _ => Cardinality::One,
        };
        Ok(EntityPath {
            registry: self.registry.clone(),
            key: PathKey {
                root: self.key.root.clone(),
                segments,
            },
            schema: def.target,
            cardinality,
        })
    }

    /// Reference a field on this path as a typed expression.
    pub fn field(&self, name: &str) -> Result<Expr> {
        let def = self.registry.schema(self.schema).field(name)?;
        Ok(Expr::field(FieldRef {
            key: self.key.clone(),
            schema: self.schema,
            field: def.name.to_string(),
            ty: def.ty,
            nullable: def.nullable,
        }))
    }

    /// The traversal identity of this path.
    pub fn key(&self) -> &PathKey {
        &self.key
    }

    /// Schema this path resolves to.
    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// Cardinality of the whole traversal: `Many` as soon as any walked
    /// relation is to-many.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// The registry this path is bound to.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }
}
