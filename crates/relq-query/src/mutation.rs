//! Bulk mutation plans.
//!
//! Bulk updates and deletes operate on one entity table, filtered by a
//! predicate, bypassing any per-record lifecycle. Assignment values are
//! expressions and may reference the entity's own fields (`age = age + 1`).
//! Execution-side cache invalidation lives with the executor, not here; a
//! mutation plan is just the validated statement shape.

use std::sync::Arc;

use relq_core::schema::{SchemaId, SchemaRegistry};
use relq_core::{Error, Result};

use crate::expr::{Expr, IntoExpr, Predicate};
use crate::path::EntityPath;
use crate::plan::collect_keys;

/// Update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `UPDATE ... SET ...`
    Update,
    /// `DELETE FROM ...`
    Delete,
}

/// One `SET` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Target field on the mutated schema.
    pub field: String,
    /// New value; may reference fields of the same entity.
    pub value: Expr,
}

/// An immutable, validated mutation plan.
#[derive(Debug, Clone)]
pub struct MutationPlan {
    /// Registry the plan was built against.
    pub registry: Arc<SchemaRegistry>,
    /// The mutated schema.
    pub schema: SchemaId,
    /// Alias field references in assignments and the filter resolve against.
    pub alias: String,
    /// Update or delete.
    pub kind: MutationKind,
    /// `SET` clauses; empty for deletes.
    pub assignments: Vec<Assignment>,
    /// Row filter; `None` touches every row.
    pub filter: Option<Expr>,
}

impl PartialEq for MutationPlan {
    fn eq(&self, other: &Self) -> bool {
        // registry identity is not part of plan equality
        self.schema == other.schema
            && self.alias == other.alias
            && self.kind == other.kind
            && self.assignments == other.assignments
            && self.filter == other.filter
    }
}

/// Start a bulk update over an entity root.
pub fn update(root: &EntityPath) -> MutationBuilder {
    MutationBuilder::new(root, MutationKind::Update)
}

/// Start a bulk delete over an entity root.
pub fn delete(root: &EntityPath) -> MutationBuilder {
    MutationBuilder::new(root, MutationKind::Delete)
}

/// Fluent mutation builder. Structural problems are deferred to
/// [`MutationBuilder::build`].
#[derive(Debug)]
pub struct MutationBuilder {
    root: EntityPath,
    kind: MutationKind,
    assignments: Vec<Assignment>,
    filter: Option<Predicate>,
    err: Option<Error>,
}

impl MutationBuilder {
    fn new(root: &EntityPath, kind: MutationKind) -> Self {
        Self {
            root: root.clone(),
            kind,
            assignments: Vec::new(),
            filter: None,
            err: None,
        }
    }

    fn fail(&mut self, err: Error) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Add a `SET` clause. The value's type must be compatible with the
    /// field's declared type.
    pub fn set(mut self, field: &str, value: impl IntoExpr) -> Self {
        let value = value.into_expr();
        let def = match self.root.registry().schema(self.root.schema()).field(field) {
            Ok(def) => *def,
            Err(e) => {
                self.fail(e);
                return self;
            }
        };
        let field_ty = crate::expr::ExprType::Known(def.ty);
        if !field_ty.comparable_with(value.ty()) {
            self.fail(Error::type_mismatch(
                format!("set {field}"),
                field_ty.name(),
                value.ty().name(),
            ));
            return self;
        }
        self.assignments.push(Assignment {
            field: def.name.to_string(),
            value,
        });
        self
    }

    /// AND a predicate into the row filter.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            None => predicate,
            Some(existing) => existing.and(predicate),
        });
        self
    }

    /// AND an optional predicate into the row filter; `None` is a no-op.
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            None => self,
            Some(p) => self.filter(p),
        }
    }

    /// Validate and freeze the plan.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn build(mut self) -> Result<MutationPlan> {
        if let Some(err) = self.err.take() {
            return Err(err);
        }
        match self.kind {
            MutationKind::Update if self.assignments.is_empty() => {
                return Err(Error::invalid_plan("update without assignments"));
            }
            MutationKind::Delete if !self.assignments.is_empty() => {
                return Err(Error::invalid_plan("delete cannot carry assignments"));
            }
            _ => {}
        }

        // mutations are single-table: no traversals, no aggregates
        let mut keys = Vec::new();
        for a in &self.assignments {
            if a.value.contains_aggregate() {
                return Err(Error::invalid_plan("aggregate in assignment value"));
            }
            collect_keys(&a.value, &mut keys);
        }
        if let Some(f) = &self.filter {
            if f.expr().contains_aggregate() {
                return Err(Error::invalid_plan("aggregate in mutation filter"));
            }
            collect_keys(f.expr(), &mut keys);
        }
        if keys.iter().any(|k| !k.is_root() || k.root != self.root.key().root) {
            return Err(Error::invalid_plan(
                "mutations are single-table; traversals are not allowed",
            ));
        }

        tracing::debug!(
            kind = ?self.kind,
            assignments = self.assignments.len(),
            "mutation plan built"
        );

        Ok(MutationPlan {
            registry: self.root.registry().clone(),
            schema: self.root.schema(),
            alias: self.root.key().root.clone(),
            kind: self.kind,
            assignments: self.assignments,
            filter: self.filter.map(Predicate::into_expr),
        })
    }
}
