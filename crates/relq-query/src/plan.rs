//! Query plans and the fluent builder.
//!
//! [`QueryBuilder`] accumulates clauses fluently and validates them once, in
//! [`QueryBuilder::build`]. The output is a [`SelectPlan`]: an immutable value
//! type executors interpret or render. Count plans for paging are derived from
//! the select plan ([`SelectPlan::count_plan`]); when mechanical derivation
//! would be unsound the derivation refuses with `AmbiguousCountPlan` instead
//! of guessing.
//!
//! Join resolution happens here: explicit `join`/`left_join` calls and any
//! traversal reached from a filter, ordering, or select expression are folded
//! into one join list, deduplicated by [`PathKey`], parents before children,
//! with stable `t1`, `t2`, ... aliases.

use std::sync::Arc;

use relq_core::schema::{Cardinality, SchemaId, SchemaRegistry};
use relq_core::{Error, Result};

use crate::expr::{Expr, ExprKind, ExprType, Predicate};
use crate::path::{EntityPath, PathKey};
use crate::spec::Specification;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Placement of NULL values in a sort.
///
/// Every order term carries an explicit placement so plans never depend on a
/// store's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    /// NULLs sort before all values.
    First,
    /// NULLs sort after all values.
    Last,
}

/// One term of an `ORDER BY` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    /// The sort key.
    pub expr: Expr,
    /// Direction.
    pub direction: Direction,
    /// NULL placement.
    pub nulls: NullOrder,
}

impl OrderTerm {
    /// Ascending sort, NULLs last.
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: Direction::Asc,
            nulls: NullOrder::Last,
        }
    }

    /// Descending sort, NULLs last.
    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: Direction::Desc,
            nulls: NullOrder::Last,
        }
    }

    /// Place NULLs before all values.
    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrder::First;
        self
    }

    /// Place NULLs after all values.
    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrder::Last;
        self
    }
}

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Inner join.
    Inner,
    /// Left outer join.
    Left,
    /// Cartesian product (theta joins filter it in `WHERE` or `ON`).
    Cross,
}

/// How a join is constrained.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    /// Key equality from schema metadata: `parent.local = self.remote`.
    Relation {
        /// Alias of the owning side.
        parent_alias: String,
        /// Join column on the owning side.
        local_key: String,
        /// Join column on the joined side.
        remote_key: String,
    },
    /// No implied constraint (cross joins and unrelated-entity joins).
    None,
}

/// One resolved join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Traversal identity; used for deduplication.
    pub key: PathKey,
    /// Schema of the joined entity.
    pub schema: SchemaId,
    /// Stable alias (`t1`, `t2`, ... for traversals; the caller's alias for
    /// joined roots).
    pub alias: String,
    /// Join flavor.
    pub kind: JoinKind,
    /// Metadata-implied constraint, if any.
    pub constraint: JoinConstraint,
    /// Extra `ON` predicate, AND-ed with the constraint.
    pub on: Option<Expr>,
    /// Whether the joined entity's columns are selected for materialization.
    pub fetch: bool,
    /// Whether this join can multiply root rows.
    pub many: bool,
}

/// The query root.
#[derive(Debug, Clone, PartialEq)]
pub struct RootClause {
    /// Root schema.
    pub schema: SchemaId,
    /// Root alias.
    pub alias: String,
}

/// One select-list entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    /// The projected expression.
    pub expr: Expr,
    /// Explicit result-column alias.
    pub alias: Option<String>,
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

impl SelectExpr {
    /// The result-column label: the explicit alias when present, a derived
    /// name for fields and aggregates, a positional name otherwise.
    pub fn label_at(&self, index: usize) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match self.expr.kind() {
            ExprKind::Field(f) => f.label(),
            ExprKind::Aggregate { func, arg } => match arg {
                None => format!("{}(*)", func.name()),
                Some(inner) => match inner.kind() {
                    ExprKind::Field(f) => format!("{}({})", func.name(), f.label()),
                    _ => format!("{}", func.name()),
                },
            },
            _ => format!("c{index}"),
        }
    }
}

/// An immutable, validated select plan.
#[derive(Debug, Clone)]
pub struct SelectPlan {
    /// Registry the plan was built against.
    pub registry: Arc<SchemaRegistry>,
    /// Query root.
    pub root: RootClause,
    /// Select list. Never empty.
    pub select: Vec<SelectExpr>,
    /// Whether duplicate result rows are collapsed.
    pub distinct: bool,
    /// Resolved joins, parents before children.
    pub joins: Vec<JoinClause>,
    /// Row filter (`WHERE`).
    pub filter: Option<Expr>,
    /// Grouping keys.
    pub group_by: Vec<Expr>,
    /// Group filter (`HAVING`).
    pub having: Option<Expr>,
    /// Sort terms, applied in order.
    pub order_by: Vec<OrderTerm>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Maximum rows to return.
    pub limit: Option<u64>,
    count_override: Option<Box<CountPlan>>,
}

impl PartialEq for SelectPlan {
    fn eq(&self, other: &Self) -> bool {
        // registry identity is not part of plan equality
        self.root == other.root
            && self.select == other.select
            && self.distinct == other.distinct
            && self.joins == other.joins
            && self.filter == other.filter
            && self.group_by == other.group_by
            && self.having == other.having
            && self.order_by == other.order_by
            && self.offset == other.offset
            && self.limit == other.limit
            && self.count_override == other.count_override
    }
}

/// A plan that yields a single `count` column, used for paged totals.
#[derive(Debug, Clone, PartialEq)]
pub struct CountPlan {
    /// The underlying select.
    pub plan: SelectPlan,
}

impl SelectPlan {
    /// Result-column labels, in select-list order.
    pub fn labels(&self) -> Vec<String> {
        self.select
            .iter()
            .enumerate()
            .map(|(i, s)| s.label_at(i))
            .collect()
    }

    /// Result type of a single-column plan, for scalar subqueries.
    pub(crate) fn scalar_type(&self) -> Result<ExprType> {
        if self.select.len() != 1 {
            return Err(Error::invalid_plan(format!(
                "scalar subquery must project exactly one column, this plan projects {}",
                self.select.len()
            )));
        }
        Ok(self.select[0].expr.ty())
    }

    /// Derive the count plan for paging.
    ///
    /// The derived plan counts rows with ordering, paging, and
    /// materialization-only fetch joins stripped. When stripping cannot be
    /// proven sound — a distinct select, a grouped select, or a collection
    /// fetch join that multiplies rows — this refuses with
    /// `AmbiguousCountPlan`; supply an explicit plan via
    /// [`QueryBuilder::count_with`] instead.
    pub fn count_plan(&self) -> Result<CountPlan> {
        if let Some(explicit) = &self.count_override {
            return Ok((**explicit).clone());
        }
        if self.distinct {
            return Err(Error::AmbiguousCountPlan {
                reason: "the select is distinct".to_string(),
            });
        }
        if !self.group_by.is_empty() {
            return Err(Error::AmbiguousCountPlan {
                reason: "the select is grouped".to_string(),
            });
        }
        if self.joins.iter().any(|j| j.fetch && j.many) {
            return Err(Error::AmbiguousCountPlan {
                reason: "a collection fetch join multiplies rows".to_string(),
            });
        }

        let mut needed: Vec<PathKey> = Vec::new();
        if let Some(f) = &self.filter {
            collect_keys(f, &mut needed);
        }
        if let Some(h) = &self.having {
            collect_keys(h, &mut needed);
        }
        for j in &self.joins {
            if let Some(on) = &j.on {
                collect_keys(on, &mut needed);
            }
        }

        let mut joins: Vec<JoinClause> = Vec::new();
        // iterate in reverse so a kept child keeps its parents
        for j in self.joins.iter().rev() {
            let droppable = j.fetch
                && j.kind == JoinKind::Left
                && !needed.contains(&j.key)
                && !joins.iter().any(|kept| is_prefix(&j.key, &kept.key));
            if droppable {
                continue;
            }
            let mut j = j.clone();
            j.fetch = false;
            joins.push(j);
        }
        joins.reverse();

        let plan = SelectPlan {
            registry: self.registry.clone(),
            root: self.root.clone(),
            select: vec![SelectExpr {
                expr: Expr::count_all(),
                alias: Some("count".to_string()),
            }],
            distinct: false,
            joins,
            filter: self.filter.clone(),
            group_by: Vec::new(),
            having: self.having.clone(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
            count_override: None,
        };
        Ok(CountPlan { plan })
    }
}

/// Whether `prefix` is a strict traversal prefix of `key`.
fn is_prefix(prefix: &PathKey, key: &PathKey) -> bool {
    prefix.root == key.root
        && prefix.segments.len() < key.segments.len()
        && key.segments.starts_with(&prefix.segments)
}

/// Collect every traversal key referenced by an expression.
pub(crate) fn collect_keys(expr: &Expr, out: &mut Vec<PathKey>) {
    match expr.kind() {
        ExprKind::Field(f) => {
            if !out.contains(&f.key) {
                out.push(f.key.clone());
            }
        }
        ExprKind::Literal(_) | ExprKind::Subquery(_) => {}
        ExprKind::Binary { lhs, rhs, .. } => {
            collect_keys(lhs, out);
            collect_keys(rhs, out);
        }
        ExprKind::Not(e) | ExprKind::Cast { expr: e, .. } => collect_keys(e, out),
        ExprKind::IsNull { expr, .. }
        | ExprKind::InList { expr, .. }
        | ExprKind::Between { expr, .. }
        | ExprKind::Like { expr, .. } => collect_keys(expr, out),
        ExprKind::Aggregate { arg, .. } => {
            if let Some(a) = arg {
                collect_keys(a, out);
            }
        }
        ExprKind::Case {
            branches,
            otherwise,
        } => {
            for (c, v) in branches {
                collect_keys(c, out);
                collect_keys(v, out);
            }
            collect_keys(otherwise, out);
        }
    }
}

/// Whether the expression references a field outside any aggregate.
fn has_bare_field(expr: &Expr) -> bool {
    match expr.kind() {
        ExprKind::Field(_) => true,
        ExprKind::Literal(_) | ExprKind::Subquery(_) | ExprKind::Aggregate { .. } => false,
        ExprKind::Binary { lhs, rhs, .. } => has_bare_field(lhs) || has_bare_field(rhs),
        ExprKind::Not(e) | ExprKind::Cast { expr: e, .. } => has_bare_field(e),
        ExprKind::IsNull { expr, .. }
        | ExprKind::InList { expr, .. }
        | ExprKind::Between { expr, .. }
        | ExprKind::Like { expr, .. } => has_bare_field(expr),
        ExprKind::Case {
            branches,
            otherwise,
        } => {
            branches
                .iter()
                .any(|(c, v)| has_bare_field(c) || has_bare_field(v))
                || has_bare_field(otherwise)
        }
    }
}

/// Fluent select builder. Consuming: every method takes and returns `self`.
///
/// Structural problems (an `on` with no join, an aggregate in the row filter)
/// are deferred and reported by [`QueryBuilder::build`], so chains stay
/// uninterrupted.
#[derive(Debug)]
pub struct QueryBuilder {
    root: EntityPath,
    select: Vec<SelectExpr>,
    distinct: bool,
    joins: Vec<JoinClause>,
    filter: Option<Predicate>,
    group_by: Vec<Expr>,
    having: Option<Predicate>,
    order_by: Vec<OrderTerm>,
    offset: Option<u64>,
    limit: Option<u64>,
    count_override: Option<Box<CountPlan>>,
    err: Option<Error>,
}

impl QueryBuilder {
    /// Start a query over a root path.
    pub fn from(root: &EntityPath) -> Self {
        Self {
            root: root.clone(),
            select: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            offset: None,
            limit: None,
            count_override: None,
            err: None,
        }
    }

    fn fail(&mut self, err: Error) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    /// Append explicit select-list entries. A builder whose select list is
    /// never set selects the whole root entity (plus fetch-joined entities).
    pub fn select<S: Into<SelectExpr>>(mut self, exprs: impl IntoIterator<Item = S>) -> Self {
        self.select.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// Collapse duplicate result rows.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ------------------------------------------------------------------
    // Joins
    // ------------------------------------------------------------------

    fn add_traversal_join(mut self, path: &EntityPath, kind: JoinKind, fetch: bool) -> Self {
        if let Err(e) = self.ensure_join(path.key(), kind, fetch) {
            self.fail(e);
        }
        self
    }

    /// Inner join a relationship traversal.
    pub fn join(self, path: &EntityPath) -> Self {
        self.add_traversal_join(path, JoinKind::Inner, false)
    }

    /// Left join a relationship traversal.
    pub fn left_join(self, path: &EntityPath) -> Self {
        self.add_traversal_join(path, JoinKind::Left, false)
    }

    /// Inner join a traversal and select its columns for materialization.
    pub fn join_fetch(self, path: &EntityPath) -> Self {
        self.add_traversal_join(path, JoinKind::Inner, true)
    }

    /// Left join a traversal and select its columns for materialization.
    pub fn left_join_fetch(self, path: &EntityPath) -> Self {
        self.add_traversal_join(path, JoinKind::Left, true)
    }

    /// Cartesian join with an unrelated root. The theta condition goes in the
    /// row filter or in a following [`QueryBuilder::on`].
    pub fn cross_join(mut self, other: &EntityPath) -> Self {
        self.add_root_join(other, JoinKind::Cross);
        self
    }

    /// Left join an unrelated root. The condition goes in a following
    /// [`QueryBuilder::on`].
    pub fn left_join_root(mut self, other: &EntityPath) -> Self {
        self.add_root_join(other, JoinKind::Left);
        self
    }

    fn add_root_join(&mut self, other: &EntityPath, kind: JoinKind) {
        let key = other.key().clone();
        if !key.is_root() {
            self.fail(Error::invalid_plan(
                "a root join requires a root path, not a traversal",
            ));
            return;
        }
        if key.root == self.root.key().root || self.joins.iter().any(|j| j.key == key) {
            self.fail(Error::invalid_plan(format!(
                "alias `{}` is already bound in this query",
                key.root
            )));
            return;
        }
        self.joins.push(JoinClause {
            alias: key.root.clone(),
            key,
            schema: other.schema(),
            kind,
            constraint: JoinConstraint::None,
            on: None,
            fetch: false,
            many: true,
        });
    }

    /// Attach an extra `ON` predicate to the most recently added join.
    pub fn on(mut self, predicate: Predicate) -> Self {
        match self.joins.last_mut() {
            None => self.fail(Error::invalid_plan("`on` requires a preceding join")),
            Some(join) => {
                join.on = Some(match join.on.take() {
                    None => predicate.into_expr(),
                    Some(existing) => Predicate(existing).and(predicate).into_expr(),
                });
            }
        }
        self
    }

    /// Resolve a traversal key into the join list, creating parent joins
    /// first. An existing join is reused; `fetch` upgrades stick.
    fn ensure_join(&mut self, key: &PathKey, kind: JoinKind, fetch: bool) -> Result<()> {
        if key.is_root() {
            if key.root == self.root.key().root || self.joins.iter().any(|j| j.key == *key) {
                return Ok(());
            }
            return Err(Error::invalid_plan(format!(
                "root alias `{}` is not bound; join it explicitly",
                key.root
            )));
        }
        if let Some(existing) = self.joins.iter_mut().find(|j| j.key == *key) {
            existing.fetch |= fetch;
            return Ok(());
        }
        let Some(parent) = key.parent() else {
            return Err(Error::invalid_plan("traversal key without a parent"));
        };
        self.ensure_join(&parent, JoinKind::Inner, false)?;

        let (parent_alias, parent_schema) = if parent.is_root() {
            (self.root.key().root.clone(), self.root.schema())
        } else {
            match self.joins.iter().find(|j| j.key == parent) {
                Some(j) => (j.alias.clone(), j.schema),
                None => {
                    return Err(Error::invalid_plan(format!(
                        "parent join for `{}` was not resolved",
                        key.dotted()
                    )));
                }
            }
        };
        let Some(relation) = key.segments.last() else {
            return Err(Error::invalid_plan("traversal key without segments"));
        };
        let registry = self.root.registry().clone();
        let def = *registry.schema(parent_schema).relation(relation)?;

        self.joins.push(JoinClause {
            key: key.clone(),
            schema: def.target,
            alias: format!("t{}", self.joins.len() + 1),
            kind,
            constraint: JoinConstraint::Relation {
                parent_alias,
                local_key: def.local_key.to_string(),
                remote_key: def.remote_key.to_string(),
            },
            on: None,
            fetch,
            many: def.cardinality == Cardinality::Many,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Filters, grouping, ordering, paging
    // ------------------------------------------------------------------

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

    /// Apply a reusable specification against this query's root.
    pub fn filter_spec(mut self, spec: &Specification) -> Self {
        match spec.apply(&self.root) {
            Ok(p) => self.filter_opt(p),
            Err(e) => {
                self.fail(e);
                self
            }
        }
    }

    /// Append grouping keys.
    pub fn group_by(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    /// AND a predicate into the group filter.
    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having = Some(match self.having.take() {
            None => predicate,
            Some(existing) => existing.and(predicate),
        });
        self
    }

    /// Append a sort term.
    pub fn order_by(mut self, term: OrderTerm) -> Self {
        self.order_by.push(term);
        self
    }

    /// Skip the first `n` result rows.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Return at most `n` result rows.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Override the derived count plan for paging.
    pub fn count_with(mut self, count: CountPlan) -> Self {
        self.count_override = Some(Box::new(count));
        self
    }

    // ------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------

    /// Validate and freeze the plan.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn build(mut self) -> Result<SelectPlan> {
        if let Some(err) = self.err.take() {
            return Err(err);
        }

        if let Some(f) = &self.filter {
            if f.expr().contains_aggregate() {
                return Err(Error::invalid_plan(
                    "aggregate in row filter; move it to `having`",
                ));
            }
        }
        if self.group_by.is_empty() {
            if let Some(h) = &self.having {
                if has_bare_field(h.expr()) {
                    return Err(Error::invalid_plan(
                        "ungrouped `having` may only reference aggregates",
                    ));
                }
            }
        } else {
            for entry in &self.select {
                if !entry.expr.contains_aggregate() && !self.group_by.contains(&entry.expr) {
                    return Err(Error::invalid_plan(
                        "grouped select may only project grouping keys and aggregates",
                    ));
                }
            }
            if self.select.is_empty() {
                return Err(Error::invalid_plan(
                    "grouped select requires an explicit select list",
                ));
            }
        }

        // traversals referenced only by expressions become implicit inner joins
        let mut referenced: Vec<PathKey> = Vec::new();
        for entry in &self.select {
            collect_keys(&entry.expr, &mut referenced);
        }
        if let Some(f) = &self.filter {
            collect_keys(f.expr(), &mut referenced);
        }
        for g in &self.group_by {
            collect_keys(g, &mut referenced);
        }
        if let Some(h) = &self.having {
            collect_keys(h.expr(), &mut referenced);
        }
        for o in &self.order_by {
            collect_keys(&o.expr, &mut referenced);
        }
        for key in referenced {
            self.ensure_join(&key, JoinKind::Inner, false)?;
        }

        let select = if self.select.is_empty() {
            self.entity_select()?
        } else {
            self.select
        };

        tracing::debug!(
            joins = self.joins.len(),
            columns = select.len(),
            "select plan built"
        );

        Ok(SelectPlan {
            registry: self.root.registry().clone(),
            root: RootClause {
                schema: self.root.schema(),
                alias: self.root.key().root.clone(),
            },
            select,
            distinct: self.distinct,
            joins: self.joins,
            filter: self.filter.map(Predicate::into_expr),
            group_by: self.group_by,
            having: self.having.map(Predicate::into_expr),
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
            count_override: self.count_override,
        })
    }

    /// Expand the implicit entity selection: every root field with its bare
    /// label, then every fetch-joined entity's fields with dotted labels, in
    /// join order.
    fn entity_select(&self) -> Result<Vec<SelectExpr>> {
        let registry = self.root.registry();
        let mut select = Vec::new();
        for field in &registry.schema(self.root.schema()).fields {
            let expr = self.root.field(field.name)?;
            select.push(SelectExpr {
                expr,
                alias: Some(field.name.to_string()),
            });
        }
        for join in &self.joins {
            if !join.fetch {
                continue;
            }
            let prefix = join.key.dotted();
            let mut path = self.root.clone();
            for segment in &join.key.segments {
                path = path.traverse(segment)?;
            }
            for field in &registry.schema(join.schema).fields {
                let expr = path.field(field.name)?;
                select.push(SelectExpr {
                    expr,
                    alias: Some(format!("{prefix}.{}", field.name)),
                });
            }
        }
        Ok(select)
    }
}
