//! Typed query construction for relq.
//!
//! `relq-query` is the construction engine: application code composes
//! immutable expression trees against registered schemas and assembles them
//! into executable plans.
//!
//! # Role In The Architecture
//!
//! - **Expression model**: [`Expr`]/[`Predicate`] — typed, immutable nodes.
//!   Operator/operand mismatches fail here, at construction, never at
//!   execution.
//! - **Paths & joins**: [`EntityPath`] traverses schema relationships; the
//!   plan builder deduplicates traversals into join clauses with stable
//!   aliases.
//! - **Plans**: [`SelectPlan`], [`CountPlan`], and [`MutationPlan`] are the
//!   value types handed to a statement executor. Once built they are never
//!   mutated.
//! - **Projections**: [`projection`] maps result rows into typed shapes by
//!   constructor, field, setter, or raw tuple.
//! - **Specifications**: [`Specification`] — reusable, query-independent
//!   predicate factories composable with `and`/`or`/`not`.
//! - **SQL rendering**: [`sql`] renders plans to dialect-specific SQL with
//!   numbered placeholders, for executors backed by real stores.
//!
//! Construction involves no I/O and no shared mutable state; everything here
//! is safe to build concurrently against the same (immutable) registry.

pub mod expr;
pub mod mutation;
pub mod path;
pub mod plan;
pub mod predicate;
pub mod projection;
pub mod spec;
pub mod sql;

pub use expr::{AggregateFn, BinaryOp, Case, Expr, ExprKind, ExprType, IntoExpr, Predicate};
pub use mutation::{Assignment, MutationBuilder, MutationKind, MutationPlan, delete, update};
pub use path::{EntityPath, FieldRef, PathKey};
pub use plan::{
    CountPlan, Direction, JoinClause, JoinConstraint, JoinKind, NullOrder, OrderTerm,
    QueryBuilder, RootClause, SelectExpr, SelectPlan,
};
pub use predicate::{all, any};
pub use projection::{
    FieldTarget, FromColumns, FromValue, Projection, SetterTarget, TupleRow,
};
pub use spec::Specification;
pub use sql::Dialect;
