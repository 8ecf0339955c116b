//! Core types for relq.
//!
//! `relq-core` is the **foundation layer** for the workspace. It defines the
//! data model shared by query construction and execution.
//!
//! # Role In The Architecture
//!
//! - **Data model**: [`Value`], [`Row`], and [`SemanticType`] represent query
//!   inputs/outputs and are shared across the query and execution crates.
//! - **Schema metadata**: the arena-style [`SchemaRegistry`] describes entity
//!   shapes and relationships. It is read-only once built, so plans referencing
//!   it are safe to share across threads.
//! - **Relation state**: [`Rel`] is the explicit resolved/unresolved marker for
//!   to-one relations; nothing in this workspace loads a relation implicitly.
//! - **Structured concurrency**: re-exports `Cx` and `Outcome` from asupersync
//!   so every execution call is cancel-correct and budget-aware.
//!
//! # Who Uses This Crate
//!
//! - `relq-query` consumes schema metadata and `Value` to build typed plans.
//! - `relq-exec` depends on `Row`, `Rel`, and the error taxonomy for fetching.
//! - Executor implementations (`relq-mem`, real drivers) operate on
//!   `Row`/`Value`.
//!
//! Most applications should use the `relq` facade; reach for `relq-core`
//! directly when writing executors or advanced integrations.

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Budget, Cx, Outcome};

pub mod error;
pub mod record;
pub mod rel;
pub mod row;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use record::Record;
pub use rel::Rel;
pub use row::Row;
pub use schema::{Cardinality, FieldDef, RelationDef, SchemaDef, SchemaId, SchemaRegistry};
pub use types::SemanticType;
pub use value::Value;
