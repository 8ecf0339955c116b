//! relq — typed relational query construction and execution.
//!
//! Queries are composed as immutable, type-checked expression trees against
//! runtime schema metadata, assembled into validated plans, and executed
//! through a backend-agnostic async seam.
//!
//! # Role In The Architecture
//!
//! - [`relq_core`] — values, semantic types, rows, schema metadata, records,
//!   and the error taxonomy.
//! - [`relq_query`] — expressions, predicates, paths, plans, projections,
//!   specifications, and SQL rendering.
//! - [`relq_exec`] — the [`Executor`] seam, typed fetch helpers, paging, and
//!   bulk mutations with invalidation.
//! - [`relq_mem`] — the in-memory reference backend.
//!
//! # A Short Tour
//!
//! ```
//! use std::sync::Arc;
//! use relq::prelude::*;
//! use relq::schema::{FieldDef, SchemaRegistry};
//!
//! # fn demo() -> relq::Result<()> {
//! let mut registry = SchemaRegistry::new();
//! let member = registry.register(
//!     "member",
//!     "id",
//!     vec![
//!         FieldDef::new("id", SemanticType::BigInt),
//!         FieldDef::new("username", SemanticType::Text).nullable(),
//!         FieldDef::new("age", SemanticType::Int),
//!     ],
//! );
//!
//! let m = EntityPath::root(Arc::new(registry), member, "m");
//! let plan = QueryBuilder::from(&m)
//!     .filter(m.field("age")?.goe(18)?)
//!     .order_by(OrderTerm::asc(m.field("username")?))
//!     .build()?;
//! assert!(plan.filter.is_some());
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

pub use relq_core::schema;
pub use relq_core::{
    Budget, Cx, Error, Outcome, Record, Rel, Result, Row, SemanticType, Value,
};
pub use relq_exec::{
    BulkExecutor, Executor, InvalidationHook, NoopInvalidation, Page, fetch_all, fetch_count,
    fetch_first, fetch_one, fetch_page, fetch_rows, project_all, project_first, project_one,
    project_page,
};
pub use relq_mem::MemoryExecutor;
pub use relq_query::{
    Case, Dialect, EntityPath, Expr, FieldTarget, FromColumns, FromValue, IntoExpr, OrderTerm,
    Predicate, Projection, QueryBuilder, SelectPlan, SetterTarget, Specification, TupleRow, all,
    any, mutation, predicate, projection, spec, sql,
};

/// The usual imports for composing and running queries.
pub mod prelude {
    pub use relq_core::schema::{Cardinality, FieldDef, SchemaId, SchemaRegistry};
    pub use relq_core::{
        Cx, Error, Outcome, Record, Rel, Result, Row, SemanticType, Value,
    };
    pub use relq_exec::{
        BulkExecutor, Executor, InvalidationHook, Page, fetch_all, fetch_first, fetch_one,
        fetch_page, project_all, project_one, project_page,
    };
    pub use relq_query::{
        Case, EntityPath, Expr, IntoExpr, OrderTerm, Predicate, Projection, QueryBuilder,
        Specification, all, any,
    };
}
