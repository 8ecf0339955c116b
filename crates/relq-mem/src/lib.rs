//! In-memory plan execution for relq.
//!
//! [`MemoryExecutor`] interprets plans directly against tables held in
//! process memory, with SQL semantics: three-valued filters, left joins
//! that leave NULL columns, stable ordering with explicit null placement,
//! grouping, and bulk mutations where every row reads pre-mutation state.
//!
//! # Role In The Architecture
//!
//! This is the reference backend: integration tests and examples run
//! against it, and a new driver-backed executor can be checked against its
//! behavior. It trades efficiency for fidelity — joins are nested loops
//! and grouping is a linear scan.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use asupersync::{Cx, Outcome};
use relq_core::schema::SchemaId;
use relq_core::{Error, Row, Value};
use relq_exec::Executor;
use relq_query::{CountPlan, MutationPlan, SelectPlan};

mod eval;
mod interpret;

use eval::{StoredRow, Tables};

/// An executor over in-memory tables.
///
/// Tables are keyed by schema id; rows are loose column maps, so the store
/// accepts whatever the registry describes without per-entity codegen.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: RwLock<Tables>,
}

impl MemoryExecutor {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one row into a schema's table.
    pub fn insert<K: Into<String>>(
        &self,
        schema: SchemaId,
        columns: impl IntoIterator<Item = (K, Value)>,
    ) {
        let row: StoredRow = columns
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        if let Ok(mut tables) = self.tables.write() {
            tables.entry(schema.index()).or_default().push(row);
        }
    }

    /// Snapshot a table's rows, for assertions.
    pub fn rows(&self, schema: SchemaId) -> Vec<HashMap<String, Value>> {
        self.tables
            .read()
            .map(|tables| tables.get(&schema.index()).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn read_tables(&self) -> Result<Tables, Error> {
        self.tables
            .read()
            .map(|t| t.clone())
            .map_err(|_| Error::Execution("store lock poisoned".to_string()))
    }
}

impl Executor for MemoryExecutor {
    fn run_select(
        &self,
        _cx: &Cx,
        plan: &SelectPlan,
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        async move {
            let tables = match self.read_tables() {
                Ok(tables) => tables,
                Err(e) => return Outcome::Err(e),
            };
            match interpret::run_select(&tables, plan) {
                Ok(rows) => {
                    tracing::debug!(rows = rows.len(), "in-memory select");
                    Outcome::Ok(rows)
                }
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn run_count(
        &self,
        _cx: &Cx,
        plan: &CountPlan,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        async move {
            let tables = match self.read_tables() {
                Ok(tables) => tables,
                Err(e) => return Outcome::Err(e),
            };
            let rows = match interpret::run_select(&tables, &plan.plan) {
                Ok(rows) => rows,
                Err(e) => return Outcome::Err(e),
            };
            let total = rows
                .first()
                .and_then(|r| r.values().first())
                .and_then(Value::as_i64)
                .unwrap_or(0);
            Outcome::Ok(total.max(0) as u64)
        }
    }

    fn run_mutation(
        &self,
        _cx: &Cx,
        plan: &MutationPlan,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        async move {
            let mut guard = match self.tables.write() {
                Ok(guard) => guard,
                Err(_) => {
                    return Outcome::Err(Error::Execution("store lock poisoned".to_string()));
                }
            };
            match interpret::run_mutation(&mut guard, plan) {
                Ok(affected) => {
                    tracing::debug!(kind = ?plan.kind, affected, "in-memory mutation");
                    Outcome::Ok(affected)
                }
                Err(e) => Outcome::Err(e),
            }
        }
    }
}
