//! The backend execution seam.

use std::future::Future;

use asupersync::{Cx, Outcome};
use relq_core::{Error, Row};
use relq_query::{CountPlan, MutationPlan, SelectPlan};

/// Executes validated plans against a concrete store.
///
/// Implementations interpret the plan directly (an in-memory store) or render
/// it to SQL via [`relq_query::sql`] and hand the text to a driver. They never
/// re-validate shapes the builder already checked, and they report failures as
/// opaque [`Error::Execution`] values.
pub trait Executor: Send + Sync {
    /// Run a select, yielding rows labeled per the plan's select list.
    fn run_select(
        &self,
        cx: &Cx,
        plan: &SelectPlan,
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send;

    /// Run a count plan, yielding the total.
    fn run_count(
        &self,
        cx: &Cx,
        plan: &CountPlan,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Run a bulk mutation, yielding the number of affected rows.
    fn run_mutation(
        &self,
        cx: &Cx,
        plan: &MutationPlan,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;
}
