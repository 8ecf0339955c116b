//! Typed fetch helpers.
//!
//! Each helper runs a plan through an [`Executor`] and shapes the rows:
//! entity hydration via [`Record`], arbitrary shapes via [`Projection`].
//! Single-result semantics distinguish "none" from "too many"
//! (`NoRowFound` vs `MultipleRowsFound`); paging pairs the window select
//! with the plan's derived (or overridden) count plan.

use asupersync::{Cx, Outcome};
use relq_core::{Error, Record, Row};
use relq_query::{Projection, SelectPlan};

use crate::executor::Executor;
use crate::page::Page;

/// Run a plan and return raw labeled rows.
pub async fn fetch_rows<E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
) -> Outcome<Vec<Row>, Error> {
    executor.run_select(cx, plan).await
}

/// Run the plan's count plan and return the total.
pub async fn fetch_count<E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
) -> Outcome<u64, Error> {
    let count = match plan.count_plan() {
        Ok(count) => count,
        Err(e) => return Outcome::Err(e),
    };
    executor.run_count(cx, &count).await
}

/// Fetch every matching row as a hydrated record.
pub async fn fetch_all<R: Record, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
) -> Outcome<Vec<R>, Error> {
    let rows = match executor.run_select(cx, plan).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    match hydrate_all(&rows) {
        Ok(records) => Outcome::Ok(records),
        Err(e) => Outcome::Err(e),
    }
}

/// Fetch exactly one record. Zero rows is [`Error::NoRowFound`], more than
/// one is [`Error::MultipleRowsFound`].
pub async fn fetch_one<R: Record, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
) -> Outcome<R, Error> {
    let rows = match executor.run_select(cx, plan).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    match single(&rows) {
        Ok(row) => match R::from_row(row) {
            Ok(record) => Outcome::Ok(record),
            Err(e) => Outcome::Err(e),
        },
        Err(e) => Outcome::Err(e),
    }
}

/// Fetch the first record, if any. The plan is narrowed to one row before
/// execution.
pub async fn fetch_first<R: Record, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
) -> Outcome<Option<R>, Error> {
    let mut narrowed = plan.clone();
    narrowed.limit = Some(1);
    let rows = match executor.run_select(cx, &narrowed).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    match rows.first() {
        None => Outcome::Ok(None),
        Some(row) => match R::from_row(row) {
            Ok(record) => Outcome::Ok(Some(record)),
            Err(e) => Outcome::Err(e),
        },
    }
}

/// Fetch one window of records plus the matching total.
///
/// The window select and the count run as two statements; the count uses the
/// plan's derived count plan, so an unsound derivation surfaces as
/// `AmbiguousCountPlan` before anything executes.
#[tracing::instrument(level = "debug", skip(cx, executor, plan))]
pub async fn fetch_page<R: Record, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
    offset: u64,
    limit: u64,
) -> Outcome<Page<R>, Error> {
    let count = match plan.count_plan() {
        Ok(count) => count,
        Err(e) => return Outcome::Err(e),
    };
    let total = match executor.run_count(cx, &count).await {
        Outcome::Ok(total) => total,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };

    let mut window = plan.clone();
    window.offset = Some(offset);
    window.limit = Some(limit);
    let rows = match executor.run_select(cx, &window).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    let items = match hydrate_all(&rows) {
        Ok(items) => items,
        Err(e) => return Outcome::Err(e),
    };

    tracing::debug!(total, returned = items.len(), offset, limit, "page fetched");
    Outcome::Ok(Page {
        items,
        total,
        offset,
        limit,
    })
}

/// Fetch every matching row through a projection.
pub async fn project_all<T, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
    projection: &Projection<T>,
) -> Outcome<Vec<T>, Error> {
    if let Err(e) = projection.validate(plan) {
        return Outcome::Err(e);
    }
    let rows = match executor.run_select(cx, plan).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        match projection.project(row) {
            Ok(item) => items.push(item),
            Err(e) => return Outcome::Err(e),
        }
    }
    Outcome::Ok(items)
}

/// Project exactly one row, with the same semantics as [`fetch_one`].
pub async fn project_one<T, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
    projection: &Projection<T>,
) -> Outcome<T, Error> {
    if let Err(e) = projection.validate(plan) {
        return Outcome::Err(e);
    }
    let rows = match executor.run_select(cx, plan).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    match single(&rows) {
        Ok(row) => match projection.project(row) {
            Ok(item) => Outcome::Ok(item),
            Err(e) => Outcome::Err(e),
        },
        Err(e) => Outcome::Err(e),
    }
}

/// Project the first row, if any.
pub async fn project_first<T, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
    projection: &Projection<T>,
) -> Outcome<Option<T>, Error> {
    if let Err(e) = projection.validate(plan) {
        return Outcome::Err(e);
    }
    let mut narrowed = plan.clone();
    narrowed.limit = Some(1);
    let rows = match executor.run_select(cx, &narrowed).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    match rows.first() {
        None => Outcome::Ok(None),
        Some(row) => match projection.project(row) {
            Ok(item) => Outcome::Ok(Some(item)),
            Err(e) => Outcome::Err(e),
        },
    }
}

/// Fetch one projected window plus the matching total.
pub async fn project_page<T, E: Executor>(
    cx: &Cx,
    executor: &E,
    plan: &SelectPlan,
    projection: &Projection<T>,
    offset: u64,
    limit: u64,
) -> Outcome<Page<T>, Error> {
    if let Err(e) = projection.validate(plan) {
        return Outcome::Err(e);
    }
    let count = match plan.count_plan() {
        Ok(count) => count,
        Err(e) => return Outcome::Err(e),
    };
    let total = match executor.run_count(cx, &count).await {
        Outcome::Ok(total) => total,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };

    let mut window = plan.clone();
    window.offset = Some(offset);
    window.limit = Some(limit);
    let rows = match executor.run_select(cx, &window).await {
        Outcome::Ok(rows) => rows,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        match projection.project(row) {
            Ok(item) => items.push(item),
            Err(e) => return Outcome::Err(e),
        }
    }
    Outcome::Ok(Page {
        items,
        total,
        offset,
        limit,
    })
}

fn single(rows: &[Row]) -> Result<&Row, Error> {
    match rows {
        [] => Err(Error::NoRowFound),
        [row] => Ok(row),
        _ => Err(Error::MultipleRowsFound { count: rows.len() }),
    }
}

fn hydrate_all<R: Record>(rows: &[Row]) -> Result<Vec<R>, Error> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(R::from_row(row)?);
    }
    Ok(records)
}
