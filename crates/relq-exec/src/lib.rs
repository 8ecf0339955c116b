//! Plan execution for relq.
//!
//! `relq-exec` is the seam between validated plans and whatever actually
//! holds the data. The [`Executor`] trait is the only thing a backend
//! implements; everything else here — typed fetches, single-result
//! semantics, paging, bulk mutations with invalidation — is written once
//! against that trait.
//!
//! # Role In The Architecture
//!
//! - [`Executor`] — async row/count/mutation execution over a plan.
//! - [`fetch`] — typed fetch helpers: all, one, first, page, and their
//!   projection-based variants.
//! - [`Page`] — a window of results plus the total the count plan reported.
//! - [`BulkExecutor`] / [`InvalidationHook`] — bulk mutations bypass any
//!   per-record lifecycle, so the hook is how caches and identity maps learn
//!   they are stale.
//!
//! All async surfaces take a `&Cx` capability and return `Outcome`, with
//! cancellation and panic arms propagated, never swallowed.

pub use asupersync::{Budget, Cx, Outcome};

pub mod executor;
pub mod fetch;
pub mod mutation;
pub mod page;

pub use executor::Executor;
pub use fetch::{
    fetch_all, fetch_count, fetch_first, fetch_one, fetch_page, fetch_rows, project_all,
    project_first, project_one, project_page,
};
pub use mutation::{BulkExecutor, InvalidationHook, NoopInvalidation};
pub use page::Page;
