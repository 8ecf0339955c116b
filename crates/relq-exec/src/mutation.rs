//! Bulk mutation execution.
//!
//! Bulk statements touch rows directly and bypass any per-record lifecycle,
//! so anything holding previously fetched state — an identity map, a query
//! cache — is stale the moment one succeeds. [`InvalidationHook`] is how
//! those layers find out; the hook fires after every successful mutation,
//! affected-row count notwithstanding.

use std::sync::Arc;

use asupersync::{Cx, Outcome};
use relq_core::Error;
use relq_query::MutationPlan;

use crate::executor::Executor;

/// Observer of successful bulk mutations.
pub trait InvalidationHook: Send + Sync {
    /// Called after a mutation succeeds, before the affected-row count is
    /// returned to the caller.
    fn invalidate(&self, plan: &MutationPlan, affected: u64);
}

/// A hook that does nothing, for callers with no cached state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidation;

impl InvalidationHook for NoopInvalidation {
    fn invalidate(&self, _plan: &MutationPlan, _affected: u64) {}
}

/// Runs bulk mutations through an executor, firing the invalidation hook on
/// success.
pub struct BulkExecutor<'e, E> {
    executor: &'e E,
    hook: Arc<dyn InvalidationHook>,
}

impl<E> std::fmt::Debug for BulkExecutor<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkExecutor").finish_non_exhaustive()
    }
}

impl<'e, E: Executor> BulkExecutor<'e, E> {
    /// Wrap an executor with no invalidation.
    pub fn new(executor: &'e E) -> Self {
        Self {
            executor,
            hook: Arc::new(NoopInvalidation),
        }
    }

    /// Attach an invalidation hook.
    pub fn with_hook(mut self, hook: Arc<dyn InvalidationHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Execute a mutation plan, returning the affected-row count.
    #[tracing::instrument(level = "debug", skip(self, cx, plan))]
    pub async fn execute(&self, cx: &Cx, plan: &MutationPlan) -> Outcome<u64, Error> {
        let affected = match self.executor.run_mutation(cx, plan).await {
            Outcome::Ok(affected) => affected,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        tracing::info!(kind = ?plan.kind, affected, "bulk mutation executed");
        self.hook.invalidate(plan, affected);
        Outcome::Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicU64, Ordering};

    use asupersync::runtime::RuntimeBuilder;
    use relq_core::schema::{FieldDef, SchemaRegistry};
    use relq_core::{Row, SemanticType};
    use relq_query::{CountPlan, EntityPath, SelectPlan, mutation::update};

    struct FixedExecutor {
        affected: u64,
        fail: bool,
    }

    impl Executor for FixedExecutor {
        fn run_select(
            &self,
            _cx: &Cx,
            _plan: &SelectPlan,
        ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
            async { Outcome::Ok(Vec::new()) }
        }

        fn run_count(
            &self,
            _cx: &Cx,
            _plan: &CountPlan,
        ) -> impl Future<Output = Outcome<u64, Error>> + Send {
            async { Outcome::Ok(0) }
        }

        fn run_mutation(
            &self,
            _cx: &Cx,
            _plan: &MutationPlan,
        ) -> impl Future<Output = Outcome<u64, Error>> + Send {
            let affected = self.affected;
            let fail = self.fail;
            async move {
                if fail {
                    Outcome::Err(Error::Execution("store offline".to_string()))
                } else {
                    Outcome::Ok(affected)
                }
            }
        }
    }

    #[derive(Default)]
    struct CountingHook {
        fired: AtomicU64,
        last_affected: AtomicU64,
    }

    impl InvalidationHook for CountingHook {
        fn invalidate(&self, _plan: &MutationPlan, affected: u64) {
            self.fired.fetch_add(1, Ordering::SeqCst);
            self.last_affected.store(affected, Ordering::SeqCst);
        }
    }

    fn member_plan() -> MutationPlan {
        let mut reg = SchemaRegistry::new();
        let member = reg.register(
            "member",
            "id",
            vec![FieldDef::new("age", SemanticType::Int)],
        );
        let m = EntityPath::root(Arc::new(reg), member, "m");
        let age = m.field("age").unwrap();
        update(&m)
            .set("age", age.clone().add(1).unwrap())
            .filter(age.goe(15).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn hook_fires_after_success() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();

        rt.block_on(async {
            let executor = FixedExecutor {
                affected: 2,
                fail: false,
            };
            let hook = Arc::new(CountingHook::default());
            let bulk = BulkExecutor::new(&executor).with_hook(hook.clone());
            let plan = member_plan();

            let affected = match bulk.execute(&cx, &plan).await {
                Outcome::Ok(n) => n,
                other => panic!("unexpected outcome: {other:?}"),
            };
            assert_eq!(affected, 2);
            assert_eq!(hook.fired.load(Ordering::SeqCst), 1);
            assert_eq!(hook.last_affected.load(Ordering::SeqCst), 2);
        });
    }

    #[test]
    fn hook_fires_even_when_nothing_matched() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();

        rt.block_on(async {
            let executor = FixedExecutor {
                affected: 0,
                fail: false,
            };
            let hook = Arc::new(CountingHook::default());
            let bulk = BulkExecutor::new(&executor).with_hook(hook.clone());

            match bulk.execute(&cx, &member_plan()).await {
                Outcome::Ok(0) => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
            assert_eq!(hook.fired.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn hook_stays_silent_on_failure() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();

        rt.block_on(async {
            let executor = FixedExecutor {
                affected: 0,
                fail: true,
            };
            let hook = Arc::new(CountingHook::default());
            let bulk = BulkExecutor::new(&executor).with_hook(hook.clone());

            match bulk.execute(&cx, &member_plan()).await {
                Outcome::Err(Error::Execution(_)) => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
            assert_eq!(hook.fired.load(Ordering::SeqCst), 0);
        });
    }
}
