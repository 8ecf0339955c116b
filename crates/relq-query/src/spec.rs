//! Reusable, query-independent predicate factories.
//!
//! A [`Specification`] captures a business rule ("is on team A", "is of
//! drinking age") as a function of the query root, so the same rule can be
//! applied to any query over that entity and composed with other rules
//! before any query exists.

use std::sync::Arc;

use relq_core::Result;

use crate::expr::Predicate;
use crate::path::EntityPath;

type SpecFn = dyn Fn(&EntityPath) -> Result<Option<Predicate>> + Send + Sync;

/// A composable predicate factory over a query root.
///
/// Factories may yield `None` (an absent criterion); composition skips
/// absent operands the same way [`crate::predicate::all`] does, and
/// [`Specification::not`] of an absent criterion stays absent.
#[derive(Clone)]
pub struct Specification {
    f: Arc<SpecFn>,
}

impl std::fmt::Debug for Specification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Specification").finish_non_exhaustive()
    }
}

impl Specification {
    /// Wrap a predicate factory.
    pub fn new(f: impl Fn(&EntityPath) -> Result<Option<Predicate>> + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// A factory that always yields a criterion.
    pub fn must(f: impl Fn(&EntityPath) -> Result<Predicate> + Send + Sync + 'static) -> Self {
        Self::new(move |root| f(root).map(Some))
    }

    /// Produce the predicate for a concrete query root.
    pub fn apply(&self, root: &EntityPath) -> Result<Option<Predicate>> {
        (self.f)(root)
    }

    /// Conjunction. Absent operands are skipped.
    pub fn and(self, other: Specification) -> Specification {
        Specification::new(move |root| {
            let lhs = self.apply(root)?;
            let rhs = other.apply(root)?;
            Ok(match (lhs, rhs) {
                (Some(a), rhs) => Some(a.and(rhs)),
                (None, rhs) => rhs,
            })
        })
    }

    /// Disjunction. Absent operands are skipped.
    pub fn or(self, other: Specification) -> Specification {
        Specification::new(move |root| {
            let lhs = self.apply(root)?;
            let rhs = other.apply(root)?;
            Ok(match (lhs, rhs) {
                (Some(a), rhs) => Some(a.or(rhs)),
                (None, rhs) => rhs,
            })
        })
    }

    /// Negation. An absent criterion stays absent.
    pub fn not(self) -> Specification {
        Specification::new(move |root| Ok(self.apply(root)?.map(Predicate::not)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, ExprKind};
    use relq_core::SemanticType;
    use relq_core::schema::{FieldDef, SchemaRegistry};

    fn member_root() -> EntityPath {
        let mut reg = SchemaRegistry::new();
        let member = reg.register(
            "member",
            "id",
            vec![
                FieldDef::new("username", SemanticType::Text).nullable(),
                FieldDef::new("age", SemanticType::Int),
            ],
        );
        EntityPath::root(Arc::new(reg), member, "m")
    }

    fn age_at_least(min: i32) -> Specification {
        Specification::must(move |root| root.field("age")?.goe(min))
    }

    fn username_eq(name: Option<String>) -> Specification {
        Specification::new(move |root| match &name {
            None => Ok(None),
            Some(n) => root.field("username")?.eq(n.as_str()).map(Some),
        })
    }

    #[test]
    fn specs_apply_to_any_root() {
        let spec = age_at_least(15);
        let root = member_root();
        let p = spec.apply(&root).unwrap().unwrap();
        assert!(matches!(
            p.expr().kind(),
            ExprKind::Binary { op: BinaryOp::Ge, .. }
        ));
    }

    #[test]
    fn composition_skips_absent_criteria() {
        let spec = age_at_least(15).and(username_eq(None));
        let p = spec.apply(&member_root()).unwrap().unwrap();
        assert!(matches!(
            p.expr().kind(),
            ExprKind::Binary { op: BinaryOp::Ge, .. }
        ));
    }

    #[test]
    fn all_absent_composes_to_absent() {
        let spec = username_eq(None).or(username_eq(None)).not();
        assert!(spec.apply(&member_root()).unwrap().is_none());
    }

    #[test]
    fn present_criteria_combine() {
        let spec = age_at_least(15).and(username_eq(Some("member1".to_string())));
        let p = spec.apply(&member_root()).unwrap().unwrap();
        assert!(matches!(
            p.expr().kind(),
            ExprKind::Binary { op: BinaryOp::And, .. }
        ));
    }

    #[test]
    fn factory_errors_propagate() {
        let spec = Specification::must(|root| root.field("nickname")?.goe(1));
        assert!(spec.apply(&member_root()).is_err());
    }
}
