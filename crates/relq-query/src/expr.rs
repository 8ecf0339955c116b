//! The typed expression model.
//!
//! Expressions are immutable trees: every combinator returns a new node and
//! never mutates in place. Operator/operand compatibility is checked when the
//! node is built, so a `TypeMismatch` always surfaces before execution.
//! Literals are kept distinct from field references so SQL generation can
//! bind them as parameters.

use relq_core::{Error, Result, SemanticType, Value};

use crate::path::FieldRef;
use crate::plan::{SelectExpr, SelectPlan};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// String concatenation.
    Concat,
}

impl BinaryOp {
    /// Operator name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "loe",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "goe",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Add => "add",
            BinaryOp::Sub => "subtract",
            BinaryOp::Mul => "multiply",
            BinaryOp::Div => "divide",
            BinaryOp::Concat => "concat",
        }
    }
}

/// Aggregate functions. Only valid in select and having position; the plan
/// builder rejects them elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    /// `count(...)` / `count(*)`
    Count,
    /// `sum(...)`
    Sum,
    /// `avg(...)`
    Avg,
    /// `max(...)`
    Max,
    /// `min(...)`
    Min,
}

impl AggregateFn {
    /// Function name used in labels and error messages.
    pub fn name(self) -> &'static str {
        match self {
            AggregateFn::Count => "count",
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Max => "max",
            AggregateFn::Min => "min",
        }
    }
}

/// The structure of an expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A constant, bound as a parameter at execution time.
    Literal(Value),
    /// A typed field reference reached through a path.
    Field(FieldRef),
    /// Binary operator application.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// `IS NULL` / `IS NOT NULL`.
    IsNull {
        /// The tested expression.
        expr: Box<Expr>,
        /// True for `IS NOT NULL`.
        negated: bool,
    },
    /// Membership in a literal list.
    InList {
        /// The tested expression.
        expr: Box<Expr>,
        /// Candidate values.
        list: Vec<Value>,
    },
    /// Inclusive range test.
    Between {
        /// The tested expression.
        expr: Box<Expr>,
        /// Lower bound.
        lo: Value,
        /// Upper bound.
        hi: Value,
    },
    /// SQL LIKE pattern match.
    Like {
        /// The tested expression.
        expr: Box<Expr>,
        /// Pattern with `%`/`_` wildcards.
        pattern: String,
    },
    /// Aggregate application. `arg: None` is `count(*)`.
    Aggregate {
        /// The function.
        func: AggregateFn,
        /// The aggregated expression, absent for `count(*)`.
        arg: Option<Box<Expr>>,
    },
    /// Searched case chain: first matching branch wins, in declaration order.
    Case {
        /// `(condition, result)` pairs.
        branches: Vec<(Expr, Expr)>,
        /// Fallback when no branch matches.
        otherwise: Box<Expr>,
    },
    /// Explicit type conversion.
    Cast {
        /// The converted expression.
        expr: Box<Expr>,
        /// Target type.
        to: SemanticType,
    },
    /// Scalar sub-select.
    Subquery(Box<SelectPlan>),
}

/// Result type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprType {
    /// A concrete semantic type.
    Known(SemanticType),
    /// The untyped NULL literal; compatible with every type.
    Null,
}

impl ExprType {
    /// Whether two expression types may meet in a comparison.
    pub fn comparable_with(self, other: ExprType) -> bool {
        match (self, other) {
            (ExprType::Null, _) | (_, ExprType::Null) => true,
            (ExprType::Known(a), ExprType::Known(b)) => a.comparable_with(b),
        }
    }

    /// Whether this type participates in arithmetic.
    pub fn is_numeric(self) -> bool {
        match self {
            ExprType::Null => true,
            ExprType::Known(t) => t.is_numeric(),
        }
    }

    /// Display name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            ExprType::Null => "null",
            ExprType::Known(t) => t.name(),
        }
    }
}

/// Numeric result type of an arithmetic node.
fn widen(a: ExprType, b: ExprType) -> SemanticType {
    use SemanticType::{BigInt, Double};
    let rank = |t: ExprType| match t {
        ExprType::Known(Double) => 2,
        ExprType::Known(BigInt) | ExprType::Null => 1,
        _ => 0,
    };
    match rank(a).max(rank(b)) {
        2 => SemanticType::Double,
        1 => SemanticType::BigInt,
        _ => SemanticType::Int,
    }
}

/// A typed, immutable expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    kind: ExprKind,
    ty: ExprType,
}

/// Conversion into an expression operand.
///
/// Implemented for `Expr` itself and for plain Rust scalars, so combinators
/// accept both columns and constants: `age.gt(15)`, `age.gt(other_age)`.
pub trait IntoExpr {
    /// Convert into an expression node.
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

macro_rules! literal_into_expr {
    ($($t:ty),* $(,)?) => {
        $(impl IntoExpr for $t {
            fn into_expr(self) -> Expr {
                Expr::literal(self)
            }
        })*
    };
}

literal_into_expr!(Value, bool, i32, i64, f64, &str, String);

impl Expr {
    /// Wrap a constant. Distinguished from field references so SQL
    /// generation binds it as a parameter.
    pub fn literal(value: impl Into<Value>) -> Expr {
        let value = value.into();
        let ty = match value.semantic_type() {
            Some(t) => ExprType::Known(t),
            None => ExprType::Null,
        };
        Expr {
            kind: ExprKind::Literal(value),
            ty,
        }
    }

    /// Wrap a field reference.
    pub(crate) fn field(field: FieldRef) -> Expr {
        let ty = ExprType::Known(field.ty);
        Expr {
            kind: ExprKind::Field(field),
            ty,
        }
    }

    /// `count(*)`.
    pub fn count_all() -> Expr {
        Expr {
            kind: ExprKind::Aggregate {
                func: AggregateFn::Count,
                arg: None,
            },
            ty: ExprType::Known(SemanticType::BigInt),
        }
    }

    /// A scalar sub-select. The plan must project exactly one column.
    pub fn subquery(plan: SelectPlan) -> Result<Expr> {
        let ty = plan.scalar_type()?;
        Ok(Expr {
            kind: ExprKind::Subquery(Box::new(plan)),
            ty,
        })
    }

    /// The node structure.
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// The result type.
    pub fn ty(&self) -> ExprType {
        self.ty
    }

    /// Whether this expression is boolean-typed.
    pub fn is_boolean(&self) -> bool {
        self.ty == ExprType::Known(SemanticType::Bool)
    }

    /// Whether the tree contains an aggregate node.
    pub fn contains_aggregate(&self) -> bool {
        match &self.kind {
            ExprKind::Aggregate { .. } => true,
            ExprKind::Literal(_) | ExprKind::Field(_) | ExprKind::Subquery(_) => false,
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.contains_aggregate() || rhs.contains_aggregate()
            }
            ExprKind::Not(e) | ExprKind::Cast { expr: e, .. } => e.contains_aggregate(),
            ExprKind::IsNull { expr, .. }
            | ExprKind::InList { expr, .. }
            | ExprKind::Between { expr, .. }
            | ExprKind::Like { expr, .. } => expr.contains_aggregate(),
            ExprKind::Case {
                branches,
                otherwise,
            } => {
                branches
                    .iter()
                    .any(|(c, v)| c.contains_aggregate() || v.contains_aggregate())
                    || otherwise.contains_aggregate()
            }
        }
    }

    /// Give this expression an explicit result-column alias.
    pub fn alias(self, name: impl Into<String>) -> SelectExpr {
        SelectExpr {
            expr: self,
            alias: Some(name.into()),
        }
    }

    // ------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------

    fn compare(self, op: BinaryOp, other: impl IntoExpr) -> Result<Predicate> {
        let rhs = other.into_expr();
        if !self.ty.comparable_with(rhs.ty) {
            return Err(Error::type_mismatch(
                op.name(),
                self.ty.name(),
                rhs.ty.name(),
            ));
        }
        Ok(Predicate(Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(self),
                rhs: Box::new(rhs),
            },
            ty: ExprType::Known(SemanticType::Bool),
        }))
    }

    /// `self = other`.
    pub fn eq(self, other: impl IntoExpr) -> Result<Predicate> {
        self.compare(BinaryOp::Eq, other)
    }

    /// `self <> other`.
    pub fn ne(self, other: impl IntoExpr) -> Result<Predicate> {
        self.compare(BinaryOp::Ne, other)
    }

    /// `self < other`.
    pub fn lt(self, other: impl IntoExpr) -> Result<Predicate> {
        self.compare(BinaryOp::Lt, other)
    }

    /// `self <= other`.
    pub fn loe(self, other: impl IntoExpr) -> Result<Predicate> {
        self.compare(BinaryOp::Le, other)
    }

    /// `self > other`.
    pub fn gt(self, other: impl IntoExpr) -> Result<Predicate> {
        self.compare(BinaryOp::Gt, other)
    }

    /// `self >= other`.
    pub fn goe(self, other: impl IntoExpr) -> Result<Predicate> {
        self.compare(BinaryOp::Ge, other)
    }

    /// `self IS NULL`.
    pub fn is_null(self) -> Predicate {
        Predicate(Expr {
            kind: ExprKind::IsNull {
                expr: Box::new(self),
                negated: false,
            },
            ty: ExprType::Known(SemanticType::Bool),
        })
    }

    /// `self IS NOT NULL`.
    pub fn is_not_null(self) -> Predicate {
        Predicate(Expr {
            kind: ExprKind::IsNull {
                expr: Box::new(self),
                negated: true,
            },
            ty: ExprType::Known(SemanticType::Bool),
        })
    }

    /// `self BETWEEN lo AND hi` (inclusive).
    pub fn between(self, lo: impl Into<Value>, hi: impl Into<Value>) -> Result<Predicate> {
        let lo = lo.into();
        let hi = hi.into();
        for bound in [&lo, &hi] {
            let bound_ty = match bound.semantic_type() {
                Some(t) => ExprType::Known(t),
                None => ExprType::Null,
            };
            if !self.ty.comparable_with(bound_ty) {
                return Err(Error::type_mismatch(
                    "between",
                    self.ty.name(),
                    bound_ty.name(),
                ));
            }
        }
        Ok(Predicate(Expr {
            kind: ExprKind::Between {
                expr: Box::new(self),
                lo,
                hi,
            },
            ty: ExprType::Known(SemanticType::Bool),
        }))
    }

    /// `self IN (values...)`.
    pub fn in_list<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Result<Predicate> {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        for v in &list {
            let vty = match v.semantic_type() {
                Some(t) => ExprType::Known(t),
                None => ExprType::Null,
            };
            if !self.ty.comparable_with(vty) {
                return Err(Error::type_mismatch("in", self.ty.name(), vty.name()));
            }
        }
        Ok(Predicate(Expr {
            kind: ExprKind::InList {
                expr: Box::new(self),
                list,
            },
            ty: ExprType::Known(SemanticType::Bool),
        }))
    }

    /// `self LIKE pattern`. Text operands only.
    pub fn like(self, pattern: impl Into<String>) -> Result<Predicate> {
        if self.ty != ExprType::Known(SemanticType::Text) && self.ty != ExprType::Null {
            return Err(Error::type_mismatch("like", "text", self.ty.name()));
        }
        Ok(Predicate(Expr {
            kind: ExprKind::Like {
                expr: Box::new(self),
                pattern: pattern.into(),
            },
            ty: ExprType::Known(SemanticType::Bool),
        }))
    }

    // ------------------------------------------------------------------
    // Arithmetic and string operators
    // ------------------------------------------------------------------

    fn arith(self, op: BinaryOp, other: impl IntoExpr) -> Result<Expr> {
        let rhs = other.into_expr();
        if !self.ty.is_numeric() {
            return Err(Error::type_mismatch(op.name(), "numeric", self.ty.name()));
        }
        if !rhs.ty.is_numeric() {
            return Err(Error::type_mismatch(op.name(), "numeric", rhs.ty.name()));
        }
        let ty = ExprType::Known(widen(self.ty, rhs.ty));
        Ok(Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(self),
                rhs: Box::new(rhs),
            },
            ty,
        })
    }

    /// `self + other`.
    pub fn add(self, other: impl IntoExpr) -> Result<Expr> {
        self.arith(BinaryOp::Add, other)
    }

    /// `self - other`.
    pub fn sub(self, other: impl IntoExpr) -> Result<Expr> {
        self.arith(BinaryOp::Sub, other)
    }

    /// `self * other`.
    pub fn mul(self, other: impl IntoExpr) -> Result<Expr> {
        self.arith(BinaryOp::Mul, other)
    }

    /// `self / other`.
    pub fn div(self, other: impl IntoExpr) -> Result<Expr> {
        self.arith(BinaryOp::Div, other)
    }

    /// String concatenation. Both operands must be text; use
    /// [`Expr::string_value`] to convert other types first.
    pub fn concat(self, other: impl IntoExpr) -> Result<Expr> {
        let rhs = other.into_expr();
        for side in [self.ty, rhs.ty] {
            if side != ExprType::Known(SemanticType::Text) && side != ExprType::Null {
                return Err(Error::type_mismatch("concat", "text", side.name()));
            }
        }
        Ok(Expr {
            kind: ExprKind::Binary {
                op: BinaryOp::Concat,
                lhs: Box::new(self),
                rhs: Box::new(rhs),
            },
            ty: ExprType::Known(SemanticType::Text),
        })
    }

    /// Convert to text, for concatenation of non-text columns.
    pub fn string_value(self) -> Expr {
        Expr {
            kind: ExprKind::Cast {
                expr: Box::new(self),
                to: SemanticType::Text,
            },
            ty: ExprType::Known(SemanticType::Text),
        }
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    fn aggregate(self, func: AggregateFn, ty: SemanticType) -> Expr {
        Expr {
            kind: ExprKind::Aggregate {
                func,
                arg: Some(Box::new(self)),
            },
            ty: ExprType::Known(ty),
        }
    }

    /// `count(self)` — counts non-null values.
    pub fn count(self) -> Expr {
        self.aggregate(AggregateFn::Count, SemanticType::BigInt)
    }

    /// `sum(self)`. Numeric operands only.
    pub fn sum(self) -> Result<Expr> {
        if !self.ty.is_numeric() {
            return Err(Error::type_mismatch("sum", "numeric", self.ty.name()));
        }
        let ty = match self.ty {
            ExprType::Known(SemanticType::Double) => SemanticType::Double,
            _ => SemanticType::BigInt,
        };
        Ok(self.aggregate(AggregateFn::Sum, ty))
    }

    /// `avg(self)`. Numeric operands only; always produces a double.
    pub fn avg(self) -> Result<Expr> {
        if !self.ty.is_numeric() {
            return Err(Error::type_mismatch("avg", "numeric", self.ty.name()));
        }
        Ok(self.aggregate(AggregateFn::Avg, SemanticType::Double))
    }

    /// `max(self)`. Result keeps the operand type.
    pub fn max(self) -> Expr {
        let ty = match self.ty {
            ExprType::Known(t) => t,
            ExprType::Null => SemanticType::BigInt,
        };
        self.aggregate(AggregateFn::Max, ty)
    }

    /// `min(self)`. Result keeps the operand type.
    pub fn min(self) -> Expr {
        let ty = match self.ty {
            ExprType::Known(t) => t,
            ExprType::Null => SemanticType::BigInt,
        };
        self.aggregate(AggregateFn::Min, ty)
    }
}

/// A boolean-typed expression usable for filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(pub(crate) Expr);

impl Predicate {
    /// The underlying expression.
    pub fn expr(&self) -> &Expr {
        &self.0
    }

    /// Unwrap into the underlying expression.
    pub fn into_expr(self) -> Expr {
        self.0
    }

    /// Conjunction. An absent operand is elided: `p.and(None)` is `p`.
    pub fn and(self, other: impl Into<Option<Predicate>>) -> Predicate {
        match other.into() {
            None => self,
            Some(rhs) => Predicate(Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::And,
                    lhs: Box::new(self.0),
                    rhs: Box::new(rhs.0),
                },
                ty: ExprType::Known(SemanticType::Bool),
            }),
        }
    }

    /// Disjunction. An absent operand is elided: `p.or(None)` is `p`.
    pub fn or(self, other: impl Into<Option<Predicate>>) -> Predicate {
        match other.into() {
            None => self,
            Some(rhs) => Predicate(Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::Or,
                    lhs: Box::new(self.0),
                    rhs: Box::new(rhs.0),
                },
                ty: ExprType::Known(SemanticType::Bool),
            }),
        }
    }

    /// Logical negation.
    pub fn not(self) -> Predicate {
        Predicate(Expr {
            kind: ExprKind::Not(Box::new(self.0)),
            ty: ExprType::Known(SemanticType::Bool),
        })
    }
}

// ======================================================================
// Case chains
// ======================================================================

/// Entry point for searched case chains.
///
/// Branches are evaluated in declaration order and the first match wins;
/// `otherwise` is required and supplies the fallback.
#[derive(Debug)]
pub struct Case;

impl Case {
    /// Start a chain with a first condition.
    pub fn when(condition: Predicate) -> CaseArm {
        CaseArm {
            branches: Vec::new(),
            condition: condition.into_expr(),
        }
    }
}

/// A chain with a condition awaiting its result value.
#[derive(Debug)]
pub struct CaseArm {
    branches: Vec<(Expr, Expr)>,
    condition: Expr,
}

impl CaseArm {
    /// Supply the branch result. All branch results must share a type.
    pub fn then(mut self, value: impl IntoExpr) -> Result<CaseChain> {
        let value = value.into_expr();
        if let Some((_, first)) = self.branches.first() {
            if !first.ty().comparable_with(value.ty()) {
                return Err(Error::type_mismatch(
                    "case/then",
                    first.ty().name(),
                    value.ty().name(),
                ));
            }
        }
        self.branches.push((self.condition, value));
        Ok(CaseChain {
            branches: self.branches,
        })
    }
}

/// A chain of complete branches, ready for more arms or the fallback.
#[derive(Debug)]
pub struct CaseChain {
    branches: Vec<(Expr, Expr)>,
}

impl CaseChain {
    /// Add another condition.
    pub fn when(self, condition: Predicate) -> CaseArm {
        CaseArm {
            branches: self.branches,
            condition: condition.into_expr(),
        }
    }

    /// Finish the chain with the fallback value.
    pub fn otherwise(self, value: impl IntoExpr) -> Result<Expr> {
        let otherwise = value.into_expr();
        let mut ty = otherwise.ty();
        for (_, branch) in &self.branches {
            if !branch.ty().comparable_with(ty) {
                return Err(Error::type_mismatch(
                    "case/otherwise",
                    branch.ty().name(),
                    ty.name(),
                ));
            }
            if ty == ExprType::Null {
                ty = branch.ty();
            }
        }
        Ok(Expr {
            kind: ExprKind::Case {
                branches: self.branches,
                otherwise: Box::new(otherwise),
            },
            ty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age() -> Expr {
        Expr::field(FieldRef {
            key: crate::path::PathKey::root("m"),
            schema: test_schema(),
            field: "age".to_string(),
            ty: SemanticType::Int,
            nullable: false,
        })
    }

    fn username() -> Expr {
        Expr::field(FieldRef {
            key: crate::path::PathKey::root("m"),
            schema: test_schema(),
            field: "username".to_string(),
            ty: SemanticType::Text,
            nullable: true,
        })
    }

    fn test_schema() -> relq_core::SchemaId {
        let mut reg = relq_core::SchemaRegistry::new();
        reg.register("member", "id", vec![])
    }

    #[test]
    fn comparison_type_mismatch_fails_at_construction() {
        let err = age().eq("fifteen").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn numeric_widths_compare() {
        assert!(age().eq(15_i64).is_ok());
        assert!(age().lt(20.5).is_ok());
    }

    #[test]
    fn null_literal_compares_with_anything() {
        assert!(age().eq(Value::Null).is_ok());
        assert!(username().eq(Value::Null).is_ok());
    }

    #[test]
    fn arithmetic_rejects_text() {
        let err = username().add(1).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn arithmetic_widens() {
        let e = age().add(1).unwrap();
        assert_eq!(e.ty(), ExprType::Known(SemanticType::Int));
        let e = age().add(1.5).unwrap();
        assert_eq!(e.ty(), ExprType::Known(SemanticType::Double));
    }

    #[test]
    fn concat_needs_text_operands() {
        assert!(username().concat("_").is_ok());
        assert!(age().concat("_").is_err());
        assert!(username().concat(age().string_value()).is_ok());
    }

    #[test]
    fn composition_is_pure() {
        let base = age();
        let _ = base.clone().gt(10).unwrap();
        let again = base.clone().gt(10).unwrap();
        // the source node is unchanged and reusable
        assert_eq!(base.clone().gt(10).unwrap(), again);
    }

    #[test]
    fn predicate_combinators_elide_absent_operands() {
        let p = age().goe(15).unwrap();
        let same = p.clone().and(None);
        assert_eq!(p, same);
    }

    #[test]
    fn aggregates_carry_result_types() {
        assert_eq!(
            age().avg().unwrap().ty(),
            ExprType::Known(SemanticType::Double)
        );
        assert_eq!(
            age().sum().unwrap().ty(),
            ExprType::Known(SemanticType::BigInt)
        );
        assert_eq!(age().max().ty(), ExprType::Known(SemanticType::Int));
        assert_eq!(
            Expr::count_all().ty(),
            ExprType::Known(SemanticType::BigInt)
        );
    }

    #[test]
    fn sum_of_text_fails() {
        assert!(matches!(
            username().sum(),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn case_branches_must_agree() {
        let ok = Case::when(age().loe(10).unwrap())
            .then("0~10")
            .unwrap()
            .when(age().loe(20).unwrap())
            .then("10~20")
            .unwrap()
            .otherwise("others")
            .unwrap();
        assert_eq!(ok.ty(), ExprType::Known(SemanticType::Text));

        let err = Case::when(age().loe(10).unwrap())
            .then("0~10")
            .unwrap()
            .when(age().loe(20).unwrap())
            .then(20);
        assert!(err.is_err());
    }

    #[test]
    fn like_is_text_only() {
        assert!(username().like("mem%").is_ok());
        assert!(age().like("1%").is_err());
    }

    #[test]
    fn between_checks_bounds() {
        assert!(age().between(0, 10).is_ok());
        assert!(age().between(0, "ten").is_err());
    }

    #[test]
    fn in_list_checks_members() {
        assert!(username().in_list(["member1", "member2"]).is_ok());
        assert!(age().in_list(["member1"]).is_err());
    }
}
