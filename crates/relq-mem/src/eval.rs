//! Expression evaluation over joined tuples.
//!
//! SQL three-valued logic throughout: NULL operands yield NULL from
//! comparisons and arithmetic, `AND`/`OR` follow the Kleene tables, and a
//! filter keeps a row only when its predicate evaluates to true (never to
//! NULL).

use std::collections::HashMap;

use relq_core::{Error, Result, Value};
use relq_query::{AggregateFn, BinaryOp, Expr, ExprKind, PathKey};

use crate::interpret;

/// One stored row: column name to value.
pub(crate) type StoredRow = HashMap<String, Value>;

/// All tables, keyed by schema arena index.
pub(crate) type Tables = HashMap<usize, Vec<StoredRow>>;

/// One joined tuple: alias to the row bound under it. A missing alias means
/// the left join matched nothing; its fields evaluate to NULL.
pub(crate) type Tuple = HashMap<String, StoredRow>;

/// Evaluation context: the plan's alias resolution plus the store for
/// subqueries.
pub(crate) struct EvalCtx<'a> {
    pub aliases: &'a HashMap<PathKey, String>,
    pub tables: &'a Tables,
}

/// Evaluate an expression against one tuple.
pub(crate) fn eval(expr: &Expr, tuple: &Tuple, ctx: &EvalCtx<'_>) -> Result<Value> {
    match expr.kind() {
        ExprKind::Literal(v) => Ok(v.clone()),
        ExprKind::Field(f) => {
            let alias = ctx.aliases.get(&f.key).ok_or_else(|| {
                Error::invalid_plan(format!(
                    "field `{}` references a traversal the plan does not join",
                    f.label()
                ))
            })?;
            Ok(tuple
                .get(alias)
                .and_then(|row| row.get(&f.field))
                .cloned()
                .unwrap_or(Value::Null))
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let a = eval(lhs, tuple, ctx)?;
            let b = eval(rhs, tuple, ctx)?;
            apply_binary(*op, a, b)
        }
        ExprKind::Not(inner) => Ok(apply_not(eval(inner, tuple, ctx)?)),
        ExprKind::IsNull { expr, negated } => {
            let v = eval(expr, tuple, ctx)?;
            Ok(Value::Bool(v.is_null() != *negated))
        }
        ExprKind::InList { expr, list } => Ok(apply_in(eval(expr, tuple, ctx)?, list)),
        ExprKind::Between { expr, lo, hi } => Ok(apply_between(eval(expr, tuple, ctx)?, lo, hi)),
        ExprKind::Like { expr, pattern } => Ok(apply_like(eval(expr, tuple, ctx)?, pattern)),
        ExprKind::Aggregate { .. } => Err(Error::invalid_plan(
            "aggregate evaluated outside a grouped context",
        )),
        ExprKind::Case {
            branches,
            otherwise,
        } => {
            for (cond, value) in branches {
                if is_true(&eval(cond, tuple, ctx)?) {
                    return eval(value, tuple, ctx);
                }
            }
            eval(otherwise, tuple, ctx)
        }
        ExprKind::Cast { expr, to } => Ok(apply_cast(eval(expr, tuple, ctx)?, *to)),
        ExprKind::Subquery(plan) => {
            let rows = interpret::run_select(ctx.tables, plan)?;
            Ok(rows
                .first()
                .and_then(|r| r.values().first())
                .cloned()
                .unwrap_or(Value::Null))
        }
    }
}

/// Evaluate an expression over a whole group of tuples. Aggregates fold the
/// group; everything else defers to single-tuple evaluation against the
/// group's first tuple (grouping keys are constant within a group).
pub(crate) fn eval_grouped(expr: &Expr, group: &[Tuple], ctx: &EvalCtx<'_>) -> Result<Value> {
    if !expr.contains_aggregate() {
        return match group.first() {
            Some(tuple) => eval(expr, tuple, ctx),
            None => eval(expr, &Tuple::new(), ctx),
        };
    }
    match expr.kind() {
        ExprKind::Aggregate { func, arg } => {
            let arg = match arg {
                None => {
                    return Ok(Value::BigInt(group.len() as i64));
                }
                Some(a) => a,
            };
            let mut values = Vec::with_capacity(group.len());
            for tuple in group {
                let v = eval(arg, tuple, ctx)?;
                if !v.is_null() {
                    values.push(v);
                }
            }
            Ok(fold_aggregate(*func, &values))
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let a = eval_grouped(lhs, group, ctx)?;
            let b = eval_grouped(rhs, group, ctx)?;
            apply_binary(*op, a, b)
        }
        ExprKind::Not(inner) => Ok(apply_not(eval_grouped(inner, group, ctx)?)),
        ExprKind::IsNull { expr, negated } => {
            let v = eval_grouped(expr, group, ctx)?;
            Ok(Value::Bool(v.is_null() != *negated))
        }
        ExprKind::InList { expr, list } => Ok(apply_in(eval_grouped(expr, group, ctx)?, list)),
        ExprKind::Between { expr, lo, hi } => {
            Ok(apply_between(eval_grouped(expr, group, ctx)?, lo, hi))
        }
        ExprKind::Like { expr, pattern } => {
            Ok(apply_like(eval_grouped(expr, group, ctx)?, pattern))
        }
        ExprKind::Case {
            branches,
            otherwise,
        } => {
            for (cond, value) in branches {
                if is_true(&eval_grouped(cond, group, ctx)?) {
                    return eval_grouped(value, group, ctx);
                }
            }
            eval_grouped(otherwise, group, ctx)
        }
        ExprKind::Cast { expr, to } => Ok(apply_cast(eval_grouped(expr, group, ctx)?, *to)),
        _ => Err(Error::invalid_plan(
            "unsupported expression in grouped context",
        )),
    }
}

fn fold_aggregate(func: AggregateFn, values: &[Value]) -> Value {
    match func {
        AggregateFn::Count => Value::BigInt(values.len() as i64),
        AggregateFn::Sum => {
            if values.is_empty() {
                return Value::Null;
            }
            if values.iter().any(|v| matches!(v, Value::Double(_))) {
                let sum: f64 = values.iter().filter_map(Value::as_f64).sum();
                Value::Double(sum)
            } else {
                let sum: i64 = values.iter().filter_map(Value::as_i64).sum();
                Value::BigInt(sum)
            }
        }
        AggregateFn::Avg => {
            if values.is_empty() {
                return Value::Null;
            }
            let sum: f64 = values.iter().filter_map(Value::as_f64).sum();
            Value::Double(sum / values.len() as f64)
        }
        AggregateFn::Max => values
            .iter()
            .cloned()
            .reduce(|a, b| {
                if a.compare(&b) == Some(std::cmp::Ordering::Less) {
                    b
                } else {
                    a
                }
            })
            .unwrap_or(Value::Null),
        AggregateFn::Min => values
            .iter()
            .cloned()
            .reduce(|a, b| {
                if a.compare(&b) == Some(std::cmp::Ordering::Greater) {
                    b
                } else {
                    a
                }
            })
            .unwrap_or(Value::Null),
    }
}

/// Whether a predicate result keeps its row.
pub(crate) fn is_true(v: &Value) -> bool {
    matches!(v, Value::Bool(true))
}

/// NULL-aware equality used for grouping and distinct, where two NULLs count
/// as the same bucket.
pub(crate) fn bucket_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        _ => a.compare(b) == Some(std::cmp::Ordering::Equal),
    }
}

pub(crate) fn apply_binary(op: BinaryOp, a: Value, b: Value) -> Result<Value> {
    use std::cmp::Ordering;
    match op {
        BinaryOp::And => Ok(match (kleene(&a), kleene(&b)) {
            (Some(false), _) | (_, Some(false)) => Value::Bool(false),
            (Some(true), Some(true)) => Value::Bool(true),
            _ => Value::Null,
        }),
        BinaryOp::Or => Ok(match (kleene(&a), kleene(&b)) {
            (Some(true), _) | (_, Some(true)) => Value::Bool(true),
            (Some(false), Some(false)) => Value::Bool(false),
            _ => Value::Null,
        }),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            Ok(match a.compare(&b) {
                None => Value::Null,
                Some(ord) => Value::Bool(match op {
                    BinaryOp::Eq => ord == Ordering::Equal,
                    BinaryOp::Ne => ord != Ordering::Equal,
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    BinaryOp::Ge => ord != Ordering::Less,
                    _ => unreachable!(),
                }),
            })
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => arith(op, &a, &b),
        BinaryOp::Concat => Ok(if a.is_null() || b.is_null() {
            Value::Null
        } else {
            Value::Text(format!("{}{}", a.to_text(), b.to_text()))
        }),
    }
}

fn kleene(v: &Value) -> Option<bool> {
    v.as_bool()
}

fn arith(op: BinaryOp, a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    if matches!(a, Value::Double(_)) || matches!(b, Value::Double(_)) {
        let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
            return Err(Error::Execution("non-numeric operand".to_string()));
        };
        return Ok(Value::Double(match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => {
                if y == 0.0 {
                    return Err(Error::Execution("division by zero".to_string()));
                }
                x / y
            }
            _ => unreachable!(),
        }));
    }
    let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) else {
        return Err(Error::Execution("non-numeric operand".to_string()));
    };
    let out = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Div => {
            if y == 0 {
                return Err(Error::Execution("division by zero".to_string()));
            }
            x.checked_div(y)
        }
        _ => unreachable!(),
    };
    out.map(Value::BigInt)
        .ok_or_else(|| Error::Execution("integer overflow".to_string()))
}

fn apply_not(v: Value) -> Value {
    match v.as_bool() {
        Some(b) => Value::Bool(!b),
        None => Value::Null,
    }
}

fn apply_in(needle: Value, list: &[Value]) -> Value {
    if needle.is_null() {
        return Value::Null;
    }
    let mut saw_null = false;
    for candidate in list {
        match needle.compare(candidate) {
            Some(std::cmp::Ordering::Equal) => return Value::Bool(true),
            Some(_) => {}
            None => saw_null = true,
        }
    }
    if saw_null {
        Value::Null
    } else {
        Value::Bool(false)
    }
}

fn apply_between(v: Value, lo: &Value, hi: &Value) -> Value {
    use std::cmp::Ordering;
    match (v.compare(lo), v.compare(hi)) {
        (Some(a), Some(b)) => Value::Bool(a != Ordering::Less && b != Ordering::Greater),
        _ => Value::Null,
    }
}

fn apply_like(v: Value, pattern: &str) -> Value {
    match v.as_str() {
        None => Value::Null,
        Some(text) => Value::Bool(like_match(
            &text.chars().collect::<Vec<_>>(),
            &pattern.chars().collect::<Vec<_>>(),
        )),
    }
}

/// SQL LIKE: `%` matches any run, `_` matches one character.
fn like_match(text: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('%') => {
            (0..=text.len()).any(|skip| like_match(&text[skip..], &pattern[1..]))
        }
        Some('_') => !text.is_empty() && like_match(&text[1..], &pattern[1..]),
        Some(c) => text.first() == Some(c) && like_match(&text[1..], &pattern[1..]),
    }
}

fn apply_cast(v: Value, to: relq_core::SemanticType) -> Value {
    use relq_core::SemanticType;
    if v.is_null() {
        return Value::Null;
    }
    match to {
        SemanticType::Text => Value::Text(v.to_text()),
        SemanticType::Int => v
            .as_i64()
            .map(|i| Value::Int(i as i32))
            .unwrap_or(Value::Null),
        SemanticType::BigInt => v.as_i64().map(Value::BigInt).unwrap_or(Value::Null),
        SemanticType::Double => v.as_f64().map(Value::Double).unwrap_or(Value::Null),
        SemanticType::Bool => v.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        SemanticType::Bytes => v,
    }
}
