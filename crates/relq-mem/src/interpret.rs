//! Plan interpretation against the in-memory tables.
//!
//! Clause order mirrors a SQL engine: join expansion, row filter, grouping,
//! group filter, selection, distinct, ordering, then the window. Sorting is
//! stable, so equal keys keep their store order and secondary terms behave
//! the way a deterministic store would.

use std::collections::HashMap;

use relq_core::{Result, Row, Value};
use relq_query::{
    Direction, JoinConstraint, JoinKind, MutationKind, MutationPlan, NullOrder, PathKey,
    SelectPlan,
};

use crate::eval::{EvalCtx, StoredRow, Tables, Tuple, bucket_eq, eval, eval_grouped, is_true};

pub(crate) fn run_select(tables: &Tables, plan: &SelectPlan) -> Result<Vec<Row>> {
    let aliases = alias_map(plan);
    let ctx = EvalCtx {
        aliases: &aliases,
        tables,
    };

    let mut tuples: Vec<Tuple> = tables
        .get(&plan.root.schema.index())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|row| Tuple::from([(plan.root.alias.clone(), row)]))
        .collect();

    for join in &plan.joins {
        tuples = expand_join(tuples, join, &ctx)?;
    }

    if let Some(filter) = &plan.filter {
        let mut kept = Vec::with_capacity(tuples.len());
        for tuple in tuples {
            if is_true(&eval(filter, &tuple, &ctx)?) {
                kept.push(tuple);
            }
        }
        tuples = kept;
    }

    let grouped = !plan.group_by.is_empty()
        || plan.select.iter().any(|s| s.expr.contains_aggregate())
        || plan.having.is_some();

    // each candidate: projected values plus its sort keys
    let mut candidates: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();

    if grouped {
        let mut groups: Vec<(Vec<Value>, Vec<Tuple>)> = Vec::new();
        if plan.group_by.is_empty() {
            groups.push((Vec::new(), tuples));
        } else {
            for tuple in tuples {
                let mut key = Vec::with_capacity(plan.group_by.len());
                for g in &plan.group_by {
                    key.push(eval(g, &tuple, &ctx)?);
                }
                match groups
                    .iter_mut()
                    .find(|(k, _)| values_eq(k, &key))
                {
                    Some((_, members)) => members.push(tuple),
                    None => groups.push((key, vec![tuple])),
                }
            }
        }

        for (_, members) in groups {
            if let Some(having) = &plan.having {
                if !is_true(&eval_grouped(having, &members, &ctx)?) {
                    continue;
                }
            }
            let mut values = Vec::with_capacity(plan.select.len());
            for entry in &plan.select {
                values.push(eval_grouped(&entry.expr, &members, &ctx)?);
            }
            let mut keys = Vec::with_capacity(plan.order_by.len());
            for term in &plan.order_by {
                keys.push(eval_grouped(&term.expr, &members, &ctx)?);
            }
            candidates.push((values, keys));
        }
    } else {
        for tuple in &tuples {
            let mut values = Vec::with_capacity(plan.select.len());
            for entry in &plan.select {
                values.push(eval(&entry.expr, tuple, &ctx)?);
            }
            let mut keys = Vec::with_capacity(plan.order_by.len());
            for term in &plan.order_by {
                keys.push(eval(&term.expr, tuple, &ctx)?);
            }
            candidates.push((values, keys));
        }
    }

    if plan.distinct {
        let mut seen: Vec<Vec<Value>> = Vec::new();
        candidates.retain(|(values, _)| {
            if seen.iter().any(|s| values_eq(s, values)) {
                false
            } else {
                seen.push(values.clone());
                true
            }
        });
    }

    if !plan.order_by.is_empty() {
        candidates.sort_by(|(_, a), (_, b)| compare_keys(a, b, plan));
    }

    let offset = plan.offset.unwrap_or(0) as usize;
    let limit = plan.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    let labels = plan.labels();
    Ok(candidates
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(values, _)| Row::new(labels.clone(), values))
        .collect())
}

pub(crate) fn run_mutation(tables: &mut Tables, plan: &MutationPlan) -> Result<u64> {
    let mut aliases = HashMap::new();
    aliases.insert(PathKey::root(plan.alias.clone()), plan.alias.clone());

    // evaluate against a snapshot so every row sees pre-mutation state
    let snapshot = tables.clone();
    let ctx = EvalCtx {
        aliases: &aliases,
        tables: &snapshot,
    };

    let matches = |row: &StoredRow, ctx: &EvalCtx<'_>| -> Result<bool> {
        match &plan.filter {
            None => Ok(true),
            Some(filter) => {
                let tuple = Tuple::from([(plan.alias.clone(), row.clone())]);
                Ok(is_true(&eval(filter, &tuple, ctx)?))
            }
        }
    };

    let rows = tables.entry(plan.schema.index()).or_default();
    let mut affected = 0u64;

    match plan.kind {
        MutationKind::Update => {
            let schema = plan.registry.schema(plan.schema);
            for row in rows.iter_mut() {
                if !matches(row, &ctx)? {
                    continue;
                }
                let tuple = Tuple::from([(plan.alias.clone(), row.clone())]);
                // all right-hand sides read the old row
                let mut updates = Vec::with_capacity(plan.assignments.len());
                for assignment in &plan.assignments {
                    let value = eval(&assignment.value, &tuple, &ctx)?;
                    let ty = schema.field(&assignment.field)?.ty;
                    updates.push((assignment.field.clone(), coerce(value, ty)));
                }
                for (field, value) in updates {
                    row.insert(field, value);
                }
                affected += 1;
            }
        }
        MutationKind::Delete => {
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows.drain(..) {
                if matches(&row, &ctx)? {
                    affected += 1;
                } else {
                    kept.push(row);
                }
            }
            *rows = kept;
        }
    }

    Ok(affected)
}

fn expand_join(
    tuples: Vec<Tuple>,
    join: &relq_query::JoinClause,
    ctx: &EvalCtx<'_>,
) -> Result<Vec<Tuple>> {
    let empty = Vec::new();
    let table = ctx
        .tables
        .get(&join.schema.index())
        .unwrap_or(&empty);

    let mut out = Vec::new();
    for tuple in tuples {
        let mut matched = false;
        for row in table {
            if !constraint_holds(&tuple, row, &join.constraint) {
                continue;
            }
            let mut extended = tuple.clone();
            extended.insert(join.alias.clone(), row.clone());
            if let Some(on) = &join.on {
                if !is_true(&eval(on, &extended, ctx)?) {
                    continue;
                }
            }
            matched = true;
            out.push(extended);
        }
        if !matched {
            match join.kind {
                // left joins keep the unmatched side; the alias stays unbound
                JoinKind::Left => out.push(tuple),
                JoinKind::Inner | JoinKind::Cross => {}
            }
        }
    }
    Ok(out)
}

fn constraint_holds(tuple: &Tuple, row: &StoredRow, constraint: &JoinConstraint) -> bool {
    match constraint {
        JoinConstraint::None => true,
        JoinConstraint::Relation {
            parent_alias,
            local_key,
            remote_key,
        } => {
            let Some(parent) = tuple.get(parent_alias) else {
                return false;
            };
            let local = parent.get(local_key).cloned().unwrap_or(Value::Null);
            let remote = row.get(remote_key).cloned().unwrap_or(Value::Null);
            local.compare(&remote) == Some(std::cmp::Ordering::Equal)
        }
    }
}

fn values_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| bucket_eq(x, y))
}

fn compare_keys(a: &[Value], b: &[Value], plan: &SelectPlan) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    for (i, term) in plan.order_by.iter().enumerate() {
        let (x, y) = (&a[i], &b[i]);
        let ord = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => match term.nulls {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (false, true) => match term.nulls {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            (false, false) => {
                let natural = x.compare(y).unwrap_or(Ordering::Equal);
                match term.direction {
                    Direction::Asc => natural,
                    Direction::Desc => natural.reverse(),
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn coerce(value: Value, ty: relq_core::SemanticType) -> Value {
    use relq_core::SemanticType;
    if value.is_null() {
        return Value::Null;
    }
    match ty {
        SemanticType::Int => value
            .as_i64()
            .map(|i| Value::Int(i as i32))
            .unwrap_or(value),
        SemanticType::BigInt => value.as_i64().map(Value::BigInt).unwrap_or(value),
        SemanticType::Double => value.as_f64().map(Value::Double).unwrap_or(value),
        SemanticType::Bool | SemanticType::Text | SemanticType::Bytes => value,
    }
}

fn alias_map(plan: &SelectPlan) -> HashMap<PathKey, String> {
    let mut map = HashMap::new();
    map.insert(
        PathKey::root(plan.root.alias.clone()),
        plan.root.alias.clone(),
    );
    for join in &plan.joins {
        map.insert(join.key.clone(), join.alias.clone());
    }
    map
}
