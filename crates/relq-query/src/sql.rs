//! SQL rendering.
//!
//! Renders validated plans to dialect-specific SQL text plus an ordered
//! parameter list. Literals always become placeholders, never inline text.
//! Rendering is pure string assembly; it trusts the builder's validation and
//! only fails on shapes the builder cannot rule out (an unknown traversal in
//! a hand-assembled plan).

use std::collections::HashMap;

use relq_core::{Error, Result, SemanticType, Value};

use crate::expr::{AggregateFn, BinaryOp, Expr, ExprKind};
use crate::mutation::{MutationKind, MutationPlan};
use crate::path::PathKey;
use crate::plan::{
    CountPlan, Direction, JoinConstraint, JoinKind, NullOrder, SelectPlan,
};

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL.
    Mysql,
}

impl Dialect {
    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::Sqlite | Dialect::Mysql => "?".to_string(),
        }
    }

    fn quote(self, ident: &str) -> String {
        match self {
            Dialect::Mysql => format!("`{ident}`"),
            Dialect::Sqlite | Dialect::Postgres => format!("\"{ident}\""),
        }
    }

    fn cast_type(self, ty: SemanticType) -> &'static str {
        match (self, ty) {
            (Dialect::Mysql, SemanticType::Text) => "CHAR",
            (_, SemanticType::Text) => "TEXT",
            (Dialect::Mysql, SemanticType::Int | SemanticType::BigInt) => "SIGNED",
            (Dialect::Sqlite, SemanticType::Int | SemanticType::BigInt) => "INTEGER",
            (Dialect::Postgres, SemanticType::Int) => "INTEGER",
            (Dialect::Postgres, SemanticType::BigInt) => "BIGINT",
            (Dialect::Sqlite, SemanticType::Double) => "REAL",
            (_, SemanticType::Double) => "DOUBLE PRECISION",
            (_, SemanticType::Bool) => "BOOLEAN",
            (Dialect::Postgres, SemanticType::Bytes) => "BYTEA",
            (_, SemanticType::Bytes) => "BLOB",
        }
    }

    /// Whether `NULLS FIRST`/`NULLS LAST` is supported natively.
    fn has_null_ordering(self) -> bool {
        !matches!(self, Dialect::Mysql)
    }
}

/// Render a select plan to SQL text and its parameters.
pub fn render_select(plan: &SelectPlan, dialect: Dialect) -> Result<(String, Vec<Value>)> {
    let mut r = Renderer::new(dialect);
    let sql = r.select(plan)?;
    Ok((sql, r.params))
}

/// Render a count plan to SQL text and its parameters.
pub fn render_count(plan: &CountPlan, dialect: Dialect) -> Result<(String, Vec<Value>)> {
    render_select(&plan.plan, dialect)
}

/// Render a mutation plan to SQL text and its parameters.
pub fn render_mutation(plan: &MutationPlan, dialect: Dialect) -> Result<(String, Vec<Value>)> {
    let mut r = Renderer::new(dialect);
    let sql = r.mutation(plan)?;
    Ok((sql, r.params))
}

/// Field references in mutations render bare: `UPDATE member SET age = ...`
/// carries no alias.
const BARE: &str = "";

struct Renderer {
    dialect: Dialect,
    params: Vec<Value>,
}

impl Renderer {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    fn select(&mut self, plan: &SelectPlan) -> Result<String> {
        let aliases = select_aliases(plan);
        let mut sql = String::from("SELECT ");
        if plan.distinct {
            sql.push_str("DISTINCT ");
        }
        for (i, entry) in plan.select.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&self.expr(&entry.expr, &aliases)?);
            sql.push_str(" AS ");
            sql.push_str(&self.dialect.quote(&entry.label_at(i)));
        }

        let root_table = self.dialect.quote(plan.registry.schema(plan.root.schema).name);
        sql.push_str(&format!(
            " FROM {root_table} {}",
            self.dialect.quote(&plan.root.alias)
        ));

        for join in &plan.joins {
            let table = self.dialect.quote(plan.registry.schema(join.schema).name);
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
                JoinKind::Cross => "CROSS JOIN",
            };
            sql.push_str(&format!(
                " {keyword} {table} {}",
                self.dialect.quote(&join.alias)
            ));

            let mut condition = match &join.constraint {
                JoinConstraint::Relation {
                    parent_alias,
                    local_key,
                    remote_key,
                } => Some(format!(
                    "{}.{} = {}.{}",
                    self.dialect.quote(parent_alias),
                    self.dialect.quote(local_key),
                    self.dialect.quote(&join.alias),
                    self.dialect.quote(remote_key)
                )),
                JoinConstraint::None => None,
            };
            if let Some(on) = &join.on {
                let extra = self.expr(on, &aliases)?;
                condition = Some(match condition {
                    None => extra,
                    Some(base) => format!("{base} AND {extra}"),
                });
            }
            match (join.kind, condition) {
                (JoinKind::Cross, None) => {}
                (_, Some(c)) => sql.push_str(&format!(" ON {c}")),
                (_, None) => sql.push_str(" ON 1 = 1"),
            }
        }

        if let Some(filter) = &plan.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(filter, &aliases)?);
        }
        if !plan.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            for (i, g) in plan.group_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&self.expr(g, &aliases)?);
            }
        }
        if let Some(having) = &plan.having {
            sql.push_str(" HAVING ");
            sql.push_str(&self.expr(having, &aliases)?);
        }
        if !plan.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, term) in plan.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                if !self.dialect.has_null_ordering() {
                    // emulate placement: IS NULL sorts 0 before 1; rendered
                    // separately so each occurrence binds its own literals
                    let guard = self.expr(&term.expr, &aliases)?;
                    sql.push_str(&match term.nulls {
                        NullOrder::Last => format!("({guard} IS NULL) ASC, "),
                        NullOrder::First => format!("({guard} IS NULL) DESC, "),
                    });
                }
                let rendered = self.expr(&term.expr, &aliases)?;
                sql.push_str(&rendered);
                sql.push_str(match term.direction {
                    Direction::Asc => " ASC",
                    Direction::Desc => " DESC",
                });
                if self.dialect.has_null_ordering() {
                    sql.push_str(match term.nulls {
                        NullOrder::First => " NULLS FIRST",
                        NullOrder::Last => " NULLS LAST",
                    });
                }
            }
        }

        match (plan.limit, plan.offset) {
            (None, None) => {}
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (None, Some(offset)) => {
                // an offset needs a limit clause on these engines
                let sentinel = match self.dialect {
                    Dialect::Sqlite => "-1".to_string(),
                    Dialect::Mysql => u64::MAX.to_string(),
                    Dialect::Postgres => "ALL".to_string(),
                };
                sql.push_str(&format!(" LIMIT {sentinel} OFFSET {offset}"));
            }
        }

        Ok(sql)
    }

    fn mutation(&mut self, plan: &MutationPlan) -> Result<String> {
        let mut aliases = HashMap::new();
        aliases.insert(PathKey::root(plan.alias.clone()), BARE.to_string());
        let table = self.dialect.quote(plan.registry.schema(plan.schema).name);

        let mut sql = match plan.kind {
            MutationKind::Update => {
                let mut s = format!("UPDATE {table} SET ");
                for (i, a) in plan.assignments.iter().enumerate() {
                    if i > 0 {
                        s.push_str(", ");
                    }
                    s.push_str(&self.dialect.quote(&a.field));
                    s.push_str(" = ");
                    s.push_str(&self.expr(&a.value, &aliases)?);
                }
                s
            }
            MutationKind::Delete => format!("DELETE FROM {table}"),
        };
        if let Some(filter) = &plan.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.expr(filter, &aliases)?);
        }
        Ok(sql)
    }

    fn expr(&mut self, expr: &Expr, aliases: &HashMap<PathKey, String>) -> Result<String> {
        Ok(match expr.kind() {
            ExprKind::Literal(v) => self.bind(v.clone()),
            ExprKind::Field(f) => {
                let alias = aliases.get(&f.key).ok_or_else(|| {
                    Error::invalid_plan(format!(
                        "field `{}` references a traversal the plan does not join",
                        f.label()
                    ))
                })?;
                if alias.is_empty() {
                    self.dialect.quote(&f.field)
                } else {
                    format!(
                        "{}.{}",
                        self.dialect.quote(alias),
                        self.dialect.quote(&f.field)
                    )
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.expr(lhs, aliases)?;
                let r = self.expr(rhs, aliases)?;
                match op {
                    BinaryOp::Concat if self.dialect == Dialect::Mysql => {
                        format!("CONCAT({l}, {r})")
                    }
                    _ => format!("({l} {} {r})", sql_op(*op)),
                }
            }
            ExprKind::Not(inner) => format!("(NOT {})", self.expr(inner, aliases)?),
            ExprKind::IsNull { expr, negated } => {
                let e = self.expr(expr, aliases)?;
                if *negated {
                    format!("{e} IS NOT NULL")
                } else {
                    format!("{e} IS NULL")
                }
            }
            ExprKind::InList { expr, list } => {
                if list.is_empty() {
                    // empty membership is vacuously false
                    "1 = 0".to_string()
                } else {
                    let e = self.expr(expr, aliases)?;
                    let holes: Vec<String> =
                        list.iter().map(|v| self.bind(v.clone())).collect();
                    format!("{e} IN ({})", holes.join(", "))
                }
            }
            ExprKind::Between { expr, lo, hi } => {
                let e = self.expr(expr, aliases)?;
                let lo = self.bind(lo.clone());
                let hi = self.bind(hi.clone());
                format!("{e} BETWEEN {lo} AND {hi}")
            }
            ExprKind::Like { expr, pattern } => {
                let e = self.expr(expr, aliases)?;
                let p = self.bind(Value::Text(pattern.clone()));
                format!("{e} LIKE {p}")
            }
            ExprKind::Aggregate { func, arg } => {
                let inner = match arg {
                    None => "*".to_string(),
                    Some(a) => self.expr(a, aliases)?,
                };
                format!("{}({inner})", sql_aggregate(*func))
            }
            ExprKind::Case {
                branches,
                otherwise,
            } => {
                let mut s = String::from("CASE");
                for (cond, value) in branches {
                    s.push_str(" WHEN ");
                    s.push_str(&self.expr(cond, aliases)?);
                    s.push_str(" THEN ");
                    s.push_str(&self.expr(value, aliases)?);
                }
                s.push_str(" ELSE ");
                s.push_str(&self.expr(otherwise, aliases)?);
                s.push_str(" END");
                s
            }
            ExprKind::Cast { expr, to } => {
                let e = self.expr(expr, aliases)?;
                format!("CAST({e} AS {})", self.dialect.cast_type(*to))
            }
            ExprKind::Subquery(plan) => {
                format!("({})", self.select(plan)?)
            }
        })
    }
}

fn select_aliases(plan: &SelectPlan) -> HashMap<PathKey, String> {
    let mut map = HashMap::new();
    map.insert(PathKey::root(plan.root.alias.clone()), plan.root.alias.clone());
    for join in &plan.joins {
        map.insert(join.key.clone(), join.alias.clone());
    }
    map
}

fn sql_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "=",
        BinaryOp::Ne => "<>",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "AND",
        BinaryOp::Or => "OR",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Concat => "||",
    }
}

fn sql_aggregate(func: AggregateFn) -> &'static str {
    match func {
        AggregateFn::Count => "COUNT",
        AggregateFn::Sum => "SUM",
        AggregateFn::Avg => "AVG",
        AggregateFn::Max => "MAX",
        AggregateFn::Min => "MIN",
    }
}
