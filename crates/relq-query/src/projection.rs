//! Row-to-shape projection strategies.
//!
//! A [`Projection`] turns executor result rows into caller-defined shapes
//! without the shape being a registered entity. Four strategies:
//!
//! - **constructor** — positional, via [`FromColumns`]; arity is validated
//!   against the plan before execution.
//! - **fields** — by column label, via [`FieldTarget`]; unmatched labels are
//!   ignored.
//! - **setters** — by column label, via [`SetterTarget`]; setters may reject
//!   values.
//! - **tuple** — no target type at all, rows surface as [`TupleRow`].

use std::marker::PhantomData;
use std::sync::Arc;

use relq_core::{Error, Result, Row, Value};

use crate::plan::SelectPlan;

/// Positional construction from a result row.
pub trait FromColumns: Sized {
    /// Number of columns the constructor consumes.
    fn arity() -> usize;

    /// Build from positional values. `values.len()` equals [`Self::arity`]
    /// when the projection was validated against its plan.
    fn from_columns(values: &[Value]) -> Result<Self>;
}

/// Label-addressed assignment into a default-constructed target.
pub trait FieldTarget: Default {
    /// Assign one column by label. Returns whether the label matched.
    fn assign(&mut self, column: &str, value: Value) -> bool;
}

/// Label-addressed assignment that may validate or convert.
pub trait SetterTarget: Default {
    /// Apply one column through a setter. Returns whether the label matched;
    /// a setter may reject a value it cannot accept.
    fn set(&mut self, column: &str, value: Value) -> Result<bool>;
}

/// An untyped positional row, for callers that want raw access.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleRow {
    labels: Vec<String>,
    values: Vec<Value>,
}

impl TupleRow {
    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Positional access.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Label-addressed access.
    pub fn named(&self, label: &str) -> Result<&Value> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| &self.values[i])
            .ok_or_else(|| Error::UnknownColumn {
                name: label.to_string(),
            })
    }

    /// Column labels, in select-list order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Conversion of a single value into a constructor argument.
pub trait FromValue: Sized {
    /// Convert, failing with `TypeMismatch` on an incompatible value.
    fn from_value(value: &Value) -> Result<Self>;
}

macro_rules! from_value_via {
    ($t:ty, $expected:literal, $accessor:ident) => {
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self> {
                value
                    .$accessor()
                    .ok_or_else(|| Error::type_mismatch("projection", $expected, describe(value)))
            }
        }
    };
}

fn describe(value: &Value) -> &'static str {
    match value.semantic_type() {
        Some(t) => t.name(),
        None => "null",
    }
}

from_value_via!(i64, "bigint", as_i64);
from_value_via!(f64, "double", as_f64);
from_value_via!(bool, "bool", as_bool);

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|_| Error::type_mismatch("projection", "int", "bigint"))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::type_mismatch("projection", "text", describe(value)))
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

macro_rules! from_columns_for_tuple {
    ($n:literal => $($t:ident : $i:tt),+) => {
        impl<$($t: FromValue),+> FromColumns for ($($t,)+) {
            fn arity() -> usize {
                $n
            }

            fn from_columns(values: &[Value]) -> Result<Self> {
                Ok(($($t::from_value(&values[$i])?,)+))
            }
        }
    };
}

from_columns_for_tuple!(1 => A:0);
from_columns_for_tuple!(2 => A:0, B:1);
from_columns_for_tuple!(3 => A:0, B:1, C:2);
from_columns_for_tuple!(4 => A:0, B:1, C:2, D:3);
from_columns_for_tuple!(5 => A:0, B:1, C:2, D:3, E:4);

type Mapper<T> = Arc<dyn Fn(&Row) -> Result<T> + Send + Sync>;

/// A row-mapping strategy producing values of `T`.
#[derive(Clone)]
pub struct Projection<T> {
    mapper: Mapper<T>,
    arity: Option<usize>,
    target: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Projection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("target", &self.target)
            .field("arity", &self.arity)
            .finish()
    }
}

impl<T: FromColumns + 'static> Projection<T> {
    /// Positional constructor projection.
    pub fn constructor() -> Self {
        Self {
            mapper: Arc::new(|row: &Row| {
                if row.len() != T::arity() {
                    return Err(Error::ProjectionArityMismatch {
                        target: std::any::type_name::<T>().to_string(),
                        expected: T::arity(),
                        found: row.len(),
                    });
                }
                T::from_columns(row.values())
            }),
            arity: Some(T::arity()),
            target: std::any::type_name::<T>(),
            _marker: PhantomData,
        }
    }
}

impl<T: FieldTarget + 'static> Projection<T> {
    /// Label-addressed field projection. Unmatched labels are ignored.
    pub fn fields() -> Self {
        Self {
            mapper: Arc::new(|row: &Row| {
                let mut target = T::default();
                for (column, value) in row.columns().iter().zip(row.values()) {
                    target.assign(column, value.clone());
                }
                Ok(target)
            }),
            arity: None,
            target: std::any::type_name::<T>(),
            _marker: PhantomData,
        }
    }
}

impl<T: SetterTarget + 'static> Projection<T> {
    /// Label-addressed setter projection; setters may reject values.
    pub fn setters() -> Self {
        Self {
            mapper: Arc::new(|row: &Row| {
                let mut target = T::default();
                for (column, value) in row.columns().iter().zip(row.values()) {
                    target.set(column, value.clone())?;
                }
                Ok(target)
            }),
            arity: None,
            target: std::any::type_name::<T>(),
            _marker: PhantomData,
        }
    }
}

impl Projection<TupleRow> {
    /// Raw positional projection.
    pub fn tuple() -> Self {
        Self {
            mapper: Arc::new(|row: &Row| {
                Ok(TupleRow {
                    labels: row.columns().to_vec(),
                    values: row.values().to_vec(),
                })
            }),
            arity: None,
            target: "TupleRow",
            _marker: PhantomData,
        }
    }
}

impl<T> Projection<T> {
    /// Check this projection against the plan it will consume. Constructor
    /// projections require the select-list arity to match; label-addressed
    /// projections accept any shape.
    pub fn validate(&self, plan: &SelectPlan) -> Result<()> {
        if let Some(expected) = self.arity {
            if plan.select.len() != expected {
                return Err(Error::ProjectionArityMismatch {
                    target: self.target.to_string(),
                    expected,
                    found: plan.select.len(),
                });
            }
        }
        Ok(())
    }

    /// Map one result row.
    pub fn project(&self, row: &Row) -> Result<T> {
        (self.mapper)(row)
    }

    /// The target shape's name, for diagnostics.
    pub fn target(&self) -> &'static str {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct MemberDto {
        username: Option<String>,
        age: i32,
    }

    impl FromColumns for MemberDto {
        fn arity() -> usize {
            2
        }

        fn from_columns(values: &[Value]) -> Result<Self> {
            Ok(Self {
                username: Option::<String>::from_value(&values[0])?,
                age: i32::from_value(&values[1])?,
            })
        }
    }

    impl FieldTarget for MemberDto {
        fn assign(&mut self, column: &str, value: Value) -> bool {
            match column {
                "username" => {
                    self.username = value.as_str().map(str::to_string);
                    true
                }
                "age" => {
                    if let Some(a) = value.as_i64() {
                        self.age = a as i32;
                    }
                    true
                }
                _ => false,
            }
        }
    }

    impl SetterTarget for MemberDto {
        fn set(&mut self, column: &str, value: Value) -> Result<bool> {
            match column {
                "age" => {
                    let age = i32::from_value(&value)?;
                    if age < 0 {
                        return Err(Error::type_mismatch("set_age", "non-negative", "negative"));
                    }
                    self.age = age;
                    Ok(true)
                }
                "username" => {
                    self.username = value.as_str().map(str::to_string);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    fn member_row() -> Row {
        Row::new(
            vec!["username".to_string(), "age".to_string()],
            vec![Value::Text("member1".to_string()), Value::Int(15)],
        )
    }

    #[test]
    fn constructor_fields_and_setters_agree() {
        let row = member_row();
        let a = Projection::<MemberDto>::constructor().project(&row).unwrap();
        let b = Projection::<MemberDto>::fields().project(&row).unwrap();
        let c = Projection::<MemberDto>::setters().project(&row).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.age, 15);
    }

    #[test]
    fn constructor_arity_is_enforced_per_row() {
        let row = Row::new(vec!["age".to_string()], vec![Value::Int(15)]);
        let err = Projection::<MemberDto>::constructor()
            .project(&row)
            .unwrap_err();
        assert!(matches!(err, Error::ProjectionArityMismatch { .. }));
    }

    #[test]
    fn null_columns_project_to_none() {
        let row = Row::new(
            vec!["username".to_string(), "age".to_string()],
            vec![Value::Null, Value::Int(100)],
        );
        let dto = Projection::<MemberDto>::constructor().project(&row).unwrap();
        assert_eq!(dto.username, None);
    }

    #[test]
    fn fields_ignore_unmatched_labels() {
        let row = Row::new(
            vec!["nickname".to_string(), "age".to_string()],
            vec![Value::Text("x".to_string()), Value::Int(7)],
        );
        let dto = Projection::<MemberDto>::fields().project(&row).unwrap();
        assert_eq!(dto.username, None);
        assert_eq!(dto.age, 7);
    }

    #[test]
    fn setters_may_reject() {
        let row = Row::new(vec!["age".to_string()], vec![Value::Int(-1)]);
        assert!(Projection::<MemberDto>::setters().project(&row).is_err());
    }

    #[test]
    fn tuple_rows_expose_labels_and_positions() {
        let tup = Projection::tuple().project(&member_row()).unwrap();
        assert_eq!(tup.len(), 2);
        assert_eq!(tup.named("age").unwrap(), &Value::Int(15));
        assert_eq!(tup.value(0), Some(&Value::Text("member1".to_string())));
    }

    #[test]
    fn tuples_from_value_conversions() {
        let row = member_row();
        let (name, age): (Option<String>, i64) =
            Projection::<(Option<String>, i64)>::constructor()
                .project(&row)
                .unwrap();
        assert_eq!(name.as_deref(), Some("member1"));
        assert_eq!(age, 15);
    }
}
