//! Typed record hydration.

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;

/// A typed record that can be hydrated from a result row.
///
/// Implementations assign plain columns in [`Record::hydrate`] and, when the
/// producing query carried a fetch join, materialize related records in
/// [`Record::attach`]. Relations that never see an `attach` call stay in their
/// default [`crate::Rel::Unresolved`] state.
pub trait Record: Default {
    /// Assign one top-level column. Returns whether the column matched a
    /// field; unmatched columns are ignored by the caller.
    fn hydrate(&mut self, column: &str, value: Value) -> bool;

    /// Materialize a fetch-joined relation from its scoped sub-row.
    ///
    /// The default ignores all relations, which is correct for records
    /// without relation fields.
    fn attach(&mut self, relation: &str, row: &Row) -> Result<bool> {
        let _ = (relation, row);
        Ok(false)
    }

    /// Build a record from a full result row.
    ///
    /// Plain columns go through [`Record::hydrate`]; dotted columns
    /// (`relation.field`, emitted by fetch joins) are grouped per relation and
    /// handed to [`Record::attach`]. A relation whose scoped columns are all
    /// NULL (a left fetch join that matched nothing) is left unresolved.
    fn from_row(row: &Row) -> Result<Self> {
        let mut record = Self::default();
        let mut seen_prefixes: Vec<&str> = Vec::new();

        for (column, value) in row.columns().iter().zip(row.values()) {
            match column.split_once('.') {
                None => {
                    record.hydrate(column, value.clone());
                }
                Some((prefix, _)) => {
                    if seen_prefixes.contains(&prefix) {
                        continue;
                    }
                    seen_prefixes.push(prefix);
                    let scoped = row.scoped(prefix);
                    if scoped.values().iter().all(Value::is_null) {
                        continue;
                    }
                    record.attach(prefix, &scoped)?;
                }
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rel::Rel;

    #[derive(Debug, Default, PartialEq)]
    struct Team {
        name: String,
    }

    impl Record for Team {
        fn hydrate(&mut self, column: &str, value: Value) -> bool {
            match column {
                "name" => {
                    if let Value::Text(s) = value {
                        self.name = s;
                    }
                    true
                }
                _ => false,
            }
        }
    }

    #[derive(Debug, Default)]
    struct Member {
        username: Option<String>,
        age: i32,
        team: Rel<Team>,
    }

    impl Record for Member {
        fn hydrate(&mut self, column: &str, value: Value) -> bool {
            match column {
                "username" => {
                    self.username = value.as_str().map(str::to_string);
                    true
                }
                "age" => {
                    if let Some(age) = value.as_i64() {
                        self.age = age as i32;
                    }
                    true
                }
                _ => false,
            }
        }

        fn attach(&mut self, relation: &str, row: &Row) -> Result<bool> {
            if relation == "team" {
                self.team.resolve(Team::from_row(row)?);
                return Ok(true);
            }
            Ok(false)
        }
    }

    #[test]
    fn plain_columns_leave_relations_unresolved() {
        let row = Row::new(
            vec!["username".to_string(), "age".to_string()],
            vec![Value::Text("member1".to_string()), Value::Int(15)],
        );
        let m = Member::from_row(&row).unwrap();
        assert_eq!(m.username.as_deref(), Some("member1"));
        assert!(!m.team.is_resolved());
    }

    #[test]
    fn dotted_columns_materialize_relation() {
        let row = Row::new(
            vec![
                "username".to_string(),
                "age".to_string(),
                "team.name".to_string(),
            ],
            vec![
                Value::Text("member1".to_string()),
                Value::Int(15),
                Value::Text("teamA".to_string()),
            ],
        );
        let m = Member::from_row(&row).unwrap();
        assert_eq!(m.team.get(), Some(&Team { name: "teamA".to_string() }));
    }

    #[test]
    fn all_null_join_columns_stay_unresolved() {
        let row = Row::new(
            vec!["age".to_string(), "team.name".to_string()],
            vec![Value::Int(100), Value::Null],
        );
        let m = Member::from_row(&row).unwrap();
        assert!(!m.team.is_resolved());
    }
}
