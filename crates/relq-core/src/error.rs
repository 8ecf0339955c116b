//! Error taxonomy for relq.
//!
//! Construction-time errors (`TypeMismatch`, `UnresolvedPath`,
//! `ProjectionArityMismatch`, `AmbiguousCountPlan`) are always raised before
//! any execution call: a plan that passes its own validation will not fail the
//! executor for a shape reason the builder could have caught. Execution
//! failures pass through opaque and unmodified.

use thiserror::Error;

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by relq.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Operator/operand type incompatibility, detected at construction.
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operator required.
        expected: String,
        /// What the operand provided.
        found: String,
        /// The operation being built.
        context: String,
    },

    /// A traversal referenced a relation or field absent from the schema.
    #[error("unresolved path: schema `{schema}` has no {kind} named `{name}`")]
    UnresolvedPath {
        /// Schema the traversal started from.
        schema: String,
        /// `"relation"` or `"field"`.
        kind: &'static str,
        /// The missing name.
        name: String,
    },

    /// A projection target cannot be satisfied by the select list.
    #[error("projection arity mismatch for `{target}`: expected {expected} columns, select list has {found}")]
    ProjectionArityMismatch {
        /// Target shape name.
        target: String,
        /// Columns the target requires.
        expected: usize,
        /// Columns the select list provides.
        found: usize,
    },

    /// A builder was asked for a structurally invalid plan (aggregate in a
    /// row filter, empty select list, and the like).
    #[error("invalid plan: {reason}")]
    InvalidPlan {
        /// What the builder rejected.
        reason: String,
    },

    /// Paging was requested but no sound count plan can be derived.
    #[error("ambiguous count plan: {reason}; supply an explicit count plan")]
    AmbiguousCountPlan {
        /// Why mechanical derivation refused.
        reason: String,
    },

    /// A single-result fetch matched no rows.
    #[error("expected exactly one row, found none")]
    NoRowFound,

    /// A single-result fetch matched more than one row.
    #[error("expected exactly one row, found {count}")]
    MultipleRowsFound {
        /// How many rows came back.
        count: usize,
    },

    /// A row was asked for a column it does not carry.
    #[error("unknown column `{name}` in result row")]
    UnknownColumn {
        /// The missing column name.
        name: String,
    },

    /// Opaque pass-through from the external statement executor.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl Error {
    /// Build a `TypeMismatch` from display-able parts.
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            context: context.into(),
        }
    }

    /// Build an `InvalidPlan` from a display-able reason.
    pub fn invalid_plan(reason: impl Into<String>) -> Self {
        Error::InvalidPlan {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = Error::type_mismatch("eq", "int", "text");
        assert_eq!(
            err.to_string(),
            "type mismatch in eq: expected int, found text"
        );
    }

    #[test]
    fn single_result_failures_are_distinct() {
        assert_ne!(Error::NoRowFound, Error::MultipleRowsFound { count: 2 });
        assert_ne!(
            Error::NoRowFound,
            Error::Execution("boom".to_string()),
        );
    }
}
