//! Explicit relation state.
//!
//! A to-one relation on a hydrated record is either resolved (a fetch join
//! materialized it) or unresolved (the join, if any, only restricted rows).
//! There is no implicit load-on-access: callers must check
//! [`Rel::is_resolved`] and perform a deliberate extra query if they need an
//! unresolved relation.

use serde::{Deserialize, Serialize};

/// Resolved/unresolved marker for a to-one relation field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Rel<T> {
    /// The relation was not materialized by the producing query.
    #[default]
    Unresolved,
    /// The relation was eagerly materialized by a fetch join.
    Resolved(T),
}

impl<T> Rel<T> {
    /// Whether the related record was materialized.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Rel::Resolved(_))
    }

    /// The related record, if materialized.
    pub fn get(&self) -> Option<&T> {
        match self {
            Rel::Resolved(t) => Some(t),
            Rel::Unresolved => None,
        }
    }

    /// Replace the state with a resolved record.
    pub fn resolve(&mut self, value: T) {
        *self = Rel::Resolved(value);
    }

    /// Consume, returning the record if resolved.
    pub fn into_inner(self) -> Option<T> {
        match self {
            Rel::Resolved(t) => Some(t),
            Rel::Unresolved => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_unresolved() {
        let rel: Rel<String> = Rel::default();
        assert!(!rel.is_resolved());
        assert_eq!(rel.get(), None);
    }

    #[test]
    fn resolve_transitions_state() {
        let mut rel = Rel::Unresolved;
        rel.resolve("teamA".to_string());
        assert!(rel.is_resolved());
        assert_eq!(rel.get().map(String::as_str), Some("teamA"));
    }
}
