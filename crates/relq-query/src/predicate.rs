//! Optional-predicate composition.
//!
//! Search-form handlers produce `Option<Predicate>` per criterion (`None`
//! when the form field was left blank). [`all`] and [`any`] fold such
//! collections, skipping the absent entries, so dynamic filters compose
//! without null checks at every call site.

use crate::expr::Predicate;

/// Conjunction over optional predicates. Absent entries are skipped; if every
/// entry is absent the result is `None` (an unrestricted query), never a
/// contradiction.
pub fn all(parts: impl IntoIterator<Item = Option<Predicate>>) -> Option<Predicate> {
    parts
        .into_iter()
        .flatten()
        .reduce(|acc, p| acc.and(p))
}

/// Disjunction over optional predicates. Absent entries are skipped; if every
/// entry is absent the result is `None`.
pub fn any(parts: impl IntoIterator<Item = Option<Predicate>>) -> Option<Predicate> {
    parts
        .into_iter()
        .flatten()
        .reduce(|acc, p| acc.or(p))
}
