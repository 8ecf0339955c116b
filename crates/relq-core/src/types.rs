//! Semantic types used for construction-time checking.

use serde::{Deserialize, Serialize};

/// The semantic type of a field or expression.
///
/// Operator construction checks operand types against this vocabulary so a
/// mismatch surfaces as [`crate::Error::TypeMismatch`] before any execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    /// Boolean.
    Bool,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// 64-bit float.
    Double,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
}

impl SemanticType {
    /// Whether this type participates in arithmetic and numeric comparison.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            SemanticType::Int | SemanticType::BigInt | SemanticType::Double
        )
    }

    /// Whether values of `self` and `other` may be compared with each other.
    ///
    /// Numeric types compare across widths; every other type only compares
    /// with itself.
    pub fn comparable_with(self, other: SemanticType) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }

    /// Display name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Int => "int",
            SemanticType::BigInt => "bigint",
            SemanticType::Double => "double",
            SemanticType::Text => "text",
            SemanticType::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
