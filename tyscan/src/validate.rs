//! The constraint-validator collaborator (§6): out of scope for the parser
//! proper, but `tyscan` ships an object-safe trait plus a pass-through
//! default so `parse_with_validation` is usable without a real annotation
//! checker wired in.

use crate::error::Result;
use crate::types::ExpectedType;
use crate::value::Value;

/// Validates a successfully parsed value against constraint annotations on
/// `expected`. Invoked only when `ParserOptions::enable_constraint_validation`
/// is set (§6).
pub trait ConstraintValidator {
    /// # Errors
    /// Implementations return an error carrying whatever their constraint
    /// annotations demand; `tyscan` does not define that taxonomy (§1).
    fn validate(&self, value: Value, expected: &ExpectedType, enabled: bool) -> Result<Value>;
}

/// Returns the value unchanged regardless of `enabled`. The default used
/// when no caller-supplied validator is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConstraintValidator;

impl ConstraintValidator for NoopConstraintValidator {
    fn validate(&self, value: Value, _expected: &ExpectedType, _enabled: bool) -> Result<Value> {
        Ok(value)
    }
}
