#![doc = include_str!("../README.md")]

pub mod error;
pub mod fallback;
pub mod frame;
pub mod introspect;
pub mod parser;
pub mod policy;
pub mod state;
pub mod types;
pub mod validate;
pub mod value;

pub use charsrc::{CharSource, Reader};

pub use error::{Error, Result};
pub use fallback::{TreeWalkUnionFallback, UnionFallback};
pub use parser::Parser;
pub use policy::{DataProjection, ParserOptions, ProjectionPolicy};
pub use types::{ArrayShape, ExpectedType, FieldSpec, IntWidth, RecordType, ScalarKind};
pub use validate::{ConstraintValidator, NoopConstraintValidator};
pub use value::{Value, ValueArray, ValueMap};

/// Parses one document from `source` into a value conforming to `expected`,
/// using the tree-walking default for any union subtree encountered.
///
/// A fresh [`Parser`] is allocated per call; callers driving many parses in
/// a hot loop should build their own `Parser` and call
/// [`Parser::parse`] directly so the context stack and lexeme buffer are
/// reused (§5).
///
/// # Errors
/// See [`Error`] for the full taxonomy.
pub fn parse(source: &mut dyn CharSource, options: &ParserOptions, expected: &ExpectedType) -> Result<Value> {
    Parser::new().parse(source, options, expected, &TreeWalkUnionFallback)
}

/// As [`parse`], but with a caller-supplied union-fallback collaborator.
///
/// # Errors
/// See [`Error`] for the full taxonomy.
pub fn parse_with_fallback(
    source: &mut dyn CharSource,
    options: &ParserOptions,
    expected: &ExpectedType,
    fallback: &dyn UnionFallback,
) -> Result<Value> {
    Parser::new().parse(source, options, expected, fallback)
}

/// As [`parse`], additionally running `validator` over the result when
/// `options.enable_constraint_validation` is set (§6). Constraint
/// validation itself is a collaborator interface this crate does not
/// implement a real checker for; [`NoopConstraintValidator`] is the
/// pass-through default.
///
/// # Errors
/// See [`Error`] for the full taxonomy, plus whatever `validator` raises.
pub fn parse_with_validation(
    source: &mut dyn CharSource,
    options: &ParserOptions,
    expected: &ExpectedType,
    fallback: &dyn UnionFallback,
    validator: &dyn ConstraintValidator,
) -> Result<Value> {
    let value = Parser::new().parse(source, options, expected, fallback)?;
    validator.validate(value, expected, options.enable_constraint_validation)
}
