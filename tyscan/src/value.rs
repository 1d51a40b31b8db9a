//! The Value Constructor's output representation (§3 ambient stack) and the
//! container-level operations it exposes (§4.2): allocating map/array
//! containers, coercing scalar lexemes, and splicing finished children into
//! their parent.

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::{ArrayShape, ExpectedType, IntWidth, ScalarKind};
use charsrc::Position;

/// The typed value a parse produces. Owned and `Clone`-able so union
/// fallback can hand a generic subtree to a collaborator without the
/// parser losing access to it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Decimal(Decimal),
    String(String),
    /// A string of exactly one character, produced for `ScalarKind::CharString`.
    CharString(char),
    Map(ValueMap),
    Array(ValueArray),
}

/// An ordered map container. Field insertion order mirrors document order
/// (§5 Ordering); `readonly` is a flag flip rather than a deep freeze into a
/// separate wrapper type (see SPEC_FULL §3 ambient stack).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap {
    pub entries: IndexMap<String, Value>,
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueArray {
    pub items: Vec<Value>,
    pub readonly: bool,
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Allocates the container a `{`/`[` token should build, per the expected
/// type's category. Shared by root allocation and child descent.
pub fn new_map(readonly: bool) -> ValueMap {
    ValueMap {
        entries: IndexMap::new(),
        readonly,
    }
}

pub fn new_array(readonly: bool) -> ValueArray {
    ValueArray {
        items: Vec::new(),
        readonly,
    }
}

/// Places `child` into `parent` under `declared_name`, unconditionally
/// overwriting any existing entry (last write wins). For a declared record
/// field, the caller (`Parser::place_value`) is responsible for the wire
/// format's "first-definition wins" exception and skips this call when the
/// field has already been written once.
pub fn assign_field(parent: &mut ValueMap, declared_name: &str, child: Value) {
    parent.entries.insert(declared_name.to_string(), child);
}

/// Appends `child` at `index` into an open array/tuple frame, or silently
/// drops it when `index` has run past a closed shape's declared size
/// (projection-trim; the caller is responsible for raising `ArrayTooLong`
/// first when projection disallows it).
pub fn append_element(parent: &mut ValueArray, index: usize, shape: ArrayShape, child: Value) {
    if let ArrayShape::Closed(size) = shape {
        if index >= size {
            return;
        }
    }
    debug_assert_eq!(parent.items.len(), index, "appendElement out of lockstep with index");
    parent.items.push(child);
}

/// Flips the `readonly` flag on a just-finalized container. A scalar/union
/// result has no container to freeze and is a no-op.
pub fn freeze_readonly(value: &mut Value) {
    match value {
        Value::Map(m) => m.readonly = true,
        Value::Array(a) => a.readonly = true,
        _ => {}
    }
}

/// Coerces a completed lexeme into the scalar subtype `expected` demands.
///
/// `was_quoted` distinguishes a JSON string lexeme (already escape-decoded
/// by the time it reaches here) from a bare lexeme (`true`, `false`,
/// `null`, or a number). Per §4.2, `null` is only ever produced from an
/// *unquoted* `null` lexeme: a quoted `"null"` is the four-character string.
pub fn coerce_scalar(
    lexeme: &str,
    expected: &ExpectedType,
    was_quoted: bool,
    position: Position,
) -> Result<Value> {
    match expected {
        ExpectedType::JsonLike => coerce_json_like(lexeme, was_quoted, position),
        ExpectedType::Scalar(kind) => coerce_to_kind(lexeme, *kind, was_quoted, expected, position),
        _ => Err(Error::ConversionFailure {
            lexeme: lexeme.to_string(),
            expected: expected.clone(),
            position,
        }),
    }
}

fn coerce_json_like(lexeme: &str, was_quoted: bool, position: Position) -> Result<Value> {
    if was_quoted {
        return Ok(Value::String(lexeme.to_string()));
    }
    if lexeme == "null" {
        return Ok(Value::Null);
    }
    if lexeme == "true" {
        return Ok(Value::Bool(true));
    }
    if lexeme == "false" {
        return Ok(Value::Bool(false));
    }
    if let Ok(i) = lexeme.parse::<i128>() {
        return Ok(Value::Int(i));
    }
    if let Ok(f) = lexeme.parse::<f64>() {
        return Ok(Value::Float(f));
    }
    Err(Error::ConversionFailure {
        lexeme: lexeme.to_string(),
        expected: ExpectedType::JsonLike,
        position,
    })
}

fn coerce_to_kind(
    lexeme: &str,
    kind: ScalarKind,
    was_quoted: bool,
    expected_for_error: &ExpectedType,
    position: Position,
) -> Result<Value> {
    let fail = || Error::ConversionFailure {
        lexeme: lexeme.to_string(),
        expected: expected_for_error.clone(),
        position,
    };
    match kind {
        ScalarKind::Null => {
            if !was_quoted && lexeme == "null" {
                Ok(Value::Null)
            } else {
                Err(fail())
            }
        }
        ScalarKind::Bool => {
            if was_quoted {
                return Err(fail());
            }
            match lexeme {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            }
        }
        ScalarKind::Int(width) => {
            if was_quoted {
                return Err(fail());
            }
            let n: i128 = lexeme.parse().map_err(|_| fail())?;
            let (min, max) = width.bounds();
            if n < min || n > max {
                return Err(fail());
            }
            Ok(Value::Int(n))
        }
        ScalarKind::Float => {
            if was_quoted {
                return Err(fail());
            }
            let f: f64 = lexeme.parse().map_err(|_| fail())?;
            Ok(Value::Float(f))
        }
        ScalarKind::Decimal => {
            if was_quoted {
                return Err(fail());
            }
            let d: Decimal = lexeme.parse().map_err(|_| fail())?;
            Ok(Value::Decimal(d))
        }
        ScalarKind::String => {
            if !was_quoted {
                return Err(fail());
            }
            Ok(Value::String(lexeme.to_string()))
        }
        ScalarKind::CharString => {
            if !was_quoted {
                return Err(fail());
            }
            let mut chars = lexeme.chars();
            let Some(c) = chars.next() else {
                return Err(fail());
            };
            if chars.next().is_some() {
                return Err(fail());
            }
            Ok(Value::CharString(c))
        }
    }
}

/// `null` is valid for a nilable scalar's own kind; this mirrors §4.2's
/// "null ... is valid when expected is Null, a nilable scalar, or JsonLike"
/// clause for use at field-absence/explicit-null policy points.
#[must_use]
pub fn accepts_explicit_null(expected: &ExpectedType, nilable: bool) -> bool {
    if nilable {
        return true;
    }
    matches!(expected, ExpectedType::Scalar(ScalarKind::Null) | ExpectedType::JsonLike)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntWidth;

    #[test]
    fn coerces_bool_and_null() {
        let pos = Position::start();
        assert_eq!(
            coerce_scalar("true", &ExpectedType::scalar(ScalarKind::Bool), false, pos).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            coerce_scalar("null", &ExpectedType::scalar(ScalarKind::Null), false, pos).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn rejects_quoted_null_as_null_scalar() {
        let pos = Position::start();
        assert!(coerce_scalar("null", &ExpectedType::scalar(ScalarKind::Null), true, pos).is_err());
    }

    #[test]
    fn int_bounds_checked() {
        let pos = Position::start();
        let et = ExpectedType::scalar(ScalarKind::Int(IntWidth::I8));
        assert!(coerce_scalar("127", &et, false, pos).is_ok());
        assert!(coerce_scalar("128", &et, false, pos).is_err());
    }

    #[test]
    fn char_string_enforces_length_one() {
        let pos = Position::start();
        let et = ExpectedType::scalar(ScalarKind::CharString);
        assert_eq!(coerce_scalar("a", &et, true, pos).unwrap(), Value::CharString('a'));
        assert!(coerce_scalar("ab", &et, true, pos).is_err());
        assert!(coerce_scalar("", &et, true, pos).is_err());
    }

    #[test]
    fn json_like_infers_numeric_kind() {
        let pos = Position::start();
        assert_eq!(
            coerce_scalar("42", &ExpectedType::JsonLike, false, pos).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            coerce_scalar("4.2", &ExpectedType::JsonLike, false, pos).unwrap(),
            Value::Float(4.2)
        );
        assert_eq!(
            coerce_scalar("42", &ExpectedType::JsonLike, true, pos).unwrap(),
            Value::String("42".to_string())
        );
    }
}
