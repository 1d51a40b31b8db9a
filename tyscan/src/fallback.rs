//! The union-fallback collaborator (§6): coerces a generic `JsonLike`
//! subtree, already fully parsed, into one declared member of a `Union`
//! expected type. Out of scope for the state machine itself per §1, but
//! `tyscan` ships a working default so the crate is usable standalone.
//!
//! Grounded on the teacher's `idtransform.rs`: a recursive walker over an
//! already-decoded tree, generalized from "copy structurally" to "coerce
//! structurally against a declared shape".

use charsrc::Position;

use crate::error::{Error, Result};
use crate::introspect::{self, Category};
use crate::policy::ProjectionPolicy;
use crate::types::{ArrayShape, ExpectedType, ScalarKind};
use crate::value::{self, Value, ValueArray, ValueMap};

/// Coerces an already-parsed generic value into one of `union`'s members.
/// Consumed at every union subtree's boundary; the parser passes its
/// current projection flags through (§6).
pub trait UnionFallback {
    /// # Errors
    /// `ConversionFailure` when no member structurally accepts `value`.
    fn traverse(
        &self,
        value: Value,
        policy: ProjectionPolicy,
        members: &[ExpectedType],
    ) -> Result<Value>;
}

/// The default, tree-walking fallback: tries each member in declaration
/// order and returns the first structural match.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalkUnionFallback;

impl UnionFallback for TreeWalkUnionFallback {
    fn traverse(
        &self,
        value: Value,
        policy: ProjectionPolicy,
        members: &[ExpectedType],
    ) -> Result<Value> {
        for member in members {
            if let Ok(coerced) = try_coerce(&value, member, policy) {
                return Ok(coerced);
            }
        }
        Err(Error::ConversionFailure {
            lexeme: describe(&value),
            expected: ExpectedType::Union {
                members: members.to_vec(),
            },
            position: Position::start(),
        })
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::CharString(c) => format!("{c:?}"),
        Value::Map(_) => "<object>".to_string(),
        Value::Array(_) => "<array>".to_string(),
    }
}

fn try_coerce(value: &Value, ty: &ExpectedType, policy: ProjectionPolicy) -> Result<Value> {
    let pos = Position::start();
    match introspect::classify(ty, pos)? {
        Category::JsonLike => Ok(value.clone()),
        Category::Union { members } => {
            for member in members {
                if let Ok(v) = try_coerce(value, member, policy) {
                    return Ok(v);
                }
            }
            Err(Error::ConversionFailure {
                lexeme: describe(value),
                expected: ty.clone(),
                position: pos,
            })
        }
        Category::Scalar(kind) => coerce_scalar_value(value, kind, ty, pos),
        Category::Record(record) => {
            let Value::Map(map) = value else {
                return Err(mismatch(value, ty, pos));
            };
            let mut out = value::new_map(record.readonly);
            let mut remaining: Vec<_> = record.fields.iter().collect();
            for (wire_name, child) in &map.entries {
                if let Some(pos_idx) = remaining.iter().position(|f| &f.wire_name == wire_name) {
                    let field = remaining.remove(pos_idx);
                    let coerced = if child.is_null() && value::accepts_explicit_null(&field.ty, field.nilable) {
                        Value::Null
                    } else {
                        try_coerce(child, &field.ty, policy)?
                    };
                    value::assign_field(&mut out, &field.declared_name, coerced);
                } else if let Some(rest) = &record.rest {
                    let coerced = try_coerce(child, rest, policy)?;
                    value::assign_field(&mut out, wire_name, coerced);
                } else if !policy.allow_undeclared {
                    return Err(Error::UndefinedField {
                        wire_name: wire_name.clone(),
                        expected: ty.clone(),
                        position: pos,
                    });
                }
            }
            for field in remaining {
                if field.required && !(policy.absent_as_nilable && field.nilable) {
                    return Err(Error::RequiredFieldMissing {
                        field_name: field.declared_name.clone(),
                        position: pos,
                    });
                }
                if field.nilable {
                    value::assign_field(&mut out, &field.declared_name, Value::Null);
                }
            }
            Ok(Value::Map(out))
        }
        Category::Map { value: value_ty } => {
            let Value::Map(map) = value else {
                return Err(mismatch(value, ty, pos));
            };
            let mut out = value::new_map(false);
            for (k, v) in &map.entries {
                out.entries.insert(k.clone(), try_coerce(v, value_ty, policy)?);
            }
            Ok(Value::Map(out))
        }
        Category::Array {
            element,
            shape,
            readonly,
        } => {
            let Value::Array(arr) = value else {
                return Err(mismatch(value, ty, pos));
            };
            if let ArrayShape::Closed(size) = shape {
                if arr.items.len() > size && !policy.allow_undeclared {
                    return Err(Error::ArrayTooLong {
                        declared_size: size,
                        position: pos,
                    });
                }
            }
            coerce_array(&arr, |_i| element, shape, readonly, policy)
        }
        Category::Tuple { elements, readonly } => {
            let Value::Array(arr) = value else {
                return Err(mismatch(value, ty, pos));
            };
            let size = elements.len();
            if arr.items.len() > size && !policy.allow_undeclared {
                return Err(Error::ArrayTooLong {
                    declared_size: size,
                    position: pos,
                });
            }
            coerce_array(
                &arr,
                |i| elements.get(i).unwrap_or(&ExpectedType::JsonLike),
                ArrayShape::Closed(size),
                readonly,
                policy,
            )
        }
    }
}

fn coerce_array<'a>(
    arr: &ValueArray,
    element_ty: impl Fn(usize) -> &'a ExpectedType,
    shape: ArrayShape,
    readonly: bool,
    policy: ProjectionPolicy,
) -> Result<Value> {
    let mut out = value::new_array(readonly);
    for (i, item) in arr.items.iter().enumerate() {
        if let ArrayShape::Closed(size) = shape {
            if i >= size {
                break;
            }
        }
        out.items.push(try_coerce(item, element_ty(i), policy)?);
    }
    Ok(Value::Array(out))
}

fn mismatch(value: &Value, ty: &ExpectedType, position: Position) -> Error {
    Error::ConversionFailure {
        lexeme: describe(value),
        expected: ty.clone(),
        position,
    }
}

fn coerce_scalar_value(
    value: &Value,
    kind: ScalarKind,
    ty: &ExpectedType,
    position: Position,
) -> Result<Value> {
    match (value, kind) {
        (Value::Null, ScalarKind::Null) => Ok(Value::Null),
        (Value::Bool(b), ScalarKind::Bool) => Ok(Value::Bool(*b)),
        (Value::Int(i), ScalarKind::Int(width)) => {
            let (min, max) = width.bounds();
            if *i < min || *i > max {
                Err(mismatch(value, ty, position))
            } else {
                Ok(Value::Int(*i))
            }
        }
        (Value::Int(i), ScalarKind::Float) => Ok(Value::Float(*i as f64)),
        (Value::Float(f), ScalarKind::Float) => Ok(Value::Float(*f)),
        (Value::Int(i), ScalarKind::Decimal) => Ok(Value::Decimal((*i).into())),
        (Value::Float(f), ScalarKind::Decimal) => rust_decimal::Decimal::try_from(*f)
            .map(Value::Decimal)
            .map_err(|_| mismatch(value, ty, position)),
        (Value::String(s), ScalarKind::String) => Ok(Value::String(s.clone())),
        (Value::String(s), ScalarKind::CharString) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::CharString(c)),
                _ => Err(mismatch(value, ty, position)),
            }
        }
        (Value::CharString(c), ScalarKind::CharString) => Ok(Value::CharString(*c)),
        (Value::CharString(c), ScalarKind::String) => Ok(Value::String(c.to_string())),
        _ => Err(mismatch(value, ty, position)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldSpec;

    #[test]
    fn picks_numeric_member_for_decoded_int() {
        let members = vec![
            ExpectedType::scalar(ScalarKind::Int(crate::types::IntWidth::I32)),
            ExpectedType::scalar(ScalarKind::String),
        ];
        let policy = ProjectionPolicy::from_options(crate::policy::DataProjection::Strict);
        let out = TreeWalkUnionFallback.traverse(Value::Int(42), policy, &members).unwrap();
        assert_eq!(out, Value::Int(42));
    }

    #[test]
    fn picks_string_member_for_decoded_string() {
        let members = vec![
            ExpectedType::scalar(ScalarKind::Int(crate::types::IntWidth::I32)),
            ExpectedType::scalar(ScalarKind::String),
        ];
        let policy = ProjectionPolicy::from_options(crate::policy::DataProjection::Strict);
        let out = TreeWalkUnionFallback
            .traverse(Value::String("42".to_string()), policy, &members)
            .unwrap();
        assert_eq!(out, Value::String("42".to_string()));
    }

    #[test]
    fn coerces_record_member_from_generic_map() {
        let field = FieldSpec::new("a", ExpectedType::scalar(ScalarKind::Int(crate::types::IntWidth::I32)), true, false);
        let members = vec![ExpectedType::record(vec![field], None)];
        let policy = ProjectionPolicy::from_options(crate::policy::DataProjection::Strict);
        let mut map = value::new_map(false);
        map.entries.insert("a".to_string(), Value::Int(7));
        let out = TreeWalkUnionFallback.traverse(Value::Map(map), policy, &members).unwrap();
        match out {
            Value::Map(m) => assert_eq!(m.entries.get("a"), Some(&Value::Int(7))),
            _ => panic!("expected map"),
        }
    }
}
