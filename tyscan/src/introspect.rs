//! The Type Introspector (§4.1): classifies an expected type into the
//! parser's dispatch categories and enumerates record fields, transparently
//! dereferencing `Reference` and unwrapping `Intersection` when its
//! effective type is readonly.

use charsrc::Position;

use crate::error::{Error, Result};
use crate::types::{ArrayShape, ExpectedType, FieldSpec, RecordType, ScalarKind};

/// The ten dispatch categories a state machine transition consults.
/// Borrowed from whatever `ExpectedType` it was classified from, so no
/// allocation happens on every structural token.
#[derive(Debug, Clone, Copy)]
pub enum Category<'a> {
    Record(&'a RecordType),
    Map { value: &'a ExpectedType },
    Array {
        element: &'a ExpectedType,
        shape: ArrayShape,
        readonly: bool,
    },
    Tuple {
        elements: &'a [ExpectedType],
        readonly: bool,
    },
    Scalar(ScalarKind),
    Union { members: &'a [ExpectedType] },
    JsonLike,
}

/// Classifies `ty`, transparently resolving `Reference` and `Intersection`.
/// An `Intersection` whose effective type is not readonly is rejected with
/// `UnsupportedType`, per §4.1.
pub fn classify(ty: &ExpectedType, position: Position) -> Result<Category<'_>> {
    match ty {
        ExpectedType::Reference(inner) => classify(inner, position),
        ExpectedType::Intersection { effective, .. } => {
            if effective.is_readonly() {
                classify(effective, position)
            } else {
                Err(Error::UnsupportedType {
                    reason: "intersection's effective type must be readonly".to_string(),
                    position,
                })
            }
        }
        ExpectedType::Record(r) => Ok(Category::Record(r)),
        ExpectedType::Map { value } => Ok(Category::Map { value }),
        ExpectedType::Array {
            element,
            shape,
            readonly,
        } => Ok(Category::Array {
            element,
            shape: *shape,
            readonly: *readonly,
        }),
        ExpectedType::Tuple { elements, readonly } => Ok(Category::Tuple {
            elements,
            readonly: *readonly,
        }),
        ExpectedType::Scalar(kind) => Ok(Category::Scalar(*kind)),
        ExpectedType::Union { members } => Ok(Category::Union { members }),
        ExpectedType::JsonLike => Ok(Category::JsonLike),
    }
}

/// Declared fields in insertion order, keyed by wire name (tolerates
/// renamed fields: `FieldSpec::declared_name` may differ from the key this
/// map is indexed by).
#[must_use]
pub fn fields_of(record: &RecordType) -> &[FieldSpec] {
    &record.fields
}

#[must_use]
pub fn rest_of(record: &RecordType) -> Option<&ExpectedType> {
    record.rest.as_deref()
}

#[must_use]
pub fn element_of(element: &ExpectedType) -> &ExpectedType {
    element
}

#[must_use]
pub fn nth(elements: &[ExpectedType], index: usize) -> Option<&ExpectedType> {
    elements.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntWidth;

    #[test]
    fn dereferences_reference() {
        let pos = Position::start();
        let inner = ExpectedType::scalar(ScalarKind::Bool);
        let ty = ExpectedType::Reference(Box::new(inner));
        assert!(matches!(classify(&ty, pos).unwrap(), Category::Scalar(ScalarKind::Bool)));
    }

    #[test]
    fn rejects_non_readonly_intersection() {
        let pos = Position::start();
        let ty = ExpectedType::Intersection {
            members: vec![ExpectedType::scalar(ScalarKind::Int(IntWidth::I32))],
            effective: Box::new(ExpectedType::scalar(ScalarKind::Int(IntWidth::I32))),
        };
        assert!(classify(&ty, pos).is_err());
    }

    #[test]
    fn accepts_readonly_intersection() {
        let pos = Position::start();
        let effective = ExpectedType::Array {
            element: Box::new(ExpectedType::scalar(ScalarKind::Int(IntWidth::I32))),
            shape: ArrayShape::Open,
            readonly: true,
        };
        let ty = ExpectedType::Intersection {
            members: vec![effective.clone()],
            effective: Box::new(effective),
        };
        assert!(matches!(classify(&ty, pos).unwrap(), Category::Array { readonly: true, .. }));
    }
}
