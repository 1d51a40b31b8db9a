//! The expected-type data model (§3) and the field-name rename handling that
//! `fieldsOf` exposes (§4.3).

/// A tagged expected-type descriptor. This is what the caller hands to
/// [`crate::parse`] and what the state machine consults at every structural
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedType {
    Record(RecordType),
    Map {
        value: Box<ExpectedType>,
    },
    Array {
        element: Box<ExpectedType>,
        shape: ArrayShape,
        readonly: bool,
    },
    Tuple {
        elements: Vec<ExpectedType>,
        readonly: bool,
    },
    Scalar(ScalarKind),
    Union {
        members: Vec<ExpectedType>,
    },
    /// Only ever constructed with `effective.is_readonly()`; enforced by
    /// [`crate::introspect::classify`], not by this constructor.
    Intersection {
        members: Vec<ExpectedType>,
        effective: Box<ExpectedType>,
    },
    /// Accepts anything; descendants of a `JsonLike` subtree are also
    /// `JsonLike` (the parser never looks at a schema again once it has
    /// committed to this category).
    JsonLike,
    Reference(Box<ExpectedType>),
}

impl ExpectedType {
    #[must_use]
    pub fn record(fields: Vec<FieldSpec>, rest: Option<ExpectedType>) -> Self {
        ExpectedType::Record(RecordType {
            fields,
            rest: rest.map(Box::new),
            readonly: false,
        })
    }

    #[must_use]
    pub fn scalar(kind: ScalarKind) -> Self {
        ExpectedType::Scalar(kind)
    }

    #[must_use]
    pub fn is_readonly(&self) -> bool {
        match self {
            ExpectedType::Record(r) => r.readonly,
            ExpectedType::Array { readonly, .. } | ExpectedType::Tuple { readonly, .. } => {
                *readonly
            }
            ExpectedType::Map { .. }
            | ExpectedType::Scalar(_)
            | ExpectedType::Union { .. }
            | ExpectedType::Intersection { .. }
            | ExpectedType::JsonLike
            | ExpectedType::Reference(_) => false,
        }
    }
}

/// A declared record type: named fields plus an optional rest-type for
/// undeclared keys.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    /// Declared fields keyed by their *wire* name, in declaration order.
    pub fields: Vec<FieldSpec>,
    pub rest: Option<Box<ExpectedType>>,
    pub readonly: bool,
}

/// One declared record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The name this field is written under in the output container. May
    /// differ from `wire_name` when the field carries a rename annotation.
    pub declared_name: String,
    /// The name this field appears under in the JSON document.
    pub wire_name: String,
    pub ty: ExpectedType,
    pub required: bool,
    pub nilable: bool,
}

impl FieldSpec {
    #[must_use]
    pub fn new(name: &str, ty: ExpectedType, required: bool, nilable: bool) -> Self {
        FieldSpec {
            declared_name: name.to_string(),
            wire_name: name.to_string(),
            ty,
            required,
            nilable,
        }
    }

    #[must_use]
    pub fn renamed(declared_name: &str, wire_name: &str, ty: ExpectedType, required: bool, nilable: bool) -> Self {
        FieldSpec {
            declared_name: declared_name.to_string(),
            wire_name: wire_name.to_string(),
            ty,
            required,
            nilable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayShape {
    Open,
    Closed(usize),
}

/// The numeric/string scalar subtypes `coerceScalar` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Null,
    Bool,
    Int(IntWidth),
    Float,
    Decimal,
    String,
    /// A string exactly one character long.
    CharString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    /// The inclusive `[min, max]` range this width accepts, expressed as
    /// `i128` so unsigned 64-bit values still fit.
    #[must_use]
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntWidth::I8 => (i128::from(i8::MIN), i128::from(i8::MAX)),
            IntWidth::I16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
            IntWidth::I32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
            IntWidth::I64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
            IntWidth::U8 => (0, i128::from(u8::MAX)),
            IntWidth::U16 => (0, i128::from(u16::MAX)),
            IntWidth::U32 => (0, i128::from(u32::MAX)),
            IntWidth::U64 => (0, i128::from(u64::MAX)),
        }
    }
}
