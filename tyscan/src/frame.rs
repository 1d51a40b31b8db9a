//! The parser context stack (§3): one frame per in-progress object or
//! array. Each frame folds together what the source spec describes as
//! three parallel stacks (parser-context, expected-type, field-name
//! hierarchy) into a single ordered `Vec<Frame>` — a single mutable
//! context struct per §9's "shared mutable context" design note, rather
//! than three stacks kept manually in lockstep.

use indexmap::IndexMap;

use crate::types::{ArrayShape, ExpectedType, FieldSpec};
use crate::value::{ValueArray, ValueMap};

/// What a map frame was opened as: a declared record (with field
/// bookkeeping) or a homogeneous map (every key shares one value type).
pub enum MapKind {
    Record {
        /// Declared fields not yet consumed, keyed by wire name.
        unvisited: IndexMap<String, FieldSpec>,
        /// Wire name -> full spec, populated the first time a field is
        /// visited so a repeated wire key resolves without a second
        /// `unvisited` lookup (§4.3 rename handling).
        visited: IndexMap<String, FieldSpec>,
        rest: Option<ExpectedType>,
    },
    Map { value_ty: ExpectedType },
    /// This frame is building a generic subtree: either its own declared
    /// type was `JsonLike`, or it is a descendant of one (including a
    /// union subtree, which is `JsonLike` until its boundary).
    Generic,
}

pub struct MapFrame {
    pub node: ValueMap,
    pub kind: MapKind,
    /// The expected type this frame was opened against, kept for error
    /// messages (`UndefinedField`, `UnsupportedType`).
    pub declared_ty: ExpectedType,
    /// `Some(members)` exactly when this frame's *own* declared type was a
    /// `Union`: its boundary must invoke the union-fallback collaborator
    /// instead of ordinary finalisation.
    pub union_members: Option<Vec<ExpectedType>>,
    /// The wire name of the field currently being parsed (pushed when its
    /// string terminates, popped when its value finalizes).
    pub current_wire_name: Option<String>,
    pub current_declared_name: Option<String>,
    pub current_child_ty: ExpectedType,
    pub current_nilable: bool,
    pub current_required: bool,
}

pub enum ArrayKind {
    Array { element_ty: ExpectedType },
    Tuple { elements: Vec<ExpectedType> },
    Generic,
}

pub struct ArrayFrame {
    pub node: ValueArray,
    pub kind: ArrayKind,
    pub declared_ty: ExpectedType,
    pub shape: ArrayShape,
    pub index: usize,
    pub union_members: Option<Vec<ExpectedType>>,
}

impl ArrayFrame {
    #[must_use]
    pub fn current_element_ty(&self) -> ExpectedType {
        match &self.kind {
            ArrayKind::Array { element_ty } => element_ty.clone(),
            ArrayKind::Tuple { elements } => elements
                .get(self.index)
                .cloned()
                .unwrap_or(ExpectedType::JsonLike),
            ArrayKind::Generic => ExpectedType::JsonLike,
        }
    }
}

pub enum Frame {
    Map(MapFrame),
    Array(ArrayFrame),
}

impl Frame {
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Frame::Map(_))
    }
}
