//! The State Machine (§4.4): a character-by-character driver over a
//! [`CharSource`], maintaining the parser context stack and dispatching to
//! the Type Introspector, Value Constructor, and Projection Policy at
//! every structural event.
//!
//! Per §9's design note, the 26 states are tagged variants
//! ([`crate::state::State`]) rather than a class hierarchy, and all of the
//! mutable bookkeeping (stack, lexeme buffer, union depth, root slot) lives
//! on one `Parser` struct passed by `&mut self` rather than scattered
//! singletons.

use indexmap::IndexMap;

use charsrc::{CharSource, Position};

use crate::error::{Error, Result};
use crate::fallback::UnionFallback;
use crate::frame::{ArrayFrame, ArrayKind, Frame, MapFrame, MapKind};
use crate::introspect::{self, Category};
use crate::policy::{ParserOptions, ProjectionPolicy};
use crate::state::{State, StringCtx};
use crate::types::{ArrayShape, ExpectedType, FieldSpec};
use crate::value::{self, Value};

/// Where a just-completed scalar lexeme is headed: the root slot, the
/// field currently in progress on the top map frame, or the element
/// currently in progress on the top array frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Top,
    Field,
    Element,
}

struct RunCtx<'a> {
    policy: ProjectionPolicy,
    fallback: &'a dyn UnionFallback,
    root_ty: &'a ExpectedType,
}

fn is_json_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn string_state_for(ctx: StringCtx) -> State {
    match ctx {
        StringCtx::FieldValue => State::StringFieldValue,
        StringCtx::ArrayElement => State::StringArrayElement,
        StringCtx::TopLevel => State::StringValue,
        StringCtx::FieldName => State::FieldName,
    }
}

/// The reusable parser instance (§5). Owns the context stack, lexeme
/// buffer, and union-depth counter; the character source and collaborators
/// are supplied fresh to each [`Parser::parse`] call so one instance can be
/// pooled across unrelated documents.
pub struct Parser {
    stack: Vec<Frame>,
    state: State,
    lexeme: String,
    hex_accum: u32,
    hex_digits: u8,
    union_depth: usize,
    root: Option<Value>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Parser {
            stack: Vec::new(),
            state: State::DocStart,
            lexeme: String::new(),
            hex_accum: 0,
            hex_digits: 0,
            union_depth: 0,
            root: None,
        }
    }

    /// Zeroes all stacks, buffers, counters, and the root-value slot so a
    /// reused instance does not retain references to a previous parse's
    /// output (§5).
    pub fn reset(&mut self) {
        self.stack.clear();
        self.state = State::DocStart;
        self.lexeme.clear();
        self.hex_accum = 0;
        self.hex_digits = 0;
        self.union_depth = 0;
        self.root = None;
    }

    /// Current union-subtree nesting depth; zero outside any union
    /// subtree (§3 invariant).
    #[must_use]
    pub fn union_depth(&self) -> usize {
        self.union_depth
    }

    /// Depth of the parser context stack (§8 depth-parity property).
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Parses one document from `source` into a value conforming to
    /// `expected`, using `fallback` to resolve union subtrees.
    ///
    /// # Errors
    /// Any of the taxonomy in `crate::error::Error`; the parse is abandoned
    /// on the first error.
    pub fn parse(
        &mut self,
        source: &mut dyn CharSource,
        options: &ParserOptions,
        expected: &ExpectedType,
        fallback: &dyn UnionFallback,
    ) -> Result<Value> {
        self.reset();
        let policy = ProjectionPolicy::from_options(options.allow_data_projection);
        let run_ctx = RunCtx {
            policy,
            fallback,
            root_ty: expected,
        };
        self.run(source, &run_ctx)?;
        self.root.take().ok_or_else(|| {
            Error::InternalError(source.position(), "parse completed without producing a root value")
        })
    }

    fn peek_char(&self, source: &mut dyn CharSource) -> Result<Option<char>> {
        Ok(source.peek_char()?)
    }

    fn advance_char(&mut self, source: &mut dyn CharSource) -> Result<Option<char>> {
        Ok(source.next_char()?)
    }

    fn position(&self, source: &dyn CharSource) -> Position {
        source.position()
    }

    fn skip_ws(&mut self, source: &mut dyn CharSource) -> Result<Option<char>> {
        loop {
            match self.peek_char(source)? {
                Some(c) if is_json_ws(c) => {
                    self.advance_char(source)?;
                }
                other => return Ok(other),
            }
        }
    }

    fn run(&mut self, source: &mut dyn CharSource, run_ctx: &RunCtx) -> Result<()> {
        loop {
            match self.state.clone() {
                State::DocStart => self.st_doc_start(source, run_ctx)?,
                State::FirstFieldReady => self.st_field_ready(source, run_ctx, true)?,
                State::NonFirstFieldReady => self.st_field_ready(source, run_ctx, false)?,
                State::FieldName => self.step_string(source, StringCtx::FieldName, run_ctx)?,
                State::EndFieldName => self.st_end_field_name(source)?,
                State::FieldValueReady => self.st_field_value_ready(source, run_ctx)?,
                State::StringFieldValue => self.step_string(source, StringCtx::FieldValue, run_ctx)?,
                State::NonStringFieldValue => self.step_nonstring(source, Slot::Field, run_ctx)?,
                State::FirstArrayElementReady => self.st_array_element_ready(source, run_ctx, true)?,
                State::NonFirstArrayElementReady => self.st_array_element_ready(source, run_ctx, false)?,
                State::StringArrayElement => self.step_string(source, StringCtx::ArrayElement, run_ctx)?,
                State::NonStringArrayElement => self.step_nonstring(source, Slot::Element, run_ctx)?,
                State::StringValue => self.step_string(source, StringCtx::TopLevel, run_ctx)?,
                State::NonStringValue => self.step_nonstring(source, Slot::Top, run_ctx)?,
                State::EscapedCharacterProcessing(ctx) => self.step_escaped(source, ctx)?,
                State::UnicodeHexProcessing(ctx) => self.step_unicode_hex(source, ctx)?,
                State::FieldEnd => self.st_field_end(source, run_ctx)?,
                State::ArrayElementEnd => self.st_array_element_end(source, run_ctx)?,
                State::DocEnd => {
                    if self.st_doc_end(source)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    // ---------------- Structural states

    fn st_doc_start(&mut self, source: &mut dyn CharSource, run_ctx: &RunCtx) -> Result<()> {
        let next = self.skip_ws(source)?;
        let position = self.position(source);
        match next {
            None => Err(Error::EmptyDocument),
            Some('{') => {
                self.advance_char(source)?;
                self.push_map_frame(run_ctx.root_ty, position)?;
                self.state = State::FirstFieldReady;
                Ok(())
            }
            Some('[') => {
                self.advance_char(source)?;
                self.push_array_frame(run_ctx.root_ty, position)?;
                self.state = State::FirstArrayElementReady;
                Ok(())
            }
            Some('"') => {
                self.advance_char(source)?;
                self.lexeme.clear();
                self.state = State::StringValue;
                Ok(())
            }
            Some(_) => {
                self.state = State::NonStringValue;
                Ok(())
            }
        }
    }

    fn st_field_ready(&mut self, source: &mut dyn CharSource, run_ctx: &RunCtx, allow_empty: bool) -> Result<()> {
        let next = self.skip_ws(source)?;
        let position = self.position(source);
        match next {
            Some('"') => {
                self.advance_char(source)?;
                self.lexeme.clear();
                self.state = State::FieldName;
                Ok(())
            }
            Some('}') if allow_empty => {
                self.advance_char(source)?;
                self.finalize_map(run_ctx, position)
            }
            Some(c) => Err(Error::UnexpectedChar {
                found: c,
                expected: if allow_empty { "'\"' or '}'" } else { "'\"'" },
                position,
            }),
            None => Err(Error::UnexpectedEof(position)),
        }
    }

    fn st_end_field_name(&mut self, source: &mut dyn CharSource) -> Result<()> {
        let next = self.skip_ws(source)?;
        let position = self.position(source);
        match next {
            Some(':') => {
                self.advance_char(source)?;
                self.state = State::FieldValueReady;
                Ok(())
            }
            Some(c) => Err(Error::UnexpectedChar {
                found: c,
                expected: "':'",
                position,
            }),
            None => Err(Error::UnexpectedEof(position)),
        }
    }

    fn st_field_value_ready(&mut self, source: &mut dyn CharSource, run_ctx: &RunCtx) -> Result<()> {
        let next = self.skip_ws(source)?;
        let position = self.position(source);
        match next {
            Some('"') => {
                self.advance_char(source)?;
                self.lexeme.clear();
                self.state = State::StringFieldValue;
                Ok(())
            }
            Some('{') => {
                self.advance_char(source)?;
                let ty = self.current_map_child_ty(position)?;
                self.push_map_frame(&ty, position)?;
                self.state = State::FirstFieldReady;
                Ok(())
            }
            Some('[') => {
                self.advance_char(source)?;
                let ty = self.current_map_child_ty(position)?;
                self.push_array_frame(&ty, position)?;
                self.state = State::FirstArrayElementReady;
                Ok(())
            }
            Some(_) => {
                self.state = State::NonStringFieldValue;
                Ok(())
            }
            None => Err(Error::UnexpectedEof(position)),
        }
    }

    fn st_array_element_ready(&mut self, source: &mut dyn CharSource, run_ctx: &RunCtx, allow_empty: bool) -> Result<()> {
        let next = self.skip_ws(source)?;
        let position = self.position(source);
        match next {
            Some(']') if allow_empty => {
                self.advance_char(source)?;
                self.finalize_array(run_ctx, position)
            }
            Some(c) => {
                self.check_array_overflow(run_ctx, position)?;
                match c {
                    '"' => {
                        self.advance_char(source)?;
                        self.lexeme.clear();
                        self.state = State::StringArrayElement;
                        Ok(())
                    }
                    '{' => {
                        self.advance_char(source)?;
                        let ty = self.current_array_child_ty(position)?;
                        self.push_map_frame(&ty, position)?;
                        self.state = State::FirstFieldReady;
                        Ok(())
                    }
                    '[' => {
                        self.advance_char(source)?;
                        let ty = self.current_array_child_ty(position)?;
                        self.push_array_frame(&ty, position)?;
                        self.state = State::FirstArrayElementReady;
                        Ok(())
                    }
                    _ => {
                        self.state = State::NonStringArrayElement;
                        Ok(())
                    }
                }
            }
            None => Err(Error::UnexpectedEof(position)),
        }
    }

    fn st_field_end(&mut self, source: &mut dyn CharSource, run_ctx: &RunCtx) -> Result<()> {
        let next = self.skip_ws(source)?;
        let position = self.position(source);
        match next {
            Some(',') => {
                self.advance_char(source)?;
                self.state = State::NonFirstFieldReady;
                Ok(())
            }
            Some('}') => {
                self.advance_char(source)?;
                self.finalize_map(run_ctx, position)
            }
            Some(c) => Err(Error::UnexpectedChar {
                found: c,
                expected: "',' or '}'",
                position,
            }),
            None => Err(Error::UnexpectedEof(position)),
        }
    }

    fn st_array_element_end(&mut self, source: &mut dyn CharSource, run_ctx: &RunCtx) -> Result<()> {
        let next = self.skip_ws(source)?;
        let position = self.position(source);
        match next {
            Some(',') => {
                self.advance_char(source)?;
                if let Some(Frame::Array(af)) = self.stack.last_mut() {
                    af.index += 1;
                }
                self.state = State::NonFirstArrayElementReady;
                Ok(())
            }
            Some(']') => {
                self.advance_char(source)?;
                self.finalize_array(run_ctx, position)
            }
            Some(c) => Err(Error::UnexpectedChar {
                found: c,
                expected: "',' or ']'",
                position,
            }),
            None => Err(Error::UnexpectedEof(position)),
        }
    }

    fn st_doc_end(&mut self, source: &mut dyn CharSource) -> Result<bool> {
        match self.peek_char(source)? {
            None => Ok(true),
            Some(c) if is_json_ws(c) => {
                self.advance_char(source)?;
                Ok(false)
            }
            Some(_) => Err(Error::TrailingContent(self.position(source))),
        }
    }

    // ---------------- String / escape states

    fn step_string(&mut self, source: &mut dyn CharSource, ctx: StringCtx, run_ctx: &RunCtx) -> Result<()> {
        loop {
            let position = self.position(source);
            match self.peek_char(source)? {
                None => return Err(Error::UnexpectedEof(position)),
                Some('"') => {
                    self.advance_char(source)?;
                    let position = self.position(source);
                    match ctx {
                        StringCtx::FieldName => {
                            let wire = core::mem::take(&mut self.lexeme);
                            self.handle_field_name(wire, run_ctx.policy, position)?;
                            self.state = State::EndFieldName;
                        }
                        StringCtx::FieldValue => {
                            let v = self.finish_value_in_slot(true, Slot::Field, run_ctx, position)?;
                            self.lexeme.clear();
                            self.place_value(v)?;
                            self.state = State::FieldEnd;
                        }
                        StringCtx::ArrayElement => {
                            let v = self.finish_value_in_slot(true, Slot::Element, run_ctx, position)?;
                            self.lexeme.clear();
                            self.place_value(v)?;
                            self.state = State::ArrayElementEnd;
                        }
                        StringCtx::TopLevel => {
                            let v = self.finish_value_in_slot(true, Slot::Top, run_ctx, position)?;
                            self.lexeme.clear();
                            self.place_value(v)?;
                            self.state = State::DocEnd;
                        }
                    }
                    return Ok(());
                }
                Some('\\') => {
                    self.advance_char(source)?;
                    self.state = State::EscapedCharacterProcessing(ctx);
                    return Ok(());
                }
                Some(c) => {
                    self.lexeme.push(c);
                    self.advance_char(source)?;
                }
            }
        }
    }

    fn step_escaped(&mut self, source: &mut dyn CharSource, ctx: StringCtx) -> Result<()> {
        let position = self.position(source);
        let Some(c) = self.peek_char(source)? else {
            return Err(Error::UnexpectedEof(position));
        };
        self.advance_char(source)?;
        let translated = match c {
            '"' => Some('"'),
            '\\' => Some('\\'),
            '/' => Some('/'),
            'b' => Some('\u{0008}'),
            'f' => Some('\u{000C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'u' => None,
            other => return Err(Error::BadEscape(other, position)),
        };
        match translated {
            Some(ch) => {
                self.lexeme.push(ch);
                self.state = string_state_for(ctx);
            }
            None => {
                self.hex_accum = 0;
                self.hex_digits = 0;
                self.state = State::UnicodeHexProcessing(ctx);
            }
        }
        Ok(())
    }

    fn step_unicode_hex(&mut self, source: &mut dyn CharSource, ctx: StringCtx) -> Result<()> {
        loop {
            if self.hex_digits == 4 {
                // A lone surrogate has no valid `char` representation; per
                // SPEC_FULL §9 this is mapped to U+FFFD rather than
                // validated for pairing, narrowing the source's pass-through
                // behavior to what Rust's UTF-8 `String` can hold.
                let ch = char::from_u32(self.hex_accum).unwrap_or(char::REPLACEMENT_CHARACTER);
                self.lexeme.push(ch);
                self.hex_accum = 0;
                self.hex_digits = 0;
                self.state = string_state_for(ctx);
                return Ok(());
            }
            let position = self.position(source);
            let Some(c) = self.peek_char(source)? else {
                return Err(Error::UnexpectedEof(position));
            };
            let Some(d) = c.to_digit(16) else {
                return Err(Error::BadHexEscape(position));
            };
            self.advance_char(source)?;
            self.hex_accum = (self.hex_accum << 4) | d;
            self.hex_digits += 1;
        }
    }

    // ---------------- Bare-lexeme states (numbers, true/false/null)

    fn step_nonstring(&mut self, source: &mut dyn CharSource, slot: Slot, run_ctx: &RunCtx) -> Result<()> {
        loop {
            let position = self.position(source);
            match self.peek_char(source)? {
                None => {
                    if slot != Slot::Top {
                        return Err(Error::UnexpectedEof(position));
                    }
                    let v = self.finish_value_in_slot(false, slot, run_ctx, position)?;
                    self.lexeme.clear();
                    self.place_value(v)?;
                    self.state = State::DocEnd;
                    return Ok(());
                }
                Some(c) if is_json_ws(c) || matches!(c, ',' | '}' | ']') => {
                    let v = self.finish_value_in_slot(false, slot, run_ctx, position)?;
                    self.lexeme.clear();
                    self.place_value(v)?;
                    self.state = match slot {
                        Slot::Field => State::FieldEnd,
                        Slot::Element => State::ArrayElementEnd,
                        Slot::Top => State::DocEnd,
                    };
                    return Ok(());
                }
                Some(c) => {
                    self.lexeme.push(c);
                    self.advance_char(source)?;
                }
            }
        }
    }

    // ---------------- Schema-directed helpers (Type Introspector / Value
    // Constructor / Projection Policy glue)

    fn push_map_frame(&mut self, ty: &ExpectedType, position: Position) -> Result<()> {
        let (node_readonly, kind, union_members) = match introspect::classify(ty, position)? {
            Category::Record(record) => {
                let mut unvisited = IndexMap::new();
                for f in &record.fields {
                    unvisited.insert(f.wire_name.clone(), f.clone());
                }
                let rest = record.rest.as_ref().map(|boxed| (**boxed).clone());
                (
                    record.readonly,
                    MapKind::Record {
                        unvisited,
                        visited: IndexMap::new(),
                        rest,
                    },
                    None,
                )
            }
            Category::Map { value: value_ty } => (false, MapKind::Map { value_ty: value_ty.clone() }, None),
            Category::JsonLike => (false, MapKind::Generic, None),
            Category::Union { members } => (false, MapKind::Generic, Some(members.to_vec())),
            _ => {
                return Err(Error::UnexpectedChar {
                    found: '{',
                    expected: "a scalar, array, or tuple value",
                    position,
                })
            }
        };
        if union_members.is_some() {
            self.union_depth += 1;
        }
        self.stack.push(Frame::Map(MapFrame {
            node: value::new_map(node_readonly),
            kind,
            declared_ty: ty.clone(),
            union_members,
            current_wire_name: None,
            current_declared_name: None,
            current_child_ty: ExpectedType::JsonLike,
            current_nilable: false,
            current_required: false,
        }));
        Ok(())
    }

    fn push_array_frame(&mut self, ty: &ExpectedType, position: Position) -> Result<()> {
        let (kind, shape, union_members) = match introspect::classify(ty, position)? {
            Category::Array { element, shape, .. } => (
                ArrayKind::Array {
                    element_ty: element.clone(),
                },
                shape,
                None,
            ),
            Category::Tuple { elements, .. } => {
                let size = elements.len();
                (ArrayKind::Tuple { elements: elements.to_vec() }, ArrayShape::Closed(size), None)
            }
            Category::JsonLike => (ArrayKind::Generic, ArrayShape::Open, None),
            Category::Union { members } => (ArrayKind::Generic, ArrayShape::Open, Some(members.to_vec())),
            _ => {
                return Err(Error::UnexpectedChar {
                    found: '[',
                    expected: "an object, map, or scalar value",
                    position,
                })
            }
        };
        if union_members.is_some() {
            self.union_depth += 1;
        }
        self.stack.push(Frame::Array(ArrayFrame {
            node: value::new_array(false),
            kind,
            declared_ty: ty.clone(),
            shape,
            index: 0,
            union_members,
        }));
        Ok(())
    }

    fn current_map_child_ty(&self, position: Position) -> Result<ExpectedType> {
        match self.stack.last() {
            Some(Frame::Map(mf)) => Ok(mf.current_child_ty.clone()),
            _ => Err(Error::InternalError(position, "expected a map frame awaiting a field value")),
        }
    }

    fn current_array_child_ty(&self, position: Position) -> Result<ExpectedType> {
        match self.stack.last() {
            Some(Frame::Array(af)) => Ok(af.current_element_ty()),
            _ => Err(Error::InternalError(position, "expected an array frame awaiting an element")),
        }
    }

    fn check_array_overflow(&self, run_ctx: &RunCtx, position: Position) -> Result<()> {
        if let Some(Frame::Array(af)) = self.stack.last() {
            if let ArrayShape::Closed(size) = af.shape {
                if af.index >= size && !run_ctx.policy.allow_undeclared {
                    return Err(Error::ArrayTooLong {
                        declared_size: size,
                        position,
                    });
                }
            }
        }
        Ok(())
    }

    /// §4.3 rename handling: consult `visited` first (repeated wire key),
    /// then `unvisited`, then `rest`, then projection; records the
    /// resolved declared name/type/nilable/required on the frame for the
    /// value that follows.
    fn handle_field_name(&mut self, wire: String, policy: ProjectionPolicy, position: Position) -> Result<()> {
        let Some(Frame::Map(mf)) = self.stack.last_mut() else {
            return Err(Error::InternalError(position, "field name encountered outside a map frame"));
        };
        let declared_ty_for_error = mf.declared_ty.clone();
        let (declared_name, ty, nilable, required): (String, ExpectedType, bool, bool) = match &mut mf.kind {
            MapKind::Record { unvisited, visited, rest } => {
                if let Some(spec) = visited.get(&wire) {
                    (spec.declared_name.clone(), spec.ty.clone(), spec.nilable, spec.required)
                } else if let Some(spec) = unvisited.shift_remove(&wire) {
                    visited.insert(wire.clone(), spec.clone());
                    (spec.declared_name, spec.ty, spec.nilable, spec.required)
                } else if let Some(rest_ty) = rest {
                    (wire.clone(), rest_ty.clone(), true, false)
                } else if policy.allow_undeclared {
                    (wire.clone(), ExpectedType::JsonLike, true, false)
                } else {
                    return Err(Error::UndefinedField {
                        wire_name: wire,
                        expected: declared_ty_for_error,
                        position,
                    });
                }
            }
            MapKind::Map { value_ty } => (wire.clone(), value_ty.clone(), true, false),
            MapKind::Generic => (wire.clone(), ExpectedType::JsonLike, true, false),
        };
        mf.current_wire_name = Some(wire);
        mf.current_declared_name = Some(declared_name);
        mf.current_child_ty = ty;
        mf.current_nilable = nilable;
        mf.current_required = required;
        Ok(())
    }

    fn effective_scalar_ty(&self, ty: &ExpectedType, position: Position) -> Result<(ExpectedType, Option<Vec<ExpectedType>>)> {
        match introspect::classify(ty, position)? {
            Category::Union { members } => Ok((ExpectedType::JsonLike, Some(members.to_vec()))),
            Category::JsonLike => Ok((ExpectedType::JsonLike, None)),
            Category::Scalar(kind) => Ok((ExpectedType::Scalar(kind), None)),
            _ => Ok((ty.clone(), None)),
        }
    }

    fn finish_scalar_generic(
        &self,
        was_quoted: bool,
        declared_ty: &ExpectedType,
        run_ctx: &RunCtx,
        position: Position,
    ) -> Result<Value> {
        let (eff_ty, union_members) = self.effective_scalar_ty(declared_ty, position)?;
        let mut v = value::coerce_scalar(&self.lexeme, &eff_ty, was_quoted, position)?;
        if let Some(members) = union_members {
            v = run_ctx.fallback.traverse(v, run_ctx.policy, &members)?;
        }
        Ok(v)
    }

    fn finish_field_scalar(
        &self,
        was_quoted: bool,
        declared_ty: &ExpectedType,
        nilable: bool,
        required: bool,
        run_ctx: &RunCtx,
        position: Position,
    ) -> Result<Value> {
        if !was_quoted && self.lexeme == "null" {
            let accepted_by_policy = nilable || (run_ctx.policy.nil_as_optional && !required);
            if accepted_by_policy {
                return Ok(Value::Null);
            }
        }
        self.finish_scalar_generic(was_quoted, declared_ty, run_ctx, position)
    }

    fn current_value_slot(&self, slot: Slot, run_ctx: &RunCtx, position: Position) -> Result<(ExpectedType, bool, bool)> {
        match slot {
            Slot::Top => Ok((run_ctx.root_ty.clone(), false, false)),
            Slot::Field => match self.stack.last() {
                Some(Frame::Map(mf)) => Ok((mf.current_child_ty.clone(), mf.current_nilable, mf.current_required)),
                _ => Err(Error::InternalError(position, "expected a map frame for a field value")),
            },
            Slot::Element => match self.stack.last() {
                Some(Frame::Array(af)) => Ok((af.current_element_ty(), false, false)),
                _ => Err(Error::InternalError(position, "expected an array frame for an element")),
            },
        }
    }

    fn finish_value_in_slot(&self, was_quoted: bool, slot: Slot, run_ctx: &RunCtx, position: Position) -> Result<Value> {
        let (ty, nilable, required) = self.current_value_slot(slot, run_ctx, position)?;
        match slot {
            Slot::Field => self.finish_field_scalar(was_quoted, &ty, nilable, required, run_ctx, position),
            Slot::Top | Slot::Element => self.finish_scalar_generic(was_quoted, &ty, run_ctx, position),
        }
    }

    /// Splices a just-completed value into its parent (§4.2 `assignField`
    /// / `appendElement`), or into the root slot when the context stack is
    /// empty.
    ///
    /// Duplicate wire keys are handled asymmetrically per §1/§6: a
    /// `MapKind::Record` frame keeps the document's *first* value for a
    /// declared field (a later repeat of the same wire name resolves, via
    /// `handle_field_name`'s `visited` lookup, to the same `FieldSpec`, but
    /// is dropped here rather than overwriting); `MapKind::Map`/`Generic`
    /// frames keep ordinary last-write-wins insertion.
    fn place_value(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Map(mf)) => {
                let name = mf
                    .current_declared_name
                    .take()
                    .ok_or_else(|| Error::InternalError(Position::start(), "no field name in progress"))?;
                mf.current_wire_name = None;
                let first_write_wins = matches!(mf.kind, MapKind::Record { .. });
                if !(first_write_wins && mf.node.entries.contains_key(&name)) {
                    value::assign_field(&mut mf.node, &name, value);
                }
                Ok(())
            }
            Some(Frame::Array(af)) => {
                value::append_element(&mut af.node, af.index, af.shape, value);
                Ok(())
            }
        }
    }

    fn finalize_map(&mut self, run_ctx: &RunCtx, position: Position) -> Result<()> {
        let Some(frame) = self.stack.pop() else {
            return Err(Error::InternalError(position, "map finalisation with an empty context stack"));
        };
        let Frame::Map(MapFrame {
            mut node,
            kind,
            declared_ty,
            union_members,
            ..
        }) = frame
        else {
            return Err(Error::InternalError(position, "map finalisation on a non-map frame"));
        };
        if let MapKind::Record { unvisited, .. } = kind {
            finalize_record_fields(unvisited, &mut node, run_ctx.policy, position)?;
        }
        let mut value = Value::Map(node);
        if let Some(members) = union_members {
            value = run_ctx.fallback.traverse(value, run_ctx.policy, &members)?;
            self.union_depth -= 1;
        } else if declared_ty.is_readonly() {
            value::freeze_readonly(&mut value);
        }
        self.place_value(value)?;
        self.state = self.post_finalize_state();
        Ok(())
    }

    fn finalize_array(&mut self, run_ctx: &RunCtx, position: Position) -> Result<()> {
        let Some(frame) = self.stack.pop() else {
            return Err(Error::InternalError(position, "array finalisation with an empty context stack"));
        };
        let Frame::Array(ArrayFrame {
            node,
            declared_ty,
            union_members,
            ..
        }) = frame
        else {
            return Err(Error::InternalError(position, "array finalisation on a non-array frame"));
        };
        let mut value = Value::Array(node);
        if let Some(members) = union_members {
            value = run_ctx.fallback.traverse(value, run_ctx.policy, &members)?;
            self.union_depth -= 1;
        } else if declared_ty.is_readonly() {
            value::freeze_readonly(&mut value);
        }
        self.place_value(value)?;
        self.state = self.post_finalize_state();
        Ok(())
    }

    fn post_finalize_state(&self) -> State {
        match self.stack.last() {
            None => State::DocEnd,
            Some(Frame::Map(_)) => State::FieldEnd,
            Some(Frame::Array(_)) => State::ArrayElementEnd,
        }
    }
}

/// Close-brace validation for a record frame (§4.3): every still-unvisited
/// declared field either is absent-tolerated (nilable, with
/// `absentAsNilable` on, producing a `null` entry) or fails
/// `RequiredFieldMissing`. Non-required absent fields are left out of the
/// output entirely — enabling `absentAsNilable` must only ever convert
/// `RequiredFieldMissing` errors into successes (§8 projection
/// monotonicity), never touch fields that were never an error to begin
/// with.
fn finalize_record_fields(
    unvisited: IndexMap<String, FieldSpec>,
    node: &mut crate::value::ValueMap,
    policy: ProjectionPolicy,
    position: Position,
) -> Result<()> {
    for (_, field) in unvisited {
        if field.required {
            if field.nilable && policy.absent_as_nilable {
                value::assign_field(node, &field.declared_name, Value::Null);
            } else {
                return Err(Error::RequiredFieldMissing {
                    field_name: field.declared_name,
                    position,
                });
            }
        }
    }
    Ok(())
}
