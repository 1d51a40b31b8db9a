//! The Projection Policy (§4.3) and the caller-facing configuration surface
//! that feeds it (§6).

/// The `allowDataProjection` knob. §9 Open Questions resolves the
/// boolean/sub-object ambiguity in the source: boolean `true` means
/// "project with defaults" (both sub-flags `false`, but undeclared fields
/// and array overflow are tolerated); boolean `false` means strict (both
/// sub-flags `false` *and* undeclared fields/overflow are fatal); the
/// sub-object form always implies projection is on and sets the two knobs
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProjection {
    Strict,
    Allow {
        absent_as_nilable_type: bool,
        nil_as_optional_field: bool,
    },
}

impl Default for DataProjection {
    fn default() -> Self {
        DataProjection::Strict
    }
}

impl DataProjection {
    /// The boolean `true` shorthand: project with default (both `false`)
    /// sub-flags.
    #[must_use]
    pub fn project_with_defaults() -> Self {
        DataProjection::Allow {
            absent_as_nilable_type: false,
            nil_as_optional_field: false,
        }
    }
}

/// Caller-supplied configuration for a single parse (§6).
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    pub allow_data_projection: DataProjection,
    pub enable_constraint_validation: bool,
}

/// The resolved, always-explicit policy the state machine consults at
/// enforcement points. Derived once per parse from `ParserOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionPolicy {
    /// Declared nilable fields missing from the document are treated as
    /// nil rather than failing `RequiredFieldMissing`.
    pub absent_as_nilable: bool,
    /// Explicit `null` for a non-required, non-nilable field is accepted
    /// rather than rejected.
    pub nil_as_optional: bool,
    /// Master switch: undeclared object keys and closed-array/tuple
    /// overflow are tolerated (trimmed/dropped) rather than fatal.
    pub allow_undeclared: bool,
}

impl ProjectionPolicy {
    #[must_use]
    pub fn from_options(projection: DataProjection) -> Self {
        match projection {
            DataProjection::Strict => ProjectionPolicy {
                absent_as_nilable: false,
                nil_as_optional: false,
                allow_undeclared: false,
            },
            DataProjection::Allow {
                absent_as_nilable_type,
                nil_as_optional_field,
            } => ProjectionPolicy {
                absent_as_nilable: absent_as_nilable_type,
                nil_as_optional: nil_as_optional_field,
                allow_undeclared: true,
            },
        }
    }
}
