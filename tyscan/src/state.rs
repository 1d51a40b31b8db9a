//! The state machine's 26 states (§4.4), re-architected per §9's design
//! note as tagged variants with a shared transition function rather than
//! an inheritance hierarchy: the four string-context variants share one
//! escape/hex-processing pair, carrying a `StringCtx` "return context"
//! instead of four duplicated subclasses.

/// Which string-typed production is being accumulated. Escape and
/// Unicode-hex states carry this so the four parallel escape contexts
/// (field-value, array-element, top-level, field-name) share one
/// implementation and differ only in where they resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringCtx {
    FieldValue,
    ArrayElement,
    TopLevel,
    FieldName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    DocStart,
    DocEnd,
    FieldEnd,
    ArrayElementEnd,

    FirstFieldReady,
    NonFirstFieldReady,
    FieldName,
    EndFieldName,
    FieldValueReady,

    StringFieldValue,
    NonStringFieldValue,

    FirstArrayElementReady,
    NonFirstArrayElementReady,
    StringArrayElement,
    NonStringArrayElement,

    StringValue,
    NonStringValue,

    EscapedCharacterProcessing(StringCtx),
    UnicodeHexProcessing(StringCtx),
}
