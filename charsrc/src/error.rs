#[cfg(feature = "std")]
extern crate alloc;

#[cfg(feature = "std")]
use alloc::string::String;

/// Convenient type alias for `charsrc` results.
pub type Result<T> = core::result::Result<T, Error>;

/// A `(line, column)` position in the source, both 1-based.
///
/// `line` counts `\n` characters consumed before the current position plus
/// one; `column` resets to 1 after every `\n` and counts characters since.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub fn start() -> Self {
        Position { line: 1, column: 1 }
    }

    pub(crate) fn advance(&mut self, byte: u8) {
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Custom I/O error for `no_std` compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("I/O operation failed")]
pub struct IoError;

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// An error reading from the underlying character source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {position}")]
pub struct Error {
    pub kind: IoError,
    pub position: Position,
}

#[cfg(feature = "std")]
impl Error {
    #[must_use]
    pub fn description(&self) -> String {
        alloc::format!("{self}")
    }
}
