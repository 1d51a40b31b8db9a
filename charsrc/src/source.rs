use embedded_io::Read;

use crate::buffer::Buffer;
use crate::error::{Position, Result};

/// The character source collaborator the state machine is driven over.
///
/// Implementations pull one character at a time, refilling from the
/// underlying I/O on demand. End of input is reported as `Ok(None)`.
pub trait CharSource {
    /// Consumes and returns the next character.
    fn next_char(&mut self) -> Result<Option<char>>;

    /// Returns the next character without consuming it.
    fn peek_char(&mut self) -> Result<Option<char>>;

    /// The `(line, column)` of the next character to be returned.
    fn position(&self) -> Position;
}

/// The default `CharSource`: a UTF-8 decoder over a [`Buffer`], with a
/// one-character lookahead so `peek_char` can decode multi-byte sequences
/// without needing the underlying buffer to support anything richer than a
/// one-byte peek.
pub struct Reader<'buf, R: Read> {
    buf: Buffer<'buf, R>,
    lookahead: Option<char>,
    lookahead_position: Position,
}

impl<'buf, R: Read> Reader<'buf, R> {
    #[must_use]
    pub fn new(reader: &'buf mut R) -> Self {
        Reader {
            buf: Buffer::new(reader),
            lookahead: None,
            lookahead_position: Position::start(),
        }
    }

    #[must_use]
    pub fn with_capacity(reader: &'buf mut R, capacity: usize) -> Self {
        Reader {
            buf: Buffer::with_capacity(reader, capacity),
            lookahead: None,
            lookahead_position: Position::start(),
        }
    }

    fn decode_one(&mut self) -> Result<Option<char>> {
        let Some(lead) = self.buf.next_byte()? else {
            return Ok(None);
        };
        let Some(extra) = utf8_extra_bytes(lead) else {
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        };
        if extra == 0 {
            return Ok(Some(lead as char));
        }
        let mut code_point = u32::from(lead & (0x7F >> extra));
        for _ in 0..extra {
            let Some(cont) = self.buf.next_byte()? else {
                return Ok(Some(char::REPLACEMENT_CHARACTER));
            };
            if cont & 0xC0 != 0x80 {
                return Ok(Some(char::REPLACEMENT_CHARACTER));
            }
            code_point = (code_point << 6) | u32::from(cont & 0x3F);
        }
        Ok(Some(
            char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER),
        ))
    }
}

impl<'buf, R: Read> CharSource for Reader<'buf, R> {
    fn next_char(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.lookahead.take() {
            return Ok(Some(c));
        }
        self.decode_one()
    }

    fn peek_char(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.lookahead {
            return Ok(Some(c));
        }
        self.lookahead_position = self.buf.position;
        let decoded = self.decode_one()?;
        self.lookahead = decoded;
        Ok(decoded)
    }

    fn position(&self) -> Position {
        if self.lookahead.is_some() {
            self.lookahead_position
        } else {
            self.buf.position
        }
    }
}

fn utf8_extra_bytes(lead: u8) -> Option<u8> {
    if lead & 0x80 == 0 {
        Some(0)
    } else if lead & 0xE0 == 0xC0 {
        Some(1)
    } else if lead & 0xF0 == 0xE0 {
        Some(2)
    } else if lead & 0xF8 == 0xF0 {
        Some(3)
    } else {
        None
    }
}
