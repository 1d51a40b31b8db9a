extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use embedded_io::Read;

use crate::error::{Error, IoError, Position, Result};

/// Default size of the refill buffer, matching the 1 KB working buffer the
/// state machine is specified to drive token-by-token.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A fixed-capacity, refillable byte buffer over a reader.
///
/// Unlike a zero-copy tokenizer, `Buffer` never hands out slices that must
/// outlive a refill: every consumed byte is either folded into the caller's
/// own growable lexeme buffer or discarded immediately. That lets refilling
/// be a simple compact-and-read rather than a borrow-tracking scheme.
pub struct Buffer<'buf, R: Read> {
    reader: &'buf mut R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    /// Position of the next byte to be returned by `next_byte`.
    pub position: Position,
}

impl<'buf, R: Read> Buffer<'buf, R> {
    #[must_use]
    pub fn new(reader: &'buf mut R) -> Self {
        Self::with_capacity(reader, DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(reader: &'buf mut R, capacity: usize) -> Self {
        Buffer {
            reader,
            buf: vec![0u8; capacity],
            start: 0,
            end: 0,
            position: Position::start(),
        }
    }

    /// Compacts unread bytes to the front, then reads more from the
    /// underlying reader. Returns `false` on EOF (reader reported 0 bytes).
    fn refill(&mut self) -> Result<bool> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.end == self.buf.len() {
            // Buffer is saturated by a single unconsumed byte run; this can
            // only happen if the caller never advances, which the state
            // machine never does. Treat as an empty read rather than panic.
            return Ok(true);
        }
        let n = self
            .reader
            .read(&mut self.buf[self.end..])
            .map_err(|_| Error {
                kind: IoError,
                position: self.position,
            })?;
        self.end += n;
        Ok(n > 0)
    }

    /// Returns the next byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        if self.start == self.end && !self.refill()? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.start]))
    }

    /// Consumes and returns the next byte, advancing the line/column
    /// position.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.start == self.end && !self.refill()? {
            return Ok(None);
        }
        let byte = self.buf[self.start];
        self.start += 1;
        self.position.advance(byte);
        Ok(Some(byte))
    }
}

impl<'buf, R: Read> core::fmt::Debug for Buffer<'buf, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Buffer {{ start: {}, end: {}, position: {:?} }}",
            self.start, self.end, self.position
        )
    }
}
