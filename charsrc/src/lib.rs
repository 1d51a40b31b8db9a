#![doc = include_str!("../README.md")]
#![no_std]

extern crate alloc;

/// Buffer management for the 1 KB refill buffer the state machine drives.
pub mod buffer;
/// Error types, positions, and results.
pub mod error;
/// `CharSource`, the character-pull collaborator, and its default reader.
pub mod source;

pub use buffer::Buffer;
pub use error::{Error, IoError, Position, Result};
pub use source::{CharSource, Reader};
