//! MSB-first bit packing over blocking byte streams.
//!
//! This crate provides [`BitReader`] and [`BitWriter`], thin wrappers around a
//! [`std::io::Read`] source and a [`std::io::Write`] sink that move values of
//! arbitrary bit width across byte boundaries.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Explicit errors** - Running out of input mid-value is an error, never a zero.
//! - **No domain knowledge** - This crate knows nothing about structs or fields.
//! - **Persistent cursors** - A partially consumed or partially written byte
//!   carries over to the next call on the same reader or writer.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new(Vec::new());
//! writer.write_bool(true).unwrap();
//! writer.write_bits(42, 7).unwrap();
//!
//! let bytes = writer.into_inner().unwrap();
//!
//! let mut reader = BitReader::new(bytes.as_slice());
//! assert_eq!(reader.read_bit().unwrap(), true);
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! ```

mod error;
mod reader;
mod shift;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::{BitCursor, BitReader};
pub use shift::shift_left_by;
pub use writer::{BitWriter, PendingBits};
