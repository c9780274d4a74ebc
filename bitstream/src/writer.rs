//! Bit-level writer over a blocking byte sink.

use std::io::{self, Write};

use crate::error::{BitError, BitResult};
use crate::shift::{shift_left_by, shl_bytes};

/// Bits written but not yet emitted because they do not fill a byte.
///
/// The valid bits sit in the high end of `rest_byte`; the low bits are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingBits {
    rest: u8,
    len: u8,
}

impl PendingBits {
    /// No pending bits.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rest: 0, len: 0 }
    }

    /// The partially filled byte.
    #[must_use]
    pub const fn rest_byte(self) -> u8 {
        self.rest
    }

    /// Number of valid high bits in [`rest_byte`](Self::rest_byte) (0-7).
    #[must_use]
    pub const fn len(self) -> u8 {
        self.len
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// A bit-level writer that pushes MSB-first bits into a [`Write`] sink.
///
/// Whole bytes are emitted as soon as they are complete. A trailing partial
/// byte stays pending, possibly across many values, until more bits complete
/// it or [`flush`](Self::flush) pads it with zeros.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    pending: PendingBits,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Creates a new `BitWriter` over a byte sink.
    #[must_use]
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            pending: PendingBits::empty(),
            bytes_written: 0,
        }
    }

    /// Returns the pending partial byte.
    #[must_use]
    pub const fn pending(&self) -> PendingBits {
        self.pending
    }

    /// Returns the number of bytes emitted to the sink so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the number of bits written so far, pending ones included.
    #[must_use]
    pub const fn bits_written(&self) -> u64 {
        self.bytes_written * 8 + self.pending.len as u64
    }

    /// Returns `true` if no partial byte is pending.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.pending.is_empty()
    }

    /// Borrows the underlying sink.
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Writes a single bit.
    pub fn write_bool(&mut self, value: bool) -> BitResult<()> {
        self.write_field(&[u8::from(value)], 1)
    }

    /// Writes up to 64 bits from an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        let bits = bits as usize;
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }
        let bytes = value.to_be_bytes();
        self.write_field(&bytes[8 - bits.div_ceil(8)..], bits)
    }

    /// Writes the `bits` low bits of a right-aligned big-endian value.
    ///
    /// `value` must be exactly `ceil(bits / 8)` bytes long with the unused
    /// high bits of its first byte cleared. The value is shifted left by
    /// [`shift_left_by`] so that it ends on a byte boundary, merged with the
    /// pending bits, and every complete byte is emitted.
    pub fn write_field(&mut self, value: &[u8], bits: usize) -> BitResult<()> {
        if bits == 0 {
            return Ok(());
        }
        let value_len = bits.div_ceil(8);
        if value.len() != value_len {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: value.len() * 8,
            });
        }
        let excess = value_len * 8 - bits;
        if excess > 0 && value[0] >> (8 - excess) != 0 {
            return Err(BitError::ValueOutOfRange {
                value: u64::from(value[0]),
                bits: 8 - excess,
            });
        }

        let rest_len = self.pending.len as usize;
        let pad = shift_left_by(7 - self.pending.len, bits);
        let span_len = (rest_len + bits + pad as usize) / 8;

        let mut span = vec![0u8; span_len];
        span[span_len - value_len..].copy_from_slice(value);
        shl_bytes(&mut span, pad);
        span[0] |= self.pending.rest;

        if pad == 0 {
            self.emit(&span)?;
            self.pending = PendingBits::empty();
        } else {
            self.emit(&span[..span_len - 1])?;
            self.pending = PendingBits {
                rest: span[span_len - 1],
                len: 8 - pad,
            };
        }
        Ok(())
    }

    /// Emits the pending partial byte, padding its low bits with zeros.
    ///
    /// Returns the number of padding bits written (0 if already aligned).
    pub fn align_to_byte(&mut self) -> BitResult<u8> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let padding = 8 - self.pending.len;
        let rest = self.pending.rest;
        self.emit(&[rest])?;
        self.pending = PendingBits::empty();
        Ok(padding)
    }

    /// Emits any pending partial byte and flushes the sink.
    ///
    /// Calling this repeatedly is harmless.
    pub fn flush(&mut self) -> BitResult<()> {
        self.align_to_byte()?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(mut self) -> BitResult<W> {
        BitWriter::flush(&mut self)?;
        Ok(self.inner)
    }

    fn emit(&mut self, bytes: &[u8]) -> BitResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.inner.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

impl<W: Write> Write for BitWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.pending.is_empty() {
            return Err(BitError::Unaligned {
                pending_bits: self.pending.len,
            }
            .into());
        }
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        BitWriter::flush(self).map_err(io::Error::from)
    }
}
