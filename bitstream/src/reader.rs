//! Bit-level reader over a blocking byte source.

use std::io::{self, Read};

use crate::error::{BitError, BitResult};
use crate::shift::{low_mask, shift_left_by, shr_bytes};

/// Position inside the byte currently being consumed.
///
/// The cursor is either empty (the next bit starts a fresh byte) or holds the
/// last byte pulled from the source together with the number of its low bits
/// that have not been consumed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitCursor {
    current: u8,
    remaining: u8,
}

impl BitCursor {
    /// A cursor with no partially consumed byte.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            current: 0,
            remaining: 0,
        }
    }

    /// The byte the cursor points into.
    #[must_use]
    pub const fn current_byte(self) -> u8 {
        self.current
    }

    /// Unconsumed bits left in the current byte (0 when empty).
    #[must_use]
    pub const fn bits_remaining(self) -> u8 {
        self.remaining
    }

    /// Returns `true` if the next bit starts a fresh byte.
    #[must_use]
    pub const fn is_aligned(self) -> bool {
        self.remaining == 0
    }

    /// Position (7 = MSB) of the next bit to be read.
    #[must_use]
    pub const fn bit_index(self) -> u8 {
        if self.remaining == 0 {
            7
        } else {
            self.remaining - 1
        }
    }
}

/// A bit-level reader that pulls MSB-first bits from a [`Read`] source.
///
/// The cursor survives across calls, so a value that ends mid-byte leaves the
/// rest of that byte for the next read. Byte-level access through the [`Read`]
/// impl is only allowed while the cursor is aligned.
#[derive(Debug)]
pub struct BitReader<R> {
    inner: R,
    cursor: BitCursor,
    bytes_read: u64,
}

impl<R: Read> BitReader<R> {
    /// Creates a new `BitReader` over a byte source.
    #[must_use]
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            cursor: BitCursor::empty(),
            bytes_read: 0,
        }
    }

    /// Returns the current cursor state.
    #[must_use]
    pub const fn cursor(&self) -> BitCursor {
        self.cursor
    }

    /// Returns the number of bytes pulled from the source so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns `true` if no partially consumed byte is pending.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.cursor.is_aligned()
    }

    /// Borrows the underlying source.
    pub const fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwraps the reader, dropping any partially consumed byte.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Discards the unread bits of the current byte.
    ///
    /// Returns the number of bits that were dropped.
    pub fn align_to_byte(&mut self) -> u8 {
        let dropped = self.cursor.remaining;
        self.cursor = BitCursor::empty();
        dropped
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads up to 64 bits as an unsigned integer.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        let bytes = self.read_field(bits as usize)?;
        Ok(bytes
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
    }

    /// Reads `bits` bits and returns them right-aligned in `ceil(bits / 8)`
    /// big-endian bytes.
    ///
    /// The bytes touched by the value are pulled as one span, the bits already
    /// consumed from the first byte are masked off and the span is shifted
    /// right by [`shift_left_by`] so the value's last bit lands on bit 0.
    pub fn read_field(&mut self, bits: usize) -> BitResult<Vec<u8>> {
        if bits == 0 {
            return Ok(Vec::new());
        }
        let remaining = self.cursor.remaining;
        let consumed = if remaining == 0 {
            0
        } else {
            8 - remaining as usize
        };
        let pad = shift_left_by(self.cursor.bit_index(), bits);
        let span_len = (consumed + bits + pad as usize) / 8;

        let mut span = vec![0u8; span_len];
        let carried = if remaining > 0 {
            span[0] = self.cursor.current & low_mask(remaining);
            1
        } else {
            0
        };
        self.fill(&mut span[carried..], bits, remaining as usize)?;

        let last = span[span_len - 1];
        shr_bytes(&mut span, pad);
        self.cursor = if pad > 0 {
            BitCursor {
                current: last,
                remaining: pad,
            }
        } else {
            BitCursor::empty()
        };

        let value_len = bits.div_ceil(8);
        span.drain(..span_len - value_len);
        Ok(span)
    }

    fn fill(&mut self, buf: &mut [u8], requested: usize, carried_bits: usize) -> BitResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(BitError::UnexpectedEof {
                        requested,
                        available: carried_bits + filled * 8,
                    });
                }
                Ok(n) => {
                    filled += n;
                    self.bytes_read += n as u64;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for BitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.cursor.is_aligned() {
            return Err(BitError::Unaligned {
                pending_bits: self.cursor.remaining,
            }
            .into());
        }
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl From<BitError> for io::Error {
    fn from(err: BitError) -> Self {
        match err {
            BitError::Io(inner) => inner,
            BitError::UnexpectedEof { .. } => Self::new(io::ErrorKind::UnexpectedEof, err),
            other => Self::new(io::ErrorKind::InvalidInput, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reader() {
        let reader = BitReader::new(&[][..]);
        assert!(reader.is_aligned());
        assert_eq!(reader.bytes_read(), 0);
        assert_eq!(reader.cursor(), BitCursor::empty());
    }

    #[test]
    fn read_from_empty_fails() {
        let mut reader = BitReader::new(&[][..]);
        let result = reader.read_bit();
        assert!(matches!(
            result,
            Err(BitError::UnexpectedEof {
                requested: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn read_bits_across_bytes() {
        let mut reader = BitReader::new(&[0b1111_0000, 0b0000_1111][..]);
        assert_eq!(reader.read_bits(12).unwrap(), 0b1111_0000_0000);
        assert_eq!(reader.cursor().bits_remaining(), 4);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1111);
        assert!(reader.is_aligned());
    }

    #[test]
    fn two_twelve_bit_values() {
        let mut reader = BitReader::new(&[0x00, 0x18, 0x00][..]);
        assert_eq!(reader.read_bits(12).unwrap(), 1);
        assert_eq!(reader.read_bits(12).unwrap(), 2048);
        assert_eq!(reader.bytes_read(), 3);
    }

    #[test]
    fn read_field_is_right_aligned() {
        let mut reader = BitReader::new(&[0b1010_1100, 0b0101_0000][..]);
        assert_eq!(reader.read_field(3).unwrap(), vec![0b101]);
        assert_eq!(reader.read_field(9).unwrap(), vec![0x00, 0b1100_0101]);
    }

    #[test]
    fn eof_mid_field_reports_available_bits() {
        let mut reader = BitReader::new(&[0xFF][..]);
        reader.read_bits(3).unwrap();
        let err = reader.read_bits(16).unwrap_err();
        assert!(matches!(
            err,
            BitError::UnexpectedEof {
                requested: 16,
                available: 5
            }
        ));
    }

    #[test]
    fn align_drops_pending_bits() {
        let mut reader = BitReader::new(&[0xFF, 0x42][..]);
        reader.read_bits(2).unwrap();
        assert_eq!(reader.align_to_byte(), 6);
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte).unwrap();
        assert_eq!(byte, [0x42]);
    }

    #[test]
    fn byte_read_while_unaligned_fails() {
        let mut reader = BitReader::new(&[0xFF, 0xFF][..]);
        reader.read_bits(1).unwrap();
        let mut byte = [0u8; 1];
        let err = reader.read(&mut byte).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn read_bits_invalid_count() {
        let mut reader = BitReader::new(&[0u8; 16][..]);
        assert!(matches!(
            reader.read_bits(65),
            Err(BitError::InvalidBitCount { bits: 65, .. })
        ));
    }

    #[test]
    fn cursor_bit_index() {
        let mut reader = BitReader::new(&[0u8; 2][..]);
        assert_eq!(reader.cursor().bit_index(), 7);
        reader.read_bits(5).unwrap();
        assert_eq!(reader.cursor().bit_index(), 2);
    }
}
