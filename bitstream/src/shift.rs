//! Bit offset arithmetic shared by the reader and the writer.

/// Returns how far a field must be shifted left so that it ends on a byte
/// boundary.
///
/// `bit_index` is the position of the first field bit inside its byte, where
/// 7 is the most significant bit and 0 the least. A field of `bit_len` bits
/// that starts there ends `shift_left_by(bit_index, bit_len)` bits short of the
/// next byte boundary.
///
/// ```
/// use bitstream::shift_left_by;
///
/// assert_eq!(shift_left_by(0, 2), 7);
/// assert_eq!(shift_left_by(7, 32), 0);
/// assert_eq!(shift_left_by(7, 41), 7);
/// ```
#[must_use]
pub const fn shift_left_by(bit_index: u8, bit_len: usize) -> u8 {
    debug_assert!(bit_index < 8);
    let used = (7 - bit_index as usize + bit_len) % 8;
    ((8 - used) % 8) as u8
}

/// Mask selecting the `bits` least significant bits of a byte.
#[must_use]
pub(crate) const fn low_mask(bits: u8) -> u8 {
    if bits >= 8 {
        0xFF
    } else {
        (1u8 << bits) - 1
    }
}

/// Shifts a big-endian byte buffer left by `shift` (< 8) bits in place.
pub(crate) fn shl_bytes(buf: &mut [u8], shift: u8) {
    if shift == 0 {
        return;
    }
    let len = buf.len();
    for i in 0..len {
        let carry = if i + 1 < len {
            buf[i + 1] >> (8 - shift)
        } else {
            0
        };
        buf[i] = (buf[i] << shift) | carry;
    }
}

/// Shifts a big-endian byte buffer right by `shift` (< 8) bits in place.
pub(crate) fn shr_bytes(buf: &mut [u8], shift: u8) {
    if shift == 0 {
        return;
    }
    for i in (0..buf.len()).rev() {
        let carry = if i > 0 { buf[i - 1] << (8 - shift) } else { 0 };
        buf[i] = (buf[i] >> shift) | carry;
    }
}
