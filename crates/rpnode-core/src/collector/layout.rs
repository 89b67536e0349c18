//! Explicit fixed-offset decoding of raw system query buffers.
//!
//! Fields are read byte-by-byte from a declared offset and width in native
//! byte order. Nothing is reinterpreted through pointer casts, so padding and
//! alignment of the C structure only matter through the documented offsets.

use std::fmt;

/// Location of one integer field inside a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub offset: usize,
    /// Width in bytes: 1, 2, 4 or 8.
    pub width: usize,
    /// Two's complement field; negative values are rejected on decode.
    pub signed: bool,
}

/// `struct timeval.tv_sec`: a `time_t` at the start of the record.
///
/// 8 bytes on LP64 FreeBSD/DragonFly/macOS, 4 bytes where `time_t` is 32-bit
/// (e.g. FreeBSD/i386).
#[cfg(unix)]
pub const TIMEVAL_SEC: FieldLayout = FieldLayout::signed(
    std::mem::offset_of!(libc::timeval, tv_sec),
    std::mem::size_of::<libc::time_t>(),
);

#[cfg(not(unix))]
pub const TIMEVAL_SEC: FieldLayout = FieldLayout::signed(0, 8);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer ends before the field does.
    ShortBuffer { need: usize, got: usize },
    UnsupportedWidth(usize),
    /// Signed field holds a negative value.
    Negative(i64),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::ShortBuffer { need, got } => {
                write!(f, "buffer too short: need {} bytes, got {}", need, got)
            }
            DecodeError::UnsupportedWidth(w) => write!(f, "unsupported field width {}", w),
            DecodeError::Negative(v) => write!(f, "negative value {}", v),
        }
    }
}

impl std::error::Error for DecodeError {}

impl FieldLayout {
    pub const fn unsigned(offset: usize, width: usize) -> Self {
        Self {
            offset,
            width,
            signed: false,
        }
    }

    pub const fn signed(offset: usize, width: usize) -> Self {
        Self {
            offset,
            width,
            signed: true,
        }
    }

    /// Reads the field out of `buf` as a non-negative integer.
    pub fn decode(&self, buf: &[u8]) -> Result<u64, DecodeError> {
        let need = self.offset + self.width;
        let bytes = buf.get(self.offset..need).ok_or(DecodeError::ShortBuffer {
            need,
            got: buf.len(),
        })?;

        let raw = match self.width {
            1 => bytes[0] as u64,
            2 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u64,
            4 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64,
            8 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(bytes);
                u64::from_ne_bytes(b)
            }
            w => return Err(DecodeError::UnsupportedWidth(w)),
        };

        if !self.signed {
            return Ok(raw);
        }

        // Sign-extend from the field width.
        let shift = 64 - 8 * self.width as u32;
        let value = ((raw << shift) as i64) >> shift;
        if value < 0 {
            return Err(DecodeError::Negative(value));
        }
        Ok(value as u64)
    }

    /// Writes `value` at this field's position; used to build fixtures.
    pub fn encode(&self, buf: &mut [u8], value: i64) {
        let bytes = value.to_ne_bytes();
        let range = if cfg!(target_endian = "little") {
            0..self.width
        } else {
            8 - self.width..8
        };
        buf[self.offset..self.offset + self.width].copy_from_slice(&bytes[range]);
    }
}
