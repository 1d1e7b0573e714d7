//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: Single byte, bit 8=0, value 0-127
//! - Long form: Initial byte (bit 8=1, bits 7-1=count), followed by length bytes
//! - Indefinite form (0x80): Rejected

use smallvec::SmallVec;

use super::integer::{MAX_INTEGER_BYTES, decode_integer, encode_integer};
use crate::error::{DecodeErrorKind, Error, Result};

/// Encode a length value.
///
/// Uses short form for lengths <= 127, long form otherwise.
pub fn encode_length(len: usize) -> SmallVec<[u8; 9]> {
    let mut out = SmallVec::new();
    if len <= 127 {
        out.push(len as u8);
    } else {
        let body = encode_integer(len as u64);
        out.push(0x80 | body.len() as u8);
        out.extend_from_slice(&body);
    }
    out
}

/// Decode a length from the start of `data`, returning `(length, bytes_consumed)`.
pub fn decode_length(data: &[u8]) -> Result<(usize, usize)> {
    decode_length_at(data, 0)
}

/// Like [`decode_length`], reporting errors relative to `base_offset`.
pub(crate) fn decode_length_at(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::Truncated));
    };

    if first == 0x80 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::IndefiniteLength,
        ));
    }

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let num_octets = (first & 0x7F) as usize;
    if num_octets > MAX_INTEGER_BYTES {
        return Err(Error::decode(base_offset, DecodeErrorKind::IntegerOverflow));
    }
    if data.len() < 1 + num_octets {
        return Err(Error::decode(base_offset, DecodeErrorKind::Truncated));
    }

    let value = decode_integer(&data[1..1 + num_octets])
        .map_err(|_| Error::decode(base_offset, DecodeErrorKind::IntegerOverflow))?;
    let len = usize::try_from(value)
        .map_err(|_| Error::decode(base_offset, DecodeErrorKind::IntegerOverflow))?;
    Ok((len, 1 + num_octets))
}
