//! Integer primitives.
//!
//! SNMP carries two integer flavours on the wire. Counters, gauges, time
//! ticks and long-form lengths use a minimal big-endian unsigned form with no
//! sign byte. `INTEGER` values use minimal two's complement.

use smallvec::SmallVec;

use crate::error::{DecodeErrorKind, Error, Result};

/// Widest integer content accepted on the wire.
pub const MAX_INTEGER_BYTES: usize = 8;

/// Encode an unsigned integer in minimal big-endian form.
///
/// Zero encodes as a single `0x00` byte. No sign byte is added, so values
/// with the high bit set keep their natural width (`0xFFFFFFFF` is 4 bytes).
pub fn encode_integer(value: u64) -> SmallVec<[u8; 8]> {
    let bytes = value.to_be_bytes();
    let skip = (value.leading_zeros() as usize / 8).min(7);
    SmallVec::from_slice(&bytes[skip..])
}

/// Decode a big-endian unsigned integer of at most 8 bytes.
///
/// Empty input decodes as zero.
pub fn decode_integer(data: &[u8]) -> Result<u64> {
    if data.len() > MAX_INTEGER_BYTES {
        return Err(Error::decode(0, DecodeErrorKind::IntegerOverflow));
    }
    Ok(data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Encode a signed integer in minimal two's-complement form.
pub fn encode_signed(value: i64) -> SmallVec<[u8; 8]> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    if value >= 0 {
        // Skip leading 0x00 bytes, keeping one if the next byte would read as negative
        while start < 7 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        // Skip leading 0xFF bytes, keeping one if the next byte would read as positive
        while start < 7 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }
    SmallVec::from_slice(&bytes[start..])
}

/// Decode a two's-complement integer of 1 to 8 bytes, sign-extending.
pub fn decode_signed(data: &[u8]) -> Result<i64> {
    if data.is_empty() {
        return Err(Error::decode(0, DecodeErrorKind::ZeroLengthInteger));
    }
    if data.len() > MAX_INTEGER_BYTES {
        return Err(Error::decode(0, DecodeErrorKind::IntegerOverflow));
    }
    let init: i64 = if data[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(data
        .iter()
        .fold(init, |acc, &b| (acc << 8) | i64::from(b)))
}
