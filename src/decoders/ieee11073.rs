/// IEEE-11073 SFLOAT / FLOAT decoding used by the Bluetooth SIG health profiles
///
/// Reserved mantissa values (NaN 0x07FF, NRes 0x0800, +INF 0x07FE, -INF 0x0802
/// and their 24-bit counterparts) are not special-cased: they decode as the
/// ordinary signed mantissa they encode.
use crate::error::DecodeError;

fn take<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    let needed = offset.checked_add(N).unwrap_or(usize::MAX);
    bytes
        .get(offset..needed)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(DecodeError::InsufficientData {
            needed,
            available: bytes.len(),
        })
}

/// Decode a 16-bit SFLOAT at `offset`
///
/// Layout (little-endian): 12-bit two's-complement mantissa in the low bits,
/// 4-bit two's-complement exponent in the high nibble.
pub fn decode_sfloat16(bytes: &[u8], offset: usize) -> Result<f64, DecodeError> {
    let raw = u16::from_le_bytes(take::<2>(bytes, offset)?);

    // Shift the field to the top of an i16, then arithmetic-shift back down
    let mantissa = ((raw << 4) as i16) >> 4;
    let exponent = (raw as i16) >> 12;

    Ok(f64::from(mantissa) * 10f64.powi(i32::from(exponent)))
}

/// Decode a 32-bit FLOAT at `offset`
///
/// Layout (little-endian): 24-bit two's-complement mantissa, 8-bit
/// two's-complement exponent in the top byte.
pub fn decode_float32(bytes: &[u8], offset: usize) -> Result<f64, DecodeError> {
    let raw = u32::from_le_bytes(take::<4>(bytes, offset)?);

    let mantissa = ((raw << 8) as i32) >> 8;
    let exponent = (raw >> 24) as u8 as i8;

    Ok(f64::from(mantissa) * 10f64.powi(i32::from(exponent)))
}
