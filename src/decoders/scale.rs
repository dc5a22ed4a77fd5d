/// Mi Scale body composition measurement decoding (characteristic 0x2A9C)
use log::debug;

use crate::error::DecodeError;
use crate::models::ScaleRawSample;

pub const MIN_FRAME_LEN: usize = 8;

/// Decode a scale notification into weight and impedance
///
/// Layout:
/// - Byte 0: control flags (not used here)
/// - Bytes 1-2: weight (unsigned 16-bit LE, 0.01 kg resolution)
/// - Bytes 3-4: impedance (unsigned 16-bit LE, Ohm)
/// - Bytes 5-7: remainder of the frame (not used here)
pub fn parse_scale(bytes: &[u8]) -> Result<ScaleRawSample, DecodeError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(DecodeError::InsufficientData {
            needed: MIN_FRAME_LEN,
            available: bytes.len(),
        });
    }

    let weight_raw = u16::from_le_bytes([bytes[1], bytes[2]]);
    let impedance_raw = u16::from_le_bytes([bytes[3], bytes[4]]);

    Ok(ScaleRawSample {
        weight_kg: f64::from(weight_raw) / 100.0,
        impedance_ohm: f64::from(impedance_raw),
    })
}

/// Returns `None` when the frame is too short
pub fn decode_scale(bytes: &[u8]) -> Option<ScaleRawSample> {
    match parse_scale(bytes) {
        Ok(sample) => Some(sample),
        Err(e) => {
            debug!("Dropping scale frame {:02x?}: {}", bytes, e);
            None
        }
    }
}
