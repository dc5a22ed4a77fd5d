/// Bluetooth SIG Blood Pressure measurement decoding (0x2A35 / 0x2A36)
use log::{debug, warn};

use super::ieee11073::decode_sfloat16;
use crate::classify::categorize_blood_pressure;
use crate::error::DecodeError;
use crate::models::{BloodPressureReading, BloodPressureStandard};

const FLAG_UNIT_KPA: u8 = 0x01;
const FLAG_TIMESTAMP: u8 = 0x02;
const FLAG_PULSE_RATE: u8 = 0x04;
const FLAG_USER_ID: u8 = 0x08;
const FLAG_MEASUREMENT_STATUS: u8 = 0x10;

const STATUS_BODY_MOVEMENT: u16 = 0x0001;
const STATUS_IRREGULAR_PULSE: u16 = 0x0004;

const MIN_FRAME_LEN: usize = 7;
const TIMESTAMP_LEN: usize = 7;

pub const KPA_TO_MMHG: f64 = 7.50062;

/// Decode a blood pressure measurement and classify it
///
/// Layout:
/// - Byte 0: flags (bit0 kPa, bit1 timestamp, bit2 pulse rate, bit3 user id,
///   bit4 measurement status)
/// - Bytes 1-2 / 3-4 / 5-6: systolic, diastolic, mean arterial pressure (SFLOAT)
/// - Optional, in order: timestamp (7 bytes), pulse rate (SFLOAT), user id
///   (1 byte), measurement status (16-bit LE)
///
/// Pressures given in kPa are converted to mmHg before classification.
/// Optional fields that run past the payload are left at zero.
pub fn decode_blood_pressure(
    bytes: &[u8],
    standard: BloodPressureStandard,
) -> Result<BloodPressureReading, DecodeError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(DecodeError::InsufficientData {
            needed: MIN_FRAME_LEN,
            available: bytes.len(),
        });
    }

    let flags = bytes[0];
    let systolic = decode_sfloat16(bytes, 1)?;
    let diastolic = decode_sfloat16(bytes, 3)?;
    let mean_arterial_pressure = decode_sfloat16(bytes, 5)?;

    let (systolic, diastolic) = if flags & FLAG_UNIT_KPA != 0 {
        (systolic * KPA_TO_MMHG, diastolic * KPA_TO_MMHG)
    } else {
        (systolic, diastolic)
    };

    let mut offset = MIN_FRAME_LEN;
    if flags & FLAG_TIMESTAMP != 0 {
        offset += TIMESTAMP_LEN;
    }

    let mut pulse = 0;
    if flags & FLAG_PULSE_RATE != 0 {
        match decode_sfloat16(bytes, offset) {
            Ok(rate) => pulse = rate as i32,
            Err(e) => warn!("Pulse rate flagged but missing: {}", e),
        }
        offset += 2;
    }

    if flags & FLAG_USER_ID != 0 {
        offset += 1;
    }

    let (mut mov, mut ihb) = (0, 0);
    if flags & FLAG_MEASUREMENT_STATUS != 0 {
        match bytes.get(offset..offset + 2) {
            Some(&[lo, hi]) => {
                let status = u16::from_le_bytes([lo, hi]);
                mov = i32::from(status & STATUS_BODY_MOVEMENT != 0);
                ihb = i32::from(status & STATUS_IRREGULAR_PULSE != 0);
            }
            _ => warn!("Measurement status flagged but missing at offset {}", offset),
        }
    }

    // Device values are whole mmHg; truncate like the cuff display does
    let systolic = systolic as i32;
    let diastolic = diastolic as i32;
    let category = categorize_blood_pressure(systolic, diastolic, standard);

    debug!(
        "Blood pressure: {}/{} mmHg (MAP {:.1}), pulse {}, category {}",
        systolic, diastolic, mean_arterial_pressure, pulse, category
    );

    Ok(BloodPressureReading {
        systolic,
        diastolic,
        pulse,
        mov,
        ihb,
        category,
    })
}
