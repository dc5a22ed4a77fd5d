/// OxySmart pulse oximeter frame decoding (Nordic UART TX notifications)
use log::{debug, warn};

use crate::classify::signal_quality;
use crate::error::DecodeError;
use crate::models::PulseOximetryReading;

pub const FRAME_LEN: usize = 11;
pub const FRAME_HEADER: [u8; 5] = [0xAA, 0x55, 0x0F, 0x07, 0x02];

/// Decode one 11-byte oximeter frame
///
/// Layout:
/// - Bytes 0-4: fixed header `AA 55 0F 07 02`
/// - Bytes 5-9: plethysmogram samples, biased by 128 above 127
/// - Byte 10: SpO2 in the low 7 bits (+70), pulse rate in the high nibble (x10 +60)
///
/// The trailing-byte layout is a compatibility mapping that has not been
/// confirmed against captures from the real device.
pub fn parse_oximeter_frame(bytes: &[u8]) -> Result<PulseOximetryReading, DecodeError> {
    if bytes.len() < FRAME_LEN {
        return Err(DecodeError::InsufficientData {
            needed: FRAME_LEN,
            available: bytes.len(),
        });
    }
    if bytes.len() > FRAME_LEN {
        return Err(DecodeError::LengthMismatch {
            expected: FRAME_LEN,
            available: bytes.len(),
        });
    }
    if bytes[..5] != FRAME_HEADER {
        return Err(DecodeError::MalformedHeader {
            expected: FRAME_HEADER.to_vec(),
            found: bytes[..5].to_vec(),
        });
    }

    let plethysmogram: Vec<u8> = bytes[5..10]
        .iter()
        .map(|&sample| if sample > 127 { sample - 128 } else { sample })
        .collect();

    let last = bytes[10];
    let (spo2, pulse_rate) = if last > 0 {
        (
            i32::from(last & 0x7F) + 70,
            i32::from((last & 0xF0) >> 4) * 10 + 60,
        )
    } else {
        (0, 0)
    };

    let reading = PulseOximetryReading {
        spo2_percent: spo2.clamp(0, 100),
        pulse_rate_bpm: pulse_rate.clamp(0, 200),
        signal_quality: signal_quality(&plethysmogram),
        plethysmogram,
        valid: spo2 > 0 && pulse_rate > 0,
    };

    debug!(
        "Pulse oximetry: SpO2 {}%, pulse {} BPM, quality {:?}",
        reading.spo2_percent, reading.pulse_rate_bpm, reading.signal_quality
    );

    Ok(reading)
}

/// Returns `None` for frames of the wrong length or with a foreign header
pub fn decode_pulse_oximeter(bytes: &[u8]) -> Option<PulseOximetryReading> {
    match parse_oximeter_frame(bytes) {
        Ok(reading) => Some(reading),
        Err(e) => {
            warn!("Invalid pulse oximeter frame {:02x?}: {}", bytes, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalQuality;

    fn frame(samples: [u8; 5], last: u8) -> Vec<u8> {
        let mut frame = FRAME_HEADER.to_vec();
        frame.extend_from_slice(&samples);
        frame.push(last);
        frame
    }

    #[test]
    fn decodes_valid_frame() {
        // low 7 bits 0x1B -> 27 + 70 = 97, high nibble 0x1 -> 70 BPM
        let reading = decode_pulse_oximeter(&frame([10, 40, 70, 40, 10], 0x1B)).unwrap();
        assert_eq!(reading.spo2_percent, 97);
        assert_eq!(reading.pulse_rate_bpm, 70);
        assert!(reading.valid);
        assert_eq!(reading.plethysmogram, vec![10, 40, 70, 40, 10]);
        assert_eq!(reading.signal_quality, SignalQuality::Excellent);
    }

    #[test]
    fn recentres_biased_samples() {
        let reading = decode_pulse_oximeter(&frame([0x80, 0xFF, 0x7F, 0x00, 0x90], 0x1B)).unwrap();
        assert_eq!(reading.plethysmogram, vec![0, 127, 127, 0, 16]);
    }

    #[test]
    fn clamps_spo2_to_percent() {
        // low 7 bits 0x7F -> 127 + 70 = 197, high nibble 0xF -> 210 BPM
        let reading = decode_pulse_oximeter(&frame([1, 1, 1, 1, 1], 0xFF)).unwrap();
        assert_eq!(reading.spo2_percent, 100);
        assert_eq!(reading.pulse_rate_bpm, 200);
        assert_eq!(reading.signal_quality, SignalQuality::NoSignal);
    }

    #[test]
    fn zero_trailing_byte_is_invalid() {
        let reading = decode_pulse_oximeter(&frame([10, 40, 70, 40, 10], 0x00)).unwrap();
        assert!(!reading.valid);
        assert_eq!(reading.spo2_percent, 0);
        assert_eq!(reading.pulse_rate_bpm, 0);
    }

    #[test]
    fn rejects_wrong_header_and_length() {
        let mut bad = frame([1, 2, 3, 4, 5], 0x1B);
        bad[1] = 0x56;
        assert!(matches!(
            parse_oximeter_frame(&bad),
            Err(DecodeError::MalformedHeader { .. })
        ));
        assert_eq!(decode_pulse_oximeter(&bad), None);

        let short = &frame([1, 2, 3, 4, 5], 0x1B)[..10];
        assert_eq!(decode_pulse_oximeter(short), None);
        assert!(decode_pulse_oximeter(&[]).is_none());
    }

    #[test]
    fn distinguishes_short_and_long_frames() {
        let full = frame([1, 2, 3, 4, 5], 0x1B);
        assert_eq!(
            parse_oximeter_frame(&full[..10]),
            Err(DecodeError::InsufficientData { needed: 11, available: 10 })
        );

        let mut long = full.to_vec();
        long.push(0x00);
        assert_eq!(
            parse_oximeter_frame(&long),
            Err(DecodeError::LengthMismatch { expected: 11, available: 12 })
        );
        assert_eq!(decode_pulse_oximeter(&long), None);
    }
}
