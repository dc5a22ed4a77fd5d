/// Bluetooth SIG Health Thermometer measurement decoding (0x2A1C / 0x2A1E)
use log::{debug, warn};

use super::ieee11073::decode_float32;
use crate::error::DecodeError;
use crate::models::{MeasurementLocation, TemperatureReading, TemperatureUnit};

const FLAG_FAHRENHEIT: u8 = 0x01;
const FLAG_TIMESTAMP: u8 = 0x02;
const FLAG_TEMPERATURE_TYPE: u8 = 0x04;

const MIN_FRAME_LEN: usize = 5;
const TIMESTAMP_LEN: usize = 7;

// The supported thermometer (FT95) measures at the forehead
const DEFAULT_LOCATION: MeasurementLocation = MeasurementLocation::Forehead;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

impl TemperatureReading {
    pub fn from_celsius(celsius: f64, location: MeasurementLocation) -> Self {
        TemperatureReading {
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
            location,
            unit: TemperatureUnit::Celsius,
            valid: celsius.is_finite(),
        }
    }

    pub fn from_fahrenheit(fahrenheit: f64, location: MeasurementLocation) -> Self {
        TemperatureReading {
            celsius: fahrenheit_to_celsius(fahrenheit),
            fahrenheit,
            location,
            unit: TemperatureUnit::Fahrenheit,
            valid: fahrenheit.is_finite(),
        }
    }
}

/// Decode a temperature measurement
///
/// Layout:
/// - Byte 0: flags (bit0 unit, bit1 timestamp present, bit2 type present)
/// - Bytes 1-4: temperature (IEEE-11073 FLOAT)
/// - Optional: timestamp (7 bytes), temperature type (1 byte)
///
/// The optional fields are only walked for length. A reading whose flagged
/// fields overrun the payload is still returned, marked invalid.
pub fn decode_thermometer(bytes: &[u8]) -> Result<TemperatureReading, DecodeError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(DecodeError::InsufficientData {
            needed: MIN_FRAME_LEN,
            available: bytes.len(),
        });
    }

    let flags = bytes[0];
    let value = decode_float32(bytes, 1)?;

    let mut expected_len = MIN_FRAME_LEN;
    if flags & FLAG_TIMESTAMP != 0 {
        expected_len += TIMESTAMP_LEN;
    }
    if flags & FLAG_TEMPERATURE_TYPE != 0 {
        expected_len += 1;
    }

    let mut reading = if flags & FLAG_FAHRENHEIT != 0 {
        TemperatureReading::from_fahrenheit(value, DEFAULT_LOCATION)
    } else {
        TemperatureReading::from_celsius(value, DEFAULT_LOCATION)
    };

    if bytes.len() < expected_len {
        warn!(
            "Temperature frame flags 0x{:02X} announce {} bytes, got {}",
            flags,
            expected_len,
            bytes.len()
        );
        reading.valid = false;
    }

    debug!(
        "Temperature reading: {:.2}°C / {:.2}°F (flags 0x{:02X})",
        reading.celsius, reading.fahrenheit, flags
    );

    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn decodes_celsius_reading() {
        let frame = [0x00, 0x6D, 0x01, 0x00, 0xFF];
        let reading = decode_thermometer(&frame).unwrap();
        assert_eq!(reading.unit, TemperatureUnit::Celsius);
        assert!(approx(reading.celsius, 36.5));
        assert!(approx(reading.fahrenheit, 97.7));
        assert_eq!(reading.location, MeasurementLocation::Forehead);
        assert!(reading.valid);
    }

    #[test]
    fn decodes_fahrenheit_reading_with_optional_fields() {
        // 98.6 °F = mantissa 986, exponent -1
        let mut frame = vec![0x07, 0xDA, 0x03, 0x00, 0xFF];
        frame.extend_from_slice(&[0xE8, 0x07, 0x0A, 0x10, 0x08, 0x1E, 0x00]);
        frame.push(0x02);
        let reading = decode_thermometer(&frame).unwrap();
        assert_eq!(reading.unit, TemperatureUnit::Fahrenheit);
        assert!(approx(reading.fahrenheit, 98.6));
        assert!(approx(reading.celsius, 37.0));
        assert!(reading.valid);
    }

    #[test]
    fn marks_overrun_optional_fields_invalid() {
        let frame = [0x02, 0x6D, 0x01, 0x00, 0xFF];
        let reading = decode_thermometer(&frame).unwrap();
        assert!(!reading.valid);
        assert!(approx(reading.celsius, 36.5));
    }

    #[test]
    fn rejects_truncated_frame() {
        assert_eq!(
            decode_thermometer(&[0x00, 0x6D, 0x01, 0x00]),
            Err(DecodeError::InsufficientData { needed: 5, available: 4 })
        );
        assert!(decode_thermometer(&[]).is_err());
    }
}
