use serde::{Serialize, Serializer};
use std::fmt;
use time::OffsetDateTime;

const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Expand a 16-bit Bluetooth SIG short UUID into its 128-bit form
pub const fn sig_uuid(short: u16) -> u128 {
    BLUETOOTH_BASE_UUID | ((short as u128) << 96)
}

// Nordic UART TX characteristic used by the OxySmart pulse oximeter
pub const NORDIC_UART_TX_UUID: u128 = 0x6e400003_b5a3_f393_e0a9_e50e24dcca9e;

/// Which GATT characteristic a notification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    ScaleMeasurement,
    BpMeasurement,
    BpIntermediateCuff,
    TempMeasurement,
    TempIntermediate,
    OximeterFrame,
}

impl CharacteristicKind {
    pub const ALL: [CharacteristicKind; 6] = [
        CharacteristicKind::ScaleMeasurement,
        CharacteristicKind::BpMeasurement,
        CharacteristicKind::BpIntermediateCuff,
        CharacteristicKind::TempMeasurement,
        CharacteristicKind::TempIntermediate,
        CharacteristicKind::OximeterFrame,
    ];

    pub fn uuid(self) -> u128 {
        match self {
            CharacteristicKind::ScaleMeasurement => sig_uuid(0x2A9C),
            CharacteristicKind::BpMeasurement => sig_uuid(0x2A35),
            CharacteristicKind::BpIntermediateCuff => sig_uuid(0x2A36),
            CharacteristicKind::TempMeasurement => sig_uuid(0x2A1C),
            CharacteristicKind::TempIntermediate => sig_uuid(0x2A1E),
            CharacteristicKind::OximeterFrame => NORDIC_UART_TX_UUID,
        }
    }

    pub fn from_uuid(uuid: u128) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.uuid() == uuid)
    }

    pub fn label(self) -> &'static str {
        match self {
            CharacteristicKind::ScaleMeasurement => "scale",
            CharacteristicKind::BpMeasurement => "blood pressure",
            CharacteristicKind::BpIntermediateCuff => "intermediate cuff pressure",
            CharacteristicKind::TempMeasurement => "temperature",
            CharacteristicKind::TempIntermediate => "intermediate temperature",
            CharacteristicKind::OximeterFrame => "pulse oximeter",
        }
    }
}

/// One notification as delivered by the BLE transport
#[derive(Debug, Clone)]
pub struct RawCharacteristicPayload {
    pub device_address: String,
    pub kind: CharacteristicKind,
    pub bytes: Vec<u8>,
    pub received_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRawSample {
    pub weight_kg: f64,
    pub impedance_ohm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BloodPressureStandard {
    #[default]
    Eu,
    Us,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BloodPressureCategory {
    Normal,
    #[serde(rename = "High-Normal")]
    HighNormal,
    #[serde(rename = "Grade_1")]
    Grade1,
    #[serde(rename = "Grade_2")]
    Grade2,
    Unknown,
}

impl fmt::Display for BloodPressureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BloodPressureCategory::Normal => "Normal",
            BloodPressureCategory::HighNormal => "High-Normal",
            BloodPressureCategory::Grade1 => "Grade_1",
            BloodPressureCategory::Grade2 => "Grade_2",
            BloodPressureCategory::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloodPressureReading {
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub mov: i32, // body movement during measurement
    pub ihb: i32, // irregular heartbeat
    pub category: BloodPressureCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementLocation {
    Unknown,
    Body,
    Forehead,
    Ear,
    Mouth,
    Rectum,
    Armpit,
    Object,
    RoomAmbient,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub celsius: f64,
    pub fahrenheit: f64,
    pub location: MeasurementLocation,
    pub unit: TemperatureUnit,
    pub valid: bool,
}

/// Plethysmogram-derived signal quality of an oximetry frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    NoSignal,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseOximetryReading {
    pub spo2_percent: i32,
    pub pulse_rate_bpm: i32,
    pub plethysmogram: Vec<u8>,
    pub signal_quality: SignalQuality,
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Spo2Category {
    Normal,
    Acceptable,
    Low,
    Critical,
    Unknown,
}

impl fmt::Display for Spo2Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PulseRateCategory {
    Bradycardia,
    Normal,
    Tachycardia,
    #[serde(rename = "Severe Tachycardia")]
    SevereTachycardia,
}

impl fmt::Display for PulseRateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulseRateCategory::SevereTachycardia => f.write_str("Severe Tachycardia"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

/// Decoded device-specific part of a reading
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Scale(ScaleRawSample),
    BloodPressure(BloodPressureReading),
    Temperature(TemperatureReading),
    PulseOximetry(PulseOximetryReading),
}

/// A decoded and classified reading, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReading {
    pub device_address: String,
    pub device_name: String,
    pub timestamp: OffsetDateTime,
    pub measurement: Measurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{}'", other)),
        }
    }
}

/// Inputs for one body composition computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserProfile {
    pub weight: f64, // kg
    pub height: u32, // cm
    pub age: u32,    // years
    pub sex: Sex,
}

/// Fat mass delta towards the reference fat percentage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FatMassToIdeal {
    Gain(f64),
    Lose(f64),
    Unknown,
}

impl fmt::Display for FatMassToIdeal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatMassToIdeal::Gain(kg) => write!(f, "to_gain:{:.1}", kg),
            FatMassToIdeal::Lose(kg) => write!(f, "to_lose:{:.1}", kg),
            FatMassToIdeal::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for FatMassToIdeal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyComposition {
    pub bmi: f64,
    pub fat_percentage: f64,
    pub water_percentage: f64,
    pub bone_mass: f64,
    pub muscle_mass: f64,
    pub visceral_fat: f64,
    pub bmr: f64,
    pub protein_percentage: f64,
    pub body_type: u8,
    pub metabolic_age: f64,
    pub ideal_weight: f64,
    pub fat_mass_to_ideal: FatMassToIdeal,
    pub lean_body_mass: f64,
}

/// A body composition attributed to a user, ready for publishing
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCompositionRecord {
    pub device_address: String,
    pub device_name: String,
    pub timestamp: OffsetDateTime,
    pub user: String,
    pub profile: UserProfile,
    pub impedance: f64,
    pub composition: BodyComposition,
}

/// What the assembly layer hands to the publishing boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Reading(HealthReading),
    Composition(BodyCompositionRecord),
}
