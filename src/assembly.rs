/// Reading assembly: dispatch raw payloads to decoders and build records
use log::{info, warn};
use std::collections::HashMap;

use crate::body::{compute_body_composition_with, ScaleTable};
use crate::config::{user_for_weight, BridgeConfig, UserEntry};
use crate::decoders::{decode_blood_pressure, decode_thermometer, parse_oximeter_frame, parse_scale};
use crate::error::AssemblyError;
use crate::models::{
    BloodPressureStandard, BodyCompositionRecord, CharacteristicKind, HealthReading, Measurement,
    RawCharacteristicPayload, Record, ScaleRawSample,
};
use crate::utils::format_datetime;

/// Turns raw characteristic payloads into immutable records
///
/// Holds only read-only configuration, so one assembler can serve any number
/// of payloads in any order.
#[derive(Debug, Clone)]
pub struct ReadingAssembler {
    devices: HashMap<String, String>,
    users: Vec<UserEntry>,
    standard: BloodPressureStandard,
    table: ScaleTable,
}

impl ReadingAssembler {
    pub fn new(
        devices: HashMap<String, String>,
        users: Vec<UserEntry>,
        standard: BloodPressureStandard,
        table: ScaleTable,
    ) -> Self {
        let devices = devices
            .into_iter()
            .map(|(mac, name)| (mac.to_uppercase(), name))
            .collect();
        ReadingAssembler {
            devices,
            users,
            standard,
            table,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            config.devices.clone(),
            config.users.clone(),
            config.bp_standard,
            config.scale_table,
        )
    }

    fn device_name(&self, address: &str) -> String {
        self.devices
            .get(&address.to_uppercase())
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Decode one payload into the records it produces
    ///
    /// A scale sample yields the raw sample and, when a configured user's
    /// weight window matches, a body composition for that user. Every other
    /// characteristic yields exactly one reading.
    pub fn assemble(
        &self,
        payload: &RawCharacteristicPayload,
    ) -> Result<Vec<Record>, AssemblyError> {
        let kind = payload.kind;
        let decode_failed = |source| AssemblyError::Decode {
            kind: kind.label(),
            source,
        };

        let measurement = match kind {
            CharacteristicKind::ScaleMeasurement => {
                Measurement::Scale(parse_scale(&payload.bytes).map_err(decode_failed)?)
            }
            CharacteristicKind::BpMeasurement | CharacteristicKind::BpIntermediateCuff => {
                Measurement::BloodPressure(
                    decode_blood_pressure(&payload.bytes, self.standard).map_err(decode_failed)?,
                )
            }
            CharacteristicKind::TempMeasurement | CharacteristicKind::TempIntermediate => {
                Measurement::Temperature(
                    decode_thermometer(&payload.bytes).map_err(decode_failed)?,
                )
            }
            CharacteristicKind::OximeterFrame => Measurement::PulseOximetry(
                parse_oximeter_frame(&payload.bytes).map_err(decode_failed)?,
            ),
        };

        let reading = HealthReading {
            device_address: payload.device_address.clone(),
            device_name: self.device_name(&payload.device_address),
            timestamp: payload.received_at,
            measurement,
        };
        log_reading(&reading);

        let composition = match &reading.measurement {
            Measurement::Scale(sample) => self.escalate(&reading, sample),
            _ => None,
        };

        let mut records = vec![Record::Reading(reading)];
        records.extend(composition.map(Record::Composition));
        Ok(records)
    }

    /// Attach a body composition for the user whose weight window matches
    fn escalate(
        &self,
        reading: &HealthReading,
        sample: &ScaleRawSample,
    ) -> Option<BodyCompositionRecord> {
        let Some(user) = user_for_weight(&self.users, sample.weight_kg) else {
            info!(
                "No user matches {:.2} kg from {}, publishing raw sample only",
                sample.weight_kg, reading.device_address
            );
            return None;
        };

        // Snapshot the profile at the measured weight
        let profile = user.profile(sample.weight_kg);
        match compute_body_composition_with(&profile, sample.impedance_ohm, self.table) {
            Ok(composition) => {
                info!(
                    "Body composition for {}: BMI {:.1}, fat {:.1}%, muscle {:.1} kg",
                    user.id, composition.bmi, composition.fat_percentage, composition.muscle_mass
                );
                Some(BodyCompositionRecord {
                    device_address: reading.device_address.clone(),
                    device_name: reading.device_name.clone(),
                    timestamp: reading.timestamp,
                    user: user.id.clone(),
                    profile,
                    impedance: sample.impedance_ohm,
                    composition,
                })
            }
            Err(e) => {
                warn!("Not computing body composition for {}: {}", user.id, e);
                None
            }
        }
    }
}

fn log_reading(reading: &HealthReading) {
    let when = format_datetime(&reading.timestamp);
    match &reading.measurement {
        Measurement::Scale(s) => info!(
            "[{}] {} ({}): {:.2} kg, impedance {} Ohm",
            when, reading.device_name, reading.device_address, s.weight_kg, s.impedance_ohm
        ),
        Measurement::BloodPressure(bp) => info!(
            "[{}] {} ({}): {}/{} mmHg, pulse {}, {}",
            when,
            reading.device_name,
            reading.device_address,
            bp.systolic,
            bp.diastolic,
            bp.pulse,
            bp.category
        ),
        Measurement::Temperature(t) => info!(
            "[{}] {} ({}): {:.1}°C / {:.1}°F{}",
            when,
            reading.device_name,
            reading.device_address,
            t.celsius,
            t.fahrenheit,
            if t.valid { "" } else { " (invalid)" }
        ),
        Measurement::PulseOximetry(o) => info!(
            "[{}] {} ({}): SpO2 {}%, pulse {} BPM{}",
            when,
            reading.device_name,
            reading.device_address,
            o.spo2_percent,
            o.pulse_rate_bpm,
            if o.valid { "" } else { " (invalid)" }
        ),
    }
}
