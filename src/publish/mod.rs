/// Publishing boundary: topic naming and JSON payload layout
pub mod broker;
pub mod sink;

pub use broker::{BrokerHandle, ExternalBroker};
pub use sink::{LineSink, ReadingSink};

use serde_json::{json, Value};

use crate::classify::{
    has_irregular_heartbeat, has_movement_error, health_recommendation, pulse_rate_category,
    risk_level, spo2_category,
};
use crate::models::{BodyCompositionRecord, HealthReading, Measurement, Record};
use crate::utils::{format_date, format_rfc3339, format_time, round_to, sanitize_address, sanitize_user};

const TOPIC_ROOT: &str = "healthdata";

/// A serialized record addressed to a broker topic
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: String,
    pub payload: Value,
}

impl Publication {
    /// Lay out a record for publishing
    ///
    /// Readings that are not attributed to a user by the assembler go to
    /// `default_user`.
    pub fn from_record(record: &Record, default_user: &str) -> Publication {
        match record {
            Record::Reading(reading) => reading_publication(reading, default_user),
            Record::Composition(record) => composition_publication(record),
        }
    }
}

fn user_topic(user: &str, leaf: &str) -> String {
    format!("{}/{}/{}", TOPIC_ROOT, sanitize_user(user), leaf)
}

fn reading_publication(reading: &HealthReading, default_user: &str) -> Publication {
    let timestamp = format_rfc3339(&reading.timestamp);

    match &reading.measurement {
        Measurement::Scale(sample) => Publication {
            topic: format!(
                "{}/devices/{}/raw_scale_data",
                TOPIC_ROOT,
                sanitize_address(&reading.device_address)
            ),
            payload: json!({
                "timestamp": timestamp,
                "device_mac": reading.device_address,
                "device_name": reading.device_name,
                "weight": sample.weight_kg,
                "impedance": sample.impedance_ohm,
                "data_type": "raw_scale_measurement",
            }),
        },
        Measurement::BloodPressure(bp) => Publication {
            topic: user_topic(default_user, "blood_pressure"),
            payload: json!({
                "timestamp": timestamp,
                "date": format_date(&reading.timestamp),
                "time": format_time(&reading.timestamp),
                "systolic": bp.systolic,
                "diastolic": bp.diastolic,
                "pulse": bp.pulse,
                "movement_error": has_movement_error(bp.mov),
                "irregular_heartbeat": has_irregular_heartbeat(bp.ihb),
                "category": bp.category,
                "risk_level": risk_level(bp.category),
                "recommendation": health_recommendation(bp.category),
                "device_address": reading.device_address,
                "device_name": reading.device_name,
                "data_type": "blood_pressure_measurement",
            }),
        },
        Measurement::Temperature(t) => Publication {
            topic: user_topic(default_user, "temperature"),
            payload: json!({
                "timestamp": timestamp,
                "temperature_celsius": round_to(t.celsius, 2),
                "temperature_fahrenheit": round_to(t.fahrenheit, 2),
                "measurement_location": t.location,
                "unit": t.unit,
                "device_address": reading.device_address,
                "device_name": reading.device_name,
                "is_valid": t.valid,
                "data_type": "temperature_measurement",
            }),
        },
        Measurement::PulseOximetry(o) => Publication {
            topic: user_topic(default_user, "pulse_oximetry"),
            payload: json!({
                "timestamp": timestamp,
                "spo2_percentage": o.spo2_percent,
                "pulse_rate": o.pulse_rate_bpm,
                "signal_quality": o.signal_quality,
                "spo2_category": spo2_category(o.spo2_percent),
                "pulse_rate_category": pulse_rate_category(o.pulse_rate_bpm),
                "device_address": reading.device_address,
                "device_name": reading.device_name,
                "is_valid_reading": o.valid,
                "plethysmogram_data_size": o.plethysmogram.len(),
                "data_type": "pulse_oximetry_measurement",
            }),
        },
    }
}

fn composition_publication(record: &BodyCompositionRecord) -> Publication {
    let c = &record.composition;
    Publication {
        topic: user_topic(&record.user, "body_composition"),
        payload: json!({
            "timestamp": format_rfc3339(&record.timestamp),
            "user": record.user,
            "device_address": record.device_address,
            "device_name": record.device_name,
            "weight": record.profile.weight,
            "height": record.profile.height,
            "age": record.profile.age,
            "sex": record.profile.sex,
            "impedance": record.impedance,
            "bmi": round_to(c.bmi, 2),
            "fat_percentage": round_to(c.fat_percentage, 2),
            "water_percentage": round_to(c.water_percentage, 2),
            "bone_mass": round_to(c.bone_mass, 2),
            "muscle_mass": round_to(c.muscle_mass, 2),
            "visceral_fat": round_to(c.visceral_fat, 2),
            "bmr": round_to(c.bmr, 2),
            "protein_percentage": round_to(c.protein_percentage, 2),
            "body_type": c.body_type,
            "metabolic_age": round_to(c.metabolic_age, 2),
            "ideal_weight": round_to(c.ideal_weight, 2),
            "fat_mass_to_ideal": c.fat_mass_to_ideal,
            "lean_body_mass": round_to(c.lean_body_mass, 2),
            "data_type": "body_composition",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::compute_body_composition;
    use crate::models::{
        BloodPressureCategory, BloodPressureReading, PulseOximetryReading, ScaleRawSample, Sex,
        SignalQuality, UserProfile,
    };
    use time::{Duration, OffsetDateTime};

    fn reading(measurement: Measurement) -> HealthReading {
        HealthReading {
            device_address: "AA:BB:CC:DD:EE:FF".to_string(),
            device_name: "Device".to_string(),
            // 2024-10-16 08:30:05 UTC
            timestamp: OffsetDateTime::UNIX_EPOCH + Duration::seconds(1_729_067_405),
            measurement,
        }
    }

    #[test]
    fn raw_scale_goes_to_device_topic() {
        let record = Record::Reading(reading(Measurement::Scale(ScaleRawSample {
            weight_kg: 25.0,
            impedance_ohm: 500.0,
        })));
        let publication = Publication::from_record(&record, "jane.doe@example.com");

        assert_eq!(publication.topic, "healthdata/devices/AA_BB_CC_DD_EE_FF/raw_scale_data");
        assert_eq!(publication.payload["weight"], 25.0);
        assert_eq!(publication.payload["data_type"], "raw_scale_measurement");
        assert_eq!(publication.payload["timestamp"], "2024-10-16T08:30:05Z");
    }

    #[test]
    fn blood_pressure_goes_to_user_topic() {
        let record = Record::Reading(reading(Measurement::BloodPressure(BloodPressureReading {
            systolic: 145,
            diastolic: 95,
            pulse: 72,
            mov: 0,
            ihb: 1,
            category: BloodPressureCategory::Grade2,
        })));
        let publication = Publication::from_record(&record, "jane.doe@example.com");

        assert_eq!(publication.topic, "healthdata/jane_doe_at_example_com/blood_pressure");
        let payload = &publication.payload;
        assert_eq!(payload["category"], "Grade_2");
        assert_eq!(payload["risk_level"], "High");
        assert_eq!(payload["date"], "16.10.2024");
        assert_eq!(payload["time"], "08:30");
        assert_eq!(payload["movement_error"], false);
        assert_eq!(payload["irregular_heartbeat"], true);
        assert_eq!(payload["data_type"], "blood_pressure_measurement");
    }

    #[test]
    fn oximetry_payload_carries_categories() {
        let record = Record::Reading(reading(Measurement::PulseOximetry(PulseOximetryReading {
            spo2_percent: 97,
            pulse_rate_bpm: 160,
            plethysmogram: vec![1, 2, 3, 4, 5],
            signal_quality: SignalQuality::Poor,
            valid: true,
        })));
        let publication = Publication::from_record(&record, "user@example.com");

        assert_eq!(publication.topic, "healthdata/user_at_example_com/pulse_oximetry");
        let payload = &publication.payload;
        assert_eq!(payload["spo2_category"], "Normal");
        assert_eq!(payload["pulse_rate_category"], "Severe Tachycardia");
        assert_eq!(payload["signal_quality"], "poor");
        assert_eq!(payload["plethysmogram_data_size"], 5);
        assert_eq!(payload["is_valid_reading"], true);
    }

    #[test]
    fn composition_goes_to_attributed_user() {
        let profile = UserProfile { weight: 70.0, height: 175, age: 30, sex: Sex::Male };
        let composition = compute_body_composition(&profile, 500.0).unwrap();
        let record = Record::Composition(BodyCompositionRecord {
            device_address: "AA:BB:CC:DD:EE:FF".to_string(),
            device_name: "Mi Scale".to_string(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            user: "adult@example.com".to_string(),
            profile,
            impedance: 500.0,
            composition,
        });
        let publication = Publication::from_record(&record, "someone.else@example.com");

        assert_eq!(publication.topic, "healthdata/adult_at_example_com/body_composition");
        let payload = &publication.payload;
        assert_eq!(payload["bmi"], 22.86);
        assert_eq!(payload["sex"], "MALE");
        assert_eq!(payload["fat_mass_to_ideal"], "to_gain:1.9");
        assert_eq!(payload["lean_body_mass"], 57.34);
        assert_eq!(payload["data_type"], "body_composition");
    }
}
