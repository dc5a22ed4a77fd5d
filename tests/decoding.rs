//! Integration tests for decoding, assembly and publishing without hardware.

use std::sync::Arc;

use health_ble_bridge::config::BridgeConfig;
use health_ble_bridge::error::DecodeError;
use health_ble_bridge::models::{
    BloodPressureCategory, BloodPressureStandard, CharacteristicKind, RawCharacteristicPayload,
    Record,
};
use health_ble_bridge::publish::{BrokerHandle, ExternalBroker, LineSink, Publication, ReadingSink};
use health_ble_bridge::{
    decode_blood_pressure, decode_pulse_oximeter, decode_scale, decode_thermometer,
    ReadingAssembler,
};
use time::OffsetDateTime;

const SCALE_FRAME: [u8; 8] = [0x02, 0x58, 0x1B, 0xF4, 0x01, 0x00, 0x00, 0x00];
const THERMO_FRAME: [u8; 5] = [0x00, 0x6D, 0x01, 0x00, 0xFF];
// 145/95 mmHg, MAP 111
const BP_FRAME: [u8; 7] = [0x00, 0x91, 0x00, 0x5F, 0x00, 0x6F, 0x00];
const OXIMETER_FRAME: [u8; 11] = [0xAA, 0x55, 0x0F, 0x07, 0x02, 10, 60, 10, 60, 35, 0x1B];

#[test]
fn truncated_buffers_are_rejected() {
    assert!(decode_scale(&SCALE_FRAME[..7]).is_none());
    assert!(matches!(
        decode_thermometer(&THERMO_FRAME[..4]),
        Err(DecodeError::InsufficientData { .. })
    ));
    assert!(matches!(
        decode_blood_pressure(&BP_FRAME[..6], BloodPressureStandard::Eu),
        Err(DecodeError::InsufficientData { .. })
    ));
    assert!(decode_pulse_oximeter(&OXIMETER_FRAME[..10]).is_none());
}

#[test]
fn empty_buffers_are_rejected() {
    assert!(decode_scale(&[]).is_none());
    assert!(decode_thermometer(&[]).is_err());
    assert!(decode_blood_pressure(&[], BloodPressureStandard::Us).is_err());
    assert!(decode_pulse_oximeter(&[]).is_none());
}

#[test]
fn decoders_are_idempotent() {
    assert_eq!(decode_scale(&SCALE_FRAME), decode_scale(&SCALE_FRAME));
    assert_eq!(decode_thermometer(&THERMO_FRAME), decode_thermometer(&THERMO_FRAME));
    assert_eq!(
        decode_blood_pressure(&BP_FRAME, BloodPressureStandard::Eu),
        decode_blood_pressure(&BP_FRAME, BloodPressureStandard::Eu)
    );
    assert_eq!(decode_pulse_oximeter(&OXIMETER_FRAME), decode_pulse_oximeter(&OXIMETER_FRAME));
}

#[test]
fn blood_pressure_frame_is_graded_per_standard() {
    let eu = decode_blood_pressure(&BP_FRAME, BloodPressureStandard::Eu).unwrap();
    assert_eq!((eu.systolic, eu.diastolic), (145, 95));
    assert_eq!(eu.category, BloodPressureCategory::Grade2);

    let us = decode_blood_pressure(&BP_FRAME, BloodPressureStandard::Us).unwrap();
    assert_eq!(us.category, BloodPressureCategory::Grade2);
}

#[test]
fn oximeter_frame_without_reading_is_invalid() {
    let mut frame = OXIMETER_FRAME;
    frame[10] = 0;
    let reading = decode_pulse_oximeter(&frame).unwrap();
    assert!(!reading.valid);
    assert_eq!(reading.spo2_percent, 0);
    assert_eq!(reading.pulse_rate_bpm, 0);
}

#[test]
fn payloads_flow_from_config_to_sink() {
    let vars = [
        ("HEALTH_DEVICES", "AA:BB:CC:DD:EE:FF=Mi Scale,11:22:33:44:55:66=BP Monitor"),
        ("HEALTH_USER_1_EMAIL", "jane.doe@example.com"),
        ("HEALTH_USER_1_SEX", "female"),
        ("HEALTH_USER_1_HEIGHT", "165"),
        ("HEALTH_USER_1_BIRTHDATE", "01-06-1991"),
        ("HEALTH_USER_1_MIN_WEIGHT", "50"),
        ("HEALTH_USER_1_MAX_WEIGHT", "75"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()));
    let config = BridgeConfig::from_vars(vars, 2026).unwrap();
    let assembler = ReadingAssembler::from_config(&config);

    let broker = Arc::new(ExternalBroker::new(config.broker_url.clone()));
    broker.start().unwrap();
    let mut sink = LineSink::new(Vec::new(), broker.clone());

    let payloads = [
        ("aa:bb:cc:dd:ee:ff", CharacteristicKind::ScaleMeasurement, SCALE_FRAME.to_vec()),
        ("11:22:33:44:55:66", CharacteristicKind::BpMeasurement, BP_FRAME.to_vec()),
        ("11:22:33:44:55:66", CharacteristicKind::BpMeasurement, BP_FRAME[..3].to_vec()),
    ];

    let mut published = 0;
    let mut failures = 0;
    for (address, kind, bytes) in payloads {
        let payload = RawCharacteristicPayload {
            device_address: address.to_string(),
            kind,
            bytes,
            received_at: OffsetDateTime::UNIX_EPOCH,
        };
        match assembler.assemble(&payload) {
            Ok(records) => {
                for record in &records {
                    if let Record::Composition(c) = record {
                        assert_eq!(c.profile.age, 35);
                    }
                    sink.publish(&Publication::from_record(record, &config.default_user))
                        .unwrap();
                    published += 1;
                }
            }
            Err(_) => failures += 1,
        }
    }
    assert_eq!(published, 3);
    assert_eq!(failures, 1);

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let topics: Vec<&str> = output
        .lines()
        .filter_map(|line| line.split_once(' ').map(|(topic, _)| topic))
        .collect();
    assert_eq!(
        topics,
        [
            "healthdata/devices/aa_bb_cc_dd_ee_ff/raw_scale_data",
            "healthdata/jane_doe_at_example_com/body_composition",
            "healthdata/jane_doe_at_example_com/blood_pressure",
        ]
    );
    assert!(output.contains("\"device_name\":\"Mi Scale\""));
    assert!(output.contains("\"category\":\"Grade_2\""));

    broker.stop();
    let mut stopped = LineSink::new(Vec::new(), broker);
    assert!(stopped
        .publish(&Publication::from_record(
            &assembler
                .assemble(&RawCharacteristicPayload {
                    device_address: "AA:BB:CC:DD:EE:FF".to_string(),
                    kind: CharacteristicKind::ScaleMeasurement,
                    bytes: SCALE_FRAME.to_vec(),
                    received_at: OffsetDateTime::UNIX_EPOCH,
                })
                .unwrap()[0],
            &config.default_user,
        ))
        .is_err());
}
