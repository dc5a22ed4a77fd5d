//! Decoding, classification and body composition estimation for BLE health
//! devices, plus the plumbing that bridges them to a message broker
pub mod assembly;
pub mod bluetooth;
pub mod body;
pub mod classify;
pub mod config;
pub mod decoders;
pub mod error;
pub mod models;
pub mod publish;
pub mod utils;

pub use assembly::ReadingAssembler;
pub use body::compute_body_composition;
pub use decoders::{decode_blood_pressure, decode_pulse_oximeter, decode_scale, decode_thermometer};
