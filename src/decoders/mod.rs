/// Characteristic payload decoders, one per supported device class
pub mod blood_pressure;
pub mod ieee11073;
pub mod oximeter;
pub mod scale;
pub mod thermometer;

pub use blood_pressure::decode_blood_pressure;
pub use ieee11073::{decode_float32, decode_sfloat16};
pub use oximeter::{decode_pulse_oximeter, parse_oximeter_frame};
pub use scale::{decode_scale, parse_scale};
pub use thermometer::decode_thermometer;
