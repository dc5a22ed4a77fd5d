/// BLE transport adapter for the supported health devices
pub mod scanner;

pub use scanner::run_scanner;
