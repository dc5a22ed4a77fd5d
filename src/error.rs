/// Error types shared by the decoders, the estimator and the service plumbing
use thiserror::Error;

/// A characteristic payload could not be turned into a reading.
///
/// Both variants are recoverable: the caller drops the frame and waits for
/// the next notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer is shorter than the wire format requires.
    #[error("insufficient data: need {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The buffer is longer than a fixed-size frame allows.
    #[error("unexpected frame length: expected {expected} bytes, got {available}")]
    LengthMismatch { expected: usize, available: usize },

    /// A fixed signature did not match (e.g. the oximeter frame header).
    #[error("malformed header: expected {expected:02x?}, found {found:02x?}")]
    MalformedHeader { expected: Vec<u8>, found: Vec<u8> },
}

/// Body composition inputs outside the physiological sanity bounds.
///
/// The measurement is unusable; retrying with the same inputs will not help.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is out of range: {value} (limit: {limit})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        limit: &'static str,
    },
}

/// Failures while reading the environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(String),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },

    #[error("no health devices configured. Please set HEALTH_DEVICES or HEALTH_DEVICE_<N>_MAC/HEALTH_DEVICE_<N>_NAME environment variables")]
    NoDevices,

    #[error("invalid broker URL: {0}")]
    BrokerUrl(#[from] url::ParseError),
}

/// Failures at the publishing boundary.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("broker at {0} is not running")]
    BrokerUnavailable(String),

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while turning a raw payload into publishable records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("failed to decode {kind} payload: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: DecodeError,
    },
}
