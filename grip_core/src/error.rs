use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GripError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("failed to acquire {device}: {reason}")]
    Acquire { device: &'static str, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing force sensor")]
    MissingSensor,
    #[error("missing mode button")]
    MissingButton,
    #[error("missing {0} indicator")]
    MissingIndicator(&'static str),
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing display")]
    MissingDisplay,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
