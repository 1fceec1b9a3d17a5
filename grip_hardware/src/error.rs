use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("adc error: {0}")]
    Adc(String),
    #[error("duty cycle {0} outside [0, 1]")]
    DutyOutOfRange(f32),
    #[error("pwm channel not started")]
    NotStarted,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
