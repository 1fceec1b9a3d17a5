//! Narrow capability traits for the hardware the grip controller drives.
//!
//! Every method returns a boxed error so adapters can surface whatever their
//! bus or driver reports; `grip_core` maps these into typed errors.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Logical level of the mode button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonLevel {
    Pressed,
    #[default]
    Released,
}

impl ButtonLevel {
    /// Active-low wiring: a low line (0) means pressed.
    #[inline]
    pub fn from_active_low(high: bool) -> Self {
        if high { Self::Released } else { Self::Pressed }
    }
}

/// One analog channel. `read` returns a normalized fraction of full scale in `[0, 1]`.
pub trait AnalogInput {
    fn read(&mut self) -> HwResult<f32>;
}

pub trait DigitalInput {
    fn read(&mut self) -> HwResult<ButtonLevel>;
}

pub trait DigitalOutput {
    fn write(&mut self, on: bool) -> HwResult<()>;
}

/// PWM channel driving the actuator. Duty cycles are fractions of the period.
pub trait PwmOutput {
    fn start(&mut self, initial_duty: f32, frequency_hz: f32) -> HwResult<()>;
    fn set_duty_cycle(&mut self, duty: f32) -> HwResult<()>;
    fn stop(&mut self) -> HwResult<()>;
}

pub trait TextDisplay {
    fn show_text(&mut self, text: &str) -> HwResult<()>;
    fn set_separator(&mut self, on: bool) -> HwResult<()>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read(&mut self) -> HwResult<f32> {
        (**self).read()
    }
}

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn read(&mut self) -> HwResult<ButtonLevel> {
        (**self).read()
    }
}
