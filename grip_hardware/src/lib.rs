pub mod error;
pub mod segments;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod ht16k33;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod iio_adc;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod servo;

use grip_traits::{
    AnalogInput, ButtonLevel, DigitalInput, DigitalOutput, HwResult, PwmOutput, TextDisplay,
};
use std::sync::{Arc, Mutex};

use crate::error::HwError;

/// Shared view into a simulated device's recorded state.
#[derive(Debug, Default)]
pub struct Probe<T>(Arc<Mutex<T>>);

impl<T> Clone for Probe<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + Default> Probe<T> {
    /// Copy of the current state; a poisoned lock reads as the default.
    pub fn get(&self) -> T {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut T)) {
        if let Ok(mut g) = self.0.lock() {
            f(&mut g);
        }
    }
}

/// Simulated analog channel replaying a script of full-scale fractions.
/// Once the script is exhausted the last value is held.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSensor {
    script: Vec<f32>,
    idx: usize,
}

impl SimulatedSensor {
    pub fn constant(fraction: f32) -> Self {
        Self::scripted(vec![fraction])
    }

    pub fn scripted(script: Vec<f32>) -> Self {
        Self { script, idx: 0 }
    }

    /// Script expressed in volts against the divider's reference voltage.
    pub fn from_volts(volts: &[f32], v_ref: f32) -> Self {
        let script = volts
            .iter()
            .map(|v| if v_ref > 0.0 { v / v_ref } else { 0.0 })
            .collect();
        Self::scripted(script)
    }
}

impl AnalogInput for SimulatedSensor {
    fn read(&mut self) -> HwResult<f32> {
        let Some(last) = self.script.len().checked_sub(1) else {
            return Ok(0.0);
        };
        let v = self.script[self.idx.min(last)];
        self.idx = self.idx.saturating_add(1);
        tracing::trace!(fraction = v, "sensor sample (simulated)");
        Ok(v)
    }
}

/// Simulated button replaying a script of levels, released after the script ends.
#[derive(Debug, Clone, Default)]
pub struct SimulatedButton {
    script: Vec<ButtonLevel>,
    idx: usize,
}

impl SimulatedButton {
    pub fn released() -> Self {
        Self::default()
    }

    pub fn scripted(script: Vec<ButtonLevel>) -> Self {
        Self { script, idx: 0 }
    }

    /// Active-low line pattern, e.g. `"1101"`: `0` is pressed, anything else released.
    pub fn from_pattern(pattern: &str) -> Self {
        Self::scripted(
            pattern
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| ButtonLevel::from_active_low(c != '0'))
                .collect(),
        )
    }
}

impl DigitalInput for SimulatedButton {
    fn read(&mut self) -> HwResult<ButtonLevel> {
        let level = self
            .script
            .get(self.idx)
            .copied()
            .unwrap_or(ButtonLevel::Released);
        self.idx = self.idx.saturating_add(1);
        Ok(level)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LedState {
    pub on: Option<bool>,
    pub writes: usize,
}

/// Simulated indicator LED.
#[derive(Debug, Default)]
pub struct SimulatedLed {
    state: Probe<LedState>,
}

impl SimulatedLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> Probe<LedState> {
        self.state.clone()
    }
}

impl DigitalOutput for SimulatedLed {
    fn write(&mut self, on: bool) -> HwResult<()> {
        self.state.update(|s| {
            s.on = Some(on);
            s.writes += 1;
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServoLog {
    /// `(initial_duty, frequency_hz)` of the last `start`.
    pub started: Option<(f32, f32)>,
    pub duties: Vec<f32>,
    pub stopped: bool,
}

impl ServoLog {
    pub fn last_duty(&self) -> Option<f32> {
        self.duties.last().copied()
    }
}

/// Simulated PWM servo channel that records every commanded duty.
#[derive(Debug, Default)]
pub struct SimulatedServo {
    log: Probe<ServoLog>,
    running: bool,
}

impl SimulatedServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> Probe<ServoLog> {
        self.log.clone()
    }
}

fn check_duty(duty: f32) -> Result<f32, HwError> {
    if duty.is_finite() && (0.0..=1.0).contains(&duty) {
        Ok(duty)
    } else {
        Err(HwError::DutyOutOfRange(duty))
    }
}

impl PwmOutput for SimulatedServo {
    fn start(&mut self, initial_duty: f32, frequency_hz: f32) -> HwResult<()> {
        let duty = check_duty(initial_duty)?;
        self.running = true;
        self.log.update(|l| {
            l.started = Some((duty, frequency_hz));
            l.duties.push(duty);
            l.stopped = false;
        });
        Ok(())
    }

    fn set_duty_cycle(&mut self, duty: f32) -> HwResult<()> {
        if !self.running {
            return Err(Box::new(HwError::NotStarted));
        }
        let duty = check_duty(duty)?;
        self.log.update(|l| l.duties.push(duty));
        Ok(())
    }

    fn stop(&mut self) -> HwResult<()> {
        self.running = false;
        self.log.update(|l| l.stopped = true);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisplayLog {
    pub texts: Vec<String>,
    pub separator: Option<bool>,
}

impl DisplayLog {
    pub fn last_text(&self) -> Option<&str> {
        self.texts.last().map(String::as_str)
    }
}

/// Simulated 4-character segment display.
#[derive(Debug, Default)]
pub struct SimulatedDisplay {
    log: Probe<DisplayLog>,
}

impl SimulatedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> Probe<DisplayLog> {
        self.log.clone()
    }
}

impl TextDisplay for SimulatedDisplay {
    fn show_text(&mut self, text: &str) -> HwResult<()> {
        tracing::trace!(text, "display (simulated)");
        self.log.update(|l| l.texts.push(text.to_string()));
        Ok(())
    }

    fn set_separator(&mut self, on: bool) -> HwResult<()> {
        self.log.update(|l| l.separator = Some(on));
        Ok(())
    }
}
