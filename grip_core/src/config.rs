//! Runtime configuration for the controller and loop.
//!
//! These are separate from the TOML-deserialized config in `grip_config`;
//! see `conversions` for the mapping.
use crate::actuator::{DutyRange, FaultCommand};
use crate::filter::Seed;
use crate::runner::SamplingMode;
use crate::state::DeviceMode;

/// Analog front end.
#[derive(Debug, Clone, Copy)]
pub struct SensorCfg {
    /// Reference voltage a full-scale reading corresponds to.
    pub v_ref: f32,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self { v_ref: 3.3 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FilterCfg {
    /// History weight in [0.0, 1.0). 0.0 disables smoothing.
    pub alpha: f32,
    pub seed: Seed,
    /// Reinitialize the accumulator on an Off -> On transition.
    pub reset_on_resume: bool,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            alpha: 0.8,
            seed: Seed::Zero,
            reset_on_resume: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActuatorCfg {
    pub range: DutyRange,
    /// Servo PWM frequency. Standard hobby servos expect 50 Hz.
    pub frequency_hz: f32,
    pub on_fault: FaultCommand,
}

impl Default for ActuatorCfg {
    fn default() -> Self {
        Self {
            range: DutyRange::default(),
            frequency_hz: 50.0,
            on_fault: FaultCommand::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeviceCfg {
    pub start_mode: DeviceMode,
    /// Button settle window; presses within it of a level change are ignored.
    pub debounce_ms: u64,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            start_mode: DeviceMode::On,
            debounce_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoopCfg {
    pub period_ms: u64,
    pub mode: SamplingMode,
    /// Stop after this many ticks; `None` runs until the stop token is set.
    pub max_ticks: Option<u64>,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            period_ms: 100,
            mode: SamplingMode::Direct,
            max_ticks: None,
        }
    }
}
