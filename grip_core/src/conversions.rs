//! Bridges from `grip_config` types to `grip_core` runtime types.

use crate::actuator::{DutyRange, FaultCommand};
use crate::calibration::{CalibrationModel, LinearCalibration, ResistivePowerLaw};
use crate::classifier::ThresholdTable;
use crate::config::{ActuatorCfg, DeviceCfg, FilterCfg, LoopCfg, SensorCfg};
use crate::controller::GripController;
use crate::error::{BuildError, Result};
use crate::filter::Seed;
use crate::runner::SamplingMode;
use crate::state::DeviceMode;
use eyre::WrapErr;

impl From<&grip_config::SensorCfg> for SensorCfg {
    fn from(c: &grip_config::SensorCfg) -> Self {
        Self { v_ref: c.v_ref }
    }
}

impl From<grip_config::FilterSeed> for Seed {
    fn from(s: grip_config::FilterSeed) -> Self {
        match s {
            grip_config::FilterSeed::Zero => Self::Zero,
            grip_config::FilterSeed::First => Self::FirstSample,
        }
    }
}

impl From<&grip_config::FilterCfg> for FilterCfg {
    fn from(c: &grip_config::FilterCfg) -> Self {
        Self {
            alpha: c.alpha,
            seed: c.seed.into(),
            reset_on_resume: c.reset_on_resume,
        }
    }
}

impl From<grip_config::FaultCommand> for FaultCommand {
    fn from(c: grip_config::FaultCommand) -> Self {
        match c {
            grip_config::FaultCommand::Neutral => Self::Neutral,
            grip_config::FaultCommand::Minimum => Self::Minimum,
        }
    }
}

impl TryFrom<&grip_config::ActuatorCfg> for ActuatorCfg {
    type Error = BuildError;
    fn try_from(c: &grip_config::ActuatorCfg) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            range: DutyRange::new(c.duty_min, c.duty_max)?,
            frequency_hz: c.frequency_hz,
            on_fault: c.on_fault.into(),
        })
    }
}

impl From<grip_config::StartMode> for DeviceMode {
    fn from(m: grip_config::StartMode) -> Self {
        match m {
            grip_config::StartMode::On => Self::On,
            grip_config::StartMode::Off => Self::Off,
        }
    }
}

impl From<&grip_config::DeviceCfg> for DeviceCfg {
    fn from(c: &grip_config::DeviceCfg) -> Self {
        Self {
            start_mode: c.start_mode.into(),
            debounce_ms: c.debounce_ms,
        }
    }
}

impl From<grip_config::LoopMode> for SamplingMode {
    fn from(m: grip_config::LoopMode) -> Self {
        match m {
            grip_config::LoopMode::Direct => Self::Direct,
            grip_config::LoopMode::Sampled => Self::Sampled,
        }
    }
}

impl From<&grip_config::LoopCfg> for LoopCfg {
    fn from(c: &grip_config::LoopCfg) -> Self {
        Self {
            period_ms: c.period_ms,
            mode: c.mode.into(),
            max_ticks: None,
        }
    }
}

impl TryFrom<&grip_config::ClassifierCfg> for ThresholdTable {
    type Error = BuildError;
    fn try_from(c: &grip_config::ClassifierCfg) -> std::result::Result<Self, Self::Error> {
        Self::new(c.points())
    }
}

impl CalibrationModel {
    /// Build the configured model. The resistive divider shares the sensor's `v_ref`.
    pub fn from_config(c: &grip_config::CalibrationCfg, v_ref: f32) -> Self {
        match *c {
            grip_config::CalibrationCfg::Resistive {
                r_fixed_ohms,
                scale,
                exponent,
                min_ohms,
                max_ohms,
            } => Self::Resistive(ResistivePowerLaw {
                r_fixed_ohms,
                v_ref,
                exponent,
                scale,
                min_ohms,
                max_ohms,
            }),
            grip_config::CalibrationCfg::Linear { a, b } => {
                Self::Linear(LinearCalibration::new(a, b))
            }
        }
    }
}

impl GripController {
    /// Controller for a validated config. A fitted calibration table, when
    /// given, replaces the configured model.
    pub fn from_config(
        cfg: &grip_config::Config,
        fit: Option<grip_config::LinearFit>,
    ) -> Result<Self> {
        let sensor = SensorCfg::from(&cfg.sensor);
        let model = match fit {
            Some(fit) => CalibrationModel::Linear(fit.into()),
            None => CalibrationModel::from_config(&cfg.calibration, sensor.v_ref),
        };
        let thresholds =
            ThresholdTable::try_from(&cfg.classifier).wrap_err("classifier thresholds")?;
        let actuator = ActuatorCfg::try_from(&cfg.actuator).wrap_err("actuator")?;

        GripController::builder()
            .with_sensor(sensor)
            .with_model(model)
            .with_filter(FilterCfg::from(&cfg.filter))
            .with_thresholds(thresholds)
            .with_actuator(actuator)
            .with_device(DeviceCfg::from(&cfg.device))
            .build()
    }
}
