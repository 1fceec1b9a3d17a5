//! Per-tick decision logic. No I/O: the caller reads devices and applies the
//! returned [`TickCommand`].
use crate::actuator::DutyRange;
use crate::calibration::{ForceModel, ResistivePowerLaw};
use crate::classifier::{GripLevel, ThresholdTable};
use crate::config::{ActuatorCfg, DeviceCfg, FilterCfg, SensorCfg};
use crate::error::{BuildError, GripError, Result};
use crate::filter::Ema;
use crate::pipeline::Pipeline;
use crate::state::{DeviceMode, DeviceState};
use crate::status::{DisplayCommand, IndicatorPair, Reading, TickCommand};
use grip_traits::ButtonLevel;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct GripController {
    pipeline: Pipeline,
    state: DeviceState,
    actuator: ActuatorCfg,
    reset_on_resume: bool,
}

impl GripController {
    pub fn builder() -> GripControllerBuilder {
        GripControllerBuilder::default()
    }

    pub fn mode(&self) -> DeviceMode {
        self.state.mode()
    }

    pub fn actuator(&self) -> &ActuatorCfg {
        &self.actuator
    }

    pub fn duty_range(&self) -> DutyRange {
        self.actuator.range
    }

    pub fn level_max(&self) -> GripLevel {
        self.pipeline.level_max()
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        self.pipeline.table()
    }

    /// Run the pipeline on one sample without touching the mode.
    pub fn evaluate(&mut self, fraction: f32) -> Reading {
        self.pipeline.evaluate(fraction)
    }

    /// One control tick.
    ///
    /// The button is processed first so a press takes effect on the same
    /// tick. The pipeline runs in both modes; only `On` applies its output.
    pub fn step(
        &mut self,
        now: Instant,
        button: ButtonLevel,
        sample: std::result::Result<f32, GripError>,
    ) -> TickCommand {
        let transition = self.state.poll(button, now);
        if let Some(mode) = transition {
            tracing::info!(mode = %mode, "mode changed");
            if mode.is_on() && self.reset_on_resume {
                self.pipeline.reset_filter();
            }
        }
        let mode = self.state.mode();

        let reading = match sample {
            Ok(fraction) => Some(self.pipeline.evaluate(fraction)),
            Err(e) => {
                tracing::warn!(error = %e, "sensor read failed");
                self.pipeline.release();
                None
            }
        };
        let defined = reading.as_ref().and_then(|r| r.force).is_some();

        let range = self.actuator.range;
        let (duty, display) = match (mode, &reading) {
            (DeviceMode::Off, _) => (range.neutral(), DisplayCommand::Off),
            (DeviceMode::On, Some(r)) if defined => (
                range.to_duty_cycle(r.level, self.level_max()),
                DisplayCommand::Level(r.level),
            ),
            (DeviceMode::On, _) => (
                range.fault_duty(self.actuator.on_fault),
                DisplayCommand::Error,
            ),
        };

        TickCommand {
            mode,
            duty,
            indicators: IndicatorPair::for_mode(mode),
            display,
            separator: true,
            transition,
            reading,
        }
    }

    /// Command used when a tick could not be computed: neutral duty, mode
    /// indicators unchanged.
    pub fn safe_command(&self) -> TickCommand {
        let mode = self.mode();
        TickCommand {
            mode,
            duty: self.actuator.range.neutral(),
            indicators: IndicatorPair::for_mode(mode),
            display: if mode.is_on() {
                DisplayCommand::Error
            } else {
                DisplayCommand::Off
            },
            separator: true,
            transition: None,
            reading: None,
        }
    }
}

/// Builder for `GripController`. Every piece has a default; `build()` validates.
#[derive(Default)]
pub struct GripControllerBuilder {
    model: Option<Box<dyn ForceModel + Send>>,
    sensor: Option<SensorCfg>,
    filter: Option<FilterCfg>,
    thresholds: Option<ThresholdTable>,
    actuator: Option<ActuatorCfg>,
    device: Option<DeviceCfg>,
}

impl GripControllerBuilder {
    pub fn with_model(mut self, model: impl ForceModel + Send + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    pub fn with_sensor(mut self, sensor: SensorCfg) -> Self {
        self.sensor = Some(sensor);
        self
    }

    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_thresholds(mut self, table: ThresholdTable) -> Self {
        self.thresholds = Some(table);
        self
    }

    pub fn with_actuator(mut self, actuator: ActuatorCfg) -> Self {
        self.actuator = Some(actuator);
        self
    }

    pub fn with_device(mut self, device: DeviceCfg) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_start_mode(mut self, mode: DeviceMode) -> Self {
        let mut device = self.device.unwrap_or_default();
        device.start_mode = mode;
        self.device = Some(device);
        self
    }

    pub fn build(self) -> Result<GripController> {
        let sensor = self.sensor.unwrap_or_default();
        let filter = self.filter.unwrap_or_default();
        let actuator = self.actuator.unwrap_or_default();
        let device = self.device.unwrap_or_default();
        let table = self.thresholds.unwrap_or_default();

        if !(sensor.v_ref.is_finite() && sensor.v_ref > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "v_ref must be > 0",
            )));
        }
        if !(filter.alpha >= 0.0 && filter.alpha < 1.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "filter alpha must be in [0, 1)",
            )));
        }
        if !(actuator.frequency_hz.is_finite() && actuator.frequency_hz > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "pwm frequency must be > 0",
            )));
        }

        let model = self.model.unwrap_or_else(|| {
            Box::new(ResistivePowerLaw {
                v_ref: sensor.v_ref,
                ..ResistivePowerLaw::default()
            })
        });
        tracing::debug!(
            v_ref = sensor.v_ref,
            alpha = filter.alpha,
            levels = table.level_max().get(),
            start = %device.start_mode,
            "controller built"
        );

        Ok(GripController {
            pipeline: Pipeline::new(
                sensor.v_ref,
                model,
                Ema::new(filter.alpha, filter.seed),
                table,
            ),
            state: DeviceState::new(
                device.start_mode,
                Duration::from_millis(device.debounce_ms),
            ),
            actuator,
            reset_on_resume: filter.reset_on_resume,
        })
    }
}
