//! Control loop driver: owns the hardware rig, paces ticks, applies commands,
//! and guarantees the shutdown sequence on every exit path.
use crate::actuator::DutyCycle;
use crate::config::{ActuatorCfg, LoopCfg};
use crate::controller::GripController;
use crate::error::{BuildError, GripError, Result};
use crate::hw_error::{map_hw_error, map_sensor_error};
use crate::sampler::{Sample, Sampler};
use crate::state::DeviceMode;
use crate::status::{DisplayCommand, IndicatorPair, TickCommand};
use crate::util::{rate_hz, sleep_budget, stale_after, tick_period};
use eyre::WrapErr;
use grip_traits::clock::{Clock, MonotonicClock};
use grip_traits::{AnalogInput, ButtonLevel, DigitalInput, DigitalOutput, PwmOutput, TextDisplay};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Where the force sensor is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplingMode {
    /// Read inside the control loop, once per tick.
    #[default]
    Direct,
    /// A background thread owns the sensor and forwards readings.
    Sampled,
}

/// Owned bundle of device handles. Dropping a `Rig` runs the shutdown
/// sequence if it has not run yet.
pub struct Rig {
    sensor: Option<Box<dyn AnalogInput + Send>>,
    button: Box<dyn DigitalInput>,
    primary: Box<dyn DigitalOutput>,
    secondary: Box<dyn DigitalOutput>,
    servo: Box<dyn PwmOutput>,
    display: Box<dyn TextDisplay>,
    neutral: DutyCycle,
    servo_running: bool,
    shut_down: bool,
    last_duty: Option<DutyCycle>,
    shown: Option<DisplayCommand>,
    separator: Option<bool>,
    lit: Option<IndicatorPair>,
}

impl core::fmt::Debug for Rig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rig")
            .field("servo_running", &self.servo_running)
            .field("shut_down", &self.shut_down)
            .field("last_duty", &self.last_duty)
            .field("shown", &self.shown)
            .finish_non_exhaustive()
    }
}

impl Rig {
    pub fn builder() -> RigBuilder {
        RigBuilder::default()
    }

    /// Start the servo at neutral and show the initial mode.
    pub fn start(&mut self, actuator: &ActuatorCfg, mode: DeviceMode) -> Result<()> {
        self.neutral = actuator.range.neutral();
        self.servo
            .start(self.neutral.get(), actuator.frequency_hz)
            .map_err(|e| eyre::Report::new(map_hw_error(e.as_ref())))
            .wrap_err("start servo PWM")?;
        self.servo_running = true;
        self.shut_down = false;
        self.last_duty = Some(self.neutral);
        self.set_indicators(IndicatorPair::for_mode(mode))?;
        self.set_separator(true)?;
        Ok(())
    }

    pub fn last_duty(&self) -> Option<DutyCycle> {
        self.last_duty
    }

    /// Remove the sensor so it can move to a sampler thread.
    pub fn take_sensor(&mut self) -> Option<Box<dyn AnalogInput + Send>> {
        self.sensor.take()
    }

    /// Button level; a read failure is logged and reads as released.
    pub fn read_button(&mut self) -> ButtonLevel {
        self.button.read().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "button read failed");
            ButtonLevel::Released
        })
    }

    pub fn read_sensor(&mut self) -> Sample {
        match self.sensor.as_mut() {
            Some(s) => s.read().map_err(|e| map_sensor_error(e.as_ref())),
            None => Err(GripError::State("sensor is owned by the sampler".into())),
        }
    }

    fn write_duty(&mut self, duty: DutyCycle) -> std::result::Result<(), GripError> {
        self.servo
            .set_duty_cycle(duty.get())
            .map_err(|e| map_hw_error(e.as_ref()))?;
        self.last_duty = Some(duty);
        Ok(())
    }

    fn set_indicators(&mut self, pair: IndicatorPair) -> std::result::Result<(), GripError> {
        if self.lit == Some(pair) {
            return Ok(());
        }
        self.lit = None;
        self.primary
            .write(pair.primary)
            .map_err(|e| map_hw_error(e.as_ref()))?;
        self.secondary
            .write(pair.secondary)
            .map_err(|e| map_hw_error(e.as_ref()))?;
        self.lit = Some(pair);
        Ok(())
    }

    fn show(&mut self, cmd: DisplayCommand) -> std::result::Result<(), GripError> {
        if self.shown == Some(cmd) {
            return Ok(());
        }
        self.shown = None;
        self.display
            .show_text(&cmd.text())
            .map_err(|e| map_hw_error(e.as_ref()))?;
        self.shown = Some(cmd);
        Ok(())
    }

    fn set_separator(&mut self, on: bool) -> std::result::Result<(), GripError> {
        if self.separator == Some(on) {
            return Ok(());
        }
        self.separator = None;
        self.display
            .set_separator(on)
            .map_err(|e| map_hw_error(e.as_ref()))?;
        self.separator = Some(on);
        Ok(())
    }

    /// Apply one tick: exactly one duty write, then display and indicators
    /// only where they changed. Every output is attempted; the first error is
    /// returned.
    pub fn apply(&mut self, cmd: &TickCommand) -> std::result::Result<(), GripError> {
        let duty = self.write_duty(cmd.duty);
        let lit = self.set_indicators(cmd.indicators);
        let shown = self.show(cmd.display);
        let sep = self.set_separator(cmd.separator);
        duty.and(lit).and(shown).and(sep)
    }

    /// Best-effort neutral command after a faulted tick.
    pub fn park(&mut self) {
        if let Err(e) = self.write_duty(self.neutral) {
            tracing::error!(error = %e, "failed to park actuator at neutral");
        }
    }

    /// Neutral, PWM off, both indicators off, display blanked. Runs once;
    /// later calls are no-ops. Every step is attempted even if one fails.
    pub fn shutdown(&mut self) -> std::result::Result<(), GripError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        let mut first: Option<GripError> = None;
        let mut note = |step: &'static str, r: std::result::Result<(), GripError>| {
            if let Err(e) = r {
                tracing::error!(step, error = %e, "shutdown step failed");
                first.get_or_insert(e);
            }
        };

        if self.servo_running {
            let neutral = self.neutral;
            note("neutral", self.write_duty(neutral));
            note(
                "pwm stop",
                self.servo.stop().map_err(|e| map_hw_error(e.as_ref())),
            );
            self.servo_running = false;
        }
        self.lit = None;
        note("indicators", self.set_indicators(IndicatorPair::ALL_OFF));
        note("display", self.show(DisplayCommand::Stopped));
        note("separator", self.set_separator(false));

        tracing::info!(last_duty = ?self.last_duty.map(DutyCycle::get), "rig shut down");
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        if !self.shut_down
            && let Err(e) = self.shutdown()
        {
            tracing::error!(error = %e, "shutdown from drop failed");
        }
    }
}

/// Builder for `Rig`; every device is required.
#[derive(Default)]
pub struct RigBuilder {
    sensor: Option<Box<dyn AnalogInput + Send>>,
    button: Option<Box<dyn DigitalInput>>,
    primary: Option<Box<dyn DigitalOutput>>,
    secondary: Option<Box<dyn DigitalOutput>>,
    servo: Option<Box<dyn PwmOutput>>,
    display: Option<Box<dyn TextDisplay>>,
}

impl RigBuilder {
    pub fn with_sensor(mut self, sensor: impl AnalogInput + Send + 'static) -> Self {
        self.sensor = Some(Box::new(sensor));
        self
    }

    pub fn with_button(mut self, button: impl DigitalInput + 'static) -> Self {
        self.button = Some(Box::new(button));
        self
    }

    pub fn with_primary_led(mut self, led: impl DigitalOutput + 'static) -> Self {
        self.primary = Some(Box::new(led));
        self
    }

    pub fn with_secondary_led(mut self, led: impl DigitalOutput + 'static) -> Self {
        self.secondary = Some(Box::new(led));
        self
    }

    pub fn with_servo(mut self, servo: impl PwmOutput + 'static) -> Self {
        self.servo = Some(Box::new(servo));
        self
    }

    pub fn with_display(mut self, display: impl TextDisplay + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    pub fn build(self) -> Result<Rig> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let button = self
            .button
            .ok_or_else(|| eyre::Report::new(BuildError::MissingButton))?;
        let primary = self
            .primary
            .ok_or_else(|| eyre::Report::new(BuildError::MissingIndicator("primary")))?;
        let secondary = self
            .secondary
            .ok_or_else(|| eyre::Report::new(BuildError::MissingIndicator("secondary")))?;
        let servo = self
            .servo
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let display = self
            .display
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDisplay))?;

        Ok(Rig {
            sensor: Some(sensor),
            button,
            primary,
            secondary,
            servo,
            display,
            neutral: ActuatorCfg::default().range.neutral(),
            servo_running: false,
            shut_down: false,
            last_duty: None,
            shown: None,
            separator: None,
            lit: None,
        })
    }
}

/// Totals reported when the loop ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub toggles: u64,
    /// Ticks that showed ERR (undefined force or sensor failure while on).
    pub error_ticks: u64,
    /// Ticks where the step panicked or an output write failed.
    pub faults: u64,
    pub final_mode: DeviceMode,
    pub last_duty: Option<DutyCycle>,
}

/// Reading for a sampled tick: the newest sample, else the held value while
/// it is younger than `stale_after(period)` on the loop clock, else a sensor
/// error.
fn sampled_reading(
    sampler: &Sampler,
    held: &mut Option<(f32, Instant)>,
    period: Duration,
    now: Instant,
) -> Sample {
    match sampler.recv_timeout(period) {
        Some(Ok(v)) => {
            *held = Some((v, now));
            Ok(v)
        }
        Some(Err(e)) => Err(e),
        None => match *held {
            Some((v, at)) if now.saturating_duration_since(at) < stale_after(period) => Ok(v),
            _ => Err(GripError::Sensor("no fresh sample from sampler".into())),
        },
    }
}

/// Run the control loop until `stop` is set or `params.max_ticks` is reached.
///
/// The rig is shut down before returning; if this function unwinds, the
/// rig's `Drop` performs the same sequence.
pub fn run<C: Clock>(
    mut rig: Rig,
    mut controller: GripController,
    params: &LoopCfg,
    clock: &C,
    stop: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let period = tick_period(params.period_ms);
    rig.start(controller.actuator(), controller.mode())
        .wrap_err("start rig")?;

    let sampler = match params.mode {
        SamplingMode::Direct => None,
        SamplingMode::Sampled => {
            let sensor = rig.take_sensor().ok_or_else(|| {
                eyre::Report::new(GripError::State("sensor already taken".into()))
            })?;
            Some(Sampler::spawn(sensor, period, MonotonicClock::new()))
        }
    };
    let mut held: Option<(f32, Instant)> = None;

    tracing::info!(
        period_ms = params.period_ms,
        rate_hz = rate_hz(params.period_ms),
        mode = ?params.mode,
        start = %controller.mode(),
        "control loop start"
    );

    let mut summary = RunSummary {
        ticks: 0,
        toggles: 0,
        error_ticks: 0,
        faults: 0,
        final_mode: controller.mode(),
        last_duty: None,
    };

    while !stop.load(Ordering::Relaxed) {
        if params.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        let tick_start = clock.now();

        let button = rig.read_button();
        let sample = match &sampler {
            Some(s) => sampled_reading(s, &mut held, period, tick_start),
            None => rig.read_sensor(),
        };

        let cmd = match catch_unwind(AssertUnwindSafe(|| {
            controller.step(tick_start, button, sample)
        })) {
            Ok(cmd) => cmd,
            Err(_) => {
                tracing::error!(tick = summary.ticks, "controller step panicked; parking");
                summary.faults += 1;
                controller.safe_command()
            }
        };

        if let Some(r) = &cmd.reading {
            tracing::debug!(
                volts = r.volts,
                resistance_ohms = ?r.resistance_ohms,
                force_n = ?r.force,
                filtered_n = r.filtered,
                level = r.level.get(),
                duty_pct = cmd.duty.percent(),
                mode = %cmd.mode,
                "tick"
            );
        }
        if cmd.transition.is_some() {
            summary.toggles += 1;
        }
        if cmd.is_fault() {
            summary.error_ticks += 1;
        }

        if let Err(e) = rig.apply(&cmd) {
            tracing::warn!(error = %e, tick = summary.ticks, "output write failed; parking");
            summary.faults += 1;
            rig.park();
        }

        summary.ticks += 1;
        clock.sleep(sleep_budget(
            period,
            clock.now().saturating_duration_since(tick_start),
        ));
    }

    // Join the sampler thread before touching outputs for shutdown.
    drop(sampler);

    summary.final_mode = controller.mode();
    let shutdown = rig.shutdown();
    summary.last_duty = rig.last_duty();
    tracing::info!(
        ticks = summary.ticks,
        toggles = summary.toggles,
        error_ticks = summary.error_ticks,
        faults = summary.faults,
        "control loop stopped"
    );
    shutdown
        .map_err(eyre::Report::new)
        .wrap_err("shutdown sequence")?;
    Ok(summary)
}
