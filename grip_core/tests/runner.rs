use grip_core::error::BuildError;
use grip_core::{
    ForceModel, GripController, LinearCalibration, LoopCfg, Rig, SamplingMode, Volts, run,
};
use grip_hardware::{
    DisplayLog, LedState, Probe, ServoLog, SimulatedButton, SimulatedDisplay, SimulatedLed,
    SimulatedSensor, SimulatedServo,
};
use grip_traits::{AnalogInput, ButtonLevel, DigitalInput, HwResult, ManualClock, PwmOutput};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

const ONE_VOLT: f32 = 1.0 / 3.3;
const NEUTRAL: f32 = 0.075;

struct Probes {
    servo: Probe<ServoLog>,
    display: Probe<DisplayLog>,
    primary: Probe<LedState>,
    secondary: Probe<LedState>,
}

impl Probes {
    fn assert_parked(&self) {
        let servo = self.servo.get();
        let last = servo.last_duty().expect("servo was commanded");
        assert!((last - NEUTRAL).abs() < 1e-6, "last duty {last}");
        assert!(servo.stopped);
        let display = self.display.get();
        assert_eq!(display.last_text(), Some("----"));
        assert_eq!(display.separator, Some(false));
        assert_eq!(self.primary.get().on, Some(false));
        assert_eq!(self.secondary.get().on, Some(false));
    }
}

fn rig_with(
    sensor: impl AnalogInput + Send + 'static,
    button: impl DigitalInput + 'static,
    servo: impl PwmOutput + 'static,
    servo_probe: Probe<ServoLog>,
) -> (Rig, Probes) {
    let display = SimulatedDisplay::new();
    let primary = SimulatedLed::new();
    let secondary = SimulatedLed::new();
    let probes = Probes {
        servo: servo_probe,
        display: display.probe(),
        primary: primary.probe(),
        secondary: secondary.probe(),
    };
    let rig = Rig::builder()
        .with_sensor(sensor)
        .with_button(button)
        .with_primary_led(primary)
        .with_secondary_led(secondary)
        .with_servo(servo)
        .with_display(display)
        .build()
        .expect("rig build");
    (rig, probes)
}

fn sim_rig(sensor: SimulatedSensor, button: SimulatedButton) -> (Rig, Probes) {
    let servo = SimulatedServo::new();
    let probe = servo.probe();
    rig_with(sensor, button, servo, probe)
}

fn linear() -> GripController {
    GripController::builder()
        .with_model(LinearCalibration::new(16.46, 1.475))
        .build()
        .unwrap()
}

fn ticks(n: u64) -> LoopCfg {
    LoopCfg {
        max_ticks: Some(n),
        ..LoopCfg::default()
    }
}

#[test]
fn bounded_run_writes_one_duty_per_tick_and_parks() {
    let (rig, probes) = sim_rig(SimulatedSensor::constant(ONE_VOLT), SimulatedButton::released());
    let clock = ManualClock::new();
    let summary = run(
        rig,
        linear(),
        &ticks(5),
        &clock,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.toggles, 0);
    assert_eq!(summary.faults, 0);
    assert!((summary.last_duty.unwrap().get() - NEUTRAL).abs() < 1e-6);
    assert_eq!(clock.elapsed().as_millis(), 500);

    let servo = probes.servo.get();
    let (initial, hz) = servo.started.expect("servo started");
    assert!((initial - NEUTRAL).abs() < 1e-6);
    assert_eq!(hz, 50.0);
    // start + 5 ticks + shutdown
    assert_eq!(servo.duties.len(), 7);
    assert!((servo.duties[1] - 0.08125).abs() < 1e-6);
    assert!(servo.duties[2..6].iter().all(|d| (d - 0.10).abs() < 1e-6));

    // Unchanged text is not rewritten.
    assert_eq!(probes.display.get().texts, vec!["ON5", "ON8", "----"]);
    assert_eq!(probes.primary.get().writes, 2);
    probes.assert_parked();
}

#[test]
fn button_press_switches_off_and_holds_neutral() {
    let (rig, probes) = sim_rig(
        SimulatedSensor::constant(ONE_VOLT),
        SimulatedButton::from_pattern("1100000111"),
    );
    let summary = run(
        rig,
        linear(),
        &ticks(10),
        &ManualClock::new(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    assert_eq!(summary.toggles, 1);
    assert_eq!(summary.final_mode, grip_core::DeviceMode::Off);
    let servo = probes.servo.get();
    // start, tick 0, tick 1, then neutral from the press onwards
    assert!(servo.duties[3..].iter().all(|d| (d - NEUTRAL).abs() < 1e-6));
    let texts = probes.display.get().texts;
    assert_eq!(texts, vec!["ON5", "ON8", "OFF", "----"]);
    probes.assert_parked();
}

struct StopAfter {
    reads: AtomicUsize,
    after: usize,
    stop: Arc<AtomicBool>,
}

impl DigitalInput for StopAfter {
    fn read(&mut self) -> HwResult<ButtonLevel> {
        if self.reads.fetch_add(1, Ordering::Relaxed) + 1 >= self.after {
            self.stop.store(true, Ordering::Relaxed);
        }
        Ok(ButtonLevel::Released)
    }
}

#[test]
fn stop_token_ends_loop_after_current_tick() {
    let stop = Arc::new(AtomicBool::new(false));
    let button = StopAfter {
        reads: AtomicUsize::new(0),
        after: 3,
        stop: stop.clone(),
    };
    let servo = SimulatedServo::new();
    let probe = servo.probe();
    let (rig, probes) = rig_with(SimulatedSensor::constant(ONE_VOLT), button, servo, probe);
    let summary = run(rig, linear(), &LoopCfg::default(), &ManualClock::new(), stop).unwrap();
    assert_eq!(summary.ticks, 3);
    probes.assert_parked();
}

#[test]
fn stop_before_start_still_parks() {
    let (rig, probes) = sim_rig(SimulatedSensor::constant(ONE_VOLT), SimulatedButton::released());
    let summary = run(
        rig,
        linear(),
        &LoopCfg::default(),
        &ManualClock::new(),
        Arc::new(AtomicBool::new(true)),
    )
    .unwrap();
    assert_eq!(summary.ticks, 0);
    probes.assert_parked();
}

struct FailingSensor;

impl AnalogInput for FailingSensor {
    fn read(&mut self) -> HwResult<f32> {
        Err("adc offline".into())
    }
}

#[test]
fn sensor_failure_shows_err_every_tick() {
    let servo = SimulatedServo::new();
    let probe = servo.probe();
    let (rig, probes) = rig_with(FailingSensor, SimulatedButton::released(), servo, probe);
    let summary = run(
        rig,
        linear(),
        &ticks(4),
        &ManualClock::new(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(summary.error_ticks, 4);
    let servo = probes.servo.get();
    assert!(servo.duties.iter().all(|d| (d - NEUTRAL).abs() < 1e-6));
    assert_eq!(probes.display.get().texts, vec!["ERR", "----"]);
}

/// Servo that rejects the n-th duty update after start.
struct FlakyServo {
    inner: SimulatedServo,
    calls: usize,
    fail_on: usize,
}

impl PwmOutput for FlakyServo {
    fn start(&mut self, initial_duty: f32, frequency_hz: f32) -> HwResult<()> {
        self.inner.start(initial_duty, frequency_hz)
    }
    fn set_duty_cycle(&mut self, duty: f32) -> HwResult<()> {
        self.calls += 1;
        if self.calls == self.fail_on {
            return Err("pwm write failed".into());
        }
        self.inner.set_duty_cycle(duty)
    }
    fn stop(&mut self) -> HwResult<()> {
        self.inner.stop()
    }
}

#[test]
fn output_fault_parks_and_continues() {
    let inner = SimulatedServo::new();
    let probe = inner.probe();
    let servo = FlakyServo {
        inner,
        calls: 0,
        fail_on: 2,
    };
    let (rig, probes) = rig_with(
        SimulatedSensor::constant(ONE_VOLT),
        SimulatedButton::released(),
        servo,
        probe,
    );
    let summary = run(
        rig,
        linear(),
        &ticks(4),
        &ManualClock::new(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.faults, 1);
    let duties = probes.servo.get().duties;
    // start, tick0, (tick1 failed) park, tick2, tick3, shutdown
    assert_eq!(duties.len(), 6);
    assert!((duties[2] - NEUTRAL).abs() < 1e-6);
    probes.assert_parked();
}

struct PanickyModel;

impl ForceModel for PanickyModel {
    fn estimate(&self, _v: Volts) -> Option<f32> {
        panic!("model blew up");
    }
}

#[test]
fn panicking_step_is_contained() {
    let (rig, probes) = sim_rig(SimulatedSensor::constant(ONE_VOLT), SimulatedButton::released());
    let controller = GripController::builder()
        .with_model(PanickyModel)
        .build()
        .unwrap();
    let summary = run(
        rig,
        controller,
        &ticks(3),
        &ManualClock::new(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(summary.faults, 3);
    let servo = probes.servo.get();
    assert!(servo.duties.iter().all(|d| (d - NEUTRAL).abs() < 1e-6));
    probes.assert_parked();
}

struct PanickyButton(usize);

impl DigitalInput for PanickyButton {
    fn read(&mut self) -> HwResult<ButtonLevel> {
        self.0 += 1;
        if self.0 == 3 {
            panic!("gpio driver panic");
        }
        Ok(ButtonLevel::Released)
    }
}

#[test]
fn panic_outside_step_still_parks_via_drop() {
    let servo = SimulatedServo::new();
    let probe = servo.probe();
    let (rig, probes) = rig_with(
        SimulatedSensor::constant(ONE_VOLT),
        PanickyButton(0),
        servo,
        probe,
    );
    let result = catch_unwind(AssertUnwindSafe(|| {
        run(
            rig,
            linear(),
            &ticks(10),
            &ManualClock::new(),
            Arc::new(AtomicBool::new(false)),
        )
    }));
    assert!(result.is_err());
    probes.assert_parked();
}

struct DeadServo;

impl PwmOutput for DeadServo {
    fn start(&mut self, _initial_duty: f32, _frequency_hz: f32) -> HwResult<()> {
        Err("pwm channel busy".into())
    }
    fn set_duty_cycle(&mut self, _duty: f32) -> HwResult<()> {
        Err("pwm channel busy".into())
    }
    fn stop(&mut self) -> HwResult<()> {
        Ok(())
    }
}

#[test]
fn start_failure_returns_error_and_blanks_outputs() {
    let (rig, probes) = rig_with(
        SimulatedSensor::constant(ONE_VOLT),
        SimulatedButton::released(),
        DeadServo,
        Probe::default(),
    );
    let err = run(
        rig,
        linear(),
        &ticks(3),
        &ManualClock::new(),
        Arc::new(AtomicBool::new(false)),
    )
    .expect_err("start must fail");
    assert!(format!("{err:#}").contains("start"));
    assert_eq!(probes.display.get().last_text(), Some("----"));
    assert_eq!(probes.primary.get().on, Some(false));
}

#[test]
fn sampled_mode_runs_and_joins_sampler() {
    let (rig, probes) = sim_rig(SimulatedSensor::constant(ONE_VOLT), SimulatedButton::released());
    let params = LoopCfg {
        period_ms: 10,
        mode: SamplingMode::Sampled,
        max_ticks: Some(10),
    };
    let summary = run(
        rig,
        linear(),
        &params,
        &ManualClock::new(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(summary.ticks, 10);
    assert!(summary.error_ticks < 10);
    assert!(probes.display.get().texts.iter().any(|t| t == "ON8"));
    probes.assert_parked();
}

/// Delivers one reading, then stalls far longer than the test runs.
struct StallingSensor {
    reads: usize,
}

impl AnalogInput for StallingSensor {
    fn read(&mut self) -> HwResult<f32> {
        self.reads += 1;
        if self.reads > 1 {
            std::thread::sleep(Duration::from_millis(1000));
        }
        Ok(ONE_VOLT)
    }
}

#[test]
fn sampled_staleness_follows_loop_clock() {
    let servo = SimulatedServo::new();
    let probe = servo.probe();
    let (rig, _probes) = rig_with(
        StallingSensor { reads: 0 },
        SimulatedButton::released(),
        servo,
        probe,
    );
    let params = LoopCfg {
        period_ms: 50,
        mode: SamplingMode::Sampled,
        max_ticks: Some(6),
    };
    let clock = ManualClock::new();
    let summary = run(
        rig,
        linear(),
        &params,
        &clock,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    // Loop time 0 ms: fresh. 50..150 ms: held. 200 and 250 ms: stale.
    assert_eq!(summary.ticks, 6);
    assert_eq!(summary.error_ticks, 2);
    assert_eq!(clock.elapsed(), Duration::from_millis(300));
}

#[test]
fn rig_builder_reports_missing_pieces() {
    let err = Rig::builder()
        .with_sensor(SimulatedSensor::default())
        .with_button(SimulatedButton::released())
        .with_primary_led(SimulatedLed::new())
        .build()
        .expect_err("secondary missing");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingIndicator("secondary")) => {}
        other => panic!("expected MissingIndicator, got: {other:?}"),
    }

    let err = Rig::builder().build().expect_err("nothing set");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingSensor)
    ));
}
