//! Subcommand bodies: `run`, `probe` and `self-check`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use grip_config::{Config, LinearFit, StartMode};
use grip_core::hw_error::map_sensor_error;
use grip_core::util::tick_period;
use grip_core::{
    DutyCycle, GripController, GripError, LoopCfg, Reading, RunSummary, SamplingMode,
};
use grip_traits::{AnalogInput, Clock, MonotonicClock};

const PERIOD_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=1000;

/// Overrides from `grip run`.
#[derive(Debug, Default)]
pub struct RunOpts {
    pub start_off: bool,
    pub ticks: Option<u64>,
    pub period_ms: Option<u64>,
    pub sampled: bool,
}

fn loop_params(cfg: &Config, opts: &RunOpts) -> Result<LoopCfg, GripError> {
    let mut params = LoopCfg::from(&cfg.control_loop);
    if let Some(ms) = opts.period_ms {
        if !PERIOD_RANGE_MS.contains(&ms) {
            return Err(GripError::Config(format!(
                "--period-ms must be in [10, 1000], got {ms}"
            )));
        }
        params.period_ms = ms;
    }
    if opts.sampled {
        params.mode = SamplingMode::Sampled;
    }
    params.max_ticks = opts.ticks;
    Ok(params)
}

pub fn run(mut cfg: Config, fit: Option<LinearFit>, opts: RunOpts, json: bool) -> eyre::Result<()> {
    if opts.start_off {
        cfg.device.start_mode = StartMode::Off;
    }
    let params = loop_params(&cfg, &opts)?;
    let controller = GripController::from_config(&cfg, fit)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "ctrl-c handler not installed");
        }
    }

    let rig = crate::rig::acquire(&cfg)?;
    let summary = grip_core::run(rig, controller, &params, &MonotonicClock::new(), stop)
        .wrap_err("control loop")?;
    print_summary(&summary, json);
    Ok(())
}

fn print_summary(s: &RunSummary, json: bool) {
    let last_duty = s.last_duty.map(|d| d.get());
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ticks": s.ticks,
                "toggles": s.toggles,
                "error_ticks": s.error_ticks,
                "faults": s.faults,
                "final_mode": s.final_mode.to_string(),
                "last_duty": last_duty,
            })
        );
    } else {
        let duty = last_duty.map_or_else(|| "--".to_string(), |d| format!("{:.2}%", d * 100.0));
        println!(
            "stopped after {} ticks: mode={} toggles={} error_ticks={} faults={} last_duty={}",
            s.ticks, s.final_mode, s.toggles, s.error_ticks, s.faults, duty
        );
    }
}

fn fmt_opt(v: Option<f32>, unit: &str, prec: usize) -> String {
    v.map_or_else(|| "--".to_string(), |v| format!("{v:.prec$} {unit}"))
}

fn print_reading(i: u32, r: &Reading, duty: f32, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "sample": i,
                "volts": r.volts,
                "resistance_ohms": r.resistance_ohms,
                "force_n": r.force,
                "filtered_n": r.filtered,
                "level": r.level.get(),
                "duty": duty,
            })
        );
    } else {
        println!(
            "Voltage: {:.2} V | Resistance: {} | Force: {} | Filtered: {:.2} N | Grip Level: {} | Duty: {:.2}%",
            r.volts,
            fmt_opt(r.resistance_ohms, "ohm", 0),
            fmt_opt(r.force, "N", 2),
            r.filtered,
            r.level,
            duty * 100.0
        );
    }
}

/// Evaluate `samples` readings spaced one loop period apart on `clock`, so
/// the filtered column matches what the control loop would show.
fn sample_readings<C: Clock>(
    controller: &mut GripController,
    sensor: &mut dyn AnalogInput,
    samples: u32,
    period: Duration,
    clock: &C,
) -> eyre::Result<Vec<(Reading, DutyCycle)>> {
    let range = controller.duty_range();
    let on_fault = controller.actuator().on_fault;
    let count = samples.max(1);
    let mut out = Vec::with_capacity(count as usize);

    for i in 0..count {
        if i > 0 {
            clock.sleep(period);
        }
        let fraction = sensor
            .read()
            .map_err(|e| eyre::Report::new(map_sensor_error(e.as_ref())))?;
        let r = controller.evaluate(fraction);
        let duty = match r.force {
            Some(_) => range.to_duty_cycle(r.level, controller.level_max()),
            None => range.fault_duty(on_fault),
        };
        out.push((r, duty));
    }
    Ok(out)
}

/// Read the sensor `samples` times and print each stage of the pipeline.
/// No outputs are driven.
pub fn probe(cfg: &Config, fit: Option<LinearFit>, samples: u32, json: bool) -> eyre::Result<()> {
    let mut controller = GripController::from_config(cfg, fit)?;
    let mut sensor = crate::rig::acquire_sensor(cfg)?;
    let period = tick_period(cfg.control_loop.period_ms);

    let readings = sample_readings(
        &mut controller,
        sensor.as_mut(),
        samples,
        period,
        &MonotonicClock::new(),
    )?;
    for (i, (r, duty)) in (0u32..).zip(&readings) {
        print_reading(i, r, duty.get(), json);
    }
    Ok(())
}

/// Build the controller, acquire every device, then release them through the
/// regular shutdown path.
pub fn self_check(cfg: &Config, fit: Option<LinearFit>, json: bool) -> eyre::Result<()> {
    let controller = GripController::from_config(cfg, fit)?;
    let mut rig = crate::rig::acquire(cfg)?;
    rig.shutdown()?;
    drop(rig);

    let model = if fit.is_some() { "linear" } else { "configured" };
    let levels = controller.level_max().get();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "backend": crate::rig::BACKEND,
                "levels": levels,
                "model": model,
            })
        );
    } else {
        println!(
            "self-check ok (backend: {}, levels: {levels}, model: {model})",
            crate::rig::BACKEND
        );
    }
    Ok(())
}
