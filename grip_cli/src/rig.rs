//! Device acquisition: real hardware behind the `hardware` feature on Linux,
//! a scripted simulation everywhere else.

use eyre::Result;
use grip_core::Rig;
use grip_traits::AnalogInput;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub const BACKEND: &str = "hardware";
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub const BACKEND: &str = "sim";

/// Simulated divider voltages, comma separated; the last value is held.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub const SIM_VOLTS_ENV: &str = "GRIP_SIM_VOLTS";
/// Simulated button line per tick, e.g. `1101`; `0` is pressed (active low).
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub const SIM_BUTTON_ENV: &str = "GRIP_SIM_BUTTON";

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn acquire_err(device: &'static str) -> impl FnOnce(grip_hardware::error::HwError) -> eyre::Report {
    move |e| {
        eyre::Report::new(grip_core::GripError::Acquire {
            device,
            reason: e.to_string(),
        })
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn acquire(cfg: &grip_config::Config) -> Result<Rig> {
    use grip_hardware::gpio::{HardwareButton, HardwareLed};
    use grip_hardware::ht16k33::Ht16k33;
    use grip_hardware::servo::HardwareServo;

    let p = &cfg.pins;
    // PWM last: anything acquired before a failure is released on return,
    // and no output is left driven.
    let display = Ht16k33::open(p.i2c_bus, p.display_addr).map_err(acquire_err("display"))?;
    let primary = HardwareLed::open(p.led_primary).map_err(acquire_err("primary LED"))?;
    let secondary = HardwareLed::open(p.led_secondary).map_err(acquire_err("secondary LED"))?;
    let button = HardwareButton::open(p.button).map_err(acquire_err("button"))?;
    let sensor = open_adc(cfg)?;
    let servo = HardwareServo::open(p.pwm_channel).map_err(acquire_err("servo PWM"))?;
    tracing::info!(
        button = p.button,
        led_primary = p.led_primary,
        led_secondary = p.led_secondary,
        pwm_channel = p.pwm_channel,
        adc_channel = p.adc_channel,
        "hardware acquired"
    );

    Rig::builder()
        .with_sensor(sensor)
        .with_button(button)
        .with_primary_led(primary)
        .with_secondary_led(secondary)
        .with_servo(servo)
        .with_display(display)
        .build()
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_adc(cfg: &grip_config::Config) -> Result<grip_hardware::iio_adc::IioAdc> {
    let p = &cfg.pins;
    grip_hardware::iio_adc::IioAdc::open(p.adc_device, p.adc_channel, cfg.sensor.adc_full_scale)
        .map_err(acquire_err("ADC"))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn acquire_sensor(cfg: &grip_config::Config) -> Result<Box<dyn AnalogInput + Send>> {
    Ok(Box::new(open_adc(cfg)?))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn sim_sensor(cfg: &grip_config::Config) -> Result<grip_hardware::SimulatedSensor> {
    let volts = match std::env::var(SIM_VOLTS_ENV) {
        Ok(s) => s
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                eyre::Report::new(grip_core::GripError::Config(format!(
                    "{SIM_VOLTS_ENV} must be comma separated volts: {e}"
                )))
            })?,
        Err(_) => vec![1.0],
    };
    Ok(grip_hardware::SimulatedSensor::from_volts(
        &volts,
        cfg.sensor.v_ref,
    ))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn acquire(cfg: &grip_config::Config) -> Result<Rig> {
    use grip_hardware::{SimulatedButton, SimulatedDisplay, SimulatedLed, SimulatedServo};

    let button = std::env::var(SIM_BUTTON_ENV)
        .map(|p| SimulatedButton::from_pattern(&p))
        .unwrap_or_default();
    tracing::info!("simulated devices acquired");
    Rig::builder()
        .with_sensor(sim_sensor(cfg)?)
        .with_button(button)
        .with_primary_led(SimulatedLed::new())
        .with_secondary_led(SimulatedLed::new())
        .with_servo(SimulatedServo::new())
        .with_display(SimulatedDisplay::new())
        .build()
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn acquire_sensor(cfg: &grip_config::Config) -> Result<Box<dyn AnalogInput + Send>> {
    Ok(Box::new(sim_sensor(cfg)?))
}
