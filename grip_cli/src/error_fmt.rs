//! Human-readable error descriptions, exit codes, and structured JSON errors.

use grip_core::error::{BuildError, GripError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `grip self-check`."
            ),
            missing => format!(
                "What happened: Device rig incomplete ({missing}).\nLikely causes: A device handle was not wired into the rig builder.\nHow to fix: This is a bug in the binary; re-run with --log-level=debug and report it."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GripError>() {
        return match ge {
            GripError::Acquire { device, reason } => format!(
                "What happened: Could not open the {device} ({reason}).\nLikely causes: Wrong numbers in [pins], device overlay (PWM, I2C, IIO ADC) not enabled, or missing permissions.\nHow to fix: Check [pins] in the config, enable the overlays, and run as a user in the gpio/i2c groups."
            ),
            GripError::Config(msg) if msg.to_ascii_lowercase().contains("calibration csv must have headers") => {
                "What happened: Invalid headers in calibration CSV. Expected 'volts,newtons'.\nLikely causes: Wrong column names or a missing header row.\nHow to fix: Make the first line exactly `volts,newtons`.".to_string()
            }
            GripError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Missing [pins] keys, a typo, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
            ),
            GripError::Sensor(msg) => format!(
                "What happened: Force sensor could not be read ({msg}).\nLikely causes: ADC not wired or powered, or wrong adc_device/adc_channel.\nHow to fix: Verify the divider wiring and the [pins] ADC settings."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Unexpected error: {msg}.{cause}\nHow to fix: Re-run with --log-level=debug for details."
    )
}

/// 3 for hardware acquisition, 4 for configuration, 1 otherwise.
/// Usage errors exit with 2 from clap before any of this runs.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<GripError>() {
        Some(GripError::Acquire { .. }) => return 3,
        Some(GripError::Config(_)) => return 4,
        _ => {}
    }
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ge) = err.downcast_ref::<GripError>() {
        return match ge {
            GripError::Hardware(_) => "Hardware",
            GripError::HardwareFault(_) => "HardwareFault",
            GripError::Acquire { .. } => "Acquire",
            GripError::Config(_) => "Config",
            GripError::Sensor(_) => "Sensor",
            GripError::State(_) => "State",
        };
    }
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(_)) => "Config",
        Some(_) => "Build",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    if let Some(GripError::Acquire { device, .. }) = err.downcast_ref::<GripError>() {
        return json!({ "reason": "Acquire", "details": { "device": device }, "message": msg })
            .to_string();
    }
    json!({ "reason": reason_name(err), "message": msg }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_4() {
        let e = eyre::Report::new(GripError::Config("loop.period_ms must be in [10, 1000]".into()));
        assert_eq!(exit_code_for_error(&e), 4);
        assert!(humanize(&e).contains("loop.period_ms"));
    }

    #[test]
    fn acquisition_errors_exit_3_with_device_detail() {
        let e = eyre::Report::new(GripError::Acquire {
            device: "display",
            reason: "i2c bus 1 not found".into(),
        });
        assert_eq!(exit_code_for_error(&e), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Acquire");
        assert_eq!(v["details"]["device"], "display");
    }

    #[test]
    fn wrapped_errors_keep_their_code() {
        use eyre::WrapErr;
        let r: eyre::Result<()> = Err(GripError::Config("bad".into())).wrap_err("load config");
        let e = r.unwrap_err();
        assert_eq!(exit_code_for_error(&e), 4);
    }

    #[test]
    fn unknown_errors_are_generic() {
        let e = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(format_error_json(&e).contains("\"reason\":\"Error\""));
    }
}
