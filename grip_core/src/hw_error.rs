//! Device errors arrive boxed from the `grip_traits` methods. These helpers
//! turn them into `GripError` so the loop can decide what a failure means.
//! With `hardware-errors` enabled, `grip_hardware::error::HwError` is
//! recognised by downcast.

use crate::error::GripError;

/// Map a trait-boundary error to a typed `GripError`.
///
/// Unknown error types keep only their message.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GripError {
    #[cfg(feature = "hardware-errors")]
    {
        use grip_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Adc(msg) => GripError::Sensor(msg.clone()),
                HwError::DutyOutOfRange(_) | HwError::NotStarted => {
                    GripError::State(hw.to_string())
                }
                HwError::Io(_) => GripError::Hardware(hw.to_string()),
                other => GripError::HardwareFault(other.to_string()),
            };
        }
    }

    GripError::Hardware(e.to_string())
}

/// Sensor-side variant: any failure reading the analog channel is a sensor error.
pub fn map_sensor_error(e: &(dyn std::error::Error + 'static)) -> GripError {
    match map_hw_error(e) {
        GripError::Hardware(s) | GripError::HardwareFault(s) => GripError::Sensor(s),
        other => other,
    }
}
