//! Hobby servo on a hardware PWM channel.
use grip_traits::{HwResult, PwmOutput};
use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::debug;

use crate::error::{HwError, Result};

pub struct HardwareServo {
    channel: Channel,
    pwm: Option<Pwm>,
}

impl HardwareServo {
    /// Select PWM channel 0 or 1. The channel is not touched until `start`.
    pub fn open(channel: u8) -> Result<Self> {
        let channel = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("unsupported pwm channel {other}"))),
        };
        Ok(Self { channel, pwm: None })
    }
}

impl PwmOutput for HardwareServo {
    fn start(&mut self, initial_duty: f32, frequency_hz: f32) -> HwResult<()> {
        let pwm = Pwm::with_frequency(
            self.channel,
            f64::from(frequency_hz),
            f64::from(initial_duty),
            Polarity::Normal,
            true,
        )
        .map_err(|e| HwError::Pwm(e.to_string()))?;
        debug!(duty = initial_duty, frequency_hz, "pwm started");
        self.pwm = Some(pwm);
        Ok(())
    }

    fn set_duty_cycle(&mut self, duty: f32) -> HwResult<()> {
        if !(0.0..=1.0).contains(&duty) {
            return Err(Box::new(HwError::DutyOutOfRange(duty)));
        }
        let pwm = self.pwm.as_ref().ok_or(HwError::NotStarted)?;
        pwm.set_duty_cycle(f64::from(duty))
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }

    fn stop(&mut self) -> HwResult<()> {
        if let Some(pwm) = self.pwm.take() {
            pwm.disable().map_err(|e| HwError::Pwm(e.to_string()))?;
        }
        Ok(())
    }
}
