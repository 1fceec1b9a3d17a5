//! Button and indicator LEDs on the Raspberry Pi GPIO header.
use grip_traits::{ButtonLevel, DigitalInput, DigitalOutput, HwResult};
use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::error::{HwError, Result};

/// Mode button wired active-low with the internal pull-up enabled.
pub struct HardwareButton {
    pin: InputPin,
}

impl HardwareButton {
    pub fn open(bcm_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(format!("button pin {bcm_pin}: {e}")))?
            .into_input_pullup();
        Ok(Self { pin })
    }
}

impl DigitalInput for HardwareButton {
    fn read(&mut self) -> HwResult<ButtonLevel> {
        Ok(ButtonLevel::from_active_low(self.pin.is_high()))
    }
}

/// Indicator LED. The pin is driven low when the handle is dropped.
pub struct HardwareLed {
    pin: OutputPin,
}

impl HardwareLed {
    pub fn open(bcm_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(format!("led pin {bcm_pin}: {e}")))?
            .into_output_low();
        pin.set_reset_on_drop(true);
        Ok(Self { pin })
    }
}

impl DigitalOutput for HardwareLed {
    fn write(&mut self, on: bool) -> HwResult<()> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}
