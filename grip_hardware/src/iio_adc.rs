//! Analog input through the Linux IIO sysfs interface.
use std::path::PathBuf;

use grip_traits::{AnalogInput, HwResult};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{counts_to_fraction, parse_sysfs_u32};

pub struct IioAdc {
    path: PathBuf,
    full_scale: u32,
}

impl IioAdc {
    /// Open `in_voltage<channel>_raw` of IIO device `device`; fails if the
    /// attribute is missing or unreadable.
    pub fn open(device: u8, channel: u8, full_scale: u32) -> Result<Self> {
        let path = PathBuf::from(format!(
            "/sys/bus/iio/devices/iio:device{device}/in_voltage{channel}_raw"
        ));
        let mut adc = Self { path, full_scale };
        adc.read_counts()?;
        Ok(adc)
    }

    fn read_counts(&mut self) -> Result<u32> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_sysfs_u32(&text)
            .ok_or_else(|| HwError::Adc(format!("unparsable sample {:?}", text.trim())))
    }
}

impl AnalogInput for IioAdc {
    fn read(&mut self) -> HwResult<f32> {
        let raw = self.read_counts()?;
        trace!(raw, "adc sample");
        Ok(counts_to_fraction(raw, self.full_scale))
    }
}
