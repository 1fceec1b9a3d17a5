//! HT16K33 four-digit seven-segment backpack over I2C.
use grip_traits::{HwResult, TextDisplay};
use rppal::i2c::I2c;

use crate::error::{HwError, Result};
use crate::segments::{self, DIGITS};

const CMD_OSCILLATOR_ON: u8 = 0x21;
const CMD_DISPLAY_ON: u8 = 0x81;
const CMD_DISPLAY_OFF: u8 = 0x80;
const CMD_BRIGHTNESS_MAX: u8 = 0xEF;
/// Display RAM offsets of the four digits; the colon lives at offset 4.
const DIGIT_ADDR: [usize; DIGITS] = [0, 2, 6, 8];
const COLON_ADDR: usize = 4;
const COLON_BITS: u8 = 0x02;

pub struct Ht16k33 {
    i2c: I2c,
    digits: [u8; DIGITS],
    colon: bool,
}

impl Ht16k33 {
    pub fn open(bus: u8, address: u16) -> Result<Self> {
        let map = |e: rppal::i2c::Error| HwError::I2c(e.to_string());
        let mut i2c = I2c::with_bus(bus).map_err(map)?;
        i2c.set_slave_address(address).map_err(map)?;
        for cmd in [CMD_OSCILLATOR_ON, CMD_DISPLAY_ON, CMD_BRIGHTNESS_MAX] {
            i2c.write(&[cmd]).map_err(map)?;
        }
        let mut display = Self {
            i2c,
            digits: [0; DIGITS],
            colon: false,
        };
        display.flush()?;
        Ok(display)
    }

    fn flush(&mut self) -> Result<()> {
        let mut ram = [0u8; 16];
        for (addr, seg) in DIGIT_ADDR.iter().zip(self.digits) {
            ram[*addr] = seg;
        }
        if self.colon {
            ram[COLON_ADDR] = COLON_BITS;
        }
        self.i2c
            .block_write(0x00, &ram)
            .map_err(|e| HwError::I2c(e.to_string()))
    }
}

impl TextDisplay for Ht16k33 {
    fn show_text(&mut self, text: &str) -> HwResult<()> {
        self.digits = segments::encode(text);
        self.flush()?;
        Ok(())
    }

    fn set_separator(&mut self, on: bool) -> HwResult<()> {
        self.colon = on;
        self.flush()?;
        Ok(())
    }
}

impl Drop for Ht16k33 {
    fn drop(&mut self) {
        let _ = self.i2c.write(&[CMD_DISPLAY_OFF]);
    }
}
