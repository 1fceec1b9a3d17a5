//! Per-tick outputs: what the display, LEDs and servo should show.
use crate::actuator::DutyCycle;
use crate::classifier::GripLevel;
use crate::state::DeviceMode;

/// Text shown on the 4-digit display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommand {
    Level(GripLevel),
    Off,
    Error,
    Stopped,
}

impl DisplayCommand {
    pub fn text(&self) -> String {
        match self {
            Self::Level(l) => format!("ON{l}"),
            Self::Off => "OFF".to_string(),
            Self::Error => "ERR".to_string(),
            Self::Stopped => "----".to_string(),
        }
    }
}

/// Primary ("active") and secondary ("off") indicator LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPair {
    pub primary: bool,
    pub secondary: bool,
}

impl IndicatorPair {
    pub const ALL_OFF: Self = Self {
        primary: false,
        secondary: false,
    };

    pub fn for_mode(mode: DeviceMode) -> Self {
        Self {
            primary: mode.is_on(),
            secondary: !mode.is_on(),
        }
    }
}

/// Diagnostic view of one pipeline evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub volts: f32,
    pub resistance_ohms: Option<f32>,
    /// `None` when the estimate was undefined or the sensor could not be read.
    pub force: Option<f32>,
    pub filtered: f32,
    pub level: GripLevel,
}

/// Everything the loop must apply for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickCommand {
    pub mode: DeviceMode,
    pub duty: DutyCycle,
    pub indicators: IndicatorPair,
    pub display: DisplayCommand,
    pub separator: bool,
    /// Set on the tick the button toggled the mode.
    pub transition: Option<DeviceMode>,
    /// Absent when the sensor could not be read at all.
    pub reading: Option<Reading>,
}

impl TickCommand {
    pub fn is_fault(&self) -> bool {
        self.display == DisplayCommand::Error
    }
}
