//! Grip level to servo duty cycle.
use crate::classifier::GripLevel;
use crate::error::BuildError;

/// PWM duty as a fraction of the period, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct DutyCycle(f32);

impl DutyCycle {
    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }

    /// Percent of period, for display in logs.
    pub fn percent(self) -> f32 {
        self.0 * 100.0
    }
}

/// What the actuator receives while the force estimate is undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaultCommand {
    #[default]
    Neutral,
    Minimum,
}

/// Servo travel as a duty range; `min` is an open hand, `max` full grip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyRange {
    min: f32,
    max: f32,
}

impl DutyRange {
    pub fn new(min: f32, max: f32) -> Result<Self, BuildError> {
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && max <= 1.0 && min < max) {
            return Err(BuildError::InvalidConfig(
                "duty range must satisfy 0 <= min < max <= 1",
            ));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> DutyCycle {
        DutyCycle(self.min)
    }

    pub fn max(&self) -> DutyCycle {
        DutyCycle(self.max)
    }

    /// Midpoint of the range.
    pub fn neutral(&self) -> DutyCycle {
        DutyCycle(self.min + (self.max - self.min) / 2.0)
    }

    /// Linear map of `level / level_max` onto the range. Levels above
    /// `level_max` are clamped; `level_max == 0` gives `min`.
    pub fn to_duty_cycle(&self, level: GripLevel, level_max: GripLevel) -> DutyCycle {
        let top = level_max.get();
        if top == 0 {
            return self.min();
        }
        let level = level.get().min(top);
        if level == top {
            return self.max();
        }
        let frac = f32::from(level) / f32::from(top);
        DutyCycle((self.min + frac * (self.max - self.min)).clamp(self.min, self.max))
    }

    pub fn fault_duty(&self, cmd: FaultCommand) -> DutyCycle {
        match cmd {
            FaultCommand::Neutral => self.neutral(),
            FaultCommand::Minimum => self.min(),
        }
    }
}

impl Default for DutyRange {
    fn default() -> Self {
        Self {
            min: 0.05,
            max: 0.10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lvl(n: u8) -> GripLevel {
        GripLevel::new(n)
    }

    #[test]
    fn endpoints_are_exact() {
        let r = DutyRange::default();
        assert_eq!(r.to_duty_cycle(lvl(0), lvl(8)).get(), 0.05);
        assert_eq!(r.to_duty_cycle(lvl(8), lvl(8)).get(), 0.10);
        assert_eq!(r.to_duty_cycle(lvl(12), lvl(8)).get(), 0.10);
    }

    #[test]
    fn neutral_is_midpoint() {
        let r = DutyRange::default();
        assert!((r.neutral().get() - 0.075).abs() < 1e-7);
        assert!((r.to_duty_cycle(lvl(4), lvl(8)).get() - 0.075).abs() < 1e-7);
    }

    #[test]
    fn zero_level_max_maps_to_min() {
        let r = DutyRange::default();
        assert_eq!(r.to_duty_cycle(lvl(3), lvl(0)).get(), 0.05);
    }

    #[test]
    fn fault_duty_follows_policy() {
        let r = DutyRange::default();
        assert_eq!(r.fault_duty(FaultCommand::Minimum), r.min());
        assert_eq!(r.fault_duty(FaultCommand::Neutral), r.neutral());
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(DutyRange::new(0.1, 0.05).is_err());
        assert!(DutyRange::new(0.0, 1.5).is_err());
        assert!(DutyRange::new(f32::NAN, 0.1).is_err());
    }
}
