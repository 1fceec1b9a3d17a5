//! Sample -> volts -> force -> filtered force -> level.
use crate::calibration::{ForceModel, Volts};
use crate::classifier::{GripLevel, ThresholdTable};
use crate::filter::Ema;
use crate::status::Reading;

pub struct Pipeline {
    v_ref: f32,
    model: Box<dyn ForceModel + Send>,
    filter: Ema,
    table: ThresholdTable,
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline")
            .field("v_ref", &self.v_ref)
            .field("filter", &self.filter)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        v_ref: f32,
        model: Box<dyn ForceModel + Send>,
        filter: Ema,
        table: ThresholdTable,
    ) -> Self {
        Self {
            v_ref,
            model,
            filter,
            table,
        }
    }

    /// Evaluate one normalized sample.
    ///
    /// An undefined force enters the filter as 0 N and reports level 0, so a
    /// grip does not resume from the force seen before the fault.
    pub fn evaluate(&mut self, fraction: f32) -> Reading {
        let volts = Volts::from_fraction(fraction, self.v_ref);
        let resistance_ohms = self.model.resistance(volts);
        match self.model.estimate(volts) {
            Some(force) => {
                let filtered = self.filter.update(force);
                Reading {
                    volts: volts.get(),
                    resistance_ohms,
                    force: Some(force),
                    filtered,
                    level: self.table.classify(filtered),
                }
            }
            None => Reading {
                volts: volts.get(),
                resistance_ohms,
                force: None,
                filtered: self.release(),
                level: GripLevel::ZERO,
            },
        }
    }

    /// Feed 0 N for a tick without a usable force.
    pub fn release(&mut self) -> f32 {
        self.filter.update(0.0)
    }

    pub fn reset_filter(&mut self) {
        self.filter.reset();
    }

    pub fn level_max(&self) -> GripLevel {
        self.table.level_max()
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{LinearCalibration, ResistivePowerLaw};
    use crate::filter::Seed;

    #[test]
    fn undefined_force_decays_filter() {
        let mut p = Pipeline::new(
            3.3,
            Box::new(ResistivePowerLaw::default()),
            Ema::new(0.5, Seed::Zero),
            ThresholdTable::default(),
        );
        // 3 V -> R = 1 kΩ -> 1000 * 1000^-1.5 ≈ 0.0316 N
        let first = p.evaluate(3.0 / 3.3);
        assert!(first.force.is_some());
        let undefined = p.evaluate(1.0);
        assert_eq!(undefined.force, None);
        assert_eq!(undefined.level, GripLevel::ZERO);
        assert!((undefined.filtered - first.filtered * 0.5).abs() < 1e-7);
    }

    #[test]
    fn grip_does_not_resume_after_error_stretch() {
        let mut p = Pipeline::new(
            3.3,
            Box::new(ResistivePowerLaw {
                scale: 1e7,
                ..ResistivePowerLaw::default()
            }),
            Ema::default(),
            ThresholdTable::default(),
        );
        // 1.65 V -> R = 10 kΩ -> 10 N
        for _ in 0..20 {
            p.evaluate(0.5);
        }
        assert_eq!(p.evaluate(0.5).level.get(), 8);
        for _ in 0..20 {
            assert_eq!(p.evaluate(0.0).force, None);
        }
        let r = p.evaluate(0.01);
        assert!(r.force.is_some_and(|f| f < 0.1));
        assert!(r.filtered < 0.5, "filtered {}", r.filtered);
        assert_eq!(r.level, GripLevel::ZERO);
    }

    #[test]
    fn linear_pipeline_classifies_filtered_force() {
        let mut p = Pipeline::new(
            3.3,
            Box::new(LinearCalibration::new(16.46, 1.475)),
            Ema::default(),
            ThresholdTable::default(),
        );
        let r = p.evaluate(1.0 / 3.3);
        assert!((r.volts - 1.0).abs() < 1e-5);
        assert_eq!(r.level.get(), 5);
        assert_eq!(r.resistance_ohms, None);
    }
}
