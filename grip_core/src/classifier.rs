//! Force to grip level classification against an ascending threshold table.
use crate::error::BuildError;

/// Upper bound on table length.
pub const MAX_LEVELS: usize = grip_config::MAX_LEVELS;

/// Discrete grip level; 0 means no grip. Outside this crate a level can
/// only come from a [`ThresholdTable`], so it never exceeds that table's
/// `level_max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GripLevel(u8);

impl GripLevel {
    pub const ZERO: Self = Self(0);

    pub(crate) fn new(level: u8) -> Self {
        Self(level)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for GripLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly increasing, finite cut-points. `force >= t[i]` reaches level `i+1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    points: Vec<f32>,
}

impl ThresholdTable {
    pub fn new(points: Vec<f32>) -> Result<Self, BuildError> {
        if points.is_empty() || points.len() > MAX_LEVELS {
            return Err(BuildError::InvalidConfig(
                "threshold table must have 1..=16 entries",
            ));
        }
        if points.iter().any(|t| !t.is_finite()) {
            return Err(BuildError::InvalidConfig("thresholds must be finite"));
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(BuildError::InvalidConfig(
                "thresholds must be strictly increasing",
            ));
        }
        Ok(Self { points })
    }

    /// `[step, 2*step, ..., levels*step]`.
    pub fn uniform(step: f32, levels: u8) -> Result<Self, BuildError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(BuildError::InvalidConfig("threshold step must be > 0"));
        }
        Self::new((1..=levels).map(|i| step * f32::from(i)).collect())
    }

    pub fn points(&self) -> &[f32] {
        &self.points
    }

    /// Highest reachable level.
    pub fn level_max(&self) -> GripLevel {
        // Length is bounded by MAX_LEVELS, so it fits in a u8.
        GripLevel(self.points.len().min(MAX_LEVELS) as u8)
    }

    /// Level `n` of this table, or `None` above `level_max`.
    pub fn level(&self, n: u8) -> Option<GripLevel> {
        (usize::from(n) <= self.points.len()).then_some(GripLevel(n))
    }

    /// Number of thresholds at or below `force`. NaN classifies as 0.
    pub fn classify(&self, force: f32) -> GripLevel {
        if force.is_nan() {
            return GripLevel::ZERO;
        }
        let n = self.points.partition_point(|t| *t <= force);
        GripLevel(n.min(self.points.len()) as u8)
    }
}

impl Default for ThresholdTable {
    /// Eight half-Newton steps.
    fn default() -> Self {
        Self {
            points: (1..=8u8).map(|i| 0.5 * f32::from(i)).collect(),
        }
    }
}
