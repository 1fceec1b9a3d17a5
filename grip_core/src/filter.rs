//! Exponential moving average over force estimates.

/// How the accumulator is initialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Seed {
    /// Start from 0.0, so early outputs ramp up from zero.
    #[default]
    Zero,
    /// Start from the first sample seen.
    FirstSample,
}

/// `filtered = alpha * previous + (1 - alpha) * raw`, where `alpha` weights history.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    seed: Seed,
    value: Option<f32>,
}

impl Ema {
    /// `alpha` is clamped to [0, 1); NaN falls back to 0 (no smoothing).
    pub fn new(alpha: f32, seed: Seed) -> Self {
        let alpha = if alpha.is_nan() {
            0.0
        } else {
            alpha.clamp(0.0, 0.999_999)
        };
        let value = match seed {
            Seed::Zero => Some(0.0),
            Seed::FirstSample => None,
        };
        Self { alpha, seed, value }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Fold one sample into the accumulator and return the new value.
    pub fn update(&mut self, raw: f32) -> f32 {
        let next = match self.value {
            Some(prev) => self.alpha * prev + (1.0 - self.alpha) * raw,
            None => raw,
        };
        self.value = Some(next);
        next
    }

    /// Current value without updating; 0.0 before any sample with a first-sample seed.
    pub fn value(&self) -> f32 {
        self.value.unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.alpha, self.seed);
    }
}

impl Default for Ema {
    fn default() -> Self {
        Self::new(0.8, Seed::Zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_ramps_from_zero() {
        let mut f = Ema::default();
        let out: Vec<f32> = (0..3).map(|_| f.update(14.985)).collect();
        let want = [2.997, 5.3946, 7.31268];
        for (o, w) in out.iter().zip(want) {
            assert!((o - w).abs() < 1e-4, "{o} vs {w}");
        }
    }

    #[test]
    fn first_sample_seed_passes_first_value() {
        let mut f = Ema::new(0.8, Seed::FirstSample);
        assert_eq!(f.value(), 0.0);
        assert_eq!(f.update(5.0), 5.0);
        assert!((f.update(0.0) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn reset_restores_seed() {
        let mut f = Ema::default();
        f.update(10.0);
        f.reset();
        assert_eq!(f.value(), 0.0);
    }

    #[test]
    fn alpha_zero_tracks_input() {
        let mut f = Ema::new(0.0, Seed::Zero);
        assert_eq!(f.update(3.0), 3.0);
        assert_eq!(f.update(1.0), 1.0);
    }
}
