//! Voltage to force conversion.
//!
//! Two strategies sit behind [`ForceModel`]: the FSR divider power law used on
//! the prototype, and a linear fit produced from a calibration table. Both
//! return `None` ("undefined") when the input cannot be mapped to a force.

/// Divider output voltage, always finite and >= 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Volts(f32);

impl Volts {
    /// Non-finite or negative input is treated as 0 V.
    pub fn new(v: f32) -> Self {
        if v.is_finite() && v > 0.0 {
            Self(v)
        } else {
            Self(0.0)
        }
    }

    /// Convert a normalized ADC fraction against the reference voltage.
    /// The fraction is clamped to [0, 1]; NaN reads as 0.
    pub fn from_fraction(fraction: f32, v_ref: f32) -> Self {
        let f = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        Self::new(f * v_ref)
    }

    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }
}

/// Force in Newtons, or `None` when undefined for this input.
pub type ForceEstimate = Option<f32>;

pub trait ForceModel {
    fn estimate(&self, v: Volts) -> ForceEstimate;

    /// Sensor resistance behind this estimate, when the model has one.
    fn resistance(&self, _v: Volts) -> Option<f32> {
        None
    }
}

/// FSR in a voltage divider with a fixed resistor to ground:
/// `R = r_fixed * (v_ref - V) / V`, `force = scale * R^-exponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResistivePowerLaw {
    pub r_fixed_ohms: f32,
    pub v_ref: f32,
    pub exponent: f32,
    pub scale: f32,
    pub min_ohms: Option<f32>,
    pub max_ohms: Option<f32>,
}

impl Default for ResistivePowerLaw {
    fn default() -> Self {
        Self {
            r_fixed_ohms: 10_000.0,
            v_ref: 3.3,
            exponent: 1.5,
            scale: 1_000.0,
            min_ohms: None,
            max_ohms: None,
        }
    }
}

impl ResistivePowerLaw {
    /// Sensor resistance for a divider voltage. Undefined unless `0 < V < v_ref`.
    pub fn divider_resistance(&self, v: Volts) -> Option<f32> {
        let v = v.get();
        if !(v > 0.0 && v < self.v_ref) {
            return None;
        }
        let r = self.r_fixed_ohms * (self.v_ref - v) / v;
        r.is_finite().then_some(r)
    }

    /// Power-law force for a resistance; zero for missing or non-positive `r`.
    pub fn force_from_resistance(&self, r: Option<f32>) -> f32 {
        match r {
            Some(r) if r.is_finite() && r > 0.0 => {
                let f = self.scale * r.powf(-self.exponent);
                if f.is_finite() { f.max(0.0) } else { 0.0 }
            }
            _ => 0.0,
        }
    }

    fn within_window(&self, r: f32) -> bool {
        self.min_ohms.is_none_or(|lo| r >= lo) && self.max_ohms.is_none_or(|hi| r <= hi)
    }
}

impl ForceModel for ResistivePowerLaw {
    fn estimate(&self, v: Volts) -> ForceEstimate {
        let r = self.divider_resistance(v)?;
        if !self.within_window(r) {
            return None;
        }
        Some(self.force_from_resistance(Some(r)))
    }

    fn resistance(&self, v: Volts) -> Option<f32> {
        self.divider_resistance(v)
    }
}

/// `force = a*V - b`, negative results clamped to 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCalibration {
    pub a: f32,
    pub b: f32,
}

impl LinearCalibration {
    pub fn new(a: f32, b: f32) -> Self {
        Self { a, b }
    }
}

impl ForceModel for LinearCalibration {
    fn estimate(&self, v: Volts) -> ForceEstimate {
        let f = self.a * v.get() - self.b;
        f.is_finite().then(|| f.max(0.0))
    }
}

impl From<grip_config::LinearFit> for LinearCalibration {
    fn from(fit: grip_config::LinearFit) -> Self {
        Self::new(fit.a, fit.b)
    }
}

/// Model selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationModel {
    Resistive(ResistivePowerLaw),
    Linear(LinearCalibration),
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self::Resistive(ResistivePowerLaw::default())
    }
}

impl ForceModel for CalibrationModel {
    fn estimate(&self, v: Volts) -> ForceEstimate {
        match self {
            Self::Resistive(m) => m.estimate(v),
            Self::Linear(m) => m.estimate(v),
        }
    }

    fn resistance(&self, v: Volts) -> Option<f32> {
        match self {
            Self::Resistive(m) => m.resistance(v),
            Self::Linear(m) => m.resistance(v),
        }
    }
}
