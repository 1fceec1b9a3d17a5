#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration-table parsing for the grip controller.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - The calibration CSV loader enforces headers and fits `force = a*V - b`
//!   with one outlier-rejecting refit.
use serde::Deserialize;

/// Upper bound on the number of grip levels a threshold table may define.
pub const MAX_LEVELS: usize = 16;

/// Calibration CSV schema.
///
/// Expected headers:
/// volts,newtons
///
/// Example:
/// volts,newtons
/// 0.2,1.817
/// 1.0,14.985
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    pub volts: f32,
    pub newtons: f32,
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// Mode button (BCM numbering), wired active-low.
    pub button: u8,
    /// "Active" indicator (green).
    pub led_primary: u8,
    /// "Off" indicator (red).
    pub led_secondary: u8,
    pub pwm_channel: u8,
    #[serde(default)]
    pub adc_device: u8,
    pub adc_channel: u8,
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,
    #[serde(default = "default_display_addr")]
    pub display_addr: u16,
}

fn default_i2c_bus() -> u8 {
    1
}

fn default_display_addr() -> u16 {
    0x70
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// Divider / ADC reference voltage.
    pub v_ref: f32,
    /// ADC count that corresponds to `v_ref`.
    pub adc_full_scale: u32,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            v_ref: 3.3,
            adc_full_scale: 4095,
        }
    }
}

/// Force model selection. `model = "resistive"` or `model = "linear"`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum CalibrationCfg {
    Resistive {
        #[serde(default = "default_r_fixed")]
        r_fixed_ohms: f32,
        #[serde(default = "default_scale")]
        scale: f32,
        #[serde(default = "default_exponent")]
        exponent: f32,
        /// Optional plausible-resistance window; readings outside it are undefined.
        #[serde(default)]
        min_ohms: Option<f32>,
        #[serde(default)]
        max_ohms: Option<f32>,
    },
    Linear {
        a: f32,
        b: f32,
    },
}

fn default_r_fixed() -> f32 {
    10_000.0
}

fn default_scale() -> f32 {
    1_000.0
}

fn default_exponent() -> f32 {
    1.5
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self::Resistive {
            r_fixed_ohms: default_r_fixed(),
            scale: default_scale(),
            exponent: default_exponent(),
            min_ohms: None,
            max_ohms: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterSeed {
    #[default]
    Zero,
    First,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Weight of the accumulated history, in [0.0, 1.0). 0.0 disables smoothing.
    pub alpha: f32,
    pub seed: FilterSeed,
    /// Reinitialize the accumulator when the device is switched back on.
    pub reset_on_resume: bool,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            alpha: 0.8,
            seed: FilterSeed::Zero,
            reset_on_resume: true,
        }
    }
}

/// Threshold table. Either an explicit ascending `thresholds` list, or a
/// uniform table of `levels` steps of `step` Newtons (default 8 x 0.5 N).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ClassifierCfg {
    pub thresholds: Option<Vec<f32>>,
    pub step: Option<f32>,
    pub levels: Option<u8>,
}

impl ClassifierCfg {
    pub const DEFAULT_STEP: f32 = 0.5;
    pub const DEFAULT_LEVELS: u8 = 8;

    /// Cut-points the table resolves to (not validated).
    pub fn points(&self) -> Vec<f32> {
        if let Some(t) = &self.thresholds {
            return t.clone();
        }
        let step = self.step.unwrap_or(Self::DEFAULT_STEP);
        let levels = self.levels.unwrap_or(Self::DEFAULT_LEVELS);
        (1..=levels).map(|i| step * f32::from(i)).collect()
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FaultCommand {
    #[default]
    Neutral,
    Minimum,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActuatorCfg {
    pub duty_min: f32,
    pub duty_max: f32,
    pub frequency_hz: f32,
    /// Command applied while the force estimate is undefined.
    pub on_fault: FaultCommand,
}

impl Default for ActuatorCfg {
    fn default() -> Self {
        Self {
            duty_min: 0.05,
            duty_max: 0.10,
            frequency_hz: 50.0,
            on_fault: FaultCommand::Neutral,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartMode {
    #[default]
    On,
    Off,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    pub start_mode: StartMode,
    /// Presses closer than this to the previous button level change are ignored.
    pub debounce_ms: u64,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            start_mode: StartMode::On,
            debounce_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Sensor read inside the control loop.
    #[default]
    Direct,
    /// Sensor owned by a background sampler thread.
    Sampled,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoopCfg {
    pub period_ms: u64,
    pub mode: LoopMode,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            period_ms: 100,
            mode: LoopMode::Direct,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub filter: FilterCfg,
    #[serde(default)]
    pub classifier: ClassifierCfg,
    #[serde(default)]
    pub actuator: ActuatorCfg,
    #[serde(default)]
    pub device: DeviceCfg,
    #[serde(default, rename = "loop")]
    pub control_loop: LoopCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Fitted linear force model: `force = a * volts - b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub a: f32,
    pub b: f32,
}

impl LinearFit {
    /// Least-squares fit over all rows, then one refit without points whose
    /// residual exceeds twice the RMS residual (when at least two remain).
    pub fn from_rows(rows: &[CalibrationRow]) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }
        if let Some(i) = rows
            .iter()
            .position(|r| !r.volts.is_finite() || !r.newtons.is_finite())
        {
            eyre::bail!("calibration row {} is not finite", i + 1);
        }
        for (i, pair) in rows.windows(2).enumerate() {
            if pair[1].volts <= pair[0].volts {
                eyre::bail!(
                    "calibration volts must be strictly increasing (rows {} and {})",
                    i + 1,
                    i + 2
                );
            }
        }

        let pts: Vec<(f64, f64)> = rows
            .iter()
            .map(|r| (f64::from(r.volts), f64::from(r.newtons)))
            .collect();
        let (slope, intercept) = least_squares(&pts)
            .ok_or_else(|| eyre::eyre!("calibration cannot determine slope"))?;

        let n = pts.len() as f64;
        let rms = (pts
            .iter()
            .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();
        let (slope, intercept) = if rms.is_finite() && rms > 0.0 {
            let limit = 2.0 * rms;
            let inliers: Vec<(f64, f64)> = pts
                .iter()
                .copied()
                .filter(|(x, y)| (y - (slope * x + intercept)).abs() <= limit)
                .collect();
            if inliers.len() >= 2 && inliers.len() < pts.len() {
                least_squares(&inliers).unwrap_or((slope, intercept))
            } else {
                (slope, intercept)
            }
        } else {
            (slope, intercept)
        };

        if slope == 0.0 {
            eyre::bail!("calibration produced zero slope");
        }
        Ok(Self {
            a: slope as f32,
            b: (-intercept) as f32,
        })
    }
}

/// Ordinary least squares `y = slope*x + intercept`; None for degenerate input.
fn least_squares(pts: &[(f64, f64)]) -> Option<(f64, f64)> {
    if pts.len() < 2 {
        return None;
    }
    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxx, sxy) = pts.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });
    if !sxx.is_finite() || sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    slope
        .is_finite()
        .then(|| (slope, mean_y - slope * mean_x))
}

impl TryFrom<&[CalibrationRow]> for LinearFit {
    type Error = eyre::Report;
    fn try_from(rows: &[CalibrationRow]) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<LinearFit> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<&str> = headers.iter().collect();
    if actual != ["volts", "newtons"] {
        eyre::bail!(
            "calibration CSV must have headers 'volts,newtons', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        }
    }

    LinearFit::from_rows(&rows)
}

fn finite_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.pwm_channel > 1 {
            eyre::bail!("pins.pwm_channel must be 0 or 1");
        }
        if !(0x70..=0x77).contains(&self.pins.display_addr) {
            eyre::bail!("pins.display_addr must be in 0x70..=0x77");
        }
        let leds = [self.pins.led_primary, self.pins.led_secondary];
        if leds[0] == leds[1] || leds.contains(&self.pins.button) {
            eyre::bail!("pins.button, pins.led_primary and pins.led_secondary must be distinct");
        }

        // Sensor
        if !finite_positive(self.sensor.v_ref) {
            eyre::bail!("sensor.v_ref must be > 0");
        }
        if self.sensor.adc_full_scale == 0 {
            eyre::bail!("sensor.adc_full_scale must be >= 1");
        }

        // Calibration
        match &self.calibration {
            CalibrationCfg::Resistive {
                r_fixed_ohms,
                scale,
                exponent,
                min_ohms,
                max_ohms,
            } => {
                if !finite_positive(*r_fixed_ohms) {
                    eyre::bail!("calibration.r_fixed_ohms must be > 0");
                }
                if !finite_positive(*scale) {
                    eyre::bail!("calibration.scale must be > 0");
                }
                if !finite_positive(*exponent) {
                    eyre::bail!("calibration.exponent must be > 0");
                }
                if min_ohms.is_some_and(|m| !(m.is_finite() && m >= 0.0)) {
                    eyre::bail!("calibration.min_ohms must be >= 0");
                }
                if max_ohms.is_some_and(|m| !finite_positive(m)) {
                    eyre::bail!("calibration.max_ohms must be > 0");
                }
                if let (Some(lo), Some(hi)) = (min_ohms, max_ohms)
                    && lo >= hi
                {
                    eyre::bail!("calibration.min_ohms must be < calibration.max_ohms");
                }
            }
            CalibrationCfg::Linear { a, b } => {
                if !a.is_finite() || !b.is_finite() {
                    eyre::bail!("calibration.a and calibration.b must be finite");
                }
                if *a == 0.0 {
                    eyre::bail!("calibration.a must be non-zero");
                }
            }
        }

        // Filter
        if !(self.filter.alpha >= 0.0 && self.filter.alpha < 1.0) {
            eyre::bail!("filter.alpha must be in [0.0, 1.0)");
        }

        // Classifier
        if self.classifier.thresholds.is_some()
            && (self.classifier.step.is_some() || self.classifier.levels.is_some())
        {
            eyre::bail!("classifier.thresholds cannot be combined with classifier.step/levels");
        }
        if let Some(step) = self.classifier.step
            && !finite_positive(step)
        {
            eyre::bail!("classifier.step must be > 0");
        }
        let points = self.classifier.points();
        if points.is_empty() || points.len() > MAX_LEVELS {
            eyre::bail!("classifier must define between 1 and {MAX_LEVELS} levels");
        }
        if points.iter().any(|t| !t.is_finite()) {
            eyre::bail!("classifier.thresholds must be finite");
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            eyre::bail!("classifier.thresholds must be strictly increasing");
        }

        // Actuator
        let (lo, hi) = (self.actuator.duty_min, self.actuator.duty_max);
        if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && hi <= 1.0 && lo < hi) {
            eyre::bail!("actuator duty range must satisfy 0.0 <= duty_min < duty_max <= 1.0");
        }
        if !finite_positive(self.actuator.frequency_hz) || self.actuator.frequency_hz > 10_000.0 {
            eyre::bail!("actuator.frequency_hz must be in (0, 10000]");
        }

        // Device
        if self.device.debounce_ms > 5_000 {
            eyre::bail!("device.debounce_ms is unreasonably large (>5s)");
        }

        // Loop
        if !(10..=1_000).contains(&self.control_loop.period_ms) {
            eyre::bail!("loop.period_ms must be in [10, 1000]");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
