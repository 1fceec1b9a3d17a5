#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Grip control logic (hardware-agnostic).
//!
//! Devices are reached only through the `grip_traits` capability traits, so
//! everything here runs against simulated devices as well as real ones.
//!
//! ## Pipeline
//!
//! normalized sample -> [`calibration::Volts`] -> force ([`calibration::ForceModel`])
//! -> [`filter::Ema`] -> [`classifier::GripLevel`] -> [`actuator::DutyCycle`]
//!
//! [`controller::GripController`] combines the pipeline with the debounced
//! ON/OFF [`state::DeviceState`] and is pure with respect to I/O.
//! [`runner::run`] drives it at a fixed cadence against a [`runner::Rig`] and
//! always leaves the servo parked at neutral with the outputs blanked.

pub mod actuator;
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod pipeline;
pub mod runner;
pub mod sampler;
pub mod state;
pub mod status;
pub mod util;

pub use actuator::{DutyCycle, DutyRange, FaultCommand};
pub use calibration::{
    CalibrationModel, ForceEstimate, ForceModel, LinearCalibration, ResistivePowerLaw, Volts,
};
pub use classifier::{GripLevel, ThresholdTable};
pub use config::{ActuatorCfg, DeviceCfg, FilterCfg, LoopCfg, SensorCfg};
pub use controller::{GripController, GripControllerBuilder};
pub use error::{BuildError, GripError, Result};
pub use filter::{Ema, Seed};
pub use runner::{Rig, RigBuilder, RunSummary, SamplingMode, run};
pub use state::DeviceMode;
pub use status::{DisplayCommand, IndicatorPair, Reading, TickCommand};
