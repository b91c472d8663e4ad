//! # endosim
//!
//! A pharmacokinetic simulation and calibration engine for exogenous hormone
//! administration. Given an immutable compound/blend catalog and a user's
//! treatment (dose schedule plus blood-test measurements), endosim predicts
//! blood concentration over time via multi-dose superposition of a
//! closed-form absorption/elimination model, and fits a per-subject
//! calibration factor reconciling predictions with measurements.
//!
//! The engine is pure computation: it reads immutable snapshots and returns
//! owned results, with no internal concurrency or shared state. Persistence,
//! rendering, and unit formatting are the caller's concerns.
//!
//! # Example
//!
//! ```
//! use endosim::prelude::*;
//!
//! let catalog = Catalog::reference();
//!
//! let dose = DoseSpec::new(
//!     Substance::compound("testosterone-enanthate"),
//!     250.0,
//!     Route::Intramuscular,
//!     7.0,
//!     0.0,
//! ).unwrap();
//!
//! let mut treatment = Treatment::builder()
//!     .id("trt-1")
//!     .dose(dose)
//!     .sample(21.0, 650.0)
//!     .build()
//!     .unwrap();
//!
//! // Calibrate against the blood sample and apply the fit
//! let report = calibrate(&catalog, &treatment).unwrap();
//! treatment.set_calibration(report.parameters);
//!
//! // Simulate twelve weeks at daily resolution
//! let grid = TimeGrid::daily(0.0, 84.0).unwrap();
//! let result = simulate(&catalog, &treatment, &grid).unwrap();
//! let indices = effect_indices(&catalog, &result).unwrap();
//! let chart = ChartModel::build(&result, &indices);
//!
//! assert!(chart.stats().peak_total.unwrap().1 > 0.0);
//! ```

pub mod calibrate;
pub mod catalog;
pub mod data;
pub mod effect;
pub mod error;
pub mod schedule;
pub mod simulator;
pub mod viz;

pub use calibrate::{calibrate, calibrate_with_rates, CalibrationReport};
pub use catalog::{Blend, Catalog, Compound, Potency, Route, RouteKinetics, Substance};
pub use data::{
    BloodSample, CalibrationParameters, DoseSpec, FittedRates, Regimen, Stage, StageIssue,
    Treatment, TreatmentBuilder,
};
pub use effect::{effect_indices, EffectIndexSeries};
pub use error::EndosimError;
pub use schedule::{administration_times, dose_events, DoseEvent, TimeGrid};
pub use simulator::{
    simulate, simulate_many, simulate_with_factor, single_dose_response, CompoundSeries,
    SimulationResult,
};
pub use viz::{ChartModel, DataPoint, Layer, LayerKind, SummaryStats};

pub mod prelude {
    //! Convenience re-exports for typical engine usage
    pub use crate::calibrate::{calibrate, calibrate_with_rates, CalibrationReport};
    pub use crate::catalog::{Blend, Catalog, Compound, Potency, Route, RouteKinetics, Substance};
    pub use crate::data::{
        BloodSample, CalibrationParameters, DoseSpec, FittedRates, Regimen, Stage, StageIssue,
        Treatment, TreatmentBuilder,
    };
    pub use crate::effect::{effect_indices, EffectIndexSeries};
    pub use crate::error::EndosimError;
    pub use crate::schedule::{administration_times, dose_events, DoseEvent, TimeGrid};
    pub use crate::simulator::{
        simulate, simulate_many, simulate_with_factor, SimulationResult,
    };
    pub use crate::viz::{ChartModel, SummaryStats};
}
