//! Treatment, dose, and blood-sample data model

pub mod builder;
mod dose;
mod sample;
mod treatment;

pub use builder::TreatmentBuilder;
pub use dose::DoseSpec;
pub use sample::{BloodSample, CalibrationParameters, FittedRates};
pub use treatment::{Regimen, Stage, StageIssue, Treatment};
