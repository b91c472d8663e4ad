use thiserror::Error;

use crate::calibrate::CalibrationError;
use crate::catalog::CatalogError;
use crate::schedule::ScheduleError;

/// Top-level error type aggregating all engine errors
///
/// Module errors convert into [EndosimError] with `?`, so callers can chain
/// catalog, schedule, simulation, and calibration operations behind one
/// error type:
///
/// ```
/// use endosim::prelude::*;
/// use endosim::EndosimError;
///
/// fn weekly_level_curve(catalog: &Catalog) -> Result<SimulationResult, EndosimError> {
///     let dose = DoseSpec::new(
///         Substance::compound("testosterone-cypionate"),
///         200.0,
///         Route::Intramuscular,
///         7.0,
///         0.0,
///     )?;
///     let treatment = Treatment::builder().dose(dose).build()?;
///     let grid = TimeGrid::daily(0.0, 56.0)?;
///     Ok(simulate(catalog, &treatment, &grid)?)
/// }
///
/// let curve = weekly_level_curve(&Catalog::reference()).unwrap();
/// assert!(!curve.is_empty());
/// ```
#[derive(Error, Debug)]
pub enum EndosimError {
    /// Invalid or missing catalog data
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Invalid dosing-timeline or grid configuration
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Calibration failure
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}
