//! Multi-dose superposition simulation
//!
//! Sums the closed-form single-dose response over every administration in a
//! treatment's expanded schedule to produce total and per-compound
//! concentration time series. Doses are summed in chronological order so
//! results are bit-reproducible across runs.

pub mod kernel;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError};
use crate::data::Treatment;
use crate::schedule::{dose_events, DoseEvent, TimeGrid};

pub use kernel::single_dose_response;

/// One dose event resolved against the catalog, ready for the kernel
#[derive(Debug, Clone, Copy)]
pub(crate) struct PreparedDose {
    pub(crate) time: f64,
    pub(crate) amount: f64,
    pub(crate) bioavailability: f64,
    pub(crate) absorption_rate: f64,
    pub(crate) elimination_rate: f64,
}

/// Resolve dose events into kernel-ready parameters, in chronological order
pub(crate) fn prepare_doses(
    catalog: &Catalog,
    events: &[DoseEvent],
) -> Result<Vec<PreparedDose>, CatalogError> {
    events
        .iter()
        .map(|event| {
            let compound = catalog.compound(&event.compound)?;
            let kinetics = compound.kinetics(event.route)?;
            Ok(PreparedDose {
                time: event.time,
                amount: event.amount,
                bioavailability: kinetics.bioavailability(),
                absorption_rate: kinetics.absorption_rate(),
                elimination_rate: compound.elimination_rate(),
            })
        })
        .collect()
}

/// Total concentration at time `t` from doses summed in their stored order
pub(crate) fn concentration_at(doses: &[PreparedDose], t: f64, factor: f64) -> f64 {
    doses
        .iter()
        .map(|dose| {
            single_dose_response(
                t - dose.time,
                dose.amount,
                dose.bioavailability,
                dose.absorption_rate,
                dose.elimination_rate,
                factor,
            )
        })
        .sum()
}

/// As [concentration_at], with every dose's rate constants overridden
///
/// Used by the diagnostic calibration path to evaluate an alternative
/// `(ke, ka)` pair against the same schedule.
pub(crate) fn concentration_at_with_rates(
    doses: &[PreparedDose],
    t: f64,
    factor: f64,
    elimination_rate: f64,
    absorption_rate: f64,
) -> f64 {
    doses
        .iter()
        .map(|dose| {
            single_dose_response(
                t - dose.time,
                dose.amount,
                dose.bioavailability,
                absorption_rate,
                elimination_rate,
                factor,
            )
        })
        .sum()
}

/// Concentration series for a single compound within a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundSeries {
    /// Catalog compound id
    pub id: String,
    /// Human-readable compound name
    pub name: String,
    /// Concentration at each grid time
    pub values: Vec<f64>,
}

/// The output of one simulation run
///
/// All series are aligned to `times`. Results are ephemeral: recomputed on
/// demand and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    times: Vec<f64>,
    total: Vec<f64>,
    per_compound: Vec<CompoundSeries>,
}

impl SimulationResult {
    /// Query timestamps in days
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Total concentration at each query timestamp
    pub fn total(&self) -> &[f64] {
        &self.total
    }

    /// Per-compound breakdown, ordered by first administration
    pub fn per_compound(&self) -> &[CompoundSeries] {
        &self.per_compound
    }

    /// Whether the run produced no query points
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Peak of the total curve as `(time, value)`, skipping non-finite values
    pub fn peak_total(&self) -> Option<(f64, f64)> {
        self.times
            .iter()
            .zip(&self.total)
            .filter(|(_, v)| v.is_finite())
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("finite values compare"))
            .map(|(&t, &v)| (t, v))
    }
}

/// Simulate a treatment over a query grid
///
/// Uses the treatment's stored calibration factor. Doses administered before
/// the grid start still contribute; the schedule is expanded from the
/// earliest dose up to the grid end. An empty or inverted grid yields an
/// empty result, not an error.
pub fn simulate(
    catalog: &Catalog,
    treatment: &Treatment,
    grid: &TimeGrid,
) -> Result<SimulationResult, CatalogError> {
    simulate_with_factor(catalog, treatment, grid, treatment.calibration().factor())
}

/// Simulate a treatment with an explicit calibration factor
///
/// The calibration engine uses this to evaluate candidate factors without
/// touching the treatment's stored parameters.
pub fn simulate_with_factor(
    catalog: &Catalog,
    treatment: &Treatment,
    grid: &TimeGrid,
    factor: f64,
) -> Result<SimulationResult, CatalogError> {
    let times = grid.times();
    if times.is_empty() {
        return Ok(SimulationResult {
            times,
            total: Vec::new(),
            per_compound: Vec::new(),
        });
    }

    let events = dose_events(catalog, treatment, f64::NEG_INFINITY, grid.end())?;
    let doses = prepare_doses(catalog, &events)?;

    // Total curve: all doses in chronological order
    let total: Vec<f64> = times
        .iter()
        .map(|&t| concentration_at(&doses, t, factor))
        .collect();

    // Per-compound breakdown, compounds ordered by first administration
    let mut compound_order: Vec<&str> = Vec::new();
    for event in &events {
        if !compound_order.contains(&event.compound.as_str()) {
            compound_order.push(&event.compound);
        }
    }
    let per_compound = compound_order
        .iter()
        .map(|&id| {
            let compound_doses: Vec<PreparedDose> = events
                .iter()
                .zip(&doses)
                .filter(|(event, _)| event.compound == id)
                .map(|(_, dose)| *dose)
                .collect();
            let values = times
                .iter()
                .map(|&t| concentration_at(&compound_doses, t, factor))
                .collect();
            Ok(CompoundSeries {
                id: id.to_string(),
                name: catalog.compound(id)?.name().to_string(),
                values,
            })
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;

    Ok(SimulationResult {
        times,
        total,
        per_compound,
    })
}

/// Simulate several treatments in parallel
///
/// Each run takes an immutable snapshot of its inputs and produces an
/// independently owned result, so no synchronization is needed.
pub fn simulate_many(
    catalog: &Catalog,
    treatments: &[Treatment],
    grid: &TimeGrid,
) -> Result<Vec<SimulationResult>, CatalogError> {
    treatments
        .par_iter()
        .map(|treatment| simulate(catalog, treatment, grid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Route, Substance};
    use crate::data::DoseSpec;
    use approx::assert_relative_eq;

    fn weekly_treatment() -> Treatment {
        let dose = DoseSpec::new(
            Substance::compound("testosterone-enanthate"),
            250.0,
            Route::Intramuscular,
            7.0,
            0.0,
        )
        .unwrap();
        Treatment::builder().id("t1").dose(dose).build().unwrap()
    }

    #[test]
    fn test_superposition_matches_manual_sum() {
        let catalog = Catalog::reference();
        let treatment = weekly_treatment();
        let grid = TimeGrid::daily(0.0, 35.0).unwrap();

        let result = simulate(&catalog, &treatment, &grid).unwrap();

        let compound = catalog.compound("testosterone-enanthate").unwrap();
        let kinetics = compound.kinetics(Route::Intramuscular).unwrap();
        let ke = compound.elimination_rate();

        for (i, &t) in result.times().iter().enumerate() {
            let manual: f64 = [0.0, 7.0, 14.0, 21.0, 28.0, 35.0]
                .iter()
                .map(|&dose_time| {
                    single_dose_response(
                        t - dose_time,
                        250.0,
                        kinetics.bioavailability(),
                        kinetics.absorption_rate(),
                        ke,
                        1.0,
                    )
                })
                .sum();
            assert_relative_eq!(result.total()[i], manual, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_doses_before_grid_start_contribute() {
        let catalog = Catalog::reference();
        let treatment = weekly_treatment();

        let grid = TimeGrid::daily(28.0, 35.0).unwrap();
        let late = simulate(&catalog, &treatment, &grid).unwrap();

        let full_grid = TimeGrid::daily(0.0, 35.0).unwrap();
        let full = simulate(&catalog, &treatment, &full_grid).unwrap();

        assert_relative_eq!(late.total()[0], full.total()[28], max_relative = 1e-12);
        assert!(late.total()[0] > 0.0);
    }

    #[test]
    fn test_empty_grid_yields_empty_result() {
        let catalog = Catalog::reference();
        let treatment = weekly_treatment();
        let grid = TimeGrid::daily(10.0, 5.0).unwrap();
        let result = simulate(&catalog, &treatment, &grid).unwrap();
        assert!(result.is_empty());
        assert!(result.total().is_empty());
        assert!(result.peak_total().is_none());
    }

    #[test]
    fn test_concentrations_are_nonnegative_and_finite() {
        let catalog = Catalog::reference();
        let treatment = weekly_treatment();
        let grid = TimeGrid::new(0.0, 70.0, 0.25).unwrap();
        let result = simulate(&catalog, &treatment, &grid).unwrap();
        for &v in result.total() {
            assert!(v.is_finite());
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn test_per_compound_series_sum_to_total() {
        let catalog = Catalog::reference();
        let blend_dose = DoseSpec::new(
            Substance::blend("sustanon-250"),
            250.0,
            Route::Intramuscular,
            7.0,
            0.0,
        )
        .unwrap();
        let treatment = Treatment::builder()
            .id("t1")
            .dose(blend_dose)
            .build()
            .unwrap();
        let grid = TimeGrid::daily(0.0, 28.0).unwrap();
        let result = simulate(&catalog, &treatment, &grid).unwrap();

        assert_eq!(result.per_compound().len(), 4);
        for (i, _) in result.times().iter().enumerate() {
            let sum: f64 = result.per_compound().iter().map(|s| s.values[i]).sum();
            assert_relative_eq!(sum, result.total()[i], max_relative = 1e-9, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_calibration_factor_scales_result() {
        let catalog = Catalog::reference();
        let treatment = weekly_treatment();
        let grid = TimeGrid::daily(0.0, 14.0).unwrap();

        let base = simulate_with_factor(&catalog, &treatment, &grid, 1.0).unwrap();
        let scaled = simulate_with_factor(&catalog, &treatment, &grid, 1.5).unwrap();
        for (a, b) in base.total().iter().zip(scaled.total()) {
            assert_relative_eq!(*b, 1.5 * a, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_simulate_many_matches_single_runs() {
        let catalog = Catalog::reference();
        let treatments = vec![weekly_treatment(), weekly_treatment()];
        let grid = TimeGrid::daily(0.0, 28.0).unwrap();

        let many = simulate_many(&catalog, &treatments, &grid).unwrap();
        let single = simulate(&catalog, &treatments[0], &grid).unwrap();
        assert_eq!(many.len(), 2);
        for (a, b) in many[0].total().iter().zip(single.total()) {
            assert_relative_eq!(a, b);
        }
    }
}
