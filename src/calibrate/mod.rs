//! Calibration of model predictions against blood samples
//!
//! Searches for the per-subject calibration factor (and, on the diagnostic
//! path, an alternative `(ke, ka)` rate pair) minimizing the RMSE between
//! simulated concentrations and measured values. The procedure is fully
//! deterministic: a least-squares initial guess refined by Nelder-Mead, with
//! physically plausible bounds enforced as penalties.
//!
//! Zero usable samples is not an error; the engine reports that no fit was
//! performed and leaves the factor unchanged. A search that cannot improve
//! on the existing factor is reported with non-positive improvement, never
//! as a failure.

use argmin::core::{CostFunction, Error as ArgminError, Executor};
use argmin::solver::neldermead::NelderMead;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::data::{CalibrationParameters, FittedRates, Treatment};
use crate::schedule::dose_events;
use crate::simulator::{concentration_at, concentration_at_with_rates, prepare_doses, PreparedDose};

/// Plausible range for the calibration factor during multi-sample search
const FACTOR_BOUNDS: (f64, f64) = (0.1, 10.0);
/// Plausible range for fitted rate constants (day⁻¹)
const RATE_BOUNDS: (f64, f64) = (0.01, 5.0);
/// Predictions below this are treated as "no signal" for ratio calibration
const MIN_PREDICTION: f64 = 1e-12;

/// Errors from the calibration engine
#[derive(Error, Debug)]
pub enum CalibrationError {
    /// Invalid or missing catalog data for the treatment's doses
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The numerical solver failed to run
    #[error("calibration solver failed: {0}")]
    Solver(String),
}

/// The result of one calibration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Whether a fit was performed; false when no usable samples exist or
    /// the model predicts no signal at every sample time
    pub performed: bool,
    /// Fitted parameters; equal to the treatment's existing parameters when
    /// `performed` is false
    pub parameters: CalibrationParameters,
    /// Number of samples that entered the objective
    pub samples_used: usize,
    /// RMSE under the treatment's existing calibration factor
    pub rmse_before: Option<f64>,
    /// RMSE under the fitted parameters
    pub rmse_after: Option<f64>,
    /// RMSE improvement in percent; non-positive when the search could not
    /// beat the existing factor
    pub improvement_pct: Option<f64>,
    /// Pearson correlation between fitted predictions and measurements
    /// (diagnostic path only)
    pub correlation: Option<f64>,
}

impl CalibrationReport {
    fn not_performed(treatment: &Treatment, samples_used: usize, rmse_before: Option<f64>) -> Self {
        Self {
            performed: false,
            parameters: treatment.calibration(),
            samples_used,
            rmse_before,
            rmse_after: None,
            improvement_pct: None,
            correlation: None,
        }
    }
}

/// Fit the scalar calibration factor for a treatment
///
/// - No usable samples: no-op, `performed = false`.
/// - One usable sample: the factor is set so the prediction at that sample's
///   time exactly matches the measured value.
/// - Two or more samples: deterministic RMSE minimization over the factor,
///   bounded to [0.1, 10].
///
/// The treatment itself is not modified; the caller persists
/// `report.parameters` if it chooses to apply the fit.
pub fn calibrate(
    catalog: &Catalog,
    treatment: &Treatment,
) -> Result<CalibrationReport, CalibrationError> {
    fit(catalog, treatment, false)
}

/// Fit the calibration factor together with diagnostic rate constants
///
/// Runs the same deterministic search jointly over `(k, ke, ka)`, with the
/// rates bounded to [0.01, 5] day⁻¹, and reports the Pearson correlation
/// between fitted predictions and measurements. The fitted rates are
/// diagnostic only and are never written into the compound catalog.
pub fn calibrate_with_rates(
    catalog: &Catalog,
    treatment: &Treatment,
) -> Result<CalibrationReport, CalibrationError> {
    fit(catalog, treatment, true)
}

fn fit(
    catalog: &Catalog,
    treatment: &Treatment,
    with_rates: bool,
) -> Result<CalibrationReport, CalibrationError> {
    let samples: Vec<(f64, f64)> = treatment
        .samples()
        .iter()
        .filter(|s| s.is_usable())
        .map(|s| (s.time(), s.value()))
        .collect();

    if samples.is_empty() {
        return Ok(CalibrationReport::not_performed(treatment, 0, None));
    }

    let last_time = samples
        .iter()
        .map(|(t, _)| *t)
        .fold(f64::NEG_INFINITY, f64::max);
    let events = dose_events(catalog, treatment, f64::NEG_INFINITY, last_time)?;
    let doses = prepare_doses(catalog, &events)?;

    let measured = Array1::from_iter(samples.iter().map(|(_, v)| *v));
    let baselines =
        Array1::from_iter(samples.iter().map(|(t, _)| concentration_at(&doses, *t, 1.0)));

    let old_factor = treatment.calibration().factor();
    let rmse_before = rmse(&(&baselines * old_factor), &measured);

    // No model signal at any sample time: a ratio fit is undefined
    if baselines.iter().all(|&b| b <= MIN_PREDICTION) {
        return Ok(CalibrationReport::not_performed(
            treatment,
            samples.len(),
            Some(rmse_before),
        ));
    }

    // Exact single-sample case: match the one measurement
    if samples.len() == 1 {
        let factor = measured[0] / baselines[0];
        let rmse_after = rmse(&(&baselines * factor), &measured);
        return Ok(CalibrationReport {
            performed: true,
            parameters: CalibrationParameters::new(factor),
            samples_used: 1,
            rmse_before: Some(rmse_before),
            rmse_after: Some(rmse_after),
            improvement_pct: improvement(rmse_before, rmse_after),
            correlation: None,
        });
    }

    // Least-squares estimate of the factor; predictions are linear in k
    let num: f64 = baselines
        .iter()
        .zip(measured.iter())
        .map(|(b, v)| b * v)
        .sum();
    let den: f64 = baselines.iter().map(|b| b * b).sum();
    let k0 = (num / den).clamp(FACTOR_BOUNDS.0, FACTOR_BOUNDS.1);

    let (parameters, predicted) = if with_rates {
        let times = Array1::from_iter(samples.iter().map(|(t, _)| *t));
        let mean_ke = doses.iter().map(|d| d.elimination_rate).sum::<f64>() / doses.len() as f64;
        let mean_ka = doses.iter().map(|d| d.absorption_rate).sum::<f64>() / doses.len() as f64;
        let cost = RateCost {
            doses: &doses,
            times: &times,
            measured: &measured,
        };
        let best = minimize(
            cost,
            vec![
                k0,
                mean_ke.clamp(RATE_BOUNDS.0, RATE_BOUNDS.1),
                mean_ka.clamp(RATE_BOUNDS.0, RATE_BOUNDS.1),
            ],
        )?;
        let (factor, ke, ka) = (best[0], best[1], best[2]);
        let predicted =
            Array1::from_iter(times.iter().map(|&t| {
                concentration_at_with_rates(&doses, t, factor, ke, ka)
            }));
        let parameters = CalibrationParameters::new(factor).with_rates(FittedRates {
            elimination_rate: ke,
            absorption_rate: ka,
        });
        (parameters, predicted)
    } else {
        let cost = FactorCost {
            baselines: &baselines,
            measured: &measured,
        };
        let best = minimize(cost, vec![k0])?;
        let factor = best[0];
        (
            CalibrationParameters::new(factor),
            &baselines * factor,
        )
    };

    let rmse_after = rmse(&predicted, &measured);
    let correlation = if with_rates {
        pearson(&predicted, &measured)
    } else {
        None
    };

    Ok(CalibrationReport {
        performed: true,
        parameters,
        samples_used: samples.len(),
        rmse_before: Some(rmse_before),
        rmse_after: Some(rmse_after),
        improvement_pct: improvement(rmse_before, rmse_after),
        correlation,
    })
}

/// RMSE objective over the calibration factor alone
struct FactorCost<'a> {
    baselines: &'a Array1<f64>,
    measured: &'a Array1<f64>,
}

impl CostFunction for FactorCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        let k = param[0];
        let predicted = self.baselines * k;
        Ok(rmse(&predicted, self.measured) + bound_penalty(k, FACTOR_BOUNDS))
    }
}

/// RMSE objective over `(k, ke, ka)` jointly
struct RateCost<'a> {
    doses: &'a [PreparedDose],
    times: &'a Array1<f64>,
    measured: &'a Array1<f64>,
}

impl CostFunction for RateCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, ArgminError> {
        let (k, ke, ka) = (param[0], param[1], param[2]);
        if ke <= 0.0 || ka <= 0.0 {
            return Ok(f64::MAX);
        }
        let predicted = Array1::from_iter(
            self.times
                .iter()
                .map(|&t| concentration_at_with_rates(self.doses, t, k, ke, ka)),
        );
        Ok(rmse(&predicted, self.measured)
            + bound_penalty(k, FACTOR_BOUNDS)
            + bound_penalty(ke, RATE_BOUNDS)
            + bound_penalty(ka, RATE_BOUNDS))
    }
}

/// Run Nelder-Mead from an initial point, returning the best parameters
fn minimize<C>(cost: C, initial: Vec<f64>) -> Result<Vec<f64>, CalibrationError>
where
    C: CostFunction<Param = Vec<f64>, Output = f64>,
{
    let simplex = initial_simplex(&initial);
    let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(simplex)
        .with_sd_tolerance(1e-10)
        .map_err(|e| CalibrationError::Solver(e.to_string()))?;
    let res = Executor::new(cost, solver)
        .configure(|state| state.max_iters(500))
        .run()
        .map_err(|e| CalibrationError::Solver(e.to_string()))?;
    res.state
        .best_param
        .ok_or_else(|| CalibrationError::Solver("solver produced no parameters".to_string()))
}

/// Simplex vertices around an initial point, perturbing one dimension each
fn initial_simplex(initial: &[f64]) -> Vec<Vec<f64>> {
    let perturbation_percentage = 0.05;
    let mut vertices = vec![initial.to_vec()];
    for i in 0..initial.len() {
        let perturbation = if initial[i] == 0.0 {
            0.00025
        } else {
            perturbation_percentage * initial[i]
        };
        let mut vertex = initial.to_vec();
        vertex[i] += perturbation;
        vertices.push(vertex);
    }
    vertices
}

fn rmse(predicted: &Array1<f64>, measured: &Array1<f64>) -> f64 {
    let residuals = predicted - measured;
    residuals
        .mapv(|r| r * r)
        .mean()
        .unwrap_or(0.0)
        .sqrt()
}

fn improvement(before: f64, after: f64) -> Option<f64> {
    if before > 0.0 {
        Some((before - after) / before * 100.0)
    } else {
        None
    }
}

/// Quadratic penalty outside a closed interval
fn bound_penalty(x: f64, bounds: (f64, f64)) -> f64 {
    let (lo, hi) = bounds;
    if x < lo {
        1e6 * (lo - x).powi(2)
    } else if x > hi {
        1e6 * (x - hi).powi(2)
    } else {
        0.0
    }
}

/// Pearson correlation coefficient; `None` when either series is constant
fn pearson(a: &Array1<f64>, b: &Array1<f64>) -> Option<f64> {
    let n = a.len() as f64;
    if a.len() < 2 {
        return None;
    }
    let mean_a = a.mean()?;
    let mean_b = b.mean()?;
    let cov: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / n;
    let var_a = a.iter().map(|x| (x - mean_a).powi(2)).sum::<f64>() / n;
    let var_b = b.iter().map(|y| (y - mean_b).powi(2)).sum::<f64>() / n;
    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}
