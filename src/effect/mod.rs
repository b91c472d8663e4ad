//! Secondary effect indices derived from a simulation run
//!
//! Weighs each compound's concentration by its anabolic and androgenic
//! potency (testosterone = 1.0 baseline) to produce two parallel index
//! series and their pointwise ratio. Aggregate statistics over the series
//! are the caller's concern (see [crate::viz]).

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError};
use crate::simulator::SimulationResult;

/// Potency-weighted effect index series aligned to a simulation grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectIndexSeries {
    /// Query timestamps in days, copied from the simulation
    pub times: Vec<f64>,
    /// Anabolic index at each timestamp
    pub anabolic: Vec<f64>,
    /// Androgenic index at each timestamp
    pub androgenic: Vec<f64>,
    /// Pointwise anabolic:androgenic ratio; 0 where the androgenic index
    /// carries no signal
    pub ratio: Vec<f64>,
}

/// Compute effect indices from a simulation's per-compound breakdown
///
/// Each compound contributes `concentration × potency weight` to both
/// indices at every timestamp. Non-finite concentrations are treated as "no
/// data" and skipped rather than propagated.
pub fn effect_indices(
    catalog: &Catalog,
    result: &SimulationResult,
) -> Result<EffectIndexSeries, CatalogError> {
    let n = result.times().len();
    let mut anabolic = vec![0.0; n];
    let mut androgenic = vec![0.0; n];

    for series in result.per_compound() {
        let potency = catalog.compound(&series.id)?.potency();
        for (i, &value) in series.values.iter().enumerate() {
            if !value.is_finite() {
                continue;
            }
            anabolic[i] += value * potency.anabolic();
            androgenic[i] += value * potency.androgenic();
        }
    }

    let ratio = anabolic
        .iter()
        .zip(&androgenic)
        .map(|(&a, &g)| {
            let r = a / g;
            if r.is_finite() {
                r
            } else {
                0.0
            }
        })
        .collect();

    Ok(EffectIndexSeries {
        times: result.times().to_vec(),
        anabolic,
        androgenic,
        ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Route, Substance};
    use crate::data::{DoseSpec, Treatment};
    use crate::schedule::TimeGrid;
    use crate::simulator::simulate;
    use approx::assert_relative_eq;

    fn simulate_compound(compound: &str, interval: f64) -> (Catalog, SimulationResult) {
        let catalog = Catalog::reference();
        let dose = DoseSpec::new(
            Substance::compound(compound),
            250.0,
            Route::Intramuscular,
            interval,
            0.0,
        )
        .unwrap();
        let treatment = Treatment::builder().id("t1").dose(dose).build().unwrap();
        let grid = TimeGrid::daily(0.0, 28.0).unwrap();
        let result = simulate(&catalog, &treatment, &grid).unwrap();
        (catalog, result)
    }

    #[test]
    fn test_testosterone_indices_equal_concentration() {
        // Testosterone is the 1.0 baseline, so both indices track the total
        let (catalog, result) = simulate_compound("testosterone-enanthate", 7.0);
        let indices = effect_indices(&catalog, &result).unwrap();
        for (i, &total) in result.total().iter().enumerate() {
            assert_relative_eq!(indices.anabolic[i], total, max_relative = 1e-9);
            assert_relative_eq!(indices.androgenic[i], total, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_weighted_compound_scales_indices() {
        let (catalog, result) = simulate_compound("nandrolone-decanoate", 7.0);
        let indices = effect_indices(&catalog, &result).unwrap();
        let potency = catalog
            .compound("nandrolone-decanoate")
            .unwrap()
            .potency();
        for (i, &total) in result.total().iter().enumerate() {
            assert_relative_eq!(
                indices.anabolic[i],
                total * potency.anabolic(),
                max_relative = 1e-9
            );
            assert_relative_eq!(
                indices.androgenic[i],
                total * potency.androgenic(),
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_ratio_is_zero_without_signal() {
        let (catalog, result) = simulate_compound("testosterone-enanthate", 7.0);
        let indices = effect_indices(&catalog, &result).unwrap();
        // t = 0 precedes any absorption, both indices are 0 there
        assert_eq!(indices.anabolic[0], 0.0);
        assert_eq!(indices.ratio[0], 0.0);
        // Once signal exists the testosterone ratio is exactly 1
        assert_relative_eq!(indices.ratio[7], 1.0, max_relative = 1e-9);
    }
}
