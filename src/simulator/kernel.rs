//! Closed-form single-dose response
//!
//! One-compartment model with first-order absorption and elimination. This
//! is the pure numeric kernel of the engine: inputs are validated upstream
//! at catalog and dose construction, so the kernel itself performs no error
//! handling.

/// Relative tolerance below which `ka` and `ke` are treated as equal
pub const RATE_EQUALITY_TOLERANCE: f64 = 1e-6;

/// Predicted concentration contribution of one dose at elapsed time `t`
///
/// # Arguments
///
/// * `t` - Days since the dose was administered; negative times contribute 0
/// * `dose` - Administered mass (mg)
/// * `bioavailability` - Route bioavailability fraction `F`
/// * `ka` - Absorption rate constant (day⁻¹)
/// * `ke` - Elimination rate constant (day⁻¹)
/// * `factor` - Per-subject calibration factor `k`
///
/// The standard solution is
/// `k·D·F·ka/(ka−ke)·(e^(−ke·t) − e^(−ka·t))`; when `ka ≈ ke` the limiting
/// form `k·D·F·ke·t·e^(−ke·t)` is used so the difference quotient never
/// blows up.
pub fn single_dose_response(
    t: f64,
    dose: f64,
    bioavailability: f64,
    ka: f64,
    ke: f64,
    factor: f64,
) -> f64 {
    if t < 0.0 {
        return 0.0;
    }
    let scale = factor * dose * bioavailability;
    if (ka - ke).abs() <= RATE_EQUALITY_TOLERANCE * ke {
        scale * ke * t * (-ke * t).exp()
    } else {
        scale * ka / (ka - ke) * ((-ke * t).exp() - (-ka * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const KE_8D: f64 = std::f64::consts::LN_2 / 8.0;

    #[test]
    fn test_zero_at_administration_and_before() {
        assert_eq!(single_dose_response(0.0, 250.0, 1.0, 0.7, KE_8D, 1.0), 0.0);
        assert_eq!(single_dose_response(-1.0, 250.0, 1.0, 0.7, KE_8D, 1.0), 0.0);
        assert_eq!(
            single_dose_response(-1e-9, 250.0, 1.0, 0.7, KE_8D, 1.0),
            0.0
        );
    }

    #[test]
    fn test_rises_to_peak_then_decays() {
        let curve: Vec<f64> = (0..2000)
            .map(|i| single_dose_response(i as f64 * 0.05, 250.0, 1.0, 0.7, KE_8D, 1.0))
            .collect();

        assert!(curve.iter().all(|&c| c >= 0.0));

        let (peak_idx, _) = curve
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        assert!(peak_idx > 0, "concentration must rise from zero");

        // Monotonic decay after the peak
        assert!(curve[peak_idx..].windows(2).all(|w| w[1] <= w[0]));

        // Tends toward zero at long times
        let late = single_dose_response(200.0, 250.0, 1.0, 0.7, KE_8D, 1.0);
        assert!(late < 1e-6);
    }

    #[test]
    fn test_peak_at_analytic_tmax() {
        // tmax = ln(ka/ke) / (ka − ke) for the standard case
        let ka = 0.7;
        let tmax = (ka / KE_8D).ln() / (ka - KE_8D);
        let at_peak = single_dose_response(tmax, 250.0, 1.0, ka, KE_8D, 1.0);
        let before = single_dose_response(tmax - 0.01, 250.0, 1.0, ka, KE_8D, 1.0);
        let after = single_dose_response(tmax + 0.01, 250.0, 1.0, ka, KE_8D, 1.0);
        assert!(at_peak >= before);
        assert!(at_peak >= after);
    }

    #[test]
    fn test_scales_linearly_with_dose_bioavailability_and_factor() {
        let base = single_dose_response(3.0, 100.0, 1.0, 0.7, KE_8D, 1.0);
        assert_relative_eq!(
            single_dose_response(3.0, 200.0, 1.0, 0.7, KE_8D, 1.0),
            2.0 * base,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            single_dose_response(3.0, 100.0, 0.5, 0.7, KE_8D, 1.0),
            0.5 * base,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            single_dose_response(3.0, 100.0, 1.0, 0.7, KE_8D, 1.3),
            1.3 * base,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_degenerate_rates_agree_with_standard_form() {
        let ke: f64 = 0.5;
        // Just outside the equality tolerance: standard branch
        let ka_near = ke * (1.0 + 5e-6);
        // Well inside: limiting branch
        let ka_equal = ke * (1.0 + 5e-7);

        for t in [0.0, 0.5, 1.0, 2.0, 5.0, 10.0, 50.0] {
            let standard = single_dose_response(t, 100.0, 1.0, ka_near, ke, 1.0);
            let limiting = single_dose_response(t, 100.0, 1.0, ka_equal, ke, 1.0);
            assert!(standard.is_finite());
            assert!(limiting.is_finite());
            assert_relative_eq!(standard, limiting, max_relative = 1e-4, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_no_nan_across_transition_zone() {
        let ke: f64 = 0.5;
        for i in 0..100 {
            let ka = ke * (1.0 + (i as f64 - 50.0) * 1e-7);
            for t in [0.0, 1.0, 10.0, 100.0] {
                let c = single_dose_response(t, 100.0, 1.0, ka, ke, 1.0);
                assert!(c.is_finite(), "non-finite at ka={ka}, t={t}");
                assert!(c >= 0.0);
            }
        }
    }
}
