use serde::{Deserialize, Serialize};

/// A blood-test measurement attached to a treatment
///
/// Samples are append-only user data. The calibration engine excludes
/// samples with non-positive or non-finite values from its objective rather
/// than erroring on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodSample {
    time: f64,
    value: f64,
}

impl BloodSample {
    /// Create a new sample
    ///
    /// # Arguments
    ///
    /// * `time` - Days since the treatment start
    /// * `value` - Measured concentration in the canonical unit
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }

    /// Time of the draw, in days since the treatment start
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Measured concentration
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether the sample can participate in a calibration objective
    pub fn is_usable(&self) -> bool {
        self.time.is_finite() && self.value.is_finite() && self.value > 0.0
    }
}

/// Diagnostic rate constants from a joint calibration fit
///
/// These describe how the fitted subject deviates from catalog kinetics.
/// They are reported for comparison only and never written back into the
/// compound catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedRates {
    /// Fitted elimination rate constant (day⁻¹)
    pub elimination_rate: f64,
    /// Fitted absorption rate constant (day⁻¹)
    pub absorption_rate: f64,
}

/// Per-subject calibration state applied to all predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParameters {
    factor: f64,
    rates: Option<FittedRates>,
}

impl CalibrationParameters {
    /// Create parameters with the given multiplicative factor
    pub fn new(factor: f64) -> Self {
        Self {
            factor,
            rates: None,
        }
    }

    /// Attach diagnostic rate constants from a joint fit
    pub fn with_rates(mut self, rates: FittedRates) -> Self {
        self.rates = Some(rates);
        self
    }

    /// The multiplicative calibration factor
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Diagnostic rate constants, if a joint fit produced them
    pub fn rates(&self) -> Option<FittedRates> {
        self.rates
    }
}

impl Default for CalibrationParameters {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_usability() {
        assert!(BloodSample::new(10.0, 650.0).is_usable());
        assert!(!BloodSample::new(10.0, 0.0).is_usable());
        assert!(!BloodSample::new(10.0, -5.0).is_usable());
        assert!(!BloodSample::new(10.0, f64::NAN).is_usable());
        assert!(!BloodSample::new(f64::NAN, 650.0).is_usable());
    }

    #[test]
    fn test_calibration_defaults() {
        let params = CalibrationParameters::default();
        assert_eq!(params.factor(), 1.0);
        assert!(params.rates().is_none());
    }
}
