use rand::{distr::Alphanumeric, Rng};

use crate::data::{BloodSample, DoseSpec, Regimen, Stage, Treatment};
use crate::schedule::ScheduleError;

/// Fluent builder for [Treatment]
///
/// A treatment is either simple (exactly one [DoseSpec]) or advanced (one or
/// more [Stage]s); mixing the two, or building with neither, is rejected at
/// `build()`.
///
/// # Example
///
/// ```
/// use endosim::prelude::*;
///
/// let dose = DoseSpec::new(
///     Substance::compound("testosterone-enanthate"),
///     250.0,
///     Route::Intramuscular,
///     7.0,
///     0.0,
/// ).unwrap();
///
/// let treatment = Treatment::builder()
///     .id("trt-1")
///     .dose(dose)
///     .sample(21.0, 650.0)
///     .build()
///     .unwrap();
/// assert_eq!(treatment.samples().len(), 1);
/// ```
pub struct TreatmentBuilder {
    id: String,
    dose: Option<DoseSpec>,
    stages: Vec<Stage>,
    samples: Vec<BloodSample>,
}

impl TreatmentBuilder {
    pub(crate) fn new() -> Self {
        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(5)
            .map(char::from)
            .collect();
        Self {
            id,
            dose: None,
            stages: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Set the treatment identifier
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the single dose specification of a simple treatment
    pub fn dose(mut self, dose: DoseSpec) -> Self {
        self.dose = Some(dose);
        self
    }

    /// Append a stage to an advanced treatment
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a blood sample
    ///
    /// # Arguments
    ///
    /// * `time` - Days since treatment start
    /// * `value` - Measured concentration
    pub fn sample(mut self, time: f64, value: f64) -> Self {
        self.samples.push(BloodSample::new(time, value));
        self
    }

    /// Finalize the treatment
    pub fn build(self) -> Result<Treatment, ScheduleError> {
        let regimen = match (self.dose, self.stages.is_empty()) {
            (Some(dose), true) => Regimen::Simple(dose),
            (None, false) => Regimen::Advanced(self.stages),
            (Some(_), false) => return Err(ScheduleError::MixedRegimen),
            (None, true) => return Err(ScheduleError::EmptyTreatment),
        };
        let mut treatment = Treatment::new(self.id, regimen);
        for sample in self.samples {
            treatment.add_sample(sample);
        }
        Ok(treatment)
    }
}
