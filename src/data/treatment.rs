use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{BloodSample, CalibrationParameters, DoseSpec};
use crate::schedule::ScheduleError;

/// Days per stage week
pub(crate) const DAYS_PER_WEEK: f64 = 7.0;

/// A time-bounded segment of an advanced treatment
///
/// A stage spans `[start_week, end_week)` relative to the treatment start
/// and carries its own dose specifications. Dose offsets inside a stage are
/// relative to the stage window start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    start_week: u32,
    end_week: u32,
    doses: Vec<DoseSpec>,
}

impl Stage {
    /// Create a validated stage
    ///
    /// # Arguments
    ///
    /// * `start_week` - First week of the stage (0-based, inclusive)
    /// * `end_week` - End week of the stage (exclusive, > start_week)
    /// * `doses` - Dose specifications active during the stage
    pub fn new(start_week: u32, end_week: u32, doses: Vec<DoseSpec>) -> Result<Self, ScheduleError> {
        if end_week <= start_week {
            return Err(ScheduleError::InvalidStageWindow {
                start_week,
                end_week,
            });
        }
        Ok(Self {
            start_week,
            end_week,
            doses,
        })
    }

    /// First week of the stage (inclusive)
    pub fn start_week(&self) -> u32 {
        self.start_week
    }

    /// End week of the stage (exclusive)
    pub fn end_week(&self) -> u32 {
        self.end_week
    }

    /// Stage window start in days from the treatment start
    pub fn start_day(&self) -> f64 {
        self.start_week as f64 * DAYS_PER_WEEK
    }

    /// Stage window end in days from the treatment start (exclusive)
    pub fn end_day(&self) -> f64 {
        self.end_week as f64 * DAYS_PER_WEEK
    }

    /// Dose specifications active during the stage
    pub fn doses(&self) -> &[DoseSpec] {
        &self.doses
    }
}

/// The dosing structure of a treatment
///
/// A treatment is either a single indefinitely recurring dose specification,
/// or an ordered list of week-bounded stages each carrying its own doses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Regimen {
    /// One dose specification running from its start offset, unbounded
    /// unless the spec carries an end
    Simple(DoseSpec),
    /// Ordered week-bounded stages
    Advanced(Vec<Stage>),
}

/// A defect in an advanced treatment's stage timeline
///
/// Stage windows are expected to be contiguous and non-overlapping. The
/// engine does not repair a malformed timeline; it reports the issues and
/// simulates the windows as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageIssue {
    /// Uncovered weeks between stage `index` and the next stage
    Gap { index: usize, weeks: u32 },
    /// Stage `index` overlaps the next stage
    Overlap { index: usize, weeks: u32 },
    /// Stage `index` carries no doses
    Empty { index: usize },
}

impl fmt::Display for StageIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StageIssue::Gap { index, weeks } => {
                write!(f, "{weeks}-week gap after stage {index}")
            }
            StageIssue::Overlap { index, weeks } => {
                write!(f, "stage {index} overlaps the next stage by {weeks} weeks")
            }
            StageIssue::Empty { index } => write!(f, "stage {index} has no doses"),
        }
    }
}

/// A user's treatment: regimen, blood samples, and calibration state
///
/// The engine reads treatments to produce ephemeral concentration series and
/// returns updated [CalibrationParameters] for the caller to persist; it
/// never mutates a treatment itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    id: String,
    regimen: Regimen,
    samples: Vec<BloodSample>,
    calibration: CalibrationParameters,
}

impl Treatment {
    /// Create a treatment from a regimen
    pub fn new(id: impl Into<String>, regimen: Regimen) -> Self {
        Self {
            id: id.into(),
            regimen,
            samples: Vec::new(),
            calibration: CalibrationParameters::default(),
        }
    }

    /// Start building a treatment with a generated identifier
    pub fn builder() -> super::TreatmentBuilder {
        super::TreatmentBuilder::new()
    }

    /// Treatment identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The dosing regimen
    pub fn regimen(&self) -> &Regimen {
        &self.regimen
    }

    /// Blood samples, in insertion order
    pub fn samples(&self) -> &[BloodSample] {
        &self.samples
    }

    /// Append a blood sample
    pub fn add_sample(&mut self, sample: BloodSample) {
        self.samples.push(sample);
    }

    /// Current calibration parameters
    pub fn calibration(&self) -> CalibrationParameters {
        self.calibration
    }

    /// Replace the calibration parameters (typically with a fit result)
    pub fn set_calibration(&mut self, calibration: CalibrationParameters) {
        self.calibration = calibration;
    }

    /// Report gaps, overlaps, and empty stages in an advanced timeline
    ///
    /// Returns an empty vector for simple treatments and well-formed
    /// advanced timelines. Stages are examined in their stored order.
    pub fn stage_issues(&self) -> Vec<StageIssue> {
        let stages = match &self.regimen {
            Regimen::Simple(_) => return Vec::new(),
            Regimen::Advanced(stages) => stages,
        };
        let mut issues = Vec::new();
        for (index, stage) in stages.iter().enumerate() {
            if stage.doses().is_empty() {
                issues.push(StageIssue::Empty { index });
            }
            if let Some(next) = stages.get(index + 1) {
                if next.start_week() > stage.end_week() {
                    issues.push(StageIssue::Gap {
                        index,
                        weeks: next.start_week() - stage.end_week(),
                    });
                } else if next.start_week() < stage.end_week() {
                    issues.push(StageIssue::Overlap {
                        index,
                        weeks: stage.end_week() - next.start_week(),
                    });
                }
            }
        }
        issues
    }
}
