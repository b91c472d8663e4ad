//! Dose schedule generation
//!
//! Expands recurring dose descriptions into concrete, chronologically ordered
//! administration events over a query window. Advanced treatments are
//! expanded per stage (week windows translated to absolute days from the
//! treatment start) and merged; blend doses are decomposed into per-compound
//! events with mass conserved.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, Route, Substance};
use crate::data::{DoseSpec, Regimen, Treatment};

/// Errors in dosing-timeline or query-grid configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Dose mass must be positive and finite
    #[error("dose amount must be positive, got {0}")]
    InvalidAmount(f64),

    /// Dosing interval must be positive and finite
    #[error("dose interval must be positive, got {0}")]
    InvalidInterval(f64),

    /// Dose start offset must be finite
    #[error("dose start offset must be finite, got {0}")]
    InvalidStart(f64),

    /// Dose window end must be finite and after the start
    #[error("dose window end {end} must be after start {start}")]
    InvalidWindow { start: f64, end: f64 },

    /// Stage end week must be after its start week
    #[error("stage window [{start_week}, {end_week}) is empty or inverted")]
    InvalidStageWindow { start_week: u32, end_week: u32 },

    /// Grid step must be positive and finite
    #[error("grid step must be positive, got {0}")]
    InvalidStep(f64),

    /// A treatment cannot carry both a simple dose and stages
    #[error("treatment mixes a simple dose with stages")]
    MixedRegimen,

    /// A treatment must carry a dose or at least one stage
    #[error("treatment has no doses")]
    EmptyTreatment,
}

/// The query window for a simulation run
///
/// Times are days relative to the treatment start. An inverted window
/// (`end < start`) is not an error; it produces an empty grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    start: f64,
    end: f64,
    step: f64,
}

impl TimeGrid {
    /// Create a grid over `[start, end]` sampled every `step` days
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, ScheduleError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ScheduleError::InvalidStep(step));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(ScheduleError::InvalidStart(if start.is_finite() {
                end
            } else {
                start
            }));
        }
        Ok(Self { start, end, step })
    }

    /// A daily-resolution grid over `[start, end]`
    pub fn daily(start: f64, end: f64) -> Result<Self, ScheduleError> {
        Self::new(start, end, 1.0)
    }

    /// Window start in days
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Window end in days
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Sampling step in days
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Whether the grid produces no query points
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// The ordered query timestamps
    ///
    /// `start` is always included; subsequent points advance by integer
    /// multiples of `step` to avoid accumulation drift.
    pub fn times(&self) -> Vec<f64> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut times = Vec::new();
        let mut n = 0u64;
        loop {
            let t = self.start + n as f64 * self.step;
            if t > self.end {
                break;
            }
            times.push(t);
            n += 1;
        }
        times
    }
}

/// A single concrete administration of one compound via one route
///
/// Blend doses are already decomposed; `amount` is the per-compound mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    /// Administration time in days from the treatment start
    pub time: f64,
    /// Catalog compound id
    pub compound: String,
    /// Administration route
    pub route: Route,
    /// Administered mass of this compound in mg
    pub amount: f64,
}

/// Administration times of one dose spec within `[from, to]`
///
/// Both query bounds are inclusive; a dose exactly at `from` or `to` is
/// returned. The spec's own window end (if any) is exclusive. An inverted
/// query range yields an empty sequence.
pub fn administration_times(spec: &DoseSpec, from: f64, to: f64) -> Vec<f64> {
    expand_times(spec, 0.0, f64::INFINITY, from, to)
}

/// Expand a spec whose offsets are shifted by `offset` days and whose window
/// is capped at `cap` (exclusive), e.g. a stage boundary.
fn expand_times(spec: &DoseSpec, offset: f64, cap: f64, from: f64, to: f64) -> Vec<f64> {
    if to < from {
        return Vec::new();
    }
    let start = spec.start() + offset;
    let window_end = spec
        .end()
        .map(|end| end + offset)
        .unwrap_or(f64::INFINITY)
        .min(cap);

    let lo = from.max(start);
    // First multiple of the interval at or after the query start
    let first = if lo <= start {
        0
    } else {
        ((lo - start) / spec.interval()).ceil() as u64
    };

    let mut times = Vec::new();
    let mut n = first;
    loop {
        let t = start + n as f64 * spec.interval();
        if t > to || t >= window_end {
            break;
        }
        times.push(t);
        n += 1;
    }
    times
}

/// Expand a treatment into chronologically ordered per-compound dose events
///
/// Stage week windows are translated into absolute days from the treatment
/// start; stages expand independently and merge by timestamp. Blend doses
/// fan out into one event per component with the blend mass split by
/// concentration fraction. Route support is checked against the catalog for
/// every compound touched, so the simulator never sees an unsupported route.
pub fn dose_events(
    catalog: &Catalog,
    treatment: &Treatment,
    from: f64,
    to: f64,
) -> Result<Vec<DoseEvent>, CatalogError> {
    let mut events = Vec::new();
    match treatment.regimen() {
        Regimen::Simple(spec) => {
            expand_into(catalog, spec, 0.0, f64::INFINITY, from, to, &mut events)?;
        }
        Regimen::Advanced(stages) => {
            for stage in stages {
                for spec in stage.doses() {
                    expand_into(
                        catalog,
                        spec,
                        stage.start_day(),
                        stage.end_day(),
                        from,
                        to,
                        &mut events,
                    )?;
                }
            }
        }
    }
    events.sort_by(|a, b| a.time.partial_cmp(&b.time).expect("dose times are finite"));
    Ok(events)
}

fn expand_into(
    catalog: &Catalog,
    spec: &DoseSpec,
    offset: f64,
    cap: f64,
    from: f64,
    to: f64,
    events: &mut Vec<DoseEvent>,
) -> Result<(), CatalogError> {
    let times = expand_times(spec, offset, cap, from, to);
    if times.is_empty() {
        return Ok(());
    }
    match spec.substance() {
        Substance::Compound(id) => {
            let compound = catalog.compound(id)?;
            compound.kinetics(spec.route())?;
            for &time in &times {
                events.push(DoseEvent {
                    time,
                    compound: id.clone(),
                    route: spec.route(),
                    amount: spec.amount(),
                });
            }
        }
        Substance::Blend(id) => {
            let blend = catalog.blend(id)?;
            let components = blend.component_doses(spec.amount());
            for (compound_id, _) in &components {
                catalog.compound(compound_id)?.kinetics(spec.route())?;
            }
            for &time in &times {
                for (compound_id, amount) in &components {
                    events.push(DoseEvent {
                        time,
                        compound: compound_id.to_string(),
                        route: spec.route(),
                        amount: *amount,
                    });
                }
            }
        }
    }
    Ok(())
}
