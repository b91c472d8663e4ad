use serde::{Deserialize, Serialize};

use crate::catalog::{Route, Substance};
use crate::schedule::ScheduleError;

/// A recurring dose description
///
/// A [DoseSpec] administers a fixed mass of a substance via one route at a
/// fixed interval, starting at an offset in days. Inside a
/// [Stage](crate::data::Stage), offsets are relative to the stage window;
/// in a simple treatment they are relative to the treatment start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseSpec {
    substance: Substance,
    amount: f64,
    route: Route,
    interval: f64,
    start: f64,
    end: Option<f64>,
}

impl DoseSpec {
    /// Create a validated dose specification
    ///
    /// # Arguments
    ///
    /// * `substance` - Compound or blend being administered
    /// * `amount` - Dose mass in mg, > 0
    /// * `route` - Administration route
    /// * `interval` - Days between administrations, > 0
    /// * `start` - Offset in days of the first administration
    pub fn new(
        substance: Substance,
        amount: f64,
        route: Route,
        interval: f64,
        start: f64,
    ) -> Result<Self, ScheduleError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ScheduleError::InvalidAmount(amount));
        }
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ScheduleError::InvalidInterval(interval));
        }
        if !start.is_finite() {
            return Err(ScheduleError::InvalidStart(start));
        }
        Ok(Self {
            substance,
            amount,
            route,
            interval,
            start,
            end: None,
        })
    }

    /// Bound the dosing window: no administration at or after `end` days
    pub fn with_end(mut self, end: f64) -> Result<Self, ScheduleError> {
        if !end.is_finite() || end <= self.start {
            return Err(ScheduleError::InvalidWindow {
                start: self.start,
                end,
            });
        }
        self.end = Some(end);
        Ok(self)
    }

    /// The substance being administered
    pub fn substance(&self) -> &Substance {
        &self.substance
    }

    /// Dose mass in mg
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Administration route
    pub fn route(&self) -> Route {
        self.route
    }

    /// Days between administrations
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Offset in days of the first administration
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Optional exclusive end of the dosing window, in days
    pub fn end(&self) -> Option<f64> {
        self.end
    }
}
