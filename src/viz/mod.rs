//! Presentation-ready layers and summary statistics
//!
//! Assembles a completed simulation run and its effect indices into named,
//! orderable chart layers with default visibility, opacity, and colors, and
//! computes summary statistics over the run. Pure composition: mutators
//! affect presentation state only and never recompute the simulation.

use serde::{Deserialize, Serialize};

use crate::effect::EffectIndexSeries;
use crate::simulator::SimulationResult;

/// A single chart point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Days since the treatment start
    pub time: f64,
    /// Value in the canonical unit of the layer
    pub value: f64,
}

/// What a layer depicts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    /// Total concentration across all compounds
    Total,
    /// One compound's concentration, by catalog id
    Compound(String),
    /// Anabolic effect index
    AnabolicIndex,
    /// Androgenic effect index
    AndrogenicIndex,
}

/// A named, orderable presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    name: String,
    kind: LayerKind,
    color: String,
    points: Vec<DataPoint>,
    visible: bool,
    opacity: f64,
    z_order: usize,
}

impl Layer {
    /// Display name of the layer
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the layer depicts
    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    /// Hex color assigned to the layer
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Chronological chart points
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Whether the layer is currently shown
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Layer opacity in [0, 1]
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Draw order; higher draws on top
    pub fn z_order(&self) -> usize {
        self.z_order
    }
}

/// Summary statistics over one simulation run
///
/// Non-finite values are skipped rather than plotted; a series with no
/// finite data reports `None` for its statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Peak of the total curve as `(time, value)`
    pub peak_total: Option<(f64, f64)>,
    /// Highest-peaking single compound as `(name, value)`
    pub peak_compound: Option<(String, f64)>,
    /// Mean of the anabolic index
    pub avg_anabolic: Option<f64>,
    /// Peak of the anabolic index
    pub peak_anabolic: Option<f64>,
    /// Mean of the androgenic index
    pub avg_androgenic: Option<f64>,
    /// Peak of the androgenic index
    pub peak_androgenic: Option<f64>,
    /// Ratio of the mean anabolic to mean androgenic index
    pub anabolic_androgenic_ratio: Option<f64>,
}

/// Default color cycle for per-compound layers
const COMPOUND_COLORS: &[&str] = &[
    "#4C72B0", "#DD8452", "#55A868", "#C44E52", "#8172B3", "#937860", "#DA8BC3", "#8C8C8C",
];
const TOTAL_COLOR: &str = "#1A1A2E";
const ANABOLIC_COLOR: &str = "#2E86AB";
const ANDROGENIC_COLOR: &str = "#A23B72";

/// A set of layers plus summary statistics for one simulation run
///
/// Built fresh from a [SimulationResult]; mutating it never triggers a
/// recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartModel {
    layers: Vec<Layer>,
    stats: SummaryStats,
}

impl ChartModel {
    /// Assemble layers and statistics from a completed run
    ///
    /// Layer order (which is also the initial z-order): per-compound curves
    /// first, then the total, then the two index curves. Index layers start
    /// hidden; everything else starts visible at full opacity.
    pub fn build(result: &SimulationResult, indices: &EffectIndexSeries) -> Self {
        let mut layers = Vec::new();
        let mut z = 0;

        for (i, series) in result.per_compound().iter().enumerate() {
            layers.push(Layer {
                name: series.name.clone(),
                kind: LayerKind::Compound(series.id.clone()),
                color: COMPOUND_COLORS[i % COMPOUND_COLORS.len()].to_string(),
                points: zip_points(result.times(), &series.values),
                visible: true,
                opacity: 0.8,
                z_order: z,
            });
            z += 1;
        }

        layers.push(Layer {
            name: "Total".to_string(),
            kind: LayerKind::Total,
            color: TOTAL_COLOR.to_string(),
            points: zip_points(result.times(), result.total()),
            visible: true,
            opacity: 1.0,
            z_order: z,
        });
        z += 1;

        layers.push(Layer {
            name: "Anabolic index".to_string(),
            kind: LayerKind::AnabolicIndex,
            color: ANABOLIC_COLOR.to_string(),
            points: zip_points(&indices.times, &indices.anabolic),
            visible: false,
            opacity: 0.6,
            z_order: z,
        });
        z += 1;

        layers.push(Layer {
            name: "Androgenic index".to_string(),
            kind: LayerKind::AndrogenicIndex,
            color: ANDROGENIC_COLOR.to_string(),
            points: zip_points(&indices.times, &indices.androgenic),
            visible: false,
            opacity: 0.6,
            z_order: z,
        });

        let stats = summarize(result, indices);
        Self { layers, stats }
    }

    /// All layers, in z-order
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Look up a layer by name
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Summary statistics for the run
    pub fn stats(&self) -> &SummaryStats {
        &self.stats
    }

    /// Show or hide a layer; returns false if the name is unknown
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.layers.iter_mut().find(|l| l.name == name) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Set a layer's opacity, clamped to [0, 1]; returns false if unknown
    pub fn set_opacity(&mut self, name: &str, opacity: f64) -> bool {
        match self.layers.iter_mut().find(|l| l.name == name) {
            Some(layer) => {
                layer.opacity = opacity.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// Move a layer to a new position in the draw order
    ///
    /// Positions past the end clamp to the top. Returns false if the name is
    /// unknown.
    pub fn move_layer(&mut self, name: &str, position: usize) -> bool {
        let Some(from) = self.layers.iter().position(|l| l.name == name) else {
            return false;
        };
        let to = position.min(self.layers.len() - 1);
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        for (z, layer) in self.layers.iter_mut().enumerate() {
            layer.z_order = z;
        }
        true
    }
}

fn zip_points(times: &[f64], values: &[f64]) -> Vec<DataPoint> {
    times
        .iter()
        .zip(values)
        .map(|(&time, &value)| DataPoint { time, value })
        .collect()
}

fn finite_max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .max_by(|a, b| a.partial_cmp(b).expect("finite values compare"))
}

fn finite_mean(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        None
    } else {
        Some(finite.iter().sum::<f64>() / finite.len() as f64)
    }
}

fn summarize(result: &SimulationResult, indices: &EffectIndexSeries) -> SummaryStats {
    let peak_compound = result
        .per_compound()
        .iter()
        .filter_map(|series| finite_max(&series.values).map(|peak| (series.name.clone(), peak)))
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("finite values compare"));

    let avg_anabolic = finite_mean(&indices.anabolic);
    let avg_androgenic = finite_mean(&indices.androgenic);
    let anabolic_androgenic_ratio = match (avg_anabolic, avg_androgenic) {
        (Some(a), Some(g)) if g > 0.0 => Some(a / g),
        _ => None,
    };

    SummaryStats {
        peak_total: result.peak_total(),
        peak_compound,
        avg_anabolic,
        peak_anabolic: finite_max(&indices.anabolic),
        avg_androgenic,
        peak_androgenic: finite_max(&indices.androgenic),
        anabolic_androgenic_ratio,
    }
}
