//! Plot data handoff
//!
//! The renderer is an external collaborator; this crate hands it plain
//! serializable shapes and nothing else. Three shapes cover every chart the
//! analysis produces: one ordered series, a stack of labeled series (the
//! baseline plus its variants), and a (probability, time, metric) point set
//! for surfaces. Axis labels and titles travel with the data instead of
//! living in ambient globals.
//!
//! The time axis is handed over in milliseconds; traces log nanoseconds.

use crate::diff::DiffSeries;
use crate::series::TimeSeries;
use crate::surface::SurfacePoint;
use serde::Serialize;

/// Nanoseconds → milliseconds for the plot time axis.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ns_to_ms(t: u64) -> f64 {
    t as f64 / 1e6
}

/// One series as ordered `(time_ms, value)` pairs.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesPlot {
    /// Chart title
    pub title: String,
    /// X axis label
    pub xlabel: String,
    /// Y axis label
    pub ylabel: String,
    /// Ordered `(time_ms, value)` pairs
    pub points: Vec<(f64, f64)>,
}

impl SeriesPlot {
    /// Hand off a time series, converting timestamps to milliseconds.
    #[must_use]
    pub fn from_series(
        series: &TimeSeries,
        title: impl Into<String>,
        xlabel: impl Into<String>,
        ylabel: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            xlabel: xlabel.into(),
            ylabel: ylabel.into(),
            points: series
                .timestamps()
                .iter()
                .map(|&t| ns_to_ms(t))
                .zip(series.values().iter().copied())
                .collect(),
        }
    }
}

/// One labeled member of a stacked chart.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledSeries {
    /// Legend label (typically a variant identifier)
    pub label: String,
    /// Time axis, milliseconds
    pub times_ms: Vec<f64>,
    /// Values, one per time
    pub values: Vec<f64>,
}

/// Several labeled series over a shared time axis.
#[derive(Debug, Clone, Serialize, Default)]
pub struct StackedPlot {
    /// Chart title
    pub title: String,
    /// X axis label
    pub xlabel: String,
    /// Y axis label
    pub ylabel: String,
    /// Member series, legend order
    pub series: Vec<LabeledSeries>,
}

impl StackedPlot {
    /// An empty stack with labels set.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        xlabel: impl Into<String>,
        ylabel: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            xlabel: xlabel.into(),
            ylabel: ylabel.into(),
            series: Vec::new(),
        }
    }

    /// Add one variant's series under its label.
    pub fn push_series(&mut self, label: impl Into<String>, series: &TimeSeries) {
        self.series.push(LabeledSeries {
            label: label.into(),
            times_ms: series.timestamps().iter().map(|&t| ns_to_ms(t)).collect(),
            values: series.values().to_vec(),
        });
    }

    /// Add one diff series; the label is the diffed variant's identifier.
    pub fn push_diff(&mut self, diff: &DiffSeries) {
        self.series.push(LabeledSeries {
            label: diff.variant_id().to_string(),
            times_ms: diff.timestamps().iter().map(|&t| ns_to_ms(t)).collect(),
            values: diff.diff_values().to_vec(),
        });
    }
}

/// A surface point with the time axis already in milliseconds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SurfacePlotPoint {
    /// Probability axis, percent
    pub probability_percent: u8,
    /// Time axis, milliseconds
    pub time_ms: f64,
    /// Surface height
    pub metric_value: f64,
}

/// A (probability, time, metric) point set for a 3-D surface chart.
#[derive(Debug, Clone, Serialize)]
pub struct SurfacePlot {
    /// Chart title
    pub title: String,
    /// X axis (time) label
    pub xlabel: String,
    /// Y axis (probability) label
    pub ylabel: String,
    /// Z axis (metric) label
    pub zlabel: String,
    /// Unordered point cloud
    pub points: Vec<SurfacePlotPoint>,
}

impl SurfacePlot {
    /// Hand off surface points, converting grid timestamps to milliseconds.
    #[must_use]
    pub fn from_points(
        points: &[SurfacePoint],
        title: impl Into<String>,
        xlabel: impl Into<String>,
        ylabel: impl Into<String>,
        zlabel: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            xlabel: xlabel.into(),
            ylabel: ylabel.into(),
            zlabel: zlabel.into(),
            points: points
                .iter()
                .map(|p| SurfacePlotPoint {
                    probability_percent: p.probability_percent,
                    time_ms: ns_to_ms(p.timestamp_ns),
                    metric_value: p.metric_value,
                })
                .collect(),
        }
    }
}
