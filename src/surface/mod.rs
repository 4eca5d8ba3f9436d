//! Probability/time surface assembly
//!
//! Sweeps a regular (probability, time) grid over a set of variants and
//! emits one point per cell, quantifying how the impact of a misreporting
//! behavior varies jointly over probability and time. The time domain is
//! normalized by the baseline run's span; the probability axis comes from
//! each variant's trailing `p<digits>` identifier suffix.

use crate::diff::{expectation_at, grid_diff_at};
use crate::series::TimeSeries;
use crate::variant::extract_probability;
use crate::{Error, Result};
use serde::Serialize;

/// One cell of the probability×time grid. The full surface is an unordered
/// collection of these; consumers do not rely on point order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfacePoint {
    /// Probability axis value, percent
    pub probability_percent: u8,
    /// Time axis value, simulator nanoseconds
    pub timestamp_ns: u64,
    /// Surface height at this cell
    pub metric_value: f64,
}

/// Per-variant inputs to a surface: a label carrying the probability, a
/// queue-length-like series, and a tx-bytes-like series for the same node.
#[derive(Debug, Clone)]
pub struct VariantSeries {
    label: String,
    qlen: TimeSeries,
    tx_bytes: TimeSeries,
}

impl VariantSeries {
    /// Bundle one variant's series under its identifier label.
    pub fn new(label: impl Into<String>, qlen: TimeSeries, tx_bytes: TimeSeries) -> Self {
        Self {
            label: label.into(),
            qlen,
            tx_bytes,
        }
    }

    /// Variant identifier label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Queue-length-like series.
    #[must_use]
    pub const fn qlen(&self) -> &TimeSeries {
        &self.qlen
    }

    /// Tx-bytes-like series.
    #[must_use]
    pub const fn tx_bytes(&self) -> &TimeSeries {
        &self.tx_bytes
    }
}

/// Assembles (probability, time, metric) point clouds on a fixed time step.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceBuilder {
    ts_step_ns: u64,
}

impl SurfaceBuilder {
    /// Builder stepping the time axis every `ts_step_ns` nanoseconds.
    #[must_use]
    pub const fn new(ts_step_ns: u64) -> Self {
        Self { ts_step_ns }
    }

    /// Diff-vs-baseline surface: for each grid time `t` in the baseline's
    /// span (inclusive both ends) and each variant carrying a probability,
    /// one point whose height is the grid-interpolated tx-bytes diff at `t`.
    ///
    /// Variants whose label has no trailing `p<digits>` cannot sit on the
    /// probability axis; they are skipped with a diagnostic, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySeries`] if the baseline, or any gridded
    /// variant's tx-bytes series, has no samples.
    pub fn tx_bytes_diff_surface(
        &self,
        baseline_tx: &TimeSeries,
        variants: &[VariantSeries],
    ) -> Result<Vec<SurfacePoint>> {
        self.sweep_grid(baseline_tx, variants, |variant, t, _p| {
            grid_diff_at(baseline_tx, &variant.tx_bytes, t)
        })
    }

    /// Probability-weighted expected queue length surface: same grid, but
    /// each point's height is `qlen(t) * p / 100` for that variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySeries`] if the baseline, or any gridded
    /// variant's queue-length series, has no samples.
    pub fn expected_qlen_surface(
        &self,
        baseline_tx: &TimeSeries,
        variants: &[VariantSeries],
    ) -> Result<Vec<SurfacePoint>> {
        self.sweep_grid(baseline_tx, variants, |variant, t, p| {
            expectation_at(&variant.qlen, t, p)
        })
    }

    fn sweep_grid<F>(
        &self,
        baseline_tx: &TimeSeries,
        variants: &[VariantSeries],
        cell: F,
    ) -> Result<Vec<SurfacePoint>>
    where
        F: Fn(&VariantSeries, u64, u8) -> Result<f64>,
    {
        let (min_ts, max_ts) = baseline_tx.span().ok_or(Error::EmptySeries {
            node_id: baseline_tx.node_id(),
        })?;
        if self.ts_step_ns == 0 {
            tracing::warn!("surface grid with ts_step_ns=0 yields no points");
            return Ok(Vec::new());
        }

        // Resolve probability axis values once per variant, not per cell.
        let mut gridded = Vec::with_capacity(variants.len());
        for variant in variants {
            match extract_probability(variant.label()) {
                Some(probability) => gridded.push((variant, probability)),
                None => {
                    // cannot be plotted along the probability axis
                    tracing::warn!(
                        label = variant.label(),
                        "variant has no probability; excluded from surface"
                    );
                }
            }
        }

        let mut points = Vec::new();
        for t in GridTimestamps::new(min_ts, max_ts, self.ts_step_ns) {
            for &(variant, probability) in &gridded {
                points.push(SurfacePoint {
                    probability_percent: probability,
                    timestamp_ns: t,
                    metric_value: cell(variant, t, probability)?,
                });
            }
        }
        Ok(points)
    }
}

/// Inclusive `min..=max` walk in fixed steps, overflow-safe at `u64::MAX`.
struct GridTimestamps {
    next: Option<u64>,
    max: u64,
    step: u64,
}

impl GridTimestamps {
    const fn new(min: u64, max: u64, step: u64) -> Self {
        Self {
            next: Some(min),
            max,
            step,
        }
    }
}

impl Iterator for GridTimestamps {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let t = self.next?;
        if t > self.max {
            self.next = None;
            return None;
        }
        self.next = t.checked_add(self.step);
        Some(t)
    }
}
