//! Baseline-relative diffs between series
//!
//! Two alignment modes, both used downstream:
//!
//! 1. [`exact_intersection_diff`] — pairs samples sharing an exact
//!    timestamp, drops the rest. Used for stacked comparisons of runs that
//!    log on the same schedule.
//! 2. [`grid_diff_at`] — interpolates both series at a caller-supplied grid
//!    timestamp, so no grid point is ever dropped. Used for surfaces.
//!
//! Plus the probability-weighted expectation: the share of an observed
//! signal attributable to a behavior applied with probability `p`.

use crate::series::TimeSeries;
use crate::Result;
use std::collections::HashMap;

/// Differences of one variant against the baseline. Derived and transient:
/// owned by the comparison call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffSeries {
    variant_id: String,
    timestamps: Vec<u64>,
    diff_values: Vec<f64>,
}

impl DiffSeries {
    /// Identifier of the variant that was diffed against the baseline.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Timestamps where both runs had an exact sample.
    #[must_use]
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// `variant - baseline`, one per timestamp.
    #[must_use]
    pub fn diff_values(&self) -> &[f64] {
        &self.diff_values
    }

    /// Number of intersecting samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no timestamps intersected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Diff a variant against the baseline at exactly-shared timestamps.
///
/// Variant samples whose timestamp does not occur in the baseline are
/// dropped — no interpolation in this mode. Output length is therefore at
/// most the variant length. Diffing a series against itself yields zeros.
#[must_use]
pub fn exact_intersection_diff(
    baseline: &TimeSeries,
    variant: &TimeSeries,
    variant_id: &str,
) -> DiffSeries {
    let baseline_at: HashMap<u64, f64> = baseline
        .timestamps()
        .iter()
        .copied()
        .zip(baseline.values().iter().copied())
        .collect();

    let mut timestamps = Vec::new();
    let mut diff_values = Vec::new();
    for (&t, &v) in variant.timestamps().iter().zip(variant.values()) {
        if let Some(&base) = baseline_at.get(&t) {
            timestamps.push(t);
            diff_values.push(v - base);
        }
    }

    DiffSeries {
        variant_id: variant_id.to_string(),
        timestamps,
        diff_values,
    }
}

/// `variant - baseline` at a grid timestamp, both sides interpolated.
///
/// Never drops a grid point: flat extrapolation covers timestamps outside
/// either series' span.
///
/// # Errors
///
/// Returns [`crate::Error::EmptySeries`] if either series has no samples.
pub fn grid_diff_at(baseline: &TimeSeries, variant: &TimeSeries, t: u64) -> Result<f64> {
    Ok(variant.value_at(t)? - baseline.value_at(t)?)
}

/// Probability-weighted expectation of a series at `t`.
///
/// For a behavior applied with probability `p` percent, the expected
/// contribution to the observed signal is `value_at(t) * p / 100`.
///
/// # Errors
///
/// Returns [`crate::Error::EmptySeries`] if the series has no samples.
pub fn expectation_at(series: &TimeSeries, t: u64, probability_percent: u8) -> Result<f64> {
    Ok(series.value_at(t)? * f64::from(probability_percent) / 100.0)
}
