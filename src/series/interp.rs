//! Interpolated sampling of a series at arbitrary timestamps
//!
//! Variants sample at irregular, mutually misaligned instants; every
//! cross-series comparison on a regular grid goes through [`TimeSeries::value_at`].

use super::TimeSeries;
use crate::{Error, Result};

impl TimeSeries {
    /// Value of the series at query timestamp `t`.
    ///
    /// - exact timestamp hit: the stored value;
    /// - `t` before the first / after the last sample: the first / last
    ///   value (flat extrapolation, not slope extension);
    /// - otherwise: linear interpolation between the bracketing samples.
    ///
    /// A one-sample series therefore behaves as a constant function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySeries`] when the series has no samples.
    #[allow(clippy::cast_precision_loss)]
    pub fn value_at(&self, t: u64) -> Result<f64> {
        let timestamps = self.timestamps();
        let values = self.values();
        if timestamps.is_empty() {
            return Err(Error::EmptySeries {
                node_id: self.node_id(),
            });
        }

        // Index of the first timestamp >= t.
        let idx = timestamps.partition_point(|&ts| ts < t);

        if idx == timestamps.len() {
            return Ok(values[timestamps.len() - 1]);
        }
        if timestamps[idx] == t {
            return Ok(values[idx]);
        }
        if idx == 0 {
            return Ok(values[0]);
        }

        let (t1, v1) = (timestamps[idx - 1], values[idx - 1]);
        let (t2, v2) = (timestamps[idx], values[idx]);
        Ok(v1 + (t - t1) as f64 * (v2 - v1) / (t2 - t1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(samples: &[(u64, f64)]) -> TimeSeries {
        TimeSeries::from_samples(0, samples.iter().copied())
    }

    #[test]
    fn exact_hit_returns_stored_value() {
        let s = series(&[(100, 10.0), (200, 20.0), (300, 5.0)]);
        for (i, &t) in s.timestamps().iter().enumerate() {
            assert!((s.value_at(t).unwrap() - s.values()[i]).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn linear_interpolation_between_samples() {
        let s = series(&[(100, 10.0), (200, 20.0)]);
        assert!((s.value_at(150).unwrap() - 15.0).abs() < f64::EPSILON);
        assert!((s.value_at(175).unwrap() - 17.5).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_extrapolation_both_ends() {
        let s = series(&[(100, 10.0), (200, 20.0)]);
        assert!((s.value_at(0).unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((s.value_at(99).unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((s.value_at(201).unwrap() - 20.0).abs() < f64::EPSILON);
        assert!((s.value_at(u64::MAX).unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn single_sample_is_a_constant_function() {
        let s = series(&[(100, 42.0)]);
        for t in [0, 100, 1_000_000] {
            assert!((s.value_at(t).unwrap() - 42.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn empty_series_is_an_error() {
        let err = TimeSeries::empty(3).value_at(100).unwrap_err();
        assert!(matches!(err, Error::EmptySeries { node_id: 3 }));
    }
}
