//! Time series construction and aggregation
//!
//! A [`TimeSeries`] is the unit every downstream comparison operates on:
//! one node, timestamps ascending, one value per timestamp. The aggregation
//! policy applied when several records share a timestamp depends on the
//! trace kind, selected from one table ([`TraceKind::aggregation_policy`]):
//!
//! - node-state counters take the **max** (overlapping log lines of a
//!   monotonically-updated counter at one instant),
//! - queue dequeue events **sum** (bytes dequeued within the bucket),
//! - rate/window/sender-view samples are **appended** untouched (each line
//!   is a distinct simulator event, duplicates retained).
//!
//! Max/Sum accumulate through a `BTreeMap` keyed on the timestamp, so
//! emission order is ascending by construction rather than by an incidental
//! map iteration order.

mod interp;

use crate::trace::{TraceKind, TraceRecord};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// How duplicate-timestamp records for one node are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Keep the largest value seen in the bucket
    Max,
    /// Accumulate all values in the bucket
    Sum,
    /// No reduction; every record is one sample
    Append,
}

impl TraceKind {
    /// Aggregation policy for this trace kind.
    #[must_use]
    pub const fn aggregation_policy(self) -> AggregationPolicy {
        match self {
            Self::NodeState => AggregationPolicy::Max,
            Self::QueueEvent => AggregationPolicy::Sum,
            Self::SenderView | Self::Rate | Self::Window => AggregationPolicy::Append,
        }
    }
}

/// An immutable per-node series of (timestamp, value) samples.
///
/// Invariants, enforced at construction and never mutated afterwards:
/// `timestamps.len() == values.len()`; timestamps are non-decreasing, and
/// strictly increasing for the deduplicating (Max/Sum) kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    node_id: u32,
    timestamps: Vec<u64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// A series with no samples.
    #[must_use]
    pub const fn empty(node_id: u32) -> Self {
        Self {
            node_id,
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a series from (timestamp, value) samples, sorting by timestamp.
    ///
    /// The sort is stable, so samples sharing a timestamp keep their input
    /// order. Lengths cannot disagree by construction.
    #[must_use]
    pub fn from_samples<I>(node_id: u32, samples: I) -> Self
    where
        I: IntoIterator<Item = (u64, f64)>,
    {
        let mut pairs: Vec<(u64, f64)> = samples.into_iter().collect();
        pairs.sort_by_key(|&(ts, _)| ts);
        let (timestamps, values) = pairs.into_iter().unzip();
        Self {
            node_id,
            timestamps,
            values,
        }
    }

    /// Node this series was filtered on.
    #[must_use]
    pub const fn node_id(&self) -> u32 {
        self.node_id
    }

    /// Timestamps, ascending.
    #[must_use]
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Values, one per timestamp.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// First and last timestamp, if any sample exists.
    #[must_use]
    pub fn span(&self) -> Option<(u64, u64)> {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        }
    }

    /// Mean of the values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySeries`] for a zero-sample series instead of
    /// dividing by zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(Error::EmptySeries {
                node_id: self.node_id,
            });
        }
        let n = self.values.len() as f64;
        Ok(self.values.iter().sum::<f64>() / n)
    }
}

/// Reduce parsed records into a [`TimeSeries`] under the kind's policy.
///
/// Records are assumed pre-filtered to one node (the parser's job); the
/// `node_id` tags the output series and any downstream `EmptySeries` error.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(kind: TraceKind, node_id: u32, records: Vec<TraceRecord>) -> TimeSeries {
    match kind.aggregation_policy() {
        AggregationPolicy::Max => {
            let mut buckets: BTreeMap<u64, i64> = BTreeMap::new();
            for rec in records {
                buckets
                    .entry(rec.timestamp_ns)
                    .and_modify(|v| *v = (*v).max(rec.value))
                    .or_insert(rec.value);
            }
            from_buckets(node_id, buckets)
        }
        AggregationPolicy::Sum => {
            let mut buckets: BTreeMap<u64, i64> = BTreeMap::new();
            for rec in records {
                *buckets.entry(rec.timestamp_ns).or_insert(0) += rec.value;
            }
            from_buckets(node_id, buckets)
        }
        AggregationPolicy::Append => TimeSeries::from_samples(
            node_id,
            records
                .into_iter()
                .map(|rec| (rec.timestamp_ns, rec.value as f64)),
        ),
    }
}

#[allow(clippy::cast_precision_loss)]
fn from_buckets(node_id: u32, buckets: BTreeMap<u64, i64>) -> TimeSeries {
    // BTreeMap iterates ascending by key; timestamps come out sorted and
    // unique without a separate sort pass.
    let mut timestamps = Vec::with_capacity(buckets.len());
    let mut values = Vec::with_capacity(buckets.len());
    for (ts, v) in buckets {
        timestamps.push(ts);
        values.push(v as f64);
    }
    TimeSeries {
        node_id,
        timestamps,
        values,
    }
}
