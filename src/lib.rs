//! # trace-diff: comparative analysis of congestion-control simulator traces
//!
//! trace-diff ingests line-oriented trace logs produced by a network
//! congestion-control simulator (queue occupancy, transmitted bytes, sender
//! rate, congestion window, per-hop sender views) and compares experiment
//! *variants* — runs where a node misreports its congestion signal with a
//! configured behavior and probability — against a baseline run.
//!
//! The pipeline is strictly forward:
//!
//! ```text
//! raw text -> trace (parse) -> series (aggregate) -> diff / surface -> plot
//! ```
//!
//! ## Example
//!
//! ```rust
//! use trace_diff::series::aggregate;
//! use trace_diff::trace::{parse_lines, NodeFilter, TraceKind};
//!
//! let text = "100 2 50\n100 2 70\n200 2 80\n";
//! let records = parse_lines(TraceKind::NodeState, text, &NodeFilter::node(2));
//! let series = aggregate(TraceKind::NodeState, 2, records);
//! assert_eq!(series.timestamps(), &[100, 200]);
//! # Ok::<(), trace_diff::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod diff;
pub mod error;
pub mod plot;
pub mod series;
pub mod surface;
pub mod sweep;
pub mod trace;
pub mod variant;

pub use error::{Error, Result};
