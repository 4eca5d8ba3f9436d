//! Trace line parsing
//!
//! The simulator and its companion `trace_reader` binary emit several
//! whitespace-delimited line formats. Each format is a [`TraceKind`]; one
//! parser handles all of them, dispatched from the enum, so field positions
//! and filters live in exactly one place.
//!
//! Field layout (0-based):
//!
//! | kind        | min fields | node | value | filter                        |
//! |-------------|-----------|------|-------|-------------------------------|
//! | node-state  | 3         | 1    | 2     | none                          |
//! | queue-event | 11        | 1 (`n:<id>`) | 3 | `f[4]=="Dequ" && f[10]=="U"` |
//! | sender-view | 8         | 1    | 7     | `f[6] == hop_node_id`         |
//! | rate        | 7         | 1    | 6     | none                          |
//! | window      | 8         | 1    | 7     | none                          |
//!
//! Malformed lines (short, non-numeric) are skipped with a `tracing::warn!`
//! diagnostic and parsing continues. A file where no line matches the target
//! node is not an error; it yields an empty record set.

use crate::{Error, Result};
use std::path::Path;

/// The fixed line format a given metric's log file follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKind {
    /// Per-node cumulative counter lines, e.g. transmitted bytes
    NodeState,
    /// Queue enqueue/dequeue events as reformatted by `trace_reader`
    QueueEvent,
    /// Sender's per-hop view of a queue length
    SenderView,
    /// Sender rate updates
    Rate,
    /// Congestion window updates
    Window,
}

impl TraceKind {
    /// Minimum whitespace-separated field count for a well-formed line.
    #[must_use]
    pub const fn min_fields(self) -> usize {
        match self {
            Self::NodeState => 3,
            Self::QueueEvent => 11,
            Self::SenderView | Self::Window => 8,
            Self::Rate => 7,
        }
    }
}

/// One parsed trace line. Transient: produced and consumed in a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Simulator timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Reporting node
    pub node_id: u32,
    /// Metric value (bytes, bits, or a queue length depending on kind)
    pub value: i64,
    /// Observed hop node, present for sender-view lines only
    pub hop_node_id: Option<u32>,
}

/// Node (and, for sender-view traces, hop) the parse pass selects for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFilter {
    /// Target node id
    pub node_id: u32,
    /// Target hop node id; only consulted for sender-view lines
    pub hop_node_id: Option<u32>,
}

impl NodeFilter {
    /// Filter on a node alone.
    #[must_use]
    pub const fn node(node_id: u32) -> Self {
        Self {
            node_id,
            hop_node_id: None,
        }
    }

    /// Filter on a node and the hop it reports about.
    #[must_use]
    pub const fn with_hop(node_id: u32, hop_node_id: u32) -> Self {
        Self {
            node_id,
            hop_node_id: Some(hop_node_id),
        }
    }
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], idx: usize, line: &str) -> Option<T> {
    match fields[idx].parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(field = idx, line, "skipping line with non-numeric field");
            None
        }
    }
}

/// Parse one trace line.
///
/// Returns `Some` only for well-formed lines that pass the kind's structural
/// filter and match `filter`. Malformed lines log a diagnostic and return
/// `None`; lines for other nodes return `None` silently.
#[must_use]
pub fn parse_line(kind: TraceKind, line: &str, filter: &NodeFilter) -> Option<TraceRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return None;
    }
    if fields.len() < kind.min_fields() {
        tracing::warn!(min_fields = kind.min_fields(), line, "skipping short line");
        return None;
    }

    let timestamp_ns: u64 = parse_field(&fields, 0, line)?;

    match kind {
        TraceKind::NodeState => {
            let node_id: u32 = parse_field(&fields, 1, line)?;
            let value: i64 = parse_field(&fields, 2, line)?;
            (node_id == filter.node_id).then_some(TraceRecord {
                timestamp_ns,
                node_id,
                value,
                hop_node_id: None,
            })
        }
        TraceKind::QueueEvent => {
            // Dequeues of data ("U") packets only; everything else is a
            // legitimate event of no interest, not a malformed line.
            if fields[4] != "Dequ" || fields[10] != "U" {
                return None;
            }
            let node_tok = fields[1];
            let Some(id_part) = node_tok.split(':').nth(1) else {
                tracing::warn!(node_tok, line, "skipping line with malformed node token");
                return None;
            };
            let node_id: u32 = match id_part.parse() {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!(node_tok, line, "skipping line with malformed node token");
                    return None;
                }
            };
            let value: i64 = parse_field(&fields, 3, line)?;
            (node_id == filter.node_id).then_some(TraceRecord {
                timestamp_ns,
                node_id,
                value,
                hop_node_id: None,
            })
        }
        TraceKind::SenderView => {
            let node_id: u32 = parse_field(&fields, 1, line)?;
            let hop_node_id: u32 = parse_field(&fields, 6, line)?;
            let value: i64 = parse_field(&fields, 7, line)?;
            let hop_matches = filter.hop_node_id.map_or(true, |h| h == hop_node_id);
            (node_id == filter.node_id && hop_matches).then_some(TraceRecord {
                timestamp_ns,
                node_id,
                value,
                hop_node_id: Some(hop_node_id),
            })
        }
        TraceKind::Rate | TraceKind::Window => {
            let value_idx = if kind == TraceKind::Rate { 6 } else { 7 };
            let node_id: u32 = parse_field(&fields, 1, line)?;
            let value: i64 = parse_field(&fields, value_idx, line)?;
            (node_id == filter.node_id).then_some(TraceRecord {
                timestamp_ns,
                node_id,
                value,
                hop_node_id: None,
            })
        }
    }
}

/// Parse a whole trace text, keeping source line order.
#[must_use]
pub fn parse_lines(kind: TraceKind, text: &str, filter: &NodeFilter) -> Vec<TraceRecord> {
    text.lines()
        .filter_map(|line| parse_line(kind, line, filter))
        .collect()
}

/// Read and parse a trace file.
///
/// # Errors
///
/// Returns [`Error::MissingFile`] if the file cannot be read. No lines
/// matching the filter is NOT an error; the record set is simply empty.
pub fn read_trace_file<P: AsRef<Path>>(
    path: P,
    kind: TraceKind,
    filter: &NodeFilter,
) -> Result<Vec<TraceRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::MissingFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_lines(kind, &text, filter))
}
