//! Probability sweep orchestration
//!
//! Thin glue around the core: trace-file naming conventions, invocation of
//! the external `trace_reader` binary, and the per-variant load/diff loop of
//! a probability sweep. The core never retries or recovers; tolerating a
//! failed variant and carrying on with the rest happens HERE, at the batch
//! level, and nowhere below.

use crate::diff::{exact_intersection_diff, DiffSeries};
use crate::series::{aggregate, TimeSeries};
use crate::surface::{SurfaceBuilder, SurfacePoint, VariantSeries};
use crate::trace::{read_trace_file, NodeFilter, TraceKind};
use crate::variant::{Behavior, VariantId};
use crate::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Install the crate's diagnostic subscriber (RUST_LOG-style filtering).
///
/// For binaries and test harnesses; safe to call more than once.
pub fn init_diagnostics() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn default_flow() -> String {
    "mini_flow".to_string()
}

fn default_topo() -> String {
    "mini_topology".to_string()
}

fn default_cc_algo() -> String {
    "hp95ai50".to_string()
}

/// One probability sweep, as deserialized from a JSON config.
///
/// Which node to analyze, which behavior at which probability step, the time
/// grid for the surface, and where the simulator's outputs live.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Node the analysis filters on
    pub node_id: u32,
    /// Surface time-grid step, nanoseconds
    pub ts_step_ns: u64,
    /// Misreporting behavior being swept
    pub behavior: Behavior,
    /// Probability step in percentage points
    pub prob_step: u8,
    /// Flow file name (part of the trace-file suffix)
    #[serde(default = "default_flow")]
    pub flow: String,
    /// Topology file name (part of the trace-file suffix)
    #[serde(default = "default_topo")]
    pub topo: String,
    /// CC algorithm label (part of the trace-file suffix)
    #[serde(default = "default_cc_algo")]
    pub cc_algo: String,
    /// Directory holding the simulator's mix outputs
    pub mix_dir: PathBuf,
    /// Directory holding `trace_reader` qlen outputs
    pub qlen_dir: PathBuf,
    /// Path of the external `trace_reader` binary
    pub trace_reader: Option<PathBuf>,
}

impl SweepConfig {
    /// Load a sweep configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if its contents do not deserialize.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Trace-file naming conventions shared by the simulator and `trace_reader`.
#[derive(Debug, Clone)]
pub struct TraceCatalog {
    mix_dir: PathBuf,
    qlen_dir: PathBuf,
    topo: String,
    flow: String,
    cc_algo: String,
}

impl TraceCatalog {
    /// Catalog rooted at the simulator's mix directory and the qlen trace
    /// directory.
    #[must_use]
    pub fn new(
        mix_dir: impl Into<PathBuf>,
        qlen_dir: impl Into<PathBuf>,
        topo: impl Into<String>,
        flow: impl Into<String>,
        cc_algo: impl Into<String>,
    ) -> Self {
        Self {
            mix_dir: mix_dir.into(),
            qlen_dir: qlen_dir.into(),
            topo: topo.into(),
            flow: flow.into(),
            cc_algo: cc_algo.into(),
        }
    }

    /// The `{topo}_{flow}_{cc_algo}_{misrep}` suffix every trace file carries.
    #[must_use]
    pub fn file_suffix(&self, misrep: &str) -> String {
        format!("{}_{}_{}_{misrep}", self.topo, self.flow, self.cc_algo)
    }

    /// Queue-length trace produced by `trace_reader` for one variant.
    #[must_use]
    pub fn qlen_trace_path(&self, misrep: &str) -> PathBuf {
        self.qlen_dir
            .join(format!("qlen_{}.txt", self.file_suffix(misrep)))
    }

    /// A named mix trace (`node_trace`, `wsize`, `sender_view`, ...) for one
    /// variant.
    #[must_use]
    pub fn mix_trace_path(&self, trace_name: &str, misrep: &str) -> PathBuf {
        self.mix_dir
            .join(format!("{trace_name}_{}.txt", self.file_suffix(misrep)))
    }

    /// The raw packet trace `trace_reader` consumes.
    #[must_use]
    pub fn raw_mix_path(&self, misrep: &str) -> PathBuf {
        self.mix_dir
            .join(format!("mix_{}.tr", self.file_suffix(misrep)))
    }
}

/// Run the external `trace_reader` binary over one variant's raw packet
/// trace, redirecting its stdout into the catalog's qlen trace file.
///
/// # Errors
///
/// Returns [`Error::ExternalProcess`] on a non-zero exit, [`Error::Io`] if
/// the process cannot be spawned or the output file created.
pub fn run_trace_reader(reader: &Path, catalog: &TraceCatalog, misrep: &str) -> Result<()> {
    let out_path = catalog.qlen_trace_path(misrep);
    let output = File::create(&out_path)?;
    let status = Command::new(reader)
        .arg(catalog.raw_mix_path(misrep))
        .stdout(output)
        .status()?;
    if !status.success() {
        return Err(Error::ExternalProcess {
            program: reader.display().to_string(),
            status: status.to_string(),
        });
    }
    Ok(())
}

/// Write one variant's misreporting-profile file for the simulator.
///
/// # Errors
///
/// Returns [`Error::InvalidVariant`] for the baseline (it has no profile)
/// and [`Error::Io`] if the file cannot be written.
pub fn write_misrep_profile(dir: &Path, variant: &VariantId) -> Result<PathBuf> {
    let body = variant
        .misrep_profile_body()
        .ok_or_else(|| Error::InvalidVariant(variant.id().to_string()))?;
    let path = dir.join(format!("{}.txt", variant.id()));
    std::fs::write(&path, body)?;
    Ok(path)
}

/// Everything a renderer needs from one sweep: the surface point cloud, the
/// per-variant exact-intersection diffs, and the variants that had to be
/// skipped.
#[derive(Debug)]
pub struct SweepOutput {
    /// (probability, time, tx-bytes diff) point cloud
    pub surface: Vec<SurfacePoint>,
    /// Exact-intersection tx-bytes diffs, one per loaded variant
    pub diffs: Vec<DiffSeries>,
    /// Identifiers of variants skipped after a load failure
    pub skipped: Vec<String>,
}

/// Drives one probability sweep end to end.
pub struct SweepRunner {
    config: SweepConfig,
}

impl SweepRunner {
    /// Runner for one sweep configuration.
    #[must_use]
    pub const fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    fn catalog(&self) -> TraceCatalog {
        TraceCatalog::new(
            self.config.mix_dir.clone(),
            self.config.qlen_dir.clone(),
            self.config.topo.clone(),
            self.config.flow.clone(),
            self.config.cc_algo.clone(),
        )
    }

    /// Load one variant's queue-length and tx-bytes series.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFile`] if either trace file cannot be read.
    /// No matching lines is not an error here; downstream interpolation
    /// reports `EmptySeries` when such a series is actually queried.
    pub fn load_variant_series(&self, misrep: &str) -> Result<VariantSeries> {
        let catalog = self.catalog();
        let filter = NodeFilter::node(self.config.node_id);

        let qlen_records =
            read_trace_file(catalog.qlen_trace_path(misrep), TraceKind::QueueEvent, &filter)?;
        let qlen = aggregate(TraceKind::QueueEvent, self.config.node_id, qlen_records);

        let tx_records = read_trace_file(
            catalog.mix_trace_path("node_trace", misrep),
            TraceKind::NodeState,
            &filter,
        )?;
        let tx_bytes = aggregate(TraceKind::NodeState, self.config.node_id, tx_records);

        Ok(VariantSeries::new(misrep, qlen, tx_bytes))
    }

    /// Baseline tx-bytes series; the reference every diff is taken against.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFile`] if the baseline trace cannot be read.
    /// A missing baseline fails the whole sweep; there is nothing to diff
    /// against.
    pub fn load_baseline_tx(&self) -> Result<TimeSeries> {
        let records = read_trace_file(
            self.catalog().mix_trace_path("node_trace", "none"),
            TraceKind::NodeState,
            &NodeFilter::node(self.config.node_id),
        )?;
        Ok(aggregate(
            TraceKind::NodeState,
            self.config.node_id,
            records,
        ))
    }

    /// Run the sweep: per variant, optionally regenerate the qlen trace via
    /// `trace_reader`, load both series, diff against the baseline. A failed
    /// variant is logged and skipped; the rest of the sweep proceeds.
    ///
    /// # Errors
    ///
    /// Returns an error only for sweep-fatal conditions: an unreadable
    /// baseline, or an empty baseline series (nothing spans the time grid).
    pub fn run(&self) -> Result<SweepOutput> {
        let baseline_tx = self.load_baseline_tx()?;

        let variants = VariantId::sweep(
            self.config.node_id,
            self.config.behavior,
            self.config.prob_step,
        );

        let mut loaded = Vec::with_capacity(variants.len());
        let mut diffs = Vec::with_capacity(variants.len());
        let mut skipped = Vec::new();

        for variant in &variants {
            if let Err(err) = self.prepare_and_load(variant, &baseline_tx, &mut loaded, &mut diffs)
            {
                tracing::error!(variant = variant.id(), %err, "skipping failed variant");
                skipped.push(variant.id().to_string());
            }
        }

        let surface =
            SurfaceBuilder::new(self.config.ts_step_ns).tx_bytes_diff_surface(&baseline_tx, &loaded)?;

        Ok(SweepOutput {
            surface,
            diffs,
            skipped,
        })
    }

    fn prepare_and_load(
        &self,
        variant: &VariantId,
        baseline_tx: &TimeSeries,
        loaded: &mut Vec<VariantSeries>,
        diffs: &mut Vec<DiffSeries>,
    ) -> Result<()> {
        if let Some(reader) = &self.config.trace_reader {
            run_trace_reader(reader, &self.catalog(), variant.id())?;
        }
        let series = self.load_variant_series(variant.id())?;
        // A trace file with no matching lines must fail the variant here,
        // not the whole sweep later when the surface queries the series.
        if series.tx_bytes().is_empty() || series.qlen().is_empty() {
            return Err(Error::EmptySeries {
                node_id: self.config.node_id,
            });
        }
        diffs.push(exact_intersection_diff(
            baseline_tx,
            series.tx_bytes(),
            variant.id(),
        ));
        loaded.push(series);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_suffix_concatenates_all_labels() {
        let catalog = TraceCatalog::new("mix", "qlen", "mini_topology", "mini_flow", "hp95ai50");
        assert_eq!(
            catalog.file_suffix("node_2_zero_p25"),
            "mini_topology_mini_flow_hp95ai50_node_2_zero_p25"
        );
    }

    #[test]
    fn trace_paths_follow_the_conventions() {
        let catalog = TraceCatalog::new("/sim/mix", "/analysis/qlen", "fat", "flow", "hp95ai50");
        assert_eq!(
            catalog.qlen_trace_path("none"),
            PathBuf::from("/analysis/qlen/qlen_fat_flow_hp95ai50_none.txt")
        );
        assert_eq!(
            catalog.mix_trace_path("node_trace", "none"),
            PathBuf::from("/sim/mix/node_trace_fat_flow_hp95ai50_none.txt")
        );
        assert_eq!(
            catalog.raw_mix_path("none"),
            PathBuf::from("/sim/mix/mix_fat_flow_hp95ai50_none.tr")
        );
    }

    #[test]
    fn sweep_config_deserializes_with_defaults() {
        let config: SweepConfig = serde_json::from_str(
            r#"{
                "node_id": 2,
                "ts_step_ns": 8320,
                "behavior": "zero",
                "prob_step": 25,
                "mix_dir": "/sim/mix",
                "qlen_dir": "/analysis/qlen"
            }"#,
        )
        .unwrap();
        assert_eq!(config.behavior, Behavior::Zero);
        assert_eq!(config.flow, "mini_flow");
        assert_eq!(config.topo, "mini_topology");
        assert_eq!(config.cc_algo, "hp95ai50");
        assert!(config.trace_reader.is_none());
    }

    #[test]
    fn sweep_config_loads_from_a_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        std::fs::write(
            &path,
            r#"{
                "node_id": 2,
                "ts_step_ns": 8320,
                "behavior": "add",
                "prob_step": 25,
                "mix_dir": "/sim/mix",
                "qlen_dir": "/analysis/qlen"
            }"#,
        )
        .unwrap();

        let config = SweepConfig::from_json_file(&path).unwrap();
        assert_eq!(config.behavior, Behavior::Add);
        assert_eq!(config.prob_step, 25);
        assert_eq!(config.mix_dir, PathBuf::from("/sim/mix"));
    }

    #[test]
    fn malformed_sweep_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = SweepConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn trace_reader_failure_is_external_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = TraceCatalog::new(dir.path(), dir.path(), "t", "f", "cc");
        let err = run_trace_reader(Path::new("/bin/false"), &catalog, "none").unwrap_err();
        assert!(matches!(err, Error::ExternalProcess { .. }));
    }

    #[test]
    fn misrep_profile_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let variant = VariantId::misreporting(2, Behavior::Zero, 25);
        let path = write_misrep_profile(dir.path(), &variant).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "1\n2 ZERO 25");

        assert!(write_misrep_profile(dir.path(), &VariantId::baseline()).is_err());
    }
}
