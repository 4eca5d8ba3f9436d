//! End-to-end pipeline tests: raw trace text through parsing, aggregation,
//! diffing, and surface assembly, plus the file-backed sweep loop.

use std::fs;
use trace_diff::diff::exact_intersection_diff;
use trace_diff::plot::{StackedPlot, SurfacePlot};
use trace_diff::series::aggregate;
use trace_diff::surface::{SurfaceBuilder, VariantSeries};
use trace_diff::sweep::{SweepConfig, SweepRunner};
use trace_diff::trace::{parse_lines, read_trace_file, NodeFilter, TraceKind};
use trace_diff::variant::Behavior;

#[test]
fn node_state_text_to_series() {
    let text = "100 2 50\n100 2 70\n200 2 80\n";
    let records = parse_lines(TraceKind::NodeState, text, &NodeFilter::node(2));
    let series = aggregate(TraceKind::NodeState, 2, records);

    assert_eq!(series.timestamps(), &[100, 200]);
    assert_eq!(series.values(), &[70.0, 80.0]);
}

#[test]
fn queue_event_text_filters_and_sums() {
    let text = "\
100 n:2 x 5 Dequ ecn:0 a b c d U
100 n:2 x 9 Dequ ecn:0 a b c d U
100 n:2 x 100 Enqu ecn:0 a b c d U
100 n:3 x 100 Dequ ecn:0 a b c d U
200 n:2 x 3 Dequ ecn:0 a b c d U
";
    let records = parse_lines(TraceKind::QueueEvent, text, &NodeFilter::node(2));
    let series = aggregate(TraceKind::QueueEvent, 2, records);

    assert_eq!(series.timestamps(), &[100, 200]);
    assert_eq!(series.values(), &[14.0, 3.0]);
}

#[test]
fn unmatched_node_gives_empty_series_then_empty_series_error() {
    let text = "100 2 50\n200 2 80\n";
    let records = parse_lines(TraceKind::NodeState, text, &NodeFilter::node(9));
    assert!(records.is_empty());

    let series = aggregate(TraceKind::NodeState, 9, records);
    assert!(series.is_empty());
    assert!(series.value_at(100).is_err());
    assert!(series.mean().is_err());
}

#[test]
fn baseline_diff_and_surface_from_text() {
    let baseline_text = "0 2 0\n100 2 10\n200 2 20\n300 2 30\n";
    let variant_text = "0 2 0\n150 2 30\n300 2 60\n";

    let filter = NodeFilter::node(2);
    let baseline = aggregate(
        TraceKind::NodeState,
        2,
        parse_lines(TraceKind::NodeState, baseline_text, &filter),
    );
    let variant = aggregate(
        TraceKind::NodeState,
        2,
        parse_lines(TraceKind::NodeState, variant_text, &filter),
    );

    // exact intersection: only ts 0 and 300 are shared
    let diff = exact_intersection_diff(&baseline, &variant, "node_2_triple_p100");
    assert_eq!(diff.timestamps(), &[0, 300]);
    assert_eq!(diff.diff_values(), &[0.0, 30.0]);

    // grid mode keeps every point; baseline span [0,300] step 100
    let variants = vec![VariantSeries::new(
        "node_2_triple_p100",
        variant.clone(),
        variant,
    )];
    let points = SurfaceBuilder::new(100)
        .tx_bytes_diff_surface(&baseline, &variants)
        .unwrap();
    let grid: Vec<u64> = points.iter().map(|p| p.timestamp_ns).collect();
    assert_eq!(grid, [0, 100, 200, 300]);

    // at t=100 the variant interpolates to 20, baseline is 10
    let p100 = points.iter().find(|p| p.timestamp_ns == 100).unwrap();
    assert!((p100.metric_value - 10.0).abs() < 1e-9);
}

fn write_sweep_fixture(dir: &std::path::Path) {
    let suffix = |misrep: &str| format!("t_f_cc_{misrep}");

    fs::write(
        dir.join(format!("node_trace_{}.txt", suffix("none"))),
        "0 2 0\n300 2 30\n",
    )
    .unwrap();

    for (misrep, v0, v1) in [
        ("node_2_zero_p50", 10, 40),
        ("node_2_zero_p100", 20, 50),
    ] {
        fs::write(
            dir.join(format!("node_trace_{}.txt", suffix(misrep))),
            format!("0 2 {v0}\n300 2 {v1}\n"),
        )
        .unwrap();
        fs::write(
            dir.join(format!("qlen_{}.txt", suffix(misrep))),
            "100 n:2 x 500 Dequ ecn:0 a b c d U\n",
        )
        .unwrap();
    }
}

fn sweep_config(dir: &std::path::Path) -> SweepConfig {
    serde_json::from_value(serde_json::json!({
        "node_id": 2,
        "ts_step_ns": 100,
        "behavior": "zero",
        "prob_step": 50,
        "topo": "t",
        "flow": "f",
        "cc_algo": "cc",
        "mix_dir": dir,
        "qlen_dir": dir,
    }))
    .unwrap()
}

#[test]
fn sweep_runs_end_to_end_over_trace_files() {
    trace_diff::sweep::init_diagnostics();
    let dir = tempfile::tempdir().unwrap();
    write_sweep_fixture(dir.path());

    let output = SweepRunner::new(sweep_config(dir.path())).run().unwrap();

    assert!(output.skipped.is_empty());
    assert_eq!(output.diffs.len(), 2);
    // both variants share ts 0 and 300 with the baseline
    assert_eq!(output.diffs[0].variant_id(), "node_2_zero_p50");
    assert_eq!(output.diffs[0].diff_values(), &[10.0, 10.0]);
    assert_eq!(output.diffs[1].diff_values(), &[20.0, 20.0]);

    // 4 grid timestamps x 2 variants
    assert_eq!(output.surface.len(), 8);
    assert!(output
        .surface
        .iter()
        .all(|p| p.probability_percent == 50 || p.probability_percent == 100));

    // everything a renderer receives is plain serializable data
    let mut stack = StackedPlot::new(
        "Difference in transmitted bytes",
        "Time (ms)",
        "Diff transmitted bytes",
    );
    for diff in &output.diffs {
        stack.push_diff(diff);
    }
    assert_eq!(stack.series.len(), 2);

    let surface_plot = SurfacePlot::from_points(
        &output.surface,
        "Prob/time/util surface",
        "Timestamp (ms)",
        "Probability (%)",
        "Diff tx_bytes (B)",
    );
    assert_eq!(surface_plot.points.len(), output.surface.len());
    assert!(serde_json::to_string(&surface_plot).is_ok());
}

#[test]
fn sweep_skips_a_broken_variant_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    write_sweep_fixture(dir.path());
    fs::remove_file(dir.path().join("node_trace_t_f_cc_node_2_zero_p100.txt")).unwrap();

    let output = SweepRunner::new(sweep_config(dir.path())).run().unwrap();

    assert_eq!(output.skipped, vec!["node_2_zero_p100".to_string()]);
    assert_eq!(output.diffs.len(), 1);
    assert_eq!(output.surface.len(), 4); // p50 only
}

#[test]
fn sweep_skips_a_variant_whose_trace_matches_no_lines() {
    let dir = tempfile::tempdir().unwrap();
    write_sweep_fixture(dir.path());
    // the p100 trace file exists but only logs a different node
    fs::write(
        dir.path().join("node_trace_t_f_cc_node_2_zero_p100.txt"),
        "0 3 20\n300 3 50\n",
    )
    .unwrap();

    let output = SweepRunner::new(sweep_config(dir.path())).run().unwrap();

    assert_eq!(output.skipped, vec!["node_2_zero_p100".to_string()]);
    assert_eq!(output.diffs.len(), 1);
    assert_eq!(output.surface.len(), 4); // p50 only
}

#[test]
fn sweep_without_baseline_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = SweepRunner::new(sweep_config(dir.path())).run().unwrap_err();
    assert!(matches!(err, trace_diff::Error::MissingFile { .. }));
}

#[test]
fn read_trace_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node_trace.txt");
    fs::write(&path, "100 2 50\nbad line\n200 2 80\n").unwrap();

    let records = read_trace_file(&path, TraceKind::NodeState, &NodeFilter::node(2)).unwrap();
    assert_eq!(records.len(), 2);

    let series = aggregate(TraceKind::NodeState, 2, records);
    assert_eq!(series.timestamps(), &[100, 200]);
}

#[test]
fn behavior_sweep_matches_profile_grammar() {
    use std::str::FromStr;
    use trace_diff::variant::VariantId;

    for id in VariantId::sweep(2, Behavior::Triple, 25) {
        let reparsed = VariantId::from_str(id.id()).unwrap();
        assert_eq!(reparsed.behavior(), Some(Behavior::Triple));
        assert_eq!(reparsed.node_id(), Some(2));
    }
}
