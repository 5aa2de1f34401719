//! E2E tests for the analysis pipeline
//!
//! Timestamps -> latency deltas -> statistics and histogram, exercised through
//! the public API the way a certified run uses it.

use approx::assert_relative_eq;
use latency_certifier::analysis::histogram::resolve_bin_offset;
use latency_certifier::analysis::render::{bar_heights, LatencyBand};
use latency_certifier::analysis::AnalysisError;
use latency_certifier::{Histogram, LatencyAnalyzer, StatisticsSummary};

/// Timestamps of a subject who answers every cue `latency` ms late
fn responses(analyzer: &LatencyAnalyzer, count: usize, latency: f64) -> Vec<f64> {
    analyzer
        .expected_times(count)
        .into_iter()
        .map(|t| t + latency)
        .collect()
}

/// Test a constant responder yields a single spike
#[test]
fn test_constant_latency_pipeline() {
    let analyzer = LatencyAnalyzer::new(4.0).unwrap();
    let timestamps = responses(&analyzer, 400, 42.0);
    let deltas = analyzer.analyze(&timestamps);

    let stats = StatisticsSummary::compute(&deltas).unwrap();
    assert_relative_eq!(stats.mean, 42.0, epsilon = 1e-6);
    assert_relative_eq!(stats.mean_absolute_deviation, 0.0, epsilon = 1e-6);
    assert_eq!(LatencyBand::classify(stats.mean), LatencyBand::Fair);

    let histogram = Histogram::build(&deltas, 100).unwrap();
    assert_eq!(histogram.bin_width(), 1.0);
    assert_eq!(histogram.total_count(), 400);
    let peak = histogram
        .bins()
        .iter()
        .max_by_key(|b| b.total())
        .unwrap();
    assert_eq!(peak.index(), 42);
}

/// Repeated analysis of the same input is identical
#[test]
fn test_analysis_is_deterministic() {
    let analyzer = LatencyAnalyzer::new(4.0).unwrap();
    let timestamps: Vec<f64> = (0..1000).map(|i| (i as f64 * 7.31).sin() * 50.0 + i as f64).collect();

    let a = analyzer.analyze(&timestamps);
    let b = analyzer.analyze(&timestamps);
    assert_eq!(a, b);
    assert_eq!(
        Histogram::build(&a, 100).unwrap(),
        Histogram::build(&b, 100).unwrap()
    );
}

/// Statistics of a small known set
#[test]
fn test_statistics_known_set() {
    let stats = StatisticsSummary::compute(&[-2.0, 0.0, 2.0, 4.0]).unwrap();
    assert_eq!(stats.min, -2.0);
    assert_eq!(stats.max, 4.0);
    assert_eq!(stats.mean, 1.0);
    assert_eq!(stats.mean_absolute_deviation, 2.0);
}

/// All-zero deltas land in the center bin with the minimum width
#[test]
fn test_all_zero_deltas() {
    let histogram = Histogram::build(&vec![0.0; 400], 100).unwrap();
    assert_eq!(histogram.bin_width(), 1.0);
    assert_eq!(histogram.center().total(), 400);
    assert_eq!(histogram.max_count(), 400);
}

/// In-range values are all accounted for
#[test]
fn test_histogram_conservation() {
    let deltas: Vec<f64> = (0..2500).map(|i| ((i * 7919) % 1000) as f64 / 3.0).collect();
    let histogram = Histogram::build(&deltas, 100).unwrap();

    assert_eq!(histogram.dropped_count(), 0);
    let summed: usize = histogram.bins().iter().map(|b| b.total() as usize).sum();
    assert_eq!(summed, deltas.len());
}

/// Midpoints alternate: 0.5w up, 1.5w down, 2.5w up
#[test]
fn test_tie_alternation() {
    for width in [1.0, 3.0, 7.0] {
        // A far value pins the bin width without being a midpoint itself
        let anchor = 100.0 * width;
        let deltas = [anchor, 0.5 * width, 1.5 * width, 2.5 * width];
        let histogram = Histogram::build(&deltas, 100).unwrap();
        assert_eq!(histogram.bin_width(), width);

        assert_eq!(histogram.bin(0).unwrap().total(), 0);
        assert_eq!(histogram.bin(1).unwrap().total(), 2);
        assert_eq!(histogram.bin(2).unwrap().total(), 0);
        assert_eq!(histogram.bin(3).unwrap().total(), 1);
        assert_eq!(histogram.bin(100).unwrap().total(), 1);
    }

    let mut round_up = true;
    let indices: Vec<f64> = [0.5, 1.5, 2.5, 3.5]
        .iter()
        .map(|&raw| resolve_bin_offset(raw, &mut round_up))
        .collect();
    assert_eq!(indices, vec![1.0, 1.0, 3.0, 3.0]);
}

/// Early responses below the center bin are dropped, not mirrored
#[test]
fn test_negative_side_dropped() {
    let deltas = [-40.0, -12.0, -1.0, 0.0, 12.0];
    let histogram = Histogram::build(&deltas, 100).unwrap();

    assert_eq!(histogram.dropped_count(), 3);
    assert_eq!(histogram.total_count(), 2);
    assert_eq!(histogram.center().total(), 1);
    assert_eq!(histogram.bin(12).unwrap().total(), 1);
}

/// Offsets are stored and leave bin contents alone
#[test]
fn test_offset_recomputation() {
    let mut histogram = Histogram::build(&[3.0, 3.0, 9.0], 100).unwrap();
    let heights_before = bar_heights(&histogram);

    histogram.apply_offset(-15.0);
    assert_eq!(histogram.offset(), -15.0);
    assert_eq!(bar_heights(&histogram), heights_before);
    assert!(histogram.bins().iter().all(|b| !b.has_adjustment()));
}

/// Empty input is a contract violation
#[test]
fn test_empty_input_rejected() {
    assert_eq!(
        StatisticsSummary::compute(&[]),
        Err(AnalysisError::EmptyInput)
    );
    assert_eq!(Histogram::build(&[], 100), Err(AnalysisError::EmptyInput));
}
