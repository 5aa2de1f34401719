//! Renderer-neutral histogram presentation
//!
//! Pure functions mapping a [`Histogram`] to bar heights, axis ticks and
//! latency colour bands. Heights and positions are relative (0.0 to 1.0) so any
//! front end can scale them to its own drawing area.

use super::histogram::Histogram;
use serde::Serialize;

/// Height of an empty bar, so empty bins still show as a dot
pub const MIN_BAR_HEIGHT: f64 = 0.02;

/// Labelled axis points beside the zero label
pub const AXIS_POINTS: usize = 10;

/// Relative height for `value` against the tallest bar
fn height_for(value: f64, max_count: f64) -> f64 {
    if max_count <= 0.0 {
        return MIN_BAR_HEIGHT;
    }
    MIN_BAR_HEIGHT + (1.0 - MIN_BAR_HEIGHT) * value / max_count
}

/// Relative bar height of every bin
pub fn bar_heights(histogram: &Histogram) -> Vec<f64> {
    let max_count = histogram.max_count() as f64;
    histogram
        .bins()
        .iter()
        .map(|bin| height_for(bin.total() as f64, max_count))
        .collect()
}

/// Relative height of every bin's adjustment overlay
///
/// `None` for bins whose adjustment matches their build-time occupancy.
pub fn adjustment_heights(histogram: &Histogram) -> Vec<Option<f64>> {
    let max_count = histogram.max_count() as f64;
    histogram
        .bins()
        .iter()
        .map(|bin| {
            bin.has_adjustment()
                .then(|| height_for(bin.adjustment() as f64, max_count))
        })
        .collect()
}

/// One labelled point on the value axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisTick {
    /// Latency value at this point
    pub value: f64,
    /// Position relative to the axis length
    pub position: f64,
    /// Label opacity, fading towards the far end
    pub alpha: f64,
}

/// Axis labels: zero plus [`AXIS_POINTS`] evenly spaced values up to the last bin
pub fn axis_ticks(histogram: &Histogram) -> Vec<AxisTick> {
    let max_value = histogram.max_value();
    let step = max_value / AXIS_POINTS as f64;

    (0..=AXIS_POINTS)
        .map(|i| {
            let value = i as f64 * step;
            let position = value / max_value;
            AxisTick {
                value,
                position,
                alpha: 1.0 - position * 0.8,
            }
        })
        .collect()
}

/// Quality band of a latency value in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LatencyBand {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
}

impl LatencyBand {
    /// Band for a latency in milliseconds
    pub fn classify(ms: f64) -> Self {
        if ms < 10.0 {
            LatencyBand::Excellent
        } else if ms < 25.0 {
            LatencyBand::Good
        } else if ms < 50.0 {
            LatencyBand::Fair
        } else if ms < 80.0 {
            LatencyBand::Poor
        } else {
            LatencyBand::Bad
        }
    }

    /// Display colour as RGB hex
    pub fn color_hex(self) -> &'static str {
        match self {
            LatencyBand::Excellent => "66ccff",
            LatencyBand::Good => "b3d944",
            LatencyBand::Fair => "88b300",
            LatencyBand::Poor => "ffcc22",
            LatencyBand::Bad => "ed1121",
        }
    }
}
