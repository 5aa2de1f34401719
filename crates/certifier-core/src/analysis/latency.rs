//! Timestamp to latency conversion
//!
//! Each captured input is compared against the cue it is assumed to answer.
//! The expected cue time is accumulated with an index-weighted period:
//!
//! ```text
//! period     = 1 / pulse_frequency_hz
//! expected_0 = 0
//! expected_i = expected_(i-1) + i * period
//! delta_i    = timestamp_i - expected_i
//! ```
//!
//! The expected time therefore grows quadratically with the input index. No
//! smoothing or outlier rejection is applied.

use super::AnalysisError;

/// Converts captured timestamps into signed latency deltas
///
/// # Example
/// ```
/// use certifier_core::analysis::latency::LatencyAnalyzer;
///
/// let analyzer = LatencyAnalyzer::new(4.0).unwrap();
/// let deltas = analyzer.analyze(&[0.0, 10.0, 20.0]);
/// assert_eq!(deltas, vec![0.0, 9.75, 19.25]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyAnalyzer {
    /// Assumed cue frequency in Hz
    pulse_frequency_hz: f64,
}

impl LatencyAnalyzer {
    /// Create an analyzer for a cue train of the given frequency
    pub fn new(pulse_frequency_hz: f64) -> Result<Self, AnalysisError> {
        if !(pulse_frequency_hz.is_finite() && pulse_frequency_hz > 0.0) {
            return Err(AnalysisError::InvalidFrequency(pulse_frequency_hz));
        }
        Ok(Self { pulse_frequency_hz })
    }

    /// Assumed cue frequency in Hz
    pub fn pulse_frequency_hz(&self) -> f64 {
        self.pulse_frequency_hz
    }

    /// Cue period, `1 / pulse_frequency_hz`
    pub fn period(&self) -> f64 {
        1.0 / self.pulse_frequency_hz
    }

    /// Expected cue times for the first `count` inputs
    pub fn expected_times(&self, count: usize) -> Vec<f64> {
        let period = self.period();
        let mut expected = 0.0;
        (0..count)
            .map(|i| {
                expected += i as f64 * period;
                expected
            })
            .collect()
    }

    /// Latency delta for every timestamp, same length and order as the input
    pub fn analyze(&self, timestamps: &[f64]) -> Vec<f64> {
        let deltas: Vec<f64> = timestamps
            .iter()
            .zip(self.expected_times(timestamps.len()))
            .map(|(timestamp, expected)| timestamp - expected)
            .collect();

        tracing::debug!(
            samples = deltas.len(),
            frequency_hz = self.pulse_frequency_hz,
            "latency_deltas_computed"
        );
        deltas
    }
}
