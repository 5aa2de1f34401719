//! Aggregate statistics over latency deltas

use crate::analysis::AnalysisError;
use serde::{Deserialize, Serialize};

/// Summary of one latency delta sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    /// Smallest delta
    pub min: f64,
    /// Largest delta
    pub max: f64,
    /// Arithmetic mean of all deltas
    pub mean: f64,
    /// Mean of `|delta - mean|`
    pub mean_absolute_deviation: f64,
    /// Number of deltas summarized
    pub sample_count: usize,
}

/// Reduces latency deltas to a [`StatisticsResult`]
///
/// # Example
/// ```
/// use certifier_core::stats::summary::StatisticsSummary;
///
/// let result = StatisticsSummary::compute(&[-2.0, 0.0, 2.0, 4.0]).unwrap();
/// assert_eq!(result.mean, 1.0);
/// assert_eq!(result.mean_absolute_deviation, 2.0);
/// ```
pub struct StatisticsSummary;

impl StatisticsSummary {
    /// Compute min, max, mean and mean absolute deviation
    ///
    /// Fails with [`AnalysisError::EmptyInput`] on an empty sequence.
    pub fn compute(deltas: &[f64]) -> Result<StatisticsResult, AnalysisError> {
        if deltas.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let n = deltas.len() as f64;
        let min = deltas.iter().copied().fold(f64::INFINITY, f64::min);
        let max = deltas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = deltas.iter().sum::<f64>() / n;
        let mean_absolute_deviation = deltas.iter().map(|d| (d - mean).abs()).sum::<f64>() / n;

        Ok(StatisticsResult {
            min,
            max,
            mean,
            mean_absolute_deviation,
            sample_count: deltas.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_values() {
        let result = StatisticsSummary::compute(&[-2.0, 0.0, 2.0, 4.0]).unwrap();
        assert_eq!(result.min, -2.0);
        assert_eq!(result.max, 4.0);
        assert_eq!(result.mean, 1.0);
        assert_eq!(result.mean_absolute_deviation, 2.0);
        assert_eq!(result.sample_count, 4);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert_eq!(
            StatisticsSummary::compute(&[]),
            Err(AnalysisError::EmptyInput)
        );
    }

    #[test]
    fn test_single_value() {
        let result = StatisticsSummary::compute(&[12.5]).unwrap();
        assert_eq!(result.min, 12.5);
        assert_eq!(result.max, 12.5);
        assert_eq!(result.mean, 12.5);
        assert_eq!(result.mean_absolute_deviation, 0.0);
    }

    #[test]
    fn test_constant_latency_has_no_deviation() {
        let deltas = vec![23.0; 400];
        let result = StatisticsSummary::compute(&deltas).unwrap();
        assert_relative_eq!(result.mean, 23.0);
        assert_relative_eq!(result.mean_absolute_deviation, 0.0);
    }

    #[test]
    fn test_mean_absolute_deviation_asymmetric() {
        // mean = 3, deviations 2, 2, 2, 6 -> 12 / 4
        let result = StatisticsSummary::compute(&[1.0, 1.0, 1.0, 9.0]).unwrap();
        assert_relative_eq!(result.mean, 3.0);
        assert_relative_eq!(result.mean_absolute_deviation, 3.0);
    }
}
