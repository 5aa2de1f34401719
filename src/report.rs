//! Terminal output and JSON export of certification results

use certifier_core::analysis::histogram::Histogram;
use certifier_core::analysis::render::{axis_ticks, bar_heights, LatencyBand};
use certifier_core::{Certification, SessionConfig, StatisticsResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Exported certification report
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    /// When the report was written
    pub generated_at: DateTime<Utc>,
    /// Tool version
    pub version: &'static str,
    /// Configuration of the certified session
    pub config: &'a SessionConfig,
    /// Results of the run
    pub certification: &'a Certification,
    /// Quality band of the mean latency
    pub band: LatencyBand,
}

impl<'a> Report<'a> {
    /// Build a report stamped with the current time
    pub fn new(config: &'a SessionConfig, certification: &'a Certification) -> Self {
        Self {
            generated_at: Utc::now(),
            version: crate::VERSION,
            config,
            certification,
            band: LatencyBand::classify(certification.statistics.mean),
        }
    }

    /// Write the report as pretty JSON, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Report exported");
        Ok(())
    }
}

/// One-block summary of the latency statistics
pub fn format_statistics(stats: &StatisticsResult) -> String {
    let band = LatencyBand::classify(stats.mean);
    format!(
        "Samples:  {}\n\
         Min:      {:.2} ms\n\
         Max:      {:.2} ms\n\
         Mean:     {:.2} ms ({:?})\n\
         Mean dev: {:.2} ms",
        stats.sample_count, stats.min, stats.max, stats.mean, band, stats.mean_absolute_deviation
    )
}

/// Draw the histogram as `rows` lines of text, one column per bin
///
/// The center bin is drawn with `|`, other bins with `#`. Empty bins show a
/// single `.` on the base line. A value axis follows the bars.
pub fn render_histogram(histogram: &Histogram, rows: usize) -> String {
    let rows = rows.max(1);
    let heights = bar_heights(histogram);
    let filled: Vec<usize> = histogram
        .bins()
        .iter()
        .zip(&heights)
        .map(|(bin, h)| {
            if bin.total() == 0 {
                0
            } else {
                ((h * rows as f64).round() as usize).clamp(1, rows)
            }
        })
        .collect();

    let mut out = String::new();
    for row in (1..=rows).rev() {
        for (bin, &height) in histogram.bins().iter().zip(&filled) {
            let c = if height >= row {
                if bin.is_center() {
                    '|'
                } else {
                    '#'
                }
            } else if row == 1 {
                '.'
            } else {
                ' '
            };
            out.push(c);
        }
        out.push('\n');
    }

    let width = histogram.bins().len();
    let mut axis = vec![' '; width + 8];
    for tick in axis_ticks(histogram) {
        let label = format!("{:.0}", tick.value);
        let start = ((tick.position * (width - 1) as f64).round() as usize).min(width - 1);
        for (i, c) in label.chars().enumerate() {
            if let Some(slot) = axis.get_mut(start + i) {
                *slot = c;
            }
        }
    }
    out.push_str(axis.iter().collect::<String>().trim_end());
    out
}
