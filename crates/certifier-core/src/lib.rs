//! Certifier Core - Measurement sessions, latency analysis, and histogram binning
//!
//! This library certifies the round-trip latency between a periodic cue stream
//! and a user's input. A [`MeasurementSession`] captures the clock time of every
//! input event while a fixed-length clock runs, then converts the timestamps
//! into latency deltas, summarizes them and bins them into a zero-centered
//! histogram.

pub mod analysis;
pub mod config;
pub mod session;
pub mod stats;
pub mod timing;

pub use analysis::histogram::Histogram;
pub use analysis::latency::LatencyAnalyzer;
pub use config::SessionConfig;
pub use session::{Certification, ErrorCause, MeasurementSession, SessionOutcome, SessionState};
pub use stats::summary::{StatisticsResult, StatisticsSummary};
pub use timing::clock::{Clock, ManualClock, SystemClock};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date stamped by build.rs
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Assumed cue frequency of the pulse train (4 cues per second)
pub const DEFAULT_PULSE_FREQUENCY_HZ: f64 = 4.0;

/// Minimum number of captured inputs for a run to be evaluated
pub const DEFAULT_MINIMUM_SAMPLES: usize = 400;

/// Measurement clock length in milliseconds
pub const DEFAULT_SESSION_LENGTH_MS: f64 = 10_000.0;

/// Number of histogram bins on the positive side of the center bin
pub const DEFAULT_SIDE_BINS: usize = 100;
