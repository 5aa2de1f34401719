//! Latency Certifier - audio/visual cue to input latency certification
//!
//! This library re-exports the measurement session, latency analysis and
//! histogram binning from `certifier-core`, plus the terminal report helpers
//! used by the `latency-certifier` binary.

pub mod report;

pub use certifier_core::analysis;
pub use certifier_core::config;
pub use certifier_core::session;
pub use certifier_core::stats;
pub use certifier_core::timing;

pub use certifier_core::{
    Certification, Clock, ErrorCause, Histogram, LatencyAnalyzer, ManualClock,
    MeasurementSession, SessionConfig, SessionOutcome, SessionState, StatisticsResult,
    StatisticsSummary, SystemClock,
};
pub use certifier_core::{BUILD_DATE, VERSION};
