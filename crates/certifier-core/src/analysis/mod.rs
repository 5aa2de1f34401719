//! Latency analysis
//!
//! This module turns captured timestamps into something a user can inspect:
//! - Timestamp to latency conversion against the cue train ([`latency`])
//! - Zero-centered latency histogram with tie alternation ([`histogram`])
//! - Renderer-neutral bar, axis and colour helpers ([`render`])

pub mod histogram;
pub mod latency;
pub mod render;

use thiserror::Error;

/// Errors raised when analysis is invoked outside its contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No latency values to analyze")]
    EmptyInput,

    #[error("Pulse frequency must be positive and finite, got {0}")]
    InvalidFrequency(f64),
}
