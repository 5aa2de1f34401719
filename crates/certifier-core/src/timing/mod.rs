//! Timing primitives
//!
//! This module contains the time sources a session depends on:
//! - The measurement clock contract and its implementations ([`clock`])
//! - Run-tagged deferred actions ([`scheduler`])

pub mod clock;
pub mod scheduler;
