//! Latency statistics
//!
//! Reduces a latency delta sequence to min/max/mean and mean absolute deviation.

pub mod summary;
