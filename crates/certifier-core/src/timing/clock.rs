//! Measurement clock
//!
//! The clock is the time reference for captured inputs. It behaves like a
//! fixed-length playback track: it starts from zero, advances while running and
//! stops once it reaches its length. All times are in milliseconds.

use std::time::Instant;

/// Monotonic, fixed-length measurement clock
pub trait Clock {
    /// Start (or resume) advancing
    fn start(&mut self);

    /// Stop and rewind to zero
    fn reset(&mut self);

    /// Whether the clock is currently advancing
    fn is_running(&self) -> bool;

    /// Current position in milliseconds
    fn current_time(&self) -> f64;

    /// Total length in milliseconds
    fn length(&self) -> f64;
}

/// Percentage of the clock length already elapsed (0.0 to 100.0)
pub fn progress_percent(clock: &dyn Clock) -> f64 {
    let length = clock.length();
    if length <= 0.0 {
        return 0.0;
    }
    (clock.current_time() / length * 100.0).clamp(0.0, 100.0)
}

/// Wall-clock backed measurement clock
///
/// # Example
/// ```
/// use certifier_core::timing::clock::{Clock, SystemClock};
///
/// let mut clock = SystemClock::new(10_000.0);
/// assert_eq!(clock.current_time(), 0.0);
/// clock.start();
/// assert!(clock.is_running());
/// ```
#[derive(Debug, Clone)]
pub struct SystemClock {
    /// Length in milliseconds
    length: f64,
    /// Position accumulated before the current start
    elapsed_before: f64,
    /// Instant of the current start, `None` while stopped
    started: Option<Instant>,
}

impl SystemClock {
    /// Create a stopped clock of the given length in milliseconds
    pub fn new(length: f64) -> Self {
        Self {
            length,
            elapsed_before: 0.0,
            started: None,
        }
    }

    fn raw_elapsed(&self) -> f64 {
        let running = self
            .started
            .map(|s| s.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.elapsed_before + running
    }
}

impl Clock for SystemClock {
    fn start(&mut self) {
        if self.started.is_none() && self.elapsed_before < self.length {
            self.started = Some(Instant::now());
        }
    }

    fn reset(&mut self) {
        self.started = None;
        self.elapsed_before = 0.0;
    }

    fn is_running(&self) -> bool {
        self.started.is_some() && self.raw_elapsed() < self.length
    }

    fn current_time(&self) -> f64 {
        self.raw_elapsed().min(self.length)
    }

    fn length(&self) -> f64 {
        self.length
    }
}

/// Clock advanced explicitly by the caller
///
/// Used for simulations and tests where inputs must land at exact times.
///
/// # Example
/// ```
/// use certifier_core::timing::clock::{Clock, ManualClock};
///
/// let mut clock = ManualClock::new(1000.0);
/// clock.start();
/// clock.advance(250.0);
/// assert_eq!(clock.current_time(), 250.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    length: f64,
    time: f64,
    running: bool,
    start_count: u32,
    reset_count: u32,
}

impl ManualClock {
    /// Create a stopped clock of the given length in milliseconds
    pub fn new(length: f64) -> Self {
        Self {
            length,
            ..Default::default()
        }
    }

    /// Advance by `ms` if running; stops at the end of the clock
    pub fn advance(&mut self, ms: f64) {
        if self.running {
            self.set_time(self.time + ms);
        }
    }

    /// Jump to an absolute position regardless of the running state
    pub fn set_time(&mut self, ms: f64) {
        self.time = ms.clamp(0.0, self.length);
        if self.time >= self.length {
            self.running = false;
        }
    }

    /// Number of `start` calls so far
    pub fn start_count(&self) -> u32 {
        self.start_count
    }

    /// Number of `reset` calls so far
    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }
}

impl Clock for ManualClock {
    fn start(&mut self) {
        self.start_count += 1;
        self.running = self.time < self.length;
    }

    fn reset(&mut self) {
        self.reset_count += 1;
        self.running = false;
        self.time = 0.0;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn length(&self) -> f64 {
        self.length
    }
}
