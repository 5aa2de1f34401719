//! Measurement session state machine
//!
//! One run goes `Idle -> Measuring -> (Evaluating -> Success | Error)`:
//!
//! - `start` rewinds and starts the clock and schedules two checks: an early
//!   check at `early_check_delay_ms` and a final check at the clock length
//!   plus `grace_period_ms`.
//! - Every input while measuring records the clock's current time.
//! - The early check fails the run with [`ErrorCause::NoInput`] when nothing
//!   was captured yet.
//! - The final check evaluates the run when at least `minimum_samples`
//!   inputs were captured, otherwise fails it with
//!   [`ErrorCause::InsufficientSamples`].
//! - A failed run returns to `Idle` after `cooldown_ms`. A successful run stays
//!   in `Success` until the next `start`.
//!
//! Scheduled checks are tagged with the [`RunId`] of the run that scheduled
//! them. A check only applies to its own run and only while that run is still
//! measuring, so the two checks can never both fail the same run and a restart
//! never sees checks from an earlier run.
//!
//! The session is driven by a caller-supplied monotonic time in milliseconds
//! (`now`), independent of the measurement clock, which is rewound on every
//! terminal transition.

use crate::analysis::histogram::Histogram;
use crate::analysis::latency::LatencyAnalyzer;
use crate::analysis::AnalysisError;
use crate::config::{ConfigError, SessionConfig};
use crate::stats::summary::{StatisticsResult, StatisticsSummary};
use crate::timing::clock::{self, Clock};
use crate::timing::scheduler::{RunId, TimerQueue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCause {
    /// Nothing captured by the early check
    NoInput,
    /// Fewer than `minimum_samples` captured by the final check
    InsufficientSamples,
}

impl ErrorCause {
    /// Numeric code shown to the user
    pub fn code(self) -> u8 {
        match self {
            ErrorCause::NoInput => 0,
            ErrorCause::InsufficientSamples => 1,
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}", self.code())
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for a start command
    Idle,
    /// Clock running, inputs are captured
    Measuring,
    /// Enough inputs captured, analysis in progress
    Evaluating,
    /// Run evaluated, results available
    Success,
    /// Run failed, returns to idle after the cooldown
    Error(ErrorCause),
}

impl SessionState {
    /// Whether a run is in progress and a new start must be refused
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Measuring | SessionState::Evaluating)
    }
}

/// Results of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    /// Run that produced these results
    pub run: RunId,
    /// Wall-clock time of the run start
    pub started_at: DateTime<Utc>,
    /// Number of captured inputs
    pub sample_count: usize,
    /// Binned latency distribution
    pub histogram: Histogram,
    /// Latency statistics
    pub statistics: StatisticsResult,
}

/// Terminal payload of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Success(Box<Certification>),
    Error(ErrorCause),
}

/// Errors returned by session commands
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Invalid session config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("A measurement run is already in progress ({0:?})")]
    AlreadyRunning(SessionState),
}

/// Deferred actions of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredCheck {
    Early,
    Final,
    ReturnToIdle,
}

/// Orchestrates latency measurement runs
///
/// # Example
/// ```
/// use certifier_core::{ManualClock, MeasurementSession, SessionConfig, SessionState};
///
/// let config = SessionConfig {
///     minimum_samples: 2,
///     length_ms: 1000.0,
///     ..Default::default()
/// };
/// let mut session = MeasurementSession::new(config, ManualClock::new(1000.0)).unwrap();
///
/// session.start(0.0).unwrap();
/// session.clock_mut().advance(120.0);
/// session.record_input();
/// session.clock_mut().advance(250.0);
/// session.record_input();
///
/// assert_eq!(session.poll(2000.0), SessionState::Success);
/// ```
#[derive(Debug)]
pub struct MeasurementSession<C: Clock> {
    config: SessionConfig,
    clock: C,
    analyzer: LatencyAnalyzer,
    state: SessionState,
    run: RunId,
    started_at: Option<DateTime<Utc>>,
    captured: Vec<f64>,
    timers: TimerQueue<DeferredCheck>,
    outcome: Option<SessionOutcome>,
}

impl<C: Clock> MeasurementSession<C> {
    /// Create an idle session
    pub fn new(config: SessionConfig, clock: C) -> Result<Self, SessionError> {
        config.validate()?;
        let analyzer = LatencyAnalyzer::new(config.pulse_frequency_hz)
            .map_err(|_| ConfigError::InvalidFrequency(config.pulse_frequency_hz))?;

        if clock.length() != config.length_ms {
            tracing::warn!(
                clock_length_ms = clock.length(),
                config_length_ms = config.length_ms,
                "Clock length differs from configured length, final check follows the clock"
            );
        }

        Ok(Self {
            captured: Vec::with_capacity(config.minimum_samples),
            config,
            clock,
            analyzer,
            state: SessionState::Idle,
            run: RunId::default(),
            started_at: None,
            timers: TimerQueue::new(),
            outcome: None,
        })
    }

    /// Begin a new run at scheduler time `now`
    ///
    /// Allowed from `Idle`, `Success` and `Error`. Discards the previous run's
    /// timestamps, outcome and pending checks.
    pub fn start(&mut self, now: f64) -> Result<RunId, SessionError> {
        if self.state.is_active() {
            return Err(SessionError::AlreadyRunning(self.state));
        }

        let previous = self.run;
        self.run = self.run.next();
        let stale = self.timers.retain_run(self.run);
        if stale > 0 {
            tracing::debug!(run = %previous, stale, "Discarded pending checks of previous run");
        }

        self.captured.clear();
        self.outcome = None;
        self.started_at = Some(Utc::now());

        self.clock.reset();
        self.clock.start();
        self.state = SessionState::Measuring;

        let early_at = now + self.config.early_check_delay_ms;
        let final_at = now + self.clock.length() + self.config.grace_period_ms;
        self.timers.schedule(self.run, early_at, DeferredCheck::Early);
        self.timers.schedule(self.run, final_at, DeferredCheck::Final);

        tracing::info!(run = %self.run, early_at, final_at, "Measurement started");
        Ok(self.run)
    }

    /// Capture an input event at the clock's current time
    ///
    /// Returns `false` (and records nothing) unless the session is measuring.
    pub fn record_input(&mut self) -> bool {
        if self.state != SessionState::Measuring {
            tracing::trace!(state = ?self.state, "Input ignored");
            return false;
        }

        let time = self.clock.current_time();
        self.captured.push(time);
        tracing::trace!(run = %self.run, time, count = self.captured.len(), "input_captured");
        true
    }

    /// Fire every check due at or before `now` and return the resulting state
    pub fn poll(&mut self, now: f64) -> SessionState {
        loop {
            let due = self.timers.pop_due(now);
            if due.is_empty() {
                break;
            }

            for entry in due {
                if entry.run != self.run {
                    tracing::debug!(run = %entry.run, current = %self.run, action = ?entry.action, "Stale check skipped");
                    continue;
                }
                match entry.action {
                    DeferredCheck::Early => self.early_check(entry.due_at),
                    DeferredCheck::Final => self.final_check(entry.due_at),
                    DeferredCheck::ReturnToIdle => self.return_to_idle(),
                }
            }
        }

        self.state
    }

    fn early_check(&mut self, now: f64) {
        if self.state != SessionState::Measuring {
            return;
        }
        if self.captured.is_empty() {
            self.fail(ErrorCause::NoInput, now);
        } else {
            tracing::debug!(run = %self.run, count = self.captured.len(), "Early check passed");
        }
    }

    fn final_check(&mut self, now: f64) {
        if self.state != SessionState::Measuring {
            return;
        }

        let count = self.captured.len();
        if count < self.config.minimum_samples {
            tracing::info!(
                run = %self.run,
                count,
                required = self.config.minimum_samples,
                "Not enough inputs captured"
            );
            self.fail(ErrorCause::InsufficientSamples, now);
            return;
        }
        debug_assert!(
            !self.captured.is_empty(),
            "final check passed the sample gate with no inputs"
        );

        self.state = SessionState::Evaluating;
        self.clock.reset();

        match self.certify() {
            Ok(certification) => {
                tracing::info!(
                    run = %self.run,
                    samples = certification.sample_count,
                    mean = %format!("{:.3}", certification.statistics.mean),
                    mean_deviation = %format!("{:.3}", certification.statistics.mean_absolute_deviation),
                    "Measurement certified"
                );
                self.outcome = Some(SessionOutcome::Success(Box::new(certification)));
                self.state = SessionState::Success;
            }
            Err(e) => {
                // Unreachable while minimum_samples >= 1
                tracing::error!(run = %self.run, error = %e, "Analysis rejected captured inputs");
                self.fail(ErrorCause::InsufficientSamples, now);
            }
        }
    }

    fn certify(&self) -> Result<Certification, AnalysisError> {
        let deltas = self.analyzer.analyze(&self.captured);
        let histogram = Histogram::build(&deltas, self.config.side_bins)?;
        let statistics = StatisticsSummary::compute(&deltas)?;

        Ok(Certification {
            run: self.run,
            started_at: self.started_at.unwrap_or_else(Utc::now),
            sample_count: self.captured.len(),
            histogram,
            statistics,
        })
    }

    fn fail(&mut self, cause: ErrorCause, now: f64) {
        self.state = SessionState::Error(cause);
        self.clock.reset();
        self.outcome = Some(SessionOutcome::Error(cause));

        let idle_at = now + self.config.cooldown_ms;
        self.timers
            .schedule(self.run, idle_at, DeferredCheck::ReturnToIdle);

        tracing::warn!(
            run = %self.run,
            cause = ?cause,
            count = self.captured.len(),
            idle_at,
            "Measurement failed"
        );
    }

    fn return_to_idle(&mut self) {
        if let SessionState::Error(_) = self.state {
            self.state = SessionState::Idle;
            tracing::info!(run = %self.run, "Session idle");
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Identifier of the current (or last) run
    pub fn run_id(&self) -> RunId {
        self.run
    }

    /// Timestamps captured by the current (or last) run, in arrival order
    pub fn captured_timestamps(&self) -> &[f64] {
        &self.captured
    }

    /// Terminal payload of the last run, kept until the next start
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Certification of the last run, if it succeeded
    pub fn certification(&self) -> Option<&Certification> {
        match &self.outcome {
            Some(SessionOutcome::Success(c)) => Some(c.as_ref()),
            _ => None,
        }
    }

    /// Mutable access to the histogram of a successful run, for offsets
    pub fn histogram_mut(&mut self) -> Option<&mut Histogram> {
        match &mut self.outcome {
            Some(SessionOutcome::Success(c)) => Some(&mut c.histogram),
            _ => None,
        }
    }

    /// Wall-clock time of the current (or last) run start
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Clock progress while measuring, 0 otherwise
    pub fn progress_percent(&self) -> f64 {
        if self.state == SessionState::Measuring {
            clock::progress_percent(&self.clock)
        } else {
            0.0
        }
    }

    /// Number of checks still pending
    pub fn pending_checks(&self) -> usize {
        self.timers.len()
    }

    /// Scheduler time of the next pending check
    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Measurement clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable measurement clock, for drivers that advance it
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
