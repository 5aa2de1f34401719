//! Latency Certifier - terminal measurement runner
//!
//! Press Enter to start a run, then press Enter on every cue. When the run is
//! certified the latency statistics and histogram are printed.

use anyhow::Result;
use latency_certifier::report::{format_statistics, render_histogram, Report};
use latency_certifier::{
    MeasurementSession, SessionConfig, SessionOutcome, SessionState, SystemClock,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Poll interval of the session checks
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum time between progress line updates
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Rows of the printed histogram
const HISTOGRAM_ROWS: usize = 12;

#[derive(Error, Debug)]
enum CliError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    export: Option<PathBuf>,
    write_config: Option<PathBuf>,
}

enum Command {
    Run(Options),
    Help,
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("latency_certifier=info".parse()?)
                .add_directive("certifier_core=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Command::Version) => {
            println!(
                "latency-certifier {} (built {})",
                latency_certifier::VERSION,
                latency_certifier::BUILD_DATE
            );
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            return Ok(());
        }
    };

    let config = options
        .config
        .as_deref()
        .map(SessionConfig::load)
        .unwrap_or_default();

    if let Some(path) = &options.write_config {
        config.save(path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    println!("╔════════════════════════════════════════════════════════════╗");
    println!(
        "║        Latency Certifier v{} - Cue Response Timing       ║",
        latency_certifier::VERSION
    );
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    run(config, options.export).await
}

fn parse_args(args: &[String]) -> Result<Command, CliError> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-v" => return Ok(Command::Version),
            "--config" | "-c" => {
                let value = iter.next().ok_or(CliError::MissingValue("--config"))?;
                options.config = Some(PathBuf::from(value));
            }
            "--export" | "-e" => {
                let value = iter.next().ok_or(CliError::MissingValue("--export"))?;
                options.export = Some(PathBuf::from(value));
            }
            "--write-config" => {
                let value = iter
                    .next()
                    .ok_or(CliError::MissingValue("--write-config"))?;
                options.write_config = Some(PathBuf::from(value));
            }
            other => return Err(CliError::UnknownArgument(other.to_string())),
        }
    }

    Ok(Command::Run(options))
}

fn print_help() {
    println!("Usage: latency-certifier [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config PATH       Load session config from a JSON file");
    println!("  -e, --export PATH       Write a JSON report after a certified run");
    println!("      --write-config PATH Write the effective config to PATH and exit");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Press Enter to start a run, then press Enter on every cue.");
}

/// Forward every line read from stdin as one input event
fn spawn_input_reader() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run(config: SessionConfig, export: Option<PathBuf>) -> Result<()> {
    let clock = SystemClock::new(config.length_ms);
    let mut session = MeasurementSession::new(config, clock)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let origin = Instant::now();
    let now = move || origin.elapsed().as_secs_f64() * 1000.0;

    let mut inputs = spawn_input_reader();
    let mut input_open = true;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut last_state = session.state();
    let mut last_progress = Instant::now();

    println!("Press Enter to start measuring.");

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            input = inputs.recv(), if input_open => match input {
                Some(()) => match session.state() {
                    SessionState::Measuring => {
                        session.record_input();
                    }
                    SessionState::Evaluating => {}
                    _ => {
                        let run = session.start(now())?;
                        info!(run = %run, "Run started from terminal");
                        println!("Measuring: press Enter on every cue.");
                    }
                },
                None => {
                    info!("Input closed");
                    input_open = false;
                }
            },
            _ = ticker.tick() => {
                let state = session.poll(now());
                if state != last_state {
                    on_transition(&session, state, export.as_deref());
                    last_state = state;
                }
                if state == SessionState::Measuring && last_progress.elapsed() >= PROGRESS_INTERVAL {
                    print!("\rProgress: {:.1}%", session.progress_percent());
                    io::stdout().flush()?;
                    last_progress = Instant::now();
                }
                if !input_open && !state.is_active() {
                    break;
                }
            }
        }
    }

    info!("Shutting down");
    Ok(())
}

fn on_transition(
    session: &MeasurementSession<SystemClock>,
    state: SessionState,
    export: Option<&std::path::Path>,
) {
    match state {
        SessionState::Error(cause) => {
            println!("\r{}", cause);
        }
        SessionState::Idle => {
            println!("Press Enter to start measuring.");
        }
        SessionState::Success => {
            let Some(SessionOutcome::Success(certification)) = session.outcome() else {
                return;
            };
            println!("\rMeasurement complete.");
            println!();
            println!("{}", format_statistics(&certification.statistics));
            println!();
            println!(
                "{}",
                render_histogram(&certification.histogram, HISTOGRAM_ROWS)
            );
            println!(
                "Bin width: {} ms, {} values outside the chart",
                certification.histogram.bin_width(),
                certification.histogram.dropped_count()
            );

            if let Some(path) = export {
                if let Err(e) = Report::new(session.config(), certification).save(path) {
                    warn!(path = %path.display(), error = %e, "Failed to export report");
                }
            }
            println!();
            println!("Press Enter to measure again.");
        }
        SessionState::Measuring | SessionState::Evaluating => {}
    }
}
