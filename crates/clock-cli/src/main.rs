//! clockctl entry point.
//!
//! Runs a single clock bridge operation and reports what the system call
//! returned, for scripting and for checking platform behavior by hand.

mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clock_bridge::signals::{InterruptHandler, InterruptSignal};
use clock_bridge::ClockBridge;
use clock_common::config::BridgeConfig;
use clock_common::time::TimeValue;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::report::{Outcome, Report};

/// clockctl command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "clockctl",
    about = "Invoke alarm, sleep, usleep and nanosleep through the clock bridge",
    version,
    long_about = None
)]
struct Args {
    /// Path to a bridge configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file.
    #[arg(long, short = 'l', global = true)]
    log_level: Option<String>,

    /// Print the outcome as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Arm the process alarm and print the remainder of the one it replaced.
    Alarm {
        /// Seconds until SIGALRM (0 cancels).
        #[arg(allow_negative_numbers = true)]
        seconds: i32,

        /// Install a counting SIGALRM handler first.
        #[arg(long)]
        handle: bool,

        /// Block until the alarm is delivered (implies --handle).
        #[arg(long)]
        wait: bool,
    },

    /// Sleep for whole seconds.
    Sleep {
        /// Seconds to sleep.
        #[arg(allow_negative_numbers = true)]
        seconds: i32,
    },

    /// Sleep for microseconds.
    Usleep {
        /// Microseconds to sleep.
        #[arg(allow_negative_numbers = true)]
        microseconds: i32,
    },

    /// Sleep with nanosecond resolution.
    Nanosleep {
        /// Duration such as `1.5s` or `250ms`; defaults to the configured value.
        #[arg(conflicts_with_all = ["sec", "nsec"])]
        duration: Option<String>,

        /// Raw tv_sec field.
        #[arg(long, allow_negative_numbers = true)]
        sec: Option<i64>,

        /// Raw tv_nsec field.
        #[arg(long, allow_negative_numbers = true)]
        nsec: Option<i64>,

        /// Ask for the unslept remainder if interrupted.
        #[arg(long)]
        report_remaining: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Start at the command-line level (or the default) so config loading is logged
    let default_level = BridgeConfig::default().log_level;
    let filter_handle = init_logging(args.log_level.as_deref().unwrap_or(&default_level));
    info!(version = env!("CARGO_PKG_VERSION"), "Starting clockctl");

    let mut config = load_config(&args)?;
    match &args.log_level {
        Some(level) => config.log_level.clone_from(level),
        None if config.log_level != default_level => {
            if let Err(e) = filter_handle.reload(env_filter(&config.log_level)) {
                warn!(error = %e, "Failed to apply configured log level");
            }
        }
        None => {}
    }

    if let Command::Alarm { handle, wait, .. } = &args.command {
        config.handle_sigalrm |= *handle || *wait;
    }
    debug!(?config, "Configuration loaded");

    let bridge = ClockBridge::new(config).context("Failed to initialize clock bridge")?;
    let report = run(&bridge, &args.command)?;

    if args.json {
        println!("{}", report.to_json().context("Failed to serialize report")?);
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Per-crate filter for `level`, unless `RUST_LOG` overrides it.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "clockctl={level},clock_bridge={level},clock_common={level}"
        ))
    })
}

/// Initialize logging; the returned handle swaps the filter once the
/// configuration file has been read.
fn init_logging(level: &str) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(env_filter(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
    handle
}

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    /// `--config FILE`.
    Argument(PathBuf),
    /// `CLOCKCTL_CONFIG` pointing at an existing file.
    Environment(PathBuf),
    /// A well-known location that exists.
    Standard(PathBuf),
    /// Nothing found.
    BuiltIn,
}

/// Standard locations, checked in order.
const STANDARD_PATHS: [&str; 2] = ["/etc/clockctl/config.toml", "config/default.toml"];

/// Pick the configuration source.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `CLOCKCTL_CONFIG` environment variable
/// 3. `/etc/clockctl/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn resolve_config_source(argument: Option<&Path>, env_path: Option<&str>) -> ConfigSource {
    if let Some(path) = argument {
        return ConfigSource::Argument(path.to_path_buf());
    }

    if let Some(env_path) = env_path {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return ConfigSource::Environment(path);
        }
        warn!(
            path = %env_path,
            "CLOCKCTL_CONFIG set but file does not exist, checking other locations"
        );
    }

    STANDARD_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .map_or(ConfigSource::BuiltIn, ConfigSource::Standard)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<BridgeConfig> {
    let env_path = std::env::var("CLOCKCTL_CONFIG").ok();
    let path = match resolve_config_source(args.config.as_deref(), env_path.as_deref()) {
        ConfigSource::Argument(path)
        | ConfigSource::Environment(path)
        | ConfigSource::Standard(path) => path,
        ConfigSource::BuiltIn => {
            info!("No config file found, using built-in defaults");
            return Ok(BridgeConfig::default());
        }
    };

    info!(path = %path.display(), "Loading config");
    BridgeConfig::from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Run one operation and time it.
fn run(bridge: &ClockBridge, command: &Command) -> Result<Report> {
    let start = Instant::now();

    let outcome = match command {
        Command::Alarm { seconds, wait, .. } => run_alarm(bridge, *seconds, *wait)?,
        Command::Sleep { seconds } => Outcome::Sleep {
            unslept: bridge.sleep(*seconds),
        },
        Command::Usleep { microseconds } => {
            bridge
                .usleep(*microseconds)
                .with_context(|| format!("usleep({microseconds}) failed"))?;
            Outcome::Usleep {
                microseconds: *microseconds,
            }
        }
        Command::Nanosleep {
            duration,
            sec,
            nsec,
            report_remaining,
        } => {
            let requested = resolve_duration(
                duration.as_deref(),
                *sec,
                *nsec,
                bridge.config().default_nanosleep,
            )?;
            run_nanosleep(bridge, requested, *report_remaining)?
        }
    };

    Ok(Report::new(outcome, start.elapsed()))
}

fn run_alarm(bridge: &ClockBridge, seconds: i32, wait: bool) -> Result<Outcome> {
    let handler = if wait {
        let handler = InterruptHandler::install(InterruptSignal::Alarm)
            .context("Failed to install SIGALRM handler")?;
        Some(handler)
    } else {
        None
    };
    let before = handler.map_or(0, |h| h.deliveries());

    let previous = bridge.alarm(seconds);

    let Some(handler) = handler else {
        return Ok(Outcome::Alarm {
            previous,
            delivered: None,
        });
    };

    if seconds <= 0 {
        warn!(seconds, "Nothing to wait for");
        return Ok(Outcome::Alarm {
            previous,
            delivered: Some(false),
        });
    }

    // sleep may complete just before delivery, so allow one extra second
    let deadline = Instant::now() + Duration::from_secs(u64::from(seconds.unsigned_abs()) + 1);
    while handler.deliveries() == before && Instant::now() < deadline {
        let unslept = bridge.sleep(1);
        debug!(unslept, "Waiting for SIGALRM");
    }

    Ok(Outcome::Alarm {
        previous,
        delivered: Some(handler.deliveries() > before),
    })
}

fn run_nanosleep(
    bridge: &ClockBridge,
    requested: TimeValue,
    report_remaining: bool,
) -> Result<Outcome> {
    if report_remaining {
        bridge.nanosleep_for(requested).map_err(|(err, left)| {
            anyhow::Error::new(err)
                .context(format!("nanosleep({requested}) stopped with {left} remaining"))
        })?;
    } else {
        bridge
            .nanosleep(&requested, None)
            .with_context(|| format!("nanosleep({requested}) failed"))?;
    }
    Ok(Outcome::Nanosleep { requested })
}

/// Pick the requested duration from raw fields, a humantime string, or the default.
fn resolve_duration(
    duration: Option<&str>,
    sec: Option<i64>,
    nsec: Option<i64>,
    default: Duration,
) -> Result<TimeValue> {
    if sec.is_some() || nsec.is_some() {
        return Ok(TimeValue::new(sec.unwrap_or(0), nsec.unwrap_or(0)));
    }
    match duration {
        Some(text) => {
            let parsed = humantime::parse_duration(text)
                .with_context(|| format!("Invalid duration: {text}"))?;
            Ok(TimeValue::from(parsed))
        }
        None => Ok(TimeValue::from(default)),
    }
}
