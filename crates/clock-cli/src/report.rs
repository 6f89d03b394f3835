//! Operation outcomes as printed by `clockctl`.

use clock_common::time::TimeValue;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Result of one successful bridge operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum Outcome {
    /// `alarm` returned the remainder of the replaced alarm.
    Alarm {
        /// Seconds that were left on the replaced alarm.
        previous: i32,
        /// Whether `SIGALRM` arrived while waiting, if waiting was requested.
        delivered: Option<bool>,
    },
    /// `sleep` returned.
    Sleep {
        /// Seconds not slept.
        unslept: i32,
    },
    /// `usleep` completed.
    Usleep {
        /// Requested microseconds.
        microseconds: i32,
    },
    /// `nanosleep` completed.
    Nanosleep {
        /// Requested duration.
        requested: TimeValue,
    },
}

/// An outcome plus the wall time the operation took.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// What the operation returned.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Elapsed time in nanoseconds.
    pub elapsed_ns: u64,
}

impl Report {
    /// Pair an outcome with its measured duration.
    pub fn new(outcome: Outcome, elapsed: Duration) -> Self {
        Self {
            outcome,
            elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
        }
    }

    /// Render as one JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Alarm {
                previous,
                delivered,
            } => {
                write!(f, "alarm: previous alarm had {previous}s remaining")?;
                match delivered {
                    Some(true) => f.write_str(", SIGALRM delivered")?,
                    Some(false) => f.write_str(", SIGALRM not delivered")?,
                    None => {}
                }
            }
            Outcome::Sleep { unslept } => write!(f, "sleep: {unslept}s not slept")?,
            Outcome::Usleep { microseconds } => write!(f, "usleep: slept {microseconds}us")?,
            Outcome::Nanosleep { requested } => write!(f, "nanosleep: slept {requested}")?,
        }
        let elapsed = humantime::format_duration(Duration::from_nanos(self.elapsed_ns));
        write!(f, " (elapsed {elapsed})")
    }
}
