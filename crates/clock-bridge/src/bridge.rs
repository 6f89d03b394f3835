//! The clock syscall bridge.
//!
//! [`ClockBridge`] marshals caller arguments into native form, makes a
//! single pass-through system call and translates the outcome:
//!
//! - `alarm` and `sleep` cannot fail and return the OS value as-is
//! - `usleep` and `nanosleep` turn the `-1` sentinel into
//!   [`BridgeError::SystemCall`]
//! - `nanosleep` field access failures are returned untouched as
//!   [`BridgeError::Field`] and suppress any further work
//!
//! Nothing is retried; interruption is reported, never resumed.

use crate::alarm_slot::AlarmSlot;
use crate::marshal::{read_time_value, write_time_value, TimeValueFields};
use crate::signals::{InterruptHandler, InterruptSignal};
use crate::syscalls;
use clock_common::config::BridgeConfig;
use clock_common::error::{BridgeError, BridgeResult, SystemCallError};
use clock_common::time::TimeValue;
use tracing::{debug, warn};

/// Bridge front end carrying the conversion policy.
#[derive(Debug, Clone, Default)]
pub struct ClockBridge {
    config: BridgeConfig,
}

impl ClockBridge {
    /// Create a bridge with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails only if `handle_sigalrm` is set and the handler cannot be
    /// installed.
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        if config.handle_sigalrm {
            InterruptHandler::install(InterruptSignal::Alarm)?;
        }
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The process alarm registry used by [`alarm`](Self::alarm).
    pub fn alarm_slot(&self) -> &'static AlarmSlot {
        AlarmSlot::global()
    }

    /// Schedule `SIGALRM` `seconds` from now.
    ///
    /// Returns the seconds left on the replaced alarm, or zero.
    pub fn alarm(&self, seconds: i32) -> i32 {
        self.alarm_slot().arm(seconds)
    }

    /// Block for up to `seconds` seconds; returns the seconds not slept.
    pub fn sleep(&self, seconds: i32) -> i32 {
        debug!(seconds, "sleep");
        let unslept = syscalls::sleep(seconds);
        if unslept != 0 {
            debug!(seconds, unslept, "sleep interrupted");
        }
        unslept
    }

    /// Block for `microseconds` microseconds.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SystemCall`] when the OS rejects the call.
    pub fn usleep(&self, microseconds: i32) -> BridgeResult<()> {
        debug!(microseconds, "usleep");
        syscalls::usleep(microseconds).map_err(report)
    }

    /// Block for `duration`, optionally reporting the unslept remainder.
    ///
    /// `duration` is never written. If the wait is cut short and
    /// `remaining` is supplied, the remainder is stored there before the
    /// error is returned. A `None` remainder asks the OS not to report one.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Field`] if a field of `duration` cannot be read
    ///   (the system call is not made) or a field of `remaining` cannot be
    ///   written (the system call error is dropped)
    /// - [`BridgeError::Narrowing`] if a field does not fit the native width
    ///   under the reject policy
    /// - [`BridgeError::SystemCall`] if `nanosleep` fails
    pub fn nanosleep(
        &self,
        duration: &dyn TimeValueFields,
        remaining: Option<&mut dyn TimeValueFields>,
    ) -> BridgeResult<()> {
        let requested = read_time_value(duration)?;
        let request = requested.to_timespec(self.config.narrowing)?;
        debug!(%requested, report_remaining = remaining.is_some(), "nanosleep");

        let Some(out) = remaining else {
            return syscalls::nanosleep(&request, None).map_err(report);
        };

        let mut buffer = TimeValue::zero().to_timespec(self.config.narrowing)?;
        let Err(err) = syscalls::nanosleep(&request, Some(&mut buffer)) else {
            return Ok(());
        };

        let left = TimeValue::from_timespec(&buffer);
        write_time_value(out, left)?;
        debug!(%left, "nanosleep remainder stored");
        Err(report(err))
    }

    /// Typed convenience over [`nanosleep`](Self::nanosleep).
    ///
    /// # Errors
    ///
    /// As for [`nanosleep`](Self::nanosleep); the error also carries the
    /// remainder on interruption.
    pub fn nanosleep_for(&self, duration: TimeValue) -> Result<(), (BridgeError, TimeValue)> {
        let mut left = TimeValue::zero();
        self.nanosleep(&duration, Some(&mut left))
            .map_err(move |err| (err, left))
    }
}

fn report(err: SystemCallError) -> BridgeError {
    if err.is_interrupted() {
        debug!(call = err.call, "System call interrupted");
    } else {
        warn!(call = err.call, errno = %err.errno, "System call failed");
    }
    BridgeError::SystemCall(err)
}
