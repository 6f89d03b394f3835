//! The process-wide alarm, modelled as a single-slot registry.
//!
//! A process has exactly one `alarm` deadline. Every arm replaces it and
//! the last writer wins; the OS-reported remainder of the replaced alarm
//! is returned unchanged. The registry additionally remembers who armed
//! the current deadline and when, which the OS does not expose.

use crate::syscalls;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Bookkeeping for the currently armed alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmDeadline {
    /// When the alarm was armed.
    pub armed_at: Instant,
    /// Seconds requested, as seen by the OS.
    pub seconds: u32,
    /// Name of the arming thread, if it has one.
    pub owner: Option<String>,
}

impl AlarmDeadline {
    /// Instant at which `SIGALRM` is due.
    pub fn deadline(&self) -> Instant {
        self.armed_at + Duration::from_secs(u64::from(self.seconds))
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }
}

/// Single-slot alarm registry. Obtain it with [`AlarmSlot::global`].
#[derive(Debug)]
pub struct AlarmSlot {
    slot: Mutex<Option<AlarmDeadline>>,
}

static GLOBAL_SLOT: AlarmSlot = AlarmSlot {
    slot: Mutex::new(None),
};

impl AlarmSlot {
    /// The registry for this process.
    pub fn global() -> &'static AlarmSlot {
        &GLOBAL_SLOT
    }

    /// Arm the alarm `seconds` from now, replacing any pending one.
    ///
    /// Zero cancels. Returns the seconds that were left on the replaced
    /// alarm, or zero if none was pending.
    #[allow(clippy::cast_sign_loss)]
    pub fn arm(&self, seconds: i32) -> i32 {
        let mut slot = self.lock();
        // Taken before the call so the recorded deadline never trails the OS one
        let armed_at = Instant::now();
        let previous = syscalls::alarm(seconds);

        // Same conversion the OS applies to the argument
        let os_seconds = seconds as u32;
        *slot = (os_seconds != 0).then(|| AlarmDeadline {
            armed_at,
            seconds: os_seconds,
            owner: std::thread::current().name().map(str::to_owned),
        });

        debug!(seconds, previous, "Alarm slot updated");
        previous
    }

    /// Cancel any pending alarm, returning its remaining seconds.
    pub fn cancel(&self) -> i32 {
        self.arm(0)
    }

    /// The armed deadline, or `None` if nothing is pending or it has fired.
    pub fn pending(&self) -> Option<AlarmDeadline> {
        let mut slot = self.lock();
        if slot
            .as_ref()
            .is_some_and(|d| d.remaining(Instant::now()).is_zero())
        {
            *slot = None;
        }
        slot.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<AlarmDeadline>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
