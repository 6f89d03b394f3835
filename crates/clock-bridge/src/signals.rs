//! Signal handling for interrupting blocking clock calls.
//!
//! The default action for `SIGALRM` terminates the process, so an armed
//! alarm is only useful once a handler is installed. The handler installed
//! here does nothing but bump an atomic counter, and is registered without
//! `SA_RESTART` so that `sleep`, `usleep` and `nanosleep` return early.

use clock_common::error::SystemCallError;
use nix::sys::pthread::{pthread_kill, pthread_self, Pthread};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::os::raw::c_int;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// Signals the bridge can count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptSignal {
    /// SIGALRM - raised when an alarm expires.
    Alarm,
    /// SIGUSR1 - directed interruption of a single thread.
    User1,
    /// SIGUSR2 - directed interruption of a single thread.
    User2,
}

impl InterruptSignal {
    /// The corresponding `nix` signal.
    pub fn signal(self) -> Signal {
        match self {
            InterruptSignal::Alarm => Signal::SIGALRM,
            InterruptSignal::User1 => Signal::SIGUSR1,
            InterruptSignal::User2 => Signal::SIGUSR2,
        }
    }

    fn counter(self) -> &'static AtomicU32 {
        match self {
            InterruptSignal::Alarm => &ALARM_DELIVERIES,
            InterruptSignal::User1 => &USR1_DELIVERIES,
            InterruptSignal::User2 => &USR2_DELIVERIES,
        }
    }
}

impl std::fmt::Display for InterruptSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.signal().as_str())
    }
}

static ALARM_DELIVERIES: AtomicU32 = AtomicU32::new(0);
static USR1_DELIVERIES: AtomicU32 = AtomicU32::new(0);
static USR2_DELIVERIES: AtomicU32 = AtomicU32::new(0);

extern "C" fn count_delivery(signo: c_int) {
    // Only atomics here: the handler must stay async-signal-safe.
    let counter = match signo {
        libc::SIGALRM => &ALARM_DELIVERIES,
        libc::SIGUSR1 => &USR1_DELIVERIES,
        libc::SIGUSR2 => &USR2_DELIVERIES,
        _ => return,
    };
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Handle to an installed counting handler.
///
/// The handler is process-wide and stays installed after the handle is
/// dropped; installing it twice is harmless.
#[derive(Debug, Clone, Copy)]
pub struct InterruptHandler {
    signal: InterruptSignal,
}

impl InterruptHandler {
    /// Install the counting handler for `signal`.
    ///
    /// # Errors
    ///
    /// Returns the `sigaction` failure.
    pub fn install(signal: InterruptSignal) -> Result<Self, SystemCallError> {
        let action = SigAction::new(
            SigHandler::Handler(count_delivery),
            SaFlags::empty(),
            SigSet::empty(),
        );

        // SAFETY: count_delivery only touches atomics
        unsafe { sigaction(signal.signal(), &action) }
            .map_err(|e| SystemCallError::new("sigaction", e))?;

        debug!(%signal, "Interrupt handler installed");
        Ok(Self { signal })
    }

    /// Signal this handler counts.
    pub fn signal(&self) -> InterruptSignal {
        self.signal
    }

    /// Number of deliveries observed since process start.
    #[inline]
    pub fn deliveries(&self) -> u32 {
        self.signal.counter().load(Ordering::Relaxed)
    }

    /// Send the signal to one specific thread.
    ///
    /// # Errors
    ///
    /// Returns the `pthread_kill` failure.
    pub fn interrupt_thread(&self, thread: Pthread) -> Result<(), SystemCallError> {
        pthread_kill(thread, self.signal.signal())
            .map_err(|e| SystemCallError::new("pthread_kill", e))
    }
}

/// Identifier of the calling thread, for [`InterruptHandler::interrupt_thread`].
pub fn current_thread() -> Pthread {
    pthread_self()
}
