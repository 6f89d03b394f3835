//! Shared helpers for signal-dependent tests.

#![allow(dead_code)] // Not every helper is used by every test module

use clock_bridge::signals::current_thread;
use nix::sys::pthread::Pthread;
use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

static SERIAL: Mutex<()> = Mutex::new(());

/// Serialize tests that touch process-wide signal or alarm state.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A worker thread blocked in a call, plus its pthread id.
pub struct Sleeper<T> {
    pub thread: Pthread,
    pub handle: JoinHandle<(T, Duration)>,
}

/// Run `call` on a new thread and return once the thread is about to enter it.
///
/// The closure's result is returned together with the time it took.
pub fn spawn_sleeper<T, F>(call: F) -> Sleeper<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        tx.send(current_thread()).expect("test thread channel closed");
        let start = Instant::now();
        let result = call();
        (result, start.elapsed())
    });
    let thread = rx.recv().expect("sleeper thread exited early");
    // Give the thread time to actually block
    thread::sleep(Duration::from_millis(200));
    Sleeper { thread, handle }
}

/// Wait until `predicate` holds or `timeout` expires.
pub fn wait_for(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    predicate()
}
