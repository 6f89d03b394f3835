//! Integration tests for the clock syscall bridge.
//!
//! These tests deliver real signals and arm the real process alarm, so
//! they run in their own test binary and serialize on a shared lock.

mod syscalls;
