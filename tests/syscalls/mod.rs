//! Signal-dependent bridge behavior:
//! - Alarm arming, replacement and cancellation
//! - `nanosleep` and `sleep` interruption and remainder reporting

mod alarm_test;
mod common;
mod interrupt_test;
