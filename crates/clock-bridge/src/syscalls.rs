//! One-to-one wrappers over the four clock system calls.
//!
//! Arguments are converted exactly as a C caller passing a 32-bit `int`
//! would convert them: no range checks, no retries. Failures reported
//! through the `-1` sentinel become [`SystemCallError`] with `errno`
//! captured immediately after the call.
//!
//! `alarm` here bypasses the [`AlarmSlot`](crate::alarm_slot::AlarmSlot)
//! bookkeeping; prefer the slot or [`ClockBridge`](crate::bridge::ClockBridge).

use clock_common::error::SystemCallError;

/// Arm the process alarm `seconds` from now.
///
/// Returns the seconds left on the alarm this call replaced, or zero.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn alarm(seconds: i32) -> i32 {
    // SAFETY: alarm has no pointer arguments or preconditions
    let previous = unsafe { libc::alarm(seconds as libc::c_uint) };
    previous as i32
}

/// Suspend the calling thread for up to `seconds` seconds.
///
/// Returns the number of seconds not slept; interruption is not an error.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn sleep(seconds: i32) -> i32 {
    // SAFETY: sleep has no pointer arguments or preconditions
    let unslept = unsafe { libc::sleep(seconds as libc::c_uint) };
    unslept as i32
}

/// Suspend the calling thread for `microseconds` microseconds.
///
/// # Errors
///
/// Returns the platform error when `usleep` returns `-1`.
#[allow(clippy::cast_sign_loss)]
pub fn usleep(microseconds: i32) -> Result<(), SystemCallError> {
    // SAFETY: usleep has no pointer arguments or preconditions
    let rc = unsafe { libc::usleep(microseconds as libc::useconds_t) };
    if rc == -1 {
        return Err(SystemCallError::last("usleep"));
    }
    Ok(())
}

/// Suspend the calling thread for `request`.
///
/// When `remaining` is `None` the kernel is passed a null pointer and
/// reports no remainder. When the call is interrupted and `remaining` is
/// `Some`, it holds the unslept portion.
///
/// # Errors
///
/// Returns the platform error when `nanosleep` returns `-1` (`EINTR`
/// when interrupted, `EINVAL` for an out-of-range request).
pub fn nanosleep(
    request: &libc::timespec,
    remaining: Option<&mut libc::timespec>,
) -> Result<(), SystemCallError> {
    let remaining_ptr = remaining.map_or(std::ptr::null_mut(), |r| r as *mut libc::timespec);

    // SAFETY: request is a valid reference; remaining_ptr is null or
    // derived from a live exclusive reference
    let rc = unsafe { libc::nanosleep(request, remaining_ptr) };
    if rc == -1 {
        return Err(SystemCallError::last("nanosleep"));
    }
    Ok(())
}
