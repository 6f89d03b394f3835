//! Time-value record shared by every bridge operation.
//!
//! `TimeValue` is the statically typed stand-in for the caller's
//! `(tv_sec, tv_nsec)` object. Conversions to the native `timespec`
//! are exact when the value fits; narrowing is governed by
//! [`NarrowingPolicy`].

use crate::config::NarrowingPolicy;
use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Nanoseconds per second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// The two fields of a time value, addressed by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeField {
    /// Whole seconds (`tv_sec`).
    Seconds,
    /// Nanosecond part (`tv_nsec`).
    Nanoseconds,
}

impl TimeField {
    /// Field name as seen by the caller.
    pub const fn name(self) -> &'static str {
        match self {
            TimeField::Seconds => "tv_sec",
            TimeField::Nanoseconds => "tv_nsec",
        }
    }

    /// Parse a caller-side field name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tv_sec" => Some(TimeField::Seconds),
            "tv_nsec" => Some(TimeField::Nanoseconds),
            _ => None,
        }
    }
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `(seconds, nanoseconds)` pair describing a duration.
///
/// Fields are not normalized: whatever the caller supplies is handed to
/// the OS as-is, so out-of-range nanoseconds surface as `EINVAL` there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeValue {
    /// Whole seconds.
    #[serde(rename = "tv_sec")]
    pub sec: i64,
    /// Nanoseconds.
    #[serde(rename = "tv_nsec")]
    pub nsec: i64,
}

impl TimeValue {
    /// Create a time value from raw fields.
    pub const fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }

    /// The zero duration.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Read a single field.
    pub const fn get(&self, field: TimeField) -> i64 {
        match field {
            TimeField::Seconds => self.sec,
            TimeField::Nanoseconds => self.nsec,
        }
    }

    /// Overwrite a single field.
    pub fn set(&mut self, field: TimeField, value: i64) {
        match field {
            TimeField::Seconds => self.sec = value,
            TimeField::Nanoseconds => self.nsec = value,
        }
    }

    /// Whether both fields are within the ranges POSIX accepts.
    pub const fn is_normalized(&self) -> bool {
        self.sec >= 0 && self.nsec >= 0 && self.nsec < NANOS_PER_SEC
    }

    /// Convert from a `Duration`, saturating seconds at `i64::MAX`.
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            sec: i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
            nsec: i64::from(duration.subsec_nanos()),
        }
    }

    /// Convert to a `Duration`, or `None` if the value is not normalized.
    pub fn to_duration(&self) -> Option<Duration> {
        if !self.is_normalized() {
            return None;
        }
        let secs = u64::try_from(self.sec).ok()?;
        let nanos = u32::try_from(self.nsec).ok()?;
        Some(Duration::new(secs, nanos))
    }

    /// Seconds as a float, for reporting only.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 / NANOS_PER_SEC as f64
    }

    /// Build the native record, narrowing each field per `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Narrowing`] under [`NarrowingPolicy::Reject`]
    /// when a field does not fit the platform's `timespec` width.
    pub fn to_timespec(&self, policy: NarrowingPolicy) -> BridgeResult<libc::timespec> {
        Ok(libc::timespec {
            tv_sec: narrow(TimeField::Seconds, self.sec, policy)?,
            tv_nsec: narrow(TimeField::Nanoseconds, self.nsec, policy)?,
        })
    }

    /// Widen a native record. Never lossy: native fields are at most 64 bits.
    #[allow(clippy::useless_conversion)]
    pub fn from_timespec(ts: &libc::timespec) -> Self {
        Self {
            sec: i64::from(ts.tv_sec),
            nsec: i64::from(ts.tv_nsec),
        }
    }
}

impl From<Duration> for TimeValue {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_normalized() {
            write!(f, "{}.{:09}s", self.sec, self.nsec)
        } else {
            write!(f, "{{tv_sec: {}, tv_nsec: {}}}", self.sec, self.nsec)
        }
    }
}

/// Integer types that can back a native `timespec` field.
trait NativeField: TryFrom<i64> + Copy {
    const MIN: Self;
    const MAX: Self;
}

impl NativeField for i32 {
    const MIN: Self = i32::MIN;
    const MAX: Self = i32::MAX;
}

impl NativeField for i64 {
    const MIN: Self = i64::MIN;
    const MAX: Self = i64::MAX;
}

fn narrow<T: NativeField>(field: TimeField, value: i64, policy: NarrowingPolicy) -> BridgeResult<T> {
    match T::try_from(value) {
        Ok(native) => Ok(native),
        Err(_) => match policy {
            NarrowingPolicy::Reject => Err(BridgeError::Narrowing { field, value }),
            NarrowingPolicy::Saturate => {
                tracing::debug!(%field, value, "Saturating time field to native width");
                Ok(if value < 0 { T::MIN } else { T::MAX })
            }
        },
    }
}
