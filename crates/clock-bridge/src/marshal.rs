//! Field marshalling between caller-side time objects and [`TimeValue`].
//!
//! The typed [`TimeValue`] record is the normal boundary type and its
//! accessors cannot fail. Hosts that only offer late-bound, name-keyed
//! field access implement [`TimeValueFields`] themselves; [`FieldObject`]
//! is a reference implementation of that style of object.
//!
//! Fields are always read and written in the order `tv_sec`, `tv_nsec`,
//! and the first failure stops the transfer.

use clock_common::error::FieldError;
use clock_common::time::{TimeField, TimeValue};
use static_assertions::const_assert;
use std::collections::BTreeMap;
use std::fmt;

// Widening native fields into i64 must be lossless.
const_assert!(std::mem::size_of::<libc::time_t>() <= std::mem::size_of::<i64>());
const_assert!(std::mem::size_of::<libc::c_long>() <= std::mem::size_of::<i64>());

/// Field-level access to a caller-supplied time object.
pub trait TimeValueFields {
    /// Read one integer field.
    ///
    /// # Errors
    ///
    /// Returns the host's error if the field cannot be read as an integer.
    fn read_field(&self, field: TimeField) -> Result<i64, FieldError>;

    /// Write one integer field.
    ///
    /// # Errors
    ///
    /// Returns the host's error if the field cannot be written.
    fn write_field(&mut self, field: TimeField, value: i64) -> Result<(), FieldError>;
}

impl TimeValueFields for TimeValue {
    fn read_field(&self, field: TimeField) -> Result<i64, FieldError> {
        Ok(self.get(field))
    }

    fn write_field(&mut self, field: TimeField, value: i64) -> Result<(), FieldError> {
        self.set(field, value);
        Ok(())
    }
}

/// Extract a [`TimeValue`] from `object`, seconds first.
///
/// # Errors
///
/// Returns the first field error; the remaining field is not read.
pub fn read_time_value<T: TimeValueFields + ?Sized>(object: &T) -> Result<TimeValue, FieldError> {
    let sec = object.read_field(TimeField::Seconds)?;
    let nsec = object.read_field(TimeField::Nanoseconds)?;
    Ok(TimeValue::new(sec, nsec))
}

/// Store `value` into `object`, seconds first.
///
/// # Errors
///
/// Returns the first field error; a failed `tv_sec` write leaves
/// `tv_nsec` untouched.
pub fn write_time_value<T: TimeValueFields + ?Sized>(
    object: &mut T,
    value: TimeValue,
) -> Result<(), FieldError> {
    object.write_field(TimeField::Seconds, value.sec)?;
    object.write_field(TimeField::Nanoseconds, value.nsec)
}

/// Dynamically typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit integer.
    Long(i64),
    /// Double-precision float.
    Double(f64),
    /// String.
    Text(String),
    /// Null reference.
    Null,
}

impl FieldValue {
    /// Host-side type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Long(_) => "long",
            FieldValue::Double(_) => "double",
            FieldValue::Text(_) => "String",
            FieldValue::Null => "null",
        }
    }
}

/// A named field with its current value and mutability.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlot {
    /// Current value.
    pub value: FieldValue,
    /// Whether writes are permitted.
    pub writable: bool,
}

/// A name-keyed object whose fields are resolved at call time.
///
/// Behaves like a reflective host object: reads and writes look fields up
/// by their wire names and fail if the field is absent, has the wrong type
/// or is final. The class name is carried for display only; lookups never
/// consult it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldObject {
    class_name: String,
    fields: BTreeMap<String, FieldSlot>,
}

impl FieldObject {
    /// Create an object with no fields.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Create an object carrying writable `tv_sec`/`tv_nsec` fields.
    pub fn timespec(class_name: impl Into<String>, value: TimeValue) -> Self {
        Self::new(class_name)
            .with_field(TimeField::Seconds.name(), FieldValue::Long(value.sec))
            .with_field(TimeField::Nanoseconds.name(), FieldValue::Long(value.nsec))
    }

    /// Add or replace a writable field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(
            name.into(),
            FieldSlot {
                value,
                writable: true,
            },
        );
        self
    }

    /// Mark an existing field read-only.
    #[must_use]
    pub fn read_only(mut self, name: &str) -> Self {
        if let Some(slot) = self.fields.get_mut(name) {
            slot.writable = false;
        }
        self
    }

    /// Remove a field.
    #[must_use]
    pub fn without_field(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Declared class name, used only when printing the object.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).map(|slot| &slot.value)
    }
}

impl TimeValueFields for FieldObject {
    fn read_field(&self, field: TimeField) -> Result<i64, FieldError> {
        match self.get(field.name()) {
            Some(FieldValue::Long(value)) => Ok(*value),
            Some(other) => Err(FieldError::WrongType {
                field,
                expected: "long",
                found: other.type_name(),
            }),
            None => Err(FieldError::Missing { field }),
        }
    }

    fn write_field(&mut self, field: TimeField, value: i64) -> Result<(), FieldError> {
        let slot = self
            .fields
            .get_mut(field.name())
            .ok_or(FieldError::Missing { field })?;
        if !slot.writable {
            return Err(FieldError::ReadOnly { field });
        }
        if !matches!(slot.value, FieldValue::Long(_)) {
            return Err(FieldError::WrongType {
                field,
                expected: "long",
                found: slot.value.type_name(),
            });
        }
        slot.value = FieldValue::Long(value);
        Ok(())
    }
}

impl fmt::Display for FieldObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.class_name)?;
        for (i, (name, slot)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {name}: {:?}", slot.value)?;
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS: &str = "UProcess$s_timespec";

    #[test]
    fn test_typed_record_roundtrip() {
        let mut out = TimeValue::zero();
        write_time_value(&mut out, TimeValue::new(4, 999_999_999)).unwrap();
        assert_eq!(read_time_value(&out).unwrap(), TimeValue::new(4, 999_999_999));
    }

    #[test]
    fn test_field_object_read() {
        let obj = FieldObject::timespec(CLASS, TimeValue::new(2, 50));
        assert_eq!(obj.class_name(), CLASS);
        assert_eq!(read_time_value(&obj).unwrap(), TimeValue::new(2, 50));
    }

    #[test]
    fn test_missing_field() {
        let obj = FieldObject::timespec(CLASS, TimeValue::zero()).without_field("tv_nsec");
        assert_eq!(
            read_time_value(&obj),
            Err(FieldError::Missing {
                field: TimeField::Nanoseconds
            })
        );
    }

    #[test]
    fn test_wrong_type() {
        let obj = FieldObject::timespec(CLASS, TimeValue::zero())
            .with_field("tv_sec", FieldValue::Text("1".into()));
        assert_eq!(
            read_time_value(&obj),
            Err(FieldError::WrongType {
                field: TimeField::Seconds,
                expected: "long",
                found: "String",
            })
        );
    }

    #[test]
    fn test_read_only_write_stops_transfer() {
        let mut obj = FieldObject::timespec(CLASS, TimeValue::zero()).read_only("tv_sec");
        let err = write_time_value(&mut obj, TimeValue::new(1, 2)).unwrap_err();
        assert_eq!(
            err,
            FieldError::ReadOnly {
                field: TimeField::Seconds
            }
        );
        // tv_nsec is never reached
        assert_eq!(obj.get("tv_nsec"), Some(&FieldValue::Long(0)));
    }

    #[test]
    fn test_partial_write_keeps_seconds() {
        let mut obj = FieldObject::timespec(CLASS, TimeValue::zero()).read_only("tv_nsec");
        assert!(write_time_value(&mut obj, TimeValue::new(3, 4)).is_err());
        assert_eq!(obj.get("tv_sec"), Some(&FieldValue::Long(3)));
    }

    #[test]
    fn test_lookup_ignores_class_name() {
        let value = TimeValue::new(7, 8);
        let a = FieldObject::timespec("a", value);
        let b = FieldObject::timespec("b", value);
        assert_eq!(read_time_value(&a).unwrap(), read_time_value(&b).unwrap());
        assert!(a.to_string().starts_with("a {"));
    }

    #[test]
    fn test_display() {
        let obj = FieldObject::timespec("ts", TimeValue::new(1, 2));
        assert_eq!(obj.to_string(), "ts { tv_nsec: Long(2), tv_sec: Long(1) }");
    }
}
