use crate::time::TimeField;
use nix::errno::Errno;
use thiserror::Error;

/// A system call reported failure through its `-1` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{call} failed: {errno}")]
pub struct SystemCallError {
    /// Name of the failing call (`usleep`, `nanosleep`, ...).
    pub call: &'static str,
    /// Platform error code captured right after the call returned.
    pub errno: Errno,
}

impl SystemCallError {
    /// Build an error for `call` from an explicit error code.
    pub fn new(call: &'static str, errno: Errno) -> Self {
        Self { call, errno }
    }

    /// Capture the calling thread's current `errno` for `call`.
    ///
    /// Must be invoked before anything else can clobber `errno`.
    pub fn last(call: &'static str) -> Self {
        Self::new(call, Errno::last())
    }

    /// Raw platform error number.
    pub fn raw_os_error(&self) -> i32 {
        self.errno as i32
    }

    /// Whether the call was cut short by signal delivery.
    pub fn is_interrupted(&self) -> bool {
        self.errno == Errno::EINTR
    }
}

/// Failure to read or write a named field on a caller-supplied time object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The object has no field with this name.
    #[error("no such field: {field}")]
    Missing {
        /// Field that was looked up.
        field: TimeField,
    },

    /// The field exists but does not hold an integer.
    #[error("field {field} has type {found}, expected {expected}")]
    WrongType {
        /// Field that was looked up.
        field: TimeField,
        /// Type the bridge needs.
        expected: &'static str,
        /// Type the object actually carries.
        found: &'static str,
    },

    /// The field exists but rejects writes.
    #[error("field {field} is read-only")]
    ReadOnly {
        /// Field that was written.
        field: TimeField,
    },

    /// Error raised by the host while accessing the field.
    #[error("host error accessing {field}: {message}")]
    Host {
        /// Field being accessed.
        field: TimeField,
        /// Host-provided description.
        message: String,
    },
}

/// Bridge error taxonomy.
///
/// `Field` errors are the accessor's own error passed through untouched;
/// the bridge never reports a second error on top of one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Marshalling a time-value field failed.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The underlying system call failed.
    #[error(transparent)]
    SystemCall(#[from] SystemCallError),

    /// A 64-bit field value does not fit the native time-value width.
    #[error("{field} value {value} does not fit the native timespec field")]
    Narrowing {
        /// Field being converted.
        field: TimeField,
        /// Rejected value.
        value: i64,
    },
}

impl BridgeError {
    /// The system call error, if this is one.
    pub fn as_system_call(&self) -> Option<&SystemCallError> {
        match self {
            BridgeError::SystemCall(e) => Some(e),
            _ => None,
        }
    }
}

/// Convenience type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
