#![doc = "Clock syscall bridge: `alarm`, `sleep`, `usleep` and `nanosleep` behind typed marshalling and errors."]

pub mod alarm_slot;
pub mod bridge;
pub mod marshal;
pub mod signals;
pub mod syscalls;

pub use alarm_slot::*;
pub use bridge::*;
pub use marshal::*;
pub use signals::*;
