//! Protocol codec for the microcontroller link.
//!
//! - [`frame`] - inbound telemetry frames → `(SensorChannel, SensorValue)`
//! - [`command`] - outbound actuator commands → fixed-width frames
//!
//! Both directions are pure functions; I/O lives in the transports.

pub mod command;
pub mod frame;

pub use command::{Command, CommandFrame};
pub use frame::{parse_frame, Reading};
