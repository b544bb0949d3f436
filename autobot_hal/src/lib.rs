//! # AutoBot HAL Library
//!
//! Serial hardware abstraction layer for the AutoBot mobile robot.
//!
//! The robot's microcontroller streams sensor telemetry as ASCII lines and
//! accepts fixed-width actuator commands. This crate decodes the telemetry
//! on a background thread, keeps the latest values with their timestamps,
//! and exposes a typed command API on top.
//!
//! # Module Structure
//!
//! - [`core`] - HalCore session, reader thread lifecycle, command transmission
//! - [`codec`] - Inbound frame parsing and outbound command encoding
//! - [`driver_registry`] - Transport factory registration
//! - [`drivers`] - Serial and simulated transports
//! - [`reader`] - Background reader loop and its counters
//! - [`robot`] - Robot facade, driving presets and throttle mixing
//! - [`store`] - Latest sensor values and device setpoints
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      autobot_hal (single crate)                  │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │   Robot     │───►│   HalCore    │◄───│ Transport Registry  │  │
//! │  │  (facade)   │    │  (session)   │    │                     │  │
//! │  └─────────────┘    └──┬────────┬──┘    └─────────────────────┘  │
//! │                encode  │        │ spawn                          │
//! │                        ▼        ▼                                │
//! │              ┌──────────┐   ┌────────────┐   ┌──────────────┐    │
//! │              │ writer   │   │ ReaderLoop │──►│  StateStore  │    │
//! │              │ handle   │   │ (thread)   │   │              │    │
//! │              └────┬─────┘   └─────┬──────┘   └──────────────┘    │
//! │                   ▼               ▼                              │
//! │              ┌────────────────────────────┐                      │
//! │              │  Transport (trait object)  │                      │
//! │              └────────────────────────────┘                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod codec;
pub mod core;
pub mod driver_registry;
pub mod drivers;
pub mod reader;
pub mod robot;
pub mod store;

// Re-export key types for convenience
pub use crate::codec::{Command, CommandFrame, Reading};
pub use crate::core::HalCore;
pub use crate::driver_registry::TransportRegistry;
pub use crate::drivers::simulation::{SimulationHandle, SimulationTransport};
pub use crate::reader::{ReaderStats, ReaderStatsSnapshot};
pub use crate::robot::{Direction, DriveProfile, Robot, UvDirection};
pub use crate::store::StateStore;
