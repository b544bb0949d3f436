//! Transport implementations.
//!
//! - [`serial`] - UART link to the robot's microcontroller
//! - [`simulation`] - Simulated board for development and testing
//!
//! # Adding New Transports
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `Transport` trait from `autobot_common::hal::driver`
//! 3. Register its factory in [`register_all_transports`]

pub mod serial;
pub mod simulation;

use crate::driver_registry::TransportRegistry;
use autobot_common::hal::config::SerialConfig;
use autobot_common::hal::driver::{HalError, Transport};

/// Factory function to open the serial port.
pub fn open_serial(config: &SerialConfig) -> Result<Box<dyn Transport>, HalError> {
    Ok(Box::new(serial::SerialTransport::open(config)?))
}

/// Register all built-in transports.
pub fn register_all_transports(registry: &mut TransportRegistry) {
    registry.register("serial", open_serial);
    registry.register("simulation", simulation::open_transport);
}
