//! Simulation transport module.
//!
//! This module provides a software stand-in for the robot's
//! microcontroller, for development and testing without hardware.

mod peer;
mod transport;

pub use peer::{PeerOutputs, SimulatedPeer};
pub use transport::{SimulationHandle, SimulationTransport};

use autobot_common::hal::config::SerialConfig;
use autobot_common::hal::driver::{HalError, Transport};
use tracing::info;

/// Factory function to open a simulated link with a telemetry-generating board.
pub fn open_transport(config: &SerialConfig) -> Result<Box<dyn Transport>, HalError> {
    info!(
        "Opening simulated board in place of {} (frame every {}ms)",
        config.device, config.read_timeout_ms
    );
    let (transport, _handle) = SimulationTransport::with_peer(config.read_timeout());
    Ok(Box::new(transport))
}
