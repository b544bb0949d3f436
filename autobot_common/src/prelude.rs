//! Prelude module for common re-exports.
//!
//! ```rust
//! use autobot_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::hal::config::{DriveConfig, HalConfig, RobotConfig, SerialConfig};

// ─── Channels & values ──────────────────────────────────────────────
pub use crate::hal::channel::{DeviceChannel, SensorChannel};
pub use crate::hal::types::{
    ChannelRecord, DeviceValue, Distances, SensorValue, TelemetrySnapshot, WheelPower,
};

// ─── Transport ──────────────────────────────────────────────────────
pub use crate::hal::driver::{HalError, Transport, TransportFactory};
