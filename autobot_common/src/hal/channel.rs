//! Sensor and device channel identities.
//!
//! The channel set is fixed: four telemetry streams coming from the
//! microcontroller and four actuators driven by commands.
//!
//! | Sensor | Mask | Value |
//! |--------|------|-------|
//! | `IR` | `SI` | 5 distances (cm) |
//! | `US` | `SU` | 5 distances (cm) |
//! | `BATTERY` | `SA` | integer level |
//! | `RFID` | `SF` | tag text |

use crate::consts::{BATTERY_MASK, IR_MASK, RFID_MASK, US_MASK};
use crate::hal::driver::HalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Telemetry stream reported by the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorChannel {
    /// Infrared distance array.
    Ir,
    /// Ultrasonic distance array.
    Us,
    /// Battery level.
    Battery,
    /// RFID tag reader.
    Rfid,
}

impl SensorChannel {
    /// All sensor channels in their stable order.
    pub const ALL: [SensorChannel; 4] = [Self::Ir, Self::Us, Self::Battery, Self::Rfid];

    /// Canonical upper-case channel name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ir => "IR",
            Self::Us => "US",
            Self::Battery => "BATTERY",
            Self::Rfid => "RFID",
        }
    }

    /// Two-character prefix of this channel's inbound frames.
    pub const fn mask(self) -> &'static str {
        match self {
            Self::Ir => IR_MASK,
            Self::Us => US_MASK,
            Self::Battery => BATTERY_MASK,
            Self::Rfid => RFID_MASK,
        }
    }

    /// Look up the channel owning a frame prefix.
    ///
    /// At most one channel owns a prefix, so a frame never belongs to more
    /// than one channel.
    pub fn from_mask(prefix: &str) -> Option<Self> {
        match prefix {
            IR_MASK => Some(Self::Ir),
            US_MASK => Some(Self::Us),
            BATTERY_MASK => Some(Self::Battery),
            RFID_MASK => Some(Self::Rfid),
            _ => None,
        }
    }

    /// Whether the channel reports a distance array.
    pub const fn is_distance_array(self) -> bool {
        matches!(self, Self::Ir | Self::Us)
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorChannel {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                HalError::UnknownChannel(format!(
                    "'{s}' is not a sensor, expected one of {:?}",
                    Self::ALL.map(Self::name)
                ))
            })
    }
}

/// Actuator driven by outbound commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceChannel {
    /// White flashlight, intensity 0–100.
    Flashlight,
    /// UV flashlight, intensity 0–100.
    UvFlashlight,
    /// Camera tilt servo, angle 0–100.
    CameraServo,
    /// Differential drive, left/right power -100–100.
    Wheels,
}

impl DeviceChannel {
    /// All device channels in their stable order.
    pub const ALL: [DeviceChannel; 4] = [
        Self::Flashlight,
        Self::UvFlashlight,
        Self::CameraServo,
        Self::Wheels,
    ];

    /// Canonical upper-case channel name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Flashlight => "FLASHLIGHT",
            Self::UvFlashlight => "UV_FLASHLIGHT",
            Self::CameraServo => "CAMERA_SERVO",
            Self::Wheels => "WHEELS",
        }
    }
}

impl fmt::Display for DeviceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceChannel {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                HalError::UnknownChannel(format!(
                    "'{s}' is not a device, expected one of {:?}",
                    Self::ALL.map(Self::name)
                ))
            })
    }
}
