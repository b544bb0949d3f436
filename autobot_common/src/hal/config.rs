//! HAL configuration types.
//!
//! This module contains configuration types for the AutoBot HAL:
//! - `HalConfig` - Main configuration loaded from `autobot.toml`
//! - `SerialConfig` - Serial link parameters
//! - `DriveConfig` - Throttle mixing parameters
//! - `RobotConfig` - Start / park poses
//!
//! Every section is optional. Serial settings can be overridden through the
//! `HW_SERIAL` and `HW_BAUDRATE` environment variables.

use crate::config::SharedConfig;
use crate::consts::{
    BAUD_RATE_ENV, DEFAULT_BAUD_RATE, DEFAULT_INITIAL_CAMERA_ANGLE, DEFAULT_PARK_CAMERA_ANGLE,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_SERIAL_DEVICE, LEVEL_MAX, SERIAL_DEVICE_ENV,
};
use crate::hal::driver::HalError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Default function for max_duty
fn default_max_duty() -> f32 {
    1.0
}

/// Main configuration loaded from `autobot.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HalConfig {
    /// Logging and service identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Serial link parameters.
    #[serde(default)]
    pub serial: SerialConfig,

    /// Throttle mixing parameters.
    #[serde(default)]
    pub drive: DriveConfig,

    /// Start / park poses.
    #[serde(default)]
    pub robot: RobotConfig,
}

impl HalConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` not empty
    /// 2. `serial.device` not empty, `baud_rate` > 0, `read_timeout_ms` > 0
    /// 3. `0 <= drive.zero_throttle < 1`, `0 < drive.max_duty <= 1`
    /// 4. Camera angles within 0..=100
    pub fn validate(&self) -> Result<(), HalError> {
        self.shared.validate()?;
        self.serial.validate()?;
        self.drive.validate()?;
        self.robot.validate()?;
        Ok(())
    }

    /// Apply `HW_SERIAL` / `HW_BAUDRATE` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), HalError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), HalError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(device) = lookup(SERIAL_DEVICE_ENV).filter(|d| !d.is_empty()) {
            info!("{} overrides serial device: {}", SERIAL_DEVICE_ENV, device);
            self.serial.device = device;
        }

        if let Some(baud) = lookup(BAUD_RATE_ENV).filter(|b| !b.is_empty()) {
            self.serial.baud_rate = baud.trim().parse().map_err(|e| {
                HalError::ConfigError(format!("{BAUD_RATE_ENV}={baud:?} is not a baud rate: {e}"))
            })?;
            info!("{} overrides baud rate: {}", BAUD_RATE_ENV, self.serial.baud_rate);
        }

        Ok(())
    }
}

/// Serial link parameters.
///
/// # TOML Example
///
/// ```toml
/// [serial]
/// device = "/dev/ttyUSB0"
/// baud_rate = 115200
/// read_timeout_ms = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SerialConfig {
    /// Serial device path.
    pub device: String,

    /// Baud rate.
    pub baud_rate: u32,

    /// Read timeout in milliseconds. Bounds how long a stop request waits
    /// for the reader thread.
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_SERIAL_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    /// Read timeout as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Validate the serial parameters.
    pub fn validate(&self) -> Result<(), HalError> {
        if self.device.trim().is_empty() {
            return Err(HalError::ConfigError(
                "serial.device cannot be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(HalError::ConfigError(
                "serial.baud_rate must be greater than 0".to_string(),
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(HalError::ConfigError(
                "serial.read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Throttle mixing parameters for autopilot input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriveConfig {
    /// Throttle magnitudes at or below this are treated as zero.
    #[serde(default)]
    pub zero_throttle: f32,

    /// Maximum duty cycle sent to the motors (0, 1].
    #[serde(default = "default_max_duty")]
    pub max_duty: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            zero_throttle: 0.0,
            max_duty: default_max_duty(),
        }
    }
}

impl DriveConfig {
    /// Validate the mixing parameters.
    pub fn validate(&self) -> Result<(), HalError> {
        if !(0.0..1.0).contains(&self.zero_throttle) {
            return Err(HalError::ConfigError(format!(
                "drive.zero_throttle must be in [0, 1), got {}",
                self.zero_throttle
            )));
        }
        if !(self.max_duty > 0.0 && self.max_duty <= 1.0) {
            return Err(HalError::ConfigError(format!(
                "drive.max_duty must be in (0, 1], got {}",
                self.max_duty
            )));
        }
        Ok(())
    }
}

/// Poses applied when the robot starts and shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RobotConfig {
    /// Camera servo angle applied on start.
    pub initial_camera_angle: u8,

    /// Camera servo angle applied on shutdown.
    pub park_camera_angle: u8,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            initial_camera_angle: DEFAULT_INITIAL_CAMERA_ANGLE,
            park_camera_angle: DEFAULT_PARK_CAMERA_ANGLE,
        }
    }
}

impl RobotConfig {
    /// Validate the poses.
    pub fn validate(&self) -> Result<(), HalError> {
        for (key, angle) in [
            ("robot.initial_camera_angle", self.initial_camera_angle),
            ("robot.park_camera_angle", self.park_camera_angle),
        ] {
            if i32::from(angle) > LEVEL_MAX {
                return Err(HalError::ConfigError(format!(
                    "{key} must be in 0..={LEVEL_MAX}, got {angle}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = HalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.device, DEFAULT_SERIAL_DEVICE);
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.robot.initial_camera_angle, 90);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = HalConfig::from_toml("").unwrap();
        assert_eq!(config.serial, SerialConfig::default());
        assert_eq!(config.drive, DriveConfig::default());
    }

    #[test]
    fn test_partial_section() {
        let config = HalConfig::from_toml(
            r#"
[serial]
device = "/dev/ttyACM0"

[drive]
zero_throttle = 0.05
"#,
        )
        .unwrap();
        assert_eq!(config.serial.device, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.drive.max_duty, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(HalConfig::from_toml("[serial]\nparity = \"odd\"\n").is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = HalConfig::default();
        config.serial.baud_rate = 0;
        assert!(matches!(config.validate(), Err(HalError::ConfigError(_))));

        let mut config = HalConfig::default();
        config.drive.max_duty = 1.5;
        assert!(config.validate().is_err());

        let mut config = HalConfig::default();
        config.robot.park_camera_angle = 120;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("HW_SERIAL", "/dev/ttyS3"), ("HW_BAUDRATE", "57600")]);
        let mut config = HalConfig::default();
        config
            .apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.serial.device, "/dev/ttyS3");
        assert_eq!(config.serial.baud_rate, 57_600);
    }

    #[test]
    fn test_env_override_bad_baud() {
        let mut config = HalConfig::default();
        let result = config.apply_overrides_from(|key| {
            (key == BAUD_RATE_ENV).then(|| "fast".to_string())
        });
        assert!(matches!(result, Err(HalError::ConfigError(_))));
    }
}
