//! Wire protocol constants and defaults for the AutoBot workspace.
//!
//! Single source of truth for frame layout, value ranges and default paths.

use std::time::Duration;

/// Default serial device path (overridable via [`SERIAL_DEVICE_ENV`]).
pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyUSB0";

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default serial read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Environment variable overriding the serial device path.
pub const SERIAL_DEVICE_ENV: &str = "HW_SERIAL";

/// Environment variable overriding the serial baud rate.
pub const BAUD_RATE_ENV: &str = "HW_BAUDRATE";

/// Default service name used in logs.
pub const DEFAULT_SERVICE_NAME: &str = "autobot-hal";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/autobot/autobot.toml";

// ─── Inbound frames ─────────────────────────────────────────────────

/// Length of the channel mask at the start of every inbound frame.
pub const MASK_LEN: usize = 2;

/// Infrared distance array mask.
pub const IR_MASK: &str = "SI";

/// Ultrasonic distance array mask.
pub const US_MASK: &str = "SU";

/// Battery level mask.
pub const BATTERY_MASK: &str = "SA";

/// RFID tag mask.
pub const RFID_MASK: &str = "SF";

/// Trailing end marker of every frame.
pub const END_MARKER: char = 'E';

/// Number of sensors in a distance array (IR, US).
pub const DISTANCE_SENSOR_COUNT: usize = 5;

/// Width of one decimal field in a distance array and in commands.
pub const FIELD_WIDTH: usize = 3;

// ─── Outbound commands ──────────────────────────────────────────────

/// Fixed length of every outbound command frame.
pub const COMMAND_LEN: usize = 17;

/// Gap between the two transmissions of the same command.
pub const COMMAND_REPEAT_DELAY: Duration = Duration::from_millis(10);

/// Number of times every command is written.
pub const COMMAND_REPEAT_COUNT: usize = 2;

/// Maximum intensity / angle of scalar devices.
pub const LEVEL_MAX: i32 = 100;

/// Maximum absolute wheel power.
pub const WHEEL_POWER_MAX: i32 = 100;

/// Lowest angle the camera servo is commanded to. Lower requests are raised to it.
pub const CAMERA_SERVO_MIN_ANGLE: u8 = 2;

/// Camera angle applied when the robot starts.
pub const DEFAULT_INITIAL_CAMERA_ANGLE: u8 = 90;

/// Camera angle applied when the robot shuts down.
pub const DEFAULT_PARK_CAMERA_ANGLE: u8 = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_have_mask_len() {
        for mask in [IR_MASK, US_MASK, BATTERY_MASK, RFID_MASK] {
            assert_eq!(mask.len(), MASK_LEN);
        }
    }

    #[test]
    fn ranges_fit_three_digit_fields() {
        assert!(LEVEL_MAX < 1000);
        assert!(WHEEL_POWER_MAX < 1000);
        assert!(i32::from(CAMERA_SERVO_MIN_ANGLE) <= LEVEL_MAX);
        assert_eq!(COMMAND_REPEAT_COUNT, 2);
    }
}
