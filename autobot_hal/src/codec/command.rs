//! Outbound actuator command encoding.
//!
//! Every command is a 17-character frame:
//!
//! | Command | Frame |
//! |---------|-------|
//! | Flashlight | `ZSU++000vvv00000E` |
//! | UV flashlight | `ZSU++vvv00000000E` |
//! | Camera servo | `ZSSaaa0000000000E` |
//! | Wheels | `ZST0s00vvvs00vvvE` (sign + magnitude, left then right) |
//!
//! Numeric fields are three zero-padded decimal digits.

use autobot_common::consts::{
    CAMERA_SERVO_MIN_ANGLE, COMMAND_LEN, FIELD_WIDTH, LEVEL_MAX, WHEEL_POWER_MAX,
};
use autobot_common::hal::channel::DeviceChannel;
use autobot_common::hal::driver::HalError;
use autobot_common::hal::types::{DeviceValue, WheelPower};
use static_assertions::const_assert_eq;
use std::fmt::Write;

/// Encoded command, always exactly `COMMAND_LEN` characters.
pub type CommandFrame = heapless::String<COMMAND_LEN>;

const FLASHLIGHT_HEAD: &str = "ZSU++000";
const FLASHLIGHT_TAIL: &str = "00000E";
const UV_FLASHLIGHT_HEAD: &str = "ZSU++";
const UV_FLASHLIGHT_TAIL: &str = "00000000E";
const CAMERA_SERVO_HEAD: &str = "ZSS";
const CAMERA_SERVO_TAIL: &str = "0000000000E";
const WHEELS_HEAD: &str = "ZST0";
const WHEELS_PAD: &str = "00";
const WHEELS_TAIL: &str = "E";

const_assert_eq!(FLASHLIGHT_HEAD.len() + FIELD_WIDTH + FLASHLIGHT_TAIL.len(), COMMAND_LEN);
const_assert_eq!(UV_FLASHLIGHT_HEAD.len() + FIELD_WIDTH + UV_FLASHLIGHT_TAIL.len(), COMMAND_LEN);
const_assert_eq!(CAMERA_SERVO_HEAD.len() + FIELD_WIDTH + CAMERA_SERVO_TAIL.len(), COMMAND_LEN);
const_assert_eq!(
    WHEELS_HEAD.len() + 2 * (1 + WHEELS_PAD.len() + FIELD_WIDTH) + WHEELS_TAIL.len(),
    COMMAND_LEN
);

/// Actuator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Flashlight intensity 0..=100
    Flashlight(u8),
    /// UV flashlight intensity 0..=100
    UvFlashlight(u8),
    /// Camera servo angle 0..=100, raised to at least 2
    CameraServo(u8),
    /// Wheel power, each side -100..=100
    Wheels {
        /// Left side power
        left: i8,
        /// Right side power
        right: i8,
    },
}

impl Command {
    /// Build a validated command for `channel`.
    ///
    /// # Errors
    /// - `HalError::InvalidShape` if `value` does not fit the channel
    /// - `HalError::InvalidValue` if a number is out of range
    pub fn for_device(channel: DeviceChannel, value: DeviceValue) -> Result<Self, HalError> {
        let command = match (channel, value) {
            (DeviceChannel::Flashlight, DeviceValue::Level(v)) => {
                Command::Flashlight(level(channel, v)?)
            }
            (DeviceChannel::UvFlashlight, DeviceValue::Level(v)) => {
                Command::UvFlashlight(level(channel, v)?)
            }
            (DeviceChannel::CameraServo, DeviceValue::Level(v)) => {
                Command::CameraServo(level(channel, v)?)
            }
            (DeviceChannel::Wheels, DeviceValue::Wheels(WheelPower { left, right })) => {
                Command::Wheels {
                    left: wheel("left", left)?,
                    right: wheel("right", right)?,
                }
            }
            (DeviceChannel::Wheels, other) => {
                return Err(HalError::InvalidShape(format!(
                    "{channel} needs left/right power, got {other:?}"
                )));
            }
            (_, other) => {
                return Err(HalError::InvalidShape(format!(
                    "{channel} needs a single value, got {other:?}"
                )));
            }
        };
        Ok(command.normalized())
    }

    /// Build a validated command for a device given by name.
    ///
    /// # Errors
    /// `HalError::InvalidDevice` for an unrecognized name, otherwise as
    /// [`Command::for_device`].
    pub fn for_device_name(name: &str, value: DeviceValue) -> Result<Self, HalError> {
        let channel: DeviceChannel = name.parse().map_err(|_| {
            HalError::InvalidDevice(format!(
                "'{name}' is not a device, expected one of {:?}",
                DeviceChannel::ALL.map(DeviceChannel::name)
            ))
        })?;
        Self::for_device(channel, value)
    }

    /// Device this command drives.
    pub fn channel(&self) -> DeviceChannel {
        match self {
            Command::Flashlight(_) => DeviceChannel::Flashlight,
            Command::UvFlashlight(_) => DeviceChannel::UvFlashlight,
            Command::CameraServo(_) => DeviceChannel::CameraServo,
            Command::Wheels { .. } => DeviceChannel::Wheels,
        }
    }

    /// Apply the servo floor. Other commands are returned unchanged.
    pub fn normalized(self) -> Self {
        match self {
            Command::CameraServo(angle) => Command::CameraServo(angle.max(CAMERA_SERVO_MIN_ANGLE)),
            other => other,
        }
    }

    /// Setpoint recorded once this command has been sent.
    pub fn setpoint(&self) -> DeviceValue {
        match self.normalized() {
            Command::Flashlight(v) | Command::UvFlashlight(v) | Command::CameraServo(v) => {
                DeviceValue::Level(i32::from(v))
            }
            Command::Wheels { left, right } => {
                DeviceValue::Wheels(WheelPower::new(i32::from(left), i32::from(right)))
            }
        }
    }

    /// Encode into the wire frame.
    ///
    /// # Errors
    /// `HalError::InvalidValue` if a field is out of range.
    pub fn encode(&self) -> Result<CommandFrame, HalError> {
        let mut frame = CommandFrame::new();
        let written = match self.normalized() {
            Command::Flashlight(v) => {
                let v = level(DeviceChannel::Flashlight, i32::from(v))?;
                write!(frame, "{FLASHLIGHT_HEAD}{v:03}{FLASHLIGHT_TAIL}")
            }
            Command::UvFlashlight(v) => {
                let v = level(DeviceChannel::UvFlashlight, i32::from(v))?;
                write!(frame, "{UV_FLASHLIGHT_HEAD}{v:03}{UV_FLASHLIGHT_TAIL}")
            }
            Command::CameraServo(a) => {
                let a = level(DeviceChannel::CameraServo, i32::from(a))?;
                write!(frame, "{CAMERA_SERVO_HEAD}{a:03}{CAMERA_SERVO_TAIL}")
            }
            Command::Wheels { left, right } => {
                let left = wheel("left", i32::from(left))?;
                let right = wheel("right", i32::from(right))?;
                write!(
                    frame,
                    "{WHEELS_HEAD}{}{WHEELS_PAD}{:03}{}{WHEELS_PAD}{:03}{WHEELS_TAIL}",
                    sign(left),
                    left.unsigned_abs(),
                    sign(right),
                    right.unsigned_abs(),
                )
            }
        };
        written.map_err(|_| {
            HalError::InvalidValue(format!("{self:?} does not fit a {COMMAND_LEN}-byte frame"))
        })?;
        Ok(frame)
    }
}

/// Validate a 0..=100 scalar.
fn level(channel: DeviceChannel, value: i32) -> Result<u8, HalError> {
    if !(0..=LEVEL_MAX).contains(&value) {
        return Err(HalError::InvalidValue(format!(
            "{channel} value {value} outside 0..={LEVEL_MAX}"
        )));
    }
    Ok(value as u8)
}

/// Validate a -100..=100 wheel power.
fn wheel(side: &str, value: i32) -> Result<i8, HalError> {
    if !(-WHEEL_POWER_MAX..=WHEEL_POWER_MAX).contains(&value) {
        return Err(HalError::InvalidValue(format!(
            "{side} wheel power {value} outside -{WHEEL_POWER_MAX}..={WHEEL_POWER_MAX}"
        )));
    }
    Ok(value as i8)
}

fn sign(power: i8) -> char {
    if power >= 0 { '+' } else { '-' }
}
