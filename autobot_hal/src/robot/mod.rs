//! Robot facade.
//!
//! Named getters and setters over a [`HalCore`] session, the driving presets
//! and the start / shutdown poses. Numeric input is range-checked here so an
//! invalid call never reaches the link.

mod direction;
mod throttle;

pub use direction::{Direction, DriveProfile, UvDirection};
pub use throttle::throttle_to_power;

use crate::core::HalCore;
use autobot_common::consts::{LEVEL_MAX, WHEEL_POWER_MAX};
use autobot_common::hal::channel::{DeviceChannel, SensorChannel};
use autobot_common::hal::config::{DriveConfig, RobotConfig};
use autobot_common::hal::driver::HalError;
use autobot_common::hal::types::{DeviceValue, Distances, SensorValue, TelemetrySnapshot, WheelPower};
use tracing::{info, warn};

/// High-level robot control.
pub struct Robot {
    core: HalCore,
    poses: RobotConfig,
    drive: DriveConfig,
}

impl Robot {
    /// Wrap a session without touching the hardware.
    pub fn new(core: HalCore, poses: RobotConfig, drive: DriveConfig) -> Self {
        Self { core, poses, drive }
    }

    /// Wrap a session and drive the robot into its safe state: wheels
    /// stopped, both lights off, camera at the initial angle.
    pub fn start(core: HalCore, poses: RobotConfig, drive: DriveConfig) -> Result<Self, HalError> {
        let robot = Self::new(core, poses, drive);
        robot.wheels_stop()?;
        robot.flashlight_turn_off()?;
        robot.uv_flashlight_turn_off()?;
        robot.camera_servo_set(i32::from(robot.poses.initial_camera_angle))?;
        info!(
            "Robot ready (camera at {})",
            robot.poses.initial_camera_angle
        );
        Ok(robot)
    }

    /// Stop the wheels, turn the lights off, park the camera and close the
    /// session.
    ///
    /// The session is closed even if a parking command fails; the first
    /// failure is returned.
    pub fn shutdown(&self) -> Result<(), HalError> {
        info!("Parking robot");
        let steps = [
            self.wheels_stop(),
            self.flashlight_turn_off(),
            self.uv_flashlight_turn_off(),
            self.camera_servo_set(i32::from(self.poses.park_camera_angle)),
        ];
        let mut first_error = None;
        for err in steps.into_iter().filter_map(Result::err) {
            warn!("Parking command failed: {}", err);
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
        self.core.shutdown()?;
        first_error.map_or(Ok(()), Err)
    }

    /// Underlying session.
    pub fn core(&self) -> &HalCore {
        &self.core
    }

    // ─── Sensors ────────────────────────────────────────────────────

    /// Battery level, once reported.
    pub fn battery_get(&self) -> Option<u32> {
        self.core
            .get_sensor(SensorChannel::Battery)
            .and_then(|v| v.as_level())
    }

    /// Last RFID tag read, once reported.
    pub fn rfid_get(&self) -> Option<String> {
        self.core
            .get_sensor(SensorChannel::Rfid)
            .and_then(|v| v.as_tag().map(str::to_string))
    }

    /// Infrared distances by sensor index, once reported.
    pub fn ir_get(&self) -> Option<Distances> {
        self.distances(SensorChannel::Ir)
    }

    /// Ultrasound distances by sensor index, once reported.
    pub fn us_get(&self) -> Option<Distances> {
        self.distances(SensorChannel::Us)
    }

    fn distances(&self, channel: SensorChannel) -> Option<Distances> {
        match self.core.get_sensor(channel)? {
            SensorValue::Distances(d) => Some(d),
            _ => None,
        }
    }

    /// Every sensor and device record.
    pub fn get_all_telemetry(&self) -> TelemetrySnapshot {
        self.core.snapshot()
    }

    // ─── Lights ─────────────────────────────────────────────────────

    /// Set flashlight intensity, 0..=100.
    pub fn flashlight_set(&self, intensity: i32) -> Result<(), HalError> {
        self.set_level(DeviceChannel::Flashlight, intensity)
    }

    /// Commanded flashlight intensity.
    pub fn flashlight_get(&self) -> Option<i32> {
        self.level(DeviceChannel::Flashlight)
    }

    /// Flashlight at full intensity.
    pub fn flashlight_turn_on(&self) -> Result<(), HalError> {
        self.flashlight_set(LEVEL_MAX)
    }

    /// Flashlight off.
    pub fn flashlight_turn_off(&self) -> Result<(), HalError> {
        self.flashlight_set(0)
    }

    /// Set UV flashlight intensity, 0..=100.
    pub fn uv_flashlight_set(&self, intensity: i32) -> Result<(), HalError> {
        self.set_level(DeviceChannel::UvFlashlight, intensity)
    }

    /// Commanded UV flashlight intensity.
    pub fn uv_flashlight_get(&self) -> Option<i32> {
        self.level(DeviceChannel::UvFlashlight)
    }

    /// UV flashlight at full intensity.
    pub fn uv_flashlight_turn_on(&self) -> Result<(), HalError> {
        self.uv_flashlight_set(LEVEL_MAX)
    }

    /// UV flashlight off.
    pub fn uv_flashlight_turn_off(&self) -> Result<(), HalError> {
        self.uv_flashlight_set(0)
    }

    // ─── Camera ─────────────────────────────────────────────────────

    /// Set the camera tilt, 0..=100. Angles below 2 are stored as 2.
    pub fn camera_servo_set(&self, angle: i32) -> Result<(), HalError> {
        self.set_level(DeviceChannel::CameraServo, angle)
    }

    /// Commanded camera tilt.
    pub fn camera_servo_get(&self) -> Option<i32> {
        self.level(DeviceChannel::CameraServo)
    }

    // ─── Wheels ─────────────────────────────────────────────────────

    /// Set wheel power, each side -100..=100.
    pub fn wheels_set(&self, left: i32, right: i32) -> Result<(), HalError> {
        for (side, power) in [("left", left), ("right", right)] {
            if !(-WHEEL_POWER_MAX..=WHEEL_POWER_MAX).contains(&power) {
                return Err(HalError::InvalidValue(format!(
                    "{side} wheel power must be in -{WHEEL_POWER_MAX}..={WHEEL_POWER_MAX}, got {power}"
                )));
            }
        }
        self.core
            .set_device(DeviceChannel::Wheels, DeviceValue::Wheels(WheelPower::new(left, right)))?;
        Ok(())
    }

    /// Commanded wheel power.
    pub fn wheels_get(&self) -> Option<WheelPower> {
        self.core
            .get_device(DeviceChannel::Wheels)
            .and_then(|v| v.as_wheels())
    }

    /// Both sides stopped.
    pub fn wheels_stop(&self) -> Result<(), HalError> {
        self.wheels_power(WheelPower::STOP)
    }

    /// Drive a named direction at manual power.
    pub fn wheels_direction(&self, direction: &str) -> Result<(), HalError> {
        self.drive_profile(DriveProfile::Manual, direction)
    }

    /// Drive a named direction at IR-guided power.
    pub fn wheels_direction_ir(&self, direction: &str) -> Result<(), HalError> {
        self.drive_profile(DriveProfile::Ir, direction)
    }

    /// Drive a named direction at ultrasound-guided power.
    pub fn wheels_direction_us(&self, direction: &str) -> Result<(), HalError> {
        self.drive_profile(DriveProfile::Us, direction)
    }

    /// Drive a named UV line-following direction.
    pub fn wheels_direction_uv(&self, direction: &str) -> Result<(), HalError> {
        let direction: UvDirection = direction.parse()?;
        self.wheels_power(direction.power())
    }

    /// Drive from normalized autopilot throttles, -1.0..=1.0 per side.
    ///
    /// # Returns
    /// The wheel power sent.
    pub fn drive_throttle(&self, left: f32, right: f32) -> Result<WheelPower, HalError> {
        let power = WheelPower::new(
            throttle_to_power(left, &self.drive)?,
            throttle_to_power(right, &self.drive)?,
        );
        self.wheels_power(power)?;
        Ok(power)
    }

    fn drive_profile(&self, profile: DriveProfile, direction: &str) -> Result<(), HalError> {
        let direction: Direction = direction.parse()?;
        self.wheels_power(profile.power(direction))
    }

    fn wheels_power(&self, power: WheelPower) -> Result<(), HalError> {
        self.wheels_set(power.left, power.right)
    }

    fn set_level(&self, channel: DeviceChannel, value: i32) -> Result<(), HalError> {
        if !(0..=LEVEL_MAX).contains(&value) {
            return Err(HalError::InvalidValue(format!(
                "{channel} must be in 0..={LEVEL_MAX}, got {value}"
            )));
        }
        self.core.set_device(channel, DeviceValue::Level(value))?;
        Ok(())
    }

    fn level(&self, channel: DeviceChannel) -> Option<i32> {
        self.core.get_device(channel).and_then(|v| v.as_level())
    }
}
