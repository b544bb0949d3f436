//! Throttle mixing for autopilot input.

use autobot_common::consts::WHEEL_POWER_MAX;
use autobot_common::hal::config::DriveConfig;
use autobot_common::hal::driver::HalError;
use tracing::warn;

/// Map a normalized throttle (-1.0..=1.0) onto wheel power.
///
/// Out-of-range throttles are clamped, magnitudes within the dead band
/// become zero, and the rest is scaled by `max_duty` and truncated toward
/// zero.
///
/// # Errors
/// `HalError::InvalidValue` for NaN.
pub fn throttle_to_power(throttle: f32, drive: &DriveConfig) -> Result<i32, HalError> {
    if throttle.is_nan() {
        return Err(HalError::InvalidValue("throttle is NaN".to_string()));
    }
    let clamped = if (-1.0..=1.0).contains(&throttle) {
        throttle
    } else {
        warn!("Throttle {} out of range, clamping", throttle);
        throttle.clamp(-1.0, 1.0)
    };

    if clamped.abs() <= drive.zero_throttle {
        return Ok(0);
    }
    // Truncation keeps the result within the power range.
    Ok((clamped * drive.max_duty * WHEEL_POWER_MAX as f32) as i32)
}
