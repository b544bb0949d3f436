//! Named wheel presets.
//!
//! Manual, IR-guided and ultrasound-guided driving share the five basic
//! directions at different power levels. UV line following adds four
//! graded turns.

use autobot_common::hal::driver::HalError;
use autobot_common::hal::types::WheelPower;
use std::fmt;
use std::str::FromStr;

/// Basic driving direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Spin left in place
    Left,
    /// Spin right in place
    Right,
    /// Straight ahead
    Forward,
    /// Straight back
    Backward,
    /// Both sides stopped
    Stop,
}

impl Direction {
    /// All directions.
    pub const ALL: [Direction; 5] = [
        Direction::Left,
        Direction::Right,
        Direction::Forward,
        Direction::Backward,
        Direction::Stop,
    ];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Stop => "stop",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                HalError::InvalidValue(format!(
                    "unknown direction '{s}', expected one of {:?}",
                    Self::ALL.map(Direction::name)
                ))
            })
    }
}

/// Power level set used for the basic directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveProfile {
    /// Full power, operator driving
    Manual,
    /// Driving guided by the infrared array
    Ir,
    /// Driving guided by the ultrasound array
    Us,
}

impl DriveProfile {
    /// Wheel power for `direction` under this profile.
    pub const fn power(self, direction: Direction) -> WheelPower {
        let (spin_slow, spin_fast, straight) = match self {
            DriveProfile::Manual => (100, 100, 100),
            DriveProfile::Ir => (90, 100, 90),
            DriveProfile::Us => (80, 90, 80),
        };
        match direction {
            Direction::Left => WheelPower::new(-spin_slow, spin_fast),
            Direction::Right => WheelPower::new(spin_slow, -spin_fast),
            Direction::Forward => WheelPower::new(straight, straight),
            Direction::Backward => WheelPower::new(-straight, -straight),
            Direction::Stop => WheelPower::STOP,
        }
    }
}

/// Direction used while following a UV line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UvDirection {
    /// Spin left in place
    Left,
    /// Spin right in place
    Right,
    /// Straight ahead
    Forward,
    /// Straight back
    Backward,
    /// Both sides stopped
    Stop,
    /// Pivot left on the left wheels
    SharplyLeft,
    /// Drift left
    SoftlyLeft,
    /// Pivot right on the right wheels
    SharplyRight,
    /// Drift right
    SoftlyRight,
}

impl UvDirection {
    /// All UV directions.
    pub const ALL: [UvDirection; 9] = [
        UvDirection::Left,
        UvDirection::Right,
        UvDirection::Forward,
        UvDirection::Backward,
        UvDirection::Stop,
        UvDirection::SharplyLeft,
        UvDirection::SoftlyLeft,
        UvDirection::SharplyRight,
        UvDirection::SoftlyRight,
    ];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            UvDirection::Left => "left",
            UvDirection::Right => "right",
            UvDirection::Forward => "forward",
            UvDirection::Backward => "backward",
            UvDirection::Stop => "stop",
            UvDirection::SharplyLeft => "sharply_left",
            UvDirection::SoftlyLeft => "softly_left",
            UvDirection::SharplyRight => "sharply_right",
            UvDirection::SoftlyRight => "softly_right",
        }
    }

    /// Wheel power for this direction.
    pub const fn power(self) -> WheelPower {
        match self {
            UvDirection::Left => WheelPower::new(-100, 100),
            UvDirection::Right => WheelPower::new(100, -100),
            UvDirection::Forward => WheelPower::new(80, 80),
            UvDirection::Backward => WheelPower::new(-80, -80),
            UvDirection::Stop => WheelPower::STOP,
            UvDirection::SharplyLeft => WheelPower::new(0, 100),
            UvDirection::SoftlyLeft => WheelPower::new(90, 100),
            UvDirection::SharplyRight => WheelPower::new(100, 0),
            UvDirection::SoftlyRight => WheelPower::new(100, 90),
        }
    }
}

impl fmt::Display for UvDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UvDirection {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                HalError::InvalidValue(format!(
                    "unknown UV direction '{s}', expected one of {:?}",
                    Self::ALL.map(UvDirection::name)
                ))
            })
    }
}
