//! HAL value and record types.
//!
//! - `SensorValue` - decoded telemetry value
//! - `DeviceValue` - device setpoint
//! - `ChannelRecord` - value plus update / last-change timestamps
//! - `TelemetrySnapshot` - every channel's record, for export

use crate::hal::channel::{DeviceChannel, SensorChannel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Distance readings in centimeters keyed by sensor position (0 = leftmost).
pub type Distances = BTreeMap<u8, u16>;

/// Decoded value of a sensor channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    /// IR / US distance array
    Distances(Distances),
    /// Battery level (units defined by the microcontroller)
    Level(u32),
    /// RFID tag payload, empty when no tag is present
    Tag(String),
}

impl SensorValue {
    /// Whether this value has the shape `channel` reports.
    pub fn fits(&self, channel: SensorChannel) -> bool {
        matches!(
            (channel, self),
            (SensorChannel::Ir | SensorChannel::Us, SensorValue::Distances(_))
                | (SensorChannel::Battery, SensorValue::Level(_))
                | (SensorChannel::Rfid, SensorValue::Tag(_))
        )
    }

    /// Borrow the distance array, if this is one.
    pub fn as_distances(&self) -> Option<&Distances> {
        match self {
            SensorValue::Distances(d) => Some(d),
            _ => None,
        }
    }

    /// The scalar level, if this is one.
    pub fn as_level(&self) -> Option<u32> {
        match self {
            SensorValue::Level(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the tag text, if this is one.
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            SensorValue::Tag(t) => Some(t),
            _ => None,
        }
    }
}

/// Left / right power of the differential drive, each -100..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WheelPower {
    /// Left side power
    pub left: i32,
    /// Right side power
    pub right: i32,
}

impl WheelPower {
    /// Create a wheel power pair.
    pub const fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Both sides stopped.
    pub const STOP: WheelPower = WheelPower::new(0, 0);
}

/// Setpoint of a device channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeviceValue {
    /// Intensity or angle, 0..=100
    Level(i32),
    /// Wheel power pair
    Wheels(WheelPower),
}

impl DeviceValue {
    /// Whether this value has the shape `channel` accepts.
    pub fn fits(&self, channel: DeviceChannel) -> bool {
        match channel {
            DeviceChannel::Wheels => matches!(self, DeviceValue::Wheels(_)),
            _ => matches!(self, DeviceValue::Level(_)),
        }
    }

    /// The scalar level, if this is one.
    pub fn as_level(&self) -> Option<i32> {
        match self {
            DeviceValue::Level(v) => Some(*v),
            DeviceValue::Wheels(_) => None,
        }
    }

    /// The wheel pair, if this is one.
    pub fn as_wheels(&self) -> Option<WheelPower> {
        match self {
            DeviceValue::Wheels(w) => Some(*w),
            DeviceValue::Level(_) => None,
        }
    }
}

/// Current value of a channel with its timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRecord<T> {
    /// Current value, `None` until the first update
    pub value: Option<T>,
    /// Time of the last accepted update
    pub update_time: DateTime<Utc>,
    /// Time the value last changed
    pub last_change_time: DateTime<Utc>,
}

impl<T: PartialEq> ChannelRecord<T> {
    /// Create an unset record stamped with the session start time.
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            value: None,
            update_time: created,
            last_change_time: created,
        }
    }

    /// Store `value` at `now`.
    ///
    /// The update time always moves; the last-change time moves only when
    /// `value` differs from the stored one.
    ///
    /// # Returns
    /// `true` if the value changed.
    pub fn apply(&mut self, value: T, now: DateTime<Utc>) -> bool {
        let changed = self.value.as_ref() != Some(&value);
        if changed {
            self.last_change_time = now;
        }
        self.update_time = now;
        self.value = Some(value);
        changed
    }
}

/// Every channel's record at one point in time.
///
/// Serializes to a flat JSON object keyed by channel name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Sensor records
    #[serde(flatten)]
    pub sensors: BTreeMap<SensorChannel, ChannelRecord<SensorValue>>,
    /// Device records
    #[serde(flatten)]
    pub devices: BTreeMap<DeviceChannel, ChannelRecord<DeviceValue>>,
}
