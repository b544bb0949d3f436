//! Thread-shared table of sensor readings and device setpoints.
//!
//! The reader thread writes sensor records, callers write device records
//! after a command is sent. Each table sits behind its own mutex so the
//! compare-and-store of a record is atomic with respect to other writers.

use autobot_common::hal::channel::{DeviceChannel, SensorChannel};
use autobot_common::hal::driver::HalError;
use autobot_common::hal::types::{ChannelRecord, DeviceValue, SensorValue, TelemetrySnapshot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::trace;

/// Current state of every channel.
#[derive(Debug)]
pub struct StateStore {
    sensors: Mutex<BTreeMap<SensorChannel, ChannelRecord<SensorValue>>>,
    devices: Mutex<BTreeMap<DeviceChannel, ChannelRecord<DeviceValue>>>,
}

impl StateStore {
    /// Create a store with every channel unset, stamped `created`.
    pub fn new(created: DateTime<Utc>) -> Self {
        let sensors = SensorChannel::ALL
            .into_iter()
            .map(|channel| (channel, ChannelRecord::new(created)))
            .collect();
        let devices = DeviceChannel::ALL
            .into_iter()
            .map(|channel| (channel, ChannelRecord::new(created)))
            .collect();

        Self {
            sensors: Mutex::new(sensors),
            devices: Mutex::new(devices),
        }
    }

    /// Current value of a sensor, `None` until its first frame.
    pub fn get_sensor(&self, channel: SensorChannel) -> Option<SensorValue> {
        self.sensors
            .lock()
            .get(&channel)
            .and_then(|record| record.value.clone())
    }

    /// Full record of a sensor.
    pub fn sensor_record(&self, channel: SensorChannel) -> Option<ChannelRecord<SensorValue>> {
        self.sensors.lock().get(&channel).cloned()
    }

    /// Current value of a sensor given by name.
    ///
    /// # Errors
    /// `HalError::UnknownChannel` for an unrecognized name.
    pub fn sensor_by_name(&self, name: &str) -> Result<Option<SensorValue>, HalError> {
        Ok(self.get_sensor(name.parse()?))
    }

    /// Current setpoint of a device, `None` until first commanded.
    pub fn get_device(&self, channel: DeviceChannel) -> Option<DeviceValue> {
        self.devices
            .lock()
            .get(&channel)
            .and_then(|record| record.value)
    }

    /// Full record of a device.
    pub fn device_record(&self, channel: DeviceChannel) -> Option<ChannelRecord<DeviceValue>> {
        self.devices.lock().get(&channel).cloned()
    }

    /// Current setpoint of a device given by name.
    ///
    /// # Errors
    /// `HalError::UnknownChannel` for an unrecognized name.
    pub fn device_by_name(&self, name: &str) -> Result<Option<DeviceValue>, HalError> {
        Ok(self.get_device(name.parse()?))
    }

    /// Store a decoded sensor value.
    ///
    /// # Returns
    /// `true` if the value changed.
    ///
    /// # Errors
    /// `HalError::InvalidShape` if `value` is not the channel's shape.
    pub fn record_sensor(
        &self,
        channel: SensorChannel,
        value: SensorValue,
        now: DateTime<Utc>,
    ) -> Result<bool, HalError> {
        if !value.fits(channel) {
            return Err(HalError::InvalidShape(format!(
                "{channel} cannot hold {value:?}"
            )));
        }
        let mut sensors = self.sensors.lock();
        let record = sensors
            .entry(channel)
            .or_insert_with(|| ChannelRecord::new(now));
        let changed = record.apply(value, now);
        trace!("{} updated (changed={})", channel, changed);
        Ok(changed)
    }

    /// Store a device setpoint.
    ///
    /// # Returns
    /// `true` if the setpoint changed.
    ///
    /// # Errors
    /// `HalError::InvalidShape` if `value` is not the channel's shape.
    pub fn record_device(
        &self,
        channel: DeviceChannel,
        value: DeviceValue,
        now: DateTime<Utc>,
    ) -> Result<bool, HalError> {
        if !value.fits(channel) {
            return Err(HalError::InvalidShape(format!(
                "{channel} cannot hold {value:?}"
            )));
        }
        let mut devices = self.devices.lock();
        let record = devices
            .entry(channel)
            .or_insert_with(|| ChannelRecord::new(now));
        Ok(record.apply(value, now))
    }

    /// Every channel's record.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            sensors: self.sensors.lock().clone(),
            devices: self.devices.lock().clone(),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobot_common::hal::types::WheelPower;
    use chrono::TimeDelta;

    #[test]
    fn starts_unset_with_creation_time() {
        let t0 = Utc::now();
        let store = StateStore::new(t0);
        for channel in SensorChannel::ALL {
            let record = store.sensor_record(channel).unwrap();
            assert_eq!(record.value, None);
            assert_eq!(record.update_time, t0);
            assert_eq!(record.last_change_time, t0);
        }
        for channel in DeviceChannel::ALL {
            assert_eq!(store.get_device(channel), None);
        }
    }

    #[test]
    fn repeated_value_keeps_change_time() {
        let t0 = Utc::now();
        let store = StateStore::new(t0);
        let t1 = t0 + TimeDelta::seconds(1);
        let t2 = t0 + TimeDelta::seconds(2);

        let value = DeviceValue::Level(100);
        assert!(store.record_device(DeviceChannel::Flashlight, value, t1).unwrap());
        assert!(!store.record_device(DeviceChannel::Flashlight, value, t2).unwrap());

        let record = store.device_record(DeviceChannel::Flashlight).unwrap();
        assert_eq!(record.value, Some(value));
        assert_eq!(record.update_time, t2);
        assert_eq!(record.last_change_time, t1);
    }

    #[test]
    fn rejects_wrong_shape() {
        let store = StateStore::default();
        assert!(matches!(
            store.record_sensor(SensorChannel::Ir, SensorValue::Level(3), Utc::now()),
            Err(HalError::InvalidShape(_))
        ));
        assert!(matches!(
            store.record_device(DeviceChannel::Wheels, DeviceValue::Level(3), Utc::now()),
            Err(HalError::InvalidShape(_))
        ));
        assert_eq!(store.get_sensor(SensorChannel::Ir), None);
    }

    #[test]
    fn lookups_by_name() {
        let store = StateStore::default();
        store
            .record_sensor(SensorChannel::Battery, SensorValue::Level(87), Utc::now())
            .unwrap();
        assert_eq!(
            store.sensor_by_name("battery").unwrap(),
            Some(SensorValue::Level(87))
        );
        assert!(matches!(
            store.sensor_by_name("compass"),
            Err(HalError::UnknownChannel(_))
        ));
        assert!(matches!(
            store.device_by_name("horn"),
            Err(HalError::UnknownChannel(_))
        ));
    }

    #[test]
    fn snapshot_covers_every_channel() {
        let store = StateStore::default();
        store
            .record_device(
                DeviceChannel::Wheels,
                DeviceValue::Wheels(WheelPower::new(10, -10)),
                Utc::now(),
            )
            .unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.sensors.len(), SensorChannel::ALL.len());
        assert_eq!(snapshot.devices.len(), DeviceChannel::ALL.len());
        assert_eq!(
            snapshot.devices[&DeviceChannel::Wheels].value,
            Some(DeviceValue::Wheels(WheelPower::new(10, -10)))
        );
    }
}
