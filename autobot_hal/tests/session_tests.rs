//! Reader loop and session integration tests.
//!
//! A `HalCore` runs its reader thread against a simulated link; lines are
//! injected through the `SimulationHandle` and the store is polled until
//! the reader has consumed them.

use autobot_common::hal::channel::{DeviceChannel, SensorChannel};
use autobot_common::hal::config::SerialConfig;
use autobot_common::hal::driver::HalError;
use autobot_common::hal::types::{Distances, SensorValue};
use autobot_hal::{HalCore, SimulationHandle, SimulationTransport, TransportRegistry};
use std::time::{Duration, Instant};

const READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Helper: session with a running reader on an empty simulated link.
fn running_session() -> (HalCore, SimulationHandle) {
    let (transport, handle) = SimulationTransport::new(READ_TIMEOUT);
    let config = SerialConfig {
        read_timeout_ms: READ_TIMEOUT.as_millis() as u64,
        ..SerialConfig::default()
    };
    let core = HalCore::new(Box::new(transport), &config, true).expect("session");
    (core, handle)
}

/// Helper: wait until `done` holds or fail after two seconds.
fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for reader");
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Helper: wait until the reader has finished with `lines` lines.
fn drain(core: &HalCore, handle: &SimulationHandle, lines: u64) {
    wait_until(|| {
        let stats = core.stats();
        handle.pending_lines() == 0 && stats.applied + stats.ignored + stats.parse_errors >= lines
    });
}

#[test]
fn test_ir_frame_is_decoded_by_index() {
    let (core, handle) = running_session();
    handle.push_line("SI014012012013013E");
    drain(&core, &handle, 1);

    let expected: Distances = [(0, 14), (1, 12), (2, 12), (3, 13), (4, 13)].into();
    assert_eq!(
        core.get_sensor(SensorChannel::Ir),
        Some(SensorValue::Distances(expected))
    );
}

#[test]
fn test_us_battery_and_rfid_frames() {
    let (core, handle) = running_session();
    handle.push_line("SU175065023048047E");
    handle.push_line("SA087E");
    handle.push_line("SF04E1B2E");
    drain(&core, &handle, 3);

    let us = core.get_sensor(SensorChannel::Us).unwrap();
    assert_eq!(us.as_distances().unwrap().get(&0), Some(&175));
    assert_eq!(us.as_distances().unwrap().get(&4), Some(&47));
    assert_eq!(core.get_sensor(SensorChannel::Battery), Some(SensorValue::Level(87)));
    assert_eq!(
        core.get_sensor(SensorChannel::Rfid),
        Some(SensorValue::Tag("04E1B2".to_string()))
    );
}

#[test]
fn test_malformed_line_is_skipped_and_reading_continues() {
    let (core, handle) = running_session();
    handle.push_line("SA050E");
    drain(&core, &handle, 1);
    let before = core.store().sensor_record(SensorChannel::Battery).unwrap();

    handle.push_line("SAxyzE");
    handle.push_line("SI0140120E");
    drain(&core, &handle, 3);
    assert_eq!(
        core.store().sensor_record(SensorChannel::Battery).unwrap(),
        before
    );
    assert_eq!(core.get_sensor(SensorChannel::Ir), None);

    handle.push_line("SA049E");
    drain(&core, &handle, 4);
    assert_eq!(core.get_sensor(SensorChannel::Battery), Some(SensorValue::Level(49)));

    let stats = core.stats();
    assert_eq!(stats.parse_errors, 2);
    assert_eq!(stats.applied, 2);
}

#[test]
fn test_foreign_lines_are_ignored() {
    let (core, handle) = running_session();
    handle.push_line("X");
    handle.push_line("boot ok");
    handle.push_line("SA010E");
    drain(&core, &handle, 3);

    let stats = core.stats();
    assert_eq!(stats.ignored, 2);
    assert_eq!(stats.parse_errors, 0);
    assert_eq!(core.get_sensor(SensorChannel::Battery), Some(SensorValue::Level(10)));
}

#[test]
fn test_read_failure_does_not_stop_reader() {
    let (core, handle) = running_session();
    handle.fail_next_read();
    wait_until(|| core.stats().read_errors == 1);

    handle.push_line("SA033E");
    drain(&core, &handle, 1);
    assert_eq!(core.get_sensor(SensorChannel::Battery), Some(SensorValue::Level(33)));
    assert!(core.is_running());
}

#[test]
fn test_repeated_frame_keeps_change_time() {
    let (core, handle) = running_session();
    handle.push_line("SA087E");
    drain(&core, &handle, 1);
    let first = core.store().sensor_record(SensorChannel::Battery).unwrap();

    std::thread::sleep(Duration::from_millis(5));
    handle.push_line("SA087E");
    drain(&core, &handle, 2);
    let second = core.store().sensor_record(SensorChannel::Battery).unwrap();

    assert_eq!(second.last_change_time, first.last_change_time);
    assert!(second.update_time > first.update_time);

    handle.push_line("SA086E");
    drain(&core, &handle, 3);
    let third = core.store().sensor_record(SensorChannel::Battery).unwrap();
    assert!(third.last_change_time > first.last_change_time);
}

#[test]
fn test_unset_channels_and_name_lookup() {
    let (core, _handle) = running_session();
    assert_eq!(core.get_sensor(SensorChannel::Rfid), None);
    assert_eq!(core.get_device(DeviceChannel::Wheels), None);
    assert_eq!(core.sensor_by_name("battery"), Ok(None));
    assert!(matches!(
        core.sensor_by_name("lidar"),
        Err(HalError::UnknownChannel(_))
    ));
    assert!(matches!(
        core.device_by_name("horn"),
        Err(HalError::UnknownChannel(_))
    ));
}

#[test]
fn test_snapshot_serializes_every_channel() {
    let (core, handle) = running_session();
    handle.push_line("SA087E");
    drain(&core, &handle, 1);

    let json = serde_json::to_value(core.snapshot()).unwrap();
    let object = json.as_object().unwrap();
    for key in [
        "IR", "US", "BATTERY", "RFID", "FLASHLIGHT", "UV_FLASHLIGHT", "CAMERA_SERVO", "WHEELS",
    ] {
        assert!(object.contains_key(key), "missing {key}");
    }
    assert_eq!(json["BATTERY"]["value"], 87);
    assert!(json["IR"]["value"].is_null());
}

#[test]
fn test_deferred_start() {
    let (transport, handle) = SimulationTransport::new(READ_TIMEOUT);
    let core = HalCore::new(Box::new(transport), &SerialConfig::default(), false).unwrap();
    assert!(!core.is_running());

    handle.push_line("SA001E");
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(handle.pending_lines(), 1);

    core.start().unwrap();
    drain(&core, &handle, 1);
    assert_eq!(core.get_sensor(SensorChannel::Battery), Some(SensorValue::Level(1)));
}

#[test]
fn test_shutdown_joins_reader_promptly() {
    let (core, _handle) = running_session();
    let started = Instant::now();
    core.shutdown().unwrap();
    assert!(!core.is_running());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_open_through_registry() {
    let registry = TransportRegistry::with_builtin();
    let config = SerialConfig {
        read_timeout_ms: 2,
        ..SerialConfig::default()
    };
    let core = HalCore::open(&registry, "simulation", &config, true).unwrap();
    wait_until(|| core.get_sensor(SensorChannel::Battery).is_some());
    core.shutdown().unwrap();

    assert!(matches!(
        HalCore::open(&registry, "can", &config, true),
        Err(HalError::DriverNotFound(_))
    ));
}

#[test]
fn test_missing_serial_device_is_unavailable() {
    let registry = TransportRegistry::with_builtin();
    let config = SerialConfig {
        device: "/dev/autobot-does-not-exist".to_string(),
        ..SerialConfig::default()
    };
    assert!(matches!(
        HalCore::open(&registry, "serial", &config, true),
        Err(HalError::DeviceUnavailable(_))
    ));
}
