//! Hardware session.
//!
//! `HalCore` owns the link to the microcontroller, the state store and the
//! reader thread. Commands are written from the caller's thread on one
//! transport handle while the reader thread blocks on a cloned handle.

use crate::codec::Command;
use crate::driver_registry::TransportRegistry;
use crate::reader::{ReaderLoop, ReaderStats, ReaderStatsSnapshot};
use crate::store::StateStore;
use autobot_common::consts::{COMMAND_REPEAT_COUNT, COMMAND_REPEAT_DELAY};
use autobot_common::hal::channel::{DeviceChannel, SensorChannel};
use autobot_common::hal::config::SerialConfig;
use autobot_common::hal::driver::{HalError, Transport};
use autobot_common::hal::types::{DeviceValue, SensorValue, TelemetrySnapshot};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hardware session: transport, state store and reader thread.
pub struct HalCore {
    /// Telemetry and setpoints
    store: Arc<StateStore>,
    /// Handle used for commands; the lock spans both copies of a command
    writer: Mutex<Box<dyn Transport>>,
    /// Handle handed to the reader thread on start
    reader_transport: Mutex<Option<Box<dyn Transport>>>,
    /// Reader thread, once started
    reader: Mutex<Option<JoinHandle<()>>>,
    /// Running flag for reader loop control
    running: Arc<AtomicBool>,
    /// Set once by `shutdown`
    closed: AtomicBool,
    /// Reader counters
    stats: Arc<ReaderStats>,
    /// Reader pause after a failed read
    error_pause: Duration,
}

impl HalCore {
    /// Create a session over an open transport.
    ///
    /// # Arguments
    /// * `transport` - Open link to the microcontroller
    /// * `config` - Serial parameters; the read timeout paces read-error retries
    /// * `autostart` - Start the reader thread immediately
    ///
    /// # Errors
    /// Returns error if the transport cannot be cloned for the reader or the
    /// reader thread cannot be spawned.
    pub fn new(
        transport: Box<dyn Transport>,
        config: &SerialConfig,
        autostart: bool,
    ) -> Result<Self, HalError> {
        let reader_transport = transport.try_clone()?;
        info!(
            "HalCore created on '{}' transport (read_timeout={}ms)",
            transport.name(),
            config.read_timeout_ms
        );

        let core = Self {
            store: Arc::new(StateStore::new(Utc::now())),
            writer: Mutex::new(transport),
            reader_transport: Mutex::new(Some(reader_transport)),
            reader: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
            closed: AtomicBool::new(false),
            stats: Arc::new(ReaderStats::default()),
            error_pause: config.read_timeout(),
        };

        if autostart {
            core.start()?;
        }
        Ok(core)
    }

    /// Open the named transport from `registry` and create a session on it.
    ///
    /// # Errors
    /// `HalError::DriverNotFound` or the transport's open error, otherwise as
    /// [`HalCore::new`].
    pub fn open(
        registry: &TransportRegistry,
        transport_name: &str,
        config: &SerialConfig,
        autostart: bool,
    ) -> Result<Self, HalError> {
        let transport = registry.open(transport_name, config)?;
        Self::new(transport, config, autostart)
    }

    /// Start the reader thread.
    ///
    /// # Errors
    /// `HalError::NotRunning` if the reader was already started or the
    /// session is shut down.
    pub fn start(&self) -> Result<(), HalError> {
        self.ensure_open()?;
        let transport = self
            .reader_transport
            .lock()
            .take()
            .ok_or_else(|| HalError::NotRunning("reader already started".to_string()))?;

        self.running.store(true, Ordering::SeqCst);
        let reader = ReaderLoop::new(
            transport,
            Arc::clone(&self.store),
            Arc::clone(&self.running),
            Arc::clone(&self.stats),
            self.error_pause,
        );
        let handle = thread::Builder::new()
            .name("autobot-reader".to_string())
            .spawn(move || reader.run())
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                HalError::Transport(format!("failed to spawn reader thread: {e}"))
            })?;

        *self.reader.lock() = Some(handle);
        Ok(())
    }

    /// Ask the reader thread to stop after its current read.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Stop the reader, wait for it and close the session.
    ///
    /// Further commands fail with `HalError::NotRunning`. Calling this more
    /// than once is a no-op.
    pub fn shutdown(&self) -> Result<(), HalError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Shutdown requested");
        self.stop();

        if let Some(handle) = self.reader.lock().take() {
            if handle.join().is_err() {
                warn!("Reader thread panicked");
            }
        }

        let stats = self.stats.snapshot();
        info!(
            "HalCore stopped: {} lines, {} applied, {} parse errors, {} read errors",
            stats.lines, stats.applied, stats.parse_errors, stats.read_errors
        );
        Ok(())
    }

    /// Validate, transmit and store a device setpoint.
    ///
    /// # Returns
    /// The stored setpoint, after normalization (servo floor).
    ///
    /// # Errors
    /// - `HalError::InvalidShape` / `HalError::InvalidValue` before anything is sent
    /// - `HalError::Transport` if a write fails; the setpoint is left unchanged
    /// - `HalError::NotRunning` after shutdown
    pub fn set_device(
        &self,
        channel: DeviceChannel,
        value: DeviceValue,
    ) -> Result<DeviceValue, HalError> {
        let command = Command::for_device(channel, value)?;
        self.send(&command)
    }

    /// [`HalCore::set_device`] with the device given by name.
    ///
    /// # Errors
    /// `HalError::InvalidDevice` for an unknown name, otherwise as
    /// [`HalCore::set_device`].
    pub fn set_device_by_name(
        &self,
        name: &str,
        value: DeviceValue,
    ) -> Result<DeviceValue, HalError> {
        let command = Command::for_device_name(name, value)?;
        self.send(&command)
    }

    /// Transmit a command and record its setpoint.
    pub fn send(&self, command: &Command) -> Result<DeviceValue, HalError> {
        self.ensure_open()?;
        let frame = command.encode()?;

        // Setpoints are stored in the order their frames went out.
        let mut writer = self.writer.lock();
        for attempt in 0..COMMAND_REPEAT_COUNT {
            if attempt > 0 {
                thread::sleep(COMMAND_REPEAT_DELAY);
            }
            writer.write(&frame)?;
        }
        debug!("-> {} ({:?})", frame, command);

        let setpoint = command.setpoint();
        self.store
            .record_device(command.channel(), setpoint, Utc::now())?;
        drop(writer);
        Ok(setpoint)
    }

    /// Latest value of a sensor.
    pub fn get_sensor(&self, channel: SensorChannel) -> Option<SensorValue> {
        self.store.get_sensor(channel)
    }

    /// Latest setpoint of a device.
    pub fn get_device(&self, channel: DeviceChannel) -> Option<DeviceValue> {
        self.store.get_device(channel)
    }

    /// Latest value of a sensor given by name.
    pub fn sensor_by_name(&self, name: &str) -> Result<Option<SensorValue>, HalError> {
        self.store.sensor_by_name(name)
    }

    /// Latest setpoint of a device given by name.
    pub fn device_by_name(&self, name: &str) -> Result<Option<DeviceValue>, HalError> {
        self.store.device_by_name(name)
    }

    /// Every channel's record.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.store.snapshot()
    }

    /// Shared state store.
    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    /// Reader counters.
    pub fn stats(&self) -> ReaderStatsSnapshot {
        self.stats.snapshot()
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Whether the reader loop is meant to be running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), HalError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HalError::NotRunning("session is shut down".to_string()));
        }
        Ok(())
    }
}

impl Drop for HalCore {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Shutdown on drop failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::{SimulationHandle, SimulationTransport};
    use autobot_common::hal::types::WheelPower;

    fn session(autostart: bool) -> (HalCore, SimulationHandle) {
        let (transport, handle) = SimulationTransport::new(Duration::from_millis(5));
        let config = SerialConfig {
            read_timeout_ms: 5,
            ..SerialConfig::default()
        };
        let core = HalCore::new(Box::new(transport), &config, autostart).unwrap();
        (core, handle)
    }

    #[test]
    fn command_is_sent_twice_then_stored() {
        let (core, handle) = session(false);
        let stored = core
            .set_device(DeviceChannel::Flashlight, DeviceValue::Level(40))
            .unwrap();
        assert_eq!(stored, DeviceValue::Level(40));
        assert_eq!(handle.sent(), vec!["ZSU++00004000000E"; 2]);
        assert_eq!(
            core.get_device(DeviceChannel::Flashlight),
            Some(DeviceValue::Level(40))
        );
    }

    #[test]
    fn rejected_value_sends_nothing() {
        let (core, handle) = session(false);
        let err = core
            .set_device(DeviceChannel::Wheels, DeviceValue::Level(10))
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidShape(_)));
        assert!(handle.sent().is_empty());
        assert_eq!(core.get_device(DeviceChannel::Wheels), None);
    }

    #[test]
    fn failed_write_keeps_setpoint() {
        let (core, handle) = session(false);
        core.set_device(DeviceChannel::Wheels, DeviceValue::Wheels(WheelPower::new(10, 10)))
            .unwrap();

        handle.fail_next_write();
        let err = core
            .set_device(DeviceChannel::Wheels, DeviceValue::Wheels(WheelPower::STOP))
            .unwrap_err();
        assert!(matches!(err, HalError::Transport(_)));
        assert_eq!(
            core.get_device(DeviceChannel::Wheels),
            Some(DeviceValue::Wheels(WheelPower::new(10, 10)))
        );
    }

    #[test]
    fn failure_on_second_copy_keeps_setpoint() {
        let (core, handle) = session(false);
        core.set_device(DeviceChannel::Flashlight, DeviceValue::Level(30))
            .unwrap();
        handle.clear_sent();

        handle.fail_write_after(1);
        let err = core
            .set_device(DeviceChannel::Flashlight, DeviceValue::Level(60))
            .unwrap_err();
        assert!(matches!(err, HalError::Transport(_)));
        assert_eq!(handle.sent(), vec!["ZSU++00006000000E"]);
        assert_eq!(
            core.get_device(DeviceChannel::Flashlight),
            Some(DeviceValue::Level(30))
        );
    }

    #[test]
    fn concurrent_setters_store_last_frame_sent() {
        let (core, handle) = session(false);
        thread::scope(|s| {
            for level in [11, 77] {
                let core = &core;
                s.spawn(move || {
                    for _ in 0..20 {
                        core.set_device(DeviceChannel::Flashlight, DeviceValue::Level(level))
                            .unwrap();
                    }
                });
            }
        });

        let sent = handle.sent();
        assert_eq!(sent.len(), 80);
        for pair in sent.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
        let last: i32 = sent.last().unwrap()[8..11].parse().unwrap();
        assert_eq!(
            core.get_device(DeviceChannel::Flashlight),
            Some(DeviceValue::Level(last))
        );
    }

    #[test]
    fn unknown_device_name() {
        let (core, _handle) = session(false);
        let err = core
            .set_device_by_name("horn", DeviceValue::Level(1))
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidDevice(_)));
    }

    #[test]
    fn start_twice_is_rejected() {
        let (core, _handle) = session(true);
        assert!(core.is_running());
        assert!(matches!(core.start(), Err(HalError::NotRunning(_))));
        core.shutdown().unwrap();
        assert!(!core.is_running());
    }

    #[test]
    fn commands_after_shutdown_fail() {
        let (core, handle) = session(true);
        core.shutdown().unwrap();
        core.shutdown().unwrap();
        let err = core
            .set_device(DeviceChannel::CameraServo, DeviceValue::Level(30))
            .unwrap_err();
        assert!(matches!(err, HalError::NotRunning(_)));
        assert!(handle.sent().is_empty());
    }
}
