//! Background reader loop.
//!
//! Pulls lines from the transport, decodes them and folds each reading into
//! the state store before the next read. Malformed frames and read failures
//! are logged and counted; neither ends the loop. Only clearing the running
//! flag does, after the current read returns.

use crate::codec::parse_frame;
use crate::store::StateStore;
use autobot_common::hal::driver::{HalError, Transport};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Counters kept by the reader loop.
#[derive(Debug, Default)]
pub struct ReaderStats {
    lines: AtomicU64,
    applied: AtomicU64,
    ignored: AtomicU64,
    parse_errors: AtomicU64,
    read_errors: AtomicU64,
}

/// Point-in-time copy of [`ReaderStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStatsSnapshot {
    /// Non-empty lines read
    pub lines: u64,
    /// Frames stored
    pub applied: u64,
    /// Lines with no known mask
    pub ignored: u64,
    /// Malformed frames dropped
    pub parse_errors: u64,
    /// Failed reads
    pub read_errors: u64,
}

impl ReaderStats {
    /// Copy the counters.
    pub fn snapshot(&self) -> ReaderStatsSnapshot {
        ReaderStatsSnapshot {
            lines: self.lines.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

/// Reader loop state, moved onto its own thread by the session.
pub struct ReaderLoop {
    transport: Box<dyn Transport>,
    store: Arc<StateStore>,
    running: Arc<AtomicBool>,
    stats: Arc<ReaderStats>,
    /// Pause after a failed read before trying again
    error_pause: Duration,
}

impl ReaderLoop {
    /// Create a reader loop over `transport`.
    pub fn new(
        transport: Box<dyn Transport>,
        store: Arc<StateStore>,
        running: Arc<AtomicBool>,
        stats: Arc<ReaderStats>,
        error_pause: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            running,
            stats,
            error_pause,
        }
    }

    /// Read until the running flag is cleared.
    pub fn run(mut self) {
        info!("Reader loop started on '{}' transport", self.transport.name());

        while self.running.load(Ordering::SeqCst) {
            match self.transport.read_line() {
                Ok(line) => self.handle_line(&line),
                Err(e) => self.handle_read_error(&e),
            }
        }

        let stats = self.stats.snapshot();
        info!(
            "Reader loop stopped after {} lines ({} applied, {} ignored, {} parse errors, {} read errors)",
            stats.lines, stats.applied, stats.ignored, stats.parse_errors, stats.read_errors
        );
    }

    /// Decode one line and store the reading.
    pub fn handle_line(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.stats.lines.fetch_add(1, Ordering::Relaxed);
        trace!("<- {}", line);

        match parse_frame(line) {
            Ok(Some(reading)) => {
                match self
                    .store
                    .record_sensor(reading.channel, reading.value, Utc::now())
                {
                    Ok(changed) => {
                        self.stats.applied.fetch_add(1, Ordering::Relaxed);
                        if changed {
                            debug!("{} changed", reading.channel);
                        }
                    }
                    Err(e) => self.count_parse_error(line, &e),
                }
            }
            Ok(None) => {
                self.stats.ignored.fetch_add(1, Ordering::Relaxed);
                debug!("Ignoring line without telemetry mask: {:?}", line);
            }
            Err(e) => self.count_parse_error(line, &e),
        }
    }

    fn count_parse_error(&self, line: &str, err: &HalError) {
        let count = self.stats.parse_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if count <= 10 || count % 1000 == 0 {
            warn!("Dropping frame #{} {:?}: {}", count, line, err);
        }
    }

    fn handle_read_error(&self, err: &HalError) {
        let count = self.stats.read_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if count <= 10 || count % 1000 == 0 {
            error!("Read failure #{}: {}", count, err);
        }
        std::thread::sleep(self.error_pause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulationTransport;
    use autobot_common::hal::channel::SensorChannel;
    use autobot_common::hal::types::SensorValue;

    fn reader() -> ReaderLoop {
        let (transport, _handle) = SimulationTransport::new(Duration::from_millis(1));
        ReaderLoop::new(
            Box::new(transport),
            Arc::new(StateStore::default()),
            Arc::new(AtomicBool::new(true)),
            Arc::new(ReaderStats::default()),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn frames_are_stored() {
        let reader = reader();
        reader.handle_line("SA087E");
        assert_eq!(
            reader.store.get_sensor(SensorChannel::Battery),
            Some(SensorValue::Level(87))
        );
        assert_eq!(reader.stats.snapshot().applied, 1);
    }

    #[test]
    fn malformed_frame_keeps_previous_record() {
        let reader = reader();
        reader.handle_line("SI014012012013013E");
        let before = reader.store.sensor_record(SensorChannel::Ir).unwrap();

        reader.handle_line("SI01X012012013013E");
        let after = reader.store.sensor_record(SensorChannel::Ir).unwrap();

        assert_eq!(before, after);
        let stats = reader.stats.snapshot();
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.applied, 1);
    }

    #[test]
    fn empty_and_foreign_lines() {
        let reader = reader();
        reader.handle_line("");
        reader.handle_line("boot v1.2");
        let stats = reader.stats.snapshot();
        assert_eq!(stats.lines, 1);
        assert_eq!(stats.ignored, 1);
    }
}
