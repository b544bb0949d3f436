//! Serial port transport.
//!
//! Opens the microcontroller's UART at 8N1 without flow control. Lines are
//! `\n`-terminated; bytes of a line cut by a read timeout stay buffered and
//! are completed by the next read.

use autobot_common::hal::config::SerialConfig;
use autobot_common::hal::driver::{decode_line, ensure_ascii, HalError, Transport};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use tracing::{debug, info, warn};

/// Bytes requested from the driver per read call.
const READ_CHUNK: usize = 64;

/// Longest line kept while waiting for its terminator.
const MAX_LINE_LEN: usize = 256;

/// Serial port link to the microcontroller.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    device: String,
    /// Bytes received after the last complete line
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Open the serial port described by `config`.
    ///
    /// # Errors
    /// `HalError::DeviceUnavailable` if the port cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self, HalError> {
        let port = serialport::new(config.device.as_str(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| HalError::DeviceUnavailable(format!("{}: {}", config.device, e)))?;

        info!(
            "Opened serial port {} at {} baud (read timeout {}ms)",
            config.device, config.baud_rate, config.read_timeout_ms
        );

        Ok(Self {
            port,
            device: config.device.clone(),
            pending: Vec::with_capacity(MAX_LINE_LEN),
        })
    }

    /// Take the first complete line out of the pending buffer.
    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(decode_line(&line))
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn write(&mut self, text: &str) -> Result<usize, HalError> {
        let bytes = ensure_ascii(text)?;
        self.port
            .write_all(bytes)
            .and_then(|()| self.port.flush())
            .map_err(|e| HalError::Transport(format!("write to {} failed: {}", self.device, e)))?;
        Ok(bytes.len())
    }

    fn read_line(&mut self) -> Result<String, HalError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }

            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(String::new()),
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    if self.pending.len() > MAX_LINE_LEN && !self.pending.contains(&b'\n') {
                        warn!(
                            "Dropping {} bytes without line terminator from {}",
                            self.pending.len(),
                            self.device
                        );
                        self.pending.clear();
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(String::new()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HalError::Transport(format!(
                        "read from {} failed: {}",
                        self.device, e
                    )));
                }
            }
        }
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>, HalError> {
        let port = self
            .port
            .try_clone()
            .map_err(|e| HalError::Transport(format!("cannot clone {}: {}", self.device, e)))?;
        debug!("Cloned serial handle for {}", self.device);
        Ok(Box::new(Self {
            port,
            device: self.device.clone(),
            pending: Vec::with_capacity(MAX_LINE_LEN),
        }))
    }
}
