//! HAL transport trait and error types.
//!
//! This module defines:
//! - `Transport` trait - Interface for pluggable links to the microcontroller
//! - `HalError` enum - Error types for HAL operations
//! - `TransportFactory` type alias - Factory function type

use crate::config::ConfigError;
use crate::hal::config::SerialConfig;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// The link could not be opened
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Read or write failed on an open link
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed inbound frame
    #[error("Parse error: {0}")]
    Parse(String),

    /// Input outside its documented range
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Unrecognized sensor or device name on a lookup
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Unrecognized device name on a set operation
    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    /// Value shape does not match the channel
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Transport driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Session is not in a state that allows the operation
    #[error("Not running: {0}")]
    NotRunning(String),
}

impl From<ConfigError> for HalError {
    fn from(err: ConfigError) -> Self {
        HalError::ConfigError(err.to_string())
    }
}

/// Factory function type for opening a transport.
pub type TransportFactory = fn(&SerialConfig) -> Result<Box<dyn Transport>, HalError>;

/// Trait defining a line-oriented link to the robot's microcontroller.
///
/// # Lifecycle
///
/// 1. Factory opens the link (`DeviceUnavailable` on failure)
/// 2. `try_clone()` hands an independent handle to the reader thread
/// 3. `read_line()` / `write()` until the session shuts down
///
/// # Timing Contracts
///
/// | Operation | Blocking |
/// |-----------|----------|
/// | `read_line()` | up to the driver read timeout |
/// | `write()` | until the bytes are handed to the driver |
pub trait Transport: Send {
    /// Returns the driver's unique identifier (e.g., "serial", "simulation").
    fn name(&self) -> &'static str;

    /// Encode `text` as single-byte characters and write it.
    ///
    /// # Returns
    /// Number of bytes written.
    ///
    /// # Errors
    /// `HalError::Transport` if the text is not ASCII or the write fails.
    fn write(&mut self, text: &str) -> Result<usize, HalError>;

    /// Read one line, without its trailing CR/LF.
    ///
    /// Invalid byte sequences are dropped. Returns an empty string when no
    /// complete line arrived before the read timeout.
    ///
    /// # Errors
    /// `HalError::Transport` if the underlying read fails.
    fn read_line(&mut self) -> Result<String, HalError>;

    /// Open an independent handle to the same link.
    fn try_clone(&self) -> Result<Box<dyn Transport>, HalError>;
}

/// Reject text that cannot go on the wire byte-for-byte.
pub fn ensure_ascii(text: &str) -> Result<&[u8], HalError> {
    if text.is_ascii() {
        Ok(text.as_bytes())
    } else {
        Err(HalError::Transport(format!(
            "refusing to send non-ASCII text {text:?}"
        )))
    }
}

/// Decode raw line bytes, dropping invalid UTF-8 sequences and the
/// trailing CR/LF.
pub fn decode_line(bytes: &[u8]) -> String {
    let mut text: String = bytes.utf8_chunks().map(|chunk| chunk.valid()).collect();
    let trimmed = text.trim_end_matches(['\r', '\n']).len();
    text.truncate(trimmed);
    text
}
