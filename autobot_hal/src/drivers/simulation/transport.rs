//! In-process transport backed by a simulated board.
//!
//! All handles cloned from one `SimulationTransport` share the same link.
//! A `SimulationHandle` gives tests the other end of the wire: inject
//! inbound lines, inspect written commands, and make the next read or write
//! fail.

use super::peer::{PeerOutputs, SimulatedPeer};
use autobot_common::hal::driver::{ensure_ascii, HalError, Transport};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared state of one simulated link.
struct SimLink {
    /// Lines waiting to be read
    inbound: Mutex<VecDeque<String>>,
    /// Signalled when a line is queued
    arrived: Condvar,
    /// Every text written, in order
    sent: Mutex<Vec<String>>,
    /// Board answering commands and generating telemetry, if enabled
    peer: Mutex<Option<SimulatedPeer>>,
    /// How long `read_line` waits for a line
    read_timeout: Duration,
    /// Successful writes left before one fails, if a failure is armed
    write_failure: Mutex<Option<usize>>,
    fail_next_read: AtomicBool,
}

/// Simulated link to the microcontroller.
pub struct SimulationTransport {
    link: Arc<SimLink>,
}

impl SimulationTransport {
    /// Create a link without a board: only injected lines are read.
    pub fn new(read_timeout: Duration) -> (Self, SimulationHandle) {
        Self::build(read_timeout, None)
    }

    /// Create a link whose board emits telemetry whenever no injected line
    /// is waiting.
    pub fn with_peer(read_timeout: Duration) -> (Self, SimulationHandle) {
        Self::build(read_timeout, Some(SimulatedPeer::default()))
    }

    fn build(read_timeout: Duration, peer: Option<SimulatedPeer>) -> (Self, SimulationHandle) {
        let link = Arc::new(SimLink {
            inbound: Mutex::new(VecDeque::new()),
            arrived: Condvar::new(),
            sent: Mutex::new(Vec::new()),
            peer: Mutex::new(peer),
            read_timeout,
            write_failure: Mutex::new(None),
            fail_next_read: AtomicBool::new(false),
        });
        let handle = SimulationHandle {
            link: Arc::clone(&link),
        };
        (Self { link }, handle)
    }
}

impl Transport for SimulationTransport {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn write(&mut self, text: &str) -> Result<usize, HalError> {
        let bytes = ensure_ascii(text)?;
        {
            let mut countdown = self.link.write_failure.lock();
            match *countdown {
                Some(0) => {
                    *countdown = None;
                    return Err(HalError::Transport("simulated write failure".to_string()));
                }
                Some(left) => *countdown = Some(left - 1),
                None => {}
            }
        }
        self.link.sent.lock().push(text.to_string());
        if let Some(peer) = self.link.peer.lock().as_mut() {
            peer.apply_command(text);
        }
        Ok(bytes.len())
    }

    fn read_line(&mut self) -> Result<String, HalError> {
        if self.link.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(HalError::Transport("simulated read failure".to_string()));
        }

        let mut inbound = self.link.inbound.lock();
        if inbound.is_empty() {
            self.link
                .arrived
                .wait_for(&mut inbound, self.link.read_timeout);
        }
        if let Some(line) = inbound.pop_front() {
            return Ok(line);
        }
        // Board telemetry paces itself at one frame per read timeout.
        Ok(self
            .link
            .peer
            .lock()
            .as_mut()
            .map(SimulatedPeer::next_frame)
            .unwrap_or_default())
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>, HalError> {
        Ok(Box::new(Self {
            link: Arc::clone(&self.link),
        }))
    }
}

/// Test-side end of a simulated link.
#[derive(Clone)]
pub struct SimulationHandle {
    link: Arc<SimLink>,
}

impl SimulationHandle {
    /// Queue a line for the reader.
    pub fn push_line(&self, line: &str) {
        self.link.inbound.lock().push_back(line.to_string());
        self.link.arrived.notify_all();
    }

    /// Lines queued but not read yet.
    pub fn pending_lines(&self) -> usize {
        self.link.inbound.lock().len()
    }

    /// Every text written so far.
    pub fn sent(&self) -> Vec<String> {
        self.link.sent.lock().clone()
    }

    /// Forget written texts.
    pub fn clear_sent(&self) {
        self.link.sent.lock().clear();
    }

    /// Make the next write fail with `HalError::Transport`.
    pub fn fail_next_write(&self) {
        self.fail_write_after(0);
    }

    /// Let `successes` writes through, then fail the one after them.
    pub fn fail_write_after(&self, successes: usize) {
        *self.link.write_failure.lock() = Some(successes);
    }

    /// Make the next read fail with `HalError::Transport`.
    pub fn fail_next_read(&self) {
        self.link.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Outputs of the simulated board, if the link has one.
    pub fn peer_outputs(&self) -> Option<PeerOutputs> {
        self.link.peer.lock().as_ref().map(SimulatedPeer::outputs)
    }
}
