//! Simulated microcontroller.
//!
//! Produces telemetry frames in the same format the real board sends and
//! interprets the commands it receives, so the whole session can run
//! without hardware.

use autobot_common::consts::{COMMAND_LEN, DISTANCE_SENSOR_COUNT};
use autobot_common::hal::channel::SensorChannel;
use tracing::{debug, trace};

/// Battery level reported at power-up.
const FULL_BATTERY: u32 = 100;

/// Frames between two battery decrements while the wheels turn.
const DRAIN_INTERVAL: u64 = 40;

/// Frames between two RFID tag sightings.
const TAG_INTERVAL: u64 = 25;

/// Tag reported on a sighting.
const SIMULATED_TAG: &str = "04A1B2C3";

/// Actuator state as seen by the simulated board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerOutputs {
    /// Flashlight intensity
    pub flashlight: u32,
    /// UV flashlight intensity
    pub uv_flashlight: u32,
    /// Camera servo angle
    pub camera_servo: u32,
    /// Left wheel power
    pub left: i32,
    /// Right wheel power
    pub right: i32,
}

/// Simulated board state.
#[derive(Debug, Clone)]
pub struct SimulatedPeer {
    frames: u64,
    battery: u32,
    outputs: PeerOutputs,
}

impl SimulatedPeer {
    /// Create a board with a full battery and all outputs off.
    pub fn new() -> Self {
        Self {
            frames: 0,
            battery: FULL_BATTERY,
            outputs: PeerOutputs::default(),
        }
    }

    /// Outputs last commanded.
    pub fn outputs(&self) -> PeerOutputs {
        self.outputs
    }

    /// Produce the next telemetry frame, cycling IR, US, battery, RFID.
    pub fn next_frame(&mut self) -> String {
        let tick = self.frames;
        self.frames += 1;

        if (self.outputs.left != 0 || self.outputs.right != 0)
            && tick % DRAIN_INTERVAL == 0
            && self.battery > 0
        {
            self.battery -= 1;
        }

        let channel = SensorChannel::ALL[(tick % SensorChannel::ALL.len() as u64) as usize];
        let payload = match channel {
            SensorChannel::Ir => distances(tick, 10, 30),
            SensorChannel::Us => distances(tick, 20, 250),
            SensorChannel::Battery => format!("{:03}", self.battery),
            SensorChannel::Rfid => {
                if (tick / SensorChannel::ALL.len() as u64) % TAG_INTERVAL == 0 {
                    SIMULATED_TAG.to_string()
                } else {
                    String::new()
                }
            }
        };
        let frame = format!("{}{}E", channel.mask(), payload);
        trace!("Simulated board sends {}", frame);
        frame
    }

    /// Interpret a command frame. Unknown frames are ignored.
    pub fn apply_command(&mut self, frame: &str) {
        if frame.len() != COMMAND_LEN || !frame.is_ascii() {
            debug!("Simulated board ignores {:?}", frame);
            return;
        }

        match &frame[..3] {
            // One frame carries both lights: UV in 5..8, white in 8..11.
            "ZSU" => {
                if let (Some(uv), Some(white)) = (field(frame, 5), field(frame, 8)) {
                    self.outputs.uv_flashlight = uv;
                    self.outputs.flashlight = white;
                }
            }
            "ZSS" => {
                if let Some(angle) = field(frame, 3) {
                    self.outputs.camera_servo = angle;
                }
            }
            "ZST" => {
                if let (Some(left), Some(right)) = (signed(frame, 4), signed(frame, 10)) {
                    self.outputs.left = left;
                    self.outputs.right = right;
                }
            }
            _ => debug!("Simulated board ignores {:?}", frame),
        }
    }
}

impl Default for SimulatedPeer {
    fn default() -> Self {
        Self::new()
    }
}

/// Five distances sweeping between `min` and `max`.
fn distances(tick: u64, min: u64, max: u64) -> String {
    let span = max - min;
    (0..DISTANCE_SENSOR_COUNT as u64)
        .map(|idx| {
            let phase = (tick + idx * 7) % (2 * span);
            let offset = if phase < span { phase } else { 2 * span - phase };
            format!("{:03}", min + offset)
        })
        .collect()
}

/// Three-digit field at `start`.
fn field(frame: &str, start: usize) -> Option<u32> {
    frame.get(start..start + 3)?.parse().ok()
}

/// Sign character at `start`, magnitude three characters after it.
fn signed(frame: &str, start: usize) -> Option<i32> {
    let magnitude = field(frame, start + 3)? as i32;
    match frame.as_bytes().get(start)? {
        b'+' => Some(magnitude),
        b'-' => Some(-magnitude),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{parse_frame, Command};

    #[test]
    fn frames_decode_with_the_real_parser() {
        let mut peer = SimulatedPeer::new();
        for _ in 0..40 {
            let frame = peer.next_frame();
            let reading = parse_frame(&frame).unwrap().unwrap();
            assert!(reading.value.fits(reading.channel));
        }
    }

    #[test]
    fn commands_update_outputs() {
        let mut peer = SimulatedPeer::new();
        let frame = Command::Wheels { left: -40, right: 75 }.encode().unwrap();
        peer.apply_command(&frame);
        let frame = Command::CameraServo(90).encode().unwrap();
        peer.apply_command(&frame);
        let frame = Command::UvFlashlight(30).encode().unwrap();
        peer.apply_command(&frame);

        let outputs = peer.outputs();
        assert_eq!((outputs.left, outputs.right), (-40, 75));
        assert_eq!(outputs.camera_servo, 90);
        assert_eq!(outputs.uv_flashlight, 30);
        assert_eq!(outputs.flashlight, 0);
    }

    #[test]
    fn battery_drains_while_driving() {
        let mut peer = SimulatedPeer::new();
        peer.apply_command(&Command::Wheels { left: 50, right: 50 }.encode().unwrap());
        for _ in 0..(DRAIN_INTERVAL * 3) {
            peer.next_frame();
        }
        assert!(peer.battery < FULL_BATTERY);
    }

    #[test]
    fn garbage_is_ignored() {
        let mut peer = SimulatedPeer::new();
        peer.apply_command("hello");
        peer.apply_command("ZSTX+00abc+00100E");
        assert_eq!(peer.outputs(), PeerOutputs::default());
    }
}
