//! Inbound telemetry frame decoding.
//!
//! ```text
//! SI 014 012 012 013 013 E    IR distances, sensors 0..4
//! SU 175 065 023 048 047 E    US distances, sensors 0..4
//! SA 087 E                    battery
//! SF <tag> E                  RFID tag (may be empty)
//! ```
//!
//! The two-character mask selects exactly one channel; lines with an
//! unknown mask are not telemetry and are skipped.

use autobot_common::consts::{DISTANCE_SENSOR_COUNT, END_MARKER, FIELD_WIDTH, MASK_LEN};
use autobot_common::hal::channel::SensorChannel;
use autobot_common::hal::driver::HalError;
use autobot_common::hal::types::{Distances, SensorValue};

/// One decoded telemetry frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    /// Channel the frame belongs to
    pub channel: SensorChannel,
    /// Decoded value
    pub value: SensorValue,
}

/// Decode one inbound line.
///
/// # Returns
/// - `Ok(Some(reading))` for a well-formed telemetry frame
/// - `Ok(None)` if the line does not start with a known mask
///
/// # Errors
/// `HalError::Parse` if the mask is known but the payload is malformed.
pub fn parse_frame(line: &str) -> Result<Option<Reading>, HalError> {
    let Some(prefix) = line.get(..MASK_LEN) else {
        return Ok(None);
    };
    let Some(channel) = SensorChannel::from_mask(prefix) else {
        return Ok(None);
    };

    let body = &line[MASK_LEN..];
    let payload = body.strip_suffix(END_MARKER).unwrap_or(body);

    let value = if channel.is_distance_array() {
        SensorValue::Distances(parse_distances(channel, payload)?)
    } else if channel == SensorChannel::Rfid {
        SensorValue::Tag(payload.to_string())
    } else {
        SensorValue::Level(parse_level(channel, payload)?)
    };

    Ok(Some(Reading { channel, value }))
}

/// Split a distance payload into fixed-width decimal fields.
fn parse_distances(channel: SensorChannel, payload: &str) -> Result<Distances, HalError> {
    let expected = DISTANCE_SENSOR_COUNT * FIELD_WIDTH;
    if payload.len() != expected {
        return Err(HalError::Parse(format!(
            "{channel} payload {payload:?} has {} characters, expected {expected}",
            payload.len()
        )));
    }
    if !payload.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HalError::Parse(format!(
            "{channel} payload {payload:?} contains non-digit characters"
        )));
    }

    Ok(payload
        .as_bytes()
        .chunks(FIELD_WIDTH)
        .enumerate()
        .map(|(idx, field)| {
            let distance = field
                .iter()
                .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
            (idx as u8, distance)
        })
        .collect())
}

/// Parse a scalar payload made of decimal digits only.
fn parse_level(channel: SensorChannel, payload: &str) -> Result<u32, HalError> {
    if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HalError::Parse(format!(
            "{channel} payload {payload:?} is not a decimal number"
        )));
    }
    payload
        .parse()
        .map_err(|e| HalError::Parse(format!("{channel} payload {payload:?}: {e}")))
}
