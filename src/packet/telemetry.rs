//! # Telemetry Packet Codec
//!
//! Fixed-layout binary codec for the packet a node transmits each cycle. The
//! layout is packed with no padding and little-endian multi-byte fields, so
//! independently built node and gateway binaries agree byte for byte:
//!
//! ```text
//! id:u8 | time:u32 | time_last_motion:u32 | x:i16 | y:i16 | z:i16
//!      | motion:u8 | cfg_update:u8 | cfg_threshold:u8 | cfg_duration:u8
//! ```
//!
//! Decoding uses the `nom` combinators; any input whose length differs from
//! [`TELEMETRY_WIRE_SIZE`] is rejected before parsing.

use crate::constants::TELEMETRY_WIRE_SIZE;
use crate::error::SensorNetError;
use bitflags::bitflags;
use nom::number::complete::{le_i16, le_u32, u8 as parse_u8};
use nom::IResult;

bitflags! {
    /// Axis and direction of the acceleration that triggered motion detection.
    ///
    /// Bits 0 and 1 of the wire byte are unused by the sensor; they are
    /// carried through untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MotionFlags: u8 {
        const Z_POS = 1 << 2;
        const Z_NEG = 1 << 3;
        const Y_POS = 1 << 4;
        const Y_NEG = 1 << 5;
        const X_POS = 1 << 6;
        const X_NEG = 1 << 7;
    }
}

impl MotionFlags {
    /// True if any motion bit is set.
    pub fn any(&self) -> bool {
        !self.is_empty()
    }
}

impl Default for MotionFlags {
    fn default() -> Self {
        MotionFlags::empty()
    }
}

/// Configuration echo carried in every telemetry packet: the threshold and
/// duration currently in effect on the node, and whether either was just
/// updated by a piggybacked configuration delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigEcho {
    pub threshold_updated: bool,
    pub duration_updated: bool,
    pub threshold: u8,
    pub duration: u8,
}

impl ConfigEcho {
    fn update_byte(&self) -> u8 {
        (self.threshold_updated as u8) | (self.duration_updated as u8) << 1
    }

    fn from_update_byte(update: u8, threshold: u8, duration: u8) -> Self {
        ConfigEcho {
            threshold_updated: update & 0x01 != 0,
            duration_updated: update & 0x02 != 0,
            threshold,
            duration,
        }
    }
}

/// One telemetry reading as transmitted by a node.
///
/// Constructed fresh on the node each transmit cycle; read-only on the
/// gateway and never mutated after receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetryPacket {
    /// Logical channel id of the originating node.
    pub id: u8,
    /// Node-local monotonic milliseconds at send time.
    pub time_ms: u32,
    /// Node-local milliseconds of the last motion/knock event.
    pub time_last_motion_ms: u32,
    /// Raw tri-axis acceleration reading (x, y, z).
    pub accel: [i16; 3],
    /// Axis/direction bitfield of the last detected motion.
    pub motion: MotionFlags,
    /// Threshold/duration currently in effect on the node.
    pub echo: ConfigEcho,
}

impl TelemetryPacket {
    /// Encodes the packet into its fixed wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(TELEMETRY_WIRE_SIZE);
        data.push(self.id);
        data.extend_from_slice(&self.time_ms.to_le_bytes());
        data.extend_from_slice(&self.time_last_motion_ms.to_le_bytes());
        for axis in self.accel {
            data.extend_from_slice(&axis.to_le_bytes());
        }
        data.push(self.motion.bits());
        data.push(self.echo.update_byte());
        data.push(self.echo.threshold);
        data.push(self.echo.duration);
        data
    }

    /// Decodes a packet from its fixed wire layout.
    ///
    /// Fails with [`SensorNetError::MalformedPacket`] unless the input length
    /// equals [`TELEMETRY_WIRE_SIZE`] exactly.
    pub fn decode(input: &[u8]) -> Result<TelemetryPacket, SensorNetError> {
        if input.len() != TELEMETRY_WIRE_SIZE {
            return Err(SensorNetError::MalformedPacket {
                expected: TELEMETRY_WIRE_SIZE,
                actual: input.len(),
            });
        }
        let (_, packet) = parse_telemetry(input).map_err(|_| SensorNetError::MalformedPacket {
            expected: TELEMETRY_WIRE_SIZE,
            actual: input.len(),
        })?;
        Ok(packet)
    }
}

fn parse_telemetry(input: &[u8]) -> IResult<&[u8], TelemetryPacket> {
    let (input, id) = parse_u8(input)?;
    let (input, time_ms) = le_u32(input)?;
    let (input, time_last_motion_ms) = le_u32(input)?;
    let (input, x) = le_i16(input)?;
    let (input, y) = le_i16(input)?;
    let (input, z) = le_i16(input)?;
    let (input, motion) = parse_u8(input)?;
    let (input, update) = parse_u8(input)?;
    let (input, threshold) = parse_u8(input)?;
    let (input, duration) = parse_u8(input)?;
    Ok((
        input,
        TelemetryPacket {
            id,
            time_ms,
            time_last_motion_ms,
            accel: [x, y, z],
            motion: MotionFlags::from_bits_retain(motion),
            echo: ConfigEcho::from_update_byte(update, threshold, duration),
        },
    ))
}
