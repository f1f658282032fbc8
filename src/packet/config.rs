//! # Configuration Record and Frame Codec
//!
//! A configuration record is the three-byte `id | threshold | duration` body
//! delivered to a node as a radio ack-payload. On the host link it travels
//! wrapped in a configuration frame: a little-endian 16-bit magic, the
//! record, and an additive checksum over all preceding bytes, magic
//! included. Note the deliberate asymmetry with the outbound telemetry
//! frame, whose checksum excludes the marker.

use crate::constants::{CONFIG_FRAME_WIRE_SIZE, CONFIG_RECORD_WIRE_SIZE, FRAME_MAGIC};
use crate::error::SensorNetError;
use crate::packet::checksum;
use nom::number::complete::{le_u16, u8 as parse_u8};
use nom::IResult;

/// Desired motion-detection configuration for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRecord {
    /// Target channel id.
    pub id: u8,
    /// Motion sensitivity threshold.
    pub threshold: u8,
    /// Motion-event minimum duration in milliseconds.
    pub duration: u8,
}

impl ConfigRecord {
    /// Encodes the record into its three-byte ack-payload form.
    pub fn encode(&self) -> Vec<u8> {
        vec![self.id, self.threshold, self.duration]
    }

    /// Decodes a record from its ack-payload form.
    pub fn decode(input: &[u8]) -> Result<ConfigRecord, SensorNetError> {
        if input.len() != CONFIG_RECORD_WIRE_SIZE {
            return Err(SensorNetError::MalformedPacket {
                expected: CONFIG_RECORD_WIRE_SIZE,
                actual: input.len(),
            });
        }
        Ok(ConfigRecord {
            id: input[0],
            threshold: input[1],
            duration: input[2],
        })
    }

    /// Wraps the record in a checksummed configuration frame for the host link.
    pub fn encode_frame(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(CONFIG_FRAME_WIRE_SIZE);
        data.extend_from_slice(&FRAME_MAGIC.to_le_bytes());
        data.extend_from_slice(&self.encode());
        data.push(checksum::compute(&data));
        data
    }

    /// Unwraps a configuration frame, validating magic and checksum.
    ///
    /// The frame is accepted only if both validate; otherwise the whole frame
    /// is rejected with [`SensorNetError::BadMagic`] or
    /// [`SensorNetError::BadChecksum`].
    pub fn decode_frame(input: &[u8]) -> Result<ConfigRecord, SensorNetError> {
        if input.len() != CONFIG_FRAME_WIRE_SIZE {
            return Err(SensorNetError::MalformedPacket {
                expected: CONFIG_FRAME_WIRE_SIZE,
                actual: input.len(),
            });
        }
        let (_, (magic, record, expected)) =
            parse_config_frame(input).map_err(|_| SensorNetError::MalformedPacket {
                expected: CONFIG_FRAME_WIRE_SIZE,
                actual: input.len(),
            })?;
        if magic != FRAME_MAGIC {
            return Err(SensorNetError::BadMagic(magic));
        }
        let calculated = checksum::compute(&input[..CONFIG_FRAME_WIRE_SIZE - 1]);
        if calculated != expected {
            return Err(SensorNetError::BadChecksum {
                expected,
                calculated,
            });
        }
        Ok(record)
    }
}

fn parse_config_frame(input: &[u8]) -> IResult<&[u8], (u16, ConfigRecord, u8)> {
    let (input, magic) = le_u16(input)?;
    let (input, id) = parse_u8(input)?;
    let (input, threshold) = parse_u8(input)?;
    let (input, duration) = parse_u8(input)?;
    let (input, expected) = parse_u8(input)?;
    Ok((
        input,
        (
            magic,
            ConfigRecord {
                id,
                threshold,
                duration,
            },
            expected,
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips() {
        let record = ConfigRecord {
            id: 5,
            threshold: 80,
            duration: 10,
        };
        assert_eq!(ConfigRecord::decode(&record.encode()).unwrap(), record);
    }

    #[test]
    fn frame_layout_matches_deployment() {
        let record = ConfigRecord {
            id: 5,
            threshold: 80,
            duration: 10,
        };
        // Magic 0xBAE1 little-endian, then id/threshold/duration, then the
        // additive sum of everything before the checksum byte.
        let expected_sum = (0xE1u8)
            .wrapping_add(0xBA)
            .wrapping_add(5)
            .wrapping_add(80)
            .wrapping_add(10);
        assert_eq!(
            record.encode_frame(),
            vec![0xE1, 0xBA, 5, 80, 10, expected_sum]
        );
    }

    #[test]
    fn frame_round_trips() {
        let record = ConfigRecord {
            id: 9,
            threshold: 33,
            duration: 20,
        };
        assert_eq!(
            ConfigRecord::decode_frame(&record.encode_frame()).unwrap(),
            record
        );
    }

    #[test]
    fn frame_rejects_bad_magic() {
        let mut frame = ConfigRecord {
            id: 1,
            threshold: 2,
            duration: 3,
        }
        .encode_frame();
        frame[1] = 0xFF;
        assert!(matches!(
            ConfigRecord::decode_frame(&frame),
            Err(SensorNetError::BadMagic(_))
        ));
    }

    #[test]
    fn frame_rejects_bad_checksum() {
        let mut frame = ConfigRecord {
            id: 1,
            threshold: 2,
            duration: 3,
        }
        .encode_frame();
        frame[3] ^= 0x10;
        assert!(matches!(
            ConfigRecord::decode_frame(&frame),
            Err(SensorNetError::BadChecksum { .. })
        ));
    }

    #[test]
    fn record_rejects_wrong_length() {
        assert!(ConfigRecord::decode(&[1, 2]).is_err());
        assert!(ConfigRecord::decode(&[1, 2, 3, 4]).is_err());
    }
}
