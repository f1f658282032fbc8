//! # Sensor Network Error Handling
//!
//! This module defines the SensorNetError enum, which represents the different
//! error types that can occur in the sensornet-rs crate.

use thiserror::Error;

/// Represents the different error types that can occur in the sensor network crate.
#[derive(Debug, Error)]
pub enum SensorNetError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Indicates a packet whose length does not match the fixed wire size.
    #[error("Malformed packet: expected {expected} bytes, got {actual}")]
    MalformedPacket { expected: usize, actual: usize },

    /// Indicates an inbound frame whose magic field did not validate.
    #[error("Bad frame magic: 0x{0:04X}")]
    BadMagic(u16),

    /// Indicates a checksum mismatch on a frame or packet.
    #[error("Bad checksum: expected 0x{expected:02X}, calculated 0x{calculated:02X}")]
    BadChecksum { expected: u8, calculated: u8 },

    /// Indicates telemetry or configuration addressed to an unprovisioned channel.
    #[error("Unresolved channel id {0}")]
    UnresolvedChannel(u8),

    /// Indicates a channel id outside the range provisioned for the radio count.
    #[error("Channel id {channel} out of range for {radios} radio(s)")]
    ChannelOutOfRange { channel: u8, radios: usize },

    /// Indicates the radio driver rejected a primary or ack-payload write.
    #[error("Radio write failed on pipe {pipe}")]
    RadioWriteFailed { pipe: usize },

    /// Indicates the motion sensor failed its power-on self test. Fatal at
    /// node startup; a node with no working sensor has nothing to transmit.
    #[error("Sensor self test failed")]
    SensorInitFailed,
}
