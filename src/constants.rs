//! Sensor Network Protocol Constants
//!
//! This module defines the constants shared by every node and gateway in the
//! network: the 40-bit base address the radio addresses are derived from, the
//! frequency plan, and the fixed wire sizes of the packet formats.

/// 40-bit network base address; the low byte is replaced by the channel id.
///
/// All nodes and gateways in one deployment share this constant, so the low
/// address byte alone disambiguates channels within a radio's pipe set.
pub const CHANNEL_ZERO: u64 = 0xBA_E1_F0_01_00;

/// Number of reading pipes multiplexed on one physical radio.
pub const PIPES_PER_RADIO: usize = 6;

/// Lowest RF channel number; each radio listens on `FREQ_BASE + radio_index`.
pub const FREQ_BASE: u8 = 100;

/// 16-bit marker identifying a configuration frame on the host link.
pub const FRAME_MAGIC: u16 = 0xBAE1;

/// First byte of the outbound host frame marker.
pub const FRAME_MAGIC_HI: u8 = 0xBA;

/// Second byte of the outbound host frame marker.
pub const FRAME_MAGIC_LO: u8 = 0xE1;

/// Size of an encoded telemetry packet on the radio link.
pub const TELEMETRY_WIRE_SIZE: usize = 19;

/// Size of an encoded configuration record (the ack-payload body).
pub const CONFIG_RECORD_WIRE_SIZE: usize = 3;

/// Size of a configuration frame on the host link (magic + record + checksum).
pub const CONFIG_FRAME_WIRE_SIZE: usize = 6;

/// Size of an outbound telemetry frame on the host link (marker + packet + checksum).
pub const TELEMETRY_FRAME_WIRE_SIZE: usize = 2 + TELEMETRY_WIRE_SIZE + 1;

/// Motion threshold a gateway assumes for a channel until told otherwise.
pub const DEFAULT_THRESHOLD: u8 = 50;

/// Motion minimum duration (ms) a gateway assumes for a channel until told otherwise.
pub const DEFAULT_DURATION: u8 = 10;

/// Motion threshold a node programs into its sensor at power-on.
pub const NODE_DEFAULT_THRESHOLD: u8 = 20;

/// Motion minimum duration (ms) a node programs into its sensor at power-on.
pub const NODE_DEFAULT_DURATION: u8 = 10;
