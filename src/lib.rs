//! # sensornet-rs - A Rust Crate for Low-Power Wireless Motion Telemetry
//!
//! The sensornet-rs crate implements the addressing, framing and
//! configuration-synchronization protocol of a small wireless sensor
//! network: battery-powered accelerometer nodes transmit motion/knock
//! telemetry over an nRF24-class packet radio to always-on gateways, which
//! relay it to a host over a checksummed byte-stream link. The host pushes
//! per-node threshold/duration configuration back through the same radio
//! link, piggybacked on link-layer acknowledgments.
//!
//! ## Features
//!
//! - Derive radio addresses, frequency bands and gateway pipe slots from
//!   logical channel ids
//! - Encode and decode the fixed-layout telemetry and configuration packets
//! - Frame telemetry for the host link and parse inbound configuration
//!   frames with resynchronization after corruption
//! - Track per-channel pending configuration on the gateway and deliver it
//!   through the radio's ack-payload channel
//! - Drive complete gateway dispatch and node transmit loops over pluggable
//!   radio and sensor drivers
//!
//! ## Usage
//!
//! ```rust
//! use sensornet_rs::{address_for, frequency_for, pipe_location};
//!
//! let address = address_for(5);
//! assert_eq!(address & 0xFF, 5);
//! assert_eq!(frequency_for(5), 100);
//! assert_eq!(pipe_location(5, 3).unwrap(), (0, 4));
//! ```

pub mod addressing;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod node;
pub mod packet;
pub mod radio;
pub mod sensor;
pub mod sync;
pub mod uplink;

pub use crate::error::SensorNetError;
pub use crate::logging::{init_logger, log_info};

// Protocol core
pub use addressing::{address_for, frequency_for, pipe_location};
pub use packet::{ConfigEcho, ConfigRecord, MotionFlags, TelemetryPacket};
pub use sync::{ConfigSync, NodeSync, SyncState};
pub use uplink::{frame_telemetry, HostLink, InboundParser};

// Loops and collaborator interfaces
pub use gateway::Gateway;
pub use node::{Node, TransmitPolicy};
pub use radio::{MockRadio, Radio};
pub use sensor::{MockMotionSensor, MotionSensor};
