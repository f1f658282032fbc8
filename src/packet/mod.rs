//! Wire formats carried over the radio link and, framed, over the host link.

pub mod checksum;
pub mod config;
pub mod telemetry;

pub use config::ConfigRecord;
pub use telemetry::{ConfigEcho, MotionFlags, TelemetryPacket};
