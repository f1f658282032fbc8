//! # Host Uplink Framing
//!
//! Byte-stream framing between gateway and host. Outbound, every telemetry
//! packet is wrapped as `0xBA 0xE1 | packet | checksum`, where the checksum
//! is the additive sum of the packet bytes only (the marker is excluded).
//! Inbound configuration frames instead carry their magic as a little-endian
//! u16 that is included in the checksum. Both conventions come from the
//! deployed protocol and are preserved exactly for compatibility.
//!
//! The inbound parser is resynchronizing: a frame that fails magic or
//! checksum validation is discarded in its entirety and any stale bytes in
//! front of the next magic marker are drained, so a single corrupted byte
//! cannot permanently desynchronize the stream. Both error paths are
//! non-fatal and scanning resumes with the next poll.

use crate::constants::{
    CONFIG_FRAME_WIRE_SIZE, FRAME_MAGIC_HI, FRAME_MAGIC_LO, TELEMETRY_FRAME_WIRE_SIZE,
};
use crate::error::SensorNetError;
use crate::packet::{checksum, ConfigRecord};
use bytes::{Buf, BytesMut};
use log::{debug, trace};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;

/// How long one dispatch cycle waits for host bytes before moving on.
pub const DEFAULT_POLL_WINDOW: Duration = Duration::from_millis(5);

/// Wraps an encoded telemetry packet for the host link.
///
/// The checksum covers the packet bytes only, not the two marker bytes.
pub fn frame_telemetry(packet: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(TELEMETRY_FRAME_WIRE_SIZE);
    frame.push(FRAME_MAGIC_HI);
    frame.push(FRAME_MAGIC_LO);
    frame.extend_from_slice(packet);
    frame.push(checksum::compute(packet));
    frame
}

/// Incremental parser for inbound configuration frames.
///
/// Bytes are fed in as they arrive; [`InboundParser::next_frame`] yields one
/// validated [`ConfigRecord`] at a time. Rejected frames leave the parser
/// usable and resynchronized on the next magic marker in the buffer.
#[derive(Debug, Default)]
pub struct InboundParser {
    buf: BytesMut,
}

impl InboundParser {
    pub fn new() -> Self {
        InboundParser {
            buf: BytesMut::new(),
        }
    }

    /// Appends received bytes to the scan buffer.
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Attempts to parse the next configuration frame from the buffer.
    ///
    /// Returns `Ok(None)` while fewer than a full frame's worth of bytes are
    /// buffered. A frame failing validation is consumed and the buffer is
    /// drained up to the next inbound magic marker before the error is
    /// returned; the caller logs it and keeps polling.
    pub fn next_frame(&mut self) -> Result<Option<ConfigRecord>, SensorNetError> {
        if self.buf.len() < CONFIG_FRAME_WIRE_SIZE {
            return Ok(None);
        }
        match ConfigRecord::decode_frame(&self.buf[..CONFIG_FRAME_WIRE_SIZE]) {
            Ok(record) => {
                self.buf.advance(CONFIG_FRAME_WIRE_SIZE);
                Ok(Some(record))
            }
            Err(err) => {
                self.buf.advance(CONFIG_FRAME_WIRE_SIZE);
                self.drain_to_magic();
                Err(err)
            }
        }
    }

    /// Drops buffered bytes up to the next `E1 BA` marker, or everything if
    /// no marker remains. This is the stale-byte drain that follows a
    /// rejected frame.
    fn drain_to_magic(&mut self) {
        let marker = [FRAME_MAGIC_LO, FRAME_MAGIC_HI]; // little-endian on the wire
        let pos = self
            .buf
            .windows(2)
            .position(|pair| pair == marker)
            .unwrap_or(self.buf.len());
        if pos > 0 {
            trace!("Draining {pos} stale byte(s) to resynchronize");
        }
        self.buf.advance(pos);
    }
}

/// Bidirectional host link: framed telemetry out, configuration frames in.
///
/// Generic over the transport so tests can drive it with an in-memory duplex
/// stream; production gateways use a serial port.
pub struct HostLink<T> {
    io: T,
    parser: InboundParser,
    poll_window: Duration,
}

impl HostLink<tokio_serial::SerialStream> {
    /// Opens a serial port to the host at 8N1 with the given baud rate.
    pub async fn connect(port_name: &str, baudrate: u32) -> Result<Self, SensorNetError> {
        let port = tokio_serial::new(port_name, baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .open_native_async()
            .map_err(|e| SensorNetError::SerialPortError(e.to_string()))?;
        Ok(HostLink::new(port))
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> HostLink<T> {
    pub fn new(io: T) -> Self {
        HostLink {
            io,
            parser: InboundParser::new(),
            poll_window: DEFAULT_POLL_WINDOW,
        }
    }

    pub fn with_poll_window(io: T, poll_window: Duration) -> Self {
        HostLink {
            io,
            parser: InboundParser::new(),
            poll_window,
        }
    }

    /// Frames and writes one encoded telemetry packet to the host.
    pub async fn send_telemetry(&mut self, packet: &[u8]) -> Result<(), SensorNetError> {
        let frame = frame_telemetry(packet);
        trace!("Uplink frame: {}", hex::encode(&frame));
        self.io
            .write_all(&frame)
            .await
            .map_err(|e| SensorNetError::SerialPortError(e.to_string()))?;
        self.io
            .flush()
            .await
            .map_err(|e| SensorNetError::SerialPortError(e.to_string()))
    }

    /// Polls the host for one inbound configuration frame.
    ///
    /// Waits at most the configured poll window for new bytes, then parses
    /// whatever is buffered. `Ok(None)` means no complete frame this cycle;
    /// frame validation errors are returned for the caller to log and are
    /// never fatal to the link.
    pub async fn poll_config(&mut self) -> Result<Option<ConfigRecord>, SensorNetError> {
        // Frames already buffered from an earlier read come first.
        if let Some(record) = self.parser.next_frame()? {
            return Ok(Some(record));
        }

        let mut chunk = [0u8; 64];
        match timeout(self.poll_window, self.io.read(&mut chunk)).await {
            Err(_) => Ok(None), // nothing arrived this cycle
            Ok(Err(e)) => Err(SensorNetError::SerialPortError(e.to_string())),
            Ok(Ok(0)) => Err(SensorNetError::SerialPortError("host link closed".into())),
            Ok(Ok(n)) => {
                debug!("Host link: {n} byte(s) inbound");
                self.parser.feed(&chunk[..n]);
                self.parser.next_frame()
            }
        }
    }
}
