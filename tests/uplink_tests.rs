//! Tests for the host-link framing: outbound telemetry frames, the inbound
//! configuration parser and its resynchronization after corruption.

use proptest::prelude::*;
use sensornet_rs::constants::{CONFIG_FRAME_WIRE_SIZE, TELEMETRY_WIRE_SIZE};
use sensornet_rs::packet::checksum;
use sensornet_rs::uplink::HostLink;
use sensornet_rs::{frame_telemetry, ConfigRecord, InboundParser, SensorNetError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

#[test]
fn outbound_frame_layout() {
    let payload = [0x01, 0x02, 0x03];
    let frame = frame_telemetry(&payload);
    assert_eq!(frame, vec![0xBA, 0xE1, 0x01, 0x02, 0x03, 0x06]);
}

/// The outbound checksum covers the packet bytes only; the marker is
/// excluded. This asymmetry with the inbound frame is part of the deployed
/// protocol.
#[test]
fn outbound_checksum_excludes_marker() {
    let payload = vec![0xAB; TELEMETRY_WIRE_SIZE];
    let frame = frame_telemetry(&payload);
    assert_eq!(*frame.last().unwrap(), checksum::compute(&payload));
    assert_ne!(*frame.last().unwrap(), checksum::compute(&frame[..frame.len() - 1]));
}

#[test]
fn parser_waits_for_full_frame() {
    let record = ConfigRecord {
        id: 3,
        threshold: 60,
        duration: 15,
    };
    let frame = record.encode_frame();
    let mut parser = InboundParser::new();

    // Byte-at-a-time arrival: nothing parses until the frame is complete.
    for byte in &frame[..CONFIG_FRAME_WIRE_SIZE - 1] {
        parser.feed(&[*byte]);
        assert!(parser.next_frame().unwrap().is_none());
    }
    parser.feed(&frame[CONFIG_FRAME_WIRE_SIZE - 1..]);
    assert_eq!(parser.next_frame().unwrap(), Some(record));
    assert_eq!(parser.buffered(), 0);
}

/// A frame with a wrong magic followed immediately by a valid frame: the
/// first is rejected, the second parses, no reset required.
#[test]
fn parser_recovers_after_bad_magic() {
    let record = ConfigRecord {
        id: 7,
        threshold: 44,
        duration: 20,
    };
    let mut bad = record.encode_frame();
    bad[0] = 0xFF;
    bad[1] = 0xFF;

    let mut parser = InboundParser::new();
    parser.feed(&bad);
    parser.feed(&record.encode_frame());

    assert!(matches!(
        parser.next_frame(),
        Err(SensorNetError::BadMagic(0xFFFF))
    ));
    assert_eq!(parser.next_frame().unwrap(), Some(record));
}

/// A corrupted checksum drains stale bytes up to the next magic marker.
#[test]
fn parser_recovers_after_bad_checksum() {
    let record = ConfigRecord {
        id: 7,
        threshold: 44,
        duration: 20,
    };
    let mut corrupted = record.encode_frame();
    corrupted[3] ^= 0x55;

    let mut parser = InboundParser::new();
    parser.feed(&corrupted);
    parser.feed(&[0x00, 0x11]); // line noise between frames
    parser.feed(&record.encode_frame());

    assert!(matches!(
        parser.next_frame(),
        Err(SensorNetError::BadChecksum { .. })
    ));
    assert_eq!(parser.next_frame().unwrap(), Some(record));
    assert_eq!(parser.buffered(), 0);
}

/// Garbage with no magic marker at all drains completely.
#[test]
fn parser_drains_unrecognizable_input() {
    let mut parser = InboundParser::new();
    parser.feed(&[0x00; CONFIG_FRAME_WIRE_SIZE * 2]);
    assert!(parser.next_frame().is_err());
    assert_eq!(parser.buffered(), 0);
}

proptest! {
    /// A frame built by the framer validates when recomputed on an
    /// unmodified stream, and any single-byte flip outside the checksum
    /// byte is rejected.
    #[test]
    fn inbound_frame_integrity(
        id in any::<u8>(),
        threshold in any::<u8>(),
        duration in any::<u8>(),
        position in 0usize..CONFIG_FRAME_WIRE_SIZE - 1,
        flip in 1u8..=255,
    ) {
        let record = ConfigRecord { id, threshold, duration };

        let mut clean = InboundParser::new();
        clean.feed(&record.encode_frame());
        prop_assert_eq!(clean.next_frame().unwrap(), Some(record));

        let mut frame = record.encode_frame();
        frame[position] ^= flip;
        let mut corrupted = InboundParser::new();
        corrupted.feed(&frame);
        prop_assert!(corrupted.next_frame().is_err());
    }
}

#[tokio::test]
async fn host_link_round_trip() {
    let (gateway_io, mut host_io) = tokio::io::duplex(256);
    let mut link = HostLink::with_poll_window(gateway_io, Duration::from_millis(5));

    // Outbound: telemetry framed onto the stream.
    let payload = vec![0x42; TELEMETRY_WIRE_SIZE];
    link.send_telemetry(&payload).await.unwrap();
    let mut received = vec![0u8; TELEMETRY_WIRE_SIZE + 3];
    tokio::io::AsyncReadExt::read_exact(&mut host_io, &mut received)
        .await
        .unwrap();
    assert_eq!(received, frame_telemetry(&payload));

    // Inbound: a config frame arrives and parses.
    let record = ConfigRecord {
        id: 5,
        threshold: 80,
        duration: 10,
    };
    host_io.write_all(&record.encode_frame()).await.unwrap();
    assert_eq!(link.poll_config().await.unwrap(), Some(record));

    // Nothing else pending: the poll window elapses quietly.
    assert_eq!(link.poll_config().await.unwrap(), None);
}
