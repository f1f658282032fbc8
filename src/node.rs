//! # Node Transmit Loop
//!
//! A battery-powered sensor node: reads its accelerometer, decides whether
//! this cycle warrants a transmission, sends a telemetry packet and consumes
//! any configuration piggybacked on the acknowledgment.
//!
//! Motion edges are detected by polling: the sensor driver exposes a
//! monotonically updated time-of-last-event, and a cycle counts as an edge
//! when that timestamp differs from the one observed last cycle. The
//! hardware interrupt that updates the timestamp belongs to the driver.

use crate::addressing::{address_for, frequency_for};
use crate::constants::{NODE_DEFAULT_DURATION, NODE_DEFAULT_THRESHOLD, TELEMETRY_WIRE_SIZE};
use crate::error::SensorNetError;
use crate::packet::{MotionFlags, TelemetryPacket};
use crate::radio::Radio;
use crate::sensor::MotionSensor;
use crate::sync::NodeSync;
use log::{debug, info};
use std::time::Duration;
use tokio::time::Instant;

/// When a node transmits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitPolicy {
    /// Transmit every cycle.
    Always,
    /// Transmit only on a motion/knock edge.
    OnMotion,
    /// Transmit on edges, plus a keep-alive heartbeat when silent longer
    /// than the given interval.
    OnMotionWithKeepAlive(Duration),
}

/// One sensor node: radio, accelerometer and transmit policy.
#[derive(Debug)]
pub struct Node<R, S> {
    radio: R,
    sensor: S,
    sync: NodeSync,
    policy: TransmitPolicy,
    last_seen_motion_ms: u32,
    latched_motion: MotionFlags,
    last_tx_ms: Option<u32>,
}

impl<R: Radio, S: MotionSensor> Node<R, S> {
    /// Brings the node up: sensor self test, default motion configuration,
    /// radio addressing for the channel.
    ///
    /// A failed self test is fatal: the node refuses to start rather than
    /// transmit garbage ([`SensorNetError::SensorInitFailed`]).
    pub async fn new(
        mut radio: R,
        mut sensor: S,
        channel: u8,
        policy: TransmitPolicy,
    ) -> Result<Self, SensorNetError> {
        if !sensor.self_test().await {
            return Err(SensorNetError::SensorInitFailed);
        }
        sensor.set_motion_threshold(NODE_DEFAULT_THRESHOLD).await;
        sensor.set_motion_duration(NODE_DEFAULT_DURATION).await;

        radio.set_channel(frequency_for(channel)).await;
        radio.open_writing_pipe(address_for(channel)).await;
        radio.stop_listening().await;
        info!(
            "Node up on channel {channel} (address {:010X}, RF channel {})",
            address_for(channel),
            frequency_for(channel)
        );

        let last_seen_motion_ms = sensor.time_of_last_motion().await;
        Ok(Node {
            radio,
            sensor,
            sync: NodeSync::new(channel),
            policy,
            last_seen_motion_ms,
            latched_motion: MotionFlags::empty(),
            last_tx_ms: None,
        })
    }

    /// Threshold currently in effect.
    pub fn threshold(&self) -> u8 {
        self.sync.threshold()
    }

    /// Duration currently in effect.
    pub fn duration(&self) -> u8 {
        self.sync.duration()
    }

    /// Runs one cycle at node-local time `now_ms`; returns whether a packet
    /// was transmitted.
    ///
    /// A rejected radio write is not an error: the packet is simply dropped
    /// and the cycle ends, the radio driver having already exhausted its own
    /// retries.
    pub async fn run_cycle(&mut self, now_ms: u32) -> Result<bool, SensorNetError> {
        let last_motion = self.sensor.time_of_last_motion().await;
        let edge = last_motion != self.last_seen_motion_ms;
        if edge {
            self.last_seen_motion_ms = last_motion;
            self.latched_motion = self.sensor.motion_status().await;
        }

        let transmit = match self.policy {
            TransmitPolicy::Always => true,
            TransmitPolicy::OnMotion => edge,
            TransmitPolicy::OnMotionWithKeepAlive(interval) => {
                edge || self.keep_alive_due(now_ms, interval)
            }
        };
        if !transmit {
            return Ok(false);
        }

        let (x, y, z) = self.sensor.acceleration().await;
        let packet = TelemetryPacket {
            id: self.sync.channel(),
            time_ms: now_ms,
            time_last_motion_ms: self.last_seen_motion_ms,
            accel: [x, y, z],
            motion: self.latched_motion,
            echo: self.sync.echo(),
        };
        debug!(
            "[{}] [ACC] {:7} / {:7} / {:7} ({:02X} @ {} ms) [{}]",
            packet.id,
            x,
            y,
            z,
            packet.motion.bits(),
            packet.time_last_motion_ms,
            TELEMETRY_WIRE_SIZE,
        );

        if !self.radio.write_packet(&packet.encode()).await {
            debug!("Radio write rejected; retrying next cycle");
            return Ok(false);
        }
        self.last_tx_ms = Some(now_ms);
        self.sync.mark_reported();

        if let Some(payload) = self.radio.take_ack_payload().await {
            if let Some(record) = self.sync.apply_ack_payload(&payload) {
                self.sensor.set_motion_threshold(record.threshold).await;
                self.sensor.set_motion_duration(record.duration).await;
            }
        }
        Ok(true)
    }

    fn keep_alive_due(&self, now_ms: u32, interval: Duration) -> bool {
        match self.last_tx_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= interval.as_millis() as u32,
        }
    }

    /// Runs transmit cycles forever with the given cadence, using the tokio
    /// clock as the node-local monotonic time base.
    pub async fn run(&mut self, cycle: Duration) -> Result<(), SensorNetError> {
        let started = Instant::now();
        loop {
            let now_ms = started.elapsed().as_millis() as u32;
            self.run_cycle(now_ms).await?;
            tokio::time::sleep(cycle).await;
        }
    }
}
