//! # Configuration Synchronization
//!
//! Bidirectional configuration sync over the radio's ack-payload channel.
//!
//! The gateway owns the authoritative per-channel configuration. A valid
//! configuration frame from the host marks the channel `Pending`; the next
//! telemetry reception on that channel's pipe piggybacks the record onto the
//! link-layer acknowledgment. Delivery is at-most-once and unconfirmed: the
//! channel returns to `Synced` as soon as the radio driver reports the
//! payload queued, not when the node has actually consumed it. A payload
//! queued but never fetched (a node that stops transmitting) leaves the
//! gateway believing `Synced` while the node stays stale. This is a known
//! protocol limitation, kept as deployed.
//!
//! The node side validates a received ack-payload (exact record size,
//! matching channel id), applies it to its sensor driver and echoes the
//! values, with "just updated" flags, in its subsequent telemetry.

use crate::constants::{
    CONFIG_RECORD_WIRE_SIZE, DEFAULT_DURATION, DEFAULT_THRESHOLD, NODE_DEFAULT_DURATION,
    NODE_DEFAULT_THRESHOLD, PIPES_PER_RADIO,
};
use crate::error::SensorNetError;
use crate::packet::{ConfigEcho, ConfigRecord};
use crate::radio::Radio;
use log::{debug, warn};

/// Delivery state of one channel's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// The node is believed to hold the current configuration.
    Synced,
    /// A newer configuration exists and has not been handed to the radio.
    Pending,
}

#[derive(Debug, Clone)]
struct ChannelState {
    config: ConfigRecord,
    pending: bool,
}

/// Gateway-side per-channel configuration bookkeeping, indexed by pipe.
///
/// Pipes are numbered globally across radios: pipe `p` lives on radio
/// `p / PIPES_PER_RADIO` at slot `p % PIPES_PER_RADIO`. By default pipe `p`
/// is provisioned for channel id `p + 1`, but deployments may override the
/// assignment per pipe, which is why channel resolution is a scan of the
/// provisioned table rather than arithmetic.
#[derive(Debug)]
pub struct ConfigSync {
    channels: Vec<ChannelState>,
}

impl ConfigSync {
    /// Seeds default provisioning for a gateway with `radios` physical radios.
    pub fn new(radios: usize) -> Self {
        let channels = (0..radios * PIPES_PER_RADIO)
            .map(|pipe| ChannelState {
                config: ConfigRecord {
                    id: pipe as u8 + 1,
                    threshold: DEFAULT_THRESHOLD,
                    duration: DEFAULT_DURATION,
                },
                pending: false,
            })
            .collect();
        ConfigSync { channels }
    }

    /// Number of provisioned pipes.
    pub fn pipes(&self) -> usize {
        self.channels.len()
    }

    /// Overrides the channel assignment and configuration of one pipe.
    pub fn provision(&mut self, pipe: usize, config: ConfigRecord) {
        if let Some(state) = self.channels.get_mut(pipe) {
            state.config = config;
            state.pending = false;
        }
    }

    /// Resolves a channel id to its pipe by scanning the provisioned table.
    pub fn pipe_for_channel(&self, channel: u8) -> Option<usize> {
        self.channels
            .iter()
            .position(|state| state.config.id == channel)
    }

    /// Configuration currently held for a pipe.
    pub fn config(&self, pipe: usize) -> Option<ConfigRecord> {
        self.channels.get(pipe).map(|state| state.config)
    }

    /// Delivery state of a pipe.
    pub fn state(&self, pipe: usize) -> Option<SyncState> {
        self.channels.get(pipe).map(|state| {
            if state.pending {
                SyncState::Pending
            } else {
                SyncState::Synced
            }
        })
    }

    /// Accepts a validated configuration record from the host.
    ///
    /// Overwrites the channel's threshold and duration and marks it pending,
    /// even when the values are unchanged, so an identical re-sent
    /// configuration still triggers a delivery attempt. The provisioned
    /// channel id of the pipe is not altered. Returns the pipe the record
    /// was filed under, or [`SensorNetError::UnresolvedChannel`] when no
    /// pipe is provisioned for the id; no state changes in that case.
    pub fn submit(&mut self, record: ConfigRecord) -> Result<usize, SensorNetError> {
        let pipe = self
            .pipe_for_channel(record.id)
            .ok_or(SensorNetError::UnresolvedChannel(record.id))?;
        let state = &mut self.channels[pipe];
        state.config.threshold = record.threshold;
        state.config.duration = record.duration;
        state.pending = true;
        debug!(
            "Channel {} threshold -> {}, duration -> {} (pipe {pipe})",
            record.id, record.threshold, record.duration
        );
        Ok(pipe)
    }

    /// Piggyback delivery step, run after a telemetry reception on `pipe`.
    ///
    /// Does nothing unless the pipe is pending. Hands the configuration to
    /// the radio as an ack-payload on the pipe's slot; if the TX FIFO is
    /// full, flushes it and retries once within the same cycle. A queued
    /// payload clears pending (`Ok(true)`); a rejected write keeps the pipe
    /// pending and reports [`SensorNetError::RadioWriteFailed`], to be
    /// retried on the channel's next telemetry.
    pub async fn deliver(
        &mut self,
        pipe: usize,
        radio: &mut dyn Radio,
    ) -> Result<bool, SensorNetError> {
        let Some(state) = self.channels.get_mut(pipe) else {
            return Ok(false);
        };
        if !state.pending {
            return Ok(false);
        }

        if radio.fifo_full().await {
            debug!("Flushing TX FIFO before ack-payload write on pipe {pipe}");
            radio.flush_tx().await;
        }

        let slot = pipe % PIPES_PER_RADIO;
        let payload = state.config.encode();
        debug!(
            "Writing ack-payload on pipe {pipe}: [Ch {}] threshold={} duration={}",
            state.config.id, state.config.threshold, state.config.duration
        );
        if radio.write_ack_payload(slot, &payload).await {
            state.pending = false;
            Ok(true)
        } else {
            Err(SensorNetError::RadioWriteFailed { pipe })
        }
    }
}

/// Node-side view of its own configuration and the pending echo flags.
#[derive(Debug, Clone)]
pub struct NodeSync {
    channel: u8,
    threshold: u8,
    duration: u8,
    threshold_updated: bool,
    duration_updated: bool,
}

impl NodeSync {
    pub fn new(channel: u8) -> Self {
        NodeSync {
            channel,
            threshold: NODE_DEFAULT_THRESHOLD,
            duration: NODE_DEFAULT_DURATION,
            threshold_updated: false,
            duration_updated: false,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn duration(&self) -> u8 {
        self.duration
    }

    /// Echo fields for the next outgoing telemetry packet.
    pub fn echo(&self) -> ConfigEcho {
        ConfigEcho {
            threshold_updated: self.threshold_updated,
            duration_updated: self.duration_updated,
            threshold: self.threshold,
            duration: self.duration,
        }
    }

    /// Clears the "just updated" flags once they have been transmitted.
    pub fn mark_reported(&mut self) {
        self.threshold_updated = false;
        self.duration_updated = false;
    }

    /// Validates and applies a piggybacked ack-payload.
    ///
    /// A payload whose length differs from the configuration record size is
    /// logged and ignored; a record addressed to another channel is logged
    /// and discarded without altering node state. An accepted record updates
    /// the local values and arms the echo flags for the next transmit.
    pub fn apply_ack_payload(&mut self, payload: &[u8]) -> Option<ConfigRecord> {
        if payload.len() != CONFIG_RECORD_WIRE_SIZE {
            warn!("Unexpected ack-payload size of {}", payload.len());
            return None;
        }
        let record = ConfigRecord::decode(payload).ok()?;
        if record.id != self.channel {
            warn!(
                "Config received for wrong channel {} (expecting {})",
                record.id, self.channel
            );
            return None;
        }
        self.threshold = record.threshold;
        self.duration = record.duration;
        self.threshold_updated = true;
        self.duration_updated = true;
        debug!(
            "Applied config: threshold={} duration={}",
            record.threshold, record.duration
        );
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_provisioning_is_sequential() {
        let sync = ConfigSync::new(3);
        assert_eq!(sync.pipes(), 18);
        assert_eq!(sync.pipe_for_channel(1), Some(0));
        assert_eq!(sync.pipe_for_channel(18), Some(17));
        assert_eq!(sync.pipe_for_channel(19), None);
        let config = sync.config(4).unwrap();
        assert_eq!(config.id, 5);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.duration, DEFAULT_DURATION);
    }

    #[test]
    fn provision_overrides_channel_assignment() {
        let mut sync = ConfigSync::new(1);
        sync.provision(
            2,
            ConfigRecord {
                id: 200,
                threshold: 10,
                duration: 5,
            },
        );
        assert_eq!(sync.pipe_for_channel(200), Some(2));
        assert_eq!(sync.pipe_for_channel(3), None);
    }

    #[test]
    fn submit_marks_only_target_channel_pending() {
        let mut sync = ConfigSync::new(1);
        let pipe = sync
            .submit(ConfigRecord {
                id: 5,
                threshold: 80,
                duration: 10,
            })
            .unwrap();
        assert_eq!(pipe, 4);
        assert_eq!(sync.state(4), Some(SyncState::Pending));
        for other in (0..6).filter(|p| *p != 4) {
            assert_eq!(sync.state(other), Some(SyncState::Synced));
        }
    }

    #[test]
    fn submit_is_idempotent_overwrite() {
        let mut sync = ConfigSync::new(1);
        let record = ConfigRecord {
            id: 2,
            threshold: DEFAULT_THRESHOLD,
            duration: DEFAULT_DURATION,
        };
        // Identical values still arm a delivery attempt.
        sync.submit(record).unwrap();
        assert_eq!(sync.state(1), Some(SyncState::Pending));
    }

    #[test]
    fn submit_unknown_channel_changes_nothing() {
        let mut sync = ConfigSync::new(1);
        let err = sync
            .submit(ConfigRecord {
                id: 200,
                threshold: 1,
                duration: 1,
            })
            .unwrap_err();
        assert!(matches!(err, SensorNetError::UnresolvedChannel(200)));
        for pipe in 0..6 {
            assert_eq!(sync.state(pipe), Some(SyncState::Synced));
        }
    }

    #[test]
    fn node_sync_rejects_wrong_size_and_channel() {
        let mut node = NodeSync::new(5);
        assert!(node.apply_ack_payload(&[5, 80]).is_none());
        assert!(node.apply_ack_payload(&[6, 80, 10]).is_none());
        assert_eq!(node.threshold(), NODE_DEFAULT_THRESHOLD);
        assert!(!node.echo().threshold_updated);
    }

    #[test]
    fn node_sync_applies_and_echoes() {
        let mut node = NodeSync::new(5);
        let record = node.apply_ack_payload(&[5, 80, 10]).unwrap();
        assert_eq!(record.threshold, 80);
        assert_eq!(node.threshold(), 80);
        assert_eq!(node.duration(), 10);
        let echo = node.echo();
        assert!(echo.threshold_updated);
        assert!(echo.duration_updated);
        assert_eq!(echo.threshold, 80);
        node.mark_reported();
        assert!(!node.echo().threshold_updated);
        assert_eq!(node.echo().threshold, 80);
    }
}
