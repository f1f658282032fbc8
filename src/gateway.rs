//! # Gateway Dispatch Loop
//!
//! An always-on receiver multiplexing up to [`PIPES_PER_RADIO`] sensor
//! channels per physical radio. Each cycle polls every radio for at most one
//! packet, forwards decoded telemetry to the host through the uplink framer,
//! runs the piggyback configuration delivery step for the packet's channel,
//! and finally polls the host link for inbound configuration frames.
//!
//! The loop is single-threaded and cooperative; all per-channel state is
//! owned here, so no locking is needed. Nothing a radio or the host sends
//! can make the loop fail: malformed packets, unresolved channels and
//! rejected frames are logged and the loop moves on.

use crate::addressing::address_for;
use crate::constants::{FREQ_BASE, PIPES_PER_RADIO, TELEMETRY_WIRE_SIZE};
use crate::error::SensorNetError;
use crate::packet::TelemetryPacket;
use crate::radio::Radio;
use crate::sync::ConfigSync;
use crate::uplink::HostLink;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

/// Multi-radio receiver gateway.
pub struct Gateway<T> {
    radios: Vec<Box<dyn Radio>>,
    sync: ConfigSync,
    link: HostLink<T>,
    /// Forward telemetry from unprovisioned channels anyway (best-effort).
    forward_unresolved: bool,
}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Gateway<T> {
    pub fn new(radios: Vec<Box<dyn Radio>>, link: HostLink<T>) -> Self {
        let sync = ConfigSync::new(radios.len());
        Gateway {
            radios,
            sync,
            link,
            forward_unresolved: true,
        }
    }

    /// Per-deployment policy for telemetry from unprovisioned channels.
    pub fn set_forward_unresolved(&mut self, forward: bool) {
        self.forward_unresolved = forward;
    }

    /// Per-channel configuration state, for provisioning and inspection.
    pub fn sync(&self) -> &ConfigSync {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut ConfigSync {
        &mut self.sync
    }

    /// Programs every radio: its band frequency, one reading pipe per
    /// provisioned channel with the derived address, then receive mode.
    pub async fn init(&mut self) -> Result<(), SensorNetError> {
        let radio_count = self.radios.len();
        for (index, radio) in self.radios.iter_mut().enumerate() {
            radio.set_channel(FREQ_BASE + index as u8).await;
            for slot in 0..PIPES_PER_RADIO {
                let pipe = index * PIPES_PER_RADIO + slot;
                let config =
                    self.sync
                        .config(pipe)
                        .ok_or(SensorNetError::ChannelOutOfRange {
                            channel: pipe as u8 + 1,
                            radios: radio_count,
                        })?;
                debug!(
                    "Pipe {pipe} with channel id {} default config set to threshold = {} - duration = {}",
                    config.id, config.threshold, config.duration
                );
                radio.open_reading_pipe(slot, address_for(config.id)).await;
            }
            radio.start_listening().await;
            info!("Radio {index} listening on RF channel {}", FREQ_BASE + index as u8);
        }
        Ok(())
    }

    /// Runs one dispatch cycle: at most one packet per radio, then one host
    /// link poll. Returns only on a host link failure; everything else is
    /// logged and survived.
    pub async fn run_cycle(&mut self) -> Result<(), SensorNetError> {
        for index in 0..self.radios.len() {
            if !self.radios[index].available().await {
                continue;
            }
            let raw = self.radios[index].read_packet(TELEMETRY_WIRE_SIZE).await;
            let packet = match TelemetryPacket::decode(&raw) {
                Ok(packet) => packet,
                Err(err) => {
                    warn!("Radio {index}: {err}");
                    continue;
                }
            };
            debug!(
                "[{}] [{}] [ACC] {:5} / {:5} / {:5} ({:02X}@{} ms)",
                packet.time_ms,
                packet.id,
                packet.accel[0],
                packet.accel[1],
                packet.accel[2],
                packet.motion.bits(),
                packet.time_last_motion_ms,
            );

            match self.sync.pipe_for_channel(packet.id) {
                Some(pipe) => {
                    self.link.send_telemetry(&raw).await?;
                    let radio = &mut *self.radios[pipe / PIPES_PER_RADIO];
                    match self.sync.deliver(pipe, radio).await {
                        Ok(true) => debug!("Config delivered for pipe {pipe}"),
                        Ok(false) => {}
                        Err(err) => warn!("{err}; channel stays pending"),
                    }
                }
                None => {
                    warn!("{}", SensorNetError::UnresolvedChannel(packet.id));
                    if self.forward_unresolved {
                        self.link.send_telemetry(&raw).await?;
                    }
                }
            }
        }

        match self.link.poll_config().await {
            Ok(Some(record)) => {
                if let Err(err) = self.sync.submit(record) {
                    warn!("{err}; frame dropped");
                }
            }
            Ok(None) => {}
            Err(err @ SensorNetError::BadMagic(_))
            | Err(err @ SensorNetError::BadChecksum { .. }) => {
                warn!("Host link: {err}");
            }
            Err(err) => return Err(err),
        }

        Ok(())
    }

    /// Runs dispatch cycles until the host link fails.
    pub async fn run(&mut self) -> Result<(), SensorNetError> {
        loop {
            self.run_cycle().await?;
        }
    }
}
