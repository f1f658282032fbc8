//! # Radio Collaborator Interface
//!
//! This module defines the `Radio` trait, the contract this crate requires
//! from an nRF24-class packet radio driver. The driver owns retransmission,
//! link-layer CRC and carrier sensing; this crate only programs addresses,
//! frequencies and ack-payloads and moves packets in and out of the FIFOs.
//!
//! A scriptable [`MockRadio`] is provided so the gateway and node loops can
//! be exercised without hardware.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Contract for a half-duplex packet radio with ack-payload support.
///
/// Writes report success as `bool`: `true` means the driver accepted (and
/// for primary writes, acknowledged) the payload, `false` means the caller
/// should retry on a later cycle.
#[async_trait]
pub trait Radio: Send {
    /// Programs the RF channel (frequency) the radio operates on.
    async fn set_channel(&mut self, frequency: u8);

    /// Opens a reading pipe at the given 40-bit address.
    async fn open_reading_pipe(&mut self, pipe: usize, address: u64);

    /// Programs the transmit address.
    async fn open_writing_pipe(&mut self, address: u64);

    /// Enters receive mode.
    async fn start_listening(&mut self);

    /// Leaves receive mode so the radio can transmit.
    async fn stop_listening(&mut self);

    /// True if a received packet is waiting in the RX FIFO.
    async fn available(&mut self) -> bool;

    /// Reads one packet of up to `len` bytes from the RX FIFO.
    async fn read_packet(&mut self, len: usize) -> Vec<u8>;

    /// Transmits one packet; `true` when the driver reports success.
    async fn write_packet(&mut self, data: &[u8]) -> bool;

    /// Queues an ack-payload for the given pipe; `true` when queued.
    async fn write_ack_payload(&mut self, pipe: usize, data: &[u8]) -> bool;

    /// Takes the ack-payload received with the last acknowledged transmit.
    async fn take_ack_payload(&mut self) -> Option<Vec<u8>>;

    /// True if the TX FIFO has no room for another payload.
    async fn fifo_full(&mut self) -> bool;

    /// Discards everything in the TX FIFO.
    async fn flush_tx(&mut self);
}

#[derive(Debug, Default)]
struct MockRadioState {
    channel: Option<u8>,
    reading_pipes: Vec<(usize, u64)>,
    writing_pipe: Option<u64>,
    listening: bool,
    rx_queue: VecDeque<Vec<u8>>,
    tx_log: Vec<Vec<u8>>,
    ack_payload_log: Vec<(usize, Vec<u8>)>,
    ack_queue: VecDeque<Vec<u8>>,
    write_ok: bool,
    ack_write_ok: bool,
    fifo_full: bool,
    flush_count: u32,
}

/// Scriptable in-memory radio for tests and demos.
///
/// Cloning yields another handle onto the same radio, so a test can keep one
/// handle for scripting while the gateway or node owns the other.
#[derive(Debug, Clone)]
pub struct MockRadio {
    state: Arc<Mutex<MockRadioState>>,
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRadio {
    pub fn new() -> Self {
        MockRadio {
            state: Arc::new(Mutex::new(MockRadioState {
                write_ok: true,
                ack_write_ok: true,
                ..MockRadioState::default()
            })),
        }
    }

    /// Queues a packet to be returned by `available`/`read_packet`.
    pub fn queue_packet(&self, data: &[u8]) {
        self.state.lock().unwrap().rx_queue.push_back(data.to_vec());
    }

    /// Queues an ack-payload to accompany the next successful transmit.
    pub fn queue_ack_payload(&self, data: &[u8]) {
        self.state.lock().unwrap().ack_queue.push_back(data.to_vec());
    }

    /// Scripts whether primary writes succeed.
    pub fn set_write_ok(&self, ok: bool) {
        self.state.lock().unwrap().write_ok = ok;
    }

    /// Scripts whether ack-payload writes succeed.
    pub fn set_ack_write_ok(&self, ok: bool) {
        self.state.lock().unwrap().ack_write_ok = ok;
    }

    /// Scripts the TX FIFO full flag; `flush_tx` clears it.
    pub fn set_fifo_full(&self, full: bool) {
        self.state.lock().unwrap().fifo_full = full;
    }

    /// Packets transmitted through `write_packet`.
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().tx_log.clone()
    }

    /// Ack-payloads queued through `write_ack_payload`, with their pipe.
    pub fn ack_payloads_written(&self) -> Vec<(usize, Vec<u8>)> {
        self.state.lock().unwrap().ack_payload_log.clone()
    }

    /// Number of `flush_tx` calls observed.
    pub fn flushes(&self) -> u32 {
        self.state.lock().unwrap().flush_count
    }

    /// RF channel last programmed, if any.
    pub fn channel(&self) -> Option<u8> {
        self.state.lock().unwrap().channel
    }

    /// Reading pipes opened so far, in call order.
    pub fn reading_pipes(&self) -> Vec<(usize, u64)> {
        self.state.lock().unwrap().reading_pipes.clone()
    }

    /// Transmit address last programmed, if any.
    pub fn writing_pipe(&self) -> Option<u64> {
        self.state.lock().unwrap().writing_pipe
    }

    /// True while the mock is in receive mode.
    pub fn is_listening(&self) -> bool {
        self.state.lock().unwrap().listening
    }
}

#[async_trait]
impl Radio for MockRadio {
    async fn set_channel(&mut self, frequency: u8) {
        self.state.lock().unwrap().channel = Some(frequency);
    }

    async fn open_reading_pipe(&mut self, pipe: usize, address: u64) {
        self.state.lock().unwrap().reading_pipes.push((pipe, address));
    }

    async fn open_writing_pipe(&mut self, address: u64) {
        self.state.lock().unwrap().writing_pipe = Some(address);
    }

    async fn start_listening(&mut self) {
        self.state.lock().unwrap().listening = true;
    }

    async fn stop_listening(&mut self) {
        self.state.lock().unwrap().listening = false;
    }

    async fn available(&mut self) -> bool {
        !self.state.lock().unwrap().rx_queue.is_empty()
    }

    async fn read_packet(&mut self, len: usize) -> Vec<u8> {
        let mut state = self.state.lock().unwrap();
        let mut data = state.rx_queue.pop_front().unwrap_or_default();
        data.truncate(len);
        data
    }

    async fn write_packet(&mut self, data: &[u8]) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.write_ok {
            return false;
        }
        state.tx_log.push(data.to_vec());
        true
    }

    async fn write_ack_payload(&mut self, pipe: usize, data: &[u8]) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.fifo_full || !state.ack_write_ok {
            return false;
        }
        state.ack_payload_log.push((pipe, data.to_vec()));
        true
    }

    async fn take_ack_payload(&mut self) -> Option<Vec<u8>> {
        self.state.lock().unwrap().ack_queue.pop_front()
    }

    async fn fifo_full(&mut self) -> bool {
        self.state.lock().unwrap().fifo_full
    }

    async fn flush_tx(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fifo_full = false;
        state.flush_count += 1;
    }
}
