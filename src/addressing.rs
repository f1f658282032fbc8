//! # Channel Addressing
//!
//! Derives the radio-level identity of a logical channel: the 40-bit pipe
//! address, the RF channel (frequency) the node transmits on, and the
//! (radio, pipe) slot a multi-radio gateway listens for it on.
//!
//! Channels are grouped into bands of [`PIPES_PER_RADIO`] per physical radio:
//! channel ids 1..=6 land on radio 0, 7..=12 on radio 1, and so on. Every
//! radio listens on a single frequency with up to six pipe addresses open
//! simultaneously, and all addresses share the [`CHANNEL_ZERO`] high bytes so
//! the low byte alone disambiguates the pipes.

use crate::constants::{CHANNEL_ZERO, FREQ_BASE, PIPES_PER_RADIO};
use crate::error::SensorNetError;

/// Returns the 40-bit radio address for a logical channel id.
///
/// Pure and total over the 8-bit channel id domain.
pub fn address_for(channel: u8) -> u64 {
    CHANNEL_ZERO | channel as u64
}

/// Returns the RF channel number a logical channel transmits on.
///
/// Pure and total; channel id 0 wraps to the top band, matching the
/// arithmetic of the deployed firmware.
pub fn frequency_for(channel: u8) -> u8 {
    FREQ_BASE + channel.wrapping_sub(1) / PIPES_PER_RADIO as u8
}

/// Resolves a channel id to its (radio index, pipe index) slot on a gateway
/// provisioned with `radios` physical radios.
///
/// Channel id 0 is reserved and ids beyond `radios * PIPES_PER_RADIO` have no
/// slot; both signal [`SensorNetError::ChannelOutOfRange`] rather than
/// silently wrapping onto another channel's pipe.
pub fn pipe_location(channel: u8, radios: usize) -> Result<(usize, usize), SensorNetError> {
    if channel == 0 || channel as usize > radios * PIPES_PER_RADIO {
        return Err(SensorNetError::ChannelOutOfRange { channel, radios });
    }
    let slot = channel as usize - 1;
    Ok((slot / PIPES_PER_RADIO, slot % PIPES_PER_RADIO))
}
