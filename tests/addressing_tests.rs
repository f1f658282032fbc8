//! Property tests for channel addressing: address derivation, frequency
//! bands and the injectivity of the channel-to-pipe mapping.

use proptest::prelude::*;
use sensornet_rs::constants::{CHANNEL_ZERO, FREQ_BASE, PIPES_PER_RADIO};
use sensornet_rs::{address_for, frequency_for, pipe_location};
use std::collections::HashSet;

proptest! {
    /// The high address bytes are the shared network base for every channel.
    #[test]
    fn address_preserves_network_base(channel in any::<u8>()) {
        prop_assert_eq!(address_for(channel) & !0xFF, CHANNEL_ZERO);
        prop_assert_eq!(address_for(channel) & 0xFF, channel as u64);
    }

    /// Distinct channel ids always derive distinct addresses.
    #[test]
    fn address_is_injective(a in any::<u8>(), b in any::<u8>()) {
        prop_assume!(a != b);
        prop_assert_ne!(address_for(a), address_for(b));
    }

    /// Channels within one frequency band map to one radio, and the band
    /// index matches the radio index.
    #[test]
    fn frequency_matches_radio_index(channel in 1u8..=18, radios in 3usize..=4) {
        let (radio, _) = pipe_location(channel, radios).unwrap();
        prop_assert_eq!(frequency_for(channel), FREQ_BASE + radio as u8);
    }
}

/// No two provisioned channel ids collide on the same radio+pipe slot.
#[test]
fn pipe_location_is_injective_over_provisioned_range() {
    let radios = 3;
    let mut seen = HashSet::new();
    for channel in 1..=(radios * PIPES_PER_RADIO) as u8 {
        let slot = pipe_location(channel, radios).unwrap();
        assert!(slot.0 < radios);
        assert!(slot.1 < PIPES_PER_RADIO);
        assert!(seen.insert(slot), "channel {channel} collides on {slot:?}");
    }
}

/// Out-of-range ids error instead of silently wrapping onto another pipe.
#[test]
fn pipe_location_signals_out_of_range() {
    assert!(pipe_location(0, 3).is_err());
    assert!(pipe_location(200, 3).is_err());
    assert!(pipe_location(18, 3).is_ok());
}
