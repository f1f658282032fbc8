//! Additive 8-bit checksum shared by the host-link framing and the
//! configuration frame.
//!
//! This is the truncated byte sum the original deployment standardized on.
//! It detects accidental single- or few-byte corruption only; it is not a
//! strong integrity check and offers no protection against tampering.

/// Computes the 8-bit wrapping sum of the input bytes.
pub fn compute(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}
