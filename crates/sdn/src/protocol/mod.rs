// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire envelope: `[Header][Topic payload][Footer?]`.
//!
//! Both envelope halves are built with the type-description engine itself,
//! so their layout comes from the same offset computation as user payloads.

/// Optional trailing envelope with payload CRC.
pub mod footer;
/// FNV-1a hashing (topic UIDs, multicast derivation).
pub mod hash;
/// Fixed envelope preceding every payload.
pub mod header;

pub use footer::Footer;
pub use header::{clock_ns, Header};

/// CRC-32 of a byte buffer (footer integrity, messenger self-message UID).
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_vector() {
        // CRC-32 (IEEE) of "123456789".
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }
}
