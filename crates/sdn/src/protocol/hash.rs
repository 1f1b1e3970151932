// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! FNV-1a hashing shared by topic UIDs and multicast derivation.

const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over a byte string.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV1A_OFFSET_BASIS_64;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV1A_PRIME_64);
    }
    hash
}

/// Fold a 64-bit hash down to 16 bits by xoring the four 16-bit lanes.
pub fn fold16(hash: u64) -> u16 {
    let folded = (hash >> 32) ^ (hash & 0xFFFF_FFFF);
    ((folded >> 16) ^ (folded & 0xFFFF)) as u16
}

/// 16-bit hash of a name (topic UID / multicast derivation input).
pub fn hash16(name: &str) -> u16 {
    fold16(fnv1a_64(name.as_bytes()))
}
