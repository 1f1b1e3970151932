// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDN Global Configuration - Single Source of Truth
//!
//! This module centralizes all wire constants and runtime configuration.
//! **NEVER hardcode elsewhere!**
//!
//! - Magic stamps and envelope sizes for the packet header/footer
//! - Deterministic multicast derivation parameters
//! - Discovery group/port
//! - Payload ceilings per transport
//! - Environment variable names

use std::net::Ipv4Addr;

// =======================================================================
// Packet envelope
// =======================================================================

/// Magic stamp leading every packet header (4 bytes, never byte-swapped).
///
/// Left in the sender's native order on purpose: a receiver that reads the
/// stamp correctly knows the sender's endianness without negotiation.
pub const HEADER_UID: [u8; 4] = *b"SDNv";

/// Magic stamp leading the optional packet footer.
pub const FOOTER_UID: [u8; 4] = *b"SDNf";

/// Envelope version string, stored as char[4] (never byte-swapped).
pub const HEADER_VERSION: [u8; 4] = *b"2.0\0";

/// Fixed header byte size: uid[4] + version[4] + 4x u32 + 3x u64.
pub const HEADER_SIZE: usize = 48;

/// Fixed footer byte size: uid[4] + size u32 + source_uid u32 + crc u32.
pub const FOOTER_SIZE: usize = 16;

// =======================================================================
// Multicast derivation (deterministic topic name -> group:port)
// =======================================================================

/// First two octets of every derived class-D group (239.0.x.y).
pub const MCAST_BASE: [u8; 2] = [239, 0];

/// Ports below this bound are shifted to avoid privileged-port binds.
pub const PRIVILEGED_PORT_CEILING: u16 = 1024;

/// Shift applied to derived ports that fall below the privileged ceiling.
pub const PORT_SHIFT: u16 = 10_000;

// =======================================================================
// Discovery
// =======================================================================

/// Well-known multicast group for the discovery protocol.
pub const DISCOVERY_MCAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 0, 0, 1);

/// Well-known UDP port for the discovery protocol.
pub const DISCOVERY_MCAST_PORT: u16 = 10_002;

/// Schema version advertised in every discovery message.
pub const DISCOVERY_SCHEMA_VERSION: &str = "1.0";

// =======================================================================
// Type engine
// =======================================================================

/// Maximum attribute table bound (ranks 0..MAX_ATTRIBUTE_RANK).
pub const MAX_ATTRIBUTE_RANK: usize = 64;

// =======================================================================
// Payload ceilings and socket defaults
// =======================================================================

/// Maximum IPv4 UDP datagram payload (65535 - 20 IP - 8 UDP).
pub const MAX_IPV4_PAYLOAD: usize = 65_507;

/// Maximum topic payload over multicast: room is reserved for the
/// envelope so `[Header][payload][Footer]` still fits one datagram.
pub const MAX_MCAST_PAYLOAD: usize = MAX_IPV4_PAYLOAD - HEADER_SIZE - FOOTER_SIZE;

/// Maximum topic payload over unicast (raw IPv4 ceiling).
pub const MAX_UCAST_PAYLOAD: usize = MAX_IPV4_PAYLOAD;

/// Default SO_SNDBUF/SO_RCVBUF depth.
pub const DEFAULT_BUFFER_DEPTH: usize = MAX_IPV4_PAYLOAD;

// =======================================================================
// Environment
// =======================================================================

/// Selects the default local interface name when none is set programmatically.
pub const INTERFACE_ENV_VAR: &str = "SDN_INTERFACE_NAME";

/// Read the default interface name from the environment, if set and non-empty.
pub fn interface_from_env() -> Option<String> {
    match std::env::var(INTERFACE_ENV_VAR) {
        Ok(name) if !name.is_empty() => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_sizes_consistent() {
        // uid[4] + version[4] + header_size/topic_uid/topic_version/topic_size (4x u32)
        // + counter/send_time/recv_time (3x u64)
        assert_eq!(HEADER_SIZE, 4 + 4 + 4 * 4 + 3 * 8);
        assert_eq!(FOOTER_SIZE, 4 + 4 + 4 + 4);
        assert_eq!(MAX_MCAST_PAYLOAD + HEADER_SIZE + FOOTER_SIZE, MAX_IPV4_PAYLOAD);
    }

    #[test]
    fn test_discovery_group_is_class_d() {
        assert!(DISCOVERY_MCAST_GROUP.is_multicast());
        assert_ne!(DISCOVERY_MCAST_PORT, 0);
    }
}
