// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic metadata and deterministic multicast derivation.

use crate::config::{MCAST_BASE, PORT_SHIFT, PRIVILEGED_PORT_CEILING};
use crate::error::{Error, Result};
use crate::protocol::hash;
use std::net::Ipv4Addr;

/// Derive the deterministic class-D group and UDP port for a topic name.
///
/// Two processes naming the same topic converge on the same transport
/// address with no coordination: the 16-bit name hash `h` maps to
/// `239.0.(hi^0xFF).(lo^0xFF)`, and ports below 1024 are shifted up to
/// avoid privileged-port binds.
pub fn generate_mcast_address(name: &str) -> (Ipv4Addr, u16) {
    let h = hash::hash16(name);
    let hi = (h >> 8) as u8;
    let lo = (h & 0xFF) as u8;
    let group = Ipv4Addr::new(MCAST_BASE[0], MCAST_BASE[1], hi ^ 0xFF, lo ^ 0xFF);
    let port = if h < PRIVILEGED_PORT_CEILING {
        h + PORT_SHIFT
    } else {
        h
    };
    (group, port)
}

/// Parse a `"group:port"` mapping string.
pub fn parse_mapping(text: &str) -> Result<(Ipv4Addr, u16)> {
    let (addr, port) = text
        .split_once(':')
        .ok_or_else(|| Error::InvalidMapping(text.to_string()))?;
    let group: Ipv4Addr = addr
        .parse()
        .map_err(|_| Error::InvalidMapping(text.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| Error::InvalidMapping(text.to_string()))?;
    Ok((group, port))
}

/// Reject unusable group/port pairings before any socket is opened.
pub fn validate_mapping(group: Ipv4Addr, port: u16) -> Result<()> {
    if !group.is_multicast() {
        return Err(Error::InvalidMapping(format!("{} is not class-D", group)));
    }
    if port == 0 {
        return Err(Error::InvalidMapping("port 0".to_string()));
    }
    Ok(())
}

/// Topic identity before a schema is attached: name, declared size,
/// version and an optional explicit multicast mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub size: usize,
    pub version: u32,
    pub group: Option<Ipv4Addr>,
    pub port: Option<u16>,
}

impl Metadata {
    /// Explicit `(name, size)` form; the mapping is derived from the name.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            version: 1,
            group: None,
            port: None,
        }
    }

    /// Full `(name, size, group, port)` form with an explicit mapping.
    pub fn with_mapping(
        name: impl Into<String>,
        size: usize,
        group: Ipv4Addr,
        port: u16,
    ) -> Result<Self> {
        validate_mapping(group, port)?;
        Ok(Self {
            name: name.into(),
            size,
            version: 1,
            group: Some(group),
            port: Some(port),
        })
    }

    /// `sdn://group:port/name` URI form.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("sdn://")
            .ok_or_else(|| Error::InvalidMapping(uri.to_string()))?;
        let (mapping, name) = rest
            .split_once('/')
            .ok_or_else(|| Error::InvalidMapping(uri.to_string()))?;
        if name.is_empty() {
            return Err(Error::InvalidMapping(uri.to_string()));
        }
        let (group, port) = parse_mapping(mapping)?;
        validate_mapping(group, port)?;
        Ok(Self {
            name: name.to_string(),
            size: 0,
            version: 1,
            group: Some(group),
            port: Some(port),
        })
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcast_derivation_deterministic() {
        let (group_a, port_a) = generate_mcast_address("X");
        let (group_b, port_b) = generate_mcast_address("X");
        assert_eq!((group_a, port_a), (group_b, port_b));
        assert!(group_a.is_multicast());
        assert_eq!(group_a.octets()[0], 239);
        assert_eq!(group_a.octets()[1], 0);
        assert!(port_a >= PRIVILEGED_PORT_CEILING);
    }

    #[test]
    fn test_mcast_derivation_shape() {
        let h = crate::protocol::hash::hash16("T1");
        let (group, port) = generate_mcast_address("T1");
        let octets = group.octets();
        assert_eq!(octets[2], (h >> 8) as u8 ^ 0xFF);
        assert_eq!(octets[3], (h & 0xFF) as u8 ^ 0xFF);
        if h < PRIVILEGED_PORT_CEILING {
            assert_eq!(port, h + PORT_SHIFT);
        } else {
            assert_eq!(port, h);
        }
    }

    #[test]
    fn test_uri_form() {
        let meta = Metadata::from_uri("sdn://239.0.48.194:53053/T").expect("uri");
        assert_eq!(meta.name, "T");
        assert_eq!(meta.group, Some(Ipv4Addr::new(239, 0, 48, 194)));
        assert_eq!(meta.port, Some(53053));

        assert!(Metadata::from_uri("http://foo/T").is_err());
        assert!(Metadata::from_uri("sdn://239.0.0.1:70000/T").is_err());
        assert!(Metadata::from_uri("sdn://239.0.0.1:4000/").is_err());
    }

    #[test]
    fn test_validate_mapping() {
        assert!(validate_mapping(Ipv4Addr::new(239, 0, 1, 2), 4000).is_ok());
        assert!(validate_mapping(Ipv4Addr::new(192, 168, 0, 1), 4000).is_err());
        assert!(validate_mapping(Ipv4Addr::new(239, 0, 1, 2), 0).is_err());
    }

    #[test]
    fn test_with_mapping_rejects_invalid() {
        assert!(Metadata::with_mapping("T", 64, Ipv4Addr::new(10, 0, 0, 1), 4000).is_err());
    }
}
