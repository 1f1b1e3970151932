// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local interface name resolution.

use crate::config;
use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv4Addr};

/// Resolve an interface name (`"lo"`, `"eth0"`, ...) to its IPv4 address.
///
/// Loopback is a legitimate answer here; single-host deployments bind
/// everything to `lo`.
pub fn resolve_interface(name: &str) -> Result<Ipv4Addr> {
    let interfaces = local_ip_address::list_afinet_netifas()
        .map_err(|err| Error::InvalidInterface(format!("{}: {}", name, err)))?;
    for (ifname, ip) in interfaces {
        if ifname == name {
            if let IpAddr::V4(ipv4) = ip {
                log::debug!("[IFACE] {} -> {}", name, ipv4);
                return Ok(ipv4);
            }
        }
    }
    Err(Error::InvalidInterface(name.to_string()))
}

/// Default interface name from the environment.
///
/// An unset or empty variable is a configuration error: participants never
/// guess an interface.
pub fn default_interface_name() -> Result<String> {
    config::interface_from_env().ok_or_else(|| {
        Error::InvalidInterface(format!("{} is not set", config::INTERFACE_ENV_VAR))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_resolve_loopback() {
        let addr = resolve_interface("lo").expect("loopback should exist");
        assert!(addr.is_loopback());
    }

    #[test]
    fn test_resolve_unknown_interface() {
        assert!(matches!(
            resolve_interface("definitely-not-an-interface0"),
            Err(Error::InvalidInterface(_))
        ));
    }
}
