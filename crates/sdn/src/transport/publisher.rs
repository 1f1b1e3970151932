// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One-way sender bound to a topic mapping.

use crate::error::{Error, Result};
use crate::topic::Topic;
use crate::transport::participant::{Callback, Endpoint, ParticipantCore, Topology};
use std::net::Ipv4Addr;

/// Publishing participant: best-effort datagram sends to one mapping.
pub struct Publisher {
    core: ParticipantCore,
    source_port: u16,
    pre_publish: Option<Callback>,
}

impl Publisher {
    /// Multicast publisher for an explicit group:port.
    pub fn multicast(iface_name: &str, group: Ipv4Addr, port: u16) -> Result<Self> {
        Ok(Self {
            core: ParticipantCore::new(Topology::Multicast, iface_name, group, port)?,
            source_port: 0,
            pre_publish: None,
        })
    }

    /// Unicast publisher targeting one peer.
    pub fn unicast(iface_name: &str, peer: Ipv4Addr, port: u16) -> Result<Self> {
        Ok(Self {
            core: ParticipantCore::new(Topology::Unicast, iface_name, peer, port)?,
            source_port: 0,
            pre_publish: None,
        })
    }

    /// Publisher on a configured topic's mapping.
    pub fn from_topic(iface_name: &str, topic: &Topic) -> Result<Self> {
        let (group, port) = topic.mapping()?;
        Self::multicast(iface_name, group, port)
    }

    /// Explicit source port (0 = ephemeral). Takes effect at open.
    pub fn set_source_port(&mut self, port: u16) -> Result<()> {
        if self.core.is_open() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "source port fixed while open",
            )));
        }
        self.source_port = port;
        Ok(())
    }

    /// Hook run on the staged datagram immediately before every send.
    pub fn set_callback(&mut self, callback: Callback) {
        self.pre_publish = Some(callback);
    }

    /// Stage `payload`, run the pre-publish hook, send. Best effort: a
    /// would-block send drops the datagram and reports 0 bytes.
    pub fn publish(&mut self, payload: &[u8]) -> Result<usize> {
        if !self.core.is_open() {
            return Err(Error::NotOpen);
        }
        if payload.len() > self.core.max_payload() {
            return Err(Error::SizeMismatch {
                declared: payload.len(),
                computed: self.core.max_payload(),
            });
        }
        self.core.buffer_mut()[..payload.len()].copy_from_slice(payload);
        if let Some(hook) = self.pre_publish.as_mut() {
            // Hook sees (and may rewrite) the staged bytes, not the caller's.
            let staged = &mut self.core.buffer_mut()[..payload.len()];
            hook(staged);
        }
        let dest = self.core.destination();
        let sent = {
            let staged = &self.core.buffer()[..payload.len()];
            self.core.send_to(staged, dest)?
        };
        log::debug!("[PUB] sent {} bytes to {}", sent, dest);
        Ok(sent)
    }
}

impl Endpoint for Publisher {
    fn open(&mut self) -> Result<()> {
        self.core.open_sender(self.source_port)
    }

    fn close(&mut self) {
        self.core.close();
    }

    fn is_open(&self) -> bool {
        self.core.is_open()
    }

    fn buffer(&self) -> &[u8] {
        self.core.buffer()
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        self.core.buffer_mut()
    }

    fn set_buffer_depth(&mut self, depth: usize) -> Result<()> {
        self.core.set_buffer_depth(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_publish_requires_open() {
        let mut publisher =
            Publisher::multicast("lo", Ipv4Addr::new(239, 0, 77, 1), 43001).expect("publisher");
        assert!(matches!(publisher.publish(b"data"), Err(Error::NotOpen)));

        publisher.open().expect("open");
        let sent = publisher.publish(b"data").expect("publish");
        assert_eq!(sent, 4);
        publisher.close();
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_payload_ceiling_enforced() {
        let mut publisher =
            Publisher::multicast("lo", Ipv4Addr::new(239, 0, 77, 2), 43002).expect("publisher");
        publisher.open().expect("open");
        let oversized = vec![0u8; publisher.core.max_payload() + 1];
        assert!(matches!(
            publisher.publish(&oversized),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_pre_publish_hook_runs() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let mut publisher =
            Publisher::multicast("lo", Ipv4Addr::new(239, 0, 77, 3), 43003).expect("publisher");
        publisher.set_callback(Box::new(move |staged| {
            seen.fetch_add(staged.len(), Ordering::SeqCst);
        }));
        publisher.open().expect("open");
        publisher.publish(b"12345").expect("publish");
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }
}
