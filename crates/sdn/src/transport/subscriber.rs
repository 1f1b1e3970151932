// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One-way receiver joined to a topic mapping.

use crate::error::{Error, Result};
use crate::topic::Topic;
use crate::transport::participant::{
    zero_length_text_size, Callback, Endpoint, ParticipantCore, Topology,
};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Subscribing participant: blocking, optionally timeout-bounded receive.
///
/// The `updated` flag is cleared at the start of every receive attempt and
/// set only after a successful one; it is atomic so a status-polling thread
/// can observe it without a lock.
pub struct Subscriber {
    core: ParticipantCore,
    timeout: Option<Duration>,
    updated: AtomicBool,
    post_receive: Option<Callback>,
}

impl Subscriber {
    /// Multicast subscriber for an explicit group:port.
    pub fn multicast(iface_name: &str, group: Ipv4Addr, port: u16) -> Result<Self> {
        Ok(Self {
            core: ParticipantCore::new(Topology::Multicast, iface_name, group, port)?,
            timeout: None,
            updated: AtomicBool::new(false),
            post_receive: None,
        })
    }

    /// Unicast subscriber bound to the interface at `port`.
    pub fn unicast(iface_name: &str, port: u16) -> Result<Self> {
        let iface = crate::transport::iface::resolve_interface(iface_name)?;
        Ok(Self {
            core: ParticipantCore::new(Topology::Unicast, iface_name, iface, port)?,
            timeout: None,
            updated: AtomicBool::new(false),
            post_receive: None,
        })
    }

    /// Subscriber on a configured topic's mapping.
    pub fn from_topic(iface_name: &str, topic: &Topic) -> Result<Self> {
        let (group, port) = topic.mapping()?;
        Self::multicast(iface_name, group, port)
    }

    /// Bound every receive by `timeout` (`None` = block indefinitely).
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Hook run on the received datagram after every successful receive.
    pub fn set_callback(&mut self, callback: Callback) {
        self.post_receive = Some(callback);
    }

    /// One receive attempt. Suspends for up to the configured timeout via a
    /// readiness wait, then reads. Returns the datagram length.
    pub fn receive(&mut self) -> Result<usize> {
        self.updated.store(false, Ordering::SeqCst);
        if !self.core.is_open() {
            return Err(Error::NotOpen);
        }
        match self.timeout {
            Some(timeout) => {
                if !self.core.wait_readable(timeout)? {
                    return Err(Error::Timeout);
                }
            }
            None => {
                #[cfg(not(unix))]
                self.core.clear_read_timeout()?;
            }
        }
        let (len, from) = self.core.recv()?;
        let len = self.effective_length(len);
        if let Some(hook) = self.post_receive.as_mut() {
            hook(&mut self.core.buffer_mut()[..len]);
        }
        self.updated.store(true, Ordering::SeqCst);
        log::debug!("[SUB] received {} bytes from {}", len, from);
        Ok(len)
    }

    /// True when the last receive attempt completed successfully.
    pub fn is_updated(&self) -> bool {
        self.updated.load(Ordering::SeqCst)
    }

    fn effective_length(&self, len: usize) -> usize {
        if len == 0 && self.core.topology() == Topology::Multicast {
            // Legacy "zero length means full buffer" text convention;
            // suspect for binary payloads and deliberately not generalized.
            return zero_length_text_size(self.core.buffer());
        }
        len
    }
}

impl Endpoint for Subscriber {
    fn open(&mut self) -> Result<()> {
        self.core.open_receiver()
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
    fn test_receive_times_out_and_clears_updated() {
        let mut subscriber =
            Subscriber::multicast("lo", Ipv4Addr::new(239, 0, 78, 1), 43101).expect("subscriber");
        subscriber.open().expect("open");
        subscriber.set_timeout(Some(Duration::from_millis(20)));

        assert!(matches!(subscriber.receive(), Err(Error::Timeout)));
        assert!(!subscriber.is_updated());
    }

    #[test]
    fn test_receive_requires_open() {
        let mut subscriber =
            Subscriber::multicast("lo", Ipv4Addr::new(239, 0, 78, 2), 43102).expect("subscriber");
        assert!(matches!(subscriber.receive(), Err(Error::NotOpen)));
    }
}
