// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bidirectional participant: one socket for both send and receive.
//!
//! A multicast socket that sends to its own group also receives its own
//! transmission. Before every send the messenger caches a CRC-32 of the
//! outgoing datagram as its "self-message UID"; a received datagram whose
//! CRC matches is discarded as loopback. The sender address of the last
//! accepted datagram becomes the reply-to target.

use crate::error::{Error, Result};
use crate::protocol::crc32;
use crate::topic::Topic;
use crate::transport::participant::{
    zero_length_text_size, Callback, Endpoint, ParticipantCore, Topology,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// No self-message recorded yet (CRC-32 values occupy the low 32 bits).
const NO_SELF_UID: u64 = u64::MAX;

/// Request/reply participant over one duplex socket.
pub struct Messenger {
    core: ParticipantCore,
    timeout: Option<Duration>,
    updated: AtomicBool,
    self_uid: AtomicU64,
    reply_to: Option<SocketAddr>,
    post_receive: Option<Callback>,
}

impl Messenger {
    /// Multicast messenger joined to an explicit group:port.
    pub fn multicast(iface_name: &str, group: Ipv4Addr, port: u16) -> Result<Self> {
        Ok(Self {
            core: ParticipantCore::new(Topology::Multicast, iface_name, group, port)?,
            timeout: None,
            updated: AtomicBool::new(false),
            self_uid: AtomicU64::new(NO_SELF_UID),
            reply_to: None,
            post_receive: None,
        })
    }

    /// Unicast messenger bound to the interface at `port`.
    pub fn unicast(iface_name: &str, peer: Ipv4Addr, port: u16) -> Result<Self> {
        Ok(Self {
            core: ParticipantCore::new(Topology::Unicast, iface_name, peer, port)?,
            timeout: None,
            updated: AtomicBool::new(false),
            self_uid: AtomicU64::new(NO_SELF_UID),
            reply_to: None,
            post_receive: None,
        })
    }

    /// Messenger on a configured topic's mapping.
    pub fn from_topic(iface_name: &str, topic: &Topic) -> Result<Self> {
        let (group, port) = topic.mapping()?;
        Self::multicast(iface_name, group, port)
    }

    /// Bound every receive by `timeout` (`None` = block indefinitely).
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Hook run on the received datagram after every accepted receive.
    pub fn set_callback(&mut self, callback: Callback) {
        self.post_receive = Some(callback);
    }

    /// Send to the group, caching the self-message UID first.
    pub fn publish(&mut self, payload: &[u8]) -> Result<usize> {
        if !self.core.is_open() {
            return Err(Error::NotOpen);
        }
        self.self_uid
            .store(u64::from(crc32(payload)), Ordering::SeqCst);
        let sent = self.core.send(payload)?;
        log::debug!("[MSG] sent {} bytes to {}", sent, self.core.destination());
        Ok(sent)
    }

    /// One receive attempt with loop suppression.
    ///
    /// A datagram matching the cached self-message UID fails this attempt
    /// with [`Error::SelfMessage`]; the messenger stays open and usable.
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
        let uid = u64::from(crc32(&self.core.buffer()[..len]));
        if uid == self.self_uid.load(Ordering::SeqCst) {
            log::debug!("[MSG] suppressed own datagram ({} bytes)", len);
            return Err(Error::SelfMessage);
        }
        self.reply_to = Some(from);
        if let Some(hook) = self.post_receive.as_mut() {
            hook(&mut self.core.buffer_mut()[..len]);
        }
        self.updated.store(true, Ordering::SeqCst);
        log::debug!("[MSG] received {} bytes from {}", len, from);
        Ok(len)
    }

    /// Send to the sender of the last accepted datagram.
    pub fn reply(&mut self, payload: &[u8]) -> Result<usize> {
        if !self.core.is_open() {
            return Err(Error::NotOpen);
        }
        let dest = self.reply_to.ok_or(Error::NoReplyAddress)?;
        self.self_uid
            .store(u64::from(crc32(payload)), Ordering::SeqCst);
        let sent = self.core.send_to(payload, dest)?;
        log::debug!("[MSG] replied {} bytes to {}", sent, dest);
        Ok(sent)
    }

    /// True when the last receive attempt accepted a datagram.
    pub fn is_updated(&self) -> bool {
        self.updated.load(Ordering::SeqCst)
    }

    /// Reply-to target recorded by the last accepted receive.
    pub fn reply_address(&self) -> Option<SocketAddr> {
        self.reply_to
    }

    fn effective_length(&self, len: usize) -> usize {
        if len == 0 && self.core.topology() == Topology::Multicast {
            // Same legacy text convention as the subscriber path.
            return zero_length_text_size(self.core.buffer());
        }
        len
    }
}

impl Endpoint for Messenger {
    fn open(&mut self) -> Result<()> {
        self.core.open_duplex()
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
    fn test_reply_requires_prior_receive() {
        let mut messenger =
            Messenger::multicast("lo", Ipv4Addr::new(239, 0, 79, 1), 43201).expect("messenger");
        assert!(matches!(messenger.reply(b"x"), Err(Error::NotOpen)));

        #[cfg(target_os = "linux")]
        {
            messenger.open().expect("open");
            assert!(matches!(messenger.reply(b"x"), Err(Error::NoReplyAddress)));
        }
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_self_message_suppressed() {
        let mut messenger =
            Messenger::multicast("lo", Ipv4Addr::new(239, 0, 79, 2), 43202).expect("messenger");
        messenger.open().expect("open");
        messenger.set_timeout(Some(Duration::from_millis(500)));

        messenger.publish(b"ping from self").expect("publish");
        // The loopback copy of our own datagram is discarded.
        assert!(matches!(messenger.receive(), Err(Error::SelfMessage)));
        assert!(!messenger.is_updated());
        // The messenger stays open for the next attempt.
        assert!(messenger.is_open());
    }
}
