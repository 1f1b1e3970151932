// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed packet header preceding every on-wire payload.
//!
//! The header is itself a [`TypeDescriptor`] instance with well-known
//! attribute names, so the same engine that lays out topic payloads lays
//! out the envelope. Multi-byte numeric fields are byte-swapped explicitly
//! at the wire boundary; the magic stamp and version string are not, which
//! lets a receiver infer the sender's endianness from whether the stamp
//! reads correctly.

use crate::config::{HEADER_SIZE, HEADER_UID, HEADER_VERSION};
use crate::error::{Error, Result};
use crate::types::{ScalarKind, TypeDescriptor};
use std::time::{SystemTime, UNIX_EPOCH};

/// Well-known attribute ranks of the header schema.
pub const RANK_HEADER_UID: usize = 0;
pub const RANK_HEADER_VERSION: usize = 1;
pub const RANK_HEADER_SIZE: usize = 2;
pub const RANK_TOPIC_UID: usize = 3;
pub const RANK_TOPIC_VERSION: usize = 4;
pub const RANK_TOPIC_SIZE: usize = 5;
pub const RANK_TOPIC_COUNTER: usize = 6;
pub const RANK_SEND_TIME: usize = 7;
pub const RANK_RECV_TIME: usize = 8;

/// Nanoseconds since the Unix epoch.
pub fn clock_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// The fixed envelope preceding every payload.
#[derive(Debug, Clone)]
pub struct Header {
    desc: TypeDescriptor,
}

impl Header {
    /// Build the header schema and initialize the constant fields.
    pub fn new() -> Result<Self> {
        let mut desc = TypeDescriptor::new("sdn::Header");
        desc.add_attribute(Some(RANK_HEADER_UID), "header_uid", ScalarKind::Char, 4)?;
        desc.add_attribute(Some(RANK_HEADER_VERSION), "header_version", ScalarKind::Char, 4)?;
        desc.add_attribute(Some(RANK_HEADER_SIZE), "header_size", ScalarKind::U32, 1)?;
        desc.add_attribute(Some(RANK_TOPIC_UID), "topic_uid", ScalarKind::U32, 1)?;
        desc.add_attribute(Some(RANK_TOPIC_VERSION), "topic_version", ScalarKind::U32, 1)?;
        desc.add_attribute(Some(RANK_TOPIC_SIZE), "topic_size", ScalarKind::U32, 1)?;
        desc.add_attribute(Some(RANK_TOPIC_COUNTER), "topic_counter", ScalarKind::U64, 1)?;
        desc.add_attribute(Some(RANK_SEND_TIME), "send_time", ScalarKind::U64, 1)?;
        desc.add_attribute(Some(RANK_RECV_TIME), "recv_time", ScalarKind::U64, 1)?;
        desc.create_instance()?;
        desc.set_raw(RANK_HEADER_UID, &HEADER_UID)?;
        desc.set_raw(RANK_HEADER_VERSION, &HEADER_VERSION)?;
        desc.set_attribute(RANK_HEADER_SIZE, HEADER_SIZE as u32)?;
        Ok(Self { desc })
    }

    /// True when the leading bytes of `buf` carry the header magic stamp.
    pub fn is_valid(buf: &[u8]) -> bool {
        buf.len() >= HEADER_UID.len() && buf[..HEADER_UID.len()] == HEADER_UID
    }

    /// Bind topic identity (UID hash, version, payload size).
    pub fn set_topic(&mut self, uid: u16, version: u32, size: usize) -> Result<()> {
        self.desc.set_attribute(RANK_TOPIC_UID, u32::from(uid))?;
        self.desc.set_attribute(RANK_TOPIC_VERSION, version)?;
        self.desc.set_attribute(RANK_TOPIC_SIZE, size as u32)
    }

    /// Bump the monotonic per-topic counter (consumers use it to detect
    /// reordering and loss on their own; UDP gives no guarantee).
    pub fn increment_counter(&mut self) -> Result<u64> {
        let next = self.counter()? + 1;
        self.desc.set_attribute(RANK_TOPIC_COUNTER, next)?;
        Ok(next)
    }

    pub fn counter(&self) -> Result<u64> {
        self.desc.get_attribute(RANK_TOPIC_COUNTER)
    }

    pub fn topic_uid(&self) -> Result<u32> {
        self.desc.get_attribute(RANK_TOPIC_UID)
    }

    pub fn topic_version(&self) -> Result<u32> {
        self.desc.get_attribute(RANK_TOPIC_VERSION)
    }

    pub fn topic_size(&self) -> Result<u32> {
        self.desc.get_attribute(RANK_TOPIC_SIZE)
    }

    pub fn send_time(&self) -> Result<u64> {
        self.desc.get_attribute(RANK_SEND_TIME)
    }

    pub fn recv_time(&self) -> Result<u64> {
        self.desc.get_attribute(RANK_RECV_TIME)
    }

    /// Stamp the send timestamp with the current nanosecond clock.
    pub fn stamp_send_time(&mut self) -> Result<()> {
        self.desc.set_attribute(RANK_SEND_TIME, clock_ns())
    }

    /// Stamp the receive timestamp with the current nanosecond clock.
    pub fn stamp_recv_time(&mut self) -> Result<()> {
        self.desc.set_attribute(RANK_RECV_TIME, clock_ns())
    }

    /// The 48-byte wire image.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.desc.as_bytes()
    }

    /// Overwrite the wire image from a received buffer (magic checked).
    pub fn copy_from_bytes(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::SizeMismatch {
                declared: buf.len(),
                computed: HEADER_SIZE,
            });
        }
        if !Self::is_valid(buf) {
            return Err(Error::BadMagic);
        }
        self.desc.copy_from_bytes(&buf[..HEADER_SIZE])
    }

    /// Swap the multi-byte numeric fields to network order.
    ///
    /// The magic stamp and version string stay in native order; a no-op on
    /// big-endian hosts.
    pub fn to_network_byte_order(&mut self) -> Result<()> {
        self.swap_numeric_fields()
    }

    /// Swap the multi-byte numeric fields back to host order.
    pub fn from_network_byte_order(&mut self) -> Result<()> {
        self.swap_numeric_fields()
    }

    fn swap_numeric_fields(&mut self) -> Result<()> {
        if cfg!(target_endian = "big") {
            return Ok(());
        }
        for rank in RANK_HEADER_SIZE..=RANK_RECV_TIME {
            let mut bytes = self.desc.get_raw(rank)?.to_vec();
            bytes.reverse();
            self.desc.set_raw(rank, &bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = Header::new().expect("header");
        let bytes = header.as_bytes().expect("bytes");
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..4], b"SDNv");
        assert!(Header::is_valid(bytes));
        assert!(!Header::is_valid(b"RTPS"));
    }

    #[test]
    fn test_counter_monotonic() {
        let mut header = Header::new().expect("header");
        assert_eq!(header.counter().expect("counter"), 0);
        assert_eq!(header.increment_counter().expect("inc"), 1);
        assert_eq!(header.increment_counter().expect("inc"), 2);
    }

    #[test]
    fn test_byte_order_swap_preserves_magic() {
        let mut header = Header::new().expect("header");
        header.set_topic(0xBEEF, 3, 64).expect("set topic");
        header.increment_counter().expect("inc");
        let host_image = header.as_bytes().expect("bytes").to_vec();

        header.to_network_byte_order().expect("to net");
        let net_image = header.as_bytes().expect("bytes").to_vec();
        // Magic and version untouched either way.
        assert_eq!(&net_image[..8], &host_image[..8]);
        if cfg!(target_endian = "little") {
            assert_ne!(net_image, host_image);
        }

        header.from_network_byte_order().expect("from net");
        assert_eq!(header.as_bytes().expect("bytes"), &host_image[..]);
        assert_eq!(header.topic_uid().expect("uid"), 0xBEEF);
        assert_eq!(header.topic_size().expect("size"), 64);
    }

    #[test]
    fn test_copy_from_bytes_checks_magic() {
        let sender = {
            let mut h = Header::new().expect("header");
            h.set_topic(7, 1, 16).expect("set topic");
            h.stamp_send_time().expect("stamp");
            h
        };
        let wire = sender.as_bytes().expect("bytes").to_vec();

        let mut receiver = Header::new().expect("header");
        receiver.copy_from_bytes(&wire).expect("copy");
        assert_eq!(receiver.topic_uid().expect("uid"), 7);

        let mut bogus = wire.clone();
        bogus[0] = b'X';
        assert!(matches!(receiver.copy_from_bytes(&bogus), Err(Error::BadMagic)));
    }
}
