// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Optional trailing envelope carrying an end-to-end payload CRC.
//!
//! Only present when configured; legacy subscribers use it for integrity
//! checking independent of the header.

use crate::config::{FOOTER_SIZE, FOOTER_UID};
use crate::error::{Error, Result};
use crate::protocol::crc32;
use crate::types::{ScalarKind, TypeDescriptor};

pub const RANK_FOOTER_UID: usize = 0;
pub const RANK_FOOTER_SIZE: usize = 1;
pub const RANK_SOURCE_UID: usize = 2;
pub const RANK_TOPIC_CRC: usize = 3;

/// The optional envelope following the payload.
#[derive(Debug, Clone)]
pub struct Footer {
    desc: TypeDescriptor,
}

impl Footer {
    pub fn new() -> Result<Self> {
        let mut desc = TypeDescriptor::new("sdn::Footer");
        desc.add_attribute(Some(RANK_FOOTER_UID), "footer_uid", ScalarKind::Char, 4)?;
        desc.add_attribute(Some(RANK_FOOTER_SIZE), "footer_size", ScalarKind::U32, 1)?;
        desc.add_attribute(Some(RANK_SOURCE_UID), "source_uid", ScalarKind::U32, 1)?;
        desc.add_attribute(Some(RANK_TOPIC_CRC), "topic_crc", ScalarKind::U32, 1)?;
        desc.create_instance()?;
        desc.set_raw(RANK_FOOTER_UID, &FOOTER_UID)?;
        desc.set_attribute(RANK_FOOTER_SIZE, FOOTER_SIZE as u32)?;
        Ok(Self { desc })
    }

    /// True when the leading bytes of `buf` carry the footer magic stamp.
    pub fn is_valid(buf: &[u8]) -> bool {
        buf.len() >= FOOTER_UID.len() && buf[..FOOTER_UID.len()] == FOOTER_UID
    }

    pub fn set_source_uid(&mut self, uid: u32) -> Result<()> {
        self.desc.set_attribute(RANK_SOURCE_UID, uid)
    }

    pub fn source_uid(&self) -> Result<u32> {
        self.desc.get_attribute(RANK_SOURCE_UID)
    }

    pub fn topic_crc(&self) -> Result<u32> {
        self.desc.get_attribute(RANK_TOPIC_CRC)
    }

    /// Stamp the CRC-32 of the topic payload.
    pub fn stamp_crc(&mut self, payload: &[u8]) -> Result<()> {
        self.desc.set_attribute(RANK_TOPIC_CRC, crc32(payload))
    }

    /// Verify the stored CRC against a received payload.
    pub fn check_crc(&self, payload: &[u8]) -> Result<()> {
        let expected = self.topic_crc()?;
        let got = crc32(payload);
        if expected != got {
            return Err(Error::CrcMismatch { expected, got });
        }
        Ok(())
    }

    /// The 16-byte wire image.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.desc.as_bytes()
    }

    /// Overwrite the wire image from a received buffer (magic checked).
    pub fn copy_from_bytes(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() < FOOTER_SIZE {
            return Err(Error::SizeMismatch {
                declared: buf.len(),
                computed: FOOTER_SIZE,
            });
        }
        if !Self::is_valid(buf) {
            return Err(Error::BadMagic);
        }
        self.desc.copy_from_bytes(&buf[..FOOTER_SIZE])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_layout() {
        let footer = Footer::new().expect("footer");
        let bytes = footer.as_bytes().expect("bytes");
        assert_eq!(bytes.len(), FOOTER_SIZE);
        assert_eq!(&bytes[..4], b"SDNf");
        assert!(Footer::is_valid(bytes));
    }

    #[test]
    fn test_crc_roundtrip() {
        let payload = b"sample payload bytes";
        let mut footer = Footer::new().expect("footer");
        footer.stamp_crc(payload).expect("stamp");
        footer.check_crc(payload).expect("check");

        let err = footer.check_crc(b"corrupted payload!!!");
        assert!(matches!(err, Err(Error::CrcMismatch { .. })));
    }

    #[test]
    fn test_footer_wire_roundtrip() {
        let mut sender = Footer::new().expect("footer");
        sender.set_source_uid(0x1234).expect("uid");
        sender.stamp_crc(b"data").expect("stamp");
        let wire = sender.as_bytes().expect("bytes").to_vec();

        let mut receiver = Footer::new().expect("footer");
        receiver.copy_from_bytes(&wire).expect("copy");
        assert_eq!(receiver.source_uid().expect("uid"), 0x1234);
        receiver.check_crc(b"data").expect("check");
    }
}
