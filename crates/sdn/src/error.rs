// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! Every fallible operation returns [`Result`]. There is no panic or abort
//! path in the core: configuration errors clear the owning schema/topic
//! "defined" flag, resource errors propagate immediately, and protocol
//! errors fail the current attempt while leaving the participant usable.

use std::fmt;
use std::io;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the type engine, topics, transport and discovery.
#[derive(Debug)]
pub enum Error {
    /// Interface name could not be resolved to an IPv4 address.
    InvalidInterface(String),
    /// Multicast/unicast mapping is unusable (non class-D group, port 0, ...).
    InvalidMapping(String),
    /// Declared size disagrees with the attached schema size.
    SizeMismatch { declared: usize, computed: usize },
    /// Attribute rank beyond the maximum table bound.
    RankOutOfBounds { rank: usize, max: usize },
    /// Attribute rank already occupied.
    RankOccupied(usize),
    /// Attribute multiplicity of zero.
    InvalidMultiplicity(String),
    /// Schema mutated after an instance was created.
    InstanceBound(String),
    /// Schema or topic is not (or no longer) fully defined.
    NotDefined(String),
    /// No attribute with the given rank or name.
    AttributeNotFound(String),
    /// Declared attribute type does not match the requested type.
    TypeMismatch { expected: String, got: String },
    /// Textual value could not be converted to the attribute type.
    ParseValue { attribute: String, text: String },
    /// Socket or allocation failure.
    Io(io::Error),
    /// Received text does not match the expected envelope.
    MalformedMessage(String),
    /// Datagram is our own prior transmission (multicast loopback).
    SelfMessage,
    /// Footer CRC does not match the payload.
    CrcMismatch { expected: u32, got: u32 },
    /// Buffer does not start with the expected magic stamp.
    BadMagic,
    /// Bounded receive expired without data.
    Timeout,
    /// Reply attempted before any successful receive.
    NoReplyAddress,
    /// Operation requires an open socket.
    NotOpen,
    /// Buffer depth outside the valid range for the transport.
    InvalidBufferDepth { depth: usize, max: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInterface(name) => write!(f, "Cannot resolve interface: {}", name),
            Self::InvalidMapping(msg) => write!(f, "Invalid address mapping: {}", msg),
            Self::SizeMismatch { declared, computed } => {
                write!(f, "Size mismatch: declared {} != computed {}", declared, computed)
            }
            Self::RankOutOfBounds { rank, max } => {
                write!(f, "Attribute rank out of bounds: {} >= {}", rank, max)
            }
            Self::RankOccupied(rank) => write!(f, "Attribute rank already occupied: {}", rank),
            Self::InvalidMultiplicity(name) => {
                write!(f, "Attribute multiplicity must be nonzero: {}", name)
            }
            Self::InstanceBound(name) => {
                write!(f, "Schema already has a bound instance: {}", name)
            }
            Self::NotDefined(name) => write!(f, "Schema/topic not defined: {}", name),
            Self::AttributeNotFound(name) => write!(f, "Attribute not found: {}", name),
            Self::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
            Self::ParseValue { attribute, text } => {
                write!(f, "Cannot parse value for attribute {}: '{}'", attribute, text)
            }
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::MalformedMessage(msg) => write!(f, "Malformed discovery message: {}", msg),
            Self::SelfMessage => write!(f, "Discarded own multicast transmission"),
            Self::CrcMismatch { expected, got } => {
                write!(f, "CRC mismatch: expected {:#010x}, got {:#010x}", expected, got)
            }
            Self::BadMagic => write!(f, "Buffer does not carry the expected magic stamp"),
            Self::Timeout => write!(f, "Receive timed out"),
            Self::NoReplyAddress => write!(f, "No reply address recorded (no prior receive)"),
            Self::NotOpen => write!(f, "Participant socket is not open"),
            Self::InvalidBufferDepth { depth, max } => {
                write!(f, "Buffer depth {} outside 1..={}", depth, max)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrip() {
        let err = Error::RankOutOfBounds { rank: 70, max: 64 };
        assert_eq!(err.to_string(), "Attribute rank out of bounds: 70 >= 64");

        let err = Error::TypeMismatch {
            expected: "uint32".to_string(),
            got: "float64".to_string(),
        };
        assert!(err.to_string().contains("expected uint32"));

        // Reads as a range at both ends of the bound.
        let err = Error::InvalidBufferDepth { depth: 0, max: 4096 };
        assert_eq!(err.to_string(), "Buffer depth 0 outside 1..=4096");
    }

    #[test]
    fn test_io_source() {
        use std::error::Error as _;
        let err = Error::from(io::Error::new(io::ErrorKind::Other, "bind failed"));
        assert!(err.source().is_some());
        assert!(Error::Timeout.source().is_none());
    }
}
