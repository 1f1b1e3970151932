// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # SDN - Simple Data Network
//!
//! A real-time publish/subscribe data-distribution layer for control-system
//! networks: producers and consumers exchange strongly-typed, self-describing
//! topics over UDP multicast or unicast, and a text-based discovery protocol
//! lets peers find each other and introspect topic schemas without
//! out-of-band coordination.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sdn::topic::{Metadata, Topic};
//! use sdn::transport::{Endpoint, Publisher};
//! use sdn::Result;
//!
//! fn main() -> Result<()> {
//!     // A topic named "T1" carrying 64 opaque bytes; the multicast
//!     // group and port derive deterministically from the name.
//!     let mut topic = Topic::new(Metadata::new("T1", 64));
//!     topic.configure()?;
//!
//!     let mut publisher = Publisher::from_topic("lo", &topic)?;
//!     publisher.open()?;
//!     publisher.publish(&[0u8; 64])?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +------------------------------------------------------------------+
//! |                        Application Layer                         |
//! |        Topic + TypeDescriptor -> typed attribute access          |
//! +------------------------------------------------------------------+
//! |                         Protocol Layer                           |
//! |   Header/Footer envelope | topic UID hashing | payload CRC       |
//! +------------------------------------------------------------------+
//! |                        Transport Layer                           |
//! |   Publisher | Subscriber | Messenger  (UDP mcast / ucast)        |
//! +------------------------------------------------------------------+
//! |                        Discovery Layer                           |
//! |   query / startup / shutdown / update / response over mcast      |
//! +------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`types::TypeDescriptor`] | Runtime schema plus optional bound instance buffer |
//! | [`topic::Topic`] | Named, versioned schema bound to a multicast mapping |
//! | [`protocol::Header`] | Fixed envelope stamped onto every on-wire payload |
//! | [`transport::Publisher`] | One-way sender bound to a topic mapping |
//! | [`transport::Subscriber`] | One-way receiver with timeout-bounded receive |
//! | [`transport::Messenger`] | Duplex endpoint with self-message suppression |
//! | [`discovery::DiscoveryManager`] | Caller-driven announce/query handler |
//!
//! ## Modules Overview
//!
//! - [`types`] - runtime type-description engine (start here)
//! - [`protocol`] - wire envelope and hashing
//! - [`topic`] - topic binding and multicast derivation
//! - [`transport`] - UDP participants
//! - [`discovery`] - peer/topic discovery protocol

pub mod config;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod topic;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use topic::{Metadata, Topic};
pub use transport::{Endpoint, Messenger, Publisher, Subscriber};
pub use types::TypeDescriptor;

/// Library version from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
