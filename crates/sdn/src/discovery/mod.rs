// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peer and topic discovery without a central registry.
//!
//! Every process multicasts announcements and queries on one well-known
//! group; a [`DiscoveryManager`] answers queries for its registered topics
//! and folds observed announcements into a local peer table.

pub mod manager;
pub mod message;

pub use manager::{DiscoveryManager, PeerRecord, Role};
pub use message::{DiscoveryMessage, Group, Qualifier, WILDCARD};
