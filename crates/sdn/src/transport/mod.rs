// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP participants.
//!
//! Three endpoint flavors share one [`ParticipantCore`]:
//!
//! * [`Publisher`]  - one-way sender bound to a topic mapping
//! * [`Subscriber`] - one-way receiver joined to a topic mapping
//! * [`Messenger`]  - duplex socket with self-message suppression
//!
//! All three work over multicast or unicast ([`Topology`]) and carry a
//! fixed receive/stage buffer sized for the largest IPv4 UDP payload.

pub mod iface;
pub mod messenger;
pub mod participant;
pub mod publisher;
pub mod subscriber;

pub use iface::{default_interface_name, resolve_interface};
pub use messenger::Messenger;
pub use participant::{Callback, Endpoint, ParticipantCore, Topology};
pub use publisher::Publisher;
pub use subscriber::Subscriber;
