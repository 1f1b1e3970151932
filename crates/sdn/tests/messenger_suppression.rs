// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-message suppression: a process hears its own multicast exactly
//! never on the messenger, and a plain subscriber in the same process
//! hears it exactly once.

#![cfg(target_os = "linux")]

use sdn::error::Error;
use sdn::topic::{Metadata, Topic};
use sdn::transport::{Endpoint, Messenger, Subscriber};
use std::time::Duration;

#[test]
fn test_subscriber_sees_one_copy_messenger_sees_none() {
    let mut topic = Topic::new(Metadata::new("T-suppress", 24));
    topic.configure().expect("configure");

    let mut subscriber = Subscriber::from_topic("lo", &topic).expect("subscriber");
    subscriber.open().expect("open subscriber");
    subscriber.set_timeout(Some(Duration::from_millis(500)));

    let mut messenger = Messenger::from_topic("lo", &topic).expect("messenger");
    messenger.open().expect("open messenger");
    messenger.set_timeout(Some(Duration::from_millis(500)));

    let payload = b"one datagram, one delivery";
    messenger.publish(payload).expect("publish");

    // The subscriber gets the single copy.
    let received = subscriber.receive().expect("receive");
    assert_eq!(&subscriber.buffer()[..received], payload.as_slice());

    // The messenger's loopback copy is suppressed by CRC, and no second
    // copy ever arrives.
    assert!(matches!(messenger.receive(), Err(Error::SelfMessage)));
    assert!(matches!(messenger.receive(), Err(Error::Timeout)));
    assert!(!messenger.is_updated());

    // Exactly once: the subscriber's next attempt times out.
    assert!(matches!(subscriber.receive(), Err(Error::Timeout)));
}

#[test]
fn test_two_messengers_reply_path() {
    let mut topic = Topic::new(Metadata::new("T-reply", 16));
    topic.configure().expect("configure");

    let mut alpha = Messenger::from_topic("lo", &topic).expect("alpha");
    alpha.open().expect("open alpha");
    alpha.set_timeout(Some(Duration::from_millis(500)));

    let mut beta = Messenger::from_topic("lo", &topic).expect("beta");
    beta.open().expect("open beta");
    beta.set_timeout(Some(Duration::from_millis(500)));

    alpha.publish(b"request").expect("publish");

    // Beta accepts alpha's datagram; alpha suppresses its own copy.
    let received = beta.receive().expect("receive request");
    assert_eq!(&beta.buffer()[..received], b"request");
    assert!(matches!(alpha.receive(), Err(Error::SelfMessage)));

    // Beta recorded alpha's source address and can reply to it.
    // Delivery to a specific socket among several sharing the port is
    // kernel-dependent, so only the send path is asserted here.
    assert!(beta.reply_address().is_some());
    let sent = beta.reply(b"response").expect("reply");
    assert_eq!(sent, b"response".len());
}
