// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end publish/subscribe over the loopback interface.

#![cfg(target_os = "linux")]

use sdn::config::{FOOTER_SIZE, HEADER_SIZE};
use sdn::error::Error;
use sdn::protocol::{Footer, Header};
use sdn::topic::{Metadata, Topic};
use sdn::transport::{Endpoint, Publisher, Subscriber};
use std::time::Duration;

/// A topic named "T1" with 64 opaque bytes and no explicit mapping; both
/// ends derive the same group:port from the name alone.
#[test]
fn test_publish_receive_round_trip() {
    let mut topic = Topic::new(Metadata::new("T1", 64));
    topic.configure().expect("configure");

    let mut subscriber = Subscriber::from_topic("lo", &topic).expect("subscriber");
    subscriber.open().expect("open subscriber");
    subscriber.set_timeout(Some(Duration::from_secs(1)));

    let mut publisher = Publisher::from_topic("lo", &topic).expect("publisher");
    publisher.open().expect("open publisher");

    let mut payload = vec![0u8; topic.size()];
    for byte in payload.iter_mut() {
        *byte = fastrand::u8(..);
    }
    let sent = publisher.publish(&payload).expect("publish");
    assert_eq!(sent, topic.size());

    let received = subscriber.receive().expect("receive");
    assert_eq!(received, topic.size());
    assert!(subscriber.is_updated());
    assert_eq!(&subscriber.buffer()[..received], payload.as_slice());
}

/// Enveloped payload: header stamped by a pre-publish hook survives the
/// wire and validates at the receiver.
#[test]
fn test_enveloped_payload_over_wire() {
    let mut topic = Topic::new(Metadata::new("T1-enveloped", 32));
    topic.configure().expect("configure");

    let mut header = Header::new().expect("header");
    header
        .set_topic(topic.uid(), topic.version(), topic.size())
        .expect("set topic");
    header.increment_counter().expect("counter");
    header.stamp_send_time().expect("send time");

    let mut footer = Footer::new().expect("footer");
    let body = [0xA5u8; 32];
    footer.stamp_crc(&body).expect("crc");

    let mut datagram = Vec::new();
    datagram.extend_from_slice(header.as_bytes().expect("header bytes"));
    datagram.extend_from_slice(&body);
    datagram.extend_from_slice(footer.as_bytes().expect("footer bytes"));

    let mut subscriber = Subscriber::from_topic("lo", &topic).expect("subscriber");
    subscriber.open().expect("open subscriber");
    subscriber.set_timeout(Some(Duration::from_secs(1)));

    let mut publisher = Publisher::from_topic("lo", &topic).expect("publisher");
    publisher.open().expect("open publisher");
    publisher.publish(&datagram).expect("publish");

    let received = subscriber.receive().expect("receive");
    assert_eq!(received, datagram.len());

    let buffer = subscriber.buffer();
    assert!(Header::is_valid(&buffer[..received]));

    let mut rx_header = Header::new().expect("rx header");
    rx_header
        .copy_from_bytes(&buffer[..HEADER_SIZE])
        .expect("copy header");
    assert_eq!(rx_header.topic_uid().expect("uid"), u32::from(topic.uid()));
    assert_eq!(rx_header.topic_size().expect("size"), topic.size() as u32);

    let mut rx_footer = Footer::new().expect("rx footer");
    rx_footer
        .copy_from_bytes(&buffer[received - FOOTER_SIZE..received])
        .expect("copy footer");
    let body_end = received - FOOTER_SIZE;
    rx_footer
        .check_crc(&buffer[HEADER_SIZE..body_end])
        .expect("crc check");
}

/// Buffer depth plumbing: rejected values error, accepted values apply
/// while the socket is open.
#[test]
fn test_buffer_depth_bounds() {
    let mut topic = Topic::new(Metadata::new("T1-depth", 16));
    topic.configure().expect("configure");

    let mut publisher = Publisher::from_topic("lo", &topic).expect("publisher");
    publisher.open().expect("open");

    assert!(publisher.set_buffer_depth(0).is_err());
    assert!(publisher.set_buffer_depth(usize::MAX).is_err());
    publisher.set_buffer_depth(1 << 20).expect("valid depth");
}

/// A receive queue smaller than the offered traffic drops datagrams at the
/// kernel rather than silently absorbing them: draining stops short of the
/// published count at some sequence index.
#[test]
fn test_small_depth_drops_excess_datagrams() {
    let mut topic = Topic::new(Metadata::new("T1-overrun", 1024));
    topic.configure().expect("configure");

    let mut subscriber = Subscriber::from_topic("lo", &topic).expect("subscriber");
    subscriber.set_buffer_depth(2048).expect("small depth");
    subscriber.open().expect("open subscriber");
    subscriber.set_timeout(Some(Duration::from_millis(200)));

    let mut publisher = Publisher::from_topic("lo", &topic).expect("publisher");
    publisher.open().expect("open publisher");

    let payload = vec![0x5Au8; topic.size()];
    let published = 64;
    for _ in 0..published {
        publisher.publish(&payload).expect("publish");
    }

    // Drain everything the kernel queued before the depth was exhausted.
    let mut received = 0;
    loop {
        match subscriber.receive() {
            Ok(len) => {
                assert_eq!(len, topic.size());
                received += 1;
            }
            Err(Error::Timeout) => break,
            Err(err) => panic!("unexpected receive error: {}", err),
        }
    }
    assert!(received >= 1);
    assert!(
        received < published,
        "expected kernel drops beyond the configured depth, drained all {}",
        published
    );
}
