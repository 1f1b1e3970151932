// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery query/response between two managers on loopback.

#![cfg(target_os = "linux")]

use sdn::discovery::{DiscoveryManager, Role};
use sdn::topic::{Metadata, Topic};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_register_query_resolve() {
    let mut topic = Topic::new(Metadata::new("T-disc", 20));
    topic.set_description("discovery smoke topic");
    topic.configure().expect("configure");
    let expected_mapping = topic.mapping().expect("mapping");

    let mut answering = DiscoveryManager::new("lo", "producer-app").expect("answering manager");
    answering.register(&topic, Role::Publisher).expect("register");

    // The answering side pumps its own rounds on a thread; the querying
    // side drives resolve() from this one.
    let stop = Arc::new(AtomicBool::new(false));
    let stop_pump = Arc::clone(&stop);
    let pump = std::thread::spawn(move || {
        while !stop_pump.load(Ordering::SeqCst) {
            // Timeouts and self-messages are quiet non-events.
            let _ = answering.background_activity();
        }
        answering
    });

    let mut querying = DiscoveryManager::new("lo", "consumer-app").expect("querying manager");
    let resolved = querying.resolve("T-disc", Duration::from_secs(2));

    stop.store(true, Ordering::SeqCst);
    let answering = pump.join().expect("pump thread");

    let meta = resolved.expect("resolve");
    assert_eq!(meta.name, "T-disc");
    assert_eq!(meta.size, 20);
    assert_eq!(meta.group, Some(expected_mapping.0));
    assert_eq!(meta.port, Some(expected_mapping.1));

    assert_eq!(answering.registered_topics(), vec!["T-disc".to_string()]);
    // The querying side now holds at least one peer record for the topic.
    assert!(querying
        .peers()
        .iter()
        .any(|peer| peer.topic_name == "T-disc" && peer.role == "publisher"));
}

#[test]
fn test_leave_removes_peer() {
    let mut topic = Topic::new(Metadata::new("T-leave", 8));
    topic.configure().expect("configure");

    let mut announcing = DiscoveryManager::new("lo", "leaving-app").expect("announcing manager");
    let mut watching = DiscoveryManager::new("lo", "watching-app").expect("watching manager");

    announcing.register(&topic, Role::Subscriber).expect("register");
    // Drain until the join lands (bounded by the per-round timeout).
    let mut joined = false;
    for _ in 0..100 {
        if watching.background_activity().expect("round") {
            joined = watching
                .peers()
                .iter()
                .any(|peer| peer.topic_name == "T-leave");
            if joined {
                break;
            }
        }
    }
    assert!(joined);

    announcing
        .unregister("T-leave", Role::Subscriber)
        .expect("unregister");
    for _ in 0..100 {
        watching.background_activity().expect("round");
        if !watching
            .peers()
            .iter()
            .any(|peer| peer.topic_name == "T-leave")
        {
            return;
        }
    }
    panic!("shutdown announcement never folded into the peer table");
}
