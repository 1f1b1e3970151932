// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Caller-driven discovery manager.
//!
//! One manager per process area of interest, explicitly constructed and
//! explicitly passed to whoever needs it. There is no internal thread: the
//! owner calls [`DiscoveryManager::background_activity`] at its own cadence
//! and each call performs at most one receive/answer round.

use crate::config;
use crate::discovery::message::DiscoveryMessage;
use crate::error::{Error, Result};
use crate::topic::{metadata, Metadata, Topic};
use crate::transport::{Endpoint, Messenger};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// Transport role a registered topic plays in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Publisher,
    Subscriber,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Publisher => "publisher",
            Role::Subscriber => "subscriber",
        }
    }
}

/// One locally registered topic, as announced on the wire.
#[derive(Debug, Clone)]
struct LocalTopic {
    name: String,
    version: u32,
    size: usize,
    mapping: String,
    role: Role,
}

/// Last observed state of one remote topic endpoint.
#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub host: String,
    pub application: String,
    pub role: String,
    pub topic_name: String,
    pub topic_version: u32,
    pub topic_size: usize,
    pub mapping: String,
    pub last_seen: Instant,
}

impl PeerRecord {
    fn from_message(message: &DiscoveryMessage) -> Self {
        Self {
            host: message.host().to_string(),
            application: message.application().to_string(),
            role: message.role().to_string(),
            topic_name: message.topic_name().to_string(),
            topic_version: message.topic_version(),
            topic_size: message.topic_size(),
            mapping: message.mapping().to_string(),
            last_seen: Instant::now(),
        }
    }

    fn key(host: &str, topic_name: &str, role: &str) -> String {
        format!("{}/{}/{}", host, topic_name, role)
    }
}

/// Announce local topics and track remote ones over the well-known
/// discovery multicast group.
pub struct DiscoveryManager {
    messenger: Messenger,
    host: String,
    application: String,
    topics: RwLock<Vec<LocalTopic>>,
    peers: DashMap<String, PeerRecord>,
}

impl DiscoveryManager {
    /// Bind to `iface_name` on the well-known discovery group. The socket
    /// opens here; the manager is ready for announcements immediately.
    pub fn new(iface_name: &str, application: &str) -> Result<Self> {
        let mut messenger = Messenger::multicast(
            iface_name,
            config::DISCOVERY_MCAST_GROUP,
            config::DISCOVERY_MCAST_PORT,
        )?;
        messenger.open()?;
        messenger.set_timeout(Some(Duration::from_millis(10)));
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        log::debug!(
            "[DISC] manager up on {} as {}@{}",
            iface_name,
            application,
            host
        );
        Ok(Self {
            messenger,
            host,
            application: application.to_string(),
            topics: RwLock::new(Vec::new()),
            peers: DashMap::new(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Register a topic and announce it with a `startup` message.
    pub fn register(&mut self, topic: &Topic, role: Role) -> Result<()> {
        let (group, port) = topic.mapping()?;
        let mapping = format!("{}:{}", group, port);
        let announce = DiscoveryMessage::join(
            &self.host,
            &self.application,
            role.as_str(),
            topic.name(),
            topic.version(),
            topic.size(),
            &mapping,
        );
        self.messenger.publish(announce.to_string().as_bytes())?;
        self.topics.write().push(LocalTopic {
            name: topic.name().to_string(),
            version: topic.version(),
            size: topic.size(),
            mapping,
            role,
        });
        log::debug!("[DISC] registered {} as {}", topic.name(), role.as_str());
        Ok(())
    }

    /// Drop a registration and announce it with a `shutdown` message.
    pub fn unregister(&mut self, topic_name: &str, role: Role) -> Result<()> {
        let removed = {
            let mut topics = self.topics.write();
            let before = topics.len();
            topics.retain(|local| !(local.name == topic_name && local.role == role));
            before != topics.len()
        };
        if !removed {
            return Err(Error::NotDefined(topic_name.to_string()));
        }
        let announce = DiscoveryMessage::leave(
            &self.host,
            &self.application,
            role.as_str(),
            topic_name,
        );
        self.messenger.publish(announce.to_string().as_bytes())?;
        log::debug!("[DISC] unregistered {} as {}", topic_name, role.as_str());
        Ok(())
    }

    /// Re-announce one registered topic with an `update` message.
    pub fn announce_update(&mut self, topic_name: &str) -> Result<()> {
        let local = self
            .topics
            .read()
            .iter()
            .find(|local| local.name == topic_name)
            .cloned()
            .ok_or_else(|| Error::NotDefined(topic_name.to_string()))?;
        let announce = DiscoveryMessage::update(
            &self.host,
            &self.application,
            local.role.as_str(),
            &local.name,
            local.version,
            local.size,
            &local.mapping,
        );
        self.messenger.publish(announce.to_string().as_bytes())?;
        Ok(())
    }

    /// One discovery round: receive at most one message, answer it if it is
    /// a matching query, fold it into the peer table if it is an
    /// announcement. Returns `true` when a message was handled.
    ///
    /// Self-messages and receive timeouts are quiet non-events, not errors.
    pub fn background_activity(&mut self) -> Result<bool> {
        let len = match self.messenger.receive() {
            Ok(len) => len,
            Err(Error::Timeout) | Err(Error::SelfMessage) => return Ok(false),
            Err(err) => return Err(err),
        };
        let text = String::from_utf8_lossy(&self.messenger.buffer()[..len]).into_owned();
        let message = match DiscoveryMessage::parse(&text) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("[DISC] ignoring malformed message: {}", err);
                return Ok(false);
            }
        };
        self.handle(&message)?;
        Ok(true)
    }

    fn handle(&mut self, message: &DiscoveryMessage) -> Result<()> {
        if message.is_query() {
            return self.answer_query(message);
        }
        let key = PeerRecord::key(message.host(), message.topic_name(), message.role());
        if message.is_leave() {
            self.peers.remove(&key);
            log::debug!("[DISC] peer left: {}", key);
        } else if message.is_join() || message.is_update() || message.is_response() {
            self.peers.insert(key, PeerRecord::from_message(message));
        }
        Ok(())
    }

    fn answer_query(&mut self, query: &DiscoveryMessage) -> Result<()> {
        if !query.matches_host(&self.host) {
            return Ok(());
        }
        let matching: Vec<LocalTopic> = self
            .topics
            .read()
            .iter()
            .filter(|local| query.matches_topic(&local.name))
            .cloned()
            .collect();
        for local in matching {
            let response = DiscoveryMessage::response(
                &self.host,
                &self.application,
                local.role.as_str(),
                &local.name,
                local.version,
                local.size,
                &local.mapping,
            );
            self.messenger.publish(response.to_string().as_bytes())?;
        }
        Ok(())
    }

    /// Query the segment for `topic_name` and wait up to `timeout` for a
    /// response carrying its mapping.
    pub fn resolve(&mut self, topic_name: &str, timeout: Duration) -> Result<Metadata> {
        let query = DiscoveryMessage::query_topic(&self.application, topic_name);
        self.messenger.publish(query.to_string().as_bytes())?;

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if !self.background_activity()? {
                continue;
            }
            let key_prefix = format!("/{}/", topic_name);
            let found = self
                .peers
                .iter()
                .find(|entry| entry.key().contains(&key_prefix) && !entry.mapping.is_empty())
                .map(|entry| entry.value().clone());
            if let Some(peer) = found {
                let (group, port) = metadata::parse_mapping(&peer.mapping)?;
                let mut meta = Metadata::with_mapping(topic_name, peer.topic_size, group, port)?;
                meta.set_version(peer.topic_version);
                return Ok(meta);
            }
        }
        Err(Error::Timeout)
    }

    /// Snapshot of the peer table.
    pub fn peers(&self) -> Vec<PeerRecord> {
        self.peers.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Names of locally registered topics.
    pub fn registered_topics(&self) -> Vec<String> {
        self.topics
            .read()
            .iter()
            .map(|local| local.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_strings() {
        assert_eq!(Role::Publisher.as_str(), "publisher");
        assert_eq!(Role::Subscriber.as_str(), "subscriber");
    }

    #[test]
    fn test_peer_record_key() {
        assert_eq!(PeerRecord::key("h", "T", "publisher"), "h/T/publisher");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_unregister_unknown_topic() {
        let mut manager = DiscoveryManager::new("lo", "test-app").expect("manager");
        assert!(matches!(
            manager.unregister("no-such-topic", Role::Publisher),
            Err(Error::NotDefined(_))
        ));
    }
}
