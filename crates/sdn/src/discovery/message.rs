// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery wire messages.
//!
//! The grammar is a small fixed text vocabulary, not XML:
//!
//! ```text
//! <message group="discovery" qualifier="startup">
//!   <participant host="ctrl-01" application="plasma-ctl" role="publisher"/>
//!   <topic name="T" version="9" size="20" mapping="239.0.48.194:53053"/>
//! </message>
//! ```
//!
//! Parsing is a lenient linear tag scan over `key="value"` pairs. There is
//! no escaping or nesting discipline in the legacy format, so none is
//! implemented here: a message is valid as long as the outer `<message`
//! envelope is present, and every optional field defaults to empty.

use crate::config;
use crate::error::{Error, Result};
use std::fmt;

/// Outer envelope tag every discovery datagram must start with.
const ENVELOPE_TAG: &str = "<message";

/// Wildcard used by the "query everything" form.
pub const WILDCARD: &str = "*";

/// Message family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Discovery,
    Status,
}

impl Group {
    fn as_str(self) -> &'static str {
        match self {
            Group::Discovery => "discovery",
            Group::Status => "status",
        }
    }

    fn from_str(text: &str) -> Option<Self> {
        match text {
            "discovery" => Some(Group::Discovery),
            "status" => Some(Group::Status),
            _ => None,
        }
    }
}

/// Message intent within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Query,
    Startup,
    Shutdown,
    Update,
    Response,
}

impl Qualifier {
    fn as_str(self) -> &'static str {
        match self {
            Qualifier::Query => "query",
            Qualifier::Startup => "startup",
            Qualifier::Shutdown => "shutdown",
            Qualifier::Update => "update",
            Qualifier::Response => "response",
        }
    }

    fn from_str(text: &str) -> Option<Self> {
        match text {
            "query" => Some(Qualifier::Query),
            "startup" => Some(Qualifier::Startup),
            "shutdown" => Some(Qualifier::Shutdown),
            "update" => Some(Qualifier::Update),
            "response" => Some(Qualifier::Response),
            _ => None,
        }
    }
}

/// One parsed (or built) discovery message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMessage {
    group: Group,
    qualifier: Qualifier,
    host: String,
    application: String,
    role: String,
    topic_name: String,
    topic_version: u32,
    topic_size: usize,
    mapping: String,
}

/// Scan `text` for `key="value"` and return the value.
///
/// The match is boundary-checked on the left so that `name` never matches
/// inside `hostname`. Returns `None` when the key is absent or unterminated.
fn scan_attr<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", key);
    let mut from = 0;
    while let Some(rel) = text[from..].find(&needle) {
        let at = from + rel;
        let boundary = at == 0
            || !text.as_bytes()[at - 1].is_ascii_alphanumeric();
        let start = at + needle.len();
        if boundary {
            let end = text[start..].find('"')?;
            return Some(&text[start..start + end]);
        }
        from = start;
    }
    None
}

impl DiscoveryMessage {
    fn empty(group: Group, qualifier: Qualifier) -> Self {
        Self {
            group,
            qualifier,
            host: String::new(),
            application: String::new(),
            role: String::new(),
            topic_name: String::new(),
            topic_version: 0,
            topic_size: 0,
            mapping: String::new(),
        }
    }

    /// Parse a received datagram. Valid iff the envelope tag leads and the
    /// group/qualifier vocabulary is recognized; every nested field is
    /// optional and defaults to empty/zero.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim_start_matches(['\0', ' ', '\t', '\r', '\n']);
        let trimmed = trimmed.trim_end_matches('\0');
        if !trimmed.starts_with(ENVELOPE_TAG) {
            return Err(Error::MalformedMessage("missing envelope tag".into()));
        }
        let group = scan_attr(trimmed, "group")
            .and_then(Group::from_str)
            .ok_or_else(|| Error::MalformedMessage("unknown group".into()))?;
        let qualifier = scan_attr(trimmed, "qualifier")
            .and_then(Qualifier::from_str)
            .ok_or_else(|| Error::MalformedMessage("unknown qualifier".into()))?;

        let mut message = Self::empty(group, qualifier);
        if let Some(host) = scan_attr(trimmed, "host") {
            message.host = host.to_string();
        }
        if let Some(application) = scan_attr(trimmed, "application") {
            message.application = application.to_string();
        }
        if let Some(role) = scan_attr(trimmed, "role") {
            message.role = role.to_string();
        }
        if let Some(name) = scan_attr(trimmed, "name") {
            message.topic_name = name.to_string();
        }
        if let Some(version) = scan_attr(trimmed, "version") {
            message.topic_version = version.parse().map_err(|_| {
                Error::MalformedMessage(format!("bad topic version {:?}", version))
            })?;
        }
        if let Some(size) = scan_attr(trimmed, "size") {
            message.topic_size = size.parse().map_err(|_| {
                Error::MalformedMessage(format!("bad topic size {:?}", size))
            })?;
        }
        if let Some(mapping) = scan_attr(trimmed, "mapping") {
            message.mapping = mapping.to_string();
        }
        log::debug!(
            "[DISC] parsed {}:{} from host {:?}",
            group.as_str(),
            qualifier.as_str(),
            message.host
        );
        Ok(message)
    }

    // Builders. Query forms per the three canonical shapes: everything,
    // by topic name, by host.

    /// Query everything on the segment.
    ///
    /// In queries the `host` and topic `name` fields are filters, not the
    /// sender's identity; the sender identifies itself via `application`.
    pub fn query_all(application: &str) -> Self {
        let mut message = Self::empty(Group::Discovery, Qualifier::Query);
        message.host = WILDCARD.to_string();
        message.application = application.to_string();
        message.topic_name = WILDCARD.to_string();
        message
    }

    /// Query peers publishing or subscribing one topic.
    pub fn query_topic(application: &str, topic_name: &str) -> Self {
        let mut message = Self::query_all(application);
        message.topic_name = topic_name.to_string();
        message
    }

    /// Query every topic held by one host.
    pub fn query_host(application: &str, target_host: &str) -> Self {
        let mut message = Self::query_all(application);
        message.host = target_host.to_string();
        message
    }

    /// Announce a topic joining the segment (`startup`).
    pub fn join(
        host: &str,
        application: &str,
        role: &str,
        topic_name: &str,
        topic_version: u32,
        topic_size: usize,
        mapping: &str,
    ) -> Self {
        let mut message = Self::empty(Group::Discovery, Qualifier::Startup);
        message.host = host.to_string();
        message.application = application.to_string();
        message.role = role.to_string();
        message.topic_name = topic_name.to_string();
        message.topic_version = topic_version;
        message.topic_size = topic_size;
        message.mapping = mapping.to_string();
        message
    }

    /// Announce a topic leaving the segment (`shutdown`).
    pub fn leave(host: &str, application: &str, role: &str, topic_name: &str) -> Self {
        let mut message = Self::empty(Group::Discovery, Qualifier::Shutdown);
        message.host = host.to_string();
        message.application = application.to_string();
        message.role = role.to_string();
        message.topic_name = topic_name.to_string();
        message
    }

    /// Refresh a previously announced topic (`update`).
    pub fn update(
        host: &str,
        application: &str,
        role: &str,
        topic_name: &str,
        topic_version: u32,
        topic_size: usize,
        mapping: &str,
    ) -> Self {
        let mut message = Self::join(
            host,
            application,
            role,
            topic_name,
            topic_version,
            topic_size,
            mapping,
        );
        message.qualifier = Qualifier::Update;
        message
    }

    /// Answer a query with one locally known topic.
    pub fn response(
        host: &str,
        application: &str,
        role: &str,
        topic_name: &str,
        topic_version: u32,
        topic_size: usize,
        mapping: &str,
    ) -> Self {
        let mut message = Self::join(
            host,
            application,
            role,
            topic_name,
            topic_version,
            topic_size,
            mapping,
        );
        message.qualifier = Qualifier::Response;
        message
    }

    // Predicates.

    pub fn is_query(&self) -> bool {
        self.qualifier == Qualifier::Query
    }

    pub fn is_join(&self) -> bool {
        self.qualifier == Qualifier::Startup
    }

    pub fn is_leave(&self) -> bool {
        self.qualifier == Qualifier::Shutdown
    }

    pub fn is_update(&self) -> bool {
        self.qualifier == Qualifier::Update
    }

    pub fn is_response(&self) -> bool {
        self.qualifier == Qualifier::Response
    }

    pub fn is_publisher(&self) -> bool {
        self.role == "publisher"
    }

    pub fn is_subscriber(&self) -> bool {
        self.role == "subscriber"
    }

    /// True when this query's topic filter matches `name`.
    pub fn matches_topic(&self, name: &str) -> bool {
        self.topic_name == WILDCARD || self.topic_name == name
    }

    /// True when this query's host filter matches `host`.
    pub fn matches_host(&self, host: &str) -> bool {
        self.host.is_empty() || self.host == WILDCARD || self.host == host
    }

    // Accessors.

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn topic_version(&self) -> u32 {
        self.topic_version
    }

    pub fn topic_size(&self) -> usize {
        self.topic_size
    }

    pub fn mapping(&self) -> &str {
        &self.mapping
    }
}

impl fmt::Display for DiscoveryMessage {
    /// Render to the wire text form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<message schema=\"{}\" group=\"{}\" qualifier=\"{}\">",
            config::DISCOVERY_SCHEMA_VERSION,
            self.group.as_str(),
            self.qualifier.as_str()
        )?;
        writeln!(
            f,
            "  <participant host=\"{}\" application=\"{}\" role=\"{}\"/>",
            self.host, self.application, self.role
        )?;
        if !self.topic_name.is_empty() {
            writeln!(
                f,
                "  <topic name=\"{}\" version=\"{}\" size=\"{}\" mapping=\"{}\"/>",
                self.topic_name, self.topic_version, self.topic_size, self.mapping
            )?;
        }
        write!(f, "</message>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_predicates() {
        let query = DiscoveryMessage::query_all("plasma-ctl");
        assert!(query.is_query());
        assert!(!query.is_join());
        assert!(!query.is_leave());
        assert!(!query.is_response());

        let parsed = DiscoveryMessage::parse(&query.to_string()).expect("parse");
        assert!(parsed.is_query());
        assert!(!parsed.is_join());
        assert!(!parsed.is_leave());
        assert!(!parsed.is_response());
        assert!(parsed.matches_topic("anything"));
    }

    #[test]
    fn test_join_round_trip() {
        let join = DiscoveryMessage::join(
            "ctrl-01",
            "plasma-ctl",
            "publisher",
            "T",
            9,
            20,
            "239.0.48.194:53053",
        );
        let parsed = DiscoveryMessage::parse(&join.to_string()).expect("parse");
        assert!(parsed.is_join());
        assert!(parsed.is_publisher());
        assert!(!parsed.is_subscriber());
        assert_eq!(parsed.topic_name(), "T");
        assert_eq!(parsed.topic_version(), 9);
        assert_eq!(parsed.topic_size(), 20);
        assert_eq!(parsed.mapping(), "239.0.48.194:53053");
        assert_eq!(parsed.host(), "ctrl-01");
        assert_eq!(parsed.application(), "plasma-ctl");
    }

    #[test]
    fn test_parse_raw_startup_text() {
        // Hand-written legacy text, whitespace and ordering not canonical.
        let raw = "<message group=\"discovery\" qualifier=\"startup\">\
                   <participant role=\"publisher\" host=\"h\"/>\
                   <topic name=\"T\" version=\"9\" size=\"20\" \
                   mapping=\"239.0.48.194:53053\"/></message>";
        let parsed = DiscoveryMessage::parse(raw).expect("parse");
        assert!(parsed.is_join());
        assert!(parsed.is_publisher());
        assert_eq!(parsed.topic_name(), "T");
        assert_eq!(parsed.topic_version(), 9);
        assert_eq!(parsed.topic_size(), 20);
    }

    #[test]
    fn test_name_key_does_not_match_hostname() {
        let raw = "<message group=\"discovery\" qualifier=\"query\" \
                   hostname=\"not-a-topic\" name=\"T2\"/>";
        let parsed = DiscoveryMessage::parse(raw).expect("parse");
        assert_eq!(parsed.topic_name(), "T2");
    }

    #[test]
    fn test_missing_envelope_rejected() {
        assert!(matches!(
            DiscoveryMessage::parse("<msg group=\"discovery\"/>"),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_missing_optional_fields_tolerated() {
        let parsed = DiscoveryMessage::parse(
            "<message group=\"status\" qualifier=\"update\"></message>",
        )
        .expect("parse");
        assert_eq!(parsed.group(), Group::Status);
        assert!(parsed.is_update());
        assert_eq!(parsed.host(), "");
        assert_eq!(parsed.topic_size(), 0);
    }

    #[test]
    fn test_trailing_nul_padding_ignored() {
        let padded = format!(
            "{}\0\0\0\0",
            DiscoveryMessage::query_topic("a", "T1")
        );
        let parsed = DiscoveryMessage::parse(&padded).expect("parse");
        assert!(parsed.is_query());
        assert!(parsed.matches_topic("T1"));
        assert!(!parsed.matches_topic("T2"));
    }
}
