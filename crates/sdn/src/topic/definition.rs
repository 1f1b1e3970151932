// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic definition file loading.
//!
//! Definition files supply name, description, version, an optional explicit
//! mapping, and the attribute list (name, type, multiplicity, qualifier,
//! unit). They feed the schema engine through the extended attribute
//! contract; nothing here bypasses `configure()` validation.
//!
//! ```xml
//! <topic name="magnetics" version="2" mapping="239.0.1.2:4000">
//!   <attributes>
//!     <attribute name="timestamp" type="uint64" qualifier="timestamp" unit="ns"/>
//!     <attribute name="field" type="float64" multiplicity="32" unit="T"/>
//!   </attributes>
//! </topic>
//! ```

use crate::error::{Error, Result};
use crate::topic::metadata::{parse_mapping, Metadata};
use crate::topic::Topic;
use crate::types::{AttrMeta, ScalarKind, TypeDescriptor};
use std::path::Path;

/// Load and parse a topic definition file. The returned topic still needs
/// [`Topic::configure`].
pub fn load_definition(path: &Path) -> Result<Topic> {
    let text = std::fs::read_to_string(path)?;
    parse_definition(&text)
}

/// Parse a topic definition document.
pub fn parse_definition(xml: &str) -> Result<Topic> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|err| Error::MalformedMessage(err.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "topic" {
        return Err(Error::MalformedMessage(format!(
            "expected <topic>, got <{}>",
            root.tag_name().name()
        )));
    }

    let name = root
        .attribute("name")
        .ok_or_else(|| Error::MalformedMessage("<topic> without name".to_string()))?;
    let mut metadata = Metadata::new(name, 0);
    if let Some(version) = root.attribute("version") {
        metadata.set_version(
            version
                .parse()
                .map_err(|_| Error::MalformedMessage(format!("bad version '{}'", version)))?,
        );
    }
    if let Some(mapping) = root.attribute("mapping") {
        let (group, port) = parse_mapping(mapping)?;
        metadata.group = Some(group);
        metadata.port = Some(port);
    }

    let mut desc = TypeDescriptor::new(name);
    for node in root.descendants().filter(|n| n.has_tag_name("attribute")) {
        let attr_name = node
            .attribute("name")
            .ok_or_else(|| Error::MalformedMessage("<attribute> without name".to_string()))?;
        let type_name = node
            .attribute("type")
            .ok_or_else(|| Error::MalformedMessage(format!("attribute {} without type", attr_name)))?;
        let kind = ScalarKind::from_name(type_name)?;
        let multiplicity = match node.attribute("multiplicity") {
            Some(text) => text.parse().map_err(|_| {
                Error::MalformedMessage(format!("bad multiplicity '{}' for {}", text, attr_name))
            })?,
            None => 1,
        };
        let meta = AttrMeta {
            description: node.attribute("description").unwrap_or_default().to_string(),
            qualifier: node.attribute("qualifier").unwrap_or_default().to_string(),
            unit: node.attribute("unit").unwrap_or_default().to_string(),
        };
        desc.add_ext_attribute(None, attr_name, kind, multiplicity, meta)?;
    }

    let mut topic = Topic::new(metadata);
    if let Some(description) = root.attribute("description") {
        topic.set_description(description);
    }
    if desc.is_defined() {
        topic.attach_descriptor(desc);
    }
    log::debug!("[TOPIC] loaded definition for {}", name);
    Ok(topic)
}
