// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic: a named, versioned schema bound to a network mapping.
//!
//! A topic reconciles three inputs at [`Topic::configure`] time: declared
//! metadata (name, size, optional mapping), an optionally attached schema,
//! and the deterministic multicast derivation. The schema wins size
//! conflicts; a topic with no schema falls back to an opaque byte blob.

/// Topic definition file loading (`topic-loaders` feature).
#[cfg(feature = "topic-loaders")]
pub mod definition;
/// Metadata records and multicast derivation.
pub mod metadata;

pub use metadata::{generate_mcast_address, parse_mapping, validate_mapping, Metadata};

use crate::error::{Error, Result};
use crate::protocol::hash;
use crate::types::TypeDescriptor;
use std::net::Ipv4Addr;

/// Named, versioned message schema bound to a multicast mapping.
#[derive(Debug, Clone)]
pub struct Topic {
    name: String,
    uid: u16,
    version: u32,
    size: usize,
    group: Option<Ipv4Addr>,
    port: Option<u16>,
    desc: Option<TypeDescriptor>,
    description: String,
    defined: bool,
}

impl Topic {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            name: metadata.name,
            uid: 0,
            version: metadata.version,
            size: metadata.size,
            group: metadata.group,
            port: metadata.port,
            desc: None,
            description: String::new(),
            defined: false,
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Attach a schema. The topic must be reconfigured afterwards; the UID
    /// is recomputed from the serialized schema at that point.
    pub fn attach_descriptor(&mut self, desc: TypeDescriptor) {
        self.desc = Some(desc);
        self.defined = false;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> u16 {
        self.uid
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn descriptor(&self) -> Option<&TypeDescriptor> {
        self.desc.as_ref()
    }

    pub fn descriptor_mut(&mut self) -> Option<&mut TypeDescriptor> {
        self.desc.as_mut()
    }

    /// Resolved mapping; only meaningful after [`Self::configure`].
    pub fn mapping(&self) -> Result<(Ipv4Addr, u16)> {
        match (self.group, self.port) {
            (Some(group), Some(port)) => Ok((group, port)),
            _ => Err(Error::NotDefined(self.name.clone())),
        }
    }

    /// Reconcile size metadata, mapping and schema; compute the UID.
    ///
    /// Rules:
    /// - an attached schema's computed size wins over declared metadata
    ///   (with a warning on mismatch);
    /// - without a schema, a nonzero declared size becomes a single opaque
    ///   blob attribute of that size;
    /// - neither size nor schema is an error;
    /// - the mapping is derived from the name when not set explicitly, and
    ///   must resolve to a valid class-D group with a nonzero port.
    pub fn configure(&mut self) -> Result<()> {
        self.defined = false;

        match self.desc.as_ref() {
            Some(desc) => {
                if !desc.is_defined() {
                    return Err(Error::NotDefined(self.name.clone()));
                }
                let computed = desc.size();
                if self.size != 0 && self.size != computed {
                    log::warn!(
                        "[TOPIC] {} declared size {} != schema size {}, schema wins",
                        self.name,
                        self.size,
                        computed
                    );
                }
                self.size = computed;
            }
            None => {
                if self.size == 0 {
                    return Err(Error::NotDefined(self.name.clone()));
                }
                let mut blob = TypeDescriptor::new(self.name.clone());
                blob.add_blob_attribute(Some(0), "payload", self.size)?;
                self.desc = Some(blob);
            }
        }

        if self.group.is_none() || self.port.is_none() {
            let (group, port) = generate_mcast_address(&self.name);
            log::debug!("[TOPIC] {} derived mapping {}:{}", self.name, group, port);
            self.group = Some(group);
            self.port = Some(port);
        }
        let (group, port) = (self.group.unwrap_or(Ipv4Addr::UNSPECIFIED), self.port.unwrap_or(0));
        validate_mapping(group, port)?;

        self.set_uid();
        let desc = self.desc.as_mut().ok_or_else(|| Error::NotDefined(self.name.clone()))?;
        if !desc.has_instance() {
            desc.create_instance()?;
        }
        if desc.size() != self.size {
            return Err(Error::SizeMismatch {
                declared: self.size,
                computed: desc.size(),
            });
        }
        self.defined = true;
        log::debug!(
            "[TOPIC] {} configured uid={:#06x} size={} mapping={}:{}",
            self.name,
            self.uid,
            self.size,
            group,
            port
        );
        Ok(())
    }

    /// Recompute the UID hash from the serialized schema text. Peers use it
    /// to confirm schema compatibility without exchanging the full schema.
    pub fn set_uid(&mut self) {
        self.uid = match self.desc.as_ref() {
            Some(desc) => desc.uid(),
            None => hash::hash16(&self.name),
        };
    }

    // ===== Instance delegation =====

    pub fn create_instance(&mut self) -> Result<()> {
        let desc = self.require_desc()?;
        if desc.has_instance() {
            return Ok(());
        }
        desc.create_instance()
    }

    pub fn clear_instance(&mut self) -> Result<()> {
        self.require_desc()?.clear_instance()
    }

    pub fn serialize_instance(&self) -> Result<String> {
        self.desc
            .as_ref()
            .ok_or_else(|| Error::NotDefined(self.name.clone()))?
            .serialize_instance()
    }

    /// Current payload image.
    pub fn payload(&self) -> Result<&[u8]> {
        self.desc
            .as_ref()
            .ok_or_else(|| Error::NotDefined(self.name.clone()))?
            .as_bytes()
    }

    /// Overwrite the payload image from received bytes (exact size).
    pub fn set_payload(&mut self, bytes: &[u8]) -> Result<()> {
        self.require_desc()?.copy_from_bytes(bytes)
    }

    fn require_desc(&mut self) -> Result<&mut TypeDescriptor> {
        let name = self.name.clone();
        self.desc.as_mut().ok_or(Error::NotDefined(name))
    }
}
