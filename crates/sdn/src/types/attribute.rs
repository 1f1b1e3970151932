// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-attribute bookkeeping for the schema engine.

use crate::types::scalar::ScalarKind;

/// Free-text metadata carried by extended attributes (definition files).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMeta {
    /// Human-readable description.
    pub description: String,
    /// Qualifier used by higher layers to auto-locate well-known fields
    /// (e.g. `"timestamp"`, `"samplenb"`).
    pub qualifier: String,
    /// Engineering unit.
    pub unit: String,
}

/// One field of a schema: identity, layout slot and optional default.
///
/// The byte offset is only meaningful once the owning descriptor has created
/// its instance arena; until then it stays at zero.
#[derive(Debug, Clone)]
pub struct AttrInfo {
    /// Positional index within the attribute table.
    pub rank: usize,
    /// Attribute name, unique within the schema.
    pub name: String,
    /// Element type.
    pub kind: ScalarKind,
    /// Element count (1 for scalars).
    pub multiplicity: usize,
    /// Byte offset into the instance arena, assigned at instance creation.
    pub offset: usize,
    /// Default byte image re-applied by `clear_instance`, if any.
    pub default: Option<Vec<u8>>,
    /// Extended metadata, present for attributes added via the extended form.
    pub meta: Option<AttrMeta>,
}

impl AttrInfo {
    pub fn new(rank: usize, name: impl Into<String>, kind: ScalarKind, multiplicity: usize) -> Self {
        Self {
            rank,
            name: name.into(),
            kind,
            multiplicity,
            offset: 0,
            default: None,
            meta: None,
        }
    }

    /// Total byte size: element count times element size.
    pub fn size(&self) -> usize {
        self.multiplicity * self.kind.size_of()
    }

    /// Attach extended metadata (builder style).
    pub fn with_meta(mut self, meta: AttrMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_size() {
        let attr = AttrInfo::new(0, "samples", ScalarKind::F64, 16);
        assert_eq!(attr.size(), 128);

        let attr = AttrInfo::new(1, "flag", ScalarKind::Bool, 1);
        assert_eq!(attr.size(), 1);
    }

    #[test]
    fn test_attr_meta() {
        let meta = AttrMeta {
            description: "acquisition time".to_string(),
            qualifier: "timestamp".to_string(),
            unit: "ns".to_string(),
        };
        let attr = AttrInfo::new(0, "ts", ScalarKind::U64, 1).with_meta(meta);
        assert_eq!(attr.meta.as_ref().map(|m| m.qualifier.as_str()), Some("timestamp"));
    }
}
