// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime schema + instance engine.
//!
//! A [`TypeDescriptor`] describes a record as an ordered table of named
//! attributes, lays it out in one contiguous arena, and marshals both the
//! schema (tagged text) and instances (native binary or comma-separated
//! text) without compile-time type information.

use crate::config::MAX_ATTRIBUTE_RANK;
use crate::error::{Error, Result};
use crate::protocol::hash;
use crate::types::attribute::{AttrInfo, AttrMeta};
use crate::types::scalar::{AttrValue, ScalarKind};

/// A full schema with an optional bound instance arena.
///
/// The attribute table may be sparse by rank (gaps allowed); it is compacted
/// before an instance is created. Every typed access is checked against the
/// declared kind and bounds-checked against the arena length.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    attrs: Vec<Option<AttrInfo>>,
    defined: bool,
    instance: Option<Vec<u8>>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            defined: false,
            instance: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once at least one attribute was added and no mutation failed.
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Number of defined attributes (gaps excluded).
    pub fn rank_count(&self) -> usize {
        self.attrs.iter().flatten().count()
    }

    /// Total byte size: sum of all defined attributes' sizes.
    pub fn size(&self) -> usize {
        self.attrs.iter().flatten().map(AttrInfo::size).sum()
    }

    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    /// Attribute at `rank`, if defined.
    pub fn attr(&self, rank: usize) -> Option<&AttrInfo> {
        self.attrs.get(rank).and_then(Option::as_ref)
    }

    /// Defined attributes in rank order.
    pub fn attrs(&self) -> impl Iterator<Item = &AttrInfo> {
        self.attrs.iter().flatten()
    }

    // ===== Schema construction =====

    /// Insert a typed attribute at `rank` (next free rank when `None`).
    ///
    /// Fails when the rank is beyond the table bound or already occupied,
    /// when the multiplicity is zero, or when an instance is already bound.
    /// On failure the `defined` flag is cleared so later consumers can
    /// detect an incomplete schema.
    pub fn add_attribute(
        &mut self,
        rank: Option<usize>,
        name: &str,
        kind: ScalarKind,
        multiplicity: usize,
    ) -> Result<usize> {
        self.insert_attr(rank, AttrInfo::new(0, name, kind, multiplicity))
    }

    /// Insert an opaque byte-run attribute of `byte_size` bytes.
    pub fn add_blob_attribute(
        &mut self,
        rank: Option<usize>,
        name: &str,
        byte_size: usize,
    ) -> Result<usize> {
        self.insert_attr(rank, AttrInfo::new(0, name, ScalarKind::Blob, byte_size))
    }

    /// Extended insert carrying description/qualifier/unit metadata.
    pub fn add_ext_attribute(
        &mut self,
        rank: Option<usize>,
        name: &str,
        kind: ScalarKind,
        multiplicity: usize,
        meta: AttrMeta,
    ) -> Result<usize> {
        self.insert_attr(rank, AttrInfo::new(0, name, kind, multiplicity).with_meta(meta))
    }

    fn insert_attr(&mut self, rank: Option<usize>, mut attr: AttrInfo) -> Result<usize> {
        if self.instance.is_some() {
            return Err(Error::InstanceBound(self.name.clone()));
        }
        if attr.multiplicity == 0 {
            self.defined = false;
            return Err(Error::InvalidMultiplicity(attr.name));
        }
        let rank = rank.unwrap_or_else(|| self.next_free_rank());
        if rank >= MAX_ATTRIBUTE_RANK {
            self.defined = false;
            return Err(Error::RankOutOfBounds {
                rank,
                max: MAX_ATTRIBUTE_RANK,
            });
        }
        if self.attr(rank).is_some() {
            self.defined = false;
            return Err(Error::RankOccupied(rank));
        }
        if rank >= self.attrs.len() {
            self.attrs.resize_with(rank + 1, || None);
        }
        attr.rank = rank;
        log::debug!(
            "[TYPE] {} add attribute rank={} name={} type={} mult={}",
            self.name,
            rank,
            attr.name,
            attr.kind,
            attr.multiplicity
        );
        self.attrs[rank] = Some(attr);
        self.defined = true;
        Ok(rank)
    }

    fn next_free_rank(&self) -> usize {
        self.attrs
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.attrs.len())
    }

    /// Record a scalar default, re-applied by [`Self::clear_instance`].
    pub fn set_default<T: AttrValue>(&mut self, rank: usize, value: T) -> Result<()> {
        let attr = self
            .attrs
            .get_mut(rank)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind != T::KIND || attr.multiplicity != 1 {
            return Err(Error::TypeMismatch {
                expected: attr.kind.name().to_string(),
                got: T::KIND.name().to_string(),
            });
        }
        let mut bytes = vec![0u8; attr.size()];
        value.write_bytes(&mut bytes);
        attr.default = Some(bytes);
        Ok(())
    }

    // ===== Name resolution =====

    /// Primary name -> rank lookup.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.attrs().find(|a| a.name == name).map(|a| a.rank)
    }

    /// Legacy literal-index resolution: a trailing `"[3]"` in the name is
    /// read as rank 3. Kept separate from [`Self::rank_of`] so a genuinely
    /// unknown name is never silently treated as an index.
    pub fn rank_of_indexed(&self, name: &str) -> Option<usize> {
        let open = name.rfind('[')?;
        let close = name.rfind(']')?;
        if close != name.len() - 1 || open + 1 >= close {
            return None;
        }
        let rank: usize = name[open + 1..close].parse().ok()?;
        self.attr(rank).map(|a| a.rank)
    }

    fn resolve_rank(&self, name: &str) -> Result<usize> {
        self.rank_of(name)
            .or_else(|| self.rank_of_indexed(name))
            .ok_or_else(|| Error::AttributeNotFound(name.to_string()))
    }

    // ===== Layout =====

    /// Compact the attribute table, removing rank holes.
    ///
    /// Returns `true` when the table changed, `false` when it was already
    /// compact (repeated calls are no-ops). Fails once an instance is bound,
    /// since compaction would invalidate computed offsets.
    pub fn compress(&mut self) -> Result<bool> {
        if self.instance.is_some() {
            return Err(Error::InstanceBound(self.name.clone()));
        }
        let had_holes = self.attrs.iter().any(Option::is_none);
        if !had_holes {
            return Ok(false);
        }
        let mut compacted: Vec<Option<AttrInfo>> = Vec::with_capacity(self.rank_count());
        for slot in self.attrs.drain(..) {
            if let Some(mut attr) = slot {
                attr.rank = compacted.len();
                compacted.push(Some(attr));
            }
        }
        self.attrs = compacted;
        Ok(true)
    }

    /// Compact the table, compute offsets and allocate the instance arena.
    ///
    /// Fails when the total size is zero. Defaults are applied immediately.
    pub fn create_instance(&mut self) -> Result<()> {
        self.compress()?;
        let total = self.size();
        if total == 0 {
            self.defined = false;
            return Err(Error::NotDefined(self.name.clone()));
        }
        let mut offset = 0;
        for attr in self.attrs.iter_mut().flatten() {
            attr.offset = offset;
            offset += attr.size();
        }
        self.instance = Some(vec![0u8; total]);
        self.apply_defaults();
        log::debug!("[TYPE] {} instance created size={}", self.name, total);
        Ok(())
    }

    /// Zero-fill the arena, then re-apply attribute defaults.
    pub fn clear_instance(&mut self) -> Result<()> {
        match self.instance.as_mut() {
            Some(arena) => {
                arena.fill(0);
                self.apply_defaults();
                Ok(())
            }
            None => Err(Error::NotDefined(self.name.clone())),
        }
    }

    fn apply_defaults(&mut self) {
        let Some(arena) = self.instance.as_mut() else {
            return;
        };
        for attr in self.attrs.iter().flatten() {
            if let Some(default) = &attr.default {
                let end = attr.offset + attr.size();
                if end <= arena.len() {
                    arena[attr.offset..end].copy_from_slice(default);
                }
            }
        }
    }

    // ===== Instance byte access =====

    /// Full instance image.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.instance
            .as_deref()
            .ok_or_else(|| Error::NotDefined(self.name.clone()))
    }

    /// Overwrite the instance from a received image of the exact size.
    pub fn copy_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let arena = self
            .instance
            .as_mut()
            .ok_or_else(|| Error::NotDefined(self.name.clone()))?;
        if bytes.len() != arena.len() {
            return Err(Error::SizeMismatch {
                declared: bytes.len(),
                computed: arena.len(),
            });
        }
        arena.copy_from_slice(bytes);
        Ok(())
    }

    /// Raw bytes of one attribute, bounds-checked against the arena.
    pub fn get_raw(&self, rank: usize) -> Result<&[u8]> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        let arena = self.as_bytes()?;
        let end = attr.offset + attr.size();
        arena
            .get(attr.offset..end)
            .ok_or_else(|| Error::NotDefined(self.name.clone()))
    }

    /// Overwrite one attribute's bytes; shorter inputs are zero-padded.
    pub fn set_raw(&mut self, rank: usize, bytes: &[u8]) -> Result<()> {
        let (offset, size) = {
            let attr = self
                .attr(rank)
                .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
            (attr.offset, attr.size())
        };
        if bytes.len() > size {
            return Err(Error::SizeMismatch {
                declared: bytes.len(),
                computed: size,
            });
        }
        let name = self.name.clone();
        let arena = self
            .instance
            .as_mut()
            .ok_or_else(|| Error::NotDefined(name))?;
        let arena_len = arena.len();
        let slot = arena
            .get_mut(offset..offset + size)
            .ok_or(Error::SizeMismatch {
                declared: offset + size,
                computed: arena_len,
            })?;
        slot[..bytes.len()].copy_from_slice(bytes);
        slot[bytes.len()..].fill(0);
        Ok(())
    }

    // ===== Typed accessors =====

    /// Read a scalar attribute; the declared kind must match `T`.
    pub fn get_attribute<T: AttrValue>(&self, rank: usize) -> Result<T> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind != T::KIND || attr.multiplicity != 1 {
            return Err(Error::TypeMismatch {
                expected: attr.kind.name().to_string(),
                got: T::KIND.name().to_string(),
            });
        }
        Ok(T::read_bytes(self.get_raw(rank)?))
    }

    /// Write a scalar attribute; the declared kind must match `T`.
    pub fn set_attribute<T: AttrValue>(&mut self, rank: usize, value: T) -> Result<()> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind != T::KIND || attr.multiplicity != 1 {
            return Err(Error::TypeMismatch {
                expected: attr.kind.name().to_string(),
                got: T::KIND.name().to_string(),
            });
        }
        let mut bytes = vec![0u8; attr.size()];
        value.write_bytes(&mut bytes);
        self.set_raw(rank, &bytes)
    }

    /// Read every element of an array attribute.
    pub fn get_attribute_array<T: AttrValue>(&self, rank: usize) -> Result<Vec<T>> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind != T::KIND {
            return Err(Error::TypeMismatch {
                expected: attr.kind.name().to_string(),
                got: T::KIND.name().to_string(),
            });
        }
        let elem = attr.kind.size_of();
        let raw = self.get_raw(rank)?;
        Ok(raw.chunks_exact(elem).map(T::read_bytes).collect())
    }

    /// Write every element of an array attribute (length must match).
    pub fn set_attribute_array<T: AttrValue>(&mut self, rank: usize, values: &[T]) -> Result<()> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind != T::KIND {
            return Err(Error::TypeMismatch {
                expected: attr.kind.name().to_string(),
                got: T::KIND.name().to_string(),
            });
        }
        if values.len() != attr.multiplicity {
            return Err(Error::SizeMismatch {
                declared: values.len(),
                computed: attr.multiplicity,
            });
        }
        let elem = attr.kind.size_of();
        let mut bytes = vec![0u8; attr.size()];
        for (chunk, value) in bytes.chunks_exact_mut(elem).zip(values) {
            value.write_bytes(chunk);
        }
        self.set_raw(rank, &bytes)
    }

    /// Read a char-array attribute as a string (up to the first NUL).
    pub fn get_string(&self, rank: usize) -> Result<String> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind != ScalarKind::Char {
            return Err(Error::TypeMismatch {
                expected: attr.kind.name().to_string(),
                got: ScalarKind::Char.name().to_string(),
            });
        }
        let raw = self.get_raw(rank)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    /// Write a char-array attribute verbatim, NUL-padded.
    pub fn set_string(&mut self, rank: usize, value: &str) -> Result<()> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind != ScalarKind::Char {
            return Err(Error::TypeMismatch {
                expected: attr.kind.name().to_string(),
                got: ScalarKind::Char.name().to_string(),
            });
        }
        self.set_raw(rank, value.as_bytes())
    }

    /// Name-based read: primary lookup, then the legacy `"[rank]"` form.
    pub fn get_by_name<T: AttrValue>(&self, name: &str) -> Result<T> {
        self.get_attribute(self.resolve_rank(name)?)
    }

    /// Name-based write: primary lookup, then the legacy `"[rank]"` form.
    pub fn set_by_name<T: AttrValue>(&mut self, name: &str, value: T) -> Result<()> {
        self.set_attribute(self.resolve_rank(name)?, value)
    }

    // ===== Textual marshalling =====

    /// Convert one attribute's value to text. Array elements are joined with
    /// single spaces; char arrays are emitted verbatim up to the first NUL.
    pub fn serialize_attribute(&self, rank: usize) -> Result<String> {
        let attr = self
            .attr(rank)
            .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
        if attr.kind == ScalarKind::Char {
            return self.get_string(rank);
        }
        let raw = self.get_raw(rank)?;
        let elem = attr.kind.size_of();
        let mut parts = Vec::with_capacity(attr.multiplicity);
        for chunk in raw.chunks_exact(elem) {
            parts.push(format_element(attr.kind, chunk));
        }
        Ok(parts.join(" "))
    }

    /// Parse one attribute's textual form back into its binary value.
    pub fn parse_attribute(&mut self, rank: usize, text: &str) -> Result<()> {
        let (kind, multiplicity, name) = {
            let attr = self
                .attr(rank)
                .ok_or_else(|| Error::AttributeNotFound(rank.to_string()))?;
            (attr.kind, attr.multiplicity, attr.name.clone())
        };
        if kind == ScalarKind::Char {
            return self.set_string(rank, text);
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != multiplicity {
            return Err(Error::ParseValue {
                attribute: name,
                text: text.to_string(),
            });
        }
        let elem = kind.size_of();
        let mut bytes = vec![0u8; multiplicity * elem];
        for (chunk, token) in bytes.chunks_exact_mut(elem).zip(&tokens) {
            parse_element(kind, token, chunk).ok_or_else(|| Error::ParseValue {
                attribute: name.clone(),
                text: (*token).to_string(),
            })?;
        }
        self.set_raw(rank, &bytes)
    }

    /// Serialize the whole instance, attributes comma-separated in rank order.
    pub fn serialize_instance(&self) -> Result<String> {
        let mut parts = Vec::with_capacity(self.rank_count());
        for attr in self.attrs() {
            parts.push(self.serialize_attribute(attr.rank)?);
        }
        Ok(parts.join(","))
    }

    /// Parse a comma-separated instance image in rank order.
    pub fn parse_instance(&mut self, text: &str) -> Result<()> {
        let ranks: Vec<usize> = self.attrs().map(|a| a.rank).collect();
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != ranks.len() {
            return Err(Error::ParseValue {
                attribute: self.name.clone(),
                text: text.to_string(),
            });
        }
        for (rank, field) in ranks.into_iter().zip(fields) {
            self.parse_attribute(rank, field)?;
        }
        Ok(())
    }

    /// Canonical textual schema description; also the UID hashing input.
    pub fn serialize_type(&self) -> String {
        let mut out = format!("<type name=\"{}\" size=\"{}\">", self.name, self.size());
        for attr in self.attrs() {
            out.push_str(&format!(
                "<attribute rank=\"{}\" name=\"{}\" type=\"{}\" multiplicity=\"{}\"/>",
                attr.rank, attr.name, attr.kind, attr.multiplicity
            ));
        }
        out.push_str("</type>");
        out
    }

    /// 16-bit hash of the serialized schema, used as the topic UID input.
    pub fn uid(&self) -> u16 {
        hash::fold16(hash::fnv1a_64(self.serialize_type().as_bytes()))
    }
}

fn format_element(kind: ScalarKind, bytes: &[u8]) -> String {
    match kind {
        ScalarKind::Bool => (if bytes[0] != 0 { "true" } else { "false" }).to_string(),
        ScalarKind::I8 => i8::read_bytes(bytes).to_string(),
        ScalarKind::I16 => i16::read_bytes(bytes).to_string(),
        ScalarKind::I32 => i32::read_bytes(bytes).to_string(),
        ScalarKind::I64 => i64::read_bytes(bytes).to_string(),
        ScalarKind::U8 | ScalarKind::Blob => u8::read_bytes(bytes).to_string(),
        ScalarKind::U16 => u16::read_bytes(bytes).to_string(),
        ScalarKind::U32 => u32::read_bytes(bytes).to_string(),
        ScalarKind::U64 => u64::read_bytes(bytes).to_string(),
        ScalarKind::F32 => format!("{:e}", f32::read_bytes(bytes)),
        ScalarKind::F64 => format!("{:e}", f64::read_bytes(bytes)),
        ScalarKind::Char => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn parse_element(kind: ScalarKind, token: &str, out: &mut [u8]) -> Option<()> {
    match kind {
        ScalarKind::Bool => match token {
            "true" => out[0] = 1,
            "false" => out[0] = 0,
            _ => return None,
        },
        ScalarKind::I8 => token.parse::<i8>().ok()?.write_bytes(out),
        ScalarKind::I16 => token.parse::<i16>().ok()?.write_bytes(out),
        ScalarKind::I32 => token.parse::<i32>().ok()?.write_bytes(out),
        ScalarKind::I64 => token.parse::<i64>().ok()?.write_bytes(out),
        ScalarKind::U8 | ScalarKind::Blob => token.parse::<u8>().ok()?.write_bytes(out),
        ScalarKind::U16 => token.parse::<u16>().ok()?.write_bytes(out),
        ScalarKind::U32 => token.parse::<u32>().ok()?.write_bytes(out),
        ScalarKind::U64 => token.parse::<u64>().ok()?.write_bytes(out),
        ScalarKind::F32 => token.parse::<f32>().ok()?.write_bytes(out),
        ScalarKind::F64 => token.parse::<f64>().ok()?.write_bytes(out),
        ScalarKind::Char => {
            let bytes = token.as_bytes();
            if bytes.len() > out.len() {
                return None;
            }
            out[..bytes.len()].copy_from_slice(bytes);
            out[bytes.len()..].fill(0);
        }
    }
    Some(())
}
