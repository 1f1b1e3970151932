// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive scalar kinds for schema attributes.

use crate::error::{Error, Result};

/// Primitive scalar kinds an attribute can carry.
///
/// `Blob` is an opaque byte run with no declared element type; it is what a
/// topic falls back to when only a byte size is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Blob,
}

impl ScalarKind {
    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            Self::Bool | Self::Char | Self::I8 | Self::U8 | Self::Blob => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Canonical type name used in serialized schemas and definition files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char8",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::F32 => "float32",
            Self::F64 => "float64",
            Self::Blob => "blob",
        }
    }

    /// Parse a canonical type name (aliases accepted for definition files).
    pub fn from_name(name: &str) -> Result<Self> {
        let kind = match name {
            "bool" | "boolean" => Self::Bool,
            "char" | "char8" | "string" => Self::Char,
            "int8" => Self::I8,
            "int16" => Self::I16,
            "int32" => Self::I32,
            "int64" => Self::I64,
            "uint8" => Self::U8,
            "uint16" => Self::U16,
            "uint32" => Self::U32,
            "uint64" => Self::U64,
            "float32" | "float" => Self::F32,
            "float64" | "double" => Self::F64,
            "blob" => Self::Blob,
            other => {
                return Err(Error::TypeMismatch {
                    expected: "a primitive type name".to_string(),
                    got: other.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Conversion between a Rust scalar and its native-order byte image.
///
/// Implemented for every primitive the schema engine supports; the typed
/// accessors on `TypeDescriptor` use `KIND` to reject mismatched reads and
/// writes before any bytes are copied.
pub trait AttrValue: Sized + Copy {
    /// Declared scalar kind this Rust type maps to.
    const KIND: ScalarKind;

    /// Write the native-order byte image into `out` (must be `KIND.size_of()` long).
    fn write_bytes(self, out: &mut [u8]);

    /// Read the value back from a native-order byte image.
    fn read_bytes(bytes: &[u8]) -> Self;
}

macro_rules! impl_attr_value {
    ($ty:ty, $kind:ident) => {
        impl AttrValue for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn write_bytes(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_ne_bytes());
            }

            fn read_bytes(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                Self::from_ne_bytes(raw)
            }
        }
    };
}

impl_attr_value!(i8, I8);
impl_attr_value!(i16, I16);
impl_attr_value!(i32, I32);
impl_attr_value!(i64, I64);
impl_attr_value!(u8, U8);
impl_attr_value!(u16, U16);
impl_attr_value!(u32, U32);
impl_attr_value!(u64, U64);
impl_attr_value!(f32, F32);
impl_attr_value!(f64, F64);

impl AttrValue for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn write_bytes(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }

    fn read_bytes(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}
