// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type-description engine.
//!
//! Describes, lays out and marshals arbitrary record layouts without
//! compile-time type information. The packet envelope and every topic
//! schema are built on top of this module.

/// Per-attribute bookkeeping (rank, kind, layout slot, defaults, metadata).
pub mod attribute;
/// Schema + instance engine.
pub mod descriptor;
/// Primitive scalar kinds and typed byte conversion.
pub mod scalar;

pub use attribute::{AttrInfo, AttrMeta};
pub use descriptor::TypeDescriptor;
pub use scalar::{AttrValue, ScalarKind};
