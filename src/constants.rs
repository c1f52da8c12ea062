// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SPEAD v4 protocol constants (ICD sections 4 and 7).
//!
//! Centralizes the reserved item IDs and magic bytes so that the wire codec,
//! descriptor builder, and heap assembler never hand-roll their own copies.

/// SPEAD magic byte identifying the first byte of every header word.
pub const SPEAD_MAGIC: u8 = 0x53;

/// SPEAD protocol version implemented by this crate.
pub const SPEAD_VERSION: u8 = 0x04;

/// Padding item, used when a heap has no real entries.
pub const NULL_ID: u64 = 0x00;
/// Immediate carrying the heap's `heap_cnt`.
pub const HEAP_CNT_ID: u64 = 0x01;
/// Immediate carrying the heap's total payload length.
pub const HEAP_LENGTH_ID: u64 = 0x02;
/// Immediate carrying this packet's offset into the heap payload.
pub const PAYLOAD_OFFSET_ID: u64 = 0x03;
/// Immediate carrying this packet's payload slice length.
pub const PAYLOAD_LENGTH_ID: u64 = 0x04;
/// Address pointer to a descriptor sub-heap.
pub const DESCRIPTOR_ID: u64 = 0x05;

/// Descriptor sub-heap field: item name bytes.
pub const DESCRIPTOR_NAME_ID: u64 = 0x10;
/// Descriptor sub-heap field: item description bytes.
pub const DESCRIPTOR_DESCRIPTION_ID: u64 = 0x11;
/// Descriptor sub-heap field: shape encoding.
pub const DESCRIPTOR_SHAPE_ID: u64 = 0x12;
/// Descriptor sub-heap field: fallback format encoding.
pub const DESCRIPTOR_FORMAT_ID: u64 = 0x13;
/// Descriptor sub-heap field: the id of the item being described (immediate).
pub const DESCRIPTOR_ID_ID: u64 = 0x14;
/// Descriptor sub-heap field: numpy dtype-dict repr.
pub const DESCRIPTOR_DTYPE_ID: u64 = 0x15;

/// `heap_cnt` used by every descriptor sub-heap, per the ICD.
pub const DESCRIPTOR_HEAP_CNT: u64 = 1;
