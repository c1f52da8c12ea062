// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the SPEAD wire codec and heap assembler (ICD section 7).
//!
//! All variants are fatal: a `Heap` or `PacketGenerator` that has produced one
//! is unusable and the caller must retry at a higher layer. There is no local
//! recovery, matching the encoder's deterministic, side-effect-free contract.

use std::fmt;

/// Result alias for fallible SPEAD encoding operations.
pub type SpeadResult<T> = Result<T, SpeadError>;

/// Fatal errors raised by flavour validation, item encoding, or packetisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeadError {
    /// A flavour's field widths are out of the ranges the ICD allows.
    FlavourInvalid { reason: String },
    /// A value does not fit in the field width it was asked to encode into.
    ValueOverflow {
        item_id: u64,
        name: String,
        field: &'static str,
    },
    /// An item's value does not match the length implied by its declared shape.
    ShapeMismatch {
        item_id: u64,
        name: String,
        expected: usize,
        actual: usize,
    },
    /// A fallback format field used an unrecognised type code.
    FormatUnsupported { item_id: u64, name: String, code: char },
    /// `max_packet_size` cannot fit even the mandatory pointer preface.
    PacketTooSmall { max_packet_size: usize, required: usize },
    /// A single descriptor sub-heap exceeds `max_packet_size` minus its own preface.
    DescriptorTooLarge {
        item_id: u64,
        name: String,
        descriptor_len: usize,
        max_packet_size: usize,
    },
}

impl fmt::Display for SpeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeadError::FlavourInvalid { reason } => write!(f, "invalid flavour: {reason}"),
            SpeadError::ValueOverflow { item_id, name, field } => write!(
                f,
                "item {item_id:#x} ({name}): value overflows the {field} field width"
            ),
            SpeadError::ShapeMismatch {
                item_id,
                name,
                expected,
                actual,
            } => write!(
                f,
                "item {item_id:#x} ({name}): declared shape implies {expected} elements, got {actual}"
            ),
            SpeadError::FormatUnsupported { item_id, name, code } => write!(
                f,
                "item {item_id:#x} ({name}): unsupported format code '{code}'"
            ),
            SpeadError::PacketTooSmall {
                max_packet_size,
                required,
            } => write!(
                f,
                "max_packet_size {max_packet_size} is too small to hold the mandatory pointer preface ({required} bytes required)"
            ),
            SpeadError::DescriptorTooLarge {
                item_id,
                name,
                descriptor_len,
                max_packet_size,
            } => write!(
                f,
                "item {item_id:#x} ({name}): descriptor sub-heap ({descriptor_len} bytes) does not fit in max_packet_size {max_packet_size}"
            ),
        }
    }
}

impl std::error::Error for SpeadError {}
