// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flavour: the wire-parameter tuple two SPEAD endpoints must agree on (ICD section 3).

use crate::error::{SpeadError, SpeadResult};

/// Bitset of bug-for-bug compatibility flags selecting legacy wire quirks.
///
/// Two of the flags below (`DESCRIPTOR_WIDTHS`, `SHAPE_BIT_1`) change the width
/// of the shape/format encodings in ways the upstream reference implementation
/// never pinned down precisely; see `DESIGN.md` for the decision to reject
/// flavours that request them rather than guess at their semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BugCompat(u32);

impl BugCompat {
    pub const NONE: BugCompat = BugCompat(0);
    pub const DESCRIPTOR_WIDTHS: BugCompat = BugCompat(1 << 0);
    pub const SHAPE_BIT_1: BugCompat = BugCompat(1 << 1);
    pub const PYSPEAD_0_5_2: BugCompat = BugCompat(1 << 2);

    #[must_use]
    pub fn contains(self, flag: BugCompat) -> bool {
        self.0 & flag.0 == flag.0
    }

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn from_bits(bits: u32) -> BugCompat {
        BugCompat(bits)
    }
}

impl std::ops::BitOr for BugCompat {
    type Output = BugCompat;
    fn bitor(self, rhs: BugCompat) -> BugCompat {
        BugCompat(self.0 | rhs.0)
    }
}

/// Immutable descriptor of wire parameters. Two endpoints must agree on a
/// `Flavour` for a heap to be interpretable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flavour {
    version: u8,
    item_pointer_bits: u8,
    heap_address_bits: u8,
    bug_compat: BugCompat,
}

impl Flavour {
    /// Build and validate a flavour per the ICD's field-width rules.
    ///
    /// `heap_address_bits` must be a multiple of 8 in `[8, 56]` and strictly
    /// less than `item_pointer_bits`. `BUG_COMPAT_DESCRIPTOR_WIDTHS` and
    /// `BUG_COMPAT_SHAPE_BIT_1` are rejected: their exact semantics were never
    /// recovered from the reference implementation (see `DESIGN.md`).
    pub fn new(
        version: u8,
        item_pointer_bits: u8,
        heap_address_bits: u8,
        bug_compat: BugCompat,
    ) -> SpeadResult<Self> {
        if version != 4 {
            log::warn!("[flavour] unsupported SPEAD version {version}");
            return Err(SpeadError::FlavourInvalid {
                reason: format!("version {version} is not supported (only v4 is)"),
            });
        }
        if item_pointer_bits != 64 {
            return Err(SpeadError::FlavourInvalid {
                reason: format!("item_pointer_bits {item_pointer_bits} must be 64"),
            });
        }
        if heap_address_bits == 0
            || !heap_address_bits.is_multiple_of(8)
            || heap_address_bits > 56
            || heap_address_bits >= item_pointer_bits
        {
            return Err(SpeadError::FlavourInvalid {
                reason: format!(
                    "heap_address_bits {heap_address_bits} must be a multiple of 8 in [8, 56] and less than item_pointer_bits {item_pointer_bits}"
                ),
            });
        }
        if bug_compat.contains(BugCompat::DESCRIPTOR_WIDTHS) || bug_compat.contains(BugCompat::SHAPE_BIT_1) {
            return Err(SpeadError::FlavourInvalid {
                reason: "BUG_COMPAT_DESCRIPTOR_WIDTHS and BUG_COMPAT_SHAPE_BIT_1 are not supported \
                         (their exact width semantics were never recovered from the reference implementation)"
                    .to_string(),
            });
        }

        log::debug!(
            "[flavour] version={version} item_pointer_bits={item_pointer_bits} heap_address_bits={heap_address_bits} bug_compat={:#x}",
            bug_compat.bits()
        );

        Ok(Flavour {
            version,
            item_pointer_bits,
            heap_address_bits,
            bug_compat,
        })
    }

    #[must_use]
    pub fn version(self) -> u8 {
        self.version
    }

    #[must_use]
    pub fn item_pointer_bits(self) -> u8 {
        self.item_pointer_bits
    }

    #[must_use]
    pub fn heap_address_bits(self) -> u8 {
        self.heap_address_bits
    }

    #[must_use]
    pub fn bug_compat(self) -> BugCompat {
        self.bug_compat
    }

    /// Number of bytes devoted to the address/offset field of an item pointer.
    #[must_use]
    pub fn address_bytes(self) -> u8 {
        self.heap_address_bits / 8
    }

    /// Number of bytes devoted to the item-id field of an item pointer.
    #[must_use]
    pub fn item_bytes(self) -> u8 {
        8 - self.address_bytes()
    }

    /// `true` if `value` fits in the low `heap_address_bits` bits of a pointer.
    #[must_use]
    pub fn fits_address_field(self, value: u64) -> bool {
        self.heap_address_bits >= 64 || value < (1u64 << self.heap_address_bits)
    }
}
