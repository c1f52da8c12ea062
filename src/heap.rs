// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Heap assembler: gathers items and descriptors, allocates payload offsets,
//! and produces the ordered item-pointer list the packet generator splits
//! across packets (ICD section 4.3).

use crate::constants::NULL_ID;
use crate::descriptor::build_descriptor;
use crate::error::SpeadResult;
use crate::flavour::Flavour;
use crate::item::Item;

/// One entry in a heap's item-pointer list: either an immediate value or a
/// payload-resident address pointer.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Entry {
    Immediate { item_id: u64, value: u64 },
    Address { item_id: u64, offset: u64 },
}

/// Gathers items and descriptors for one heap, numbered by `heap_cnt`.
///
/// A `Heap` is mutable until a `PacketGenerator` is constructed on it, at
/// which point it is frozen: a second generator over the same heap yields an
/// identical packet sequence (ICD section 4.5).
#[derive(Debug, Clone)]
pub struct Heap {
    heap_cnt: u64,
    flavour: Flavour,
    entries: Vec<Entry>,
    payload: Vec<u8>,
    frozen: bool,
}

impl Heap {
    #[must_use]
    pub fn new(heap_cnt: u64, flavour: Flavour) -> Self {
        Heap {
            heap_cnt,
            flavour,
            entries: Vec::new(),
            payload: Vec::new(),
            frozen: false,
        }
    }

    #[must_use]
    pub fn heap_cnt(&self) -> u64 {
        self.heap_cnt
    }

    #[must_use]
    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    /// Re-open a frozen heap for further mutation (ICD section 5, optional).
    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Serialise `item`'s metadata as a descriptor sub-heap and queue it as a
    /// payload-resident entry pointed to by `DESCRIPTOR_ID`.
    pub fn add_descriptor(&mut self, item: &Item) -> SpeadResult<()> {
        assert!(!self.frozen, "heap is frozen: a PacketGenerator has already been constructed on it");
        let bytes = build_descriptor(self.flavour, item)?;
        let offset = self.payload.len() as u64;
        self.payload.extend_from_slice(&bytes);
        self.entries.push(Entry::Address { item_id: crate::constants::DESCRIPTOR_ID, offset });
        log::debug!("[heap] queued descriptor for item {:#x} ({}) at offset {offset}", item.id(), item.name());
        Ok(())
    }

    /// Add `item`'s value to the heap, as an immediate if eligible, otherwise
    /// copying its canonicalised bytes into the payload buffer.
    pub fn add_item(&mut self, item: &Item) -> SpeadResult<()> {
        assert!(!self.frozen, "heap is frozen: a PacketGenerator has already been constructed on it");
        if let Some(value) = item.immediate_value(self.flavour)? {
            log::debug!("[heap] item {:#x} ({}) encoded as immediate", item.id(), item.name());
            self.entries.push(Entry::Immediate { item_id: item.id(), value });
            return Ok(());
        }
        let bytes = item.canonical_bytes()?;
        let offset = self.payload.len() as u64;
        self.payload.extend_from_slice(&bytes);
        self.entries.push(Entry::Address { item_id: item.id(), offset });
        log::debug!(
            "[heap] item {:#x} ({}) payload-resident: {} bytes at offset {offset}",
            item.id(),
            item.name(),
            bytes.len()
        );
        Ok(())
    }

    /// Freeze the heap, injecting the `NULL_ID` padding entry if no entry has
    /// put any bytes in the payload (ICD section 4.3 / section 8 scenario 2:
    /// a heap whose only entry is an immediate still needs a non-empty
    /// payload), and return its final entries/payload.
    pub(crate) fn finalize(&mut self) -> (&[Entry], &[u8]) {
        if self.payload.is_empty() {
            self.entries.push(Entry::Address { item_id: NULL_ID, offset: 0 });
            self.payload.push(0x00);
        }
        self.frozen = true;
        (&self.entries, &self.payload)
    }

    #[must_use]
    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// `true` once a `PacketGenerator` has been constructed on this heap.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
