// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet generator: splits a frozen heap's item-pointer list and payload
//! into a sequence of `max_packet_size`-bounded UDP packets (ICD section 4.4).

use crate::constants::{DESCRIPTOR_ID, HEAP_CNT_ID, HEAP_LENGTH_ID, PAYLOAD_LENGTH_ID, PAYLOAD_OFFSET_ID};
use crate::error::{SpeadError, SpeadResult};
use crate::flavour::Flavour;
use crate::heap::{Entry, Heap};
use crate::wire::{make_address, make_header, make_immediate};

const MANDATORY_POINTERS: usize = 4;

/// Iterates the UDP packets needed to transmit one heap.
///
/// Constructing a `PacketGenerator` freezes the heap it is built from (ICD
/// section 4.5): a second generator over the same heap reproduces an
/// identical packet sequence. The first packet carries every item pointer;
/// later packets carry only the four mandatory ones, since a receiver only
/// needs those to place a payload slice once it already has packet one.
pub struct PacketGenerator<'h> {
    flavour: Flavour,
    heap_cnt: u64,
    max_packet_size: usize,
    payload: &'h [u8],
    first_packet_pointers: Vec<[u8; 8]>,
    /// `(start, end)` byte ranges of each descriptor's payload-resident span,
    /// sorted and non-overlapping. A packet boundary is never allowed to fall
    /// strictly inside one of these.
    descriptor_spans: Vec<(usize, usize)>,
    payload_offset: usize,
    emitted: bool,
}

impl<'h> PacketGenerator<'h> {
    /// Freeze `heap` and build a generator over it bounded by `max_packet_size`.
    ///
    /// Fails with [`SpeadError::PacketTooSmall`] if `max_packet_size` cannot
    /// even hold the first packet's pointer preface plus one payload byte, or
    /// [`SpeadError::DescriptorTooLarge`] if a single descriptor sub-heap
    /// cannot fit in a packet of that size on its own.
    pub fn new(heap: &'h mut Heap, max_packet_size: usize) -> SpeadResult<Self> {
        heap.finalize();
        let heap: &'h Heap = heap;
        let flavour = heap.flavour();
        let entries = heap.entries();
        let payload = heap.payload();

        let mut first_packet_pointers = Vec::with_capacity(MANDATORY_POINTERS + entries.len());
        first_packet_pointers.push(make_immediate(flavour, HEAP_CNT_ID, "HEAP_CNT", heap.heap_cnt())?);
        first_packet_pointers.push(make_immediate(flavour, HEAP_LENGTH_ID, "HEAP_LENGTH", payload.len() as u64)?);
        // PAYLOAD_OFFSET and PAYLOAD_LENGTH are placeholders here: each emitted
        // packet overwrites them with its own slice's offset/length.
        first_packet_pointers.push(make_immediate(flavour, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0)?);
        first_packet_pointers.push(make_immediate(flavour, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", 0)?);
        for entry in entries {
            first_packet_pointers.push(match *entry {
                Entry::Immediate { item_id, value } => make_immediate(flavour, item_id, "item", value)?,
                Entry::Address { item_id, offset } => make_address(flavour, item_id, offset)?,
            });
        }

        let preface_len = 8 * (1 + first_packet_pointers.len());
        let required = preface_len + 1;
        if max_packet_size < required {
            return Err(SpeadError::PacketTooSmall { max_packet_size, required });
        }

        let descriptor_spans = descriptor_spans(entries, payload.len());
        // `preface_len` (the first packet's full pointer preface) is the
        // *smallest* available per-packet payload budget: every later packet
        // carries only the four mandatory pointers, so its preface is no
        // larger. Validating every descriptor against this tightest budget
        // guarantees it also fits whichever packet the boundary-aware
        // slicing below actually places it in.
        check_descriptors_fit(&descriptor_spans, max_packet_size, preface_len)?;

        Ok(PacketGenerator {
            flavour,
            heap_cnt: heap.heap_cnt(),
            max_packet_size,
            payload,
            first_packet_pointers,
            descriptor_spans,
            payload_offset: 0,
            emitted: false,
        })
    }
}

/// Computes each descriptor's payload-resident `(start, end)` byte span,
/// bounded by the next ascending address-pointer offset or payload end.
fn descriptor_spans(entries: &[Entry], payload_len: usize) -> Vec<(usize, usize)> {
    let mut address_offsets: Vec<u64> = entries
        .iter()
        .filter_map(|e| match *e {
            Entry::Address { offset, .. } => Some(offset),
            Entry::Immediate { .. } => None,
        })
        .collect();
    address_offsets.sort_unstable();

    let mut spans: Vec<(usize, usize)> = entries
        .iter()
        .filter_map(|e| match *e {
            Entry::Address { item_id: DESCRIPTOR_ID, offset } => {
                let end = address_offsets.iter().copied().find(|&o| o > offset).unwrap_or(payload_len as u64);
                Some((offset as usize, end as usize))
            }
            _ => None,
        })
        .collect();
    spans.sort_unstable();
    spans
}

/// Each descriptor's own address-pointed span must individually fit in one
/// packet's worth of payload, since a receiver needs it whole to parse a
/// numpy/fallback layout before it can interpret the rest of the heap.
fn check_descriptors_fit(descriptor_spans: &[(usize, usize)], max_packet_size: usize, full_preface_len: usize) -> SpeadResult<()> {
    let max_descriptor_len = max_packet_size.saturating_sub(full_preface_len);
    for &(start, end) in descriptor_spans {
        let descriptor_len = end - start;
        if descriptor_len > max_descriptor_len {
            return Err(SpeadError::DescriptorTooLarge {
                item_id: DESCRIPTOR_ID,
                name: "descriptor".to_string(),
                descriptor_len,
                max_packet_size,
            });
        }
    }
    Ok(())
}

impl Iterator for PacketGenerator<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let remaining = self.payload.len() - self.payload_offset;
        if self.emitted && remaining == 0 {
            return None;
        }

        let is_first = !self.emitted;
        let pointer_words: &[[u8; 8]] = if is_first {
            &self.first_packet_pointers
        } else {
            &self.first_packet_pointers[..MANDATORY_POINTERS]
        };

        let overhead = 8 * (1 + pointer_words.len());
        let budget = self.max_packet_size.saturating_sub(overhead);
        let slice_len = if remaining <= budget {
            remaining
        } else {
            // Prefer an 8-byte-aligned cut when that doesn't waste the whole budget.
            let aligned = (budget / 8) * 8;
            if aligned > 0 { aligned } else { budget }
        };
        let mut end = self.payload_offset + slice_len;
        // Never let a cut fall strictly inside a descriptor's span: either
        // stop short of it (leaving it whole for the next packet) or, if
        // we're already inside it, pull the whole thing into this packet.
        // `check_descriptors_fit` guarantees every span is small enough to
        // fit any packet's budget, so widening `end` here never overflows
        // `max_packet_size`.
        for &(start, span_end) in &self.descriptor_spans {
            if start < end && end < span_end {
                end = if start > self.payload_offset { start } else { span_end };
                break;
            }
        }
        let slice_len = end - self.payload_offset;

        let mut packet = Vec::with_capacity(overhead + slice_len);
        packet.extend_from_slice(&make_header(self.flavour, pointer_words.len() as u16));
        for (i, word) in pointer_words.iter().enumerate() {
            // PAYLOAD_OFFSET and PAYLOAD_LENGTH (pointer slots 2 and 3) are
            // per-packet; every other pointer is reused verbatim.
            match i {
                2 => packet.extend_from_slice(
                    &make_immediate(self.flavour, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", self.payload_offset as u64)
                        .expect("payload offset already validated to fit"),
                ),
                3 => packet.extend_from_slice(
                    &make_immediate(self.flavour, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", slice_len as u64)
                        .expect("payload length already validated to fit"),
                ),
                _ => packet.extend_from_slice(word),
            }
        }
        packet.extend_from_slice(&self.payload[self.payload_offset..self.payload_offset + slice_len]);

        log::debug!(
            "[packet] heap {} packet: {} pointers, payload [{}, {})",
            self.heap_cnt,
            pointer_words.len(),
            self.payload_offset,
            self.payload_offset + slice_len
        );

        self.payload_offset += slice_len;
        self.emitted = true;
        Some(packet)
    }
}
