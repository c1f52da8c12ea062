// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor builder: serialises an item's metadata into a standalone
//! sub-heap payload (ICD section 4.2).

use crate::constants::{
    DESCRIPTOR_DESCRIPTION_ID, DESCRIPTOR_DTYPE_ID, DESCRIPTOR_FORMAT_ID, DESCRIPTOR_HEAP_CNT,
    DESCRIPTOR_ID_ID, DESCRIPTOR_NAME_ID, DESCRIPTOR_SHAPE_ID, HEAP_CNT_ID, HEAP_LENGTH_ID,
    PAYLOAD_LENGTH_ID, PAYLOAD_OFFSET_ID,
};
use crate::error::SpeadResult;
use crate::flavour::Flavour;
use crate::item::{FormatField, Item, ItemKind, Order, ShapeAxis};
use crate::wire::{make_address, make_header, make_immediate};

/// Build the byte sequence of a SPEAD descriptor sub-heap describing `item`.
///
/// The sub-heap always has `heap_cnt = 1` (ICD section 4.2) and is itself a
/// valid, self-contained single-packet SPEAD heap: header, item pointers,
/// then payload.
pub fn build_descriptor(flavour: Flavour, item: &Item) -> SpeadResult<Vec<u8>> {
    let name_bytes = item.name().as_bytes().to_vec();
    let description_bytes = item.description().as_bytes().to_vec();

    let (format_bytes, shape_bytes, dtype_bytes) = match item.kind() {
        ItemKind::Numpy { dtype, order, shape } => {
            let shape_axes: Vec<Option<u64>> = shape.iter().map(|&n| Some(n)).collect();
            (
                Vec::new(),
                encode_shape(flavour, &shape_axes),
                Some(encode_dtype(*dtype, *order, shape).into_bytes()),
            )
        }
        ItemKind::Fallback { format, shape } => {
            let shape_axes: Vec<Option<u64>> = shape
                .iter()
                .map(|axis| match axis {
                    ShapeAxis::Fixed(n) => Some(*n),
                    ShapeAxis::Variable => None,
                })
                .collect();
            (encode_format(flavour, format), encode_shape(flavour, &shape_axes), None)
        }
    };

    let mut payload_fields: Vec<Vec<u8>> = vec![name_bytes, description_bytes, format_bytes, shape_bytes];
    if let Some(dtype_bytes) = dtype_bytes.clone() {
        payload_fields.push(dtype_bytes);
    }

    let mut offsets = Vec::with_capacity(payload_fields.len());
    let mut offset: u64 = 0;
    for field in &payload_fields {
        offsets.push(offset);
        offset += field.len() as u64;
    }
    let payload: Vec<u8> = payload_fields.into_iter().flatten().collect();
    let payload_len = payload.len() as u64;

    let num_items: u16 = if dtype_bytes.is_some() { 10 } else { 9 };
    let mut out = Vec::new();
    out.extend_from_slice(&make_header(flavour, num_items));
    out.extend_from_slice(&make_immediate(flavour, HEAP_CNT_ID, "HEAP_CNT", DESCRIPTOR_HEAP_CNT)?);
    out.extend_from_slice(&make_immediate(flavour, HEAP_LENGTH_ID, "HEAP_LENGTH", payload_len)?);
    out.extend_from_slice(&make_immediate(flavour, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0)?);
    out.extend_from_slice(&make_immediate(flavour, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", payload_len)?);
    out.extend_from_slice(&make_immediate(flavour, DESCRIPTOR_ID_ID, item.name(), item.id())?);
    out.extend_from_slice(&make_address(flavour, DESCRIPTOR_NAME_ID, offsets[0])?);
    out.extend_from_slice(&make_address(flavour, DESCRIPTOR_DESCRIPTION_ID, offsets[1])?);
    out.extend_from_slice(&make_address(flavour, DESCRIPTOR_FORMAT_ID, offsets[2])?);
    out.extend_from_slice(&make_address(flavour, DESCRIPTOR_SHAPE_ID, offsets[3])?);
    if dtype_bytes.is_some() {
        out.extend_from_slice(&make_address(flavour, DESCRIPTOR_DTYPE_ID, offsets[4])?);
    }
    out.extend_from_slice(&payload);

    log::debug!(
        "[descriptor] item {:#x} ({}): {} bytes, {} pointers",
        item.id(),
        item.name(),
        out.len(),
        num_items
    );
    Ok(out)
}

/// Encode a shape as one byte (`0x01` if variable, else `0x00`) followed by
/// `address_bytes` of big-endian axis length (ICD section 4.2).
fn encode_shape(flavour: Flavour, shape: &[Option<u64>]) -> Vec<u8> {
    let address_bytes = flavour.address_bytes();
    let mut out = Vec::with_capacity(shape.len() * (1 + address_bytes as usize));
    for axis in shape {
        match axis {
            Some(len) => {
                out.push(0x00);
                out.extend_from_slice(&len.to_be_bytes()[8 - address_bytes as usize..]);
            }
            None => {
                out.push(0x01);
                out.extend(std::iter::repeat_n(0u8, address_bytes as usize));
            }
        }
    }
    out
}

/// Encode a fallback format as, per field, one ASCII code byte followed by
/// `item_bytes` of big-endian bit length (ICD section 4.2).
fn encode_format(flavour: Flavour, format: &[FormatField]) -> Vec<u8> {
    let item_bytes = flavour.item_bytes();
    let mut out = Vec::with_capacity(format.len() * (1 + item_bytes as usize));
    for field in format {
        out.push(field.code as u8);
        out.extend_from_slice(&u64::from(field.length_bits).to_be_bytes()[8 - item_bytes as usize..]);
    }
    out
}

/// Encode the numpy dtype-dict repr in stable key order (`descr`,
/// `fortran_order`, `shape`), matching the `.npy` header literal form a
/// receiver's parser expects (ICD section 4.2 / DESIGN NOTES).
fn encode_dtype(dtype: crate::item::DType, order: Order, shape: &[u64]) -> String {
    let fortran_order = matches!(order, Order::Fortran);
    format!(
        "{{'descr': '{}', 'fortran_order': {}, 'shape': {}}}",
        dtype.descr(),
        if fortran_order { "True" } else { "False" },
        format_shape_tuple(shape)
    )
}

/// Python-literal tuple repr: `()`, `(n,)`, or `(a, b, ...)`.
fn format_shape_tuple(shape: &[u64]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        _ => {
            let joined = shape.iter().map(u64::to_string).collect::<Vec<_>>().join(", ");
            format!("({joined})")
        }
    }
}
