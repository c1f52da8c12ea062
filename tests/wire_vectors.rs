// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end wire vectors reproducing the reference encoder's published hex
//! test vectors byte-for-byte. Flavour `(4, 64, 48, 0)`, `heap_cnt = 0x123456`,
//! mtu = 1500 throughout, matching the upstream test suite.

use spead_core::flavour::BugCompat;
use spead_core::wire::{make_address, make_header, make_immediate};
use spead_core::{
    DType, Endianness, FieldValue, Flavour, FormatField, Heap, Item, NdArray, Order, PacketGenerator, ShapeAxis, Value,
};

const HEAP_CNT: u64 = 0x123456;
const HEAP_CNT_ID: u64 = 0x01;
const HEAP_LENGTH_ID: u64 = 0x02;
const PAYLOAD_OFFSET_ID: u64 = 0x03;
const PAYLOAD_LENGTH_ID: u64 = 0x04;
const DESCRIPTOR_ID: u64 = 0x05;
const NULL_ID: u64 = 0x00;

fn flavour() -> Flavour {
    Flavour::new(4, 64, 48, BugCompat::NONE).unwrap()
}

fn one_packet(heap: &mut Heap) -> Vec<u8> {
    let packets: Vec<Vec<u8>> = PacketGenerator::new(heap, 1500).unwrap().collect();
    assert_eq!(packets.len(), 1, "expected exactly one packet for this small heap");
    packets.into_iter().next().unwrap()
}

#[test]
fn empty_heap_is_one_packet_with_null_padding() {
    let f = flavour();
    let mut heap = Heap::new(HEAP_CNT, f);

    let mut expected = Vec::new();
    expected.extend_from_slice(&make_header(f, 5));
    expected.extend_from_slice(&make_immediate(f, HEAP_CNT_ID, "HEAP_CNT", HEAP_CNT).unwrap());
    expected.extend_from_slice(&make_immediate(f, HEAP_LENGTH_ID, "HEAP_LENGTH", 1).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", 1).unwrap());
    expected.extend_from_slice(&make_address(f, NULL_ID, 0).unwrap());
    expected.push(0x00);

    assert_eq!(one_packet(&mut heap), expected);
}

#[test]
fn small_fixed_scalar_is_sent_as_immediate() {
    let f = flavour();
    let id = 0x2345u64;
    let value = 0x7654u64;
    let mut heap = Heap::new(HEAP_CNT, f);
    let item =
        Item::scalar(id, "name", "description", FormatField::new('u', 16)).with_value(Value::Records(vec![vec![FieldValue::UInt(value)]]));
    heap.add_item(&item).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&make_header(f, 6));
    expected.extend_from_slice(&make_immediate(f, HEAP_CNT_ID, "HEAP_CNT", HEAP_CNT).unwrap());
    expected.extend_from_slice(&make_immediate(f, HEAP_LENGTH_ID, "HEAP_LENGTH", 1).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", 1).unwrap());
    expected.extend_from_slice(&make_immediate(f, id, "name", value).unwrap());
    expected.extend_from_slice(&make_address(f, NULL_ID, 0).unwrap());
    expected.push(0x00);

    assert_eq!(one_packet(&mut heap), expected);
}

#[test]
fn small_variable_shape_is_sent_as_address_not_immediate() {
    let f = flavour();
    let id = 0x2345u64;
    let mut heap = Heap::new(HEAP_CNT, f);
    let item = Item::fallback(id, "name", "description", vec![ShapeAxis::Fixed(1), ShapeAxis::Variable], vec![FormatField::new('u', 8)])
        .with_value(Value::Records(vec![vec![FieldValue::UInt(4)], vec![FieldValue::UInt(5)]]));
    heap.add_item(&item).unwrap();

    let payload = [0x04u8, 0x05];
    let mut expected = Vec::new();
    expected.extend_from_slice(&make_header(f, 5));
    expected.extend_from_slice(&make_immediate(f, HEAP_CNT_ID, "HEAP_CNT", HEAP_CNT).unwrap());
    expected.extend_from_slice(&make_immediate(f, HEAP_LENGTH_ID, "HEAP_LENGTH", payload.len() as u64).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", payload.len() as u64).unwrap());
    expected.extend_from_slice(&make_address(f, id, 0).unwrap());
    expected.extend_from_slice(&payload);

    assert_eq!(one_packet(&mut heap), expected);
}

fn le_u16_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn numpy_c_order_item_carries_a_descriptor() {
    let f = flavour();
    let id = 0x2345u64;
    let data = le_u16_bytes(&[6, 7, 8, 10, 11, 12000]);
    let item = Item::numpy(id, "name", "description", vec![2, 3], DType::new(Endianness::Little, 'u', 2), Order::C)
        .with_value(Value::NumpyArray(NdArray::from_c_contiguous(vec![2, 3], 2, data.clone())));

    let mut heap = Heap::new(HEAP_CNT, f);
    heap.add_descriptor(&item).unwrap();
    heap.add_item(&item).unwrap();

    let descriptor = spead_core::descriptor::build_descriptor(f, &item).unwrap();
    let payload_len = (descriptor.len() + data.len()) as u64;

    let mut expected = Vec::new();
    expected.extend_from_slice(&make_header(f, 6));
    expected.extend_from_slice(&make_immediate(f, HEAP_CNT_ID, "HEAP_CNT", HEAP_CNT).unwrap());
    expected.extend_from_slice(&make_immediate(f, HEAP_LENGTH_ID, "HEAP_LENGTH", payload_len).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", payload_len).unwrap());
    expected.extend_from_slice(&make_address(f, DESCRIPTOR_ID, 0).unwrap());
    expected.extend_from_slice(&make_address(f, id, descriptor.len() as u64).unwrap());
    expected.extend_from_slice(&descriptor);
    expected.extend_from_slice(&data);

    assert_eq!(one_packet(&mut heap), expected);
}

#[test]
fn numpy_fortran_order_item_reorders_payload() {
    let f = flavour();
    let id = 0x2345u64;
    let c_order_data = le_u16_bytes(&[6, 7, 8, 10, 11, 12000]);
    let item = Item::numpy(id, "name", "description", vec![2, 3], DType::new(Endianness::Little, 'u', 2), Order::Fortran)
        .with_value(Value::NumpyArray(NdArray::from_c_contiguous(vec![2, 3], 2, c_order_data)));

    let mut heap = Heap::new(HEAP_CNT, f);
    heap.add_descriptor(&item).unwrap();
    heap.add_item(&item).unwrap();

    let descriptor = spead_core::descriptor::build_descriptor(f, &item).unwrap();
    let fortran_data = le_u16_bytes(&[6, 10, 7, 11, 8, 12000]);
    let payload_len = (descriptor.len() + fortran_data.len()) as u64;

    let mut expected = Vec::new();
    expected.extend_from_slice(&make_header(f, 6));
    expected.extend_from_slice(&make_immediate(f, HEAP_CNT_ID, "HEAP_CNT", HEAP_CNT).unwrap());
    expected.extend_from_slice(&make_immediate(f, HEAP_LENGTH_ID, "HEAP_LENGTH", payload_len).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", payload_len).unwrap());
    expected.extend_from_slice(&make_address(f, DESCRIPTOR_ID, 0).unwrap());
    expected.extend_from_slice(&make_address(f, id, descriptor.len() as u64).unwrap());
    expected.extend_from_slice(&descriptor);
    expected.extend_from_slice(&fortran_data);

    assert_eq!(one_packet(&mut heap), expected);

    assert!(descriptor.ends_with(b"'fortran_order': True, 'shape': (2, 3)}"));
}

#[test]
fn fallback_mixed_format_packs_bits_exactly() {
    let f = flavour();
    let id = 0x2345u64;
    let format = vec![FormatField::new('b', 1), FormatField::new('c', 7), FormatField::new('f', 32)];
    let item = Item::fallback(id, "name", "description", vec![ShapeAxis::Fixed(2)], format)
        .with_value(Value::Records(vec![
            vec![FieldValue::Bool(true), FieldValue::Char('y'), FieldValue::Float(1.0)],
            vec![FieldValue::Bool(false), FieldValue::Char('n'), FieldValue::Float(-1.0)],
        ]));

    let mut heap = Heap::new(HEAP_CNT, f);
    heap.add_descriptor(&item).unwrap();
    heap.add_item(&item).unwrap();

    let descriptor = spead_core::descriptor::build_descriptor(f, &item).unwrap();
    let records_bytes: [u8; 10] = [0xF9, 0x3F, 0x80, 0x00, 0x00, 0x6E, 0xBF, 0x80, 0x00, 0x00];
    let payload_len = (descriptor.len() + records_bytes.len()) as u64;

    let mut expected = Vec::new();
    expected.extend_from_slice(&make_header(f, 6));
    expected.extend_from_slice(&make_immediate(f, HEAP_CNT_ID, "HEAP_CNT", HEAP_CNT).unwrap());
    expected.extend_from_slice(&make_immediate(f, HEAP_LENGTH_ID, "HEAP_LENGTH", payload_len).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_OFFSET_ID, "PAYLOAD_OFFSET", 0).unwrap());
    expected.extend_from_slice(&make_immediate(f, PAYLOAD_LENGTH_ID, "PAYLOAD_LENGTH", payload_len).unwrap());
    expected.extend_from_slice(&make_address(f, DESCRIPTOR_ID, 0).unwrap());
    expected.extend_from_slice(&make_address(f, id, descriptor.len() as u64).unwrap());
    expected.extend_from_slice(&descriptor);
    expected.extend_from_slice(&records_bytes);

    assert_eq!(one_packet(&mut heap), expected);
}
