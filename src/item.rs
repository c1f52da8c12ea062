// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed, shaped items (ICD section 3) and their canonicalisation into the
//! contiguous byte layout the heap assembler writes into the payload buffer.
//!
//! An item's `value` is, in the reference implementation, a dynamically typed
//! slot holding either a numpy array or a ragged list of tuples. Here that is
//! a tagged sum: [`Value::NumpyArray`] for fixed-dtype multi-dimensional
//! arrays, [`Value::Records`] for the fallback bit-packed format.

use crate::error::{SpeadError, SpeadResult};
use crate::flavour::Flavour;

/// Byte order of a numpy-style dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
    /// Single-byte dtypes carry no endianness; numpy spells this `|`.
    NotApplicable,
}

impl Endianness {
    fn sigil(self) -> char {
        match self {
            Endianness::Little => '<',
            Endianness::Big => '>',
            Endianness::NotApplicable => '|',
        }
    }
}

/// A numpy-style dtype: endianness sigil + kind letter + byte width, e.g. `<u2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DType {
    pub endianness: Endianness,
    pub kind: char,
    pub itemsize: u8,
}

impl DType {
    #[must_use]
    pub fn new(endianness: Endianness, kind: char, itemsize: u8) -> Self {
        DType { endianness, kind, itemsize }
    }

    /// The `descr` string of the numpy dtype, e.g. `<u2`.
    #[must_use]
    pub fn descr(self) -> String {
        let sigil = if self.itemsize == 1 { Endianness::NotApplicable.sigil() } else { self.endianness.sigil() };
        format!("{sigil}{}{}", self.kind, self.itemsize)
    }
}

/// Memory order of a numpy-style array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    C,
    Fortran,
}

/// A single field of a fallback format: a one-letter type code and its bit width.
///
/// `code` is one of `'u'` (unsigned), `'i'` (signed), `'f'` (IEEE-754 float,
/// `length_bits` must be 32 or 64), `'b'` (boolean), `'c'` (ASCII character),
/// or `'0'` (zero-padding, consumes no value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatField {
    pub code: char,
    pub length_bits: u32,
}

impl FormatField {
    #[must_use]
    pub fn new(code: char, length_bits: u32) -> Self {
        FormatField { code, length_bits }
    }
}

/// One shape axis of a fallback-format item: fixed length, or variable
/// (length determined by the value supplied at `add_item` time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeAxis {
    Fixed(u64),
    Variable,
}

/// The value bound to one [`FormatField`] within one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    UInt(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
}

/// A fixed-dtype, multi-dimensional array backing a numpy-style item.
///
/// `strides` are in elements (not bytes), matching how a sliced/transposed
/// numpy view is described; `data` is raw little/big-endian bytes per
/// `elem_size`, addressed from `offset` (also in elements).
#[derive(Debug, Clone)]
pub struct NdArray {
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    elem_size: usize,
    data: Vec<u8>,
}

impl NdArray {
    /// Build a C-contiguous array directly from a flat byte buffer.
    #[must_use]
    pub fn from_c_contiguous(shape: Vec<usize>, elem_size: usize, data: Vec<u8>) -> Self {
        let strides = c_strides(&shape);
        NdArray { shape, strides, offset: 0, elem_size, data }
    }

    /// Build a Fortran-contiguous array directly from a flat byte buffer.
    #[must_use]
    pub fn from_fortran_contiguous(shape: Vec<usize>, elem_size: usize, data: Vec<u8>) -> Self {
        let strides = fortran_strides(&shape);
        NdArray { shape, strides, offset: 0, elem_size, data }
    }

    /// Build a view with explicit element strides and offset, e.g. a slice of
    /// a larger store. Used to model non-contiguous source arrays.
    #[must_use]
    pub fn with_strides(shape: Vec<usize>, strides: Vec<isize>, offset: usize, elem_size: usize, data: Vec<u8>) -> Self {
        NdArray { shape, strides, offset, elem_size, data }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_c_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == c_strides(&self.shape)
    }

    fn is_fortran_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == fortran_strides(&self.shape)
    }

    fn element_offset(&self, index: &[usize]) -> isize {
        let mut off = self.offset as isize;
        for (i, stride) in index.iter().zip(self.strides.iter()) {
            off += *i as isize * *stride;
        }
        off
    }

    fn element_bytes(&self, index: &[usize]) -> &[u8] {
        let elem = self.element_offset(index) as usize * self.elem_size;
        &self.data[elem..elem + self.elem_size]
    }

    /// Bytes in C (row-major) order: the source slice as-is if already
    /// C-contiguous, otherwise a fresh element-wise copy.
    #[must_use]
    pub fn canonical_c_order_bytes(&self) -> Vec<u8> {
        if self.is_c_contiguous() {
            let start = self.offset * self.elem_size;
            return self.data[start..start + self.len() * self.elem_size].to_vec();
        }
        let mut out = Vec::with_capacity(self.len() * self.elem_size);
        for_each_c_order_index(&self.shape, |idx| out.extend_from_slice(self.element_bytes(idx)));
        out
    }

    /// Bytes in Fortran (column-major) order: the source slice as-is if
    /// already Fortran-contiguous, otherwise a fresh element-wise copy.
    #[must_use]
    pub fn canonical_fortran_order_bytes(&self) -> Vec<u8> {
        if self.is_fortran_contiguous() {
            let start = self.offset * self.elem_size;
            return self.data[start..start + self.len() * self.elem_size].to_vec();
        }
        let mut out = Vec::with_capacity(self.len() * self.elem_size);
        for_each_fortran_order_index(&self.shape, |idx| out.extend_from_slice(self.element_bytes(idx)));
        out
    }
}

fn c_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![1isize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1] as isize;
    }
    strides
}

fn fortran_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![1isize; shape.len()];
    for i in 1..shape.len() {
        strides[i] = strides[i - 1] * shape[i - 1] as isize;
    }
    strides
}

fn for_each_c_order_index(shape: &[usize], mut visit: impl FnMut(&[usize])) {
    let mut idx = vec![0usize; shape.len()];
    if shape.contains(&0) {
        return;
    }
    loop {
        visit(&idx);
        let mut axis = shape.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            idx[axis] += 1;
            if idx[axis] < shape[axis] {
                break;
            }
            idx[axis] = 0;
            if axis == 0 {
                return;
            }
        }
    }
}

fn for_each_fortran_order_index(shape: &[usize], mut visit: impl FnMut(&[usize])) {
    let mut idx = vec![0usize; shape.len()];
    if shape.contains(&0) {
        return;
    }
    loop {
        visit(&idx);
        let mut axis = 0;
        loop {
            if axis == shape.len() {
                return;
            }
            idx[axis] += 1;
            if idx[axis] < shape[axis] {
                break;
            }
            idx[axis] = 0;
            axis += 1;
            if axis == shape.len() {
                return;
            }
        }
    }
}

/// The value bound to an item, tagged by which format stack produced it.
#[derive(Debug, Clone)]
pub enum Value {
    NumpyArray(NdArray),
    Records(Vec<Vec<FieldValue>>),
}

/// The shape/type stack an item declares (ICD section 3).
#[derive(Debug, Clone)]
pub enum ItemKind {
    Numpy { dtype: DType, order: Order, shape: Vec<u64> },
    Fallback { format: Vec<FormatField>, shape: Vec<ShapeAxis> },
}

/// A named, typed, shaped datum carried within a heap.
#[derive(Debug, Clone)]
pub struct Item {
    id: u64,
    name: String,
    description: String,
    kind: ItemKind,
    value: Option<Value>,
}

impl Item {
    /// Build a numpy-style item. All shape axes are fixed, per the ICD invariant.
    #[must_use]
    pub fn numpy(
        id: u64,
        name: impl Into<String>,
        description: impl Into<String>,
        shape: Vec<u64>,
        dtype: DType,
        order: Order,
    ) -> Self {
        Item {
            id,
            name: name.into(),
            description: description.into(),
            kind: ItemKind::Numpy { dtype, order, shape },
            value: None,
        }
    }

    /// Build a fallback-format item with a possibly-variable shape.
    #[must_use]
    pub fn fallback(
        id: u64,
        name: impl Into<String>,
        description: impl Into<String>,
        shape: Vec<ShapeAxis>,
        format: Vec<FormatField>,
    ) -> Self {
        Item {
            id,
            name: name.into(),
            description: description.into(),
            kind: ItemKind::Fallback { format, shape },
            value: None,
        }
    }

    /// Convenience for a fallback scalar item: shape `()`, a single format field.
    #[must_use]
    pub fn scalar(id: u64, name: impl Into<String>, description: impl Into<String>, field: FormatField) -> Self {
        Item::fallback(id, name, description, Vec::new(), vec![field])
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// `true` iff this item's format/shape combination qualifies it to be
    /// encoded as an 8-byte immediate instead of a payload-resident value
    /// (ICD section 3: fallback, single field, total bit width fitting the
    /// address field, scalar or `(1,)` shape).
    #[must_use]
    pub fn is_immediate_eligible(&self, flavour: Flavour) -> bool {
        let ItemKind::Fallback { format, shape } = &self.kind else {
            return false;
        };
        if format.len() != 1 {
            return false;
        }
        if format[0].length_bits > u32::from(flavour.heap_address_bits()) {
            return false;
        }
        matches!(shape.as_slice(), [] | [ShapeAxis::Fixed(1)])
    }

    /// If this item is immediate-eligible and carries a value, the packed
    /// `heap_address_bits`-wide value to inline into the item pointer.
    pub fn immediate_value(&self, flavour: Flavour) -> SpeadResult<Option<u64>> {
        if !self.is_immediate_eligible(flavour) {
            return Ok(None);
        }
        let ItemKind::Fallback { format, .. } = &self.kind else {
            unreachable!("is_immediate_eligible only returns true for Fallback items")
        };
        let Some(Value::Records(records)) = &self.value else {
            return Ok(None);
        };
        let field_value = records
            .first()
            .and_then(|record| record.first())
            .ok_or_else(|| SpeadError::ShapeMismatch {
                item_id: self.id,
                name: self.name.clone(),
                expected: 1,
                actual: 0,
            })?;
        Ok(Some(field_to_bits(*field_value, format[0])?))
    }

    /// Flatten this item's value into the canonical byte sequence the heap
    /// assembler copies into the payload buffer (ICD section 4.3).
    pub fn canonical_bytes(&self) -> SpeadResult<Vec<u8>> {
        match (&self.kind, &self.value) {
            (ItemKind::Numpy { order, .. }, Some(Value::NumpyArray(arr))) => Ok(match order {
                Order::C => arr.canonical_c_order_bytes(),
                Order::Fortran => arr.canonical_fortran_order_bytes(),
            }),
            (ItemKind::Fallback { format, shape }, Some(Value::Records(records))) => {
                let expected = fixed_record_count(shape);
                if let Some(expected) = expected {
                    if expected as usize != records.len() {
                        return Err(SpeadError::ShapeMismatch {
                            item_id: self.id,
                            name: self.name.clone(),
                            expected: expected as usize,
                            actual: records.len(),
                        });
                    }
                }
                pack_records(records, format, self.id, &self.name)
            }
            (_, None) => Ok(Vec::new()),
            (ItemKind::Numpy { .. }, Some(Value::Records(_)))
            | (ItemKind::Fallback { .. }, Some(Value::NumpyArray(_))) => Err(SpeadError::ShapeMismatch {
                item_id: self.id,
                name: self.name.clone(),
                expected: 0,
                actual: 0,
            }),
        }
    }
}

/// Product of the fixed axes, or `None` if the shape has a variable axis
/// (in which case the record count is whatever the value supplies).
fn fixed_record_count(shape: &[ShapeAxis]) -> Option<u64> {
    let mut count: u64 = 1;
    for axis in shape {
        match axis {
            ShapeAxis::Fixed(n) => count = count.saturating_mul(*n),
            ShapeAxis::Variable => return None,
        }
    }
    Some(count)
}

fn field_to_bits(value: FieldValue, field: FormatField) -> SpeadResult<u64> {
    let mask = if field.length_bits >= 64 { u64::MAX } else { (1u64 << field.length_bits) - 1 };
    Ok(match (field.code, value) {
        ('u', FieldValue::UInt(v)) => v & mask,
        ('i', FieldValue::Int(v)) => (v as u64) & mask,
        ('b', FieldValue::Bool(v)) => u64::from(v) & mask,
        ('c', FieldValue::Char(c)) => u64::from(c as u32) & mask,
        ('f', FieldValue::Float(v)) if field.length_bits == 32 => u64::from((v as f32).to_bits()),
        ('f', FieldValue::Float(v)) if field.length_bits == 64 => v.to_bits(),
        _ => return Err(SpeadError::FormatUnsupported { item_id: 0, name: String::new(), code: field.code }),
    })
}

/// Pack `records` against `format` as one continuous MSB-first bitstream
/// (ICD section 4.3), padding only at the very end to a whole byte.
fn pack_records(records: &[Vec<FieldValue>], format: &[FormatField], item_id: u64, name: &str) -> SpeadResult<Vec<u8>> {
    let mut bits: Vec<bool> = Vec::new();
    for record in records {
        let mut value_idx = 0;
        for field in format {
            if field.code == '0' {
                bits.extend(std::iter::repeat_n(false, field.length_bits as usize));
                continue;
            }
            let value = record.get(value_idx).copied().ok_or_else(|| SpeadError::ShapeMismatch {
                item_id,
                name: name.to_string(),
                expected: format.iter().filter(|f| f.code != '0').count(),
                actual: record.len(),
            })?;
            value_idx += 1;
            let packed = field_to_bits(value, *field).map_err(|_| SpeadError::FormatUnsupported {
                item_id,
                name: name.to_string(),
                code: field.code,
            })?;
            for bit in (0..field.length_bits).rev() {
                bits.push((packed >> bit) & 1 == 1);
            }
        }
    }
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    Ok(out)
}
