// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # spead-core - SPEAD v4 send-side wire codec and heap assembler
//!
//! A pure Rust implementation of the send-side of SPEAD (Streaming Protocol
//! for Exchange of Astronomical Data) v4: a flavour-parametrised wire codec,
//! descriptor builder, heap assembler, and packet generator for moving large
//! typed arrays from a producer to a capture node over UDP at line rate.
//!
//! ## Quick start
//!
//! ```
//! use spead_core::{Flavour, Heap, Item, FormatField, Value, FieldValue, PacketGenerator};
//! use spead_core::flavour::BugCompat;
//!
//! let flavour = Flavour::new(4, 64, 48, BugCompat::NONE).unwrap();
//! let mut heap = Heap::new(0x123456, flavour);
//! let item = Item::scalar(0x2345, "counter", "a scalar counter", FormatField::new('u', 16))
//!     .with_value(Value::Records(vec![vec![FieldValue::UInt(0x7654)]]));
//! heap.add_item(&item).unwrap();
//!
//! let packets: Vec<Vec<u8>> = PacketGenerator::new(&mut heap, 1500).unwrap().collect();
//! assert_eq!(packets.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +----------------------------------------------------------------+
//! |  Item  (typed value + shape/format, knows its canonical bytes) |
//! +----------------------------------------------------------------+
//! |  descriptor::build_descriptor  (item metadata -> sub-heap)     |
//! +----------------------------------------------------------------+
//! |  Heap  (gathers items/descriptors, allocates payload offsets)  |
//! +----------------------------------------------------------------+
//! |  PacketGenerator  (lazy Iterator<Item = Vec<u8>>, mtu-bounded)  |
//! +----------------------------------------------------------------+
//! |  wire  (flavour-parametrised header/pointer primitives)        |
//! +----------------------------------------------------------------+
//! ```
//!
//! ## Modules overview
//!
//! - [`flavour`] - wire parameter tuple two endpoints must agree on
//! - [`wire`] - header word and item-pointer byte primitives
//! - [`item`] - typed, shaped values and their canonical byte form
//! - [`descriptor`] - item metadata serialised as a sub-heap
//! - [`heap`] - gathers items/descriptors into an ordered pointer list + payload
//! - [`packet`] - splits a frozen heap into mtu-bounded packets
//! - [`config`] - `SendConfig`/`SendConfigBuilder` convenience entry point
//! - [`error`] - the crate's fatal error taxonomy

pub mod config;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod flavour;
pub mod heap;
pub mod item;
pub mod packet;
pub mod wire;

pub use config::{SendConfig, SendConfigBuilder};
pub use error::{SpeadError, SpeadResult};
pub use flavour::Flavour;
pub use heap::Heap;
pub use item::{DType, Endianness, FieldValue, FormatField, Item, NdArray, Order, ShapeAxis, Value};
pub use packet::PacketGenerator;
