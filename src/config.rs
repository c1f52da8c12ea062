// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Send configuration: the bundled `(flavour, max_packet_size, heap_cnt_start)`
//! a host application builds once per outbound stream.

use crate::error::{SpeadError, SpeadResult};
use crate::flavour::{BugCompat, Flavour};

/// Bundled, validated configuration for one outbound SPEAD stream.
///
/// An alternative entry point to threading `Flavour` and `max_packet_size` as
/// separate arguments through `Heap::new`/`PacketGenerator::new`; both paths
/// remain available.
#[derive(Debug, Clone, Copy)]
pub struct SendConfig {
    pub flavour: Flavour,
    pub max_packet_size: usize,
    pub heap_cnt_start: u64,
}

impl SendConfig {
    #[must_use]
    pub fn builder() -> SendConfigBuilder {
        SendConfigBuilder::default()
    }

    /// Re-validate a config built by hand rather than through the builder.
    pub fn validate(&self) -> SpeadResult<()> {
        Flavour::new(
            self.flavour.version(),
            self.flavour.item_pointer_bits(),
            self.flavour.heap_address_bits(),
            self.flavour.bug_compat(),
        )?;
        let min_packet = 8 * (1 + 4) + 1;
        if self.max_packet_size < min_packet {
            return Err(SpeadError::PacketTooSmall {
                max_packet_size: self.max_packet_size,
                required: min_packet,
            });
        }
        Ok(())
    }

    /// Parse a `SendConfig` from a YAML document of the shape
    /// `{ version, item_pointer_bits, heap_address_bits, bug_compat, max_packet_size, heap_cnt_start }`.
    #[cfg(feature = "config-loader")]
    pub fn from_yaml(yaml: &str) -> SpeadResult<Self> {
        let raw: RawSendConfig = serde_yaml::from_str(yaml).map_err(|err| SpeadError::FlavourInvalid {
            reason: format!("could not parse SendConfig YAML: {err}"),
        })?;
        let flavour = Flavour::new(
            raw.version,
            raw.item_pointer_bits,
            raw.heap_address_bits,
            BugCompat::from_bits(raw.bug_compat),
        )?;
        let config = SendConfig {
            flavour,
            max_packet_size: raw.max_packet_size,
            heap_cnt_start: raw.heap_cnt_start.unwrap_or(0),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "config-loader")]
#[derive(serde::Deserialize)]
struct RawSendConfig {
    version: u8,
    item_pointer_bits: u8,
    heap_address_bits: u8,
    #[serde(default)]
    bug_compat: u32,
    max_packet_size: usize,
    heap_cnt_start: Option<u64>,
}

/// Fluent builder for [`SendConfig`], in the style of other validated
/// configuration builders in this codebase: each setter returns `Self`, and
/// `.build()` runs validation and returns a `Result`.
#[derive(Debug, Clone, Copy)]
pub struct SendConfigBuilder {
    version: u8,
    item_pointer_bits: u8,
    heap_address_bits: u8,
    bug_compat: BugCompat,
    max_packet_size: usize,
    heap_cnt_start: u64,
}

impl Default for SendConfigBuilder {
    fn default() -> Self {
        SendConfigBuilder {
            version: 4,
            item_pointer_bits: 64,
            heap_address_bits: 48,
            bug_compat: BugCompat::NONE,
            max_packet_size: 1500,
            heap_cnt_start: 0,
        }
    }
}

impl SendConfigBuilder {
    #[must_use]
    pub fn heap_address_bits(mut self, heap_address_bits: u8) -> Self {
        self.heap_address_bits = heap_address_bits;
        self
    }

    #[must_use]
    pub fn bug_compat(mut self, bug_compat: BugCompat) -> Self {
        self.bug_compat = bug_compat;
        self
    }

    #[must_use]
    pub fn max_packet_size(mut self, max_packet_size: usize) -> Self {
        self.max_packet_size = max_packet_size;
        self
    }

    #[must_use]
    pub fn heap_cnt_start(mut self, heap_cnt_start: u64) -> Self {
        self.heap_cnt_start = heap_cnt_start;
        self
    }

    /// Validate the flavour and `max_packet_size`, returning a ready-to-use config.
    pub fn build(self) -> SpeadResult<SendConfig> {
        let flavour = Flavour::new(self.version, self.item_pointer_bits, self.heap_address_bits, self.bug_compat)?;
        let config = SendConfig {
            flavour,
            max_packet_size: self.max_packet_size,
            heap_cnt_start: self.heap_cnt_start,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builder_produces_valid_config() {
        let config = SendConfig::builder().build().unwrap();
        assert_eq!(config.max_packet_size, 1500);
        assert_eq!(config.heap_cnt_start, 0);
    }

    #[test]
    fn rejects_max_packet_size_below_minimum_preface() {
        assert!(SendConfig::builder().max_packet_size(10).build().is_err());
    }

    #[test]
    fn rejects_invalid_heap_address_bits() {
        assert!(SendConfig::builder().heap_address_bits(50).build().is_err());
    }

    #[cfg(feature = "config-loader")]
    #[test]
    fn parses_from_yaml() {
        let yaml = "version: 4\nitem_pointer_bits: 64\nheap_address_bits: 48\nmax_packet_size: 1500\n";
        let config = SendConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.max_packet_size, 1500);
        assert_eq!(config.flavour.heap_address_bits(), 48);
    }
}
