//! Shared data model: requests, results, configuration and address decoding.

use crate::error::SimError;

/// A single memory request from the trace.
///
/// Every request transfers exactly 4 bytes starting at `addr`; the address
/// may be unaligned and straddle a cache-line boundary. For writes `data`
/// holds the value to store, for reads it is the slot the simulator writes
/// the result back into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    pub addr: u32,
    pub data: u32,
    pub we: bool,
}

/// Outcome of one simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimReport {
    /// Total elapsed 1 ns ticks, or [`CYCLES_EXHAUSTED`] when the cycle
    /// budget ran out before the trace completed.
    pub cycles: u64,
    pub hits: u64,
    pub misses: u64,
    pub primitive_gate_count: u64,
}

/// Sentinel reported in [`SimReport::cycles`] when the budget expires first.
pub const CYCLES_EXHAUSTED: u64 = u64::MAX;

/// Simulation parameters.               // unit             default
#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    pub cycles: u64,                     // 1 ns ticks       10^9
    pub direct_mapped: bool,             //                  true
    pub cache_lines: u32,                // lines            512
    pub cache_line_size: u32,            // bytes            64
    pub cache_latency: u32,              // ns               1
    pub memory_latency: u32,             // ns               200
}

impl SimConfig {
    /// Check the structural invariants the cache hardware model relies on.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.cache_line_size == 0 || !self.cache_line_size.is_power_of_two() {
            return Err(SimError::Config(format!(
                "cache line size must be a power of 2, got {}",
                self.cache_line_size
            )));
        }
        if self.cache_lines == 0 || !self.cache_lines.is_power_of_two() {
            return Err(SimError::Config(format!(
                "cache lines must be a power of 2, got {}",
                self.cache_lines
            )));
        }
        if !self.direct_mapped && self.cache_lines < 4 {
            return Err(SimError::Config(format!(
                "a four-way cache needs at least 4 cache lines, got {}",
                self.cache_lines
            )));
        }
        let layout = AddressLayout::for_config(self);
        if layout.offset_bits + layout.index_bits > 32 {
            return Err(SimError::Config(format!(
                "offset bits ({}) and index bits ({}) exceed the 32-bit address",
                layout.offset_bits, layout.index_bits
            )));
        }
        Ok(())
    }
}

/// The tag/index/offset decomposition of a 32-bit byte address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressParts {
    pub tag: u32,
    pub index: u32,
    pub offset: u32,
}

/// Bit layout of the address fields for one cache geometry.
///
/// For a direct-mapped cache the index selects one of `cacheLines` lines;
/// for the four-way cache it selects one of `cacheLines / 4` sets.
#[derive(Clone, Copy, Debug)]
pub struct AddressLayout {
    pub offset_bits: u32,
    pub offset_mask: u32,
    pub index_bits: u32,
    pub index_mask: u32,
}

impl AddressLayout {
    pub fn direct_mapped(cache_line_size: u32, cache_lines: u32) -> Self {
        Self::with_index_count(cache_line_size, cache_lines)
    }

    pub fn four_way(cache_line_size: u32, cache_lines: u32) -> Self {
        Self::with_index_count(cache_line_size, cache_lines / 4)
    }

    pub fn for_config(config: &SimConfig) -> Self {
        if config.direct_mapped {
            Self::direct_mapped(config.cache_line_size, config.cache_lines)
        } else {
            Self::four_way(config.cache_line_size, config.cache_lines)
        }
    }

    fn with_index_count(cache_line_size: u32, indices: u32) -> Self {
        let offset_bits = cache_line_size.ilog2();
        let index_bits = indices.ilog2();
        Self {
            offset_bits,
            offset_mask: cache_line_size - 1,
            index_bits,
            index_mask: (indices - 1) << offset_bits,
        }
    }

    pub fn split(&self, addr: u32) -> AddressParts {
        AddressParts {
            // a tag field of width 0 compares as 0
            tag: addr
                .checked_shr(self.offset_bits + self.index_bits)
                .unwrap_or(0),
            index: (addr & self.index_mask) >> self.offset_bits,
            offset: addr & self.offset_mask,
        }
    }

    /// First byte address of the line containing `addr`.
    pub fn line_base(&self, addr: u32) -> u32 {
        addr & !self.offset_mask
    }
}

// The 32-bit data word maps onto bytes big-endian: byte 0 is bits 31..24 and
// lands at the request address, byte 3 is bits 7..0 and lands at address + 3.

pub fn word_byte(word: u32, i: u32) -> u8 {
    (word >> (24 - 8 * i)) as u8
}

pub fn word_with_byte(word: u32, i: u32, byte: u8) -> u32 {
    let shift = 24 - 8 * i;
    (word & !(0xff << shift)) | (u32::from(byte) << shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_mapped_split() {
        // 4 lines of 16 bytes: 4 offset bits, 2 index bits
        let layout = AddressLayout::direct_mapped(16, 4);
        assert_eq!(
            layout.split(0x00),
            AddressParts {
                tag: 0,
                index: 0,
                offset: 0
            }
        );
        // 0x40 wraps back to index 0 with a different tag
        assert_eq!(
            layout.split(0x40),
            AddressParts {
                tag: 1,
                index: 0,
                offset: 0
            }
        );
        assert_eq!(
            layout.split(0x37),
            AddressParts {
                tag: 0,
                index: 3,
                offset: 7
            }
        );
    }

    #[test]
    fn four_way_split_uses_set_count() {
        // 8 lines -> 2 sets of 4 ways: 1 index bit
        let layout = AddressLayout::four_way(16, 8);
        assert_eq!(layout.index_bits, 1);
        assert_eq!(layout.split(0x10).index, 1);
        assert_eq!(layout.split(0x20).index, 0);
        assert_eq!(layout.split(0x20).tag, 1);
    }

    #[test]
    fn single_set_has_no_index_bits() {
        let layout = AddressLayout::four_way(16, 4);
        assert_eq!(layout.index_bits, 0);
        assert_eq!(layout.split(0x400).index, 0);
        assert_eq!(layout.split(0x400).tag, 0x40);
    }

    #[test]
    fn tag_is_zero_when_fields_cover_the_address() {
        let layout = AddressLayout::direct_mapped(1 << 16, 1 << 16);
        assert_eq!(layout.split(u32::MAX).tag, 0);
    }

    #[test]
    fn line_base_masks_the_offset() {
        let layout = AddressLayout::direct_mapped(16, 4);
        assert_eq!(layout.line_base(0x37), 0x30);
        assert_eq!(layout.line_base(0xFFFF_FFFC), 0xFFFF_FFF0);
    }

    #[test]
    fn word_bytes_are_big_endian() {
        let word = 0xDEADBEEF;
        assert_eq!(word_byte(word, 0), 0xDE);
        assert_eq!(word_byte(word, 1), 0xAD);
        assert_eq!(word_byte(word, 2), 0xBE);
        assert_eq!(word_byte(word, 3), 0xEF);

        let mut rebuilt = 0;
        for i in 0..4 {
            rebuilt = word_with_byte(rebuilt, i, word_byte(word, i));
        }
        assert_eq!(rebuilt, word);
    }

    #[test]
    fn validate_rejects_bad_geometry() {
        let mut config = SimConfig {
            cycles: 1000,
            direct_mapped: true,
            cache_lines: 4,
            cache_line_size: 16,
            cache_latency: 1,
            memory_latency: 10,
        };
        assert!(config.validate().is_ok());

        config.cache_line_size = 24;
        assert!(config.validate().is_err());
        config.cache_line_size = 0;
        assert!(config.validate().is_err());
        config.cache_line_size = 16;

        config.cache_lines = 3;
        assert!(config.validate().is_err());
        config.cache_lines = 0;
        assert!(config.validate().is_err());

        config.cache_lines = 2;
        config.direct_mapped = false;
        assert!(config.validate().is_err());
    }
}
