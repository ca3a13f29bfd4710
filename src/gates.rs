//! Analytic primitive-gate estimate for the modeled cache hardware.
//!
//! The formula counts 2-input-gate equivalents for the multiplexers, tag
//! comparators and SRAM bits of the chosen organization, independent of the
//! simulated traffic, and rounds the total up to the next multiple of 100.

use crate::common::SimConfig;

pub fn primitive_gate_count(config: &SimConfig) -> u64 {
    let line_size = u64::from(config.cache_line_size);
    let cache_lines = u64::from(config.cache_lines);
    let offset_bits = u64::from(config.cache_line_size.ilog2());

    let total = if config.direct_mapped {
        let index_bits = u64::from(config.cache_lines.ilog2());
        let tag_bits = 32 - index_bits - offset_bits;
        // 2 cacheLines-to-1 multiplexers
        let mut gates = index_bits * 4 * 2;
        // 1 tag comparator
        gates += tag_bits * 2;
        // 1 SRAM cell (2 gates) per data and tag bit
        gates += cache_lines * 2 * (line_size * 8 + tag_bits);
        gates
    } else {
        let num_sets = cache_lines / 4;
        let set_index_bits = u64::from((config.cache_lines / 4).ilog2());
        let tag_bits = 32 - set_index_bits - offset_bits;
        // 2 numSets-to-1 multiplexers
        let mut gates = set_index_bits * 4 * 2;
        // 4 tag comparators
        gates += tag_bits * 2 * 4;
        // 4 32-bit 3-state buffers
        gates += 32 * 3 * 4;
        // 1 SRAM cell (2 gates) per data and tag bit
        gates += cache_lines * 2 * (line_size * 8 + tag_bits);
        // FIFO replacement logic
        gates += num_sets * 110;
        gates
    };

    total + (100 - total % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(direct_mapped: bool, cache_lines: u32, cache_line_size: u32) -> SimConfig {
        SimConfig {
            cycles: 1000,
            direct_mapped,
            cache_lines,
            cache_line_size,
            cache_latency: 1,
            memory_latency: 200,
        }
    }

    #[test]
    fn default_direct_mapped_geometry() {
        // 512 lines of 64 bytes: 9 index bits, 6 offset bits, 17 tag bits
        // mux 72 + comparator 34 + sram 512*2*(512+17) = 541_802, rounded up
        assert_eq!(primitive_gate_count(&config(true, 512, 64)), 541_900);
    }

    #[test]
    fn small_four_way_geometry() {
        // 4 lines of 16 bytes: 1 set, 0 set-index bits, 4 offset bits
        // comparators 224 + buffers 384 + sram 1248 + fifo 110 = 1966
        assert_eq!(primitive_gate_count(&config(false, 4, 16)), 2000);
    }

    #[test]
    fn always_rounded_to_a_multiple_of_100() {
        for (direct, lines, size) in [
            (true, 1, 1),
            (true, 512, 64),
            (true, 1 << 14, 64),
            (false, 4, 16),
            (false, 512, 64),
            (false, 1 << 15, 128),
        ] {
            let count = primitive_gate_count(&config(direct, lines, size));
            assert_eq!(count % 100, 0, "direct={direct} lines={lines} size={size}");
            assert!(count > 0);
        }
    }
}
