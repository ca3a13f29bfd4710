//! Direct-mapped cache organization.

use std::collections::HashMap;

use crate::cache::{AccessOutcome, Cache, CacheLine};
use crate::common::{word_byte, word_with_byte, AddressLayout, Request, SimConfig};
use crate::memory::MainMemory;

/// One line per index; a conflicting tag evicts the resident line by
/// overwriting it in place.
pub struct DirectMappedCache {
    layout: AddressLayout,
    line_size: u32,
    memory_latency: u64,
    lines: HashMap<u32, CacheLine>,
    memory: MainMemory,
}

impl DirectMappedCache {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            layout: AddressLayout::direct_mapped(config.cache_line_size, config.cache_lines),
            line_size: config.cache_line_size,
            memory_latency: u64::from(config.memory_latency),
            lines: HashMap::new(),
            memory: MainMemory::new(),
        }
    }

    /// Look up the line for byte address `a`, refilling it from main memory
    /// on a tag mismatch. Returns the line and whether the byte hit.
    fn lookup(&mut self, a: u32, stall_ns: &mut u64) -> (&mut CacheLine, bool) {
        let parts = self.layout.split(a);
        let line_size = self.line_size;
        let line = self
            .lines
            .entry(parts.index)
            .or_insert_with(|| CacheLine::empty(line_size));
        if line.valid && line.tag == parts.tag {
            (line, true)
        } else {
            *stall_ns += self.memory_latency;
            line.refill(&self.memory, self.layout.line_base(a), parts.tag);
            (line, false)
        }
    }

    fn write(&mut self, addr: u32, data: u32) -> AccessOutcome {
        let mut hit = true;
        let mut stall_ns = 0;
        for i in 0..4 {
            let a = addr.wrapping_add(i);
            let offset = self.layout.split(a).offset;
            let (line, byte_hit) = self.lookup(a, &mut stall_ns);
            hit &= byte_hit;
            let byte = word_byte(data, i);
            line.data[offset as usize] = byte;
            // write-through to main memory
            self.memory.write(a, byte);
        }
        AccessOutcome {
            hit,
            stall_ns,
            read_data: None,
        }
    }

    fn read(&mut self, addr: u32) -> AccessOutcome {
        let mut hit = true;
        let mut stall_ns = 0;
        let mut word = 0;
        for i in 0..4 {
            let a = addr.wrapping_add(i);
            let offset = self.layout.split(a).offset;
            let (line, byte_hit) = self.lookup(a, &mut stall_ns);
            hit &= byte_hit;
            word = word_with_byte(word, i, line.data[offset as usize]);
        }
        AccessOutcome {
            hit,
            stall_ns,
            read_data: Some(word),
        }
    }
}

impl Cache for DirectMappedCache {
    fn process_request(&mut self, req: &Request) -> AccessOutcome {
        if req.we {
            self.write(req.addr, req.data)
        } else {
            self.read(req.addr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(lines: u32, line_size: u32, memory_latency: u32) -> DirectMappedCache {
        DirectMappedCache::new(&SimConfig {
            cycles: 10_000,
            direct_mapped: true,
            cache_lines: lines,
            cache_line_size: line_size,
            cache_latency: 1,
            memory_latency,
        })
    }

    fn write(addr: u32, data: u32) -> Request {
        Request {
            addr,
            data,
            we: true,
        }
    }

    fn read(addr: u32) -> Request {
        Request {
            addr,
            data: 0,
            we: false,
        }
    }

    #[test]
    fn cold_write_misses_once_then_reads_back() {
        let mut c = cache(4, 16, 10);

        let w = c.process_request(&write(0x00, 0xDEADBEEF));
        // one cold byte triggers the fill, the remaining three hit the line
        assert_eq!(
            w,
            AccessOutcome {
                hit: false,
                stall_ns: 10,
                read_data: None
            }
        );

        let r = c.process_request(&read(0x00));
        assert_eq!(
            r,
            AccessOutcome {
                hit: true,
                stall_ns: 0,
                read_data: Some(0xDEADBEEF)
            }
        );
    }

    #[test]
    fn never_written_address_reads_zero() {
        let mut c = cache(4, 16, 10);
        let r = c.process_request(&read(0x80));
        assert_eq!(r.read_data, Some(0));
        assert!(!r.hit);
    }

    #[test]
    fn conflicting_tags_evict_each_other() {
        let mut c = cache(4, 16, 10);
        // 0x00 and 0x40 both map to index 0
        assert!(!c.process_request(&read(0x00)).hit);
        assert!(!c.process_request(&read(0x40)).hit);
        assert!(!c.process_request(&read(0x00)).hit);
    }

    #[test]
    fn straddling_read_fills_both_lines() {
        let mut c = cache(4, 16, 10);
        // bytes 14..18 touch lines 0 and 1
        let r = c.process_request(&read(0x0E));
        assert!(!r.hit);
        assert_eq!(r.stall_ns, 20);

        // both lines now resident
        let again = c.process_request(&read(0x0E));
        assert!(again.hit);
        assert_eq!(again.stall_ns, 0);
    }

    #[test]
    fn straddling_write_reads_back() {
        let mut c = cache(4, 16, 10);
        c.process_request(&write(0x0E, 0x11223344));
        let r = c.process_request(&read(0x0E));
        assert_eq!(r.read_data, Some(0x11223344));
    }

    #[test]
    fn refill_picks_up_memory_written_by_evicted_line() {
        let mut c = cache(4, 16, 10);
        c.process_request(&write(0x00, 0xCAFEBABE));
        // evict line 0 by touching the conflicting tag, then come back
        c.process_request(&read(0x40));
        let r = c.process_request(&read(0x00));
        assert!(!r.hit);
        assert_eq!(r.read_data, Some(0xCAFEBABE));
    }

    #[test]
    fn top_of_address_space_wraps_without_panic() {
        let mut c = cache(4, 16, 10);
        c.process_request(&write(0xFFFF_FFFC, 0x01020304));
        let r = c.process_request(&read(0xFFFF_FFFC));
        assert_eq!(r.read_data, Some(0x01020304));
        assert!(r.hit);
    }
}
