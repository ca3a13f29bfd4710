//! Four-way set-associative cache with FIFO replacement.

use std::collections::{HashMap, VecDeque};

use crate::cache::{AccessOutcome, Cache, CacheLine};
use crate::common::{word_byte, word_with_byte, AddressLayout, Request, SimConfig};
use crate::memory::MainMemory;

const WAYS: usize = 4;

/// Each set is a FIFO of up to four resident lines: new lines are appended
/// at the back, the front line is the eviction victim. Hits do not reorder
/// the queue.
pub struct FourWayCache {
    layout: AddressLayout,
    line_size: u32,
    memory_latency: u64,
    sets: HashMap<u32, VecDeque<CacheLine>>,
    memory: MainMemory,
}

impl FourWayCache {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            layout: AddressLayout::four_way(config.cache_line_size, config.cache_lines),
            line_size: config.cache_line_size,
            memory_latency: u64::from(config.memory_latency),
            sets: HashMap::new(),
            memory: MainMemory::new(),
        }
    }

    /// Bring the line containing `a` into its set, evicting the oldest
    /// resident if the set is full.
    fn fill_line(&mut self, a: u32) {
        let parts = self.layout.split(a);
        let mut line = CacheLine::empty(self.line_size);
        line.refill(&self.memory, self.layout.line_base(a), parts.tag);
        let set = self.sets.entry(parts.index).or_default();
        if set.len() >= WAYS {
            set.pop_front();
        }
        set.push_back(line);
    }

    fn resident(&mut self, a: u32) -> Option<&mut CacheLine> {
        let parts = self.layout.split(a);
        self.sets
            .get_mut(&parts.index)?
            .iter_mut()
            .find(|line| line.valid && line.tag == parts.tag)
    }

    fn read_byte(&mut self, a: u32, hit: &mut bool, stall_ns: &mut u64) -> u8 {
        let offset = self.layout.split(a).offset;
        if let Some(line) = self.resident(a) {
            return line.data[offset as usize];
        }
        *hit = false;
        *stall_ns += self.memory_latency;
        self.fill_line(a);
        self.memory.read(a)
    }

    fn write_byte(&mut self, a: u32, value: u8, hit: &mut bool, stall_ns: &mut u64) {
        let offset = self.layout.split(a).offset;
        if let Some(line) = self.resident(a) {
            line.data[offset as usize] = value;
            return;
        }
        *hit = false;
        *stall_ns += self.memory_latency;
        // main memory already holds the written value, the fill picks it up
        self.fill_line(a);
    }
}

impl Cache for FourWayCache {
    fn process_request(&mut self, req: &Request) -> AccessOutcome {
        let mut hit = true;
        let mut stall_ns = 0;
        if req.we {
            // write-through: memory first, for all four bytes
            for i in 0..4 {
                self.memory
                    .write(req.addr.wrapping_add(i), word_byte(req.data, i));
            }
            for i in 0..4 {
                self.write_byte(
                    req.addr.wrapping_add(i),
                    word_byte(req.data, i),
                    &mut hit,
                    &mut stall_ns,
                );
            }
            AccessOutcome {
                hit,
                stall_ns,
                read_data: None,
            }
        } else {
            let mut word = 0;
            // low-order byte first
            for i in (0..4).rev() {
                let byte = self.read_byte(req.addr.wrapping_add(i), &mut hit, &mut stall_ns);
                word = word_with_byte(word, i, byte);
            }
            AccessOutcome {
                hit,
                stall_ns,
                read_data: Some(word),
            }
        }
    }
}
