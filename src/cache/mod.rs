//! The two cache organizations and the simulation model wrapping them.
//!
//! Both organizations expose the same per-request surface through the
//! [`Cache`] trait; [`CacheModel`] turns either into a scheduler-driven
//! simulation model that charges the modeled latency before answering the
//! CPU.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use asynchronix::model::{Model, Output};
use asynchronix::time::Scheduler;
use log::debug;

use crate::common::Request;
use crate::memory::MainMemory;
use crate::sim::{time_ns, RunSignals};
use crate::vcd::SignalTrace;

mod direct_mapped;
mod four_way;

pub use direct_mapped::DirectMappedCache;
pub use four_way::FourWayCache;

/// One resident cache line.
///
/// Only valid lines take part in tag comparison. The byte storage is a dense
/// array of the configured line size; a refill always populates all of it
/// from main memory.
#[derive(Clone, Debug)]
pub struct CacheLine {
    pub tag: u32,
    pub valid: bool,
    pub data: Vec<u8>,
}

impl CacheLine {
    pub fn empty(line_size: u32) -> Self {
        Self {
            tag: 0,
            valid: false,
            data: vec![0; line_size as usize],
        }
    }

    /// Refill the whole line from main memory, starting at the line-aligned
    /// `base` address, and take ownership of `tag`.
    pub fn refill(&mut self, memory: &MainMemory, base: u32, tag: u32) {
        for j in 0..self.data.len() as u32 {
            self.data[j as usize] = memory.read(base.wrapping_add(j));
        }
        self.valid = true;
        self.tag = tag;
    }
}

/// What one request cost and produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessOutcome {
    /// True only if every byte of the request was already resident.
    pub hit: bool,
    /// Accumulated main-memory stall (memory latency per missed byte).
    pub stall_ns: u64,
    /// Assembled word for reads, `None` for writes.
    pub read_data: Option<u32>,
}

/// Per-request surface shared by the cache organizations.
pub trait Cache: Send + 'static {
    /// Perform the full 4-byte transfer for `req` against the cache state
    /// and main memory, reporting the hit/miss verdict and memory stall.
    fn process_request(&mut self, req: &Request) -> AccessOutcome;
}

/// Completion message sent back to the CPU when a request is served.
#[derive(Clone, Copy, Debug)]
pub struct Completion {
    pub hit: bool,
    pub read_data: Option<u32>,
}

/// Simulation model wrapping a cache organization.
///
/// The cache logic runs at the instant the request arrives; the completion
/// is scheduled `stall + cacheLatency` ns later, which is when the counters
/// move and the ready handshake is re-asserted.
pub struct CacheModel<C: Cache> {
    cache: C,
    cache_latency: u64,
    hits: u64,
    misses: u64,
    pub o_done: Output<Completion>,
    signals: Arc<RunSignals>,
    trace: Option<Arc<Mutex<SignalTrace>>>,
}

impl<C: Cache> CacheModel<C> {
    pub fn new(
        cache: C,
        cache_latency: u32,
        signals: Arc<RunSignals>,
        trace: Option<Arc<Mutex<SignalTrace>>>,
    ) -> Self {
        Self {
            cache,
            cache_latency: u64::from(cache_latency),
            hits: 0,
            misses: 0,
            o_done: Output::new(),
            signals,
            trace,
        }
    }

    pub async fn on_request(&mut self, req: Request, scheduler: &Scheduler<Self>) {
        let outcome = self.cache.process_request(&req);
        debug!(
            "request {}: addr {:#010x} {} ({} ns stall)",
            if req.we { "write" } else { "read" },
            req.addr,
            if outcome.hit { "hit" } else { "miss" },
            outcome.stall_ns,
        );
        let completion = Completion {
            hit: outcome.hit,
            read_data: outcome.read_data,
        };
        let delay = outcome.stall_ns + self.cache_latency;
        if delay == 0 {
            self.serve(completion, time_ns(scheduler.time())).await;
        } else {
            scheduler
                .schedule_event(
                    scheduler.time() + Duration::from_nanos(delay),
                    Self::on_complete,
                    completion,
                )
                .unwrap();
        }
    }

    pub async fn on_complete(&mut self, completion: Completion, scheduler: &Scheduler<Self>) {
        self.serve(completion, time_ns(scheduler.time())).await;
    }

    async fn serve(&mut self, completion: Completion, now: u64) {
        if completion.hit {
            self.hits += 1;
            self.signals.hits.store(self.hits, Ordering::Relaxed);
        } else {
            self.misses += 1;
            self.signals.misses.store(self.misses, Ordering::Relaxed);
        }
        if let Some(trace) = &self.trace {
            trace
                .lock()
                .unwrap()
                .record_completion(now, self.hits, self.misses, completion.read_data);
        }
        self.o_done.send(completion).await;
    }
}

impl<C: Cache> Model for CacheModel<C> {}
