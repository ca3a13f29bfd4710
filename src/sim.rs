//! Simulation harness: builds the models, wires them up and drives the
//! 1 ns clock until the CPU requests a stop.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use asynchronix::simulation::{Address, Mailbox, SimInit, Simulation};
use asynchronix::time::MonotonicTime;
use log::info;

use crate::cache::{Cache, CacheModel, DirectMappedCache, FourWayCache};
use crate::common::{Request, SimConfig, SimReport};
use crate::cpu::Cpu;
use crate::error::SimError;
use crate::gates;
use crate::vcd::SignalTrace;

/// Signal values published by the models and read back by the harness.
#[derive(Default)]
pub struct RunSignals {
    pub cycles: AtomicU64,
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub done: AtomicBool,
}

/// Simulated nanoseconds since the start of the run.
pub(crate) fn time_ns(t: MonotonicTime) -> u64 {
    t.as_secs() as u64 * 1_000_000_000 + u64::from(t.subsec_nanos())
}

/// Run the configured cache simulation over `requests`.
///
/// Read requests have their `data` field overwritten with the value the
/// cache returned. When `tracefile` is given, a value-change dump of the
/// signals {cycles, misses, hits, addr, data, we, ready} is written there.
pub fn run_simulation(
    config: &SimConfig,
    requests: &mut [Request],
    tracefile: Option<&Path>,
) -> Result<SimReport, SimError> {
    config.validate()?;

    let signals = Arc::new(RunSignals::default());
    let trace = match tracefile {
        Some(path) => {
            let trace = SignalTrace::create(path).map_err(|source| SimError::TraceIo {
                path: path.to_path_buf(),
                source,
            })?;
            Some(Arc::new(Mutex::new(trace)))
        }
        None => None,
    };

    info!(
        "simulating {} requests against a {} cache ({} lines of {} bytes)",
        requests.len(),
        if config.direct_mapped {
            "direct-mapped"
        } else {
            "four-way"
        },
        config.cache_lines,
        config.cache_line_size,
    );

    let shared_requests = Arc::new(Mutex::new(requests.to_vec()));
    let cpu = Cpu::new(
        shared_requests.clone(),
        config.cycles,
        signals.clone(),
        trace.clone(),
    );

    let (mut sim, cpu_addr) = if config.direct_mapped {
        bind(
            cpu,
            CacheModel::new(
                DirectMappedCache::new(config),
                config.cache_latency,
                signals.clone(),
                trace.clone(),
            ),
        )
    } else {
        bind(
            cpu,
            CacheModel::new(
                FourWayCache::new(config),
                config.cache_latency,
                signals.clone(),
                trace.clone(),
            ),
        )
    };

    // one rising clock edge per iteration; completions scheduled inside the
    // following nanosecond are processed before the next edge
    while !signals.done.load(Ordering::Relaxed) {
        sim.send_event(Cpu::on_tick, (), &cpu_addr);
        sim.step_by(Duration::from_nanos(1));
    }

    if let Some(trace) = &trace {
        trace.lock().unwrap().flush();
    }

    requests.copy_from_slice(&shared_requests.lock().unwrap());

    Ok(SimReport {
        cycles: signals.cycles.load(Ordering::Relaxed),
        hits: signals.hits.load(Ordering::Relaxed),
        misses: signals.misses.load(Ordering::Relaxed),
        primitive_gate_count: gates::primitive_gate_count(config),
    })
}

fn bind<C: Cache>(mut cpu: Cpu, mut cache: CacheModel<C>) -> (Simulation, Address<Cpu>) {
    let cpu_mbox = Mailbox::new();
    let cache_mbox = Mailbox::new();
    cpu.o_req.connect(CacheModel::on_request, &cache_mbox);
    cache.o_done.connect(Cpu::on_completion, &cpu_mbox);
    let cpu_addr = cpu_mbox.address();
    let sim = SimInit::new()
        .add_model(cpu, cpu_mbox)
        .add_model(cache, cache_mbox)
        .init(MonotonicTime::EPOCH);
    (sim, cpu_addr)
}
