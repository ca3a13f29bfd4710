//! Cycle-accurate simulator for a single-level CPU data cache.
//!
//! A trace of 4-byte read/write requests is fed through either a
//! direct-mapped or a four-way set-associative cache (FIFO replacement) in
//! front of a byte-addressable main memory, on a discrete-event scheduler
//! with a 1 ns clock. A run reports the elapsed cycles, the hit and miss
//! counts and an analytic primitive-gate estimate of the modeled hardware,
//! and can dump a value-change waveform of the CPU/cache handshake signals.

pub mod cache;
pub mod common;
pub mod cpu;
pub mod csv;
pub mod error;
pub mod gates;
pub mod memory;
pub mod sim;
pub mod vcd;

pub use common::{Request, SimConfig, SimReport, CYCLES_EXHAUSTED};
pub use error::SimError;
pub use sim::run_simulation;
