//! Value-change-dump output for the simulation signals.
//!
//! The writer keeps the last emitted value per variable and only records
//! actual transitions, in simulated-time order, so the dump stays viewable
//! in standard waveform tools.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::error;

#[derive(Clone, Copy)]
pub struct VarId(usize);

struct Var {
    name: &'static str,
    width: u32,
    id: char,
    last: u64,
}

pub struct VcdWriter {
    out: BufWriter<File>,
    vars: Vec<Var>,
    current_time: Option<u64>,
    failed: bool,
}

impl VcdWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
            vars: Vec::new(),
            current_time: None,
            failed: false,
        })
    }

    /// Declare a wire. All declarations must happen before `write_header`.
    pub fn add_wire(&mut self, name: &'static str, width: u32, initial: u64) -> VarId {
        // identifier codes are consecutive printable characters from '!'
        let id = char::from(b'!' + self.vars.len() as u8);
        self.vars.push(Var {
            name,
            width,
            id,
            last: initial,
        });
        VarId(self.vars.len() - 1)
    }

    pub fn write_header(&mut self, module: &str) {
        let mut write = || -> io::Result<()> {
            writeln!(self.out, "$timescale 1 ns $end")?;
            writeln!(self.out, "$scope module {module} $end")?;
            for var in &self.vars {
                writeln!(self.out, "$var wire {} {} {} $end", var.width, var.id, var.name)?;
            }
            writeln!(self.out, "$upscope $end")?;
            writeln!(self.out, "$enddefinitions $end")?;
            writeln!(self.out, "$dumpvars")?;
            for var in &self.vars {
                Self::write_value(&mut self.out, var.width, var.id, var.last)?;
            }
            writeln!(self.out, "$end")?;
            Ok(())
        };
        if let Err(e) = write() {
            self.give_up(&e);
        }
    }

    /// Record `value` on `var` at `time` (ns). No-op if the value is
    /// unchanged since the last record.
    pub fn change(&mut self, time: u64, var: VarId, value: u64) {
        if self.failed || self.vars[var.0].last == value {
            return;
        }
        self.vars[var.0].last = value;
        if self.current_time != Some(time) {
            self.current_time = Some(time);
            if let Err(e) = writeln!(self.out, "#{time}") {
                self.give_up(&e);
                return;
            }
        }
        let var = &self.vars[var.0];
        if let Err(e) = Self::write_value(&mut self.out, var.width, var.id, value) {
            self.give_up(&e);
        }
    }

    pub fn flush(&mut self) {
        if self.failed {
            return;
        }
        if let Err(e) = self.out.flush() {
            self.give_up(&e);
        }
    }

    fn write_value(out: &mut BufWriter<File>, width: u32, id: char, value: u64) -> io::Result<()> {
        if width == 1 {
            writeln!(out, "{}{}", value & 1, id)
        } else {
            writeln!(out, "b{value:b} {id}")
        }
    }

    fn give_up(&mut self, e: &io::Error) {
        // keep simulating; the trace is best-effort once opened
        error!("trace file write failed, disabling trace: {e}");
        self.failed = true;
    }
}

/// The seven simulation signals of the waveform contract, bound to one
/// [`VcdWriter`].
pub struct SignalTrace {
    vcd: VcdWriter,
    cycles: VarId,
    misses: VarId,
    hits: VarId,
    addr: VarId,
    data: VarId,
    we: VarId,
    ready: VarId,
}

impl SignalTrace {
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut vcd = VcdWriter::create(path)?;
        let cycles = vcd.add_wire("cycles", 64, 0);
        let misses = vcd.add_wire("misses", 64, 0);
        let hits = vcd.add_wire("hits", 64, 0);
        let addr = vcd.add_wire("addr", 32, 0);
        let data = vcd.add_wire("data", 32, 0);
        let we = vcd.add_wire("we", 1, 0);
        // the cache starts out ready to accept a request
        let ready = vcd.add_wire("ready", 1, 1);
        vcd.write_header("cachesim");
        Ok(Self {
            vcd,
            cycles,
            misses,
            hits,
            addr,
            data,
            we,
            ready,
        })
    }

    pub fn record_cycles(&mut self, time: u64, cycles: u64) {
        self.vcd.change(time, self.cycles, cycles);
    }

    /// The CPU publishing a request and dropping the ready handshake.
    pub fn record_dispatch(&mut self, time: u64, addr: u32, data: u32, we: bool) {
        self.vcd.change(time, self.addr, u64::from(addr));
        self.vcd.change(time, self.data, u64::from(data));
        self.vcd.change(time, self.we, u64::from(we));
        self.vcd.change(time, self.ready, 0);
    }

    /// The cache finishing a request and re-asserting ready.
    pub fn record_completion(
        &mut self,
        time: u64,
        hits: u64,
        misses: u64,
        read_data: Option<u32>,
    ) {
        self.vcd.change(time, self.hits, hits);
        self.vcd.change(time, self.misses, misses);
        if let Some(data) = read_data {
            self.vcd.change(time, self.data, u64::from(data));
        }
        self.vcd.change(time, self.ready, 1);
    }

    pub fn flush(&mut self) {
        self.vcd.flush();
    }
}
