//! The CPU request driver.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use asynchronix::model::{Model, Output};
use asynchronix::time::Scheduler;
use log::debug;

use crate::cache::Completion;
use crate::common::{Request, CYCLES_EXHAUSTED};
use crate::sim::{time_ns, RunSignals};
use crate::vcd::SignalTrace;

/// Feeds the trace to the cache, one request in flight at a time.
///
/// The driver observes every 1 ns clock tick: it counts the tick, and when
/// the cache is ready it dispatches the next request on that same tick. The
/// ready handshake comes back as a [`Completion`] message, which also
/// carries the read-back word for loads. When the cycle budget is reached
/// before another tick can be counted the driver stops the run and reports
/// the exhausted sentinel.
pub struct Cpu {
    requests: Arc<Mutex<Vec<Request>>>,
    total: usize,
    current: usize,
    elapsed: u64,
    max_cycles: u64,
    ready: bool,
    pub o_req: Output<Request>,
    signals: Arc<RunSignals>,
    trace: Option<Arc<Mutex<SignalTrace>>>,
}

impl Cpu {
    pub fn new(
        requests: Arc<Mutex<Vec<Request>>>,
        max_cycles: u64,
        signals: Arc<RunSignals>,
        trace: Option<Arc<Mutex<SignalTrace>>>,
    ) -> Self {
        let total = requests.lock().unwrap().len();
        Self {
            requests,
            total,
            current: 0,
            elapsed: 0,
            max_cycles,
            ready: true,
            o_req: Output::new(),
            signals,
            trace,
        }
    }

    pub async fn on_tick(&mut self, _: (), scheduler: &Scheduler<Self>) {
        if self.signals.done.load(Ordering::Relaxed) {
            return;
        }
        if self.elapsed >= self.max_cycles {
            // out of budget; an unfinished trace reports the sentinel
            if self.current < self.total || !self.ready {
                self.signals.cycles.store(CYCLES_EXHAUSTED, Ordering::Relaxed);
            }
            debug!("cycle budget of {} exhausted", self.max_cycles);
            self.signals.done.store(true, Ordering::Relaxed);
            return;
        }

        self.elapsed += 1;
        self.signals.cycles.store(self.elapsed, Ordering::Relaxed);
        let now = time_ns(scheduler.time());
        if let Some(trace) = &self.trace {
            trace.lock().unwrap().record_cycles(now, self.elapsed);
        }

        if self.ready {
            if self.current < self.total {
                let req = self.requests.lock().unwrap()[self.current];
                if let Some(trace) = &self.trace {
                    trace
                        .lock()
                        .unwrap()
                        .record_dispatch(now, req.addr, req.data, req.we);
                }
                self.ready = false;
                self.current += 1;
                self.o_req.send(req).await;
            } else {
                // nothing was ever dispatched (empty trace)
                self.signals.done.store(true, Ordering::Relaxed);
            }
        }
    }

    pub async fn on_completion(&mut self, completion: Completion) {
        self.ready = true;
        if let Some(data) = completion.read_data {
            self.requests.lock().unwrap()[self.current - 1].data = data;
        }
        if self.current >= self.total {
            self.signals.done.store(true, Ordering::Relaxed);
        }
    }
}

impl Model for Cpu {}
