//! Per-worker bounded rings.
//!
//! Each worker owns one input ring and one output ring of pre-allocated
//! block buffers.  Four 64-bit monotonic counters describe the rings'
//! occupancy; the slot for a counter value is `counter % depth`:
//!
//! * `read`      — blocks the reader has filled into the input ring;
//! * `work_in`   — input blocks the worker has consumed;
//! * `work_out`  — output blocks the worker has produced;
//! * `write`     — output blocks the writer has drained.
//!
//! Each counter has a single writing thread.  All four live under one mutex
//! whose condvars provide both wakeups and cross-thread visibility; the slot
//! buffers themselves are touched outside that lock (the counters guarantee
//! exclusive access, the per-slot mutexes make that guarantee checkable).
//!
//! While a worker processes a block, `work_in == work_out` holds: the two
//! counters advance together once per block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use crate::pipeline::job::BlockBuf;

#[derive(Default)]
struct Counters {
    read: u64,
    work_in: u64,
    work_out: u64,
    write: u64,
}

pub(crate) struct WorkerRing {
    inputs: Vec<Mutex<BlockBuf>>,
    outputs: Vec<Mutex<BlockBuf>>,
    counters: Mutex<Counters>,
    /// Reader advanced `read`: input available for the worker.
    input_avail: Condvar,
    /// Worker advanced `work_in`: input slot free for the reader.
    input_space: Condvar,
    /// Worker advanced `work_out`: output available for the writer.
    output_avail: Condvar,
    /// Writer advanced `write`: output slot free for the worker.
    output_space: Condvar,
}

impl WorkerRing {
    /// Build a ring whose input slots hold `input_cap` bytes and output
    /// slots `output_cap` bytes.
    pub(crate) fn new(
        n_inputs: usize,
        n_outputs: usize,
        input_cap: usize,
        output_cap: usize,
    ) -> Self {
        WorkerRing {
            inputs: (0..n_inputs)
                .map(|_| Mutex::new(BlockBuf::with_capacity(input_cap)))
                .collect(),
            outputs: (0..n_outputs)
                .map(|_| Mutex::new(BlockBuf::with_capacity(output_cap)))
                .collect(),
            counters: Mutex::new(Counters::default()),
            input_avail: Condvar::new(),
            input_space: Condvar::new(),
            output_avail: Condvar::new(),
            output_space: Condvar::new(),
        }
    }

    /// Reader side: wait for a free input slot, fill it, publish it.
    /// Returns `false` if `exit` was raised while waiting.
    pub(crate) fn reader_fill(&self, exit: &AtomicBool, fill: impl FnOnce(&mut BlockBuf)) -> bool {
        let slot;
        {
            let mut c = self.counters.lock().unwrap();
            loop {
                if exit.load(Ordering::SeqCst) {
                    return false;
                }
                if c.read - c.work_in < self.inputs.len() as u64 {
                    break;
                }
                c = self.input_space.wait(c).unwrap();
            }
            slot = (c.read % self.inputs.len() as u64) as usize;
        }
        fill(&mut self.inputs[slot].lock().unwrap());
        self.counters.lock().unwrap().read += 1;
        self.input_avail.notify_one();
        true
    }

    /// Worker side: wait for one input block and one free output slot, run
    /// `process` over the pair, then advance both work counters.
    /// Returns `false` if `exit` was raised while waiting.
    pub(crate) fn worker_step(
        &self,
        exit: &AtomicBool,
        process: impl FnOnce(&mut BlockBuf, &mut BlockBuf),
    ) -> bool {
        let (in_slot, out_slot);
        {
            let mut c = self.counters.lock().unwrap();
            loop {
                if exit.load(Ordering::SeqCst) {
                    return false;
                }
                if c.read > c.work_in {
                    break;
                }
                c = self.input_avail.wait(c).unwrap();
            }
            loop {
                if exit.load(Ordering::SeqCst) {
                    return false;
                }
                if c.work_out - c.write < self.outputs.len() as u64 {
                    break;
                }
                c = self.output_space.wait(c).unwrap();
            }
            debug_assert_eq!(c.work_in, c.work_out);
            in_slot = (c.work_in % self.inputs.len() as u64) as usize;
            out_slot = (c.work_out % self.outputs.len() as u64) as usize;
        }
        {
            let mut input = self.inputs[in_slot].lock().unwrap();
            let mut output = self.outputs[out_slot].lock().unwrap();
            process(&mut input, &mut output);
        }
        {
            let mut c = self.counters.lock().unwrap();
            c.work_in += 1;
            c.work_out += 1;
        }
        self.input_space.notify_one();
        self.output_avail.notify_one();
        true
    }

    /// Writer side: wait for one output block, drain it, release the slot.
    /// Returns `false` if `exit` was raised while waiting.
    pub(crate) fn writer_drain(
        &self,
        exit: &AtomicBool,
        drain: impl FnOnce(&mut BlockBuf),
    ) -> bool {
        let slot;
        {
            let mut c = self.counters.lock().unwrap();
            loop {
                if exit.load(Ordering::SeqCst) {
                    return false;
                }
                if c.work_out > c.write {
                    break;
                }
                c = self.output_avail.wait(c).unwrap();
            }
            slot = (c.write % self.outputs.len() as u64) as usize;
        }
        drain(&mut self.outputs[slot].lock().unwrap());
        self.counters.lock().unwrap().write += 1;
        self.output_space.notify_one();
        true
    }

    /// Wake every thread parked on this ring so it can observe a raised exit
    /// flag.  Taking the counter lock first closes the race against a thread
    /// between its exit check and its wait.
    pub(crate) fn wake_all(&self) {
        drop(self.counters.lock().unwrap());
        self.input_avail.notify_all();
        self.input_space.notify_all();
        self.output_avail.notify_all();
        self.output_space.notify_all();
    }
}
