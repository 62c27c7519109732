//! State shared between a context's caller and its threads: the job queue,
//! the admission counters, the in-flight tracker, and the exit flag.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::pipeline::job::Job;
use crate::pipeline::ring::WorkerRing;

pub(crate) struct QueueState {
    pub jobs: VecDeque<Arc<Job>>,
    /// Next job id to hand out; ids start at 1.
    pub maxjobid: u32,
    /// Running total of blocks across all admitted jobs; assigns each block
    /// its global ordinal and thereby its worker.
    pub input_blocks: u64,
}

pub(crate) struct Shared {
    pub rings: Vec<WorkerRing>,
    pub queue: Mutex<QueueState>,
    pub queue_cv: Condvar,
    /// Jobs admitted but not yet completed; context teardown waits for zero.
    pub inflight: Mutex<u32>,
    pub inflight_cv: Condvar,
    pub exit_request: AtomicBool,
    pub verbose: bool,
}

impl Shared {
    pub(crate) fn new(rings: Vec<WorkerRing>, verbose: bool) -> Self {
        Shared {
            rings,
            queue: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                maxjobid: 1,
                input_blocks: 0,
            }),
            queue_cv: Condvar::new(),
            inflight: Mutex::new(0),
            inflight_cv: Condvar::new(),
            exit_request: AtomicBool::new(false),
            verbose,
        }
    }

    /// Admit one job: assign its id and starting block ordinal, account it
    /// in-flight, queue it, and wake the reader.
    pub(crate) fn admit(&self, n_blocks: u64, build: impl FnOnce(u32, u64) -> Job) -> u32 {
        *self.inflight.lock().unwrap() += 1;
        let id;
        {
            let mut q = self.queue.lock().unwrap();
            id = q.maxjobid;
            q.maxjobid += 1;
            let start = q.input_blocks;
            q.input_blocks += n_blocks;
            let job = Arc::new(build(id, start));
            q.jobs.push_back(job);
        }
        self.queue_cv.notify_all();
        id
    }

    /// Reader side: wait for the next queued job without removing it.
    /// Returns `None` once the exit flag is raised.
    pub(crate) fn wait_front_job(&self) -> Option<Arc<Job>> {
        let mut q = self.queue.lock().unwrap();
        loop {
            if self.exit_request.load(Ordering::SeqCst) {
                return None;
            }
            if let Some(job) = q.jobs.front() {
                return Some(job.clone());
            }
            q = self.queue_cv.wait(q).unwrap();
        }
    }

    /// Reader side: drop the fully-dispatched front job.
    pub(crate) fn pop_front_job(&self) {
        self.queue.lock().unwrap().jobs.pop_front();
        self.queue_cv.notify_all();
    }

    /// Writer side: one job fully written and its completion delivered.
    pub(crate) fn job_retired(&self) {
        let mut f = self.inflight.lock().unwrap();
        *f -= 1;
        if *f == 0 {
            self.inflight_cv.notify_all();
        }
    }

    /// Block until no admitted job is still in flight.
    pub(crate) fn wait_quiescent(&self) {
        let mut f = self.inflight.lock().unwrap();
        while *f > 0 {
            f = self.inflight_cv.wait(f).unwrap();
        }
    }

    /// Raise the exit flag and wake every parked thread.
    pub(crate) fn request_exit(&self) {
        self.exit_request.store(true, Ordering::SeqCst);
        drop(self.queue.lock().unwrap());
        self.queue_cv.notify_all();
        for ring in &self.rings {
            ring.wake_all();
        }
    }
}

/// Join handles of a context's threads.
pub(crate) struct Threads {
    pub reader: Option<JoinHandle<()>>,
    pub workers: Vec<JoinHandle<()>>,
    pub writer: Option<JoinHandle<()>>,
}

/// Common teardown: wait for in-flight jobs, raise the exit flag, join.
pub(crate) fn shutdown(shared: &Shared, threads: &mut Threads) {
    shared.wait_quiescent();
    shared.request_exit();
    if let Some(h) = threads.reader.take() {
        let _ = h.join();
    }
    for h in threads.workers.drain(..) {
        let _ = h.join();
    }
    if let Some(h) = threads.writer.take() {
        let _ = h.join();
    }
}
