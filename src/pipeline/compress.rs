//! Multi-threaded compression context.
//!
//! One reader thread splits each job's input into raw blocks and deals block
//! `i` to worker `i mod N`; each worker encodes blocks from its own input
//! ring into its output ring; one writer thread drains worker `i mod N` for
//! global block `i`, so output order falls out of the dealing order without
//! a reorder buffer.

use std::sync::{Arc, Mutex};
use std::thread;

use crate::block::types::{BLOCK_SZ, OUTPUT_SZ};
use crate::block::Encoder;
use crate::config::{LEVEL_MAX, N_INPUT_BUFFERS, N_OUTPUT_BUFFERS, WORKERS_MAX};
use crate::displaylevel;
use crate::error::TsqError;
use crate::io::{container_header, ByteWriter};
use crate::pipeline::job::{CompletionFn, Job, JobOutput, ProgressFn};
use crate::pipeline::ring::WorkerRing;
use crate::pipeline::shared::{shutdown, Shared, Threads};
use crate::pipeline::{Input, Output};
use crate::util::default_worker_count;

/// A compression context: a fixed pool of encode workers plus one reader and
/// one writer thread.  Dropping the context waits for all submitted jobs to
/// complete, then joins every thread.
///
/// A context is driven from one caller thread at a time; the threads it owns
/// are the only internal concurrency.
pub struct Compressor {
    shared: Arc<Shared>,
    threads: Threads,
}

impl Compressor {
    /// Context with one worker per logical core.
    pub fn new(verbose: bool) -> Result<Self, TsqError> {
        Self::with_workers(default_worker_count(), verbose)
    }

    /// Context with an explicit worker count (1..=[`WORKERS_MAX`]).
    pub fn with_workers(num_workers: usize, verbose: bool) -> Result<Self, TsqError> {
        if num_workers == 0 || num_workers > WORKERS_MAX {
            return Err(TsqError::InvalidArgument("worker count out of range"));
        }
        let rings = (0..num_workers)
            .map(|_| WorkerRing::new(N_INPUT_BUFFERS, N_OUTPUT_BUFFERS, BLOCK_SZ, OUTPUT_SZ))
            .collect();
        let shared = Arc::new(Shared::new(rings, verbose));

        let reader = {
            let sh = shared.clone();
            thread::Builder::new()
                .name("tsq-enc-reader".into())
                .spawn(move || reader_loop(&sh))
                .map_err(|_| TsqError::Allocation)?
        };
        let writer = {
            let sh = shared.clone();
            thread::Builder::new()
                .name("tsq-enc-writer".into())
                .spawn(move || writer_loop(&sh))
                .map_err(|_| TsqError::Allocation)?
        };
        let mut workers = Vec::with_capacity(num_workers);
        for w in 0..num_workers {
            let sh = shared.clone();
            let handle = thread::Builder::new()
                .name(format!("tsq-enc-worker-{w}"))
                .spawn(move || worker_loop(&sh, w))
                .map_err(|_| TsqError::Allocation)?;
            workers.push(handle);
        }

        Ok(Compressor {
            shared,
            threads: Threads {
                reader: Some(reader),
                workers,
                writer: Some(writer),
            },
        })
    }

    pub fn num_workers(&self) -> usize {
        self.shared.rings.len()
    }

    /// Queue a compression job and return its id immediately.  The container
    /// header is written to the sink before the job is admitted; blocks
    /// follow as workers finish them.
    pub fn compress_async(
        &self,
        input: Input,
        output: Output,
        extensions: bool,
        level: u8,
        completion: Option<CompletionFn>,
        progress: Option<ProgressFn>,
    ) -> Result<u32, TsqError> {
        if level > LEVEL_MAX {
            return Err(TsqError::InvalidArgument("compression level above 10"));
        }
        let source = input.into_reader()?;
        let input_len = source.len();
        if input_len == 0 {
            return Err(TsqError::InvalidArgument("empty input"));
        }
        let n_blocks = input_len.div_ceil(BLOCK_SZ as u64);
        let mut sink = output.into_writer()?;
        sink.write_all(&container_header(n_blocks as u32, input_len))?;
        let written = sink.pos();

        let id = self.shared.admit(n_blocks, |id, start_block| Job {
            id,
            start_block,
            n_blocks,
            input_len,
            extensions,
            level,
            input: Mutex::new(source),
            out: Mutex::new(JobOutput {
                sink,
                error_occurred: false,
                written,
                progress,
                completion,
            }),
        });
        Ok(id)
    }

    /// Compress synchronously; blocks until the job's completion fires.
    pub fn compress(
        &self,
        input: Input,
        output: Output,
        extensions: bool,
        level: u8,
    ) -> Result<(), TsqError> {
        let (tx, rx) = crossbeam_channel::bounded::<bool>(1);
        self.compress_async(
            input,
            output,
            extensions,
            level,
            Some(Box::new(move |_, ok| {
                let _ = tx.send(ok);
            })),
            None,
        )?;
        match rx.recv() {
            Ok(true) => Ok(()),
            _ => Err(TsqError::JobFailed),
        }
    }

    /// Compress a file on disk into a container file.
    pub fn compress_file(
        &self,
        src: &std::path::Path,
        dst: &std::path::Path,
        extensions: bool,
        level: u8,
    ) -> Result<(), TsqError> {
        self.compress(
            Input::Path(src.to_path_buf()),
            Output::Path(dst.to_path_buf()),
            extensions,
            level,
        )
    }

    /// Compress an in-memory buffer into an owned container image.
    pub fn compress_buffer(
        &self,
        data: &[u8],
        extensions: bool,
        level: u8,
    ) -> Result<Vec<u8>, TsqError> {
        let out = Arc::new(Mutex::new(Vec::new()));
        self.compress(
            Input::Memory(data.to_vec().into()),
            Output::Memory(out.clone()),
            extensions,
            level,
        )?;
        let vec = match Arc::try_unwrap(out) {
            Ok(m) => m.into_inner().unwrap(),
            Err(shared) => shared.lock().unwrap().clone(),
        };
        Ok(vec)
    }
}

impl Drop for Compressor {
    fn drop(&mut self) {
        shutdown(&self.shared, &mut self.threads);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Thread loops
// ─────────────────────────────────────────────────────────────────────────────

fn reader_loop(sh: &Shared) {
    let n = sh.rings.len() as u64;
    loop {
        let Some(job) = sh.wait_front_job() else {
            return;
        };
        let mut source = job.input.lock().unwrap();
        for b in job.start_block..job.start_block + job.n_blocks {
            let ring = &sh.rings[(b % n) as usize];
            let offset = (b - job.start_block) * BLOCK_SZ as u64;
            let to_read = (job.input_len - offset).min(BLOCK_SZ as u64) as usize;
            let ok = ring.reader_fill(&sh.exit_request, |buf| {
                buf.job = Some(job.clone());
                buf.extensions = job.extensions;
                buf.level = job.level;
                match source.read_into(&mut buf.data[..to_read]) {
                    Ok(got) if got == to_read => {
                        buf.len = to_read as u32;
                        buf.failed = false;
                    }
                    // Short read or I/O failure: pass the sentinel along so
                    // counters stay in step and the writer flags the job.
                    _ => {
                        buf.len = 0;
                        buf.failed = true;
                    }
                }
            });
            if !ok {
                return;
            }
        }
        drop(source);
        sh.pop_front_job();
    }
}

fn worker_loop(sh: &Shared, index: usize) {
    let ring = &sh.rings[index];
    // The encoder (and its hash state) is recreated only when a job asks for
    // a different level than the previous block seen by this worker.
    let mut encoder: Option<Encoder> = None;
    loop {
        let ok = ring.worker_step(&sh.exit_request, |input, output| {
            output.job = input.job.take();
            output.extensions = input.extensions;
            output.len = 0;
            output.failed = input.failed;
            if input.failed {
                return;
            }
            if encoder.as_ref().map(|e| e.level()) != Some(input.level) {
                // with_level only fails for levels above LEVEL_MAX, which
                // admission already rejected.
                encoder = Some(Encoder::with_level(input.level).expect("validated level"));
            }
            let enc = encoder.as_mut().unwrap();
            let n = enc.encode_block(
                &input.data[..input.len as usize],
                &mut output.data,
                input.extensions,
            );
            output.len = n as u32;
        });
        if !ok {
            return;
        }
    }
}

fn writer_loop(sh: &Shared) {
    let n = sh.rings.len() as u64;
    let mut k = 0u64; // global block ordinal
    loop {
        let ring = &sh.rings[(k % n) as usize];
        let ok = ring.writer_drain(&sh.exit_request, |buf| {
            let job = buf.job.take().expect("output block without a job");
            let mut out = job.out.lock().unwrap();

            if buf.failed || buf.len == 0 {
                out.error_occurred = true;
            } else if !out.error_occurred {
                let body = &buf.data[..buf.len as usize];
                let prefix = crate::io::block_prefix(buf.len, buf.extensions);
                let total = prefix.len() + body.len();
                let mut staged = false;
                if let Ok(dst) = out.sink.get_dest(total) {
                    dst[..3].copy_from_slice(&prefix);
                    dst[3..].copy_from_slice(body);
                    staged = true;
                }
                if staged && out.sink.commit(total).is_ok() {
                    out.written += total as u64;
                } else {
                    out.error_occurred = true;
                }
            }

            let done = k + 1 - job.start_block;
            let ratio = (done as f64 / job.n_blocks as f64).clamp(0.0, 1.0);
            if sh.verbose {
                displaylevel!(3, "\rjob {} : {:5.1}%   ", job.id, ratio * 100.0);
            }
            if let Some(p) = out.progress.as_mut() {
                p(job.id, ratio);
            }

            if k == job.start_block + job.n_blocks - 1 {
                let success = !out.error_occurred;
                let completion = out.completion.take();
                drop(out);
                if sh.verbose {
                    displaylevel!(
                        3,
                        "\rjob {} {}            \n",
                        job.id,
                        if success { "completed" } else { "failed" }
                    );
                }
                if let Some(c) = completion {
                    c(job.id, success);
                }
                sh.job_retired();
            }
        });
        if !ok {
            return;
        }
        k += 1;
    }
}
