//! Multi-threaded decompression context, symmetric to
//! [`crate::pipeline::compress::Compressor`].
//!
//! The container header is parsed at submission; the reader thread then
//! walks the stored blocks sequentially, handing block `i` (with its length
//! prefix stripped and its extensions flag decoded) to worker `i mod N`.

use std::sync::{Arc, Mutex};
use std::thread;

use crate::block::decode_block;
use crate::block::types::{BLOCK_SZ, HEADER_LEN, OUTPUT_SZ};
use crate::config::{N_INPUT_BUFFERS, N_OUTPUT_BUFFERS, WORKERS_MAX};
use crate::displaylevel;
use crate::error::TsqError;
use crate::io::{parse_block_prefix, parse_container_header, ByteWriter, FileSink, MemorySink};
use crate::io::{BLOCK_PREFIX_LEN, CONTAINER_HEADER_LEN};
use crate::pipeline::job::{CompletionFn, Job, JobOutput, ProgressFn};
use crate::pipeline::ring::WorkerRing;
use crate::pipeline::shared::{shutdown, Shared, Threads};
use crate::pipeline::{Input, Output};
use crate::util::default_worker_count;

/// Extra capacity of each decode output slot so the fast decode loop's
/// fixed-width copies stay in-bounds for full blocks.
const DECODE_SLOT_PAD: usize = 256;

/// A decompression context: a fixed pool of decode workers plus one reader
/// and one writer thread.  Dropping the context waits for all submitted jobs
/// to complete, then joins every thread.
pub struct Decompressor {
    shared: Arc<Shared>,
    threads: Threads,
}

impl Decompressor {
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
            .map(|_| {
                WorkerRing::new(
                    N_INPUT_BUFFERS,
                    N_OUTPUT_BUFFERS,
                    OUTPUT_SZ,
                    BLOCK_SZ + DECODE_SLOT_PAD,
                )
            })
            .collect();
        let shared = Arc::new(Shared::new(rings, verbose));

        let reader = {
            let sh = shared.clone();
            thread::Builder::new()
                .name("tsq-dec-reader".into())
                .spawn(move || reader_loop(&sh))
                .map_err(|_| TsqError::Allocation)?
        };
        let writer = {
            let sh = shared.clone();
            thread::Builder::new()
                .name("tsq-dec-writer".into())
                .spawn(move || writer_loop(&sh))
                .map_err(|_| TsqError::Allocation)?
        };
        let mut workers = Vec::with_capacity(num_workers);
        for w in 0..num_workers {
            let sh = shared.clone();
            let handle = thread::Builder::new()
                .name(format!("tsq-dec-worker-{w}"))
                .spawn(move || worker_loop(&sh, w))
                .map_err(|_| TsqError::Allocation)?;
            workers.push(handle);
        }

        Ok(Decompressor {
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

    /// Queue a decompression job and return its id immediately.
    ///
    /// The 16-byte container header is read and validated up front:
    /// submission fails on a bad magic, a zero block count, or a declared
    /// total above what the block count can carry.
    pub fn decompress_async(
        &self,
        input: Input,
        output: Output,
        completion: Option<CompletionFn>,
        progress: Option<ProgressFn>,
    ) -> Result<u32, TsqError> {
        let mut source = input.into_reader()?;
        let input_len = source.len();
        let mut header = [0u8; CONTAINER_HEADER_LEN];
        if source.read_into(&mut header)? != CONTAINER_HEADER_LEN {
            return Err(TsqError::TruncatedInput);
        }
        let (n_blocks, total) = parse_container_header(&header)?;
        if total > n_blocks as u64 * BLOCK_SZ as u64 {
            return Err(TsqError::MalformedHeader);
        }
        // Every stored block needs at least its prefix and a minimal body;
        // a declared count the input cannot possibly hold is rejected up
        // front (it would also make the memory-sink reservation absurd).
        let min_stored = n_blocks as u64 * (BLOCK_PREFIX_LEN as u64 + HEADER_LEN as u64);
        if min_stored > input_len.saturating_sub(CONTAINER_HEADER_LEN as u64) {
            return Err(TsqError::TruncatedInput);
        }

        let sink: Box<dyn ByteWriter> = match output {
            Output::Path(p) => Box::new(FileSink::create(&p)?),
            Output::Memory(buf) => {
                let sink = MemorySink::new(buf);
                sink.reserve(total as usize + 32);
                Box::new(sink)
            }
        };

        let id = self.shared.admit(n_blocks as u64, |id, start_block| Job {
            id,
            start_block,
            n_blocks: n_blocks as u64,
            input_len,
            extensions: false, // carried per block by the length prefixes
            level: 0,
            input: Mutex::new(source),
            out: Mutex::new(JobOutput {
                sink,
                error_occurred: false,
                written: 0,
                progress,
                completion,
            }),
        });
        Ok(id)
    }

    /// Decompress synchronously; blocks until the job's completion fires.
    pub fn decompress(&self, input: Input, output: Output) -> Result<(), TsqError> {
        let (tx, rx) = crossbeam_channel::bounded::<bool>(1);
        self.decompress_async(
            input,
            output,
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

    /// Decompress a container file into a plain file.
    pub fn decompress_file(
        &self,
        src: &std::path::Path,
        dst: &std::path::Path,
    ) -> Result<(), TsqError> {
        self.decompress(
            Input::Path(src.to_path_buf()),
            Output::Path(dst.to_path_buf()),
        )
    }

    /// Decompress an in-memory container image into an owned buffer.
    pub fn decompress_buffer(&self, data: &[u8]) -> Result<Vec<u8>, TsqError> {
        let out = Arc::new(Mutex::new(Vec::new()));
        self.decompress(
            Input::Memory(data.to_vec().into()),
            Output::Memory(out.clone()),
        )?;
        let vec = match Arc::try_unwrap(out) {
            Ok(m) => m.into_inner().unwrap(),
            Err(shared) => shared.lock().unwrap().clone(),
        };
        Ok(vec)
    }
}

impl Drop for Decompressor {
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
            let ok = ring.reader_fill(&sh.exit_request, |buf| {
                buf.job = Some(job.clone());
                buf.failed = true;
                buf.len = 0;

                let mut prefix = [0u8; BLOCK_PREFIX_LEN];
                let got = match source.read_into(&mut prefix) {
                    Ok(g) => g,
                    Err(_) => return,
                };
                if got != BLOCK_PREFIX_LEN {
                    return;
                }
                // A zero or oversize declared length is a hard error; the
                // sentinel propagates it to the job's sticky flag.
                let Some((body_len, ext)) = parse_block_prefix(&prefix) else {
                    return;
                };
                match source.read_into(&mut buf.data[..body_len]) {
                    Ok(g) if g == body_len => {
                        buf.len = body_len as u32;
                        buf.extensions = ext;
                        buf.failed = false;
                    }
                    _ => {}
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
    loop {
        let ok = ring.worker_step(&sh.exit_request, |input, output| {
            output.job = input.job.take();
            output.extensions = input.extensions;
            output.len = 0;
            output.failed = input.failed;
            if input.failed {
                return;
            }
            let produced = decode_block(
                &input.data[..input.len as usize],
                &mut output.data,
                input.extensions,
            );
            // decode_block reports a structurally broken block as zero
            // bytes; the writer turns that into the job's sticky error.
            output.len = produced as u32;
        });
        if !ok {
            return;
        }
    }
}

fn writer_loop(sh: &Shared) {
    let n = sh.rings.len() as u64;
    let mut k = 0u64;
    loop {
        let ring = &sh.rings[(k % n) as usize];
        let ok = ring.writer_drain(&sh.exit_request, |buf| {
            let job = buf.job.take().expect("output block without a job");
            let mut out = job.out.lock().unwrap();

            if buf.failed || buf.len == 0 {
                out.error_occurred = true;
            } else if !out.error_occurred {
                match out.sink.write_all(&buf.data[..buf.len as usize]) {
                    Ok(()) => out.written += buf.len as u64,
                    Err(_) => out.error_occurred = true,
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
