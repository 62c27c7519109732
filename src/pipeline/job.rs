//! Jobs and the buffers that carry their blocks through the rings.

use std::sync::{Arc, Mutex};

use crate::io::{ByteReader, ByteWriter};

/// Called once when a job finishes; receives the job id and whether every
/// block was processed and written successfully.
pub type CompletionFn = Box<dyn FnOnce(u32, bool) + Send + 'static>;

/// Called after each written block with the job id and the fraction of the
/// job completed, non-decreasing and ending at exactly 1.0.
pub type ProgressFn = Box<dyn FnMut(u32, f64) + Send + 'static>;

/// One ring slot: a pre-allocated byte buffer plus the per-block annotations
/// the downstream stages need.
pub(crate) struct BlockBuf {
    pub data: Box<[u8]>,
    /// Meaningful bytes in `data`.
    pub len: u32,
    /// Sentinel replacing a block that could not be read or processed; the
    /// slot still flows through the pipeline to keep the counters in step.
    pub failed: bool,
    pub extensions: bool,
    pub level: u8,
    /// Owning job, attached by the reader at dispatch time.
    pub job: Option<Arc<Job>>,
}

impl BlockBuf {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        BlockBuf {
            data: vec![0u8; cap].into_boxed_slice(),
            len: 0,
            failed: false,
            extensions: false,
            level: 0,
            job: None,
        }
    }
}

/// Mutable, writer-owned half of a job.
pub(crate) struct JobOutput {
    pub sink: Box<dyn ByteWriter>,
    /// Sticky failure flag: once a block of this job fails, the remaining
    /// blocks are still consumed but nothing more is written.
    pub error_occurred: bool,
    /// Bytes published to the sink, container header included.
    pub written: u64,
    pub progress: Option<ProgressFn>,
    pub completion: Option<CompletionFn>,
}

/// A unit of work from admission to its completion callback.
///
/// The reader owns `input`, the writer owns `out`; the immutable header
/// fields are shared.  The pipeline drops its last reference when the final
/// block has been written and the completion callback has run.
pub(crate) struct Job {
    pub id: u32,
    /// Global ordinal of this job's first block.
    pub start_block: u64,
    pub n_blocks: u64,
    /// Total input bytes (for compression: raw size; for decompression:
    /// container size including the 16-byte header).
    pub input_len: u64,
    pub extensions: bool,
    pub level: u8,
    pub input: Mutex<Box<dyn ByteReader>>,
    pub out: Mutex<JobOutput>,
}
