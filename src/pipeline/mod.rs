//! Multi-threaded block pipeline.
//!
//! A context owns one reader thread, one writer thread, and N workers, each
//! worker with two bounded rings of pre-allocated block buffers.  Jobs enter
//! a FIFO queue; the reader deals each job's blocks round-robin across the
//! workers, and the writer collects outputs in the same round-robin order,
//! which reproduces the input order globally: block `i` always lives on
//! worker `i mod N`.
//!
//! Failures never abort the pipeline.  A block that cannot be read or
//! decoded travels on as a sentinel so every counter still advances; the
//! writer folds it into the owning job's sticky error flag, which the
//! completion callback reports.

pub mod compress;
pub mod decompress;
pub(crate) mod job;
pub(crate) mod ring;
pub(crate) mod shared;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::TsqError;
use crate::io::{ByteReader, ByteWriter, FileSink, FileSource, MemorySink, MemorySource};

pub use compress::Compressor;
pub use decompress::Decompressor;
pub use job::{CompletionFn, ProgressFn};

/// Where a job's bytes come from.
pub enum Input {
    /// Read from a file on disk.
    Path(PathBuf),
    /// Read from an owned in-memory buffer.
    Memory(Arc<[u8]>),
}

impl Input {
    pub(crate) fn into_reader(self) -> Result<Box<dyn ByteReader>, TsqError> {
        Ok(match self {
            Input::Path(p) => Box::new(FileSource::open(&p)?),
            Input::Memory(m) => Box::new(MemorySource::new(m)),
        })
    }
}

/// Where a job's bytes go.
pub enum Output {
    /// Write to a file on disk (created or truncated at submission).
    Path(PathBuf),
    /// Append to a caller-shared buffer; the caller keeps the `Arc` and owns
    /// the bytes once the job completes.
    Memory(Arc<Mutex<Vec<u8>>>),
}

impl Output {
    pub(crate) fn into_writer(self) -> Result<Box<dyn ByteWriter>, TsqError> {
        Ok(match self {
            Output::Path(p) => Box::new(FileSink::create(&p)?),
            Output::Memory(buf) => Box::new(MemorySink::new(buf)),
        })
    }
}
