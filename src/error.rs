//! Crate-wide error type.
//!
//! The low-level block codec never reports errors through this type: the
//! encoder cannot fail on a block-sized input, and the decoder signals a
//! structurally broken block by producing zero bytes.  `TsqError` covers
//! everything above that layer — container parsing, file I/O, argument
//! validation, and whole-job failures surfaced by the pipeline.

use std::fmt;
use std::io;

/// Errors reported by the container layer and the pipeline contexts.
#[derive(Debug)]
pub enum TsqError {
    /// Container magic mismatch, zero block count, or a declared block size
    /// outside the format limits.
    MalformedHeader,
    /// Fewer bytes were available than the stream declared.
    TruncatedInput,
    /// An underlying file operation failed.
    Io(io::Error),
    /// A working buffer or thread could not be created.
    Allocation,
    /// Empty input, an unsupported compression level, or a zero worker count.
    InvalidArgument(&'static str),
    /// An asynchronous job finished unsuccessfully; the per-block cause was
    /// already folded into the job's sticky error flag.
    JobFailed,
}

impl fmt::Display for TsqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsqError::MalformedHeader => write!(f, "malformed container header"),
            TsqError::TruncatedInput => write!(f, "input ends before the declared size"),
            TsqError::Io(e) => write!(f, "i/o error: {}", e),
            TsqError::Allocation => write!(f, "resource allocation failed"),
            TsqError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            TsqError::JobFailed => write!(f, "job did not complete successfully"),
        }
    }
}

impl std::error::Error for TsqError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TsqError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TsqError {
    fn from(e: io::Error) -> Self {
        TsqError::Io(e)
    }
}
