//! Byte sinks receiving the pipeline writer's output.
//!
//! A [`ByteWriter`] publishes bytes strictly in order through a
//! reserve-then-commit protocol: `get_dest` borrows a scratch region of the
//! requested size, `commit` publishes its first `n` bytes.  `write_all` is a
//! shortcut both implementations override to skip the staging copy.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::TsqError;

/// A sequential byte sink.
pub trait ByteWriter: Send {
    /// Borrow a scratch destination of exactly `size` bytes.
    fn get_dest(&mut self, size: usize) -> io::Result<&mut [u8]>;

    /// Publish the first `n` bytes of the region returned by the last
    /// [`get_dest`](ByteWriter::get_dest) call.
    fn commit(&mut self, n: usize) -> io::Result<()>;

    /// Total bytes published so far.
    fn pos(&self) -> u64;

    /// Publish `data` in one step.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.get_dest(data.len())?.copy_from_slice(data);
        self.commit(data.len())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File
// ─────────────────────────────────────────────────────────────────────────────

pub struct FileSink {
    file: File,
    staging: Vec<u8>,
    written: u64,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self, TsqError> {
        let file = File::create(path)?;
        Ok(FileSink {
            file,
            staging: Vec::new(),
            written: 0,
        })
    }
}

impl ByteWriter for FileSink {
    fn get_dest(&mut self, size: usize) -> io::Result<&mut [u8]> {
        self.staging.resize(size, 0);
        Ok(&mut self.staging[..])
    }

    fn commit(&mut self, n: usize) -> io::Result<()> {
        self.file.write_all(&self.staging[..n])?;
        self.written += n as u64;
        Ok(())
    }

    fn pos(&self) -> u64 {
        self.written
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory
// ─────────────────────────────────────────────────────────────────────────────

/// Appends into a caller-shared `Vec`; the caller keeps its `Arc` handle and
/// owns the bytes once the job completes.
pub struct MemorySink {
    out: Arc<Mutex<Vec<u8>>>,
    staging: Vec<u8>,
    written: u64,
}

impl MemorySink {
    pub fn new(out: Arc<Mutex<Vec<u8>>>) -> Self {
        MemorySink {
            out,
            staging: Vec::new(),
            written: 0,
        }
    }

    /// Pre-reserve capacity for the expected output.
    pub fn reserve(&self, additional: usize) {
        self.out.lock().unwrap().reserve(additional);
    }
}

impl ByteWriter for MemorySink {
    fn get_dest(&mut self, size: usize) -> io::Result<&mut [u8]> {
        self.staging.resize(size, 0);
        Ok(&mut self.staging[..])
    }

    fn commit(&mut self, n: usize) -> io::Result<()> {
        self.out.lock().unwrap().extend_from_slice(&self.staging[..n]);
        self.written += n as u64;
        Ok(())
    }

    fn pos(&self) -> u64 {
        self.written
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.lock().unwrap().extend_from_slice(data);
        self.written += data.len() as u64;
        Ok(())
    }
}
