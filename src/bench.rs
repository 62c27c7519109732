//! Built-in benchmark, reachable as `tsq b`.
//!
//! Memory-to-memory so no file I/O pollutes the numbers: compress a
//! deterministic text corpus at level 0 and level 2, decompress, verify the
//! round trip byte-for-byte, and report throughput.

use std::time::Instant;

use crate::config::LEVEL_DEFAULT;
use crate::error::TsqError;
use crate::lorem;
use crate::pipeline::{Compressor, Decompressor};

/// Corpus size for the benchmark (64 MiB).
const BENCH_SIZE: usize = 64 << 20;

fn mb_per_s(bytes: usize, elapsed: std::time::Duration) -> f64 {
    bytes as f64 / 1e6 / elapsed.as_secs_f64().max(1e-9)
}

/// Run the benchmark; returns an error only if a context cannot be built or
/// a job fails outright.
pub fn run() -> Result<(), TsqError> {
    eprintln!("generating {} MiB corpus...", BENCH_SIZE >> 20);
    let corpus = lorem::generate(0x5EED, BENCH_SIZE);

    let compressor = Compressor::new(false)?;
    let decompressor = Decompressor::new(false)?;

    let mut last = Vec::new();
    for level in [LEVEL_DEFAULT, 2] {
        let start = Instant::now();
        let packed = compressor.compress_buffer(&corpus, true, level)?;
        let elapsed = start.elapsed();
        eprintln!(
            "compress   level {}: {:8.3} MB/s  ({} -> {} bytes, {:.2}%)",
            level,
            mb_per_s(corpus.len(), elapsed),
            corpus.len(),
            packed.len(),
            packed.len() as f64 / corpus.len() as f64 * 100.0,
        );
        last = packed;
    }

    let start = Instant::now();
    let unpacked = decompressor.decompress_buffer(&last)?;
    let elapsed = start.elapsed();
    eprintln!(
        "decompress        : {:8.3} MB/s",
        mb_per_s(unpacked.len(), elapsed)
    );

    if unpacked != corpus {
        eprintln!("error: round trip mismatch");
        return Err(TsqError::JobFailed);
    }
    eprintln!("round trip verified ({} bytes)", corpus.len());
    Ok(())
}
