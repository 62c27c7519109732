//! Compile-time configuration for the pipeline and the `tsq` driver.
//!
//! Wire-format constants live in [`crate::block::types`]; everything here is
//! a tunable of the surrounding machinery and can change without affecting
//! stream compatibility.

/// Input ring depth per worker: how many raw blocks the reader may buffer
/// ahead of a worker.
pub const N_INPUT_BUFFERS: usize = 3;

/// Output ring depth per worker: how many finished blocks a worker may buffer
/// ahead of the writer.
pub const N_OUTPUT_BUFFERS: usize = 3;

/// Highest supported compression level.  Level 0 is the single-slot fast
/// match finder; levels 1..=10 widen the per-bucket candidate cache to
/// `2^level` entries.
pub const LEVEL_MAX: u8 = 10;

/// Default compression level for the CLI and the benchmark.
pub const LEVEL_DEFAULT: u8 = 0;

/// Hard upper bound on the number of worker threads per context.  Requests
/// above this are rejected rather than silently clamped.
pub const WORKERS_MAX: usize = 64;
