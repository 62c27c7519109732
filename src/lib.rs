//! `turbosqueeze` — a block-structured LZ77-class codec built for very high
//! decompression throughput, with a multi-threaded pipeline for whole
//! streams and the `tsq` command-line tool.
//!
//! # Crate layout
//!
//! | Module     | Contents |
//! |------------|----------|
//! | `block`    | Block wire format, match finder, encoder, decoder. |
//! | `pipeline` | Reader/workers/writer contexts, per-worker rings, job API. |
//! | `io`       | Container framing and file/memory byte endpoints. |
//! | `bench`    | Built-in benchmark (`tsq b`). |
//! | `lorem`    | Deterministic text generator (benchmark corpus). |
//! | `cli`      | Argument parsing for the `tsq` binary. |
//! | `config`   | Pipeline and driver tunables. |
//! | `display`  | Notification-level output machinery. |
//! | `error`    | Crate error type. |
//! | `util`     | Core-count helper. |
//!
//! # Quick start
//!
//! ```no_run
//! use turbosqueeze::{Compressor, Decompressor};
//!
//! let ctx = Compressor::new(false)?;
//! let packed = ctx.compress_buffer(b"example payload", true, 0)?;
//! let unpacked = Decompressor::new(false)?.decompress_buffer(&packed)?;
//! assert_eq!(unpacked, b"example payload");
//! # Ok::<(), turbosqueeze::TsqError>(())
//! ```

pub mod bench;
pub mod block;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod lorem;
pub mod pipeline;
pub mod util;

pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 5;
pub const VERSION_STRING: &str = "0.5";

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use block::{decode_block, encode_bound, Encoder, BLOCK_SZ, OUTPUT_SZ};
pub use error::TsqError;
pub use pipeline::{CompletionFn, Compressor, Decompressor, Input, Output, ProgressFn};
