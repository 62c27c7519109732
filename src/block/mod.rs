//! Low-level block codec: wire format, match search, encoder, decoder.
//!
//! A block is at most [`BLOCK_SZ`] raw bytes compressed independently of all
//! other blocks.  [`Encoder::encode_block`] and [`decode_block`] operate on
//! single blocks without any threading; the pipeline in [`crate::pipeline`]
//! drives them across worker threads.

pub mod decode;
pub mod encode;
pub mod match_finder;
pub mod types;

pub use decode::decode_block;
pub use encode::Encoder;
pub use types::{
    encode_bound, BLOCK_BITS, BLOCK_SZ, DECODE_PAD, EXTENSIONS_FLAG, HEADER_LEN, LEN_MASK,
    MATCH_WINDOW, MAX_LITERAL_RUN, MIN_MATCH, MIN_OFFSET, OUTPUT_SZ,
};
