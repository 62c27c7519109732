//! Container framing.
//!
//! A multi-block stream opens with a 16-byte header:
//!
//! ```text
//! offset  0: ASCII "TSQ1"
//! offset  4: number of blocks, little-endian u32
//! offset  8: original uncompressed total, little-endian u64
//! offset 16: blocks
//! ```
//!
//! Each block is prefixed by a 3-byte little-endian length word: the low 23
//! bits are the compressed body length, bit 23 flags the extensions variant.
//! A declared length of zero or above [`OUTPUT_SZ`] is a hard error.

use crate::block::types::{EXTENSIONS_FLAG, LEN_MASK, OUTPUT_SZ};
use crate::error::TsqError;

/// Leading magic of a container stream.
pub const CONTAINER_MAGIC: [u8; 4] = *b"TSQ1";

/// Total size of the container header.
pub const CONTAINER_HEADER_LEN: usize = 16;

/// Size of the per-block length prefix.
pub const BLOCK_PREFIX_LEN: usize = 3;

/// Assemble the 16-byte container header.
pub fn container_header(n_blocks: u32, total_size: u64) -> [u8; CONTAINER_HEADER_LEN] {
    let mut h = [0u8; CONTAINER_HEADER_LEN];
    h[0..4].copy_from_slice(&CONTAINER_MAGIC);
    h[4..8].copy_from_slice(&n_blocks.to_le_bytes());
    h[8..16].copy_from_slice(&total_size.to_le_bytes());
    h
}

/// Parse and validate a container header, returning the block count and the
/// original uncompressed total.
pub fn parse_container_header(h: &[u8]) -> Result<(u32, u64), TsqError> {
    if h.len() < CONTAINER_HEADER_LEN {
        return Err(TsqError::TruncatedInput);
    }
    if h[0..4] != CONTAINER_MAGIC {
        return Err(TsqError::MalformedHeader);
    }
    let n_blocks = u32::from_le_bytes(h[4..8].try_into().unwrap());
    let total = u64::from_le_bytes(h[8..16].try_into().unwrap());
    if n_blocks == 0 {
        return Err(TsqError::MalformedHeader);
    }
    Ok((n_blocks, total))
}

/// Assemble the 3-byte length prefix for one stored block.
///
/// `body_len` must fit the format's 23-bit length field, which
/// [`OUTPUT_SZ`] guarantees for any block the encoder can produce.
pub fn block_prefix(body_len: u32, extensions: bool) -> [u8; BLOCK_PREFIX_LEN] {
    debug_assert!(body_len <= OUTPUT_SZ as u32);
    let word = (body_len & LEN_MASK) | if extensions { EXTENSIONS_FLAG } else { 0 };
    [word as u8, (word >> 8) as u8, (word >> 16) as u8]
}

/// Split a 3-byte length prefix into the body length and the extensions flag.
///
/// Returns `None` for lengths of zero or above [`OUTPUT_SZ`].
pub fn parse_block_prefix(p: &[u8; BLOCK_PREFIX_LEN]) -> Option<(usize, bool)> {
    let word = p[0] as u32 | (p[1] as u32) << 8 | (p[2] as u32) << 16;
    let len = (word & LEN_MASK) as usize;
    if len == 0 || len > OUTPUT_SZ {
        return None;
    }
    Some((len, word & EXTENSIONS_FLAG != 0))
}
