//! Wire-format constants, memory helpers, and copy primitives shared by the
//! block encoder and decoder.
//!
//! A compressed block is a 3-byte little-endian uncompressed-size header
//! followed by octets of eight elements.  Each octet carries one control byte
//! (MSB-first, bit set = literal), and each pair of elements inside it shares
//! one size byte (high nibble = first element, low nibble = second, both
//! stored as `length - 1`).  Literal payloads are raw bytes; match payloads
//! are a 2-byte little-endian offset counted backwards from the pair's base
//! position.

use core::ptr;

// ─────────────────────────────────────────────────────────────────────────────
// Block geometry
// ─────────────────────────────────────────────────────────────────────────────

/// log2 of the raw block size.
pub const BLOCK_BITS: u32 = 18;

/// Maximum number of raw bytes carried by one independently-coded block.
pub const BLOCK_SZ: usize = 1 << BLOCK_BITS; // 262_144

/// Buffer capacity required to hold any compressed block.
pub const OUTPUT_SZ: usize = BLOCK_SZ + (BLOCK_SZ >> 2); // 327_680

/// Length of the per-block uncompressed-size header.
pub const HEADER_LEN: usize = 3;

/// Low 23 bits of an on-disk block length word carry the body length.
pub const LEN_MASK: u32 = 0x7F_FFFF;

/// Bit 23 of an on-disk block length word flags the extensions variant.
pub const EXTENSIONS_FLAG: u32 = 0x80_0000;

// A compressed block must be addressable by the 23-bit length field.
const _: () = assert!(OUTPUT_SZ <= LEN_MASK as usize);

// ─────────────────────────────────────────────────────────────────────────────
// Match geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Shortest raw prefix that may be coded as a match.
pub const MIN_MATCH: usize = 4;

/// Smallest representable match offset.
pub const MIN_OFFSET: usize = 4;

/// Width of the valid offset range: offsets span
/// `[MIN_OFFSET, MIN_OFFSET + MATCH_WINDOW)`, i.e. 4..=65507.
pub const MATCH_WINDOW: usize = (1 << 16) - 32; // 65_504

/// Longest literal run a single element can carry.
pub const MAX_LITERAL_RUN: usize = 16;

/// Number of elements per control byte.
pub const OCTET_ELEMS: usize = 8;

/// Longest raw prefix worth measuring in the default variant (one element
/// decodes at most 16 bytes).
pub(crate) const MAX_EXTENT: usize = 16;

/// Longest raw prefix worth measuring with extensions enabled (the wide copy
/// codes reach 64 bytes).
pub(crate) const MAX_EXTENT_EXT: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Match-finder hashing
// ─────────────────────────────────────────────────────────────────────────────

/// Number of bits kept from the window hash.
pub const HASH_BITS: u32 = 17;

/// Number of hash buckets.
pub const HASH_ENTRIES: usize = 1 << HASH_BITS;

pub const HASH_MASK: u32 = (1 << HASH_BITS) - 1;

/// Hash of a 4-byte little-endian window.
#[inline(always)]
pub(crate) fn hash32(w: u32) -> u32 {
    (w ^ (w >> 12)) & HASH_MASK
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoder tunables
// ─────────────────────────────────────────────────────────────────────────────

/// Extra writable bytes the fast decode loop may touch past the logical end
/// of the output.  Output buffers need `size + DECODE_PAD` capacity to enable
/// the fast phase.
pub const DECODE_PAD: usize = 32;

/// Fast-phase stop margin in the default variant: one octet advances at most
/// 8 × 16 bytes, so stopping 256 short of the end keeps every wild write
/// inside the logical output plus [`DECODE_PAD`].
pub(crate) const FAST_TAIL: usize = 256;

/// Fast-phase stop margin with extensions: one octet advances at most
/// 8 × 64 bytes.
pub(crate) const FAST_TAIL_EXT: usize = 544;

/// Minimum unread input the fast phase requires before starting an octet:
/// worst-case consumption is 1 control + 4 size bytes + 8 × 16 payload
/// bytes = 133, and the last literal copy looks 16 bytes ahead.
pub(crate) const FAST_INPUT_MARGIN: usize = 160;

// ─────────────────────────────────────────────────────────────────────────────
// Size bound
// ─────────────────────────────────────────────────────────────────────────────

/// Worst-case compressed size for an `n`-byte block.
///
/// Incompressible data costs one control byte per eight elements and one
/// size byte per two, about 4% over the payload; the generous `n/4` term
/// also covers the scratch space the encoder's 16-byte wild copies need
/// beyond the final length.
pub const fn encode_bound(n: usize) -> usize {
    n + n / 4 + 64
}

// ─────────────────────────────────────────────────────────────────────────────
// Match length coding
// ─────────────────────────────────────────────────────────────────────────────

/// Maps a raw common-prefix length (0..=64) to the 4-bit match length code.
///
/// Codes 3..=15 decode to `code + 1` bytes (4..=16).  Codes 0..=2 are only
/// produced when the prefix spans at least 32/48/64 bytes; in the extensions
/// variant they decode to those wide fixed copies.  Entries below index 4 are
/// never used (prefixes under [`MIN_MATCH`] fall back to literals).
pub(crate) static MATCH_LEN_CODE: [u8; 65] = [
    0, 0, 0, 0, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 2,
];

/// Number of raw bytes a match with length code `code` reproduces.
#[inline(always)]
pub(crate) fn match_advance(code: u32) -> usize {
    if code < 3 {
        (code as usize + 2) << 4
    } else {
        code as usize + 1
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Little-endian wire helpers
//
// All multi-byte wire fields are little-endian.  On little-endian hosts the
// helpers compile to plain unaligned loads/stores; big-endian hosts assemble
// the bytes explicitly rather than type-punning.
// ─────────────────────────────────────────────────────────────────────────────

/// Read a little-endian `u16` from an unaligned pointer.
///
/// # Safety
/// `p` must be valid for reads of at least 2 bytes.
#[inline(always)]
pub(crate) unsafe fn read_le16(p: *const u8) -> u16 {
    #[cfg(target_endian = "little")]
    {
        ptr::read_unaligned(p as *const u16)
    }
    #[cfg(not(target_endian = "little"))]
    {
        (*p) as u16 | ((*p.add(1)) as u16) << 8
    }
}

/// Read a little-endian `u32` from an unaligned pointer.
///
/// # Safety
/// `p` must be valid for reads of at least 4 bytes.
#[inline(always)]
pub(crate) unsafe fn read_le32(p: *const u8) -> u32 {
    #[cfg(target_endian = "little")]
    {
        ptr::read_unaligned(p as *const u32)
    }
    #[cfg(not(target_endian = "little"))]
    {
        (*p) as u32
            | ((*p.add(1)) as u32) << 8
            | ((*p.add(2)) as u32) << 16
            | ((*p.add(3)) as u32) << 24
    }
}

/// Read the 3-byte little-endian uncompressed-size header.
#[inline(always)]
pub(crate) fn read_len24(b: &[u8]) -> usize {
    b[0] as usize | (b[1] as usize) << 8 | (b[2] as usize) << 16
}

/// Write a 24-bit little-endian length word.
#[inline(always)]
pub(crate) fn write_len24(b: &mut [u8], v: u32) {
    b[0] = v as u8;
    b[1] = (v >> 8) as u8;
    b[2] = (v >> 16) as u8;
}

// ─────────────────────────────────────────────────────────────────────────────
// Copy primitives
//
// Fixed-width copies that load the whole source into registers before the
// first store.  Unlike memcpy they stay well-defined when source and
// destination ranges overlap, which match expansion relies on: only the
// logical prefix of the copy is meaningful, and it never overlaps the
// destination, but the trailing slack bytes may.
// ─────────────────────────────────────────────────────────────────────────────

/// Copy 16 bytes, loads before stores.
///
/// # Safety
/// `src` readable and `dst` writable for 16 bytes.
#[inline(always)]
pub(crate) unsafe fn copy16(dst: *mut u8, src: *const u8) {
    let a = ptr::read_unaligned(src as *const u64);
    let b = ptr::read_unaligned(src.add(8) as *const u64);
    ptr::write_unaligned(dst as *mut u64, a);
    ptr::write_unaligned(dst.add(8) as *mut u64, b);
}

/// Copy 32 bytes, loads before stores.
///
/// # Safety
/// `src` readable and `dst` writable for 32 bytes.
#[inline(always)]
pub(crate) unsafe fn copy32(dst: *mut u8, src: *const u8) {
    let a = ptr::read_unaligned(src as *const u64);
    let b = ptr::read_unaligned(src.add(8) as *const u64);
    let c = ptr::read_unaligned(src.add(16) as *const u64);
    let d = ptr::read_unaligned(src.add(24) as *const u64);
    ptr::write_unaligned(dst as *mut u64, a);
    ptr::write_unaligned(dst.add(8) as *mut u64, b);
    ptr::write_unaligned(dst.add(16) as *mut u64, c);
    ptr::write_unaligned(dst.add(24) as *mut u64, d);
}

/// Copy 48 bytes, loads before stores.
///
/// # Safety
/// `src` readable and `dst` writable for 48 bytes.
#[inline(always)]
pub(crate) unsafe fn copy48(dst: *mut u8, src: *const u8) {
    copy32(dst, src);
    let e = ptr::read_unaligned(src.add(32) as *const u64);
    let f = ptr::read_unaligned(src.add(40) as *const u64);
    ptr::write_unaligned(dst.add(32) as *mut u64, e);
    ptr::write_unaligned(dst.add(40) as *mut u64, f);
}

/// Copy 64 bytes, loads before stores.
///
/// # Safety
/// `src` readable and `dst` writable for 64 bytes.
#[inline(always)]
pub(crate) unsafe fn copy64(dst: *mut u8, src: *const u8) {
    let a = ptr::read_unaligned(src as *const u64);
    let b = ptr::read_unaligned(src.add(8) as *const u64);
    let c = ptr::read_unaligned(src.add(16) as *const u64);
    let d = ptr::read_unaligned(src.add(24) as *const u64);
    let e = ptr::read_unaligned(src.add(32) as *const u64);
    let f = ptr::read_unaligned(src.add(40) as *const u64);
    let g = ptr::read_unaligned(src.add(48) as *const u64);
    let h = ptr::read_unaligned(src.add(56) as *const u64);
    ptr::write_unaligned(dst as *mut u64, a);
    ptr::write_unaligned(dst.add(8) as *mut u64, b);
    ptr::write_unaligned(dst.add(16) as *mut u64, c);
    ptr::write_unaligned(dst.add(24) as *mut u64, d);
    ptr::write_unaligned(dst.add(32) as *mut u64, e);
    ptr::write_unaligned(dst.add(40) as *mut u64, f);
    ptr::write_unaligned(dst.add(48) as *mut u64, g);
    ptr::write_unaligned(dst.add(56) as *mut u64, h);
}

// ─────────────────────────────────────────────────────────────────────────────
// Common-prefix measurement
// ─────────────────────────────────────────────────────────────────────────────

/// Index of the first differing byte in a non-zero XOR word: low-order zero
/// bytes on little-endian hosts, high-order on big-endian.
#[inline(always)]
fn nb_common_bytes(val: u64) -> usize {
    debug_assert!(val != 0);
    #[cfg(target_endian = "little")]
    {
        (val.trailing_zeros() >> 3) as usize
    }
    #[cfg(not(target_endian = "little"))]
    {
        (val.leading_zeros() >> 3) as usize
    }
}

/// Count how many leading bytes `a` and `b` have in common, up to `limit`.
///
/// Word-at-a-time while a full word fits under the limit, then byte-wise, so
/// no read ever crosses `limit` bytes past either pointer.
///
/// # Safety
/// `a` and `b` must both be readable for `limit` bytes.
#[inline(always)]
pub(crate) unsafe fn common_prefix(a: *const u8, b: *const u8, limit: usize) -> usize {
    let mut n = 0usize;
    while n + 8 <= limit {
        let x = ptr::read_unaligned(a.add(n) as *const u64);
        let y = ptr::read_unaligned(b.add(n) as *const u64);
        let diff = x ^ y;
        if diff != 0 {
            return n + nb_common_bytes(diff);
        }
        n += 8;
    }
    while n < limit && *a.add(n) == *b.add(n) {
        n += 1;
    }
    n
}
