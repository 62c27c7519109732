//! Hash-based match search.
//!
//! Two search strategies share one interface:
//!
//! * [`FastTable`] — level 0.  One 16-bit slot per bucket holding the low
//!   16 bits of the last position hashed there; the full position is
//!   recovered relative to the probe position, which limits candidates to a
//!   64 KiB reach without storing 32-bit entries.
//! * [`MatchCache`] — levels 1..=10.  Each bucket caches up to `2^level`
//!   past positions of one window value: slot 0 pins the first occurrence,
//!   the remaining slots roll.  The probe verifies every cached candidate
//!   and returns the longest prefix, preferring the most recent position on
//!   ties.
//!
//! Both record every probed position and are reset before each block, so a
//! candidate can never refer outside the current block.

use super::types::{
    common_prefix, hash32, read_le32, HASH_ENTRIES, MATCH_WINDOW, MIN_MATCH, MIN_OFFSET,
};

/// Number of bucket blocks the multi-position arena can hand out per block.
/// Buckets that see a second occurrence after the arena is exhausted fall
/// back to a single rolling slot.
pub(crate) const MAX_SYMS: usize = 8192;

/// A verified match candidate: absolute source position and the measured
/// common-prefix length (already limited by the remaining input and the
/// variant's maximum useful extent, but not yet by the base position).
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate {
    pub pos: usize,
    pub len: usize,
}

/// A match search strategy over one block.
pub(crate) trait MatchFinder {
    /// Forget all recorded positions; called once per block.
    fn reset(&mut self);

    /// Probe position `i`, recording it for later candidates.
    ///
    /// Returns a candidate whose offset from `base` lies in the coding
    /// window and whose verified prefix is at least [`MIN_MATCH`] bytes.
    /// `max_extent` bounds how far the prefix is measured.
    ///
    /// Callers must guarantee `i + MIN_MATCH <= input.len()`.
    fn probe(&mut self, input: &[u8], i: usize, base: usize, max_extent: usize)
        -> Option<Candidate>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Level 0: single-slot table of 16-bit positions
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct FastTable {
    entries: Box<[u16]>,
}

impl FastTable {
    pub(crate) fn new() -> Self {
        FastTable {
            entries: vec![0u16; HASH_ENTRIES].into_boxed_slice(),
        }
    }
}

/// Recover an absolute in-block position from a truncated 16-bit entry.
///
/// The entry stores `pos & 0xFFFF` for some `pos < i`; splicing it under the
/// high bits of `i` lands either in the current 64 KiB span (entry below the
/// low bits of `i`) or the previous one.
#[inline(always)]
fn recover_position(entry: u16, i: usize) -> usize {
    let hi = i & !0xFFFF;
    let lo = i & 0xFFFF;
    let e = entry as usize;
    if e >= lo {
        // Only reachable once i has crossed 64 KiB; the wrapping keeps a
        // (never-stored) stale entry from panicking rather than being
        // rejected by the window check.
        (hi + e).wrapping_sub(1 << 16)
    } else {
        hi + e
    }
}

impl MatchFinder for FastTable {
    fn reset(&mut self) {
        self.entries.fill(0);
    }

    #[inline(always)]
    fn probe(
        &mut self,
        input: &[u8],
        i: usize,
        base: usize,
        max_extent: usize,
    ) -> Option<Candidate> {
        debug_assert!(i + MIN_MATCH <= input.len());
        // SAFETY: caller guarantees 4 readable bytes at i.
        let w = unsafe { read_le32(input.as_ptr().add(i)) };
        let h = hash32(w) as usize;
        let entry = self.entries[h];
        self.entries[h] = i as u16;

        let cand = recover_position(entry, i);
        if cand >= base {
            return None;
        }
        let offset = base - cand;
        if offset.wrapping_sub(MIN_OFFSET) >= MATCH_WINDOW {
            return None;
        }
        // SAFETY: cand + MIN_MATCH <= base <= input.len() since offset >= MIN_OFFSET.
        if unsafe { read_le32(input.as_ptr().add(cand)) } != w {
            return None;
        }
        let limit = max_extent.min(input.len() - i);
        // SAFETY: limit bytes are readable at both i and cand (cand < i).
        let len = unsafe { common_prefix(input.as_ptr().add(i), input.as_ptr().add(cand), limit) };
        if len < MIN_MATCH {
            return None;
        }
        Some(Candidate { pos: cand, len })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Levels 1..=10: per-bucket multi-position cache
// ─────────────────────────────────────────────────────────────────────────────

const NO_BLOCK: u32 = u32::MAX;

#[derive(Clone, Copy, Default)]
struct Bucket {
    /// Window value all recorded positions share.
    tag: u32,
    /// Occurrences seen since the bucket last changed tags (0 = empty).
    count: u32,
    /// Sole recorded position while `count == 1`, or the rolling slot after
    /// the arena ran out of blocks.
    first: u32,
    /// Arena block index once promoted, else [`NO_BLOCK`].
    block: u32,
}

pub(crate) struct MatchCache {
    /// Per-bucket slot count, `2^level`.
    cap: usize,
    heads: Box<[Bucket]>,
    /// `MAX_SYMS` blocks of `cap` positions, bump-allocated per block.
    arena: Box<[u32]>,
    next_block: u32,
}

impl MatchCache {
    pub(crate) fn new(level: u8) -> Self {
        debug_assert!((1..=10).contains(&level));
        let cap = 1usize << level;
        MatchCache {
            cap,
            heads: vec![Bucket::default(); HASH_ENTRIES].into_boxed_slice(),
            arena: vec![0u32; MAX_SYMS * cap].into_boxed_slice(),
            next_block: 0,
        }
    }
}

impl MatchFinder for MatchCache {
    fn reset(&mut self) {
        self.heads.fill(Bucket::default());
        self.next_block = 0;
    }

    fn probe(
        &mut self,
        input: &[u8],
        i: usize,
        base: usize,
        max_extent: usize,
    ) -> Option<Candidate> {
        debug_assert!(i + MIN_MATCH <= input.len());
        // SAFETY: caller guarantees 4 readable bytes at i.
        let w = unsafe { read_le32(input.as_ptr().add(i)) };
        let h = hash32(w) as usize;

        let head = self.heads[h];
        if head.count == 0 || head.tag != w {
            // New or recycled bucket: evict whatever was recorded before.
            self.heads[h] = Bucket {
                tag: w,
                count: 1,
                first: i as u32,
                block: NO_BLOCK,
            };
            return None;
        }

        let limit = max_extent.min(input.len() - i);
        let mut best_len = 0usize;
        let mut best_pos = 0usize;
        let mut consider = |pos: usize| {
            if pos >= base {
                return;
            }
            let offset = base - pos;
            if offset.wrapping_sub(MIN_OFFSET) >= MATCH_WINDOW {
                return;
            }
            // SAFETY: pos < base <= input.len(), and limit bytes are readable
            // past both pos and i.
            let len =
                unsafe { common_prefix(input.as_ptr().add(i), input.as_ptr().add(pos), limit) };
            if len > best_len || (len == best_len && pos > best_pos) {
                best_len = len;
                best_pos = pos;
            }
        };

        if head.count == 1 {
            consider(head.first as usize);
        } else {
            let blk = head.block as usize * self.cap;
            let ncand = (head.count as usize).min(self.cap);
            for t in 0..ncand {
                consider(self.arena[blk + t] as usize);
            }
        }

        // Record this occurrence.
        let head = &mut self.heads[h];
        if head.count == 1 {
            if (self.next_block as usize) < MAX_SYMS {
                let blk = self.next_block as usize * self.cap;
                head.block = self.next_block;
                self.next_block += 1;
                self.arena[blk] = head.first;
                if self.cap > 1 {
                    self.arena[blk + 1] = i as u32;
                }
                head.count = 2;
            } else {
                head.first = i as u32;
            }
        } else {
            if self.cap > 1 {
                // Slot 0 stays pinned to the first occurrence so long runs
                // keep a candidate far enough behind the base; the rest roll.
                let slot = 1 + (head.count as usize - 1) % (self.cap - 1);
                self.arena[head.block as usize * self.cap + slot] = i as u32;
            }
            head.count += 1;
        }

        if best_len >= MIN_MATCH {
            Some(Candidate {
                pos: best_pos,
                len: best_len,
            })
        } else {
            None
        }
    }
}
