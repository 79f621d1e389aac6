//! Scratchpad planning: a write-once key→byte-range map built during
//! descriptor `init()`.
//!
//! The runtime supplies one contiguous block per descriptor at execution time
//! and slices it by key. Regions are 64-byte aligned and never overlap, so
//! per-thread partial reductions run lock-free on exclusive slices.

use std::ops::Range;

/// Alignment of every booked region, one cache line.
const ALIGNMENT: usize = 64;

/// Closed set of scratch regions, scoped per operator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScratchKey {
    /// Per-thread partial mean/variance reduction buffer.
    BnormReduction,
    /// Temporary mean when statistics are computed but not kept.
    BnormTmpMean,
    /// Temporary variance when statistics are computed but not kept.
    BnormTmpVar,
    /// Temporary diff-scale-shift gradient accumulator.
    BnormTmpDiffScaleShift,
    /// Per-thread reduced-precision conversion buffer.
    BnormCvt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    key: ScratchKey,
    offset: usize,
    size: usize,
}

/// Accumulates named scratch regions during `init()`; frozen afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScratchpadRegistry {
    entries: Vec<Entry>,
    total: usize,
}

impl ScratchpadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `size` bytes under `key`. Each key may be booked at most once;
    /// a zero-size booking is dropped.
    pub fn book(&mut self, key: ScratchKey, size: usize) {
        debug_assert!(
            self.range_of(key).is_none(),
            "scratch key booked twice: {key:?}"
        );
        if size == 0 {
            return;
        }
        let offset = self.total;
        let padded = size.div_ceil(ALIGNMENT) * ALIGNMENT;
        self.entries.push(Entry { key, offset, size });
        self.total += padded;
        log::debug!("scratchpad book {key:?}: {size} bytes at offset {offset}");
    }

    /// Total bytes the runtime must hand back at execution time.
    pub fn total_size(&self) -> usize {
        self.total
    }

    /// Byte size booked under `key`, if any.
    pub fn size_of(&self, key: ScratchKey) -> Option<usize> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.size)
    }

    /// Byte range of `key` within the contiguous block.
    pub fn range_of(&self, key: ScratchKey) -> Option<Range<usize>> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.offset..e.offset + e.size)
    }

    /// Slice the runtime-supplied block by key. The block must be at least
    /// `total_size()` bytes.
    pub fn grab<'a>(&self, block: &'a mut [u8], key: ScratchKey) -> Option<&'a mut [u8]> {
        let range = self.range_of(key)?;
        block.get_mut(range)
    }
}
