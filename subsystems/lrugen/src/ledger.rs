//! # Population Counters
//!
//! Two tables of atomics, both readable without the domain lock:
//! - [`SizeLedger`]: base pages per (generation, type, zone)
//! - [`LruSizes`]: base pages per (coarse list, zone), the active/inactive
//!   view that memory-pressure monitors consume
//!
//! Writers hold the domain lock; the atomics exist for lock-free readers.

use core::array;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::seq::Gen;
use crate::types::{LruList, LruType, ZoneType};
use crate::{ANON_AND_FILE, MAX_NR_GENS, MAX_NR_ZONES, NR_LRU_LISTS};

/// Add a signed delta to an unsigned counter
#[inline(always)]
fn apply_delta(counter: &AtomicU64, delta: i64) -> u64 {
    if delta >= 0 {
        counter.fetch_add(delta as u64, Ordering::Relaxed)
    } else {
        let magnitude = delta.unsigned_abs();
        let prev = counter.fetch_sub(magnitude, Ordering::Relaxed);
        debug_assert!(prev >= magnitude, "counter underflow: {} - {}", prev, magnitude);
        prev
    }
}

// =============================================================================
// Size Ledger
// =============================================================================

/// Base pages per (generation, type, zone)
#[derive(Debug)]
pub struct SizeLedger {
    nr_pages: [[[AtomicU64; MAX_NR_ZONES]; ANON_AND_FILE]; MAX_NR_GENS],
}

impl SizeLedger {
    /// All counters zero
    pub fn new() -> Self {
        Self {
            nr_pages: array::from_fn(|_| array::from_fn(|_| array::from_fn(|_| AtomicU64::new(0)))),
        }
    }

    /// Add `delta` base pages to a counter; no-op for an untracked generation
    ///
    /// The delta must not drive the counter below zero.
    #[inline]
    pub fn adjust(&self, gen: Option<Gen>, ty: LruType, zone: ZoneType, delta: i64) {
        if let Some(gen) = gen {
            apply_delta(&self.nr_pages[gen.index()][ty.index()][zone.index()], delta);
        }
    }

    /// Base pages in one (generation, type, zone)
    #[inline]
    pub fn nr_pages(&self, gen: Gen, ty: LruType, zone: ZoneType) -> u64 {
        self.nr_pages[gen.index()][ty.index()][zone.index()].load(Ordering::Relaxed)
    }

    /// Base pages of one type in a generation, all zones
    pub fn gen_pages(&self, gen: Gen, ty: LruType) -> u64 {
        ZoneType::ALL
            .iter()
            .map(|&zone| self.nr_pages(gen, ty, zone))
            .sum()
    }

    /// Base pages of one type, all generations and zones
    pub fn type_pages(&self, ty: LruType) -> u64 {
        (0..MAX_NR_GENS)
            .filter_map(Gen::new)
            .map(|gen| self.gen_pages(gen, ty))
            .sum()
    }

    /// Base pages tracked, all counters
    pub fn total(&self) -> u64 {
        LruType::ALL.iter().map(|&ty| self.type_pages(ty)).sum()
    }
}

impl Default for SizeLedger {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Coarse LRU Sizes
// =============================================================================

/// Narrow counter-update interface to swap/cgroup accounting
pub trait LruAccounting: Send + Sync {
    /// `delta` base pages moved onto (positive) or off (negative) `lru` in `zone`
    fn update_lru_size(&self, lru: LruList, zone: ZoneType, delta: i64);
}

/// Base pages per (coarse list, zone)
#[derive(Debug)]
pub struct LruSizes {
    nr_pages: [[AtomicU64; MAX_NR_ZONES]; NR_LRU_LISTS],
}

impl LruSizes {
    /// All counters zero
    pub fn new() -> Self {
        Self {
            nr_pages: array::from_fn(|_| array::from_fn(|_| AtomicU64::new(0))),
        }
    }

    /// Add `delta` base pages to a counter
    #[inline]
    pub fn adjust(&self, lru: LruList, zone: ZoneType, delta: i64) {
        apply_delta(&self.nr_pages[lru.index()][zone.index()], delta);
    }

    /// Base pages on `lru` in `zone`
    #[inline]
    pub fn nr_pages(&self, lru: LruList, zone: ZoneType) -> u64 {
        self.nr_pages[lru.index()][zone.index()].load(Ordering::Relaxed)
    }

    /// Base pages on `lru`, all zones
    pub fn lru_pages(&self, lru: LruList) -> u64 {
        ZoneType::ALL
            .iter()
            .map(|&zone| self.nr_pages(lru, zone))
            .sum()
    }

    /// Active base pages, both types
    pub fn active(&self) -> u64 {
        self.lru_pages(LruList::ActiveAnon) + self.lru_pages(LruList::ActiveFile)
    }

    /// Inactive base pages, both types
    pub fn inactive(&self) -> u64 {
        self.lru_pages(LruList::InactiveAnon) + self.lru_pages(LruList::InactiveFile)
    }
}

impl Default for LruSizes {
    fn default() -> Self {
        Self::new()
    }
}
