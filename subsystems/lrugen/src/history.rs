//! # Tier History
//!
//! Evicted and refaulted base pages per (history slot, type, tier). Slots are
//! `seq % NR_HIST_GENS`, wider than the live generation window, so the
//! scanner can still compare refault rates for generations that were already
//! evicted.

use core::array;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::seq::lru_hist_from_seq;
use crate::types::LruType;
use crate::{ANON_AND_FILE, MAX_NR_TIERS, NR_HIST_GENS};

type TierCounters = [[[AtomicU64; MAX_NR_TIERS]; ANON_AND_FILE]; NR_HIST_GENS];

fn zeroed() -> TierCounters {
    array::from_fn(|_| array::from_fn(|_| array::from_fn(|_| AtomicU64::new(0))))
}

/// Eviction/refault history by tier
#[derive(Debug)]
pub struct TierHistory {
    evicted: TierCounters,
    refaulted: TierCounters,
}

impl TierHistory {
    /// Empty history
    pub fn new() -> Self {
        Self {
            evicted: zeroed(),
            refaulted: zeroed(),
        }
    }

    #[inline(always)]
    fn slot(table: &TierCounters, seq: u64, ty: LruType, tier: usize) -> &AtomicU64 {
        debug_assert!(tier < MAX_NR_TIERS);
        &table[lru_hist_from_seq(seq)][ty.index()][tier]
    }

    /// Record `nr` base pages evicted from generation `seq`
    pub fn record_evicted(&self, seq: u64, ty: LruType, tier: usize, nr: u64) {
        Self::slot(&self.evicted, seq, ty, tier).fetch_add(nr, Ordering::Relaxed);
    }

    /// Record `nr` base pages refaulted after eviction from generation `seq`
    pub fn record_refaulted(&self, seq: u64, ty: LruType, tier: usize, nr: u64) {
        Self::slot(&self.refaulted, seq, ty, tier).fetch_add(nr, Ordering::Relaxed);
    }

    /// Evicted base pages for a slot
    pub fn evicted(&self, seq: u64, ty: LruType, tier: usize) -> u64 {
        Self::slot(&self.evicted, seq, ty, tier).load(Ordering::Relaxed)
    }

    /// Refaulted base pages for a slot
    pub fn refaulted(&self, seq: u64, ty: LruType, tier: usize) -> u64 {
        Self::slot(&self.refaulted, seq, ty, tier).load(Ordering::Relaxed)
    }

    /// Clear the slot `seq` maps to before it is reused
    pub fn reset_slot(&self, seq: u64) {
        let hist = lru_hist_from_seq(seq);
        for table in [&self.evicted, &self.refaulted] {
            for counters in &table[hist] {
                for counter in counters {
                    counter.store(0, Ordering::Relaxed);
                }
            }
        }
    }
}

impl Default for TierHistory {
    fn default() -> Self {
        Self::new()
    }
}
