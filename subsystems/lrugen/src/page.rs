//! # Page Descriptor
//!
//! Every page tracked by an eviction domain carries one 64-bit state word:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ 63 ........ 23 │ 22..20  │ 19..18 │ 17..16 │ 15..9 │  8..0    │
//! │    reserved    │ gen + 1 │  rsvd  │  refs  │ rsvd  │  flags   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The generation field and the ACTIVE flag always change together through
//! [`PageState::set_mask_bits`], so no reader ever sees a generation next to a
//! stale ACTIVE bit.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use static_assertions::const_assert;

use crate::seq::Gen;
use crate::tier::tier_from_refs;
use crate::types::{LruType, Pfn, ZoneType};
use crate::{LRU_GEN_WIDTH, LRU_REFS_WIDTH};

// =============================================================================
// Layout
// =============================================================================

/// Bit offset of the access-count field
pub const LRU_REFS_PGOFF: u32 = 16;

/// Access-count field mask
pub const LRU_REFS_MASK: u64 = ((1 << LRU_REFS_WIDTH) - 1) << LRU_REFS_PGOFF;

/// Largest value the access-count field holds
pub const LRU_REFS_MAX: u32 = (1 << LRU_REFS_WIDTH) - 1;

/// Bit offset of the generation field
pub const LRU_GEN_PGOFF: u32 = 20;

/// Generation field mask
pub const LRU_GEN_MASK: u64 = ((1 << LRU_GEN_WIDTH) - 1) << LRU_GEN_PGOFF;

bitflags! {
    /// Page flag bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u64 {
        /// Accessed at least once since the last aging step
        const REFERENCED = 1 << 0;
        /// Contents differ from backing store
        const DIRTY = 1 << 1;
        /// Hot; only meaningful while the page is off the generation lists
        const ACTIVE = 1 << 2;
        /// Refaulted shortly after eviction
        const WORKINGSET = 1 << 3;
        /// Under writeback
        const WRITEBACK = 1 << 4;
        /// Reclaim requested; rotate when writeback completes
        const RECLAIM = 1 << 5;
        /// Backed by swap rather than a file
        const SWAPBACKED = 1 << 6;
        /// Has a swap cache entry
        const SWAPCACHE = 1 << 7;
        /// Never reclaimed
        const UNEVICTABLE = 1 << 8;
    }
}

const_assert!(PageFlags::all().bits() & LRU_REFS_MASK == 0);
const_assert!(PageFlags::all().bits() & LRU_GEN_MASK == 0);
const_assert!(LRU_REFS_MASK & LRU_GEN_MASK == 0);

/// Encode a generation into its field (0 = untracked)
#[inline(always)]
pub const fn gen_bits(gen: Option<Gen>) -> u64 {
    match gen {
        Some(gen) => (gen.index() as u64 + 1) << LRU_GEN_PGOFF,
        None => 0,
    }
}

/// Decode the generation field of a state word
#[inline(always)]
pub const fn gen_of_word(word: u64) -> Option<Gen> {
    let raw = ((word & LRU_GEN_MASK) >> LRU_GEN_PGOFF) as usize;
    if raw == 0 {
        None
    } else {
        Gen::new(raw - 1)
    }
}

// =============================================================================
// Page State
// =============================================================================

/// Atomic flag/generation word of a page
pub struct PageState(AtomicU64);

impl PageState {
    /// Untracked state with the given flags
    pub const fn new(flags: PageFlags) -> Self {
        Self(AtomicU64::new(flags.bits()))
    }

    /// Raw state word
    #[inline]
    pub fn load(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Flag bits
    #[inline]
    pub fn flags(&self) -> PageFlags {
        PageFlags::from_bits_truncate(self.load())
    }

    /// Are all of `flags` set?
    #[inline]
    pub fn test(&self, flags: PageFlags) -> bool {
        self.flags().contains(flags)
    }

    /// Set flag bits
    #[inline]
    pub fn set(&self, flags: PageFlags) {
        self.0.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Clear flag bits
    #[inline]
    pub fn clear(&self, flags: PageFlags) {
        self.0.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Current generation, `None` when untracked
    #[inline]
    pub fn gen(&self) -> Option<Gen> {
        gen_of_word(self.load())
    }

    /// Access-count field
    #[inline]
    pub fn refs(&self) -> u32 {
        ((self.load() & LRU_REFS_MASK) >> LRU_REFS_PGOFF) as u32
    }

    /// Replace the bits under `mask` with `bits` in one atomic step
    ///
    /// Computes `(old & !mask) | bits`; bits outside `mask` are or-ed in.
    /// Returns the word as it was before the update.
    pub fn set_mask_bits(&self, mask: u64, bits: u64) -> u64 {
        let mut old = self.0.load(Ordering::Relaxed);
        loop {
            let new = (old & !mask) | bits;
            match self
                .0
                .compare_exchange_weak(old, new, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(prev) => return prev,
                Err(prev) => old = prev,
            }
        }
    }

    /// Store a generation together with the ACTIVE flag
    ///
    /// Returns the previous word.
    #[inline]
    pub fn write_gen(&self, gen: Option<Gen>, active: bool) -> u64 {
        let active = if active { PageFlags::ACTIVE.bits() } else { 0 };
        self.set_mask_bits(LRU_GEN_MASK | PageFlags::ACTIVE.bits(), gen_bits(gen) | active)
    }

    /// Record one access
    ///
    /// The first access sets REFERENCED; later ones bump the access-count
    /// field until it saturates.
    pub fn mark_accessed(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |word| {
                if word & PageFlags::REFERENCED.bits() == 0 {
                    return Some(word | PageFlags::REFERENCED.bits());
                }
                let refs = ((word & LRU_REFS_MASK) >> LRU_REFS_PGOFF) as u32;
                if refs >= LRU_REFS_MAX {
                    return None;
                }
                Some((word & !LRU_REFS_MASK) | ((refs as u64 + 1) << LRU_REFS_PGOFF))
            });
    }

    /// Total recorded accesses
    pub fn access_count(&self) -> u32 {
        let word = self.load();
        let referenced = (word & PageFlags::REFERENCED.bits() != 0) as u32;
        referenced + ((word & LRU_REFS_MASK) >> LRU_REFS_PGOFF) as u32
    }
}

impl fmt::Debug for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.load();
        f.debug_struct("PageState")
            .field("flags", &PageFlags::from_bits_truncate(word))
            .field("gen", &gen_of_word(word))
            .field("refs", &((word & LRU_REFS_MASK) >> LRU_REFS_PGOFF))
            .finish()
    }
}

// =============================================================================
// Page
// =============================================================================

/// A trackable page (or compound page)
#[derive(Debug)]
pub struct Page {
    pfn: Pfn,
    zone: ZoneType,
    order: u8,
    state: PageState,
}

impl Page {
    /// Create a page with the given flags
    pub const fn new(pfn: Pfn, zone: ZoneType, order: u8, flags: PageFlags) -> Self {
        Self {
            pfn,
            zone,
            order,
            state: PageState::new(flags),
        }
    }

    /// Base anonymous page
    pub const fn anon(pfn: Pfn, zone: ZoneType) -> Self {
        Self::new(pfn, zone, 0, PageFlags::SWAPBACKED)
    }

    /// Base page cache page
    pub const fn file(pfn: Pfn, zone: ZoneType) -> Self {
        Self::new(pfn, zone, 0, PageFlags::empty())
    }

    /// Same page as a compound page of `order`
    pub const fn with_order(mut self, order: u8) -> Self {
        self.order = order;
        self
    }

    /// Page frame number of the head page
    #[inline]
    pub const fn pfn(&self) -> Pfn {
        self.pfn
    }

    /// Zone the page lives in
    #[inline]
    pub const fn zone(&self) -> ZoneType {
        self.zone
    }

    /// Compound order
    #[inline]
    pub const fn order(&self) -> u8 {
        self.order
    }

    /// Size in base pages
    #[inline]
    pub const fn nr_pages(&self) -> u64 {
        1 << self.order
    }

    /// Atomic state word
    #[inline]
    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Flag bits
    #[inline]
    pub fn flags(&self) -> PageFlags {
        self.state.flags()
    }

    /// Which half of the domain the page belongs to
    ///
    /// Anything not swap-backed is file, including lazily freed anon pages.
    #[inline]
    pub fn lru_type(&self) -> LruType {
        if self.state.test(PageFlags::SWAPBACKED) {
            LruType::Anon
        } else {
            LruType::File
        }
    }

    /// Current generation, `None` when untracked
    #[inline]
    pub fn lru_gen(&self) -> Option<Gen> {
        self.state.gen()
    }

    /// Accesses beyond the first, as used for tiering
    #[inline]
    pub fn lru_refs(&self) -> u32 {
        let word = self.state.load();
        let workingset = (word & PageFlags::WORKINGSET.bits() != 0) as u32;
        ((word & LRU_REFS_MASK) >> LRU_REFS_PGOFF) as u32 + workingset
    }

    /// Tier derived from the access history
    #[inline]
    pub fn tier(&self) -> usize {
        tier_from_refs(self.lru_refs())
    }

    /// Is the ACTIVE flag set?
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.test(PageFlags::ACTIVE)
    }

    /// Is the page unevictable?
    #[inline]
    pub fn is_unevictable(&self) -> bool {
        self.state.test(PageFlags::UNEVICTABLE)
    }
}
