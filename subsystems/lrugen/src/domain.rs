//! # Eviction Domain
//!
//! One domain per memory region or consumer group. It owns:
//!
//! | Part                 | Protection   | Readers                      |
//! |----------------------|--------------|------------------------------|
//! | generation lists     | domain lock  | scanner, fault path          |
//! | `max_seq`, `min_seq` | domain lock  | scanner, fault path          |
//! | [`SizeLedger`]       | atomics      | anyone, lock-free            |
//! | [`LruSizes`]         | atomics      | pressure monitors, lock-free |
//! | [`TierHistory`]      | atomics      | scanner                      |
//!
//! Every structural operation goes through a [`DomainGuard`], so holding the
//! lock is enforced by the type system rather than by convention.
//!
//! ## Admission Policy
//!
//! | Page                                              | Sequence          |
//! |---------------------------------------------------|-------------------|
//! | ACTIVE                                            | `max_seq`         |
//! | anon not in swap cache, or RECLAIM and dirty/wb   | `min_seq[ty] + 1` |
//! | anything else                                     | `min_seq[ty]`     |

use alloc::boxed::Box;
use core::fmt;

use spin::{Mutex, MutexGuard};

use crate::config::LruGenConfig;
use crate::error::{LruGenError, LruOutcome, NotApplicable, Result};
use crate::history::TierHistory;
use crate::ledger::{LruAccounting, LruSizes, SizeLedger};
use crate::list::{LinkTable, ListHead, ListIter};
use crate::page::{gen_bits, gen_of_word, Page, PageFlags, LRU_GEN_MASK, LRU_REFS_MASK};
use crate::seq::Gen;
use crate::types::{LruList, LruType, Pfn, ZoneType};
use crate::{ANON_AND_FILE, MAX_NR_GENS, MAX_NR_ZONES, MIN_NR_GENS};

/// `max_seq` of a freshly created domain; all slots start live and empty
pub const INITIAL_MAX_SEQ: u64 = MIN_NR_GENS as u64 + 1;

// =============================================================================
// Locked State
// =============================================================================

/// State guarded by the domain lock
#[derive(Debug)]
struct DomainLists {
    max_seq: u64,
    min_seq: [u64; ANON_AND_FILE],
    lists: [[[ListHead; MAX_NR_ZONES]; ANON_AND_FILE]; MAX_NR_GENS],
    links: LinkTable,
}

impl DomainLists {
    fn new(nr_frames: usize) -> Self {
        Self {
            max_seq: INITIAL_MAX_SEQ,
            min_seq: [0; ANON_AND_FILE],
            lists: [[[ListHead::new(); MAX_NR_ZONES]; ANON_AND_FILE]; MAX_NR_GENS],
            links: LinkTable::new(nr_frames),
        }
    }

    #[inline(always)]
    fn oldest_seq(&self) -> u64 {
        self.min_seq[0].min(self.min_seq[1])
    }
}

// =============================================================================
// Eviction Domain
// =============================================================================

/// Multi-generational LRU of one memory region or consumer group
pub struct EvictionDomain {
    config: LruGenConfig,
    lists: Mutex<DomainLists>,
    ledger: SizeLedger,
    lru_sizes: LruSizes,
    history: TierHistory,
    accounting: Option<Box<dyn LruAccounting>>,
}

impl EvictionDomain {
    /// Create a domain
    pub fn new(config: LruGenConfig) -> Self {
        log::debug!(
            "lru_gen: domain '{}' ({} frames, {})",
            config.name,
            config.nr_frames,
            if config.enabled { "enabled" } else { "disabled" }
        );
        Self {
            config,
            lists: Mutex::new(DomainLists::new(config.nr_frames)),
            ledger: SizeLedger::new(),
            lru_sizes: LruSizes::new(),
            history: TierHistory::new(),
            accounting: None,
        }
    }

    /// Create a domain that forwards coarse size changes to `accounting`
    pub fn with_accounting(config: LruGenConfig, accounting: Box<dyn LruAccounting>) -> Self {
        let mut domain = Self::new(config);
        domain.accounting = Some(accounting);
        domain
    }

    /// Configuration
    #[inline]
    pub fn config(&self) -> &LruGenConfig {
        &self.config
    }

    /// Are generation lists in use?
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Take the domain lock
    pub fn lock(&self) -> DomainGuard<'_> {
        DomainGuard {
            domain: self,
            lists: self.lists.lock(),
        }
    }

    /// Take the domain lock if it is free
    pub fn try_lock(&self) -> Option<DomainGuard<'_>> {
        self.lists.try_lock().map(|lists| DomainGuard {
            domain: self,
            lists,
        })
    }

    /// Per-generation page counters
    #[inline]
    pub fn ledger(&self) -> &SizeLedger {
        &self.ledger
    }

    /// Coarse active/inactive counters
    #[inline]
    pub fn lru_sizes(&self) -> &LruSizes {
        &self.lru_sizes
    }

    /// Eviction/refault history
    #[inline]
    pub fn history(&self) -> &TierHistory {
        &self.history
    }

    /// Apply a coarse size change and forward it to external accounting
    pub(crate) fn update_lru_size(&self, lru: LruList, zone: ZoneType, delta: i64) {
        self.lru_sizes.adjust(lru, zone, delta);
        if let Some(accounting) = &self.accounting {
            accounting.update_lru_size(lru, zone, delta);
        }
    }
}

impl fmt::Debug for EvictionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionDomain")
            .field("config", &self.config)
            .field("tracked", &self.ledger.total())
            .field("active", &self.lru_sizes.active())
            .field("inactive", &self.lru_sizes.inactive())
            .field("accounting", &self.accounting.is_some())
            .finish()
    }
}

// =============================================================================
// Domain Guard
// =============================================================================

/// Exclusive access to a domain's lists and sequence counters
pub struct DomainGuard<'a> {
    domain: &'a EvictionDomain,
    lists: MutexGuard<'a, DomainLists>,
}

impl<'a> DomainGuard<'a> {
    /// The locked domain
    #[inline]
    pub fn domain(&self) -> &'a EvictionDomain {
        self.domain
    }

    /// Youngest sequence
    #[inline]
    pub fn max_seq(&self) -> u64 {
        self.lists.max_seq
    }

    /// Oldest sequence of `ty`
    #[inline]
    pub fn min_seq(&self, ty: LruType) -> u64 {
        self.lists.min_seq[ty.index()]
    }

    /// Is `gen` one of the two youngest generations?
    #[inline]
    pub fn is_active_gen(&self, gen: Gen) -> bool {
        let max_seq = self.lists.max_seq;
        gen == Gen::from_seq(max_seq) || gen == Gen::from_seq(max_seq - 1)
    }

    /// Pages on one list, head to tail
    pub fn pages(&self, gen: Gen, ty: LruType, zone: ZoneType) -> ListIter<'_> {
        self.lists.lists[gen.index()][ty.index()][zone.index()].iter(&self.lists.links)
    }

    /// Number of pages (not base pages) on one list
    #[inline]
    pub fn list_len(&self, gen: Gen, ty: LruType, zone: ZoneType) -> usize {
        self.lists.lists[gen.index()][ty.index()][zone.index()].len()
    }

    /// Is `pfn` on any generation list?
    #[inline]
    pub fn is_listed(&self, pfn: Pfn) -> bool {
        self.lists.links.covers(pfn) && self.lists.links.get(pfn).is_linked()
    }

    // -------------------------------------------------------------------------
    // Transition
    // -------------------------------------------------------------------------

    /// Account a page moving from `old_gen` to `new_gen`
    ///
    /// `None` stands for "not on a generation list". The caller rewrites the
    /// page's tag and list membership; this only moves counters.
    ///
    /// # Panics
    ///
    /// When both generations are `None`, or when the move demotes a page out
    /// of the active window. Demotion must go through removal and
    /// re-insertion so the scanner sees the page leave its list.
    pub fn update_size(&self, page: &Page, old_gen: Option<Gen>, new_gen: Option<Gen>) {
        let ty = page.lru_type();
        let zone = page.zone();
        let delta = page.nr_pages() as i64;
        let ledger = &self.domain.ledger;

        match (old_gen, new_gen) {
            (None, None) => panic!("lru_gen: {} has neither old nor new generation", page.pfn()),
            // addition
            (None, Some(new)) => {
                ledger.adjust(new_gen, ty, zone, delta);
                self.domain
                    .update_lru_size(ty.list(self.is_active_gen(new)), zone, delta);
            },
            // deletion
            (Some(old), None) => {
                ledger.adjust(old_gen, ty, zone, -delta);
                self.domain
                    .update_lru_size(ty.list(self.is_active_gen(old)), zone, -delta);
            },
            (Some(old), Some(new)) => {
                let was_active = self.is_active_gen(old);
                let is_active = self.is_active_gen(new);
                assert!(
                    !(was_active && !is_active),
                    "lru_gen: demoting {} from {} to {} requires isolation",
                    page.pfn(),
                    old,
                    new
                );

                ledger.adjust(old_gen, ty, zone, -delta);
                ledger.adjust(new_gen, ty, zone, delta);

                // promotion
                if !was_active && is_active {
                    self.domain.update_lru_size(ty.inactive_list(), zone, -delta);
                    self.domain.update_lru_size(ty.active_list(), zone, delta);
                }
            },
        }
    }

    // -------------------------------------------------------------------------
    // Insertion / Removal
    // -------------------------------------------------------------------------

    #[inline(always)]
    fn assert_covers(&self, page: &Page) {
        assert!(
            self.lists.links.covers(page.pfn()),
            "lru_gen: {} beyond domain '{}' ({} frames)",
            page.pfn(),
            self.domain.config.name,
            self.lists.links.len()
        );
    }

    /// Admit a page into the generation its flags call for
    ///
    /// With `reclaiming` the page goes to the list tail, keeping the
    /// scanner's forward order; otherwise to the head.
    pub fn add_page(&mut self, page: &Page, reclaiming: bool) -> LruOutcome {
        if page.is_unevictable() {
            return LruOutcome::NotApplicable(NotApplicable::Unevictable);
        }
        if !self.domain.config.enabled {
            return LruOutcome::NotApplicable(NotApplicable::Disabled);
        }
        if page.lru_gen().is_some() {
            return LruOutcome::NotApplicable(NotApplicable::AlreadyTracked);
        }
        self.assert_covers(page);

        let ty = page.lru_type();
        let flags = page.flags();
        let seq = if flags.contains(PageFlags::ACTIVE) {
            // hot: freshly faulted, or hot before migration
            self.lists.max_seq
        } else if (ty == LruType::Anon && !flags.contains(PageFlags::SWAPCACHE))
            || (flags.contains(PageFlags::RECLAIM)
                && flags.intersects(PageFlags::DIRTY | PageFlags::WRITEBACK))
        {
            // cold but not evictable right away
            self.lists.min_seq[ty.index()] + 1
        } else {
            self.lists.min_seq[ty.index()]
        };

        let gen = Gen::from_seq(seq);
        page.state().write_gen(Some(gen), false);
        self.update_size(page, None, Some(gen));

        let DomainLists { lists, links, .. } = &mut *self.lists;
        let head = &mut lists[gen.index()][ty.index()][page.zone().index()];
        if reclaiming {
            head.push_back(links, page.pfn());
        } else {
            head.push_front(links, page.pfn());
        }

        LruOutcome::Handled
    }

    /// Take a page off its generation list
    ///
    /// Outside reclaim, a page leaving the active window keeps ACTIVE so a
    /// migration target is re-admitted as hot.
    pub fn del_page(&mut self, page: &Page, reclaiming: bool) -> LruOutcome {
        let Some(gen) = page.lru_gen() else {
            return LruOutcome::NotApplicable(NotApplicable::Untracked);
        };
        self.assert_covers(page);

        let suspicious = page.is_active() || page.is_unevictable();
        if suspicious && !reclaiming {
            log::warn!(
                "lru_gen: removing {} with flags {:?} from {}",
                page.pfn(),
                page.flags(),
                gen
            );
        }
        debug_assert!(
            reclaiming || !suspicious,
            "lru_gen: {} is active or unevictable while on a generation list",
            page.pfn()
        );

        let active = if !reclaiming && self.is_active_gen(gen) {
            PageFlags::ACTIVE.bits()
        } else {
            0
        };
        let old = page.state().set_mask_bits(LRU_GEN_MASK, active);
        let Some(old_gen) = gen_of_word(old) else {
            return LruOutcome::NotApplicable(NotApplicable::Untracked);
        };

        self.update_size(page, Some(old_gen), None);

        let ty = page.lru_type();
        let DomainLists { lists, links, .. } = &mut *self.lists;
        lists[old_gen.index()][ty.index()][page.zone().index()].remove(links, page.pfn());

        LruOutcome::Handled
    }

    /// Move a tracked page to the generation of `seq`
    ///
    /// Clears the page's access history and puts it at the head of the new
    /// list. Moving out of the active window panics like [`update_size`].
    ///
    /// [`update_size`]: DomainGuard::update_size
    pub fn move_page(&mut self, page: &Page, seq: u64) -> Result<Gen> {
        if !self.lists.links.covers(page.pfn()) {
            return Err(LruGenError::PfnOutOfRange);
        }
        let ty = page.lru_type();
        if seq < self.lists.min_seq[ty.index()] || seq > self.lists.max_seq {
            return Err(LruGenError::SeqOutOfWindow);
        }
        let old_gen = page.lru_gen().ok_or(LruGenError::Untracked)?;
        let new_gen = Gen::from_seq(seq);

        let refs_flags = (PageFlags::REFERENCED | PageFlags::WORKINGSET).bits();
        page.state()
            .set_mask_bits(LRU_GEN_MASK | LRU_REFS_MASK | refs_flags, gen_bits(Some(new_gen)));
        self.update_size(page, Some(old_gen), Some(new_gen));

        let zone = page.zone().index();
        let DomainLists { lists, links, .. } = &mut *self.lists;
        lists[old_gen.index()][ty.index()][zone].remove(links, page.pfn());
        lists[new_gen.index()][ty.index()][zone].push_front(links, page.pfn());

        Ok(new_gen)
    }

    // -------------------------------------------------------------------------
    // Sequence Advancement
    // -------------------------------------------------------------------------

    /// Open a new youngest generation
    ///
    /// The generation falling out of the active window is re-accounted from
    /// the active to the inactive lists. Returns the new `max_seq`.
    pub fn advance_max_seq(&mut self) -> Result<u64> {
        let max_seq = self.lists.max_seq;
        if max_seq - self.lists.oldest_seq() + 1 >= MAX_NR_GENS as u64 {
            return Err(LruGenError::WindowFull);
        }

        let leaving = Gen::from_seq(max_seq - 1);
        for ty in LruType::ALL {
            for zone in ZoneType::ALL {
                let nr = self.domain.ledger.nr_pages(leaving, ty, zone) as i64;
                if nr > 0 {
                    self.domain.update_lru_size(ty.active_list(), zone, -nr);
                    self.domain.update_lru_size(ty.inactive_list(), zone, nr);
                }
            }
        }

        let new_seq = max_seq + 1;
        debug_assert!(LruType::ALL
            .iter()
            .all(|&ty| self.domain.ledger.gen_pages(Gen::from_seq(new_seq), ty) == 0));
        self.domain.history.reset_slot(new_seq);
        self.lists.max_seq = new_seq;

        log::trace!("lru_gen: '{}' max_seq -> {}", self.domain.config.name, new_seq);
        Ok(new_seq)
    }

    /// Retire the oldest generation of `ty` once it is empty
    ///
    /// Returns the new `min_seq[ty]`.
    pub fn advance_min_seq(&mut self, ty: LruType) -> Result<u64> {
        let min_seq = self.lists.min_seq[ty.index()];
        if self.lists.max_seq - min_seq < MIN_NR_GENS as u64 {
            return Err(LruGenError::TooFewGenerations);
        }
        if self.domain.ledger.gen_pages(Gen::from_seq(min_seq), ty) != 0 {
            return Err(LruGenError::GenerationNotEmpty);
        }

        let new_seq = min_seq + 1;
        self.lists.min_seq[ty.index()] = new_seq;

        log::trace!(
            "lru_gen: '{}' min_seq[{:?}] -> {}",
            self.domain.config.name,
            ty,
            new_seq
        );
        Ok(new_seq)
    }
}

impl fmt::Debug for DomainGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainGuard")
            .field("domain", &self.domain.config.name)
            .field("max_seq", &self.lists.max_seq)
            .field("min_seq", &self.lists.min_seq)
            .finish()
    }
}
