//! # Lruvec Dispatch
//!
//! Entry points for the fault, activation and reclaim paths. Each call tries
//! the generation lists first and falls back to the legacy active/inactive
//! lists when the domain declines the page. The legacy lists themselves live
//! outside this crate behind [`LegacyLru`]; the coarse counters stay here so
//! both paths report through the same [`LruSizes`](crate::LruSizes).

use core::fmt;

use crate::domain::DomainGuard;
use crate::error::{LruOutcome, NotApplicable};
use crate::page::{Page, PageFlags};
use crate::types::{LruList, Pfn};

/// The single-list fallback scheme
pub trait LegacyLru {
    /// Link `pfn` onto `lru`, at the tail when `tail` is set
    fn add(&mut self, pfn: Pfn, lru: LruList, tail: bool);

    /// Unlink `pfn` from `lru`
    fn del(&mut self, pfn: Pfn, lru: LruList);
}

/// Coarse list a page belongs on
pub fn lru_list_of(page: &Page) -> LruList {
    if page.is_unevictable() {
        LruList::Unevictable
    } else {
        page.lru_type().list(page.is_active())
    }
}

/// Coarse list a page was on, clearing its UNEVICTABLE or ACTIVE flag
pub fn page_off_lru(page: &Page) -> LruList {
    let lru = lru_list_of(page);
    match lru {
        LruList::Unevictable => page.state().clear(PageFlags::UNEVICTABLE),
        LruList::ActiveAnon | LruList::ActiveFile => page.state().clear(PageFlags::ACTIVE),
        LruList::InactiveAnon | LruList::InactiveFile => {},
    }
    lru
}

/// Dispatcher binding a locked domain to its legacy lists
pub struct Lruvec<'g, 'a, L: LegacyLru> {
    guard: &'g mut DomainGuard<'a>,
    legacy: &'g mut L,
}

impl<'g, 'a, L: LegacyLru> Lruvec<'g, 'a, L> {
    /// Bind a locked domain and its legacy lists
    pub fn new(guard: &'g mut DomainGuard<'a>, legacy: &'g mut L) -> Self {
        Self { guard, legacy }
    }

    /// Admit a page at the head of its list
    ///
    /// Returns the outcome of the generation path. Pages declined as
    /// unevictable or because the domain is disabled go to the legacy lists;
    /// a page already on a generation list is left where it is.
    pub fn add_page(&mut self, page: &Page) -> LruOutcome {
        self.add(page, false)
    }

    /// Admit a page at the tail of its list
    pub fn add_page_tail(&mut self, page: &Page) -> LruOutcome {
        self.add(page, true)
    }

    fn add(&mut self, page: &Page, tail: bool) -> LruOutcome {
        let lru = lru_list_of(page);
        let outcome = self.guard.add_page(page, tail);
        match outcome {
            LruOutcome::NotApplicable(NotApplicable::Unevictable | NotApplicable::Disabled) => {},
            _ => return outcome,
        }

        self.guard
            .domain()
            .update_lru_size(lru, page.zone(), page.nr_pages() as i64);
        if lru != LruList::Unevictable {
            self.legacy.add(page.pfn(), lru, tail);
        }
        outcome
    }

    /// Take a page off whichever list holds it
    pub fn del_page(&mut self, page: &Page) -> LruOutcome {
        let lru = lru_list_of(page);
        let outcome = self.guard.del_page(page, false);
        if outcome.is_handled() {
            return outcome;
        }

        if lru != LruList::Unevictable {
            self.legacy.del(page.pfn(), lru);
        }
        self.guard
            .domain()
            .update_lru_size(lru, page.zone(), -(page.nr_pages() as i64));
        outcome
    }
}

impl<L: LegacyLru> fmt::Debug for Lruvec<'_, '_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lruvec").field("guard", &self.guard).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LruGenConfig;
    use crate::domain::EvictionDomain;
    use crate::types::ZoneType;
    use alloc::vec::Vec;

    #[derive(Debug, Default)]
    struct Lists {
        linked: Vec<(Pfn, LruList, bool)>,
    }

    impl LegacyLru for Lists {
        fn add(&mut self, pfn: Pfn, lru: LruList, tail: bool) {
            self.linked.push((pfn, lru, tail));
        }

        fn del(&mut self, pfn: Pfn, lru: LruList) {
            let pos = self
                .linked
                .iter()
                .position(|&(p, l, _)| p == pfn && l == lru)
                .expect("page not on legacy list");
            self.linked.remove(pos);
        }
    }

    #[test]
    fn test_lru_list_of() {
        let page = Page::anon(Pfn::new(0), ZoneType::Normal);
        assert_eq!(lru_list_of(&page), LruList::InactiveAnon);
        page.state().set(PageFlags::ACTIVE);
        assert_eq!(lru_list_of(&page), LruList::ActiveAnon);
        page.state().set(PageFlags::UNEVICTABLE);
        assert_eq!(lru_list_of(&page), LruList::Unevictable);
    }

    #[test]
    fn test_page_off_lru_clears_flags() {
        let page = Page::file(Pfn::new(0), ZoneType::Normal);
        page.state().set(PageFlags::ACTIVE);
        assert_eq!(page_off_lru(&page), LruList::ActiveFile);
        assert!(!page.is_active());

        page.state().set(PageFlags::UNEVICTABLE | PageFlags::ACTIVE);
        assert_eq!(page_off_lru(&page), LruList::Unevictable);
        assert!(!page.is_unevictable());
        assert!(page.is_active());
    }

    #[test]
    fn test_generation_path_bypasses_legacy() {
        let domain = EvictionDomain::new(LruGenConfig::new("lruvec", 8));
        let mut legacy = Lists::default();
        let page = Page::file(Pfn::new(1), ZoneType::Normal);

        let mut guard = domain.lock();
        let mut lruvec = Lruvec::new(&mut guard, &mut legacy);
        assert!(lruvec.add_page(&page).is_handled());
        assert!(lruvec.del_page(&page).is_handled());
        drop(guard);

        assert!(legacy.linked.is_empty());
        assert_eq!(domain.lru_sizes().inactive(), 0);
    }

    #[test]
    fn test_disabled_domain_uses_legacy() {
        let domain = EvictionDomain::new(LruGenConfig::disabled("legacy", 8));
        let mut legacy = Lists::default();
        let page = Page::anon(Pfn::new(2), ZoneType::Dma32).with_order(1);
        page.state().set(PageFlags::ACTIVE);

        let mut guard = domain.lock();
        let mut lruvec = Lruvec::new(&mut guard, &mut legacy);
        assert_eq!(
            lruvec.add_page_tail(&page),
            LruOutcome::NotApplicable(NotApplicable::Disabled)
        );
        drop(guard);

        assert_eq!(legacy.linked, [(Pfn::new(2), LruList::ActiveAnon, true)]);
        assert_eq!(domain.lru_sizes().nr_pages(LruList::ActiveAnon, ZoneType::Dma32), 2);
        assert_eq!(domain.ledger().total(), 0);

        let mut guard = domain.lock();
        let mut lruvec = Lruvec::new(&mut guard, &mut legacy);
        assert_eq!(
            lruvec.del_page(&page),
            LruOutcome::NotApplicable(NotApplicable::Untracked)
        );
        drop(guard);

        assert!(legacy.linked.is_empty());
        assert_eq!(domain.lru_sizes().active(), 0);
    }

    #[test]
    fn test_unevictable_is_counted_not_linked() {
        let domain = EvictionDomain::new(LruGenConfig::new("mlock", 8));
        let mut legacy = Lists::default();
        let page = Page::file(Pfn::new(3), ZoneType::Normal);
        page.state().set(PageFlags::UNEVICTABLE);

        let mut guard = domain.lock();
        let mut lruvec = Lruvec::new(&mut guard, &mut legacy);
        assert!(!lruvec.add_page(&page).is_handled());
        drop(guard);

        assert!(legacy.linked.is_empty());
        assert_eq!(domain.lru_sizes().lru_pages(LruList::Unevictable), 1);

        let mut guard = domain.lock();
        let mut lruvec = Lruvec::new(&mut guard, &mut legacy);
        assert!(!lruvec.del_page(&page).is_handled());
        drop(guard);
        assert_eq!(domain.lru_sizes().lru_pages(LruList::Unevictable), 0);
    }

    #[test]
    fn test_tracked_page_is_not_readmitted() {
        let domain = EvictionDomain::new(LruGenConfig::new("twice", 8));
        let mut legacy = Lists::default();
        let page = Page::file(Pfn::new(1), ZoneType::Normal);

        let mut guard = domain.lock();
        let mut lruvec = Lruvec::new(&mut guard, &mut legacy);
        assert!(lruvec.add_page(&page).is_handled());
        assert_eq!(
            lruvec.add_page_tail(&page),
            LruOutcome::NotApplicable(NotApplicable::AlreadyTracked)
        );
        drop(guard);

        assert!(legacy.linked.is_empty());
        assert_eq!(domain.ledger().total(), 1);
        assert_eq!(domain.lru_sizes().inactive(), domain.ledger().total());

        let mut guard = domain.lock();
        let mut lruvec = Lruvec::new(&mut guard, &mut legacy);
        assert!(lruvec.del_page(&page).is_handled());
        drop(guard);
        assert_eq!(domain.lru_sizes().inactive(), 0);
    }
}
