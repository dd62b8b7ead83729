//! # Page Lists
//!
//! Doubly linked lists threaded through a per-frame link table, so insert
//! and unlink are O(1) and the lists never allocate. The table is sized
//! once when the domain is created; a frame is on at most one list.

use alloc::vec::Vec;

use crate::types::Pfn;

/// Per-frame list link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Link {
    prev: Option<Pfn>,
    next: Option<Pfn>,
    linked: bool,
}

impl Link {
    /// Is the frame on a list?
    #[inline]
    pub const fn is_linked(&self) -> bool {
        self.linked
    }
}

/// Link table indexed by page frame number
#[derive(Debug)]
pub struct LinkTable {
    links: Vec<Link>,
}

impl LinkTable {
    /// Table for `nr_frames` frames
    pub fn new(nr_frames: usize) -> Self {
        let mut links = Vec::with_capacity(nr_frames);
        links.resize(nr_frames, Link::default());
        Self { links }
    }

    /// Number of frames covered
    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Does the table cover no frames?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Does the table cover `pfn`?
    #[inline]
    pub fn covers(&self, pfn: Pfn) -> bool {
        pfn.index() < self.links.len()
    }

    /// Link of `pfn`
    #[inline]
    pub fn get(&self, pfn: Pfn) -> &Link {
        &self.links[pfn.index()]
    }

    #[inline]
    fn get_mut(&mut self, pfn: Pfn) -> &mut Link {
        &mut self.links[pfn.index()]
    }
}

/// Head of one page list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListHead {
    head: Option<Pfn>,
    tail: Option<Pfn>,
    len: usize,
}

impl ListHead {
    /// Empty list
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of entries
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Is the list empty?
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First entry
    #[inline]
    pub const fn front(&self) -> Option<Pfn> {
        self.head
    }

    /// Last entry
    #[inline]
    pub const fn back(&self) -> Option<Pfn> {
        self.tail
    }

    /// Insert at the head
    pub fn push_front(&mut self, links: &mut LinkTable, pfn: Pfn) {
        assert!(!links.get(pfn).linked, "{} already on a list", pfn);
        let old_head = self.head;
        *links.get_mut(pfn) = Link {
            prev: None,
            next: old_head,
            linked: true,
        };
        match old_head {
            Some(head) => links.get_mut(head).prev = Some(pfn),
            None => self.tail = Some(pfn),
        }
        self.head = Some(pfn);
        self.len += 1;
    }

    /// Insert at the tail
    pub fn push_back(&mut self, links: &mut LinkTable, pfn: Pfn) {
        assert!(!links.get(pfn).linked, "{} already on a list", pfn);
        let old_tail = self.tail;
        *links.get_mut(pfn) = Link {
            prev: old_tail,
            next: None,
            linked: true,
        };
        match old_tail {
            Some(tail) => links.get_mut(tail).next = Some(pfn),
            None => self.head = Some(pfn),
        }
        self.tail = Some(pfn);
        self.len += 1;
    }

    /// Unlink `pfn`, which must be on this list
    pub fn remove(&mut self, links: &mut LinkTable, pfn: Pfn) {
        let link = *links.get(pfn);
        assert!(link.linked, "{} not on a list", pfn);

        match link.prev {
            Some(prev) => links.get_mut(prev).next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => links.get_mut(next).prev = link.prev,
            None => self.tail = link.prev,
        }
        *links.get_mut(pfn) = Link::default();
        self.len -= 1;
    }

    /// Iterate from head to tail
    pub fn iter<'a>(&self, links: &'a LinkTable) -> ListIter<'a> {
        ListIter {
            links,
            next: self.head,
        }
    }
}

/// Head-to-tail iterator over a list
#[derive(Debug)]
pub struct ListIter<'a> {
    links: &'a LinkTable,
    next: Option<Pfn>,
}

impl Iterator for ListIter<'_> {
    type Item = Pfn;

    fn next(&mut self) -> Option<Pfn> {
        let pfn = self.next?;
        self.next = self.links.get(pfn).next;
        Some(pfn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn collect(list: &ListHead, links: &LinkTable) -> Vec<u64> {
        list.iter(links).map(Pfn::as_u64).collect()
    }

    #[test]
    fn test_push_front_and_back() {
        let mut links = LinkTable::new(8);
        let mut list = ListHead::new();

        list.push_front(&mut links, Pfn::new(1));
        list.push_front(&mut links, Pfn::new(2));
        list.push_back(&mut links, Pfn::new(3));

        assert_eq!(collect(&list, &links), vec![2, 1, 3]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(Pfn::new(2)));
        assert_eq!(list.back(), Some(Pfn::new(3)));
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let mut links = LinkTable::new(8);
        let mut list = ListHead::new();
        for pfn in 0..5 {
            list.push_back(&mut links, Pfn::new(pfn));
        }

        list.remove(&mut links, Pfn::new(2));
        assert_eq!(collect(&list, &links), vec![0, 1, 3, 4]);
        list.remove(&mut links, Pfn::new(0));
        list.remove(&mut links, Pfn::new(4));
        assert_eq!(collect(&list, &links), vec![1, 3]);
        assert!(!links.get(Pfn::new(2)).is_linked());

        list.remove(&mut links, Pfn::new(1));
        list.remove(&mut links, Pfn::new(3));
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    #[should_panic]
    fn test_double_insert_panics() {
        let mut links = LinkTable::new(2);
        let mut list = ListHead::new();
        list.push_front(&mut links, Pfn::new(0));
        list.push_back(&mut links, Pfn::new(0));
    }
}
