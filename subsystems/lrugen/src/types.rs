//! # Page Classification Types
//!
//! Small index types shared by every table in the crate.

use core::fmt;

use crate::{ANON_AND_FILE, MAX_NR_ZONES, NR_LRU_LISTS};

// =============================================================================
// Page Frame Number
// =============================================================================

/// Page frame number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pfn(u64);

impl Pfn {
    /// Create a new page frame number
    #[inline]
    pub const fn new(pfn: u64) -> Self {
        Self(pfn)
    }

    /// Raw frame number
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Index into per-frame tables
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Pfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pfn:{:#x}", self.0)
    }
}

// =============================================================================
// LRU Type
// =============================================================================

/// Which half of the domain a page is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LruType {
    /// Swap-backed memory
    Anon = 0,
    /// Page cache, or lazily freed anonymous memory
    File = 1,
}

impl LruType {
    /// All types, in index order
    pub const ALL: [LruType; ANON_AND_FILE] = [LruType::Anon, LruType::File];

    /// Table index
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inactive coarse list of this type
    #[inline]
    pub const fn inactive_list(self) -> LruList {
        match self {
            LruType::Anon => LruList::InactiveAnon,
            LruType::File => LruList::InactiveFile,
        }
    }

    /// Active coarse list of this type
    #[inline]
    pub const fn active_list(self) -> LruList {
        match self {
            LruType::Anon => LruList::ActiveAnon,
            LruType::File => LruList::ActiveFile,
        }
    }

    /// Coarse list for the given activity
    #[inline]
    pub const fn list(self, active: bool) -> LruList {
        if active {
            self.active_list()
        } else {
            self.inactive_list()
        }
    }
}

// =============================================================================
// Zone Type
// =============================================================================

/// Physical memory zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ZoneType {
    /// Legacy ISA DMA
    Dma     = 0,
    /// 32-bit addressable DMA
    Dma32   = 1,
    /// Normal memory
    Normal  = 2,
    /// Movable (hotplug, compaction target)
    Movable = 3,
}

impl ZoneType {
    /// All zones, in index order
    pub const ALL: [ZoneType; MAX_NR_ZONES] =
        [ZoneType::Dma, ZoneType::Dma32, ZoneType::Normal, ZoneType::Movable];

    /// Table index
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Zone name
    pub const fn name(self) -> &'static str {
        match self {
            ZoneType::Dma => "DMA",
            ZoneType::Dma32 => "DMA32",
            ZoneType::Normal => "Normal",
            ZoneType::Movable => "Movable",
        }
    }
}

// =============================================================================
// Coarse LRU Lists
// =============================================================================

/// Coarse active/inactive list a page is accounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LruList {
    /// Inactive anonymous
    InactiveAnon = 0,
    /// Active anonymous
    ActiveAnon   = 1,
    /// Inactive file
    InactiveFile = 2,
    /// Active file
    ActiveFile   = 3,
    /// Never reclaimed
    Unevictable  = 4,
}

impl LruList {
    /// All lists, in index order
    pub const ALL: [LruList; NR_LRU_LISTS] = [
        LruList::InactiveAnon,
        LruList::ActiveAnon,
        LruList::InactiveFile,
        LruList::ActiveFile,
        LruList::Unevictable,
    ];

    /// Table index
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Is this an active list?
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, LruList::ActiveAnon | LruList::ActiveFile)
    }

    /// Page type of the list, `None` for unevictable
    #[inline]
    pub const fn lru_type(self) -> Option<LruType> {
        match self {
            LruList::InactiveAnon | LruList::ActiveAnon => Some(LruType::Anon),
            LruList::InactiveFile | LruList::ActiveFile => Some(LruType::File),
            LruList::Unevictable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_list_mapping() {
        for ty in LruType::ALL {
            assert!(!ty.inactive_list().is_active());
            assert!(ty.active_list().is_active());
            assert_eq!(ty.list(true).lru_type(), Some(ty));
            assert_eq!(ty.list(false).lru_type(), Some(ty));
        }
        assert_eq!(LruList::Unevictable.lru_type(), None);
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, zone) in ZoneType::ALL.iter().enumerate() {
            assert_eq!(zone.index(), i);
        }
        for (i, lru) in LruList::ALL.iter().enumerate() {
            assert_eq!(lru.index(), i);
        }
    }
}
