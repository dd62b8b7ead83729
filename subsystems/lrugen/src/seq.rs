//! # Sequence to Generation Mapping
//!
//! Sequence counters grow without bound; generation and history slots are
//! their residues. A slot value says nothing about age on its own: compare
//! the sequences it came from.

use core::fmt;

use crate::{MAX_NR_GENS, NR_HIST_GENS};

/// Generation slot, always `< MAX_NR_GENS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Gen(u8);

impl Gen {
    /// Create a generation from a raw slot index
    ///
    /// Returns `None` when `gen >= MAX_NR_GENS`.
    #[inline]
    pub const fn new(gen: usize) -> Option<Self> {
        if gen < MAX_NR_GENS {
            Some(Self(gen as u8))
        } else {
            None
        }
    }

    /// Generation holding sequence `seq`
    #[inline(always)]
    pub const fn from_seq(seq: u64) -> Self {
        Self(lru_gen_from_seq(seq) as u8)
    }

    /// Table index
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Gen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Generation slot of a sequence counter
#[inline(always)]
pub const fn lru_gen_from_seq(seq: u64) -> usize {
    (seq % MAX_NR_GENS as u64) as usize
}

/// History slot of a sequence counter
#[inline(always)]
pub const fn lru_hist_from_seq(seq: u64) -> usize {
    (seq % NR_HIST_GENS as u64) as usize
}
