//! # Helix Multi-Generational LRU
//!
//! Page-aging bookkeeping for the Helix memory subsystem. Resident pages of an
//! eviction domain are sorted into a small ring of *generations*; the reclaim
//! scanner evicts from the oldest generation and the fault path admits into
//! the youngest. This crate owns the data structure and the O(1) primitives
//! that keep it consistent, not the scanning policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Eviction Domain                          │
//! │                                                                 │
//! │   fault path ──▶ add_page ──┐          ┌── del_page ◀── reclaim │
//! │                             ▼          ▼                        │
//! │                    ┌──────────────────────────┐                 │
//! │                    │    update_size           │◀── move_page    │
//! │                    │  (transition engine)     │                 │
//! │                    └────────────┬─────────────┘                 │
//! │                                 ▼                               │
//! │   ┌────────────────────────┐  ┌───────────────────────────┐     │
//! │   │ lists[gen][type][zone] │  │ SizeLedger + LruSizes     │     │
//! │   │ (domain lock)          │  │ (atomics, lock-free read) │     │
//! │   └────────────────────────┘  └───────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sequence Window
//!
//! | Counter         | Meaning                                    |
//! |-----------------|--------------------------------------------|
//! | `max_seq`       | youngest generation, shared by both types  |
//! | `min_seq[type]` | oldest generation still holding pages      |
//!
//! Generation slots are `seq % MAX_NR_GENS`. The two youngest generations are
//! the *active window* reported through the coarse active/inactive counters.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod caps;
pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod ledger;
pub mod list;
pub mod lruvec;
pub mod page;
pub mod seq;
pub mod tier;
pub mod types;

pub use caps::{FaultContext, FaultScope};
pub use config::LruGenConfig;
pub use domain::{DomainGuard, EvictionDomain};
pub use error::{LruGenError, LruOutcome, NotApplicable, Result};
pub use history::TierHistory;
pub use ledger::{LruAccounting, LruSizes, SizeLedger};
pub use lruvec::{LegacyLru, Lruvec};
pub use page::{Page, PageFlags, PageState};
pub use seq::{lru_gen_from_seq, lru_hist_from_seq, Gen};
pub use tier::{tier_from_refs, tier_of};
pub use types::{LruList, LruType, Pfn, ZoneType};

use static_assertions::const_assert;

// =============================================================================
// Dimensions
// =============================================================================

/// Minimum number of live generations; the two youngest form the active window
pub const MIN_NR_GENS: usize = 2;

/// Number of generation slots per (type, zone)
pub const MAX_NR_GENS: usize = 4;

/// Number of tiers an access count is compressed into
pub const MAX_NR_TIERS: usize = 4;

/// Width of the per-page access-count field
pub const LRU_REFS_WIDTH: u32 = (MAX_NR_TIERS - 2) as u32;

/// Width of the per-page generation field (holds `gen + 1`)
pub const LRU_GEN_WIDTH: u32 = 3;

/// Number of history slots for refault/tier statistics
pub const NR_HIST_GENS: usize = 8;

/// Anonymous and file-backed
pub const ANON_AND_FILE: usize = 2;

/// Number of memory zones
pub const MAX_NR_ZONES: usize = 4;

/// Number of coarse LRU lists
pub const NR_LRU_LISTS: usize = 5;

const_assert!(MIN_NR_GENS <= MAX_NR_GENS);
const_assert!(MAX_NR_GENS < (1 << LRU_GEN_WIDTH));
const_assert!(LRU_REFS_WIDTH >= 1);
const_assert!(NR_HIST_GENS >= MAX_NR_GENS);
