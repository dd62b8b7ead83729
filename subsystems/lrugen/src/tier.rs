//! # Tier Classifier
//!
//! Compresses a page's access count into `MAX_NR_TIERS` logarithmic buckets.
//! Tier 0 holds pages accessed at most once; each further tier covers twice
//! the range of the one before it.

use crate::MAX_NR_TIERS;

/// Highest tier index
pub const MAX_TIER: usize = MAX_NR_TIERS - 1;

/// Ceiling of log2, with `order_base_2(0) == order_base_2(1) == 0`
#[inline(always)]
const fn order_base_2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        u32::BITS - (n - 1).leading_zeros()
    }
}

/// Tier of a page from its accesses beyond the first
#[inline]
pub const fn tier_from_refs(refs: u32) -> usize {
    let tier = order_base_2(refs.saturating_add(1)) as usize;
    if tier > MAX_TIER {
        MAX_TIER
    } else {
        tier
    }
}

/// Tier of a page from its total access count
///
/// Counts 0 and 1 both land in tier 0.
#[inline]
pub const fn tier_of(access_count: u32) -> usize {
    tier_from_refs(access_count.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_base_2() {
        assert_eq!(order_base_2(0), 0);
        assert_eq!(order_base_2(1), 0);
        assert_eq!(order_base_2(2), 1);
        assert_eq!(order_base_2(3), 2);
        assert_eq!(order_base_2(4), 2);
        assert_eq!(order_base_2(5), 3);
    }

    #[test]
    fn test_first_tier_covers_zero_and_one() {
        assert_eq!(tier_of(0), 0);
        assert_eq!(tier_of(1), 0);
        assert_eq!(tier_of(2), 1);
        assert_eq!(tier_from_refs(0), 0);
    }

    #[test]
    fn test_tier_monotonic_and_clamped() {
        let mut prev = 0;
        for count in 0..4096 {
            let tier = tier_of(count);
            assert!(tier >= prev);
            assert!(tier <= MAX_TIER);
            prev = tier;
        }
        assert_eq!(tier_of(u32::MAX), MAX_TIER);
        assert_eq!(tier_from_refs(u32::MAX), MAX_TIER);
    }
}
