//! # LRU Generation Errors
//!
//! Two kinds of outcome leave this crate:
//! - [`LruOutcome`] for the per-page paths, where "not handled" is a normal
//!   answer that sends the caller down the legacy list code
//! - [`LruGenError`] for the scanner-facing primitives that can refuse a
//!   request without any state change
//!
//! Caller invariant breaches (illegal demotion, both generations untracked)
//! are not represented here; they panic.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Result type alias for scanner-facing operations
pub type Result<T> = core::result::Result<T, LruGenError>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// Refusals from the scanner-facing primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LruGenError {
    /// `max_seq` cannot advance: all generation slots are live
    WindowFull,
    /// `min_seq` cannot advance: the oldest generation still holds pages
    GenerationNotEmpty,
    /// `min_seq` cannot advance: the window would drop below `MIN_NR_GENS`
    TooFewGenerations,
    /// Requested sequence lies outside `[min_seq, max_seq]`
    SeqOutOfWindow,
    /// Page frame number exceeds the domain's link table
    PfnOutOfRange,
    /// Page is not on any generation list
    Untracked,
}

impl fmt::Display for LruGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindowFull => write!(f, "generation window full"),
            Self::GenerationNotEmpty => write!(f, "oldest generation not empty"),
            Self::TooFewGenerations => write!(f, "too few generations"),
            Self::SeqOutOfWindow => write!(f, "sequence outside generation window"),
            Self::PfnOutOfRange => write!(f, "page frame number out of range"),
            Self::Untracked => write!(f, "page not tracked"),
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Why the multi-generational path declined a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotApplicable {
    /// Page is unevictable
    Unevictable,
    /// Domain has the multi-generational lists disabled
    Disabled,
    /// Page already carries a generation
    AlreadyTracked,
    /// Page carries no generation
    Untracked,
}

impl fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unevictable => write!(f, "unevictable"),
            Self::Disabled => write!(f, "disabled"),
            Self::AlreadyTracked => write!(f, "already tracked"),
            Self::Untracked => write!(f, "untracked"),
        }
    }
}

/// Result of an insertion or removal attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum LruOutcome {
    /// The generation lists took care of the page
    Handled,
    /// The caller must use its fallback path
    NotApplicable(NotApplicable),
}

impl LruOutcome {
    /// Was the page handled?
    #[inline]
    pub const fn is_handled(self) -> bool {
        matches!(self, LruOutcome::Handled)
    }

    /// Reason the page was declined, if any
    #[inline]
    pub const fn reason(self) -> Option<NotApplicable> {
        match self {
            LruOutcome::Handled => None,
            LruOutcome::NotApplicable(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_outcome_accessors() {
        assert!(LruOutcome::Handled.is_handled());
        assert_eq!(LruOutcome::Handled.reason(), None);

        let declined = LruOutcome::NotApplicable(NotApplicable::Disabled);
        assert!(!declined.is_handled());
        assert_eq!(declined.reason(), Some(NotApplicable::Disabled));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(LruGenError::WindowFull.to_string(), "generation window full");
        assert_eq!(NotApplicable::Untracked.to_string(), "untracked");
    }
}
