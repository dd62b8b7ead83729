//! # Capability Toggle
//!
//! Process-wide switch for the multi-generational lists. Set once during
//! memory-subsystem bring-up and read-only afterwards. Domains copy the
//! answer into their own configuration when they are created, so flipping
//! the toggle never changes a live domain.
//!
//! [`FaultContext`] is the per-task half: a marker the fault path raises while
//! it handles a fault, so aging code can tell fault-time admissions apart.

use core::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;
use spin::Once;

bitflags! {
    /// Multi-generational LRU capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LruGenCaps: u32 {
        /// Generation lists replace the legacy active/inactive lists
        const CORE = 1 << 0;
        /// Page-table walks may feed access bits to aging
        const MM_WALK = 1 << 1;
        /// Non-leaf accessed bits are honoured during walks
        const NONLEAF_YOUNG = 1 << 2;
    }
}

static LRU_GEN_CAPS: Once<LruGenCaps> = Once::new();

/// Capabilities assumed before [`init`] runs
#[inline]
pub const fn default_caps() -> LruGenCaps {
    if cfg!(feature = "enabled-by-default") {
        LruGenCaps::all()
    } else {
        LruGenCaps::empty()
    }
}

/// Install the process-wide capability set
///
/// Only the first call has an effect. Returns the installed set.
pub fn init(caps: LruGenCaps) -> LruGenCaps {
    let installed = *LRU_GEN_CAPS.call_once(|| {
        log::debug!("lru_gen: capabilities {:?}", caps);
        caps
    });
    if installed != caps {
        log::warn!(
            "lru_gen: ignoring capability re-init {:?}, keeping {:?}",
            caps,
            installed
        );
    }
    installed
}

/// Current capability set
#[inline]
pub fn caps() -> LruGenCaps {
    LRU_GEN_CAPS.get().copied().unwrap_or_else(default_caps)
}

/// Are generation lists enabled process-wide?
#[inline]
pub fn lru_gen_enabled() -> bool {
    caps().contains(LruGenCaps::CORE)
}

// =============================================================================
// Fault Context
// =============================================================================

/// Per-task "handling an LRU fault" marker
#[derive(Debug, Default)]
pub struct FaultContext {
    in_lru_fault: AtomicBool,
}

impl FaultContext {
    /// Marker outside any fault
    pub const fn new() -> Self {
        Self {
            in_lru_fault: AtomicBool::new(false),
        }
    }

    /// Mark the task as handling a fault until the scope is dropped
    pub fn enter(&self) -> FaultScope<'_> {
        let was = self.in_lru_fault.swap(true, Ordering::Relaxed);
        FaultScope { ctx: self, was }
    }

    /// Is the task inside a fault?
    #[inline]
    pub fn in_lru_fault(&self) -> bool {
        self.in_lru_fault.load(Ordering::Relaxed)
    }
}

/// Raised fault marker; restores the previous state on drop
#[derive(Debug)]
#[must_use = "the fault marker drops immediately if the scope is not held"]
pub struct FaultScope<'a> {
    ctx: &'a FaultContext,
    was: bool,
}

impl Drop for FaultScope<'_> {
    fn drop(&mut self) {
        self.ctx.in_lru_fault.store(self.was, Ordering::Relaxed);
    }
}

/// Is `ctx` handling an LRU fault? Always false when generation lists are off.
#[inline]
pub fn lru_gen_in_fault(ctx: &FaultContext) -> bool {
    lru_gen_enabled() && ctx.in_lru_fault()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caps_follow_feature() {
        assert_eq!(
            default_caps().contains(LruGenCaps::CORE),
            cfg!(feature = "enabled-by-default")
        );
    }

    #[test]
    fn test_init_is_sticky() {
        let first = init(default_caps());
        let second = init(LruGenCaps::MM_WALK);
        assert_eq!(first, second);
        assert_eq!(caps(), first);
        assert_eq!(lru_gen_enabled(), first.contains(LruGenCaps::CORE));
    }

    #[test]
    fn test_fault_scope_nests() {
        let ctx = FaultContext::new();
        assert!(!ctx.in_lru_fault());
        {
            let _outer = ctx.enter();
            assert!(ctx.in_lru_fault());
            {
                let _inner = ctx.enter();
                assert!(ctx.in_lru_fault());
            }
            assert!(ctx.in_lru_fault());
        }
        assert!(!ctx.in_lru_fault());
    }

    #[test]
    fn test_lru_gen_in_fault_follows_toggle() {
        let ctx = FaultContext::new();
        assert!(!lru_gen_in_fault(&ctx));
        let _scope = ctx.enter();
        assert_eq!(lru_gen_in_fault(&ctx), lru_gen_enabled());
    }
}
