//! # Domain Configuration

use crate::caps;

/// Eviction domain configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LruGenConfig {
    /// Domain name for debugging
    pub name: &'static str,
    /// Number of page frames the domain can link
    pub nr_frames: usize,
    /// Whether generation lists are used at all
    pub enabled: bool,
}

impl LruGenConfig {
    /// Enabled configuration for `nr_frames` page frames
    pub const fn new(name: &'static str, nr_frames: usize) -> Self {
        Self {
            name,
            nr_frames,
            enabled: true,
        }
    }

    /// Disabled configuration; every page goes to the legacy lists
    pub const fn disabled(name: &'static str, nr_frames: usize) -> Self {
        Self {
            name,
            nr_frames,
            enabled: false,
        }
    }

    /// Set the domain name
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Set the number of page frames
    pub const fn with_nr_frames(mut self, nr_frames: usize) -> Self {
        self.nr_frames = nr_frames;
        self
    }

    /// Enable or disable generation lists
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for LruGenConfig {
    fn default() -> Self {
        Self {
            name: "lruvec",
            nr_frames: 0,
            enabled: caps::lru_gen_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = LruGenConfig::disabled("node0", 16)
            .with_enabled(true)
            .with_nr_frames(32)
            .with_name("node1");
        assert!(config.enabled);
        assert_eq!(config.nr_frames, 32);
        assert_eq!(config.name, "node1");
    }

    #[test]
    fn test_default_follows_caps() {
        assert_eq!(LruGenConfig::default().enabled, caps::lru_gen_enabled());
    }
}
