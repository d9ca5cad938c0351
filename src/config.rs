//! World configuration.
//!
//! The teacher crate hard-codes its DoS guards (`archetypes.len() >= 10_000`,
//! batch size `> 10_000_000`) directly in `World`. This port keeps the same
//! ceilings but exposes them as a small config struct so an embedding host
//! can tune them instead of patching the core.

/// Tunable ceilings enforced by [`crate::world::World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcsConfig {
    /// Maximum number of distinct archetypes the world will create before
    /// `find_or_create` refuses and returns an error. Guards against
    /// archetype-graph explosion from pathological signature churn.
    pub max_archetypes: usize,

    /// Maximum number of entities a single `spawn_batch` call may create.
    pub max_batch_size: usize,
}

impl EcsConfig {
    /// Ceilings matching the teacher crate's hard-coded defaults.
    pub const fn new() -> Self {
        Self {
            max_archetypes: 10_000,
            max_batch_size: 10_000_000,
        }
    }
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_ceilings() {
        let cfg = EcsConfig::default();
        assert_eq!(cfg.max_archetypes, 10_000);
        assert_eq!(cfg.max_batch_size, 10_000_000);
    }
}
