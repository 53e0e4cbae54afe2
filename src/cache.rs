/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Two-slot memo of evaluated values keyed by configuration identifier.
//!
//! Monte Carlo drivers evaluate a trial configuration and then either keep it
//! or revert to the previous one. The cache keeps the current value and the
//! one before it, so a reverted trial costs nothing:
//!
//! ```text
//!   Empty ──store──► Clean{current} ──store──► Pending{current, previous}
//!                                                   │   ▲
//!                                          previous │   │ swap
//!                                          id asked └───┘
//! ```
//!
//! # Invariants
//! - A hit never changes the state
//! - A rollback swaps the two slots; nothing is recomputed
//! - `store` always shifts the current slot into the previous slot

/// A value tagged with the configuration it was computed for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CachedValue {
    /// Configuration identifier.
    pub id: u64,
    /// Computed value.
    pub value: f64,
}

/// What the cache currently remembers.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum CacheState {
    /// Nothing evaluated yet.
    #[default]
    Empty,
    /// One value, no history.
    Clean {
        /// Most recent value.
        current: CachedValue,
    },
    /// A value and the one it replaced.
    Pending {
        /// Most recent value.
        current: CachedValue,
        /// Value before it.
        previous: CachedValue,
    },
}

/// Outcome of a cache lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lookup {
    /// The identifier matches the current value.
    Hit(f64),
    /// The identifier matches the previous value, which is current again.
    Rollback(f64),
    /// Not cached: compute and [`ValueCache::store`].
    Miss,
}

/// Current/previous value memo with an on/off switch.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueCache {
    state: CacheState,
    enabled: bool,
}

impl Default for ValueCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueCache {
    /// An empty, enabled cache.
    pub fn new() -> Self {
        Self { state: CacheState::Empty, enabled: true }
    }

    /// Look up `id`. A rollback makes the previous slot current.
    ///
    /// A disabled cache always misses.
    pub fn lookup(&mut self, id: u64) -> Lookup {
        if !self.enabled {
            return Lookup::Miss;
        }
        match self.state {
            CacheState::Clean { current } | CacheState::Pending { current, .. }
                if current.id == id =>
            {
                Lookup::Hit(current.value)
            }
            CacheState::Pending { current, previous } if previous.id == id => {
                self.state = CacheState::Pending { current: previous, previous: current };
                Lookup::Rollback(previous.value)
            }
            _ => Lookup::Miss,
        }
    }

    /// Record `value` for `id`, shifting the current slot into the previous one.
    pub fn store(&mut self, id: u64, value: f64) {
        let current = CachedValue { id, value };
        self.state = match self.state {
            CacheState::Empty => CacheState::Clean { current },
            CacheState::Clean { current: previous }
            | CacheState::Pending { current: previous, .. } => {
                CacheState::Pending { current, previous }
            }
        };
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.state = CacheState::Empty;
    }

    /// Turn lookups on or off. Stored values are kept either way.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Are lookups on?
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The whole state.
    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Most recent entry.
    pub fn current(&self) -> Option<CachedValue> {
        match self.state {
            CacheState::Empty => None,
            CacheState::Clean { current } | CacheState::Pending { current, .. } => Some(current),
        }
    }

    /// Entry before the most recent one.
    pub fn previous(&self) -> Option<CachedValue> {
        match self.state {
            CacheState::Pending { previous, .. } => Some(previous),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_misses() {
        let mut c = ValueCache::new();
        assert_eq!(c.lookup(0), Lookup::Miss);
        assert_eq!(c.state(), CacheState::Empty);
    }

    #[test]
    fn test_hit_leaves_state() {
        let mut c = ValueCache::new();
        c.store(4, 1.5);
        let before = c.state();
        assert_eq!(c.lookup(4), Lookup::Hit(1.5));
        assert_eq!(c.state(), before);
    }

    #[test]
    fn test_store_shifts_slots() {
        let mut c = ValueCache::new();
        c.store(1, 10.0);
        c.store(2, 20.0);
        assert_eq!(c.current(), Some(CachedValue { id: 2, value: 20.0 }));
        assert_eq!(c.previous(), Some(CachedValue { id: 1, value: 10.0 }));
        c.store(3, 30.0);
        assert_eq!(c.previous(), Some(CachedValue { id: 2, value: 20.0 }));
    }

    #[test]
    fn test_rollback_swaps() {
        let mut c = ValueCache::new();
        c.store(1, 10.0);
        c.store(2, 20.0);
        assert_eq!(c.lookup(1), Lookup::Rollback(10.0));
        assert_eq!(c.current().map(|v| v.id), Some(1));
        assert_eq!(c.previous().map(|v| v.id), Some(2));
        // now 1 is current
        assert_eq!(c.lookup(1), Lookup::Hit(10.0));
    }

    #[test]
    fn test_clean_state_cannot_roll_back() {
        let mut c = ValueCache::new();
        c.store(7, 1.0);
        assert_eq!(c.lookup(6), Lookup::Miss);
        assert_eq!(c.previous(), None);
    }

    #[test]
    fn test_disabled_always_misses() {
        let mut c = ValueCache::new();
        c.store(1, 10.0);
        c.set_enabled(false);
        assert!(!c.is_enabled());
        assert_eq!(c.lookup(1), Lookup::Miss);
        c.set_enabled(true);
        assert_eq!(c.lookup(1), Lookup::Hit(10.0));
    }

    #[test]
    fn test_clear() {
        let mut c = ValueCache::new();
        c.store(1, 10.0);
        c.clear();
        assert_eq!(c.current(), None);
        assert_eq!(c.lookup(1), Lookup::Miss);
    }
}
