//! Per-run patch cache.
//!
//! The source layer is free to re-read the same patch many times; the cache
//! memoizes reads keyed by the geometry level actually used, the basis name
//! and the patch index. Entries are never invalidated within a run and the
//! cache is never shared across runs. Cached patches are immutable; callers
//! clone before mutating.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::data::patch::Patch;

/// Cache key: (geometry update step, basis name, patch index).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatchKey {
    pub step: usize,
    pub basis: String,
    pub index: usize,
}

/// Bounded-lifetime memo of patches read during one conversion run.
#[derive(Clone, Debug, Default)]
pub struct PatchCache {
    map: HashMap<PatchKey, Arc<Patch>>,
}

impl PatchCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached patch.
    #[inline]
    pub fn get(&self, key: &PatchKey) -> Option<Arc<Patch>> {
        self.map.get(key).cloned()
    }

    /// Insert a freshly read patch, returning the shared handle.
    pub fn insert(&mut self, key: PatchKey, patch: Patch) -> Arc<Patch> {
        let arc = Arc::new(patch);
        self.map.insert(key, arc.clone());
        arc
    }

    /// Number of cached patches.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no patches.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
