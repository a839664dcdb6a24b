//! Memoization of finished splits.

use std::collections::VecDeque;
use std::hash::BuildHasher;

use hashbrown::DefaultHashBuilder;
use tracing::debug;

use crate::error::SplitResult;
use crate::output::SplitOutput;
use crate::params::SplitParams;

/// Entries kept by [`PartsCache::default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    hash: u64,
    len: usize,
    params: [u64; 7],
}

/// Least-recently-used cache of split outputs keyed by input bytes and
/// parameters.
///
/// Failed runs are not cached.
#[derive(Debug)]
pub struct PartsCache {
    capacity: usize,
    hasher: DefaultHashBuilder,
    // Most recently used at the back.
    entries: VecDeque<(CacheKey, SplitOutput)>,
    hits: usize,
    misses: usize,
}

impl Default for PartsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl PartsCache {
    /// Cache holding at most `capacity` outputs; at least one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            hasher: DefaultHashBuilder::default(),
            entries: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    fn key(&self, bytes: &[u8], params: &SplitParams) -> CacheKey {
        CacheKey {
            hash: self.hasher.hash_one(bytes),
            len: bytes.len(),
            params: params.fingerprint(),
        }
    }

    /// Cached output for these bytes and parameters, marking it recently used.
    pub fn get(&mut self, bytes: &[u8], params: &SplitParams) -> Option<&SplitOutput> {
        let key = self.key(bytes, params);
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        let entry = self.entries.remove(pos)?;
        self.entries.push_back(entry);
        self.entries.back().map(|(_, out)| out)
    }

    /// Return the cached output, or compute, store and return it.
    ///
    /// # Errors
    ///
    /// Whatever `compute` returns; nothing is stored in that case.
    pub fn get_or_try_insert_with<F>(&mut self, bytes: &[u8], params: &SplitParams, compute: F) -> SplitResult<SplitOutput>
    where
        F: FnOnce() -> SplitResult<SplitOutput>,
    {
        if let Some(hit) = self.get(bytes, params) {
            let hit = hit.clone();
            self.hits += 1;
            debug!(len = bytes.len(), "parts cache hit");
            return Ok(hit);
        }
        self.misses += 1;
        let output = compute()?;
        let key = self.key(bytes, params);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, output.clone()));
        Ok(output)
    }

    /// Entries currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Lookups that had to compute.
    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
