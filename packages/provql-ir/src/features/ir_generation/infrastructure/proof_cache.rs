//! LRU cache of proof blobs
//!
//! Keyed by `(method, evidence, type, value)`. Blob contents are a pure
//! function of the key, so a hit returns exactly what a fresh mint would.

use crate::features::ir_generation::domain::ProofBlob;
use crate::features::smt::VerificationMethod;
use crate::shared::models::TypedValue;
use lru::LruCache;
use std::num::NonZeroUsize;

type CacheKey = (VerificationMethod, String, String, String);

pub struct ProofCache {
    /// `None` when caching is disabled (capacity 0)
    cache: Option<LruCache<CacheKey, ProofBlob>>,
    hits: usize,
    misses: usize,
}

impl ProofCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Cached blob for `value`, minting it with `mint` on a miss
    pub fn get_or_mint(
        &mut self,
        method: VerificationMethod,
        evidence: &str,
        value: &TypedValue,
        mint: impl FnOnce() -> ProofBlob,
    ) -> ProofBlob {
        let Some(cache) = self.cache.as_mut() else {
            return mint();
        };
        let key = (
            method,
            evidence.to_string(),
            value.ty().to_string(),
            value.value().to_string(),
        );
        if let Some(blob) = cache.get(&key) {
            self.hits += 1;
            tracing::trace!(ty = %key.2, "proof cache hit");
            return blob.clone();
        }
        self.misses += 1;
        let blob = mint();
        cache.put(key, blob.clone());
        blob
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit rate (0.0-1.0)
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }

    pub fn clear(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
        self.hits = 0;
        self.misses = 0;
    }
}
