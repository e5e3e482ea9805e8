//! In-memory revoked-certificate set with atomic wholesale replacement.
//!
//! The cache holds exactly one published [`RevocationSet`]. Readers load a
//! snapshot through [`arc_swap::ArcSwap`], so a membership check never blocks
//! on a concurrent refresh and always observes either the fully-previous or
//! the fully-new set, never an interleaving. There is a single writer (the
//! loader), so replacement needs no coordination beyond the swap itself.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// An immutable, versioned set of revoked certificate fingerprints.
/// Once published it is never mutated; refresh builds a new set.
#[derive(Debug, Default)]
pub struct RevocationSet {
    hashes: HashSet<String>,
    generation: u64,
}

impl RevocationSet {
    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Generation 0 is the empty set the cache starts with; every replace
    /// increments it.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Concurrently readable holder of the currently published revocation set.
///
/// Explicitly constructed and injected into both the loader and the
/// validation hydrator; there is no process-wide instance.
#[derive(Debug, Default)]
pub struct RevocationCache {
    published: ArcSwap<RevocationSet>,
}

impl RevocationCache {
    /// Create a cache holding the empty generation-0 set. Until the first
    /// successful load, nothing is considered revoked.
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) membership check against the currently published set.
    pub fn is_revoked(&self, hash: &str) -> bool {
        self.published.load().contains(hash)
    }

    /// Atomically replace the published set with a new one built from
    /// `hashes`. Returns the new generation. Readers in flight keep the
    /// snapshot they loaded.
    pub fn replace(&self, hashes: HashSet<String>) -> u64 {
        // single writer, so load-then-store of the generation is race-free
        let generation = self.published.load().generation + 1;
        self.published.store(Arc::new(RevocationSet {
            hashes,
            generation,
        }));
        generation
    }

    /// Snapshot of the currently published set.
    pub fn snapshot(&self) -> Arc<RevocationSet> {
        self.published.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.published.load().generation
    }

    pub fn len(&self) -> usize {
        self.published.load().len()
    }

    /// Whether at least one load has been published since startup.
    pub fn has_loaded(&self) -> bool {
        self.generation() > 0
    }
}
