//! Bounded memo of one-shot book summaries.
//!
//! Keys are content addresses: a BLAKE3 digest over the book title and the
//! model name. Eviction is delegated to `moka`. A capacity of zero disables
//! caching entirely.

use bookgraph_core::llm::{self, CompletionGateway};
use bookgraph_core::{CompletionError, CompletionErrorKind, Error, KnowledgeGraph, Result};
use moka::future::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::prompts;

/// Default number of cached graphs.
pub const DEFAULT_CAPACITY: usize = 64;

/// Content address of a `(book_title, model)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derives the key for a book and model.
    pub fn new(book_title: &str, model: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(book_title.len() as u64).to_le_bytes());
        hasher.update(book_title.as_bytes());
        hasher.update(model.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

/// Hit and occupancy counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that required generation
    pub misses: u64,
    /// Entries currently held
    pub entries: u64,
    /// Maximum entries held
    pub capacity: usize,
}

/// Cache of summary graphs keyed by `(book_title, model)`.
///
/// Clones share the same entries and counters.
#[derive(Clone)]
pub struct SummaryCache {
    cache: Option<Cache<CacheKey, KnowledgeGraph>>,
    capacity: usize,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SummaryCache {
    /// Creates a cache holding at most `capacity` graphs.
    pub fn new(capacity: usize) -> Self {
        let cache = (capacity > 0).then(|| Cache::builder().max_capacity(capacity as u64).build());

        Self {
            cache,
            capacity,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Looks up a cached graph.
    pub async fn get(&self, book_title: &str, model: &str) -> Option<KnowledgeGraph> {
        let found = match &self.cache {
            Some(cache) => cache.get(&CacheKey::new(book_title, model)).await,
            None => None,
        };
        match found {
            Some(graph) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(graph)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a graph.
    pub async fn insert(&self, book_title: &str, model: &str, graph: KnowledgeGraph) {
        if let Some(cache) = &self.cache {
            cache.insert(CacheKey::new(book_title, model), graph).await;
        }
    }

    /// Returns the cached summary or generates, stores and returns one.
    ///
    /// Concurrent callers asking for the same key share one generation.
    /// Failures are not cached.
    pub async fn get_or_generate(
        &self,
        book_title: &str,
        model: &str,
        gateway: &dyn CompletionGateway,
    ) -> Result<KnowledgeGraph> {
        let Some(cache) = &self.cache else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return summarize(book_title, model, gateway).await;
        };

        let generated = AtomicBool::new(false);
        let result = cache
            .try_get_with(CacheKey::new(book_title, model), async {
                generated.store(true, Ordering::Relaxed);
                tracing::info!(book = %book_title, model = %model, "Summary cache miss, generating");
                summarize(book_title, model, gateway).await
            })
            .await;

        if generated.load(Ordering::Relaxed) {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(book = %book_title, model = %model, "Summary cache hit");
        }

        result.map_err(unshare)
    }

    /// Drops every entry and resets counters.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Current counters, after pending evictions have been applied.
    pub async fn stats(&self) -> CacheStats {
        let entries = match &self.cache {
            Some(cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries,
            capacity: self.capacity,
        }
    }
}

async fn summarize(
    book_title: &str,
    model: &str,
    gateway: &dyn CompletionGateway,
) -> Result<KnowledgeGraph> {
    let messages = prompts::summary_messages(book_title);
    llm::complete(gateway, model, messages)
        .await
        .map_err(Error::generation)
}

// Waiters that joined someone else's failed generation only see a shared
// error; they get a copy carrying the same kind and message.
fn unshare(shared: Arc<Error>) -> Error {
    Arc::try_unwrap(shared).unwrap_or_else(|shared| {
        let kind = shared
            .completion()
            .map_or(CompletionErrorKind::Transport, |source| source.kind);
        Error::generation(CompletionError::new(kind, shared.to_string()))
    })
}
