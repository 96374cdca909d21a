//! Observability counters for a `TileCache` — additive, does not affect
//! cache semantics. Mirrors the teacher's `cache::CacheStats` /
//! `MemoryCache::stats()` shape.

/// Point-in-time snapshot of cache hit/miss/eviction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub puts: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }
}
