//! Cache manager (C4): the process-wide entry point that owns the tile
//! cache and hands out delivery operations.

mod config;

pub use config::{CacheManagerConfig, ConfigError};

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::cache::{TileCache, TileCacheKey};
use crate::delivery::{DeliveryOperation, Observer};
use crate::scheme::{SchemeError, TilePosition};
use crate::source::{SourceError, TileSource};
use crate::tile::Tile;

static GLOBAL: OnceLock<Arc<CacheManager>> = OnceLock::new();

/// Owns a `TileCache` and mediates every tile fetch and delivery against it.
///
/// Per Design Note "Singletons and global state": rather than an
/// unconditional `static CACHE_MANAGER`, this is a plain, constructible
/// struct with a lazily-initialized process-wide accessor (`global()`).
/// Tests that want isolation just build their own with `CacheManager::new`
/// instead of touching the singleton at all.
pub struct CacheManager {
    cache: Arc<TileCache>,
}

impl CacheManager {
    pub fn new(cache_size_bytes: u64) -> Self {
        Self {
            cache: Arc::new(TileCache::new(cache_size_bytes)),
        }
    }

    pub fn from_config(config: CacheManagerConfig) -> Self {
        Self::new(config.cache_size_bytes)
    }

    /// The process-wide singleton, built from environment configuration on
    /// first access. Panics if the environment holds an unparseable
    /// override — configuration errors are fatal at initialization
    /// (specification §7), not a recoverable per-call error.
    pub fn global() -> Arc<CacheManager> {
        GLOBAL
            .get_or_init(|| {
                let config = CacheManagerConfig::from_env()
                    .unwrap_or_else(|err| panic!("invalid cache manager configuration: {err}"));
                info!(cache_size_bytes = config.cache_size_bytes, "initializing cache manager");
                Arc::new(Self::from_config(config))
            })
            .clone()
    }

    /// Installs `cache` as the backing store of the process-wide singleton,
    /// if one has not already been initialized by a prior `global()` or
    /// `install()` call; otherwise returns the existing singleton unchanged.
    /// Lets tests seed a manager with a specific capacity before any code
    /// reaches for `global()`.
    pub fn install(cache: Arc<TileCache>) -> Arc<CacheManager> {
        GLOBAL.get_or_init(|| Arc::new(Self { cache })).clone()
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Fetches the tile at `position` from `source`, consulting the cache
    /// first. On a miss, reads through `source` and caches the result
    /// before returning it. Two consecutive calls for the same
    /// (source, position) return the identical cached `Tile` (by `Arc`
    /// identity) and the second never invokes `source.read_tile`.
    pub fn get_tile(&self, source: &Arc<dyn TileSource>, position: &TilePosition) -> Result<Arc<Tile>, SourceError> {
        let key = TileCacheKey::new(Arc::clone(source), position.clone());
        if let Some(tile) = self.cache.get(&key) {
            return Ok(tile);
        }
        let tile = Arc::new(source.read_tile(position)?);
        self.cache.put(key, Arc::clone(&tile));
        Ok(tile)
    }

    /// Starts delivering every tile covering `[start, start + count)` from
    /// `source`.
    ///
    /// Positions already in the cache are delivered synchronously — via
    /// `observer.on_cached` — before this method returns. Every remaining
    /// position is handed to one `DeliveryOperation` (already started) that
    /// notifies `observer.on_delivered` from its own worker thread, in the
    /// covering positions' row-major order, as each tile is read; delivered
    /// tiles are cached as they arrive. Returns `None` if every covering
    /// position was already cached, in which case no delivery operation was
    /// needed.
    ///
    /// Concurrent misses for the same position are not deduplicated: two
    /// overlapping `request_tiles` calls may each spawn an operation that
    /// independently reads the same tile (specification §9, preserved
    /// limitation — see DESIGN.md).
    pub fn request_tiles(
        self: &Arc<Self>,
        source: Arc<dyn TileSource>,
        start: (u32, u32),
        count: (u32, u32),
        observer: Arc<dyn Observer>,
    ) -> Result<Option<Arc<DeliveryOperation>>, SchemeError> {
        let covering = source.scheme().covering_positions(start, count)?;
        let mut remainder = Vec::with_capacity(covering.len());
        for position in covering {
            let key = TileCacheKey::new(Arc::clone(&source), position.clone());
            match self.cache.get(&key) {
                Some(tile) => observer.on_cached(&position, &tile),
                None => remainder.push(position),
            }
        }

        if remainder.is_empty() {
            return Ok(None);
        }

        let op = DeliveryOperation::new(source, remainder);
        let caching_observer: Arc<dyn Observer> = Arc::new(CachingObserver {
            cache: Arc::clone(&self.cache),
            inner: observer,
        });
        op.start(caching_observer);
        Ok(Some(op))
    }

    /// Evicts every cached tile belonging to `source` (by identity).
    /// Returns the number of entries removed.
    pub fn remove_tiles_for_source(&self, source: &Arc<dyn TileSource>) -> usize {
        let removed = self.cache.remove_where(|key| key.source_is(source));
        if removed > 0 {
            debug!(removed, "removed cached tiles for disposed source");
        }
        removed
    }
}

/// Wraps a caller's observer so every tile a delivery operation reads is
/// cached before being forwarded.
struct CachingObserver {
    cache: Arc<TileCache>,
    inner: Arc<dyn Observer>,
}

impl Observer for CachingObserver {
    fn on_delivered(&self, op: &DeliveryOperation, position: &TilePosition, tile: Option<&Tile>) {
        if let Some(tile) = tile {
            let key = TileCacheKey::new(Arc::clone(op.source()), position.clone());
            self.cache.put(key, Arc::new(tile.clone()));
        }
        self.inner.on_delivered(op, position, tile);
    }
}
