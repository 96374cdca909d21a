//! # rastercache
//!
//! A tiled, size-bounded, asynchronously-fed cache for large 2-D
//! gridded/swath data such as satellite imagery bands, elevation models, and
//! other remote-sensing rasters.
//!
//! The crate is organized around six cooperating components:
//!
//! - [`scheme`] — `TilingScheme` / `TilePosition`: the coordinate mapping
//!   between a 2-D pixel space and a grid of (possibly edge-truncated)
//!   tiles.
//! - [`source`] — `TileSource` / `TileSink`: the contract a concrete
//!   container reader (GeoTIFF, NetCDF, Zarr, ...) implements to supply
//!   tiles; concrete readers are out of scope for this crate.
//! - [`cache`] — `TileCache`: a size-bounded, strictly least-recently-used
//!   cache keyed by (source identity, position).
//! - [`manager`] — `CacheManager`: the process-wide entry point that owns a
//!   `TileCache` and mediates every fetch and delivery against it.
//! - [`delivery`] — `DeliveryOperation` / `Observer`: an asynchronous,
//!   cancellable producer of tiles for a list of positions.
//! - [`grid`] — `CachedGrid`: a read-only, lazily-populated view over one
//!   source's full extent, widened to `f64`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rastercache::manager::CacheManager;
//! use rastercache::grid::CachedGrid;
//! use rastercache::source::TileSource;
//!
//! fn example(source: Arc<dyn TileSource>) {
//!     let manager = CacheManager::global();
//!     let grid = CachedGrid::new(source, manager, false);
//!     let value = grid.value(10, 20);
//!     println!("{value}");
//! }
//! ```
//!
//! Concrete file-format readers, projections, rendering, and CLI tooling are
//! the responsibility of callers; this crate only implements the cache
//! core.

pub mod cache;
pub mod delivery;
pub mod dtype;
pub mod error;
pub mod grid;
pub mod logging;
pub mod manager;
pub mod scheme;
pub mod source;
pub mod testing;
pub mod tile;

pub use cache::{CacheStats, TileCache, TileCacheKey};
pub use delivery::{DeliveryOperation, DeliveryState, Observer};
pub use dtype::{ElementType, TilePayload};
pub use error::CoreError;
pub use grid::{CachedGrid, GridError};
pub use manager::{CacheManager, CacheManagerConfig, ConfigError};
pub use scheme::{DimensionPair, SchemeError, TilePosition, TilingScheme};
pub use source::{ChunkingHint, ContainerLock, SourceError, TileSink, TileSource};
pub use tile::Tile;
