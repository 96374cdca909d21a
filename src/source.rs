//! The tile source contract: reading individual tiles from an external
//! chunked/compressed container.
//!
//! Concrete container readers (GeoTIFF, NetCDF/HDF5, Zarr, ...) are out of
//! scope for this crate — see specification §1 — but every one of them
//! implements `TileSource`.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::scheme::{DimensionPair, TilePosition, TilingScheme};
use crate::tile::Tile;

/// Errors a `TileSource` can raise.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying container could not deliver the requested tile:
    /// unreachable, corrupt, or a short read.
    #[error("I/O error reading tile: {0}")]
    Io(#[from] io::Error),

    /// A position belonging to a different scheme was passed to this
    /// source. Always a caller bug.
    #[error("position belongs to scheme {position_scheme_id}, source expects scheme {source_scheme_id}")]
    SchemeMismatch {
        position_scheme_id: u64,
        source_scheme_id: u64,
    },
}

/// A handle to an external container plus enough state to read any tile of
/// its scheme.
///
/// Implementors own their container handle (file descriptor, HDF5/NetCDF
/// handle, etc.) and must serialize concurrent reads themselves if the
/// underlying library is not re-entrant — see `ContainerLock` below and
/// specification §9 ("Thread safety of underlying libraries").
pub trait TileSource: Send + Sync {
    /// Synchronously reads one tile. Must issue exactly one container read
    /// restricted to the tile's bounding box (in the full N-dimensional
    /// coordinate space, with non-slice dimensions fixed at this source's
    /// configured origin).
    fn read_tile(&self, position: &TilePosition) -> Result<Tile, SourceError>;

    /// The tiling scheme this source's tiles conform to.
    fn scheme(&self) -> &TilingScheme;

    /// Validates that `position` belongs to `self.scheme()`, returning
    /// `SchemeMismatch` otherwise. Implementors should call this at the top
    /// of `read_tile`.
    fn check_scheme(&self, position: &TilePosition) -> Result<(), SourceError> {
        // A position's scheme_id is only observable via equality against a
        // position drawn from the same scheme, so we compare against a
        // position this source's own scheme would produce at the same
        // coordinates.
        let expected = self
            .scheme()
            .position_for_index(position.tile_row(), position.tile_col());
        match expected {
            Ok(expected) if &expected == position => Ok(()),
            _ => Err(SourceError::SchemeMismatch {
                position_scheme_id: position.scheme_id(),
                source_scheme_id: self.scheme().id(),
            }),
        }
    }
}

/// The symmetric write-side contract, bordering the core but out of its
/// scope (specification §6).
pub trait TileSink: Send + Sync {
    fn write_tile(&self, tile: &Tile) -> Result<(), SourceError>;
    fn scheme(&self) -> &TilingScheme;
}

/// Hints a container reader provides about how a variable is physically
/// chunked, used to derive an appropriate tile size (specification §4.2).
#[derive(Debug, Clone, Copy)]
pub enum ChunkingHint {
    /// The variable is stored in fixed-size chunks along the two selected
    /// dimensions; tiles should align with chunk boundaries.
    Chunked { chunk_dims: DimensionPair },
    /// The variable's entire 2-D extent is a single compressed blob with no
    /// chunk boundaries; the whole slice must be decompressed at once.
    MonolithicCompressed,
    /// Neither chunked nor compressed.
    Neither,
}

/// Default tile edge length used when a variable is neither chunked nor
/// compressed (specification §4.2, step 3).
pub const DEFAULT_TILE_EDGE: u32 = 512;

/// Derives a source's tile dimensions from its chunking hint, per
/// specification §4.2:
///
/// 1. Chunked → the chunk dimensions.
/// 2. Monolithic compression → the whole global extent (one tile).
/// 3. Otherwise → `min(globalDims, 512)` element-wise.
pub fn derive_tile_dimensions(global_dims: DimensionPair, hint: ChunkingHint) -> DimensionPair {
    match hint {
        ChunkingHint::Chunked { chunk_dims } => chunk_dims,
        ChunkingHint::MonolithicCompressed => global_dims,
        ChunkingHint::Neither => DimensionPair::new(
            global_dims.rows.min(DEFAULT_TILE_EDGE),
            global_dims.cols.min(DEFAULT_TILE_EDGE),
        ),
    }
}

/// A reusable per-container lock for sources whose underlying library is
/// not re-entrant (specification §9, "Thread safety of underlying
/// libraries"). Source implementations embed one `Arc<ContainerLock>` per
/// open container handle and hold the guard for the duration of a single
/// container read.
#[derive(Debug, Default)]
pub struct ContainerLock(Mutex<()>);

impl ContainerLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(())))
    }

    /// Runs `f` while holding the container's lock.
    pub fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.0.lock();
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_chunked_uses_chunk_dims() {
        let global = DimensionPair::new(2048, 4096);
        let chunk = DimensionPair::new(256, 256);
        assert_eq!(
            derive_tile_dimensions(global, ChunkingHint::Chunked { chunk_dims: chunk }),
            chunk
        );
    }

    #[test]
    fn derive_monolithic_uses_global_dims() {
        let global = DimensionPair::new(362, 362);
        assert_eq!(
            derive_tile_dimensions(global, ChunkingHint::MonolithicCompressed),
            global
        );
    }

    #[test]
    fn derive_neither_caps_at_512() {
        let global = DimensionPair::new(2000, 100);
        assert_eq!(
            derive_tile_dimensions(global, ChunkingHint::Neither),
            DimensionPair::new(512, 100)
        );
    }

    #[test]
    fn container_lock_serializes_access() {
        let lock = ContainerLock::new();
        let result = lock.with_lock(|| 1 + 1);
        assert_eq!(result, 2);
    }
}
