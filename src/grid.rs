//! Cached grid (C6): a read-only, lazily-populated view of one source's
//! entire 2-D extent, expressed in widened `f64` values.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;

use crate::manager::CacheManager;
use crate::scheme::{DimensionPair, SchemeError, TilePosition};
use crate::source::TileSource;
use crate::tile::Tile;

/// Errors raised by `CachedGrid` operations.
#[derive(Debug, Error)]
pub enum GridError {
    /// A `data(start, count)` rectangle escaped the source's declared
    /// geometry.
    #[error(transparent)]
    Scheme(#[from] SchemeError),

    /// `set_value` was called; a cached grid is a read-only view.
    #[error("cached grid is read-only")]
    ReadOnly,
}

/// A read-only, tile-backed view over one source's full 2-D extent.
///
/// Values are widened to `f64` through `Tile::value_at` (honoring
/// `unsigned`). A single last-tile fast path is kept as a `Weak` reference
/// (Design Note 9, "Weak references") so repeated nearby reads skip the
/// cache manager without pinning a tile in memory against eviction.
pub struct CachedGrid {
    source: Arc<dyn TileSource>,
    manager: Arc<CacheManager>,
    unsigned: bool,
    last_tile: Mutex<Weak<Tile>>,
}

impl CachedGrid {
    pub fn new(source: Arc<dyn TileSource>, manager: Arc<CacheManager>, unsigned: bool) -> Self {
        Self {
            source,
            manager,
            unsigned,
            last_tile: Mutex::new(Weak::new()),
        }
    }

    pub fn dimensions(&self) -> DimensionPair {
        self.source.scheme().dimensions()
    }

    /// The value at global pixel (row, col), or `NaN` if the pixel is
    /// out of range or the backing tile could not be read.
    pub fn value(&self, row: u32, col: u32) -> f64 {
        match self.tile_for(row, col) {
            Some(tile) => tile.value_at(row, col, self.unsigned),
            None => f64::NAN,
        }
    }

    /// The value at flattened `index = row * cols + col`, or `NaN` if
    /// `index` is out of range.
    pub fn value_at_index(&self, index: u64) -> f64 {
        let cols = self.dimensions().cols as u64;
        if cols == 0 {
            return f64::NAN;
        }
        let row = index / cols;
        let col = index % cols;
        self.value(row as u32, col as u32)
    }

    /// Always fails: a cached grid is a read-only view over its source.
    pub fn set_value(&self, _row: u32, _col: u32, _value: f64) -> Result<(), GridError> {
        Err(GridError::ReadOnly)
    }

    /// Every value over the source's full extent, row-major.
    pub fn data(&self) -> Result<Vec<f64>, GridError> {
        let dims = self.dimensions();
        self.data_rect((0, 0), (dims.rows, dims.cols))
    }

    /// Every value in `[start, start + count)`, row-major, widened to
    /// `f64`. A position whose tile fails to read leaves its pixels as
    /// `NaN` rather than failing the whole call.
    pub fn data_rect(&self, start: (u32, u32), count: (u32, u32)) -> Result<Vec<f64>, GridError> {
        let covering = self.source.scheme().covering_positions(start, count)?;
        let mut out = vec![f64::NAN; count.0 as usize * count.1 as usize];

        for position in covering {
            let tile = match self.manager.get_tile(&self.source, &position) {
                Ok(tile) => tile,
                Err(err) => {
                    tracing::warn!(error = %err, "cached grid: tile read failed, leaving rect as NaN");
                    continue;
                }
            };

            let (tile_start_row, tile_start_col, tile_dims) = position.bounding_rect();
            let tile_end_row = tile_start_row + tile_dims.rows - 1;
            let tile_end_col = tile_start_col + tile_dims.cols - 1;

            let row_lo = tile_start_row.max(start.0);
            let row_hi = tile_end_row.min(start.0 + count.0 - 1);
            let col_lo = tile_start_col.max(start.1);
            let col_hi = tile_end_col.min(start.1 + count.1 - 1);

            for row in row_lo..=row_hi {
                for col in col_lo..=col_hi {
                    let value = tile.value_at(row, col, self.unsigned);
                    let out_row = (row - start.0) as usize;
                    let out_col = (col - start.1) as usize;
                    out[out_row * count.1 as usize + out_col] = value;
                }
            }
        }

        Ok(out)
    }

    /// Evicts every tile this grid has contributed to the cache and drops
    /// the last-tile fast path.
    pub fn dispose(&self) {
        self.manager.remove_tiles_for_source(&self.source);
        *self.last_tile.lock() = Weak::new();
    }

    fn tile_for(&self, row: u32, col: u32) -> Option<Arc<Tile>> {
        if let Some(tile) = self.last_tile.lock().upgrade() {
            if tile.contains(row, col) {
                return Some(tile);
            }
        }

        let position = self.source.scheme().position_for_coords(row, col).ok()?;
        let tile = self.manager.get_tile(&self.source, &position).ok()?;
        *self.last_tile.lock() = Arc::downgrade(&tile);
        Some(tile)
    }
}
