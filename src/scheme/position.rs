//! Tile positions: the shared, pre-materialized (tileRow, tileCol) handles
//! produced by a `TilingScheme`.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::DimensionPair;

/// The immutable data behind a single tile position.
///
/// `scheme_id` is the owning scheme's identity (see `TilingScheme::id`); it
/// is folded into `Hash`/`Eq` so that positions from different schemes never
/// compare equal even if their coordinates coincide, matching "Two positions
/// are equal iff both coordinates match and they belong to the same scheme."
#[derive(Debug)]
pub(crate) struct PositionInner {
    pub(crate) scheme_id: u64,
    pub(crate) tile_row: u32,
    pub(crate) tile_col: u32,
    pub(crate) dims: DimensionPair,
    pub(crate) start: (u32, u32),
    pub(crate) end: (u32, u32),
    /// Tile counts of the owning scheme, cached here so `tile_index()` (the
    /// spec's defined hash, `tileRow * tileCounts[c] + tileCol`) does not
    /// need a back-reference to the scheme.
    pub(crate) tile_counts_cols: u32,
    /// The scheme's nominal (untruncated) tile dimensions, cached here so
    /// `payload_index()` does not need a back-reference to the scheme.
    pub(crate) nominal_tile_dims: DimensionPair,
}

/// A tile's position within a `TilingScheme`.
///
/// Positions are produced once per (tileRow, tileCol) by the owning scheme
/// and handed out as cheap `Arc` clones — see Design Note 9
/// ("Cyclic references / inner-class back pointers"): rather than a position
/// holding a back-reference to its scheme, the scheme hands out pre-built,
/// reference-counted position values with no pointer back to their owner.
/// Equality degrades to comparing (scheme identity, tileRow, tileCol).
#[derive(Debug, Clone)]
pub struct TilePosition(pub(crate) Arc<PositionInner>);

impl TilePosition {
    /// The tile's row index within the scheme's tile grid.
    pub fn tile_row(&self) -> u32 {
        self.0.tile_row
    }

    /// The tile's column index within the scheme's tile grid.
    pub fn tile_col(&self) -> u32 {
        self.0.tile_col
    }

    /// Effective dimensions of this tile, honoring edge truncation.
    pub fn dims(&self) -> DimensionPair {
        self.0.dims
    }

    /// Global-coordinate (row, col) of this tile's first pixel.
    pub fn start(&self) -> (u32, u32) {
        self.0.start
    }

    /// Global-coordinate (row, col) of this tile's last pixel (inclusive).
    pub fn end(&self) -> (u32, u32) {
        self.0.end
    }

    /// `tileRow * tileCounts[c] + tileCol`, as defined by the specification.
    pub fn tile_index(&self) -> u64 {
        self.0.tile_row as u64 * self.0.tile_counts_cols as u64 + self.0.tile_col as u64
    }

    /// The identity of the scheme this position was produced by, used only
    /// to report scheme-mismatch errors (see `source::TileSource::check_scheme`).
    pub(crate) fn scheme_id(&self) -> u64 {
        self.0.scheme_id
    }

    /// Whether global pixel (row, col) falls inside this tile's bounds.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.0.start.0 && row <= self.0.end.0 && col >= self.0.start.1 && col <= self.0.end.1
    }

    /// The 1-D payload index for a pixel known to be contained in this tile.
    ///
    /// `(row mod tileDims[r]) * dims[c] + (col mod tileDims[c])`. The modulus
    /// uses the scheme's *nominal* tile dimensions, not this tile's
    /// (possibly truncated) effective dimensions, per the specification.
    pub fn payload_index(&self, row: u32, col: u32) -> usize {
        let local_row = row % self.0.nominal_tile_dims.rows;
        let local_col = col % self.0.nominal_tile_dims.cols;
        (local_row as usize) * (self.0.dims.cols as usize) + local_col as usize
    }

    /// This tile's bounding rectangle in global coordinates, as (start, dims).
    pub fn bounding_rect(&self) -> (u32, u32, DimensionPair) {
        (self.0.start.0, self.0.start.1, self.0.dims)
    }
}

impl PartialEq for TilePosition {
    fn eq(&self, other: &Self) -> bool {
        self.0.scheme_id == other.0.scheme_id
            && self.0.tile_row == other.0.tile_row
            && self.0.tile_col == other.0.tile_col
    }
}

impl Eq for TilePosition {}

impl Hash for TilePosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.scheme_id.hash(state);
        self.0.tile_row.hash(state);
        self.0.tile_col.hash(state);
    }
}
