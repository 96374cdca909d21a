//! Tiling scheme: the mapping between a 2-D coordinate space and a set of
//! fixed-size rectangular tiles, including truncated edge tiles.

mod position;

pub use position::TilePosition;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

use self::position::PositionInner;

static NEXT_SCHEME_ID: AtomicU64 = AtomicU64::new(1);

/// A pair (rows, cols) of non-negative integers. Row index = 0, col index =
/// 1 throughout the crate, matching the specification's convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionPair {
    pub rows: u32,
    pub cols: u32,
}

impl DimensionPair {
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Total number of elements (`rows * cols`), widened to avoid overflow
    /// on large grids.
    pub fn element_count(self) -> u64 {
        self.rows as u64 * self.cols as u64
    }
}

/// Errors raised by `TilingScheme` coordinate resolution.
///
/// These always indicate a caller bug (an out-of-range coordinate, tile
/// index, or rectangle) and are never recovered internally — see
/// specification §7, "coordinate-out-of-range" errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemeError {
    #[error("pixel ({row}, {col}) is outside global dimensions {dims:?}")]
    PixelOutOfRange {
        row: u32,
        col: u32,
        dims: DimensionPair,
    },

    #[error("tile index ({tile_row}, {tile_col}) is outside tile counts {counts:?}")]
    TileIndexOutOfRange {
        tile_row: u32,
        tile_col: u32,
        counts: DimensionPair,
    },

    #[error("rectangle start={start:?} count={count:?} escapes global dimensions {dims:?}")]
    RectangleOutOfRange {
        start: (u32, u32),
        count: (u32, u32),
        dims: DimensionPair,
    },

    #[error("rectangle count must be positive in both dimensions, got {0:?}")]
    NonPositiveCount((u32, u32)),
}

/// The immutable partitioning of a `globalDims` 2-D space into `tileDims`
/// tiles, including truncated edge tiles.
///
/// Constructed once and shared; every `TilePosition` it produces is
/// pre-materialized at construction time (one per (tileRow, tileCol) pair)
/// and handed out as a cheap `Arc` clone on every subsequent lookup — this
/// both eliminates per-read allocation and makes position equality a cheap
/// identity-style comparison (see specification §4.1 rationale).
#[derive(Clone)]
pub struct TilingScheme {
    id: u64,
    global_dims: DimensionPair,
    tile_dims: DimensionPair,
    tile_counts: DimensionPair,
    positions: Arc<Vec<TilePosition>>,
}

impl TilingScheme {
    /// Builds a new scheme over `global_dims`, partitioned into `tile_dims`
    /// tiles. `tile_dims` components must be non-zero; `global_dims` may be
    /// zero in either axis only if the other axis is also zero (an empty
    /// scheme with no positions).
    pub fn new(global_dims: DimensionPair, tile_dims: DimensionPair) -> Self {
        assert!(tile_dims.rows > 0 && tile_dims.cols > 0, "tile dimensions must be non-zero");

        let tile_counts = DimensionPair::new(
            div_ceil(global_dims.rows, tile_dims.rows),
            div_ceil(global_dims.cols, tile_dims.cols),
        );

        let id = NEXT_SCHEME_ID.fetch_add(1, Ordering::Relaxed);

        let mut positions = Vec::with_capacity((tile_counts.rows as usize) * (tile_counts.cols as usize));
        for tile_row in 0..tile_counts.rows {
            for tile_col in 0..tile_counts.cols {
                let start = (tile_row * tile_dims.rows, tile_col * tile_dims.cols);
                let eff_rows = effective_len(tile_row, tile_counts.rows, tile_dims.rows, global_dims.rows);
                let eff_cols = effective_len(tile_col, tile_counts.cols, tile_dims.cols, global_dims.cols);
                let dims = DimensionPair::new(eff_rows, eff_cols);
                let end = (start.0 + dims.rows - 1, start.1 + dims.cols - 1);

                positions.push(TilePosition(Arc::new(PositionInner {
                    scheme_id: id,
                    tile_row,
                    tile_col,
                    dims,
                    start,
                    end,
                    tile_counts_cols: tile_counts.cols,
                    nominal_tile_dims: tile_dims,
                })));
            }
        }

        Self {
            id,
            global_dims,
            tile_dims,
            tile_counts,
            positions: Arc::new(positions),
        }
    }

    /// This scheme's unique identity, used to fold scheme equality into
    /// `TilePosition` equality without a back-reference.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dimensions(&self) -> DimensionPair {
        self.global_dims
    }

    pub fn tile_dimensions(&self) -> DimensionPair {
        self.tile_dims
    }

    pub fn tile_counts(&self) -> DimensionPair {
        self.tile_counts
    }

    /// Total number of tiles in the scheme (`tileCounts.rows * tileCounts.cols`).
    pub fn tile_count(&self) -> usize {
        self.positions.len()
    }

    fn index_of(&self, tile_row: u32, tile_col: u32) -> usize {
        tile_row as usize * self.tile_counts.cols as usize + tile_col as usize
    }

    /// The shared position whose tile contains pixel (row, col).
    pub fn position_for_coords(&self, row: u32, col: u32) -> Result<TilePosition, SchemeError> {
        if row >= self.global_dims.rows || col >= self.global_dims.cols {
            return Err(SchemeError::PixelOutOfRange {
                row,
                col,
                dims: self.global_dims,
            });
        }
        let tile_row = row / self.tile_dims.rows;
        let tile_col = col / self.tile_dims.cols;
        Ok(self.positions[self.index_of(tile_row, tile_col)].clone())
    }

    /// The shared position at tile indices (tileRow, tileCol).
    pub fn position_for_index(&self, tile_row: u32, tile_col: u32) -> Result<TilePosition, SchemeError> {
        if tile_row >= self.tile_counts.rows || tile_col >= self.tile_counts.cols {
            return Err(SchemeError::TileIndexOutOfRange {
                tile_row,
                tile_col,
                counts: self.tile_counts,
            });
        }
        Ok(self.positions[self.index_of(tile_row, tile_col)].clone())
    }

    /// A snapshot list of every position in the scheme, in row-major
    /// (tileRow, then tileCol) order.
    pub fn all_positions(&self) -> Vec<TilePosition> {
        self.positions.as_ref().clone()
    }

    /// The minimal ordered list of positions whose tiles collectively cover
    /// the rectangle `[start, start + count)`, in row-major order.
    pub fn covering_positions(
        &self,
        start: (u32, u32),
        count: (u32, u32),
    ) -> Result<Vec<TilePosition>, SchemeError> {
        if count.0 == 0 || count.1 == 0 {
            return Err(SchemeError::NonPositiveCount(count));
        }
        let end_row = start.0.checked_add(count.0);
        let end_col = start.1.checked_add(count.1);
        let (end_row, end_col) = match (end_row, end_col) {
            (Some(r), Some(c)) => (r, c),
            _ => {
                return Err(SchemeError::RectangleOutOfRange {
                    start,
                    count,
                    dims: self.global_dims,
                })
            }
        };
        if end_row > self.global_dims.rows || end_col > self.global_dims.cols {
            return Err(SchemeError::RectangleOutOfRange {
                start,
                count,
                dims: self.global_dims,
            });
        }

        let first_tile_row = start.0 / self.tile_dims.rows;
        let last_tile_row = (end_row - 1) / self.tile_dims.rows;
        let first_tile_col = start.1 / self.tile_dims.cols;
        let last_tile_col = (end_col - 1) / self.tile_dims.cols;

        let mut result =
            Vec::with_capacity(((last_tile_row - first_tile_row + 1) * (last_tile_col - first_tile_col + 1)) as usize);
        for tile_row in first_tile_row..=last_tile_row {
            for tile_col in first_tile_col..=last_tile_col {
                result.push(self.positions[self.index_of(tile_row, tile_col)].clone());
            }
        }
        Ok(result)
    }
}

fn div_ceil(numerator: u32, denominator: u32) -> u32 {
    if numerator == 0 {
        0
    } else {
        (numerator + denominator - 1) / denominator
    }
}

fn effective_len(tile_index: u32, tile_count: u32, tile_dim: u32, global_dim: u32) -> u32 {
    if tile_index + 1 == tile_count {
        let remainder = global_dim % tile_dim;
        if remainder == 0 {
            tile_dim
        } else {
            remainder
        }
    } else {
        tile_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_geometry_scenario() {
        // spec.md §8 scenario 1
        let scheme = TilingScheme::new(DimensionPair::new(100, 200), DimensionPair::new(40, 40));
        assert_eq!(scheme.tile_counts(), DimensionPair::new(3, 5));

        let pos = scheme.position_for_coords(85, 30).unwrap();
        assert_eq!((pos.tile_row(), pos.tile_col()), (2, 0));
        assert_eq!(pos.dims(), DimensionPair::new(20, 40));
        assert_eq!(pos.start(), (80, 0));
        assert!(pos.contains(82, 5));
        assert!(!pos.contains(79, 5));
    }

    #[test]
    fn truncated_edge_tiles_report_truncated_dims() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 200), DimensionPair::new(40, 40));
        let counts = scheme.tile_counts();

        let last_row_tile = scheme.position_for_index(counts.rows - 1, 0).unwrap();
        assert_eq!(last_row_tile.dims().rows, 100 % 40);

        let last_col_tile = scheme.position_for_index(0, counts.cols - 1).unwrap();
        assert_eq!(last_col_tile.dims().cols, 200 % 40);
    }

    #[test]
    fn exact_multiple_edge_tiles_are_full_size() {
        let scheme = TilingScheme::new(DimensionPair::new(80, 80), DimensionPair::new(40, 40));
        let counts = scheme.tile_counts();
        assert_eq!(counts, DimensionPair::new(2, 2));
        let last = scheme.position_for_index(1, 1).unwrap();
        assert_eq!(last.dims(), DimensionPair::new(40, 40));
    }

    #[test]
    fn position_for_coords_out_of_range() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 200), DimensionPair::new(40, 40));
        assert!(scheme.position_for_coords(100, 0).is_err());
        assert!(scheme.position_for_coords(0, 200).is_err());
    }

    #[test]
    fn position_for_index_out_of_range() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 200), DimensionPair::new(40, 40));
        assert!(scheme.position_for_index(3, 0).is_err());
        assert!(scheme.position_for_index(0, 5).is_err());
    }

    #[test]
    fn every_pixel_is_contained_by_exactly_one_position() {
        let scheme = TilingScheme::new(DimensionPair::new(37, 53), DimensionPair::new(10, 12));
        for row in 0..37 {
            for col in 0..53 {
                let pos = scheme.position_for_coords(row, col).unwrap();
                assert!(pos.contains(row, col));
            }
        }
    }

    #[test]
    fn positions_partition_exactly_covers_global_area() {
        let scheme = TilingScheme::new(DimensionPair::new(37, 53), DimensionPair::new(10, 12));
        let total: u64 = scheme
            .all_positions()
            .iter()
            .map(|p| p.dims().element_count())
            .sum();
        assert_eq!(total, scheme.dimensions().element_count());
    }

    #[test]
    fn positions_are_shared_not_copied() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 100), DimensionPair::new(40, 40));
        let a = scheme.position_for_index(1, 1).unwrap();
        let b = scheme.position_for_index(1, 1).unwrap();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn positions_from_different_schemes_never_equal() {
        let s1 = TilingScheme::new(DimensionPair::new(100, 100), DimensionPair::new(40, 40));
        let s2 = TilingScheme::new(DimensionPair::new(100, 100), DimensionPair::new(40, 40));
        let a = s1.position_for_index(0, 0).unwrap();
        let b = s2.position_for_index(0, 0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn covering_positions_rejects_non_positive_count() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 100), DimensionPair::new(40, 40));
        assert!(scheme.covering_positions((0, 0), (0, 10)).is_err());
    }

    #[test]
    fn covering_positions_rejects_out_of_range_rectangle() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 100), DimensionPair::new(40, 40));
        assert!(scheme.covering_positions((90, 90), (20, 20)).is_err());
    }

    #[test]
    fn covering_positions_minimal_and_ordered() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 200), DimensionPair::new(40, 40));
        let covering = scheme.covering_positions((35, 5), (10, 10)).unwrap();
        // A single small rectangle entirely inside tile (0,0) needs exactly one tile.
        assert_eq!(covering.len(), 1);
        assert_eq!((covering[0].tile_row(), covering[0].tile_col()), (0, 0));
    }

    #[test]
    fn monolithic_source_tile_dims_equal_global_dims() {
        // boundary scenario: a monolithically-compressed variable has one tile.
        let global = DimensionPair::new(362, 362);
        let scheme = TilingScheme::new(global, global);
        assert_eq!(scheme.tile_count(), 1);
        assert_eq!(scheme.tile_dimensions(), global);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Positions always partition the global area exactly, for any
            /// combination of global/tile dimensions (including mismatched
            /// sizes that force truncated edge tiles).
            #[test]
            fn positions_partition_area_for_any_dims(
                global_rows in 1u32..300,
                global_cols in 1u32..300,
                tile_rows in 1u32..80,
                tile_cols in 1u32..80,
            ) {
                let scheme = TilingScheme::new(
                    DimensionPair::new(global_rows, global_cols),
                    DimensionPair::new(tile_rows, tile_cols),
                );
                let total: u64 = scheme.all_positions().iter().map(|p| p.dims().element_count()).sum();
                prop_assert_eq!(total, scheme.dimensions().element_count());
            }

            /// Every pixel sampled from a random scheme resolves to a
            /// position that actually contains it, and that position's
            /// payload index is within the nominal tile's element count.
            #[test]
            fn random_pixel_resolves_to_a_containing_position(
                global_rows in 1u32..300,
                global_cols in 1u32..300,
                tile_rows in 1u32..80,
                tile_cols in 1u32..80,
                sample_row in 0u32..300,
                sample_col in 0u32..300,
            ) {
                let scheme = TilingScheme::new(
                    DimensionPair::new(global_rows, global_cols),
                    DimensionPair::new(tile_rows, tile_cols),
                );
                let row = sample_row % global_rows;
                let col = sample_col % global_cols;
                let pos = scheme.position_for_coords(row, col).unwrap();
                prop_assert!(pos.contains(row, col));
                prop_assert!(pos.payload_index(row, col) < (tile_rows as usize) * (tile_cols as usize));
            }

            /// `covering_positions` over the whole global rectangle always
            /// returns every position the scheme has, in row-major order.
            #[test]
            fn covering_the_whole_rectangle_returns_every_position(
                global_rows in 1u32..200,
                global_cols in 1u32..200,
                tile_rows in 1u32..60,
                tile_cols in 1u32..60,
            ) {
                let scheme = TilingScheme::new(
                    DimensionPair::new(global_rows, global_cols),
                    DimensionPair::new(tile_rows, tile_cols),
                );
                let covering = scheme
                    .covering_positions((0, 0), (global_rows, global_cols))
                    .unwrap();
                prop_assert_eq!(covering, scheme.all_positions());
            }
        }
    }
}
