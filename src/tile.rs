//! A single rectangular subregion of a 2-D variable, read or written as one
//! I/O unit.

use crate::dtype::{ElementType, TilePayload};
use crate::scheme::{DimensionPair, TilePosition};

/// (position, payload, dirty). The core never interprets `dirty` — it
/// exists purely for sink implementors that need to track unflushed writes.
#[derive(Debug, Clone)]
pub struct Tile {
    position: TilePosition,
    payload: TilePayload,
    dirty: bool,
}

impl Tile {
    /// Builds a tile, asserting that the payload's element count matches
    /// `position.dims()`. This is the one place that invariant is checked —
    /// every other consumer trusts it once a `Tile` exists.
    pub fn new(position: TilePosition, payload: TilePayload) -> Self {
        let expected = position.dims().element_count() as usize;
        assert_eq!(
            payload.len(),
            expected,
            "tile payload length {} does not match position dims {:?} ({} elements)",
            payload.len(),
            position.dims(),
            expected,
        );
        Self {
            position,
            payload,
            dirty: false,
        }
    }

    /// Builds a tile already marked dirty (used by sink writers staging an
    /// unflushed tile).
    pub fn new_dirty(position: TilePosition, payload: TilePayload) -> Self {
        let mut tile = Self::new(position, payload);
        tile.dirty = true;
        tile
    }

    pub fn position(&self) -> &TilePosition {
        &self.position
    }

    pub fn payload(&self) -> &TilePayload {
        &self.payload
    }

    pub fn element_type(&self) -> ElementType {
        self.payload.element_type()
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Total payload size in bytes: `payload.len() * element_size_bytes`.
    pub fn byte_len(&self) -> usize {
        self.payload.byte_len()
    }

    /// Whether global pixel (row, col) falls inside this tile.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.position.contains(row, col)
    }

    /// The 1-D payload index for a pixel known to be contained in this tile.
    pub fn payload_index(&self, row: u32, col: u32) -> usize {
        self.position.payload_index(row, col)
    }

    /// This tile's bounding rectangle in global coordinates, as (start_row,
    /// start_col, dims).
    pub fn bounding_rect(&self) -> (u32, u32, DimensionPair) {
        self.position.bounding_rect()
    }

    /// Widen the element at global pixel (row, col) to `f64`. Panics if the
    /// pixel is not contained in this tile — callers must check `contains`
    /// first (the cached grid always does, via the scheme's dispatch).
    pub fn value_at(&self, row: u32, col: u32, unsigned: bool) -> f64 {
        debug_assert!(self.contains(row, col));
        self.payload.widen(self.payload_index(row, col), unsigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::TilingScheme;

    #[test]
    fn tile_reports_byte_len_by_dtype() {
        let scheme = TilingScheme::new(DimensionPair::new(362, 362), DimensionPair::new(362, 362));
        let pos = scheme.position_for_index(0, 0).unwrap();
        let tile = Tile::new(pos, TilePayload::Double(vec![0.0; 362 * 362]));
        assert_eq!(tile.byte_len(), 362 * 362 * 8);
    }

    #[test]
    #[should_panic]
    fn tile_new_panics_on_payload_length_mismatch() {
        let scheme = TilingScheme::new(DimensionPair::new(100, 100), DimensionPair::new(40, 40));
        let pos = scheme.position_for_index(0, 0).unwrap();
        let _ = Tile::new(pos, TilePayload::Byte(vec![0; 10]));
    }

    #[test]
    fn value_at_roundtrips_through_payload_index() {
        let scheme = TilingScheme::new(DimensionPair::new(4, 4), DimensionPair::new(2, 2));
        let pos = scheme.position_for_index(1, 1).unwrap(); // covers rows 2-3, cols 2-3
        let tile = Tile::new(pos, TilePayload::Int(vec![10, 20, 30, 40]));
        assert_eq!(tile.value_at(2, 2, false), 10.0);
        assert_eq!(tile.value_at(2, 3, false), 20.0);
        assert_eq!(tile.value_at(3, 2, false), 30.0);
        assert_eq!(tile.value_at(3, 3, false), 40.0);
    }
}
