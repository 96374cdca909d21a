//! Tile cache keys: (sourceIdentity, position), where source equality is by
//! *identity* of the source object, not value equality — two different
//! source objects referring to the same file are not equivalent keys.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::scheme::TilePosition;
use crate::source::TileSource;

/// A cache key pairing a source's identity with one of its tile positions.
#[derive(Clone)]
pub struct TileCacheKey {
    source: Arc<dyn TileSource>,
    position: TilePosition,
}

impl TileCacheKey {
    pub fn new(source: Arc<dyn TileSource>, position: TilePosition) -> Self {
        Self { source, position }
    }

    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    pub fn position(&self) -> &TilePosition {
        &self.position
    }

    /// Whether this key's source is the same object (by identity) as `source`.
    pub fn source_is(&self, source: &Arc<dyn TileSource>) -> bool {
        Arc::ptr_eq(&self.source, source)
    }

    /// The thin (data-only) address of the source, used as a stable hash
    /// input for a fat `Arc<dyn TileSource>` pointer.
    fn source_addr(&self) -> usize {
        Arc::as_ptr(&self.source) as *const u8 as usize
    }
}

impl PartialEq for TileCacheKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source) && self.position == other.position
    }
}

impl Eq for TileCacheKey {}

impl Hash for TileCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source_addr().hash(state);
        self.position.hash(state);
    }
}
