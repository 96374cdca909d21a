//! Deterministic test doubles shared across this crate's test suites and
//! available to integration tests under `tests/`.
//!
//! Not feature-gated: unlike a production dependency, a mock `TileSource` is
//! small, has no transitive footprint, and both the unit tests throughout
//! `src/` and the black-box tests in `tests/` need to construct one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::dtype::TilePayload;
use crate::scheme::{TilePosition, TilingScheme};
use crate::source::{SourceError, TileSource};
use crate::tile::Tile;

/// A `TileSource` backed by nothing but its own scheme: every tile it
/// "reads" is synthesized as zero-filled bytes. Used across the cache,
/// manager, delivery, and grid test suites.
pub struct MockTileSource {
    scheme: TilingScheme,
    read_count: AtomicUsize,
    fail_positions: Mutex<HashSet<(u32, u32)>>,
    read_latency: Mutex<Duration>,
}

impl MockTileSource {
    pub fn new(scheme: TilingScheme) -> Self {
        Self {
            scheme,
            read_count: AtomicUsize::new(0),
            fail_positions: Mutex::new(HashSet::new()),
            read_latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Makes `read_tile` return an I/O error for this (tileRow, tileCol),
    /// every time it is attempted.
    pub fn fail_at(&self, tile_row: u32, tile_col: u32) {
        self.fail_positions.lock().unwrap().insert((tile_row, tile_col));
    }

    /// Sets an artificial per-read delay, for exercising cancellation and
    /// concurrency scenarios.
    pub fn set_read_latency(&self, latency: Duration) {
        *self.read_latency.lock().unwrap() = latency;
    }

    /// Number of times `read_tile` has been invoked so far.
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }
}

impl TileSource for MockTileSource {
    fn read_tile(&self, position: &TilePosition) -> Result<Tile, SourceError> {
        self.check_scheme(position)?;
        self.read_count.fetch_add(1, Ordering::SeqCst);

        let latency = *self.read_latency.lock().unwrap();
        if !latency.is_zero() {
            thread::sleep(latency);
        }

        if self
            .fail_positions
            .lock()
            .unwrap()
            .contains(&(position.tile_row(), position.tile_col()))
        {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "mock induced failure",
            )));
        }

        let len = position.dims().element_count() as usize;
        Ok(Tile::new(position.clone(), TilePayload::Byte(vec![0; len])))
    }

    fn scheme(&self) -> &TilingScheme {
        &self.scheme
    }
}
