//! Error types shared across the tile cache core.
//!
//! Each subsystem keeps its own narrow error enum (see `scheme`, `source`,
//! `grid`, `manager::config`); `CoreError` unifies them at the boundaries
//! that can surface any of several subsystem failures. `TileCache` itself
//! has no error enum — every one of its operations is infallible by
//! construction (capacity and byte accounting are internal bookkeeping, not
//! caller-observable failure modes).

use thiserror::Error;

use crate::grid::GridError;
use crate::manager::ConfigError;
use crate::scheme::SchemeError;
use crate::source::SourceError;

/// Errors that can cross subsystem boundaries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A coordinate, tile index, or rectangle escaped the scheme's declared
    /// geometry. Always a caller bug; never recovered internally.
    #[error(transparent)]
    Scheme(#[from] SchemeError),

    /// The underlying container could not deliver a tile, or a position
    /// belonging to a different scheme was passed to a source.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A cached grid operation failed (read-only mutation, out-of-range
    /// rectangle).
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The cache manager could not be initialized from configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
