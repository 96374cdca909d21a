//! Delivery operation: an asynchronous, cancellable producer of tiles for a
//! list of positions, run on a single dedicated worker thread.
//!
//! Per specification §9 ("Async delivery"): a single worker thread per
//! operation is sufficient here — the bottleneck is tile I/O, not
//! scheduling — so this crate does not pull in an async runtime for it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::scheme::TilePosition;
use crate::source::TileSource;
use crate::tile::Tile;

/// The delivery operation's lifecycle state.
///
/// ```text
/// NOT_STARTED --start()--> RUNNING --all positions read--> FINISHED
///                             |--cancel()--> CANCELLED (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    NotStarted,
    Running,
    Cancelled,
    Finished,
}

/// Receives tile notifications from the cache manager and delivery
/// operations.
///
/// This splits the specification's single `update(source, item)` observer
/// method into two, one per delivery phase, rather than encoding "already
/// cached" as a `source: null` sentinel (see SPEC_FULL.md §8, Open Question
/// 2): `on_cached` fires synchronously for tiles `CacheManager::request_tiles`
/// found already in the cache, before it returns; `on_delivered` fires from
/// a delivery operation's worker thread for everything it reads, in list
/// order, exactly once per position.
///
/// Default method bodies are no-ops so implementors only need to handle the
/// phase they care about.
pub trait Observer: Send + Sync {
    /// An already-cached tile, delivered synchronously.
    fn on_cached(&self, _position: &TilePosition, _tile: &Tile) {}

    /// A tile read by a delivery operation's worker thread. `tile` is `None`
    /// on a read failure; in that case `op.last_error()` carries the cause.
    /// Implementations must not block indefinitely and must not call back
    /// into `op` (specification §5, "Shared-resource policy").
    fn on_delivered(&self, _op: &DeliveryOperation, _position: &TilePosition, _tile: Option<&Tile>) {}
}

struct Shared {
    state: Mutex<DeliveryState>,
    condvar: Condvar,
    cancel_requested: AtomicBool,
    started: AtomicBool,
    last_error: Mutex<Option<String>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// (source, iterable of positions, state) — an asynchronous, cancellable
/// producer of tiles for a fixed list of positions.
///
/// Started at most once; runs to completion or cancellation; cannot be
/// restarted.
pub struct DeliveryOperation {
    source: Arc<dyn TileSource>,
    positions: Vec<TilePosition>,
    shared: Shared,
}

impl DeliveryOperation {
    /// Builds a new, not-yet-started operation over `positions`, read in
    /// list order from `source`.
    pub fn new(source: Arc<dyn TileSource>, positions: Vec<TilePosition>) -> Arc<Self> {
        Arc::new(Self {
            source,
            positions,
            shared: Shared {
                state: Mutex::new(DeliveryState::NotStarted),
                condvar: Condvar::new(),
                cancel_requested: AtomicBool::new(false),
                started: AtomicBool::new(false),
                last_error: Mutex::new(None),
                handle: Mutex::new(None),
            },
        })
    }

    /// The source this operation reads from.
    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    /// The positions this operation was built to deliver, in read order.
    pub fn positions(&self) -> &[TilePosition] {
        &self.positions
    }

    pub fn state(&self) -> DeliveryState {
        *self.shared.state.lock().unwrap()
    }

    /// The most recent tile read error, if any, as its display text (errors
    /// are not `Clone`, so the message is captured rather than the error
    /// itself).
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.lock().unwrap().clone()
    }

    /// Starts the worker thread. A no-op if already started (idempotent
    /// after the first call).
    pub fn start(self: &Arc<Self>, observer: Arc<dyn Observer>) {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            return;
        }
        *self.shared.state.lock().unwrap() = DeliveryState::Running;

        let op = Arc::clone(self);
        let join = thread::spawn(move || op.run(observer));
        *self.shared.handle.lock().unwrap() = Some(join);
    }

    fn run(self: Arc<Self>, observer: Arc<dyn Observer>) {
        for position in &self.positions {
            if self.shared.cancel_requested.load(Ordering::SeqCst) {
                *self.shared.state.lock().unwrap() = DeliveryState::Cancelled;
                self.shared.condvar.notify_all();
                return;
            }

            match self.source.read_tile(position) {
                Ok(tile) => {
                    observer.on_delivered(&self, position, Some(&tile));
                }
                Err(err) => {
                    warn!(error = %err, "delivery operation tile read failed");
                    *self.shared.last_error.lock().unwrap() = Some(err.to_string());
                    observer.on_delivered(&self, position, None);
                }
            }
        }

        *self.shared.state.lock().unwrap() = DeliveryState::Finished;
        self.shared.condvar.notify_all();
        debug!(positions = self.positions.len(), "delivery operation finished");
    }

    /// Requests cancellation. Cancellation is observable only *between*
    /// tile reads — an in-flight `read_tile` is allowed to complete.
    ///
    /// Returns `true` if the operation was not yet finished at the moment
    /// of the call (cancellation will take effect at the next between-tile
    /// check), or `false` if it had already reached `FINISHED`/`CANCELLED`
    /// (too late to have any effect).
    pub fn cancel(&self) -> bool {
        self.shared.cancel_requested.store(true, Ordering::SeqCst);
        let state = self.shared.state.lock().unwrap();
        !matches!(*state, DeliveryState::Finished | DeliveryState::Cancelled)
    }

    /// Blocks until the worker thread exits (`FINISHED` or `CANCELLED`).
    /// A no-op if the operation was never started.
    pub fn wait_until_finished(&self) {
        if !self.shared.started.load(Ordering::Acquire) {
            return;
        }
        let mut state = self.shared.state.lock().unwrap();
        while matches!(*state, DeliveryState::Running | DeliveryState::NotStarted) {
            state = self.shared.condvar.wait(state).unwrap();
        }
    }
}
