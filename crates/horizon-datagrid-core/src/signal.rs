//! Notifications from grid components to application code.
//!
//! A [`Signal`] holds the callbacks interested in one kind of grid event
//! (a cell was selected, a column was moved, a sort finished). Grid work runs
//! on the UI thread only, so [`Signal::emit`] calls every callback in place,
//! in the order they were connected.
//!
//! ```
//! use horizon_datagrid_core::Signal;
//!
//! let column_moved = Signal::<(usize, usize)>::new();
//! let id = column_moved.connect(|(from, to)| {
//!     println!("column {from} -> {to}");
//! });
//!
//! column_moved.emit((0, 2));
//! assert!(column_moved.disconnect(id));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, SignalError};

new_key_type! {
    /// Handle for one callback registered on a [`Signal`].
    pub struct ConnectionId;
}

type Handler<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of callbacks invoked with `Args` on every emission.
///
/// Emission works on a snapshot of the handlers, so a handler may connect
/// or disconnect others (itself included) while it runs.
pub struct Signal<Args> {
    handlers: Mutex<SlotMap<ConnectionId, Handler<Args>>>,
    muted: AtomicBool,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// A signal with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(SlotMap::with_key()),
            muted: AtomicBool::new(false),
        }
    }

    /// Register `handler`; the returned id removes it again.
    pub fn connect<F>(&self, handler: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.handlers.lock().insert(Arc::new(handler))
    }

    /// Remove a handler. Returns `false` if `id` is not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.handlers.lock().remove(id).is_some()
    }

    /// Like [`disconnect`](Self::disconnect), with an unknown id as an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<()> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(SignalError::InvalidConnection.into())
        }
    }

    /// Remove every handler.
    pub fn disconnect_all(&self) {
        self.handlers.lock().clear();
    }

    /// Number of connected handlers.
    pub fn connection_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Suppress emissions until unblocked.
    ///
    /// Grids block their signals while replaying persisted state, so a
    /// restore does not reach handlers as user input.
    pub fn set_blocked(&self, blocked: bool) {
        self.muted.store(blocked, Ordering::SeqCst);
    }

    /// Whether emissions are suppressed.
    pub fn is_blocked(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Call every connected handler with `args`.
    #[tracing::instrument(skip_all, target = "horizon_datagrid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "horizon_datagrid_core::signal", "blocked");
            return;
        }

        let handlers: Vec<Handler<Args>> = self.handlers.lock().values().cloned().collect();
        tracing::trace!(target: "horizon_datagrid_core::signal", handlers = handlers.len(), "emit");
        for handler in handlers {
            handler(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
