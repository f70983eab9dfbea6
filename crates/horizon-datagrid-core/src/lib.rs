//! Core systems for Horizon DataGrid.
//!
//! This crate provides the UI-thread plumbing the grid engine is built on:
//!
//! - **Signal/Slot System**: Type-safe notifications for grid events
//! - **Timers**: One-shot timers ordered by fire time
//! - **Deferred Work**: Next-turn and delayed work items with debounce
//! - **Logging**: Tracing targets and performance spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_datagrid_core::Signal;
//!
//! let row_count_changed = Signal::<usize>::new();
//!
//! let conn_id = row_count_changed.connect(|rows| {
//!     println!("Grid now has {} rows", rows);
//! });
//!
//! row_count_changed.emit(42);
//! row_count_changed.disconnect(conn_id);
//! ```

#![warn(missing_docs)]

pub mod deferred;
pub mod error;
pub mod logging;
pub mod signal;
pub mod timer;

pub use deferred::DeferredQueue;
pub use error::{CoreError, Result, SignalError, TimerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use timer::{TimerId, TimerManager};
