//! Logging and performance tracing for Horizon DataGrid.
//!
//! Horizon DataGrid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_datagrid=debug")
//!         .init();
//! }
//! ```
//!
//! Every subsystem logs under one of the [`targets`], so a filter such as
//! `horizon_datagrid::search=trace` isolates a single concern.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core systems target.
    pub const CORE: &str = "horizon_datagrid_core";
    /// Timer system target.
    pub const TIMER: &str = "horizon_datagrid_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_datagrid_core::signal";
    /// Deferred work target.
    pub const DEFERRED: &str = "horizon_datagrid_core::deferred";

    /// Column model and column management.
    pub const COLUMN: &str = "horizon_datagrid::column";
    /// Logical/physical mapping and table messages.
    pub const ADAPTER: &str = "horizon_datagrid::adapter";
    /// Cell value cache.
    pub const CACHE: &str = "horizon_datagrid::cache";
    /// Sorting.
    pub const SORT: &str = "horizon_datagrid::sort";
    /// Current cell and selection.
    pub const SELECTION: &str = "horizon_datagrid::selection";
    /// Incremental search and find/replace.
    pub const SEARCH: &str = "horizon_datagrid::search";
    /// Cell editing.
    pub const EDIT: &str = "horizon_datagrid::edit";
    /// Header painting and gestures.
    pub const HEADER: &str = "horizon_datagrid::header";
    /// Settings persistence.
    pub const SETTINGS: &str = "horizon_datagrid::settings";
    /// Performance spans.
    pub const PERF: &str = "horizon_datagrid::perf";
}

/// A guard that keeps a performance span entered until dropped.
///
/// This is useful for tracking the duration of operations such as a full
/// grid fill or a sort.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_datagrid::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
