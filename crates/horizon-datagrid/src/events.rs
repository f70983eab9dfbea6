//! Notifications a grid emits.
//!
//! Column indices in every payload are logical indices.

use horizon_datagrid_core::Signal;

use crate::sort::SortOrder;
use crate::value::Value;

/// A cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEvent {
    pub row: usize,
    pub col: usize,
}

/// A value written to the data source by an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEditedEvent {
    pub row: usize,
    pub col: usize,
    pub field: String,
    pub old: Value,
    pub new: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnResizedEvent {
    pub col: usize,
    pub width: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMovedEvent {
    pub from: usize,
    pub to: usize,
}

/// A sort about to run, or one that just ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEvent {
    pub col: usize,
    pub field: String,
    /// `None` when the column returned to unsorted.
    pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSizeChangedEvent {
    /// The resized row, or `None` when all rows share the height.
    pub row: Option<usize>,
    pub height: i32,
}

/// All signals of one grid.
#[derive(Default)]
pub struct GridSignals {
    /// The current cell changed.
    pub cell_selected: Signal<CellEvent>,
    /// An editor is about to open.
    pub cell_edit_started: Signal<CellEvent>,
    /// An edit was committed to the data source.
    pub cell_edited: Signal<CellEditedEvent>,
    pub column_resized: Signal<ColumnResizedEvent>,
    pub column_moved: Signal<ColumnMovedEvent>,
    pub sort_begin: Signal<SortEvent>,
    pub sort_end: Signal<SortEvent>,
    /// Right click in the header, over a column or empty space.
    pub header_context_menu_requested: Signal<Option<usize>>,
    pub row_size_changed: Signal<RowSizeChangedEvent>,
}

impl GridSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block or unblock every signal.
    pub fn set_blocked(&self, blocked: bool) {
        self.cell_selected.set_blocked(blocked);
        self.cell_edit_started.set_blocked(blocked);
        self.cell_edited.set_blocked(blocked);
        self.column_resized.set_blocked(blocked);
        self.column_moved.set_blocked(blocked);
        self.sort_begin.set_blocked(blocked);
        self.sort_end.set_blocked(blocked);
        self.header_context_menu_requested.set_blocked(blocked);
        self.row_size_changed.set_blocked(blocked);
    }
}

impl std::fmt::Debug for GridSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridSignals").finish_non_exhaustive()
    }
}
