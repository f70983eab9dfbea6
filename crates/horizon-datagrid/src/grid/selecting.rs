//! Current cell, selection, header gestures and row sizing.

use super::{Grid, GridTask};
use crate::events::{CellEvent, RowSizeChangedEvent};
use crate::header::{HeaderAction, HeaderMenuAction};
use crate::selection::{SelectionMode, SelectionModel};

impl Grid {
    /// The current cell as (row, physical column). `None` when unset or in
    /// a hidden column.
    pub fn current_cell(&self) -> Option<(usize, usize)> {
        let (row, logical) = self.current?;
        Some((row, self.adapter.logical_to_physical(logical)?))
    }

    /// Make a cell current and select it.
    ///
    /// An edit open on another cell is committed first. Moving to another
    /// column drops buffered search text. Returns `false` for a cell outside
    /// the grid.
    pub fn set_current_cell(&mut self, row: usize, physical_col: usize) -> bool {
        let Some(logical) = self.adapter.physical_to_logical(physical_col) else {
            return false;
        };
        if row >= self.row_count() {
            return false;
        }
        if self.edit.is_editing() && self.edit.cell() != Some((row, logical)) {
            self.commit_edit();
        }
        if self.current.is_some_and(|(_, col)| col != logical) {
            self.search.clear();
            self.deferred.cancel_matching(&GridTask::RunSearch);
        }
        self.move_current(row, logical);
        true
    }

    /// Move the current cell without touching search or edit state.
    pub(super) fn move_current(&mut self, row: usize, logical: usize) {
        let previous = self.current.replace((row, logical));
        self.selection.select(row, logical, false);
        if previous != Some((row, logical)) {
            tracing::trace!(target: "horizon_datagrid::selection", row, col = logical, "current cell changed");
            self.signals.cell_selected.emit(CellEvent { row, col: logical });
        }
        self.surface.refresh();
    }

    /// The selection, in logical columns.
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// Select the unit under a cell for the current selection mode.
    pub fn select(&mut self, row: usize, physical_col: usize, extend: bool) {
        let Some(logical) = self.adapter.physical_to_logical(physical_col) else {
            return;
        };
        if row >= self.row_count() {
            return;
        }
        self.selection.select(row, logical, extend);
        self.surface.refresh();
    }

    /// Select everything between two cells.
    pub fn select_range(&mut self, anchor: (usize, usize), end: (usize, usize), extend: bool) {
        let rows = self.row_count();
        let (Some(anchor_col), Some(end_col)) = (
            self.adapter.physical_to_logical(anchor.1),
            self.adapter.physical_to_logical(end.1),
        ) else {
            return;
        };
        if anchor.0 >= rows || end.0 >= rows {
            return;
        }
        self.selection
            .select_range((anchor.0, anchor_col), (end.0, end_col), extend);
        self.surface.refresh();
    }

    pub fn is_selected(&self, row: usize, physical_col: usize) -> bool {
        self.adapter
            .physical_to_logical(physical_col)
            .is_some_and(|logical| self.selection.is_selected(row, logical))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.surface.refresh();
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.config.selection_mode = mode;
        self.selection.set_mode(mode);
        self.surface.refresh();
    }

    pub fn set_multiple_selection(&mut self, multiple: bool) {
        self.config.multiple_selection = multiple;
        self.selection.set_multiple(multiple);
        self.surface.refresh();
    }

    /// Left button pressed in the header at x coordinate `x`.
    pub fn header_mouse_down(&mut self, x: f32) {
        let layout = self.header_layout();
        self.header_router.mouse_down(x, &layout);
    }

    /// Mouse dragged in the header. Applies and returns a live resize.
    pub fn header_mouse_move(&mut self, x: f32) -> Option<HeaderAction> {
        let layout = self.header_layout();
        let action = self.header_router.mouse_move(x, &layout)?;
        self.apply_header_action(action);
        Some(action)
    }

    /// Left button released in the header. Applies and returns the gesture
    /// it completed, in physical indices.
    pub fn header_mouse_up(&mut self, x: f32) -> Option<HeaderAction> {
        let layout = self.header_layout();
        let action = self.header_router.mouse_up(x, &layout)?;
        self.apply_header_action(action);
        Some(action)
    }

    /// Right button clicked in the header.
    pub fn header_context_menu(&mut self, x: f32) -> HeaderAction {
        let layout = self.header_layout();
        let action = self.header_router.context_menu(x, &layout);
        self.apply_header_action(action);
        action
    }

    /// Run one of the built-in header menu entries.
    pub fn apply_header_menu_action(&mut self, action: HeaderMenuAction) {
        match action {
            HeaderMenuAction::AutosizeColumn(logical) => {
                self.auto_size_column(logical, true);
            }
            HeaderMenuAction::AutosizeAll => self.auto_size_all(true),
        }
    }

    /// Carry out a header gesture. Physical sections map to logical columns
    /// here; a section that no longer maps is ignored.
    fn apply_header_action(&mut self, action: HeaderAction) {
        let adapter = &self.adapter;
        match action {
            HeaderAction::Sort(col) => {
                if let Some(col) = adapter.physical_to_logical(col) {
                    self.process_sort(col, true);
                }
            }
            HeaderAction::Move { from, to } => {
                if let (Some(from), Some(to)) = (adapter.physical_to_logical(from), adapter.physical_to_logical(to)) {
                    self.move_column(from, to);
                }
            }
            HeaderAction::Resize { col, width } => {
                let Some(col) = adapter.physical_to_logical(col) else {
                    return;
                };
                if let Some(field) = self.columns.get(col).map(|c| c.data_field.clone()) {
                    self.set_display_width(col, &field, width);
                }
            }
            HeaderAction::ResizeFinished { col, width } => {
                if let Some(col) = adapter.physical_to_logical(col) {
                    self.set_column_width(col, width);
                    self.deferred.post(GridTask::SettleColumnWidths);
                }
            }
            HeaderAction::ContextMenu(col) => {
                let col = col.and_then(|physical| adapter.physical_to_logical(physical));
                tracing::debug!(target: "horizon_datagrid::header", col = ?col, "header context menu");
                self.signals.header_context_menu_requested.emit(col);
            }
        }
    }

    /// Height of rows without their own height.
    pub fn row_height(&self) -> i32 {
        self.row_height
    }

    /// Height of one row.
    pub fn row_height_of(&self, row: usize) -> i32 {
        if self.config.same_size_rows {
            return self.row_height;
        }
        self.row_heights.get(&row).copied().unwrap_or(self.row_height)
    }

    /// Set the default row height and persist it.
    ///
    /// With same-size rows every per-row height is dropped.
    pub fn set_row_height(&mut self, height: i32) {
        let height = height.max(1);
        self.row_height = height;
        if self.config.same_size_rows {
            self.row_heights.clear();
        }
        self.save_setting(&self.settings_key.grid("RowSize"), height);
        self.surface.set_row_height(None, height);
        self.signals
            .row_size_changed
            .emit(RowSizeChangedEvent { row: None, height });
    }

    /// Resize one row, as a user drag would.
    ///
    /// Refused when rows are not resizable. With same-size rows this resizes
    /// every row.
    pub fn resize_row(&mut self, row: usize, height: i32) -> bool {
        if !self.config.resizable_rows || row >= self.row_count() {
            return false;
        }
        if self.config.same_size_rows {
            self.set_row_height(height);
            return true;
        }
        let height = height.max(1);
        self.row_heights.insert(row, height);
        self.surface.set_row_height(Some(row), height);
        self.signals.row_size_changed.emit(RowSizeChangedEvent {
            row: Some(row),
            height,
        });
        true
    }

    /// Apply the persisted default row height.
    pub fn restore_row_size(&mut self) -> bool {
        let Some(height) = self
            .setting(&self.settings_key.grid("RowSize"))
            .and_then(|value| value.as_integer())
            .filter(|height| *height > 0)
        else {
            return false;
        };
        self.row_height = height as i32;
        self.surface.set_row_height(None, self.row_height);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::adapter::{RecordingSurface, SurfaceEvent};
    use crate::column::Column;
    use crate::config::GridConfig;
    use crate::data_source::RecordSet;
    use crate::grid::GridBuilder;
    use crate::settings::Settings;
    use crate::sort::SortOrder;
    use crate::value::{DataType, Value};

    use super::*;

    fn records() -> Arc<RecordSet> {
        Arc::new(RecordSet::from_rows(
            &["name", "qty", "note"],
            vec![
                vec![Value::from("pear"), Value::Int(4), Value::from("green")],
                vec![Value::from("fig"), Value::Int(12), Value::from("ripe")],
                vec![Value::from("kiwi"), Value::Int(7), Value::from("soft")],
            ],
        ))
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("name").with_width(80),
            Column::new("qty").with_data_type(DataType::Int).with_width(60),
            Column::new("note").with_width(100),
        ]
    }

    fn grid_with(config: GridConfig, settings: Arc<Settings>, surface: RecordingSurface) -> Grid {
        GridBuilder::new("f", "g")
            .config(config)
            .settings(settings)
            .surface(surface)
            .data_source(records())
            .columns(columns())
            .build()
    }

    fn grid() -> Grid {
        grid_with(GridConfig::default(), Arc::new(Settings::new()), RecordingSurface::new())
    }

    #[test]
    fn test_current_cell_follows_visible_columns() {
        let mut grid = grid();
        let selected = Arc::new(Mutex::new(Vec::new()));
        let sink = selected.clone();
        grid.signals.cell_selected.connect(move |e| sink.lock().push(*e));

        assert!(grid.set_current_cell(1, 2));
        assert!(grid.set_current_cell(1, 2));
        assert!(!grid.set_current_cell(3, 0));
        assert!(!grid.set_current_cell(0, 3));
        assert_eq!(grid.current_cell(), Some((1, 2)));
        assert!(grid.is_selected(1, 2));
        assert_eq!(*selected.lock(), vec![CellEvent { row: 1, col: 2 }]);

        grid.show_column(1, false);
        assert_eq!(grid.current_cell(), Some((1, 1)));
        grid.show_column(2, false);
        assert_eq!(grid.current_cell(), None);
    }

    #[test]
    fn test_changing_column_drops_search_text() {
        let mut grid = grid();
        grid.set_current_cell(0, 0);
        grid.handle_char('k');
        grid.set_current_cell(1, 0);
        assert_eq!(grid.search_text(), "k");

        grid.set_current_cell(1, 2);
        assert_eq!(grid.search_text(), "");
        assert!(!grid.has_deferred_work());
    }

    #[test]
    fn test_row_mode_range_selection() {
        let mut grid = grid();
        grid.set_selection_mode(SelectionMode::Row);
        grid.select_range((0, 0), (1, 2), false);
        assert_eq!(grid.selection().selected_rows(), vec![0, 1]);
        assert!(grid.is_selected(1, 0));
        assert!(!grid.is_selected(2, 0));

        grid.set_multiple_selection(false);
        assert_eq!(grid.selection().selected_rows(), vec![1]);
        grid.select_range((0, 0), (2, 0), false);
        assert_eq!(grid.selection().selected_rows(), vec![2]);

        grid.clear_selection();
        assert!(grid.selection().is_empty());
    }

    #[test]
    fn test_header_click_sorts() {
        let mut grid = grid();
        grid.header_mouse_down(100.0);
        assert_eq!(grid.header_mouse_up(101.0), Some(HeaderAction::Sort(1)));
        assert_eq!(grid.sort_state().sorted_column(), Some("qty"));
        assert_eq!(grid.sort_state().order(), Some(SortOrder::Ascending));
        assert_eq!(grid.cell_text(0, 0).as_deref(), Some("pear"));
    }

    #[test]
    fn test_header_drag_moves_column() {
        let mut grid = grid();
        grid.header_mouse_down(30.0);
        assert_eq!(grid.header_mouse_move(60.0), None);
        assert_eq!(grid.header_mouse_up(200.0), Some(HeaderAction::Move { from: 0, to: 2 }));

        let fields: Vec<&str> = grid.columns().iter().map(|c| c.data_field.as_str()).collect();
        assert_eq!(fields, vec!["qty", "note", "name"]);
    }

    #[test]
    fn test_header_resize_persists_and_settles_later() {
        let settings = Arc::new(Settings::new());
        let surface = RecordingSurface::new();
        let mut grid = grid_with(GridConfig::default(), settings.clone(), surface.clone());
        surface.clear();

        grid.header_mouse_down(79.0);
        assert_eq!(grid.header_mouse_move(100.0), Some(HeaderAction::Resize { col: 0, width: 101 }));
        assert_eq!(grid.column_width(0), Some(101));
        assert!(settings.get_raw("f.g.column_name.Width").is_none());

        assert_eq!(
            grid.header_mouse_up(100.0),
            Some(HeaderAction::ResizeFinished { col: 0, width: 101 })
        );
        assert_eq!(settings.get::<i32>("f.g.column_name.Width"), Some(101));
        assert!(surface.events().contains(&SurfaceEvent::ColumnWidth(0, 101)));
        assert!(grid.has_deferred_work());
        assert_eq!(grid.process_deferred(), 1);
    }

    #[test]
    fn test_context_menu_and_autosize() {
        let mut grid = grid();
        let requested = Arc::new(Mutex::new(Vec::new()));
        let sink = requested.clone();
        grid.signals
            .header_context_menu_requested
            .connect(move |col| sink.lock().push(*col));

        assert_eq!(grid.header_context_menu(90.0), HeaderAction::ContextMenu(Some(1)));
        assert_eq!(grid.header_context_menu(900.0), HeaderAction::ContextMenu(None));
        assert_eq!(*requested.lock(), vec![Some(1), None]);

        grid.apply_header_menu_action(HeaderMenuAction::AutosizeColumn(2));
        assert_eq!(grid.column_width(2), Some(46));
    }

    #[test]
    fn test_row_sizing() {
        let settings = Arc::new(Settings::new());
        let surface = RecordingSurface::new();
        let mut grid = grid_with(GridConfig::default(), settings.clone(), surface.clone());
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        grid.signals.row_size_changed.connect(move |e| sink.lock().push(*e));

        assert!(grid.resize_row(1, 30));
        assert_eq!(grid.row_height_of(2), 30);
        assert_eq!(settings.get::<i32>("f.g.RowSize"), Some(30));
        assert_eq!(*changes.lock(), vec![RowSizeChangedEvent { row: None, height: 30 }]);

        let restored = grid_with(GridConfig::default(), settings.clone(), RecordingSurface::new());
        assert_eq!(restored.row_height(), 30);

        let config = GridConfig {
            same_size_rows: false,
            ..GridConfig::default()
        };
        let mut free = grid_with(config.clone(), Arc::new(Settings::new()), surface.clone());
        surface.clear();
        assert!(free.resize_row(2, 44));
        assert_eq!(free.row_height_of(2), 44);
        assert_eq!(free.row_height_of(0), 20);
        assert_eq!(surface.events(), vec![SurfaceEvent::RowHeight(Some(2), 44)]);

        let mut fixed = grid_with(
            GridConfig {
                resizable_rows: false,
                ..config
            },
            Arc::new(Settings::new()),
            RecordingSurface::new(),
        );
        assert!(!fixed.resize_row(0, 50));
        assert_eq!(fixed.row_height_of(0), 20);
    }
}
