//! Cell editing and write-through to the data source.

use std::sync::Arc;
use std::time::Instant;

use super::Grid;
use crate::binding::BoundControl;
use crate::edit::{EditOutcome, PendingCommit};
use crate::error::{GridError, Result};
use crate::events::{CellEditedEvent, CellEvent};
use crate::registry::CellEditor;
use crate::value::Value;

impl Grid {
    /// Whether an editor is open.
    pub fn is_editing(&self) -> bool {
        self.edit.is_editing()
    }

    /// The cell being edited, as (row, physical column).
    pub fn editing_cell(&self) -> Option<(usize, usize)> {
        let (row, logical) = self.edit.cell()?;
        Some((row, self.adapter.logical_to_physical(logical)?))
    }

    /// Whether edits to a logical column are allowed.
    pub fn is_column_editable(&self, logical: usize) -> bool {
        self.config.editable && self.columns.get(logical).is_some_and(|column| column.editable)
    }

    /// Open an editor on a cell.
    ///
    /// An edit open elsewhere is committed first. Returns `false` when the
    /// grid or the column is read-only or the cell does not exist.
    pub fn begin_edit(&mut self, row: usize, physical_col: usize) -> bool {
        let Some(logical) = self.adapter.physical_to_logical(physical_col) else {
            return false;
        };
        if !self.is_column_editable(logical) {
            return false;
        }
        if self.edit.is_editing() {
            if self.edit.cell() == Some((row, logical)) {
                return true;
            }
            self.commit_edit();
        }
        let Some(value) = self.logical_value_at(row, logical, Instant::now()) else {
            return false;
        };
        let Some(column) = self.columns.get(logical) else {
            return false;
        };
        let editor = self.registry.editor_for(column, row);

        self.signals.cell_edit_started.emit(CellEvent { row, col: logical });
        self.edit.begin(row, logical, editor, &value)
    }

    /// The open editor, for feeding it input.
    pub fn editor_mut(&mut self) -> Option<&mut (dyn CellEditor + 'static)> {
        self.edit.editor_mut()
    }

    /// Close the editor and write a changed value to the data source.
    ///
    /// A failed write is logged, the editor value is reverted and the cell
    /// is repainted from the data source.
    pub fn commit_edit(&mut self) -> EditOutcome {
        let Some(pending) = self.edit.end() else {
            return EditOutcome::Cancelled;
        };
        let PendingCommit { row, col, old, new } = pending;

        match self.write_cell(row, col, old, new) {
            Ok(()) => self.edit.complete(),
            Err(err) => {
                tracing::error!(target: "horizon_datagrid::edit", row, col, error = %err, "cannot write edited value");
                self.cache.invalidate(row, col);
                self.refresh_logical_cell(row, col);
                self.edit.revert()
            }
        }
    }

    /// Close the editor without writing.
    pub fn cancel_edit(&mut self) -> EditOutcome {
        let cell = self.edit.cell();
        let outcome = self.edit.cancel();
        if let Some((row, col)) = cell {
            self.refresh_logical_cell(row, col);
        }
        outcome
    }

    /// Write `value` to a cell without an interactive editor.
    ///
    /// Follows the commit path: unchanged values and read-only cells are
    /// not written.
    pub fn set_cell_value(&mut self, row: usize, physical_col: usize, value: Value) -> EditOutcome {
        let Some(logical) = self.adapter.physical_to_logical(physical_col) else {
            return EditOutcome::Cancelled;
        };
        if !self.is_column_editable(logical) {
            return EditOutcome::Cancelled;
        }
        if self.edit.cell() == Some((row, logical)) {
            self.edit.cancel();
        }
        let Some(old) = self.logical_value_at(row, logical, Instant::now()) else {
            return EditOutcome::Cancelled;
        };
        if old == value {
            return EditOutcome::Cancelled;
        }

        match self.write_cell(row, logical, old, value.clone()) {
            Ok(()) => EditOutcome::Committed {
                row,
                col: logical,
                value,
            },
            Err(err) => {
                tracing::error!(target: "horizon_datagrid::edit", row, col = logical, error = %err, "cannot write value");
                self.cache.invalidate(row, logical);
                EditOutcome::Cancelled
            }
        }
    }

    /// Refresh `control` whenever an edit changes its field.
    pub fn bind_control(&mut self, control: &Arc<dyn BoundControl>) {
        self.bound.bind(control);
    }

    fn write_cell(&mut self, row: usize, logical: usize, old: Value, new: Value) -> Result<()> {
        let column = self
            .columns
            .get(logical)
            .ok_or(GridError::ColumnOutOfRange { column: logical })?;
        let field = column.data_field.clone();
        let data = self
            .data
            .clone()
            .ok_or(GridError::Unsupported {
                operation: "editing without a data source",
            })?;

        data.set_field_value(&field, row, new.clone())?;

        self.cache.invalidate(row, logical);
        self.cache.put_at(row, logical, new.clone(), Instant::now());
        self.refresh_logical_cell(row, logical);
        self.bound.notify(&field, row, &new);
        tracing::debug!(target: "horizon_datagrid::edit", row, field, "value written");
        self.signals.cell_edited.emit(CellEditedEvent {
            row,
            col: logical,
            field,
            old,
            new,
        });
        Ok(())
    }

    fn refresh_logical_cell(&mut self, row: usize, logical: usize) {
        if let Some(physical) = self.adapter.logical_to_physical(logical) {
            self.surface.refresh_cell(row, physical);
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use crate::adapter::{RecordingSurface, SurfaceEvent};
    use crate::binding::ValueLabel;
    use crate::column::Column;
    use crate::config::GridConfig;
    use crate::data_source::{DataSource, MemoryCursor, RecordSet};
    use crate::grid::{Grid, GridBuilder};
    use crate::value::DataType;

    use super::*;

    fn editable() -> GridConfig {
        GridConfig {
            editable: true,
            ..GridConfig::default()
        }
    }

    fn stock() -> Arc<MemoryCursor> {
        Arc::new(
            MemoryCursor::new(
                vec![
                    ("item".to_string(), DataType::Str),
                    ("qty".to_string(), DataType::Int),
                ],
                vec![
                    vec![Value::from("bolt"), Value::Int(40)],
                    vec![Value::from("nut"), Value::Int(75)],
                ],
            )
            .with_read_only("item"),
        )
    }

    fn grid(data: Arc<MemoryCursor>, surface: RecordingSurface) -> Grid {
        GridBuilder::new("f", "g")
            .config(editable())
            .surface(surface)
            .data_source(data)
            .columns(vec![
                Column::new("item"),
                Column::new("qty").with_data_type(DataType::Int),
            ])
            .build()
    }

    #[test]
    fn test_commit_writes_through() {
        let data = stock();
        let surface = RecordingSurface::new();
        let mut grid = grid(data.clone(), surface.clone());
        let edited = Arc::new(Mutex::new(Vec::new()));
        let sink = edited.clone();
        grid.signals.cell_edited.connect(move |e| sink.lock().push(e.clone()));

        assert!(grid.begin_edit(1, 1));
        assert!(grid.is_editing());
        assert_eq!(grid.editing_cell(), Some((1, 1)));
        assert!(grid.editor_mut().unwrap().set_text("80"));
        surface.clear();

        let outcome = grid.commit_edit();
        assert_eq!(outcome, EditOutcome::Committed { row: 1, col: 1, value: Value::Int(80) });
        assert_eq!(data.field_value("qty", 1).unwrap(), Value::Int(80));
        let before = grid.cache().stats();
        assert_eq!(grid.cell_value(1, 1), Some(Value::Int(80)));
        assert_eq!(grid.cache().stats().hits, before.hits + 1);
        assert_eq!(grid.cache().stats().misses, before.misses);
        assert!(surface.events().contains(&SurfaceEvent::RefreshCell(1, 1)));

        let events = edited.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field, "qty");
        assert_eq!(events[0].old, Value::Int(75));
    }

    #[test]
    fn test_failed_write_reverts() {
        let data = stock();
        let mut grid = grid(data.clone(), RecordingSurface::new());
        let edited = Arc::new(Mutex::new(0));
        let sink = edited.clone();
        grid.signals.cell_edited.connect(move |_| *sink.lock() += 1);

        assert!(grid.begin_edit(0, 0));
        grid.editor_mut().unwrap().set_text("screw");
        assert_eq!(grid.commit_edit(), EditOutcome::Cancelled);
        assert!(!grid.is_editing());
        assert_eq!(data.field_value("item", 0).unwrap(), Value::from("bolt"));
        assert_eq!(grid.cell_text(0, 0).as_deref(), Some("bolt"));
        assert_eq!(*edited.lock(), 0);
    }

    #[test]
    fn test_read_only_grid_refuses_edit() {
        let records = Arc::new(RecordSet::from_rows(&["a"], vec![vec![Value::from("x")]]));
        let mut grid = GridBuilder::new("f", "g")
            .data_source(records.clone())
            .columns(vec![Column::new("a")])
            .build();
        assert!(!grid.begin_edit(0, 0));
        assert_eq!(grid.set_cell_value(0, 0, Value::from("y")), EditOutcome::Cancelled);

        let mut grid = GridBuilder::new("f", "g")
            .config(editable())
            .data_source(records)
            .columns(vec![Column::new("a").with_editable(false)])
            .build();
        assert!(!grid.begin_edit(0, 0));
        assert!(!grid.begin_edit(5, 9));
    }

    #[test]
    fn test_unchanged_edit_is_not_written() {
        let mut grid = grid(stock(), RecordingSurface::new());
        let started = Arc::new(Mutex::new(Vec::new()));
        let sink = started.clone();
        grid.signals.cell_edit_started.connect(move |e| sink.lock().push(*e));

        grid.begin_edit(0, 1);
        assert_eq!(grid.commit_edit(), EditOutcome::Cancelled);
        assert_eq!(*started.lock(), vec![CellEvent { row: 0, col: 1 }]);

        grid.begin_edit(0, 1);
        grid.editor_mut().unwrap().set_text("41");
        assert_eq!(grid.cancel_edit(), EditOutcome::Cancelled);
        assert_eq!(grid.cell_value(0, 1), Some(Value::Int(40)));
    }

    #[test]
    fn test_bound_control_follows_edits() {
        let mut grid = grid(stock(), RecordingSurface::new());
        let label = Arc::new(ValueLabel::new("qty"));
        let handle: Arc<dyn BoundControl> = label.clone();
        grid.bind_control(&handle);

        assert!(grid.set_cell_value(0, 1, Value::Int(12)).is_committed());
        assert_eq!(label.last(), Some((0, Value::Int(12))));
        assert_eq!(grid.set_cell_value(0, 1, Value::from("twelve")), EditOutcome::Cancelled);
        assert_eq!(grid.cell_value(0, 1), Some(Value::Int(12)));
    }
}
