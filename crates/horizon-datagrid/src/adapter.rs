//! Mapping between logical columns and the physical display surface.
//!
//! The surface only knows dense physical indices `0..visible_count`. The
//! [`VirtualTableAdapter`] keeps the visible-column mapping and the row and
//! column counts the surface was last told about, and turns count drift into
//! the smallest set of [`TableMessage`]s, bracketed by a batch so the surface
//! never repaints on a half-updated model.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::column::ColumnModel;

/// A structural change notification for the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMessage {
    RowsAppended(usize),
    RowsDeleted { pos: usize, count: usize },
    ColumnsAppended(usize),
    ColumnsDeleted { pos: usize, count: usize },
}

/// The physical grid widget, as seen by the engine.
pub trait GridSurface: Send {
    /// Suspend repaints until the matching [`end_batch`](Self::end_batch).
    fn begin_batch(&mut self);

    fn end_batch(&mut self);

    /// Apply a structural change.
    fn process_message(&mut self, message: TableMessage);

    /// Repaint everything.
    fn refresh(&mut self);

    /// Repaint one cell.
    fn refresh_cell(&mut self, _row: usize, _physical_col: usize) {}

    /// Set the width of a physical column.
    fn set_column_width(&mut self, _physical_col: usize, _width: i32) {}

    /// Set the height of one row, or of all rows with `None`.
    fn set_row_height(&mut self, _row: Option<usize>, _height: i32) {}
}

/// A surface that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl GridSurface for NullSurface {
    fn begin_batch(&mut self) {}
    fn end_batch(&mut self) {}
    fn process_message(&mut self, _message: TableMessage) {}
    fn refresh(&mut self) {}
}

/// A call recorded by [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    BeginBatch,
    EndBatch,
    Message(TableMessage),
    Refresh,
    RefreshCell(usize, usize),
    ColumnWidth(usize, i32),
    RowHeight(Option<usize>, i32),
}

/// A surface that records calls. Clones share one log, so a test can keep a
/// handle after giving the surface to a grid.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded call, in order.
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().clone()
    }

    /// Recorded structural messages only.
    pub fn messages(&self) -> Vec<TableMessage> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Message(message) => Some(*message),
                _ => None,
            })
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, SurfaceEvent::Refresh))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: SurfaceEvent) {
        self.events.lock().push(event);
    }
}

impl GridSurface for RecordingSurface {
    fn begin_batch(&mut self) {
        self.record(SurfaceEvent::BeginBatch);
    }

    fn end_batch(&mut self) {
        self.record(SurfaceEvent::EndBatch);
    }

    fn process_message(&mut self, message: TableMessage) {
        self.record(SurfaceEvent::Message(message));
    }

    fn refresh(&mut self) {
        self.record(SurfaceEvent::Refresh);
    }

    fn refresh_cell(&mut self, row: usize, physical_col: usize) {
        self.record(SurfaceEvent::RefreshCell(row, physical_col));
    }

    fn set_column_width(&mut self, physical_col: usize, width: i32) {
        self.record(SurfaceEvent::ColumnWidth(physical_col, width));
    }

    fn set_row_height(&mut self, row: Option<usize>, height: i32) {
        self.record(SurfaceEvent::RowHeight(row, height));
    }
}

/// Row and column count changes applied by one sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncDelta {
    pub rows: isize,
    pub columns: isize,
}

impl SyncDelta {
    pub fn is_empty(&self) -> bool {
        self.rows == 0 && self.columns == 0
    }
}

/// Logical/physical column mapping plus the counts the surface last saw.
#[derive(Debug, Clone, Default)]
pub struct VirtualTableAdapter {
    /// Physical index to logical index.
    physical: Vec<usize>,
    /// Logical index to physical index.
    logical: Vec<Option<usize>>,
    row_count: usize,
    column_count: usize,
}

impl VirtualTableAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the mapping from the current column set.
    pub fn remap(&mut self, columns: &ColumnModel) {
        self.physical = columns.visible_indices();
        self.logical = vec![None; columns.len()];
        for (physical, &logical) in self.physical.iter().enumerate() {
            self.logical[logical] = Some(physical);
        }
    }

    /// Physical index of a logical column; `None` if hidden or unknown.
    pub fn logical_to_physical(&self, logical: usize) -> Option<usize> {
        self.logical.get(logical).copied().flatten()
    }

    /// Logical index of a physical column; `None` if out of range.
    pub fn physical_to_logical(&self, physical: usize) -> Option<usize> {
        self.physical.get(physical).copied()
    }

    /// Number of visible columns in the current mapping.
    pub fn visible_count(&self) -> usize {
        self.physical.len()
    }

    /// Row count the surface was last told about.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Column count the surface was last told about.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Remap, then tell the surface about any count drift.
    ///
    /// Growth is reported as an append and shrinkage as a delete from the
    /// end, inside one batch. Nothing is sent when the counts already match.
    pub fn sync(
        &mut self,
        columns: &ColumnModel,
        row_count: usize,
        surface: &mut dyn GridSurface,
    ) -> SyncDelta {
        self.remap(columns);
        let column_count = self.visible_count();

        let delta = SyncDelta {
            rows: row_count as isize - self.row_count as isize,
            columns: column_count as isize - self.column_count as isize,
        };
        if delta.is_empty() {
            return delta;
        }

        surface.begin_batch();
        if let Some(message) = count_message(self.row_count, row_count, Axis::Rows) {
            surface.process_message(message);
        }
        if let Some(message) = count_message(self.column_count, column_count, Axis::Columns) {
            surface.process_message(message);
        }
        surface.end_batch();

        tracing::debug!(
            target: "horizon_datagrid::adapter",
            rows = delta.rows,
            columns = delta.columns,
            "surface counts synced"
        );
        self.row_count = row_count;
        self.column_count = column_count;
        delta
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Rows,
    Columns,
}

fn count_message(old: usize, new: usize, axis: Axis) -> Option<TableMessage> {
    use std::cmp::Ordering;

    match (new.cmp(&old), axis) {
        (Ordering::Equal, _) => None,
        (Ordering::Greater, Axis::Rows) => Some(TableMessage::RowsAppended(new - old)),
        (Ordering::Greater, Axis::Columns) => Some(TableMessage::ColumnsAppended(new - old)),
        (Ordering::Less, Axis::Rows) => Some(TableMessage::RowsDeleted {
            pos: new,
            count: old - new,
        }),
        (Ordering::Less, Axis::Columns) => Some(TableMessage::ColumnsDeleted {
            pos: new,
            count: old - new,
        }),
    }
}

static_assertions::assert_impl_all!(RecordingSurface: Send, Sync);
