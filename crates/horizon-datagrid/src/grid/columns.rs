//! Column management: adding, removing, moving, showing and sizing columns.

use std::collections::HashMap;
use std::time::Instant;

use super::Grid;
use crate::column::{AUTOSIZE_WIDTH, Column, DEFAULT_COLUMN_WIDTH, ORDER_STEP};
use crate::events::{ColumnMovedEvent, ColumnResizedEvent};
use crate::header::MINIMUM_SECTION_WIDTH;
use crate::value::DataType;

/// Horizontal padding around cell text, per side.
const CELL_PADDING: i32 = 4;

/// Horizontal inset of the header caption, per side.
const CAPTION_INSET: i32 = 3;

/// Options for [`Grid::build_from_data_set`]. Every map is keyed by field.
#[derive(Debug, Clone, Default)]
pub struct DataSetColumns {
    /// Only these fields, in the data source's order. `None` takes all.
    pub include: Option<Vec<String>>,
    pub captions: HashMap<String, String>,
    pub orders: HashMap<String, i32>,
    pub widths: HashMap<String, i32>,
    pub types: HashMap<String, DataType>,
}

impl Grid {
    /// Replace the column set and refill.
    ///
    /// Returns `false`, with no side effects at all, when the new set equals
    /// the current one.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> bool {
        if self.edit.is_editing() {
            self.cancel_edit();
        }
        let mut columns = columns;
        self.apply_saved_orders(&mut columns);
        if !self.columns.set_columns(columns) {
            return false;
        }
        self.columns.set_owner(Some(self.id));
        self.fill_grid();
        true
    }

    /// Add a column and refill. Returns its logical index.
    pub fn add_column(&mut self, column: Column) -> usize {
        if self.edit.is_editing() {
            self.cancel_edit();
        }
        let index = self.columns.add(column);
        if let Some(column) = self.columns.get_mut_untracked(index) {
            column.grid = Some(self.id);
        }
        let shift = |c: usize| if c >= index { c + 1 } else { c };
        self.selection.remap_columns(shift);
        self.current = self.current.map(|(row, col)| (row, shift(col)));
        self.fill_grid();
        index
    }

    /// Remove the column at a logical index and refill.
    ///
    /// Selected columns past the removed one shift down. Out-of-range
    /// indices are ignored.
    pub fn remove_column(&mut self, logical: usize) -> Option<Column> {
        if logical >= self.columns.len() {
            return None;
        }
        if self.edit.is_editing() {
            self.cancel_edit();
        }
        let mut removed = self.columns.remove(logical)?;
        removed.grid = None;
        self.selection.remove_column_index(logical);
        self.current = match self.current {
            Some((_, col)) if col == logical => None,
            Some((row, col)) if col > logical => Some((row, col - 1)),
            other => other,
        };
        if self.sort.sorted_column() == Some(removed.data_field.as_str()) {
            self.sort.clear();
        }
        self.widths.remove(&removed.data_field);
        self.fill_grid();
        Some(removed)
    }

    /// Remove the first column bound to `field`.
    pub fn remove_column_field(&mut self, field: &str) -> Option<Column> {
        let index = self.columns.index_of_field(field)?;
        self.remove_column(index)
    }

    /// Show or hide a column. Returns `false` if nothing changed.
    pub fn show_column(&mut self, logical: usize, visible: bool) -> bool {
        match self.columns.get(logical) {
            Some(column) if column.visible != visible => {}
            _ => return false,
        }
        if let Some(mut column) = self.column_mut(logical) {
            column.visible = visible;
        }
        true
    }

    /// Move a column so it ends at logical index `to`.
    ///
    /// Every column's new order is persisted.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if self.edit.is_editing() {
            self.cancel_edit();
        }
        let len = self.columns.len();
        if !self.columns.move_to(from, to) {
            return false;
        }
        let to = to.min(len - 1);

        let position = |c: usize| {
            if c == from {
                to
            } else if from < to && c > from && c <= to {
                c - 1
            } else if to < from && c >= to && c < from {
                c + 1
            } else {
                c
            }
        };
        self.selection.remap_columns(position);
        self.current = self.current.map(|(row, col)| (row, position(col)));

        for column in self.columns.iter() {
            self.save_column_setting(&column.data_field, "Order", column.order);
        }

        self.sync_structure();
        self.cache.clear();
        self.push_column_widths();
        self.surface.refresh();

        tracing::debug!(target: "horizon_datagrid::column", from, to, "column moved");
        self.signals.column_moved.emit(ColumnMovedEvent { from, to });
        true
    }

    /// Display width of a column.
    pub fn column_width(&self, logical: usize) -> Option<i32> {
        self.columns.get(logical).map(|column| self.display_width(column))
    }

    /// Set and persist a column width.
    pub fn set_column_width(&mut self, logical: usize, width: i32) -> bool {
        let width = width.max(MINIMUM_SECTION_WIDTH);
        let Some(column) = self.columns.get_mut_untracked(logical) else {
            return false;
        };
        column.width = width;
        let field = column.data_field.clone();
        self.save_column_setting(&field, "Width", width);
        self.set_display_width(logical, &field, width);
        self.signals.column_resized.emit(ColumnResizedEvent { col: logical, width });
        true
    }

    /// Size a column to its widest text, capped at the configured maximum.
    ///
    /// With `persist` the width is also stored as the column's width and
    /// saved to the user settings.
    pub fn auto_size_column(&mut self, logical: usize, persist: bool) -> Option<i32> {
        let width = self.measure_column(logical)?;
        if persist {
            self.set_column_width(logical, width);
        } else {
            let field = self.columns.get(logical)?.data_field.clone();
            self.set_display_width(logical, &field, width);
            self.signals.column_resized.emit(ColumnResizedEvent { col: logical, width });
        }
        Some(width)
    }

    /// Autosize every visible column.
    pub fn auto_size_all(&mut self, persist: bool) {
        for logical in self.columns.visible_indices() {
            self.auto_size_column(logical, persist);
        }
    }

    /// Give width left over in a grid `grid_width` pixels wide to the
    /// visible `expand` columns. The remainder goes to the first ones.
    ///
    /// Returns `true` if any width changed.
    pub fn update_column_widths(&mut self, grid_width: i32) -> bool {
        self.grid_width = grid_width;
        let visible = self.columns.visible_indices();
        let used: i32 = visible
            .iter()
            .filter_map(|&logical| self.column_width(logical))
            .sum();
        let extra = grid_width - used;
        let expanding: Vec<usize> = visible
            .into_iter()
            .filter(|&logical| self.columns.get(logical).is_some_and(|c| c.expand))
            .collect();
        if extra <= 0 || expanding.is_empty() {
            return false;
        }

        let share = extra / expanding.len() as i32;
        let remainder = (extra % expanding.len() as i32) as usize;
        for (i, &logical) in expanding.iter().enumerate() {
            let Some(current) = self.column_width(logical) else {
                continue;
            };
            let Some(field) = self.columns.get(logical).map(|c| c.data_field.clone()) else {
                continue;
            };
            let bonus = if i < remainder { 1 } else { 0 };
            self.set_display_width(logical, &field, current + share + bonus);
        }
        tracing::debug!(target: "horizon_datagrid::column", extra, columns = expanding.len(), "expanded columns");
        true
    }

    /// Replace the columns with one per field of the data source.
    ///
    /// Types come from `options.types`, then the declared structure, then
    /// the first non-null value of the field, then default to string.
    /// Returns `false` when there is no data to infer from.
    pub fn build_from_data_set(&mut self, options: &DataSetColumns) -> bool {
        let Some(data) = self.data.clone() else {
            return false;
        };
        let rows = data.row_count();
        let structure = data.data_structure();
        let fields: Vec<String> = if structure.is_empty() {
            data.field_names()
        } else {
            structure.iter().map(|(field, _)| field.clone()).collect()
        };
        if rows == 0 || fields.is_empty() {
            tracing::debug!(target: "horizon_datagrid::column", "no data to build columns from");
            return false;
        }

        let fields = fields.into_iter().filter(|field| {
            options
                .include
                .as_ref()
                .is_none_or(|include| include.contains(field))
        });
        let columns: Vec<Column> = fields
            .enumerate()
            .map(|(position, field)| {
                let data_type = options
                    .types
                    .get(&field)
                    .copied()
                    .or_else(|| {
                        structure
                            .iter()
                            .find(|(name, _)| *name == field)
                            .map(|(_, dtype)| *dtype)
                    })
                    .or_else(|| {
                        (0..rows).find_map(|row| {
                            data.field_value(&field, row)
                                .ok()
                                .as_ref()
                                .and_then(DataType::of)
                        })
                    })
                    .unwrap_or_default();
                let mut column = Column::new(field.clone())
                    .with_data_type(data_type)
                    .with_width(options.widths.get(&field).copied().unwrap_or(AUTOSIZE_WIDTH))
                    .with_order(
                        options
                            .orders
                            .get(&field)
                            .copied()
                            .unwrap_or(position as i32 * ORDER_STEP),
                    );
                if let Some(caption) = options.captions.get(&field) {
                    column.caption = caption.clone();
                }
                column
            })
            .collect();

        tracing::debug!(target: "horizon_datagrid::column", count = columns.len(), "columns built from data");
        self.set_columns(columns);
        true
    }

    pub(super) fn display_width(&self, column: &Column) -> i32 {
        self.widths.get(&column.data_field).copied().unwrap_or(if column.width >= 0 {
            column.width
        } else {
            DEFAULT_COLUMN_WIDTH
        })
    }

    /// Resolve every column's display width: persisted setting, then the
    /// explicit width, then autosize.
    pub(super) fn resolve_column_widths(&mut self) {
        self.widths.clear();
        for logical in 0..self.columns.len() {
            let Some(column) = self.columns.get(logical) else {
                continue;
            };
            let field = column.data_field.clone();
            let explicit = (column.width >= 0).then_some(column.width);
            let persisted = self
                .column_setting(&field, "Width")
                .and_then(|value| value.as_integer())
                .filter(|width| *width >= 0)
                .map(|width| width as i32);
            let width = match persisted.or(explicit) {
                Some(width) => width,
                None => self.measure_column(logical).unwrap_or(DEFAULT_COLUMN_WIDTH),
            };
            self.widths.insert(field, width);
        }
    }

    /// Send every visible column's width to the surface.
    pub(super) fn push_column_widths(&mut self) {
        let widths: Vec<i32> = (0..self.adapter.visible_count())
            .map(|physical| {
                self.physical_column(physical)
                    .map_or(DEFAULT_COLUMN_WIDTH, |column| self.display_width(column))
            })
            .collect();
        for (physical, width) in widths.into_iter().enumerate() {
            self.surface.set_column_width(physical, width);
        }
    }

    /// Change a display width without persisting it.
    pub(super) fn set_display_width(&mut self, logical: usize, field: &str, width: i32) {
        self.widths.insert(field.to_string(), width);
        if let Some(physical) = self.adapter.logical_to_physical(logical) {
            self.surface.set_column_width(physical, width);
        }
    }

    fn measure_column(&mut self, logical: usize) -> Option<i32> {
        let column = self.columns.get(logical)?;
        let bold = column.font_bold;
        let indicator = (self.config.sort_indicator_size + 2.0 * self.config.sort_indicator_buffer).ceil() as i32;
        let mut widest =
            self.text_measure.text_width(column.display_caption(), bold) + indicator + 2 * CAPTION_INSET;

        let now = Instant::now();
        for row in 0..self.row_count() {
            let Some(value) = self.logical_value_at(row, logical, now) else {
                continue;
            };
            let text = self.render_logical(row, logical, &value);
            widest = widest.max(self.text_measure.text_width(&text, bold) + 2 * CELL_PADDING);
        }
        let cap = self.config.autosize_max_width.max(MINIMUM_SECTION_WIDTH);
        Some(widest.clamp(MINIMUM_SECTION_WIDTH, cap))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::adapter::{RecordingSurface, SurfaceEvent};
    use crate::data_source::{MemoryCursor, RecordSet};
    use crate::grid::GridBuilder;
    use crate::settings::Settings;
    use crate::value::Value;

    use super::*;

    fn source() -> Arc<RecordSet> {
        Arc::new(RecordSet::from_rows(
            &["code", "description", "price"],
            vec![
                vec![Value::from("A1"), Value::from("short"), Value::Float(2.5)],
                vec![
                    Value::from("B2"),
                    Value::from("a considerably longer description of the item"),
                    Value::Float(10.0),
                ],
            ],
        ))
    }

    fn three_columns() -> Vec<Column> {
        vec![
            Column::new("code").with_width(50),
            Column::new("description").with_width(200),
            Column::new("price").with_data_type(DataType::Float).with_width(70),
        ]
    }

    #[test]
    fn test_width_precedence() {
        let settings = Arc::new(Settings::new());
        settings.set("f.g.column_code.Width", 90);
        let grid = GridBuilder::new("f", "g")
            .settings(settings)
            .data_source(source())
            .columns(vec![
                Column::new("code").with_width(50),
                Column::new("description"),
                Column::new("price").with_width(AUTOSIZE_WIDTH),
            ])
            .build();

        assert_eq!(grid.column_width(0), Some(90));
        assert_eq!(grid.column_width(1), Some(DEFAULT_COLUMN_WIDTH));
        // "price" caption: 35 + indicator 12 + insets 6
        assert_eq!(grid.column_width(2), Some(53));
    }

    #[test]
    fn test_autosize_caps_at_maximum() {
        let mut grid = GridBuilder::new("f", "g")
            .data_source(source())
            .columns(three_columns())
            .build();

        assert_eq!(grid.auto_size_column(1, false), Some(250));
        assert_eq!(grid.auto_size_column(0, false), Some(46));
        assert_eq!(grid.column(0).unwrap().width, 50);
        assert_eq!(grid.column_width(0), Some(46));
    }

    #[test]
    fn test_set_column_width_persists_and_signals() {
        let settings = Arc::new(Settings::new());
        let surface = RecordingSurface::new();
        let mut grid = GridBuilder::new("f", "g")
            .settings(settings.clone())
            .surface(surface.clone())
            .data_source(source())
            .columns(three_columns())
            .build();
        let resized = Arc::new(Mutex::new(Vec::new()));
        let sink = resized.clone();
        grid.signals.column_resized.connect(move |e| sink.lock().push(*e));

        surface.clear();
        assert!(grid.set_column_width(2, 5));
        assert_eq!(settings.get::<i32>("f.g.column_price.Width"), Some(MINIMUM_SECTION_WIDTH));
        assert_eq!(surface.events(), vec![SurfaceEvent::ColumnWidth(2, MINIMUM_SECTION_WIDTH)]);
        assert_eq!(resized.lock()[0], ColumnResizedEvent { col: 2, width: MINIMUM_SECTION_WIDTH });
    }

    #[test]
    fn test_move_column_persists_orders() {
        let settings = Arc::new(Settings::new());
        let mut grid = GridBuilder::new("f", "g")
            .settings(settings.clone())
            .data_source(source())
            .columns(three_columns())
            .build();
        let moved = Arc::new(Mutex::new(Vec::new()));
        let sink = moved.clone();
        grid.signals.column_moved.connect(move |e| sink.lock().push(*e));
        grid.set_current_cell(1, 0);

        assert!(grid.move_column(0, 2));
        let fields: Vec<&str> = grid.columns().iter().map(|c| c.data_field.as_str()).collect();
        assert_eq!(fields, vec!["description", "price", "code"]);
        assert_eq!(settings.get::<i32>("f.g.column_code.Order"), Some(20));
        assert_eq!(settings.get::<i32>("f.g.column_description.Order"), Some(0));
        assert_eq!(*moved.lock(), vec![ColumnMovedEvent { from: 0, to: 2 }]);
        assert_eq!(grid.current_cell(), Some((1, 2)));
        assert!(!grid.move_column(1, 1));
    }

    #[test]
    fn test_add_column_shifts_selection() {
        let mut grid = GridBuilder::new("f", "g")
            .data_source(source())
            .columns(three_columns())
            .build();
        grid.select(0, 1, false);

        let index = grid.add_column(Column::new("extra").with_order(5));
        assert_eq!(index, 1);
        assert!(grid.selection().is_selected(0, 2));
        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.column(1).unwrap().grid, Some(grid.id()));
    }

    #[test]
    fn test_update_column_widths_distributes_remainder() {
        let mut cols = three_columns();
        cols[0] = cols[0].clone().with_expand(true);
        cols[2] = cols[2].clone().with_expand(true);
        let mut grid = GridBuilder::new("f", "g")
            .data_source(source())
            .columns(cols)
            .build();

        assert!(grid.update_column_widths(325));
        assert_eq!(grid.column_width(0), Some(53));
        assert_eq!(grid.column_width(2), Some(72));
        assert!(!grid.update_column_widths(325));
    }

    #[test]
    fn test_build_from_data_set() {
        let cursor = Arc::new(MemoryCursor::new(
            vec![("id".to_string(), DataType::Int), ("title".to_string(), DataType::Str)],
            vec![vec![Value::Int(1), Value::from("one")]],
        ));
        let mut grid = GridBuilder::new("f", "g").data_source(cursor).build();
        let mut options = DataSetColumns::default();
        options.captions.insert("title".to_string(), "Title".to_string());
        options.widths.insert("id".to_string(), 40);

        assert!(grid.build_from_data_set(&options));
        assert_eq!(grid.columns().len(), 2);
        assert_eq!(grid.column(0).unwrap().data_type, DataType::Int);
        assert_eq!(grid.column(0).unwrap().width, 40);
        assert_eq!(grid.column(1).unwrap().display_caption(), "Title");
        assert_eq!(grid.column(1).unwrap().width, AUTOSIZE_WIDTH);
    }

    #[test]
    fn test_build_from_records_infers_types() {
        let records = Arc::new(RecordSet::from_rows(
            &["name", "score"],
            vec![
                vec![Value::from("x"), Value::Null],
                vec![Value::from("y"), Value::Float(1.5)],
            ],
        ));
        let mut grid = GridBuilder::new("f", "g").data_source(records).build();
        let options = DataSetColumns {
            include: Some(vec!["score".to_string()]),
            ..DataSetColumns::default()
        };

        assert!(grid.build_from_data_set(&options));
        assert_eq!(grid.columns().len(), 1);
        assert_eq!(grid.column(0).unwrap().data_type, DataType::Float);

        let empty = Arc::new(RecordSet::from_rows(&["a"], Vec::<Vec<Value>>::new()));
        let mut grid = GridBuilder::new("f", "g").data_source(empty).build();
        assert!(!grid.build_from_data_set(&DataSetColumns::default()));
    }
}
