//! Sorting rows by a column.

use horizon_datagrid_core::PerfSpan;

use super::Grid;
use crate::error::Result;
use crate::events::SortEvent;
use crate::sort::{SortOrder, SortState, sort_permutation};
use crate::value::Value;

impl Grid {
    /// The current sort.
    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Labels shown beside each row.
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn set_row_labels(&mut self, labels: Vec<String>) {
        self.row_labels = labels;
        self.surface.refresh();
    }

    /// Sort on a logical column.
    ///
    /// With `toggle`, repeated calls on one column cycle ascending,
    /// descending and unsorted, and a different column starts ascending.
    /// Without it, the column's current order is applied again, defaulting
    /// to ascending. Returns `false` if the column cannot be sorted.
    #[tracing::instrument(skip(self), target = "horizon_datagrid::sort", level = "debug")]
    pub fn process_sort(&mut self, logical: usize, toggle: bool) -> bool {
        let Some(column) = self.columns.get(logical) else {
            return false;
        };
        if !(self.config.sortable && column.sortable) {
            tracing::debug!(target: "horizon_datagrid::sort", field = %column.data_field, "column is not sortable");
            return false;
        }
        let field = column.data_field.clone();
        if self.edit.is_editing() {
            self.cancel_edit();
        }

        let order = if toggle {
            self.sort.toggle(&field)
        } else {
            let order = self.sort.order_for(&field).unwrap_or(SortOrder::Ascending);
            self.sort.set(&field, Some(order));
            Some(order)
        };
        let event = SortEvent {
            col: logical,
            field: field.clone(),
            order,
        };
        self.signals.sort_begin.emit(event.clone());

        if let Some(order) = order {
            match self.sort_rows(&field, order) {
                Ok(current) => {
                    if let Some(row) = current {
                        self.current = self.current.map(|(_, col)| (row, col));
                    }
                }
                Err(err) => {
                    tracing::warn!(target: "horizon_datagrid::sort", field, error = %err, "sort failed");
                }
            }
        }

        self.save_setting(&self.settings_key.grid("sortedColumn"), order.map(|_| field.clone()));
        self.save_setting(&self.settings_key.grid("sortOrder"), order.map(SortOrder::as_str));

        self.cache.clear();
        self.surface.refresh();
        tracing::debug!(target: "horizon_datagrid::sort", field, order = ?order, "sorted");
        self.signals.sort_end.emit(event);
        true
    }

    /// Replay the persisted sort without emitting signals.
    pub fn restore_sort(&mut self) -> bool {
        let Some(field) = self
            .setting(&self.settings_key.grid("sortedColumn"))
            .and_then(|value| value.as_str().map(str::to_string))
        else {
            return false;
        };
        let Some(order) = self
            .setting(&self.settings_key.grid("sortOrder"))
            .and_then(|value| value.as_str().and_then(SortOrder::parse))
        else {
            return false;
        };
        let Some(logical) = self.columns.index_of_field(&field) else {
            tracing::debug!(target: "horizon_datagrid::sort", field, "persisted sort column no longer exists");
            return false;
        };

        self.sort.set(&field, Some(order));
        self.signals.set_blocked(true);
        let sorted = self.process_sort(logical, false);
        self.signals.set_blocked(false);
        sorted
    }

    /// Reorder the data source. Returns the new row of the current row when
    /// it moved.
    fn sort_rows(&mut self, field: &str, order: SortOrder) -> Result<Option<usize>> {
        let Some(data) = self.data.clone() else {
            return Ok(None);
        };
        let case_sensitive = self.config.case_sensitive_sorting;

        if data.supports_sort() {
            data.sort(field, order, case_sensitive)?;
            return Ok(data.current_row());
        }

        let _perf = PerfSpan::new("in_memory_sort");
        let rows = data.row_count();
        let values: Vec<Value> = (0..rows)
            .map(|row| data.field_value(field, row))
            .collect::<Result<_>>()?;
        let permutation = sort_permutation(&values, order, case_sensitive);
        data.reorder(&permutation)?;

        if self.row_labels.len() == rows {
            self.row_labels = permutation
                .iter()
                .map(|&old| self.row_labels[old].clone())
                .collect();
        }
        let mut new_row = vec![0; rows];
        for (new, &old) in permutation.iter().enumerate() {
            new_row[old] = new;
        }
        self.selection.remap_rows(|row| new_row.get(row).copied());
        Ok(self.current.and_then(|(row, _)| new_row.get(row).copied()))
    }
}
