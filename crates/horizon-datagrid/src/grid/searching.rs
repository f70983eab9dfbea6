//! Incremental search, find/replace and deferred grid work.

use std::time::{Duration, Instant};

use super::Grid;
use crate::search::{FindOptions, SearchOutcome, TextMatcher, search_values};
use crate::value::{DataType, Value};

/// Work a grid defers to a later turn of the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridTask {
    /// Search the buffered keystrokes.
    RunSearch,
    /// Redistribute width after a column resize.
    SettleColumnWidths,
}

impl Grid {
    /// Route a typed character to incremental search.
    pub fn handle_char(&mut self, ch: char) -> bool {
        self.handle_char_at(ch, Instant::now())
    }

    /// Buffer `ch` and restart the search delay.
    ///
    /// The character is refused (`false`) when it is a control character,
    /// when an editor is open or the current cell is editable, or when the
    /// grid or current column is not searchable.
    pub fn handle_char_at(&mut self, ch: char, now: Instant) -> bool {
        if ch.is_control() || !self.config.searchable || self.edit.is_editing() {
            return false;
        }
        let Some((_, logical)) = self.current else {
            return false;
        };
        let Some(column) = self.columns.get(logical) else {
            return false;
        };
        if !column.searchable || self.is_column_editable(logical) {
            return false;
        }

        self.search.push(ch);
        self.deferred
            .restart_at(GridTask::RunSearch, self.config.search_delay_duration(), now);
        tracing::trace!(target: "horizon_datagrid::search", buffer = self.search.text(), "search buffered");
        true
    }

    /// Text typed since the last search ran.
    pub fn search_text(&self) -> &str {
        self.search.text()
    }

    /// Search the current column for the buffered text and clear the buffer.
    ///
    /// A match becomes the current cell; a miss leaves it where it was.
    pub fn run_inc_search(&mut self) -> SearchOutcome {
        let text = self.search.take();
        let Some((_, logical)) = self.current else {
            return SearchOutcome::NotFound;
        };
        let Some(column) = self.columns.get(logical) else {
            return SearchOutcome::NotFound;
        };
        let (field, data_type) = (column.data_field.clone(), column.data_type);
        let Some(data) = self.data.clone() else {
            return SearchOutcome::NotFound;
        };

        let values: Vec<Value> = (0..data.row_count())
            .map(|row| data.field_value(&field, row).unwrap_or_default())
            .collect();
        // A column left at the default type searches by what the field holds.
        let data_type = match data_type {
            DataType::Str => values.iter().find_map(DataType::of).unwrap_or(DataType::Str),
            declared => declared,
        };
        let outcome = search_values(
            &values,
            &text,
            data_type,
            self.config.search_nearest,
            self.config.search_case_sensitive,
        );
        tracing::debug!(target: "horizon_datagrid::search", field, text, outcome = ?outcome, "incremental search");

        if let SearchOutcome::Found(row) = outcome {
            self.move_current(row, logical);
        }
        outcome
    }

    /// Find the next visible cell whose text contains `text`.
    ///
    /// The scan starts after the current cell, runs row by row in the
    /// direction of `options.search_down`, and wraps when asked to. A match
    /// becomes the current cell. Returns its (row, physical column).
    pub fn find(&mut self, text: &str, options: &FindOptions) -> Option<(usize, usize)> {
        let matcher = TextMatcher::new(text, options)?;
        let rows = self.row_count();
        let cols = self.adapter.visible_count();
        let total = rows * cols;
        if total == 0 {
            return None;
        }

        let total = total as isize;
        let start = match self.current_cell() {
            Some((row, col)) => (row * cols + col) as isize,
            None if options.search_down => -1,
            None => total,
        };
        let step = if options.search_down { 1 } else { -1 };
        for k in 1..=total {
            let mut position = start + step * k;
            if !(0..total).contains(&position) {
                if !options.wrap {
                    break;
                }
                position = position.rem_euclid(total);
            }
            let (row, physical) = (position as usize / cols, position as usize % cols);
            let Some(cell) = self.cell_text(row, physical) else {
                continue;
            };
            if matcher.is_match(&cell) {
                self.set_current_cell(row, physical);
                tracing::debug!(target: "horizon_datagrid::search", row, col = physical, "found");
                return Some((row, physical));
            }
        }
        tracing::debug!(target: "horizon_datagrid::search", text, "not found");
        None
    }

    /// Replace `text` in every matching string cell of the editable visible
    /// columns. Each change goes through the edit path. Returns the number
    /// of cells changed.
    pub fn replace_all(&mut self, text: &str, replacement: &str, options: &FindOptions) -> usize {
        let Some(matcher) = TextMatcher::new(text, options) else {
            return 0;
        };
        let mut replaced = 0;
        for physical in 0..self.adapter.visible_count() {
            let Some(logical) = self.adapter.physical_to_logical(physical) else {
                continue;
            };
            if !self.is_column_editable(logical) {
                continue;
            }
            for row in 0..self.row_count() {
                let Some(Value::Str(current)) = self.cell_value(row, physical) else {
                    continue;
                };
                if !matcher.is_match(&current) {
                    continue;
                }
                let new = matcher.replace_all(&current, replacement).into_owned();
                if self.set_cell_value(row, physical, Value::Str(new)).is_committed() {
                    replaced += 1;
                }
            }
        }
        tracing::debug!(target: "horizon_datagrid::search", text, replaced, "replace all");
        replaced
    }

    /// Run deferred work that is due at `now`. Returns how many tasks ran.
    pub fn process_deferred_at(&mut self, now: Instant) -> usize {
        let tasks = self.deferred.take_ready_at(now);
        for task in &tasks {
            match task {
                GridTask::RunSearch => {
                    if !self.search.is_empty() {
                        self.run_inc_search();
                    }
                }
                GridTask::SettleColumnWidths => {
                    if self.grid_width > 0 {
                        self.update_column_widths(self.grid_width);
                    }
                }
            }
        }
        tasks.len()
    }

    /// Run deferred work that is due now.
    pub fn process_deferred(&mut self) -> usize {
        self.process_deferred_at(Instant::now())
    }

    /// How long the host may sleep before deferred work is due.
    pub fn time_until_deferred_at(&mut self, now: Instant) -> Option<Duration> {
        self.deferred.time_until_next_at(now)
    }

    /// Whether deferred work is waiting.
    pub fn has_deferred_work(&self) -> bool {
        self.deferred.pending_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::column::Column;
    use crate::config::GridConfig;
    use crate::data_source::RecordSet;
    use crate::grid::GridBuilder;

    use super::*;

    fn grid() -> Grid {
        let data = Arc::new(RecordSet::from_rows(
            &["city", "pop"],
            vec![
                vec![Value::from("Oslo"), Value::Int(700)],
                vec![Value::from("Bergen"), Value::Int(290)],
                vec![Value::from("Trondheim"), Value::Int(210)],
                vec![Value::from("Bodo"), Value::Int(53)],
            ],
        ));
        GridBuilder::new("f", "g")
            .data_source(data)
            .columns(vec![
                Column::new("city"),
                Column::new("pop").with_data_type(DataType::Int),
            ])
            .build()
    }

    #[test]
    fn test_keystrokes_debounce_into_one_search() {
        let mut grid = grid();
        grid.set_current_cell(0, 0);
        let start = Instant::now();

        assert!(grid.handle_char_at('b', start));
        assert!(grid.handle_char_at('o', start + Duration::from_millis(200)));
        assert_eq!(grid.search_text(), "bo");

        assert_eq!(grid.process_deferred_at(start + Duration::from_millis(600)), 0);
        assert_eq!(grid.process_deferred_at(start + Duration::from_millis(700)), 1);
        assert_eq!(grid.current_cell(), Some((3, 0)));
        assert_eq!(grid.search_text(), "");
        assert!(!grid.has_deferred_work());
    }

    #[test]
    fn test_search_gate() {
        let mut grid = grid();
        assert!(!grid.handle_char('x'));

        grid.set_current_cell(0, 0);
        assert!(!grid.handle_char('\n'));
        assert!(grid.handle_char('x'));

        let mut editable = GridBuilder::new("f", "g")
            .config(GridConfig {
                editable: true,
                ..GridConfig::default()
            })
            .data_source(Arc::new(RecordSet::from_rows(&["a"], vec![vec![Value::from("v")]])))
            .columns(vec![Column::new("a")])
            .build();
        editable.set_current_cell(0, 0);
        assert!(!editable.handle_char('v'));
    }

    #[test]
    fn test_miss_keeps_current_cell() {
        let mut grid = grid();
        grid.set_current_cell(2, 0);
        grid.handle_char('a');
        assert_eq!(grid.run_inc_search(), SearchOutcome::NotFound);
        assert_eq!(grid.current_cell(), Some((2, 0)));
    }

    #[test]
    fn test_untyped_column_searches_by_field_values() {
        let data = Arc::new(RecordSet::from_rows(
            &["pop"],
            [700, 290, 210, 53].map(|n| vec![Value::Int(n)]),
        ));
        let mut grid = GridBuilder::new("f", "g")
            .data_source(data)
            .columns(vec![Column::new("pop")])
            .build();
        grid.set_current_cell(0, 0);

        grid.handle_char('1');
        grid.handle_char('0');
        grid.handle_char('0');
        assert_eq!(grid.run_inc_search(), SearchOutcome::Found(3));
        assert_eq!(grid.current_cell(), Some((3, 0)));
    }

    #[test]
    fn test_find_wraps_and_respects_direction() {
        let mut grid = grid();
        let options = FindOptions::default();

        assert_eq!(grid.find("o", &options), Some((0, 0)));
        assert_eq!(grid.find("o", &options), Some((2, 0)));
        assert_eq!(grid.find("o", &options), Some((3, 0)));
        assert_eq!(grid.find("o", &options), Some((0, 0)));

        let up = FindOptions {
            search_down: false,
            wrap: false,
            ..options
        };
        assert_eq!(grid.find("o", &up), None);
        assert_eq!(grid.find("xyz", &options), None);
        assert_eq!(grid.find("", &options), None);
    }

    #[test]
    fn test_replace_all_only_touches_editable_columns() {
        let mut grid = grid();
        let options = FindOptions::default();
        assert_eq!(grid.replace_all("o", "0", &options), 0);

        let data = Arc::new(RecordSet::from_rows(
            &["city"],
            vec![vec![Value::from("Oslo")], vec![Value::from("Bodo")], vec![Value::from("Rana")]],
        ));
        let mut editable = GridBuilder::new("f", "g")
            .config(GridConfig {
                editable: true,
                ..GridConfig::default()
            })
            .data_source(data)
            .columns(vec![Column::new("city")])
            .build();

        assert_eq!(editable.replace_all("o", "0", &options), 2);
        assert_eq!(editable.cell_text(0, 0).as_deref(), Some("0sl0"));
        assert_eq!(editable.cell_text(1, 0).as_deref(), Some("B0d0"));
        assert_eq!(editable.cell_text(2, 0).as_deref(), Some("Rana"));
    }
}
