//! Selection state.
//!
//! Row and column modes keep a set of indices; cell mode keeps a list of
//! rectangular ranges. Indices are logical rows and logical columns.

use std::collections::BTreeSet;

/// The unit a selection gesture selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Cell,
    Row,
    Column,
}

impl SelectionMode {
    /// Parse a mode name by its first two letters; anything else is `Cell`.
    pub fn parse(name: &str) -> Self {
        let prefix: String = name.trim().chars().take(2).collect::<String>().to_lowercase();
        match prefix.as_str() {
            "ro" => Self::Row,
            "co" => Self::Column,
            _ => Self::Cell,
        }
    }
}

/// An inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl CellRange {
    /// The range spanned by two corner cells, in any order.
    pub fn new(a: (usize, usize), b: (usize, usize)) -> Self {
        Self {
            top: a.0.min(b.0),
            left: a.1.min(b.1),
            bottom: a.0.max(b.0),
            right: a.1.max(b.1),
        }
    }

    pub fn single(row: usize, col: usize) -> Self {
        Self::new((row, col), (row, col))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.top..=self.bottom).contains(&row) && (self.left..=self.right).contains(&col)
    }

    /// Clip to `rows x cols`; `None` when nothing is left.
    fn clipped(self, rows: usize, cols: usize) -> Option<Self> {
        if self.top >= rows || self.left >= cols {
            return None;
        }
        Some(Self {
            bottom: self.bottom.min(rows - 1),
            right: self.right.min(cols - 1),
            ..self
        })
    }
}

/// The selection of one grid.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    mode: SelectionMode,
    multiple: bool,
    rows: BTreeSet<usize>,
    columns: BTreeSet<usize>,
    ranges: Vec<CellRange>,
}

impl SelectionModel {
    pub fn new(mode: SelectionMode, multiple: bool) -> Self {
        Self {
            mode,
            multiple,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Change the mode. The current selection is dropped.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if self.mode != mode {
            self.mode = mode;
            self.clear();
        }
    }

    pub fn multiple(&self) -> bool {
        self.multiple
    }

    /// Allow or forbid multiple selection. Forbidding it collapses the
    /// selection to the most recently selected unit.
    pub fn set_multiple(&mut self, multiple: bool) {
        self.multiple = multiple;
        if !multiple {
            self.collapse();
        }
    }

    /// Select the unit under `(row, col)` for the current mode.
    ///
    /// With `extend` and multiple selection on, the unit is added to the
    /// selection; otherwise it replaces it.
    pub fn select(&mut self, row: usize, col: usize, extend: bool) {
        let replace = !(extend && self.multiple);
        if replace {
            self.clear();
        }
        match self.mode {
            SelectionMode::Row => {
                self.rows.insert(row);
            }
            SelectionMode::Column => {
                self.columns.insert(col);
            }
            SelectionMode::Cell => self.ranges.push(CellRange::single(row, col)),
        }
    }

    /// Apply a drag gesture from `anchor` to `end`.
    ///
    /// In single selection mode only the unit under `end` is kept.
    pub fn select_range(&mut self, anchor: (usize, usize), end: (usize, usize), extend: bool) {
        if !self.multiple {
            self.select(end.0, end.1, false);
            return;
        }
        if !extend {
            self.clear();
        }
        match self.mode {
            SelectionMode::Row => self.rows.extend(anchor.0.min(end.0)..=anchor.0.max(end.0)),
            SelectionMode::Column => self.columns.extend(anchor.1.min(end.1)..=anchor.1.max(end.1)),
            SelectionMode::Cell => self.ranges.push(CellRange::new(anchor, end)),
        }
    }

    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        match self.mode {
            SelectionMode::Row => self.rows.contains(&row),
            SelectionMode::Column => self.columns.contains(&col),
            SelectionMode::Cell => self.ranges.iter().any(|r| r.contains(row, col)),
        }
    }

    pub fn selected_rows(&self) -> Vec<usize> {
        self.rows.iter().copied().collect()
    }

    pub fn selected_columns(&self) -> Vec<usize> {
        self.columns.iter().copied().collect()
    }

    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty() && self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
        self.ranges.clear();
    }

    /// Drop everything outside `rows x cols`; ranges are clipped.
    ///
    /// Returns `true` if the selection changed.
    pub fn clamp(&mut self, rows: usize, cols: usize) -> bool {
        let before = (self.rows.len(), self.columns.len(), self.ranges.clone());
        self.rows.retain(|&r| r < rows);
        self.columns.retain(|&c| c < cols);
        self.ranges = self
            .ranges
            .iter()
            .filter_map(|r| r.clipped(rows, cols))
            .collect();
        let changed = before != (self.rows.len(), self.columns.len(), self.ranges.clone());
        if changed {
            tracing::debug!(target: "horizon_datagrid::adapter", rows, cols, "selection clamped");
        }
        changed
    }

    /// Account for removal of logical column `index`: its selection goes,
    /// and higher columns shift down by one.
    pub fn remove_column_index(&mut self, index: usize) {
        self.columns = self
            .columns
            .iter()
            .filter(|&&c| c != index)
            .map(|&c| if c > index { c - 1 } else { c })
            .collect();

        let shift = |c: usize| if c > index { c - 1 } else { c };
        self.ranges = self
            .ranges
            .iter()
            .filter(|r| !(r.left == index && r.right == index))
            .map(|r| CellRange {
                left: shift(r.left),
                right: if r.right >= index && r.right > r.left { r.right - 1 } else { shift(r.right) },
                ..*r
            })
            .collect();
    }

    /// Move column indices through `map`, after an insert or a move changed
    /// the logical positions. Ranges keep the span of their mapped corners.
    pub fn remap_columns(&mut self, map: impl Fn(usize) -> usize) {
        self.columns = self.columns.iter().map(|&c| map(c)).collect();
        self.ranges = self
            .ranges
            .iter()
            .map(|r| CellRange::new((r.top, map(r.left)), (r.bottom, map(r.right))))
            .collect();
    }

    /// Move row indices through `map` after the rows were reordered.
    ///
    /// Rows that `map` drops are deselected. A cell range is split into
    /// rows and rejoined where the mapped rows are adjacent.
    pub fn remap_rows(&mut self, map: impl Fn(usize) -> Option<usize>) {
        self.rows = self.rows.iter().filter_map(|&r| map(r)).collect();

        let mut pieces: Vec<CellRange> = self
            .ranges
            .iter()
            .flat_map(|r| {
                (r.top..=r.bottom)
                    .filter_map(&map)
                    .map(|row| CellRange {
                        top: row,
                        bottom: row,
                        ..*r
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        pieces.sort_by_key(|r| (r.left, r.right, r.top));
        pieces.dedup();

        let mut ranges: Vec<CellRange> = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match ranges.last_mut() {
                Some(last)
                    if last.left == piece.left && last.right == piece.right && last.bottom + 1 == piece.top =>
                {
                    last.bottom = piece.bottom;
                }
                _ => ranges.push(piece),
            }
        }
        self.ranges = ranges;
    }

    fn collapse(&mut self) {
        if let Some(&row) = self.rows.iter().next_back() {
            self.rows = BTreeSet::from([row]);
        }
        if let Some(&col) = self.columns.iter().next_back() {
            self.columns = BTreeSet::from([col]);
        }
        if let Some(last) = self.ranges.last().copied() {
            self.ranges = vec![CellRange::single(last.bottom, last.right)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(SelectionMode::parse("Row"), SelectionMode::Row);
        assert_eq!(SelectionMode::parse("cols"), SelectionMode::Column);
        assert_eq!(SelectionMode::parse("whatever"), SelectionMode::Cell);
    }

    #[test]
    fn test_single_selection_collapses_gestures() {
        let mut sel = SelectionModel::new(SelectionMode::Row, false);
        sel.select(1, 0, false);
        sel.select(3, 0, true);
        assert_eq!(sel.selected_rows(), vec![3]);

        sel.select_range((0, 0), (5, 0), false);
        assert_eq!(sel.selected_rows(), vec![5]);
    }

    #[test]
    fn test_multiple_row_selection() {
        let mut sel = SelectionModel::new(SelectionMode::Row, true);
        sel.select(1, 0, false);
        sel.select_range((4, 0), (6, 0), true);
        assert_eq!(sel.selected_rows(), vec![1, 4, 5, 6]);

        sel.set_multiple(false);
        assert_eq!(sel.selected_rows(), vec![6]);
    }

    #[test]
    fn test_clamp_drops_and_clips() {
        let mut sel = SelectionModel::new(SelectionMode::Cell, true);
        sel.select_range((1, 1), (9, 9), false);
        sel.select(8, 0, true);

        assert!(sel.clamp(5, 4));
        assert_eq!(sel.ranges(), &[CellRange::new((1, 1), (4, 3))]);
        assert!(!sel.clamp(5, 4));
    }

    #[test]
    fn test_remap_rows_follows_records() {
        let mut rows = SelectionModel::new(SelectionMode::Row, true);
        rows.select(0, 0, false);
        rows.select(2, 0, true);
        // Reversed order of four rows.
        rows.remap_rows(|r| Some(3 - r));
        assert_eq!(rows.selected_rows(), vec![1, 3]);

        let mut cells = SelectionModel::new(SelectionMode::Cell, true);
        cells.select_range((0, 1), (2, 2), false);
        cells.remap_rows(|r| [3, 0, 2, 1].get(r).copied());
        assert_eq!(cells.ranges(), &[CellRange::new((0, 1), (0, 2)), CellRange::new((2, 1), (3, 2))]);
        assert!(cells.is_selected(3, 1));
        assert!(!cells.is_selected(1, 1));
    }

    #[test]
    fn test_remove_column_index_shifts() {
        let mut sel = SelectionModel::new(SelectionMode::Column, true);
        sel.select_range((0, 1), (0, 3), false);
        sel.remove_column_index(2);
        assert_eq!(sel.selected_columns(), vec![1, 2]);

        let mut cells = SelectionModel::new(SelectionMode::Cell, true);
        cells.select(0, 2, false);
        cells.select_range((1, 1), (1, 3), true);
        cells.remove_column_index(2);
        assert_eq!(cells.ranges(), &[CellRange::new((1, 1), (1, 2))]);
    }

    #[test]
    fn test_remap_columns() {
        let mut sel = SelectionModel::new(SelectionMode::Column, true);
        sel.select(0, 0, false);
        sel.select(0, 2, true);
        sel.remap_columns(|c| if c >= 1 { c + 1 } else { c });
        assert_eq!(sel.selected_columns(), vec![0, 3]);

        let mut cells = SelectionModel::new(SelectionMode::Cell, true);
        cells.select_range((0, 1), (2, 2), false);
        cells.remap_columns(|c| 3 - c);
        assert_eq!(cells.ranges(), &[CellRange::new((0, 1), (2, 2))]);
    }
}
