//! Column definitions and the ordered column model.
//!
//! A [`Column`] projects one data field onto the grid. The [`ColumnModel`]
//! owns the ordered list of columns and keeps their `order` values unique by
//! renumbering to `index * 10` after every structural change, so display
//! position never depends on sort stability.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dynamic::{DynamicBinding, DynamicBindings, DynamicProperty};
use crate::grid::GridId;
use crate::paint::Color;
use crate::registry::{CellRenderer, EditorFactory};
use crate::value::{DataType, Value};

/// Width of a new column, in pixels.
pub const DEFAULT_COLUMN_WIDTH: i32 = 150;

/// Width value meaning "let the grid autosize this column".
pub const AUTOSIZE_WIDTH: i32 = -1;

/// Spacing between consecutive `order` values after renumbering.
pub const ORDER_STEP: i32 = 10;

/// Horizontal alignment of cell or header content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    /// Right for numeric columns, left otherwise.
    #[default]
    Automatic,
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    /// Parse an alignment name; any unambiguous prefix is accepted.
    ///
    /// Unrecognized names fall back to `Left` with a warning.
    pub fn parse(name: &str) -> Self {
        match expand_choice(name, &["automatic", "left", "center", "right"]) {
            Some("automatic") => Self::Automatic,
            Some("left") => Self::Left,
            Some("center") => Self::Center,
            Some("right") => Self::Right,
            _ => {
                tracing::warn!(
                    target: "horizon_datagrid::column",
                    value = name,
                    "invalid horizontal alignment, using Left"
                );
                Self::Left
            }
        }
    }

    /// Resolve `Automatic` for a column of `dtype`.
    pub fn resolve(self, dtype: DataType) -> Self {
        match self {
            Self::Automatic if dtype.is_numeric() => Self::Right,
            Self::Automatic => Self::Left,
            other => other,
        }
    }
}

/// Vertical alignment of cell or header content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VerticalAlignment {
    Top,
    #[default]
    Center,
    Bottom,
}

impl VerticalAlignment {
    /// Parse an alignment name; any unambiguous prefix is accepted.
    ///
    /// Unrecognized names fall back to `Top` with a warning.
    pub fn parse(name: &str) -> Self {
        match expand_choice(name, &["top", "center", "bottom"]) {
            Some("top") => Self::Top,
            Some("center") => Self::Center,
            Some("bottom") => Self::Bottom,
            _ => {
                tracing::warn!(
                    target: "horizon_datagrid::column",
                    value = name,
                    "invalid vertical alignment, using Top"
                );
                Self::Top
            }
        }
    }
}

/// Match `input` case-insensitively against a unique prefix of one choice.
fn expand_choice<'a>(input: &str, choices: &[&'a str]) -> Option<&'a str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    let mut matches = choices.iter().filter(|c| c.starts_with(&input));
    let first = matches.next()?;
    matches.next().is_none().then_some(*first)
}

/// One logical column of a grid.
#[derive(Clone)]
pub struct Column {
    /// Key of the field in each row record.
    pub data_field: String,
    /// Header text. Empty means "use the data field".
    pub caption: String,
    pub data_type: DataType,
    /// Display position; `-1` until assigned.
    pub order: i32,
    /// Width in pixels; [`AUTOSIZE_WIDTH`] to autosize.
    pub width: i32,
    pub visible: bool,
    pub editable: bool,
    pub sortable: bool,
    pub searchable: bool,
    pub movable: bool,
    pub resizable: bool,
    /// Absorbs leftover grid width.
    pub expand: bool,
    /// Fractional digits shown for float and decimal values.
    pub precision: usize,
    /// Valid values for list-typed editing.
    pub list_choices: Vec<Value>,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    /// Header alignment; `None` uses the grid default.
    pub header_horizontal_alignment: Option<HorizontalAlignment>,
    pub header_vertical_alignment: Option<VerticalAlignment>,
    pub fore_color: Option<Color>,
    pub back_color: Option<Color>,
    pub header_fore_color: Option<Color>,
    pub header_back_color: Option<Color>,
    pub font_bold: bool,
    pub word_wrap: bool,
    /// Renderer used instead of the data type default.
    pub custom_renderer: Option<Arc<dyn CellRenderer>>,
    /// Editor used instead of the data type default.
    pub custom_editor: Option<EditorFactory>,
    /// Per-row renderer overrides.
    pub custom_renderers: HashMap<usize, Arc<dyn CellRenderer>>,
    /// Per-row editor overrides.
    pub custom_editors: HashMap<usize, EditorFactory>,
    /// Per-row choice sets for list editing.
    pub custom_list_choices: HashMap<usize, Vec<Value>>,
    /// Computed properties evaluated at refresh and paint time.
    pub dynamic: DynamicBindings,
    /// The grid this column belongs to, if any.
    pub grid: Option<GridId>,
}

impl Column {
    /// Create a column bound to `data_field`.
    pub fn new(data_field: impl Into<String>) -> Self {
        Self {
            data_field: data_field.into(),
            caption: String::new(),
            data_type: DataType::Str,
            order: -1,
            width: DEFAULT_COLUMN_WIDTH,
            visible: true,
            editable: true,
            sortable: true,
            searchable: true,
            movable: true,
            resizable: true,
            expand: false,
            precision: 2,
            list_choices: Vec::new(),
            horizontal_alignment: HorizontalAlignment::Automatic,
            vertical_alignment: VerticalAlignment::Center,
            header_horizontal_alignment: None,
            header_vertical_alignment: None,
            fore_color: None,
            back_color: None,
            header_fore_color: None,
            header_back_color: None,
            font_bold: false,
            word_wrap: false,
            custom_renderer: None,
            custom_editor: None,
            custom_renderers: HashMap::new(),
            custom_editors: HashMap::new(),
            custom_list_choices: HashMap::new(),
            dynamic: DynamicBindings::new(),
            grid: None,
        }
    }

    /// Header text, falling back to the data field.
    pub fn display_caption(&self) -> &str {
        if self.caption.is_empty() {
            &self.data_field
        } else {
            &self.caption
        }
    }

    /// Cell alignment with `Automatic` resolved.
    pub fn effective_horizontal_alignment(&self) -> HorizontalAlignment {
        self.horizontal_alignment.resolve(self.data_type)
    }

    /// Choices valid for `row`: the per-row set, else the column set.
    pub fn list_choices_for_row(&self, row: usize) -> &[Value] {
        self.custom_list_choices
            .get(&row)
            .unwrap_or(&self.list_choices)
    }

    /// Set the data type from a tag string (see [`DataType::parse_tag`]).
    pub fn set_data_type_tag(&mut self, tag: &str) {
        self.data_type = DataType::parse_tag(tag);
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Set the data type from a tag string.
    pub fn with_data_type_tag(mut self, tag: &str) -> Self {
        self.set_data_type_tag(tag);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_width(mut self, width: i32) -> Self {
        self.width = width;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn with_movable(mut self, movable: bool) -> Self {
        self.movable = movable;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_list_choices(mut self, choices: Vec<Value>) -> Self {
        self.list_choices = choices;
        self
    }

    pub fn with_horizontal_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.horizontal_alignment = alignment;
        self
    }

    pub fn with_vertical_alignment(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    pub fn with_custom_renderer(mut self, renderer: Arc<dyn CellRenderer>) -> Self {
        self.custom_renderer = Some(renderer);
        self
    }

    pub fn with_custom_editor(mut self, editor: EditorFactory) -> Self {
        self.custom_editor = Some(editor);
        self
    }

    /// Attach a computed property.
    pub fn with_dynamic(mut self, binding: DynamicBinding) -> Self {
        self.dynamic.insert(binding.property, binding);
        self
    }

    /// Remove a computed property.
    pub fn clear_dynamic(&mut self, property: DynamicProperty) -> Option<DynamicBinding> {
        self.dynamic.remove(&property)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("data_field", &self.data_field)
            .field("data_type", &self.data_type)
            .field("order", &self.order)
            .field("width", &self.width)
            .field("visible", &self.visible)
            .field("dynamic", &self.dynamic.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Columns compare by configuration. Renderer and editor overrides compare by
/// identity; the owning grid is ignored.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        fn same_renderer(a: &Arc<dyn CellRenderer>, b: &Arc<dyn CellRenderer>) -> bool {
            Arc::ptr_eq(a, b)
        }
        fn same_row_map<T>(
            a: &HashMap<usize, T>,
            b: &HashMap<usize, T>,
            same: impl Fn(&T, &T) -> bool,
        ) -> bool {
            a.len() == b.len()
                && a.iter()
                    .all(|(row, x)| b.get(row).is_some_and(|y| same(x, y)))
        }

        self.data_field == other.data_field
            && self.caption == other.caption
            && self.data_type == other.data_type
            && self.order == other.order
            && self.width == other.width
            && self.visible == other.visible
            && self.editable == other.editable
            && self.sortable == other.sortable
            && self.searchable == other.searchable
            && self.movable == other.movable
            && self.resizable == other.resizable
            && self.expand == other.expand
            && self.precision == other.precision
            && self.list_choices == other.list_choices
            && self.horizontal_alignment == other.horizontal_alignment
            && self.vertical_alignment == other.vertical_alignment
            && self.header_horizontal_alignment == other.header_horizontal_alignment
            && self.header_vertical_alignment == other.header_vertical_alignment
            && self.fore_color == other.fore_color
            && self.back_color == other.back_color
            && self.header_fore_color == other.header_fore_color
            && self.header_back_color == other.header_back_color
            && self.font_bold == other.font_bold
            && self.word_wrap == other.word_wrap
            && match (&self.custom_renderer, &other.custom_renderer) {
                (Some(a), Some(b)) => same_renderer(a, b),
                (None, None) => true,
                _ => false,
            }
            && self.custom_editor == other.custom_editor
            && same_row_map(&self.custom_renderers, &other.custom_renderers, same_renderer)
            && same_row_map(&self.custom_editors, &other.custom_editors, |a, b| a == b)
            && self.custom_list_choices == other.custom_list_choices
            && self.dynamic.len() == other.dynamic.len()
            && self
                .dynamic
                .iter()
                .all(|(prop, binding)| other.dynamic.get(prop).is_some_and(|b| b.same_as(binding)))
    }
}

/// The ordered set of logical columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnModel {
    columns: Vec<Column>,
    generation: u64,
}

impl ColumnModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole column set.
    ///
    /// Columns without an order take their position; the set is then stably
    /// sorted by order and renumbered. Returns `false`, without touching the
    /// model, when the normalized set equals the current one.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> bool {
        let mut columns = columns;
        prepare_columns(&mut columns);

        if columns == self.columns {
            tracing::trace!(target: "horizon_datagrid::column", "column set unchanged");
            return false;
        }
        tracing::debug!(target: "horizon_datagrid::column", count = columns.len(), "column set replaced");
        self.columns = columns;
        self.generation += 1;
        true
    }

    /// Add a column and return its logical index.
    ///
    /// A column without an order is placed after all others.
    pub fn add(&mut self, mut column: Column) -> usize {
        if column.order < 0 {
            column.order = if self.columns.is_empty() {
                0
            } else {
                self.max_order() + ORDER_STEP
            };
        }
        // Equal orders put the new column after the existing one.
        let index = self
            .columns
            .iter()
            .take_while(|c| c.order <= column.order)
            .count();
        let field = column.data_field.clone();
        self.columns.insert(index, column);
        self.renumber();
        self.generation += 1;

        tracing::debug!(target: "horizon_datagrid::column", field, index, "column added");
        index
    }

    /// Remove the column at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Column> {
        if index >= self.columns.len() {
            return None;
        }
        let removed = self.columns.remove(index);
        self.renumber();
        self.generation += 1;
        tracing::debug!(target: "horizon_datagrid::column", field = %removed.data_field, index, "column removed");
        Some(removed)
    }

    /// Remove the first column bound to `field`. Non-members are ignored.
    pub fn remove_field(&mut self, field: &str) -> Option<Column> {
        let index = self.index_of_field(field)?;
        self.remove(index)
    }

    /// Move the column at `from` so it ends at logical index `to`.
    ///
    /// `to` is clamped to the last index. Returns `false` when nothing moved.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        if from >= self.columns.len() {
            return false;
        }
        let to = to.min(self.columns.len() - 1);
        if from == to {
            return false;
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        self.renumber();
        self.generation += 1;
        true
    }

    /// Reassign every order as `index * 10`.
    pub fn renumber(&mut self) {
        for (idx, col) in self.columns.iter_mut().enumerate() {
            col.order = idx as i32 * ORDER_STEP;
        }
    }

    /// Highest order of all columns, or `-1` when empty.
    pub fn max_order(&self) -> i32 {
        self.columns.iter().map(|c| c.order).max().unwrap_or(-1)
    }

    /// Logical index of the first column bound to `field`.
    pub fn index_of_field(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.data_field == field)
    }

    /// Logical indices of visible columns, ascending.
    pub fn visible_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.visible)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Mutable access that renormalizes orders when the guard drops.
    pub fn get_mut(&mut self, index: usize) -> Option<ColumnMut<'_>> {
        (index < self.columns.len()).then_some(ColumnMut { model: self, index })
    }

    /// Mutable access without renormalization, for changes that cannot
    /// affect order.
    pub(crate) fn get_mut_untracked(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    /// Direct access by index for guards that validated the index.
    pub(crate) fn column_at_mut(&mut self, index: usize) -> &mut Column {
        &mut self.columns[index]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Counter bumped by every structural change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stably re-sort by order after an in-place edit and renumber.
    pub(crate) fn renormalize(&mut self) {
        normalize(&mut self.columns);
        self.generation += 1;
    }

    /// Point every column at `grid`.
    pub(crate) fn set_owner(&mut self, grid: Option<GridId>) {
        for col in &mut self.columns {
            col.grid = grid;
        }
    }
}

/// Give columns without an order their position, then sort and renumber.
///
/// Running it on an already prepared set changes nothing.
pub(crate) fn prepare_columns(columns: &mut [Column]) {
    for (idx, col) in columns.iter_mut().enumerate() {
        if col.order < 0 {
            col.order = idx as i32;
        }
    }
    normalize(columns);
}

pub(crate) fn normalize(columns: &mut [Column]) {
    columns.sort_by_key(|c| c.order);
    for (idx, col) in columns.iter_mut().enumerate() {
        col.order = idx as i32 * ORDER_STEP;
    }
}

/// Guard returned by [`ColumnModel::get_mut`].
pub struct ColumnMut<'a> {
    model: &'a mut ColumnModel,
    index: usize,
}

impl Deref for ColumnMut<'_> {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.model.columns[self.index]
    }
}

impl DerefMut for ColumnMut<'_> {
    fn deref_mut(&mut self) -> &mut Column {
        &mut self.model.columns[self.index]
    }
}

impl Drop for ColumnMut<'_> {
    fn drop(&mut self) {
        self.model.renormalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(model: &ColumnModel) -> Vec<&str> {
        model.iter().map(|c| c.data_field.as_str()).collect()
    }

    fn orders(model: &ColumnModel) -> Vec<i32> {
        model.iter().map(|c| c.order).collect()
    }

    #[test]
    fn test_set_columns_assigns_and_sorts_orders() {
        let mut model = ColumnModel::new();
        let changed = model.set_columns(vec![
            Column::new("a").with_order(20),
            Column::new("b"),
            Column::new("c").with_order(5),
        ]);
        assert!(changed);
        // "b" takes its position (1) as order.
        assert_eq!(fields(&model), vec!["b", "c", "a"]);
        assert_eq!(orders(&model), vec![0, 10, 20]);
    }

    #[test]
    fn test_set_columns_idempotent() {
        let mut model = ColumnModel::new();
        let cols = vec![Column::new("a"), Column::new("b")];
        assert!(model.set_columns(cols.clone()));
        let generation = model.generation();
        assert!(!model.set_columns(cols));
        assert_eq!(model.generation(), generation);
    }

    #[test]
    fn test_set_columns_ties_keep_input_order() {
        let mut model = ColumnModel::new();
        model.set_columns(vec![
            Column::new("x").with_order(1),
            Column::new("y").with_order(1),
        ]);
        assert_eq!(fields(&model), vec!["x", "y"]);
        assert_eq!(orders(&model), vec![0, 10]);
    }

    #[test]
    fn test_add_appends_after_max_order() {
        let mut model = ColumnModel::new();
        assert_eq!(model.max_order(), -1);
        model.set_columns(vec![Column::new("a"), Column::new("b")]);
        let index = model.add(Column::new("c"));
        assert_eq!(index, 2);
        assert_eq!(orders(&model), vec![0, 10, 20]);

        // An explicit order equal to an existing one lands after it.
        let index = model.add(Column::new("d").with_order(10));
        assert_eq!(index, 2);
        assert_eq!(fields(&model), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_remove_renumbers() {
        let mut model = ColumnModel::new();
        model.set_columns(vec![Column::new("a"), Column::new("b"), Column::new("c")]);
        assert!(model.remove(1).is_some());
        assert_eq!(orders(&model), vec![0, 10]);
        assert!(model.remove(7).is_none());
        assert!(model.remove_field("zzz").is_none());
        assert!(model.remove_field("a").is_some());
        assert_eq!(fields(&model), vec!["c"]);
    }

    #[test]
    fn test_move_to() {
        let mut model = ColumnModel::new();
        model.set_columns(vec![Column::new("a"), Column::new("b"), Column::new("c")]);
        assert!(model.move_to(0, 2));
        assert_eq!(fields(&model), vec!["b", "c", "a"]);
        assert!(!model.move_to(1, 1));
        assert!(!model.move_to(2, 99));
        assert!(model.move_to(2, 0));
        assert_eq!(fields(&model), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_get_mut_guard_renormalizes() {
        let mut model = ColumnModel::new();
        model.set_columns(vec![Column::new("a"), Column::new("b")]);
        let generation = model.generation();
        if let Some(mut col) = model.get_mut(0) {
            col.order = 15;
        }
        assert_eq!(fields(&model), vec!["b", "a"]);
        assert_eq!(orders(&model), vec![0, 10]);
        assert!(model.generation() > generation);
    }

    #[test]
    fn test_visible_indices() {
        let mut model = ColumnModel::new();
        model.set_columns(vec![
            Column::new("a"),
            Column::new("b").with_visible(false),
            Column::new("c"),
        ]);
        assert_eq!(model.visible_indices(), vec![0, 2]);
    }

    #[test]
    fn test_alignment_parsing() {
        assert_eq!(HorizontalAlignment::parse("right"), HorizontalAlignment::Right);
        assert_eq!(HorizontalAlignment::parse("Cent"), HorizontalAlignment::Center);
        assert_eq!(HorizontalAlignment::parse("sideways"), HorizontalAlignment::Left);
        assert_eq!(VerticalAlignment::parse("b"), VerticalAlignment::Bottom);
        assert_eq!(VerticalAlignment::parse("middle"), VerticalAlignment::Top);
        assert_eq!(
            HorizontalAlignment::Automatic.resolve(DataType::Float),
            HorizontalAlignment::Right
        );
        assert_eq!(
            HorizontalAlignment::Automatic.resolve(DataType::Str),
            HorizontalAlignment::Left
        );
    }

    #[test]
    fn test_data_type_tag_fallback() {
        let col = Column::new("x").with_data_type_tag("mystery");
        assert_eq!(col.data_type, DataType::Str);
        let col = Column::new("x").with_data_type_tag("Integer");
        assert_eq!(col.data_type, DataType::Int);
    }

    #[test]
    fn test_list_choices_for_row() {
        let mut col = Column::new("size").with_list_choices(vec!["S".into(), "M".into()]);
        col.custom_list_choices.insert(3, vec!["XL".into()]);
        assert_eq!(col.list_choices_for_row(0).len(), 2);
        assert_eq!(col.list_choices_for_row(3), &[Value::from("XL")]);
    }
}
