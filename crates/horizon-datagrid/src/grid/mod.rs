//! The grid controller.
//!
//! A [`Grid`] ties one data source and one display surface to the column
//! model. It owns every piece of per-grid state: the logical/physical
//! mapping, the cell value cache, selection, sort, incremental search, the
//! edit session and deferred work. The data source stays external and is
//! only ever addressed by row index.
//!
//! Cell-level APIs ([`cell_value`](Grid::cell_value),
//! [`begin_edit`](Grid::begin_edit), [`set_current_cell`](Grid::set_current_cell))
//! take **physical** column indices, the dense indices the surface paints.
//! Column-management APIs ([`move_column`](Grid::move_column),
//! [`process_sort`](Grid::process_sort), [`column_mut`](Grid::column_mut))
//! take **logical** indices into the column model. Signals always carry
//! logical indices.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_datagrid::{Column, DataType, GridBuilder, RecordSet, Value};
//!
//! let people = Arc::new(RecordSet::from_rows(
//!     &["name", "age"],
//!     vec![
//!         vec![Value::from("Ann"), Value::from(31)],
//!         vec![Value::from("bob"), Value::from(27)],
//!     ],
//! ));
//!
//! let mut grid = GridBuilder::new("people_form", "people")
//!     .data_source(people)
//!     .columns(vec![
//!         Column::new("name"),
//!         Column::new("age").with_data_type(DataType::Int),
//!     ])
//!     .build();
//!
//! assert_eq!(grid.cell_text(1, 1).as_deref(), Some("27"));
//! grid.process_sort(1, true);
//! assert_eq!(grid.cell_text(0, 0).as_deref(), Some("bob"));
//! ```

mod columns;
mod editing;
mod searching;
mod selecting;
mod sorting;

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use horizon_datagrid_core::{DeferredQueue, PerfSpan};

pub use columns::DataSetColumns;
pub use searching::GridTask;

use crate::adapter::{GridSurface, NullSurface, SyncDelta, VirtualTableAdapter};
use crate::binding::BoundControls;
use crate::cache::CellValueCache;
use crate::column::{Column, ColumnModel, HorizontalAlignment, VerticalAlignment, normalize, prepare_columns};
use crate::config::GridConfig;
use crate::data_source::DataSource;
use crate::dynamic::{DynamicProperty, PropertyValue};
use crate::edit::EditSession;
use crate::events::GridSignals;
use crate::header::{HeaderCellStyle, HeaderInputRouter, HeaderLayout, HeaderPainter};
use crate::paint::{Color, FixedWidthMeasure, Painter, TextMeasure};
use crate::registry::{RenderOptions, RendererEditorRegistry};
use crate::search::IncrementalSearch;
use crate::selection::SelectionModel;
use crate::settings::{SettingsKey, SettingsValue, SharedSettings};
use crate::sort::SortState;
use crate::value::Value;

static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a grid, used by columns as a non-owning back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(u64);

impl GridId {
    fn next() -> Self {
        Self(NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Everything needed to paint one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAttributes {
    pub value: Value,
    /// The value as rendered by the cell's renderer.
    pub text: String,
    pub fore_color: Color,
    pub back_color: Color,
    pub bold: bool,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    /// Name of the renderer that produced `text`.
    pub renderer: &'static str,
    pub wrap: bool,
    pub selected: bool,
}

/// Builds a [`Grid`].
pub struct GridBuilder {
    form: String,
    name: String,
    config: GridConfig,
    settings: Option<SharedSettings>,
    surface: Option<Box<dyn GridSurface>>,
    data: Option<Arc<dyn DataSource>>,
    columns: Vec<Column>,
    registry: Option<RendererEditorRegistry>,
    text_measure: Option<Box<dyn TextMeasure>>,
    row_labels: Vec<String>,
}

impl GridBuilder {
    /// Start a grid named `name` on the form `form`. Both names scope the
    /// grid's persisted settings.
    pub fn new(form: &str, name: &str) -> Self {
        Self {
            form: form.to_string(),
            name: name.to_string(),
            config: GridConfig::default(),
            settings: None,
            surface: None,
            data: None,
            columns: Vec::new(),
            registry: None,
            text_measure: None,
            row_labels: Vec::new(),
        }
    }

    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    /// The store user preferences are read from and written to.
    pub fn settings(mut self, settings: SharedSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn surface(mut self, surface: impl GridSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    pub fn data_source(mut self, data: Arc<dyn DataSource>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn registry(mut self, registry: RendererEditorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn text_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.text_measure = Some(Box::new(measure));
        self
    }

    /// Labels shown beside each row. They follow their rows when the grid
    /// sorts in memory.
    pub fn row_labels(mut self, labels: Vec<String>) -> Self {
        self.row_labels = labels;
        self
    }

    /// Create the grid, restore persisted preferences and fill it.
    pub fn build(self) -> Grid {
        let header_painter = HeaderPainter {
            sort_indicator_size: self.config.sort_indicator_size,
            sort_indicator_buffer: self.config.sort_indicator_buffer,
            ..HeaderPainter::default()
        };
        let mut grid = Grid {
            id: GridId::next(),
            settings_key: SettingsKey::new(&self.form, &self.name),
            cache: CellValueCache::new(self.config.cache_staleness_duration()),
            selection: SelectionModel::new(self.config.selection_mode, self.config.multiple_selection),
            row_height: self.config.row_height,
            config: self.config,
            columns: ColumnModel::new(),
            data: self.data,
            adapter: VirtualTableAdapter::new(),
            surface: self.surface.unwrap_or_else(|| Box::new(NullSurface)),
            registry: self.registry.unwrap_or_default(),
            sort: SortState::new(),
            row_labels: self.row_labels,
            search: IncrementalSearch::new(),
            deferred: DeferredQueue::new(),
            edit: EditSession::new(),
            header_router: HeaderInputRouter::new(),
            header_painter,
            bound: BoundControls::new(),
            settings: self.settings,
            current: None,
            widths: HashMap::new(),
            row_heights: HashMap::new(),
            text_measure: self
                .text_measure
                .unwrap_or_else(|| Box::new(FixedWidthMeasure::default())),
            grid_width: 0,
            horizontal_offset: 0.0,
            signals: GridSignals::new(),
        };

        let mut columns = self.columns;
        grid.apply_saved_orders(&mut columns);
        grid.columns.set_columns(columns);
        grid.columns.set_owner(Some(grid.id));
        grid.restore_row_size();
        if grid.data.is_some() {
            grid.restore_sort();
            let extra = grid.config.empty_rows_to_add;
            if extra > 0 {
                grid.add_empty_rows(extra);
            }
        }
        grid.fill_grid();
        grid
    }
}

/// A virtualized, data-bound grid.
pub struct Grid {
    id: GridId,
    settings_key: SettingsKey,
    config: GridConfig,
    columns: ColumnModel,
    data: Option<Arc<dyn DataSource>>,
    adapter: VirtualTableAdapter,
    surface: Box<dyn GridSurface>,
    cache: CellValueCache,
    registry: RendererEditorRegistry,
    selection: SelectionModel,
    sort: SortState,
    row_labels: Vec<String>,
    search: IncrementalSearch,
    deferred: DeferredQueue<GridTask>,
    edit: EditSession,
    header_router: HeaderInputRouter,
    header_painter: HeaderPainter,
    bound: BoundControls,
    settings: Option<SharedSettings>,
    /// Current cell as (row, logical column).
    current: Option<(usize, usize)>,
    /// Display widths by data field, after persisted, explicit and autosized
    /// widths are resolved.
    widths: HashMap<String, i32>,
    row_height: i32,
    row_heights: HashMap<usize, i32>,
    text_measure: Box<dyn TextMeasure>,
    grid_width: i32,
    horizontal_offset: f32,
    /// Notifications emitted by this grid.
    pub signals: GridSignals,
}

static_assertions::assert_impl_all!(Grid: Send);

impl Grid {
    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn settings_key(&self) -> &SettingsKey {
        &self.settings_key
    }

    pub fn columns(&self) -> &ColumnModel {
        &self.columns
    }

    pub fn column(&self, logical: usize) -> Option<&Column> {
        self.columns.get(logical)
    }

    /// Edit a column in place.
    ///
    /// When the guard drops, orders are renormalized and the surface is told
    /// about any change in visible column count before the grid repaints.
    pub fn column_mut(&mut self, logical: usize) -> Option<GridColumnMut<'_>> {
        (logical < self.columns.len()).then_some(GridColumnMut { grid: self, index: logical })
    }

    pub fn adapter(&self) -> &VirtualTableAdapter {
        &self.adapter
    }

    pub fn cache(&self) -> &CellValueCache {
        &self.cache
    }

    pub fn registry(&self) -> &RendererEditorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RendererEditorRegistry {
        &mut self.registry
    }

    pub fn data_source(&self) -> Option<&Arc<dyn DataSource>> {
        self.data.as_ref()
    }

    /// Bind a new data source and refill.
    pub fn set_data_source(&mut self, data: Option<Arc<dyn DataSource>>) {
        if self.edit.is_editing() {
            self.edit.cancel();
        }
        self.data = data;
        self.current = None;
        self.selection.clear();
        self.fill_grid();
    }

    /// Rows in the data source; zero without one.
    pub fn row_count(&self) -> usize {
        self.data.as_ref().map_or(0, |data| data.row_count())
    }

    /// Visible columns.
    pub fn column_count(&self) -> usize {
        self.adapter.visible_count()
    }

    /// Rebuild the surface from scratch: column mapping, counts, widths and
    /// a full repaint.
    #[tracing::instrument(skip_all, target = "horizon_datagrid::adapter", level = "debug")]
    pub fn fill_grid(&mut self) {
        let _perf = PerfSpan::new("fill_grid");
        self.cache.clear();
        self.apply_column_dynamics();
        self.sync_structure();
        self.resolve_column_widths();
        self.push_column_widths();
        self.surface.refresh();
        tracing::debug!(
            target: "horizon_datagrid::adapter",
            rows = self.adapter.row_count(),
            columns = self.adapter.column_count(),
            "grid filled"
        );
    }

    /// Pick up row count changes in the data source.
    ///
    /// Growth and shrinkage are sent to the surface as a minimal delta.
    /// Selection indices that are still in range are kept.
    pub fn update(&mut self) -> SyncDelta {
        let delta = self.sync_structure();
        if !delta.is_empty() {
            self.cache.clear();
            self.surface.refresh();
        }
        delta
    }

    /// Ask the data source for `count` blank rows and show them.
    pub fn add_empty_rows(&mut self, count: usize) -> bool {
        if count == 0 {
            return false;
        }
        let Some(data) = self.data.clone() else {
            return false;
        };
        if let Err(err) = data.append_empty(count) {
            tracing::warn!(target: "horizon_datagrid::adapter", count, error = %err, "cannot add empty rows");
            return false;
        }
        self.update();
        true
    }

    /// Drop cached values, reevaluate column bindings and repaint.
    pub fn refresh(&mut self) {
        self.cache.clear();
        self.update_dynamic_properties();
        self.surface.refresh();
    }

    /// Evaluate column-level dynamic bindings.
    ///
    /// Visibility changes are synced to the surface before this returns.
    pub fn update_dynamic_properties(&mut self) {
        if self.apply_column_dynamics() {
            self.sync_structure();
            self.push_column_widths();
        }
    }

    /// Value of a cell, through the cache.
    pub fn cell_value(&mut self, row: usize, physical_col: usize) -> Option<Value> {
        self.cell_value_at(row, physical_col, Instant::now())
    }

    /// [`cell_value`](Self::cell_value) with an explicit clock.
    pub fn cell_value_at(&mut self, row: usize, physical_col: usize, now: Instant) -> Option<Value> {
        let logical = self.adapter.physical_to_logical(physical_col)?;
        self.logical_value_at(row, logical, now)
    }

    /// Rendered text of a cell.
    pub fn cell_text(&mut self, row: usize, physical_col: usize) -> Option<String> {
        let logical = self.adapter.physical_to_logical(physical_col)?;
        let value = self.logical_value_at(row, logical, Instant::now())?;
        Some(self.render_logical(row, logical, &value))
    }

    /// Resolve colors, font, alignment and text of one cell for painting.
    ///
    /// Cell-level dynamic bindings are evaluated here and never stored.
    pub fn cell_attributes(&mut self, row: usize, physical_col: usize) -> Option<CellAttributes> {
        let logical = self.adapter.physical_to_logical(physical_col)?;
        let value = self.logical_value_at(row, logical, Instant::now())?;
        let column = self.columns.get(logical)?;

        let dynamic = |property: DynamicProperty| -> Option<PropertyValue> {
            column
                .dynamic
                .get(&property)
                .and_then(|binding| binding.evaluate_cell(&column.data_field, row, &value))
        };
        let fore_color = dynamic(DynamicProperty::CellForeColor)
            .and_then(|p| p.as_color())
            .or(column.fore_color)
            .unwrap_or(Color::BLACK);
        let back_color = dynamic(DynamicProperty::CellBackColor)
            .and_then(|p| p.as_color())
            .or(column.back_color)
            .unwrap_or_else(|| self.row_background(row));
        let bold = dynamic(DynamicProperty::CellFontBold)
            .and_then(|p| p.as_bool())
            .unwrap_or(column.font_bold);

        let renderer = self.registry.renderer_for(column, row);
        let text = renderer.render(
            &value,
            &RenderOptions {
                none_display: &self.config.none_display,
                precision: column.precision,
            },
        );

        Some(CellAttributes {
            text,
            fore_color,
            back_color,
            bold,
            horizontal_alignment: column.effective_horizontal_alignment(),
            vertical_alignment: column.vertical_alignment,
            renderer: renderer.name(),
            wrap: renderer.wraps(),
            selected: self.selection.is_selected(row, logical),
            value,
        })
    }

    /// Section geometry of the header, in physical order.
    pub fn header_layout(&self) -> HeaderLayout {
        let mut layout = HeaderLayout::new(self.config.header_height as f32, self.horizontal_offset);
        for physical in 0..self.adapter.visible_count() {
            let Some(column) = self.physical_column(physical) else {
                continue;
            };
            layout.push(
                self.display_width(column),
                self.config.movable_columns && column.movable,
                self.config.resizable_columns && column.resizable,
                self.config.sortable && column.sortable,
            );
        }
        layout
    }

    /// Paint the header row.
    pub fn paint_header(&self, painter: &mut dyn Painter) {
        let layout = self.header_layout();
        let styles: Vec<HeaderCellStyle<'_>> = (0..self.adapter.visible_count())
            .filter_map(|physical| self.physical_column(physical))
            .map(|column| HeaderCellStyle {
                caption: column.display_caption(),
                horizontal: column
                    .header_horizontal_alignment
                    .unwrap_or(self.config.header_horizontal_alignment)
                    .resolve(column.data_type),
                vertical: column
                    .header_vertical_alignment
                    .unwrap_or(self.config.header_vertical_alignment),
                fore_color: column.header_fore_color.unwrap_or(Color::BLACK),
                back_color: column.header_back_color.unwrap_or(Color::HEADER_BACKGROUND),
                bold: column.font_bold,
                sort: self.sort.order_for(&column.data_field),
            })
            .collect();
        self.header_painter.paint(painter, &layout, &styles);
    }

    /// Scroll the header horizontally.
    pub fn set_horizontal_offset(&mut self, offset: f32) {
        self.horizontal_offset = offset.max(0.0);
    }

    fn physical_column(&self, physical: usize) -> Option<&Column> {
        self.columns.get(self.adapter.physical_to_logical(physical)?)
    }

    fn logical_value_at(&mut self, row: usize, logical: usize, now: Instant) -> Option<Value> {
        if row >= self.row_count() {
            return None;
        }
        if let Some(value) = self.cache.get_at(row, logical, now) {
            return Some(value);
        }
        let field = &self.columns.get(logical)?.data_field;
        let data = self.data.as_ref()?;
        match data.field_value(field, row) {
            Ok(value) => {
                self.cache.put_at(row, logical, value.clone(), now);
                Some(value)
            }
            Err(err) => {
                tracing::warn!(
                    target: "horizon_datagrid::cache",
                    row,
                    field = %field,
                    error = %err,
                    "cannot read cell value"
                );
                None
            }
        }
    }

    fn render_logical(&self, row: usize, logical: usize, value: &Value) -> String {
        let Some(column) = self.columns.get(logical) else {
            return value.plain_text();
        };
        self.registry.renderer_for(column, row).render(
            value,
            &RenderOptions {
                none_display: &self.config.none_display,
                precision: column.precision,
            },
        )
    }

    fn row_background(&self, row: usize) -> Color {
        if !self.config.alternate_row_coloring {
            Color::WHITE
        } else if row % 2 == 0 {
            self.config.row_color_even
        } else {
            self.config.row_color_odd
        }
    }

    /// Remap columns, send count deltas to the surface and drop selection
    /// and current cell indices that fell out of range.
    fn sync_structure(&mut self) -> SyncDelta {
        let rows = self.row_count();
        let delta = self.adapter.sync(&self.columns, rows, self.surface.as_mut());
        self.selection.clamp(rows, self.columns.len());
        if let Some((row, col)) = self.current {
            if row >= rows || col >= self.columns.len() {
                self.current = None;
            }
        }
        delta
    }

    /// Apply column-level bindings. Returns `true` if visibility changed.
    fn apply_column_dynamics(&mut self) -> bool {
        let mut visibility_changed = false;
        for index in 0..self.columns.len() {
            let Some(column) = self.columns.get_mut_untracked(index) else {
                continue;
            };
            if column.dynamic.is_empty() {
                continue;
            }
            let field = column.data_field.clone();
            let evaluate = |column: &Column, property: DynamicProperty| {
                column
                    .dynamic
                    .get(&property)
                    .and_then(|binding| binding.evaluate_column(&field))
            };
            if let Some(color) = evaluate(column, DynamicProperty::ForeColor).and_then(|p| p.as_color()) {
                column.fore_color = Some(color);
            }
            if let Some(color) = evaluate(column, DynamicProperty::BackColor).and_then(|p| p.as_color()) {
                column.back_color = Some(color);
            }
            if let Some(bold) = evaluate(column, DynamicProperty::FontBold).and_then(|p| p.as_bool()) {
                column.font_bold = bold;
            }
            if let Some(caption) = evaluate(column, DynamicProperty::Caption) {
                if let Some(text) = caption.as_text() {
                    column.caption = text.to_string();
                }
            }
            if let Some(visible) = evaluate(column, DynamicProperty::Visible).and_then(|p| p.as_bool()) {
                if column.visible != visible {
                    column.visible = visible;
                    visibility_changed = true;
                }
            }
        }
        visibility_changed
    }

    fn setting(&self, key: &str) -> Option<SettingsValue> {
        self.settings.as_ref()?.get(key)
    }

    fn save_setting(&self, key: &str, value: impl Into<SettingsValue>) {
        if let Some(settings) = &self.settings {
            settings.set(key, value.into());
        }
    }

    fn column_setting(&self, field: &str, property: &str) -> Option<SettingsValue> {
        self.setting(&self.settings_key.column(field, property))
    }

    fn save_column_setting(&self, field: &str, property: &str, value: impl Into<SettingsValue>) {
        self.save_setting(&self.settings_key.column(field, property), value);
    }

    /// Bring an incoming column set into the state the model keeps it in:
    /// prepared, with persisted orders applied on top.
    pub(super) fn apply_saved_orders(&self, columns: &mut [Column]) {
        prepare_columns(columns);
        let mut restored = false;
        for column in columns.iter_mut() {
            let saved = self
                .column_setting(&column.data_field, "Order")
                .and_then(|value| value.as_integer());
            if let Some(order) = saved {
                column.order = order as i32;
                restored = true;
            }
        }
        if restored {
            normalize(columns);
            tracing::debug!(target: "horizon_datagrid::settings", "column order restored");
        }
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("id", &self.id)
            .field("settings_key", &self.settings_key)
            .field("columns", &self.columns.len())
            .field("rows", &self.row_count())
            .field("current", &self.current)
            .field("sort", &self.sort)
            .finish_non_exhaustive()
    }
}

/// Guard returned by [`Grid::column_mut`].
pub struct GridColumnMut<'a> {
    grid: &'a mut Grid,
    index: usize,
}

impl Deref for GridColumnMut<'_> {
    type Target = Column;

    fn deref(&self) -> &Column {
        &self.grid.columns.columns()[self.index]
    }
}

impl DerefMut for GridColumnMut<'_> {
    fn deref_mut(&mut self) -> &mut Column {
        self.grid.columns.column_at_mut(self.index)
    }
}

impl Drop for GridColumnMut<'_> {
    fn drop(&mut self) {
        let grid = &mut *self.grid;
        grid.columns.renormalize();
        grid.sync_structure();
        grid.cache.clear();
        grid.push_column_widths();
        grid.surface.refresh();
    }
}
