//! Grid-wide behavior and appearance options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::column::{HorizontalAlignment, VerticalAlignment};
use crate::paint::Color;
use crate::selection::SelectionMode;
use crate::settings::Settings;

/// Options of one grid.
///
/// Every field has a default, so a settings group only needs the keys it
/// changes:
///
/// ```
/// use horizon_datagrid::{GridConfig, Settings};
///
/// let settings = Settings::new();
/// settings.set("grid.search_delay", 250);
/// settings.set("grid.editable", true);
///
/// let config = GridConfig::from_settings(&settings, "grid");
/// assert_eq!(config.search_delay, 250);
/// assert!(config.editable);
/// assert!(config.sortable);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Quiet period, in milliseconds, before buffered keystrokes are searched.
    pub search_delay: u64,
    /// Fall back to the nearest value below when no row matches.
    pub search_nearest: bool,
    pub search_case_sensitive: bool,
    pub case_sensitive_sorting: bool,
    pub sort_indicator_size: f32,
    pub sort_indicator_buffer: f32,
    pub header_height: i32,
    pub row_height: i32,
    pub movable_columns: bool,
    pub resizable_columns: bool,
    pub resizable_rows: bool,
    /// All rows share one height.
    pub same_size_rows: bool,
    pub sortable: bool,
    pub searchable: bool,
    pub editable: bool,
    pub selection_mode: SelectionMode,
    pub multiple_selection: bool,
    pub alternate_row_coloring: bool,
    pub row_color_odd: Color,
    pub row_color_even: Color,
    pub header_horizontal_alignment: HorizontalAlignment,
    pub header_vertical_alignment: VerticalAlignment,
    /// Text shown for null values.
    pub none_display: String,
    /// Seconds a cached cell value stays trusted.
    pub cache_staleness: u64,
    /// Blank rows appended when the grid is first filled.
    pub empty_rows_to_add: usize,
    /// Upper bound, in pixels, for autosized columns.
    pub autosize_max_width: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            search_delay: 500,
            search_nearest: true,
            search_case_sensitive: false,
            case_sensitive_sorting: false,
            sort_indicator_size: 6.0,
            sort_indicator_buffer: 3.0,
            header_height: 32,
            row_height: 20,
            movable_columns: true,
            resizable_columns: true,
            resizable_rows: true,
            same_size_rows: true,
            sortable: true,
            searchable: true,
            editable: false,
            selection_mode: SelectionMode::Cell,
            multiple_selection: true,
            alternate_row_coloring: false,
            row_color_odd: Color::ROW_ODD,
            row_color_even: Color::ROW_EVEN,
            header_horizontal_alignment: HorizontalAlignment::Center,
            header_vertical_alignment: VerticalAlignment::Center,
            none_display: "< None >".to_string(),
            cache_staleness: 10,
            empty_rows_to_add: 0,
            autosize_max_width: 250,
        }
    }
}

impl GridConfig {
    /// Read a config from the settings group at `group`, falling back to the
    /// defaults when the group is missing or malformed.
    pub fn from_settings(settings: &Settings, group: &str) -> Self {
        if !settings.contains(group) {
            return Self::default();
        }
        settings.get_deserialized(group).unwrap_or_else(|| {
            tracing::warn!(
                target: "horizon_datagrid::settings",
                group,
                "invalid grid configuration, using defaults"
            );
            Self::default()
        })
    }

    pub fn search_delay_duration(&self) -> Duration {
        Duration::from_millis(self.search_delay)
    }

    pub fn cache_staleness_duration(&self) -> Duration {
        Duration::from_secs(self.cache_staleness)
    }
}
