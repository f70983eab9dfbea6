//! Horizon DataGrid - a virtualized, data-bound grid engine.
//!
//! The grid projects an external [`DataSource`] through an ordered set of
//! [`Column`]s onto a display surface that only knows dense physical
//! indices. It owns the column model, a short-lived cell value cache, sort
//! and incremental search, cell edit sessions with write-through, header
//! gestures and per-user persisted preferences. Painting and windowing stay
//! with the host toolkit behind the [`GridSurface`] and [`Painter`] traits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_datagrid::{
//!     Column, DataType, GridBuilder, GridConfig, RecordSet, RecordingSurface, Settings, TableMessage, Value,
//! };
//!
//! let orders = Arc::new(RecordSet::from_rows(
//!     &["customer", "total"],
//!     vec![
//!         vec![Value::from("Acme"), Value::from(120)],
//!         vec![Value::from("Globex"), Value::from(75)],
//!     ],
//! ));
//! let settings = Arc::new(Settings::new());
//! let surface = RecordingSurface::new();
//!
//! let mut grid = GridBuilder::new("orders_form", "orders")
//!     .config(GridConfig { editable: true, ..GridConfig::default() })
//!     .settings(settings.clone())
//!     .surface(surface.clone())
//!     .data_source(orders.clone())
//!     .columns(vec![
//!         Column::new("customer"),
//!         Column::new("total").with_data_type(DataType::Int),
//!     ])
//!     .build();
//! assert_eq!(surface.messages()[0], TableMessage::RowsAppended(2));
//!
//! grid.set_current_cell(0, 1);
//! assert!(grid.set_cell_value(0, 1, Value::from(130)).is_committed());
//!
//! orders.push([("customer".to_string(), Value::from("Initech")), ("total".to_string(), Value::Null)].into());
//! assert_eq!(grid.update().rows, 1);
//!
//! grid.set_column_width(0, 90);
//! assert_eq!(settings.get::<i32>("orders_form.orders.column_customer.Width"), Some(90));
//! ```

pub mod adapter;
pub mod binding;
pub mod cache;
pub mod column;
pub mod config;
pub mod data_source;
pub mod dynamic;
pub mod edit;
pub mod error;
pub mod events;
pub mod grid;
pub mod header;
pub mod paint;
pub mod registry;
pub mod search;
pub mod selection;
pub mod settings;
pub mod sort;
pub mod value;

pub use adapter::{GridSurface, NullSurface, RecordingSurface, SurfaceEvent, SyncDelta, TableMessage, VirtualTableAdapter};
pub use binding::{BoundControl, ValueLabel};
pub use cache::{CacheStats, CellValueCache};
pub use column::{Column, ColumnModel, HorizontalAlignment, VerticalAlignment};
pub use config::GridConfig;
pub use data_source::{DataSource, MemoryCursor, Record, RecordSet, SourceKind};
pub use dynamic::{DynamicBinding, DynamicContext, DynamicProperty, PropertyValue};
pub use edit::{EditOutcome, EditSession, EditState};
pub use error::{GridError, Result, SettingsError};
pub use events::{
    CellEditedEvent, CellEvent, ColumnMovedEvent, ColumnResizedEvent, GridSignals, RowSizeChangedEvent, SortEvent,
};
pub use grid::{CellAttributes, DataSetColumns, Grid, GridBuilder, GridColumnMut, GridId, GridTask};
pub use header::{HeaderAction, HeaderInputRouter, HeaderLayout, HeaderMenuAction, HeaderPainter};
pub use paint::{Color, FixedWidthMeasure, Painter, Point, Rect, RecordingPainter, Size, TextMeasure};
pub use registry::{CellEditor, CellRenderer, ChoiceEditor, EditorFactory, RendererEditorRegistry, ValueEditor};
pub use search::{FindOptions, SearchOutcome};
pub use selection::{CellRange, SelectionMode, SelectionModel};
pub use settings::{Settings, SettingsFormat, SettingsKey, SettingsValue, SharedSettings, UserSettingsStore};
pub use sort::{SortOrder, SortState};
pub use value::{DataType, Value};

pub use horizon_datagrid_core::{ConnectionId, Signal};
