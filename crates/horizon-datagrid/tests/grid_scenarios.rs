//! End-to-end grid scenarios against in-memory data sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use horizon_datagrid::{
    Column, DataSource, DataType, GridBuilder, GridConfig, RecordSet, RecordingSurface, Result, SelectionMode,
    Settings, SortOrder, SourceKind, TableMessage, Value,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_datagrid=debug")
        .with_test_writer()
        .try_init();
}

/// A record set that counts reads.
struct CountingSource {
    inner: RecordSet,
    reads: AtomicUsize,
}

impl CountingSource {
    fn new(inner: RecordSet) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl DataSource for CountingSource {
    fn kind(&self) -> SourceKind {
        self.inner.kind()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn field_value(&self, field: &str, row: usize) -> Result<Value> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.field_value(field, row)
    }

    fn set_field_value(&self, field: &str, row: usize, value: Value) -> Result<()> {
        self.inner.set_field_value(field, row, value)
    }

    fn field_names(&self) -> Vec<String> {
        self.inner.field_names()
    }
}

fn numbered(rows: usize) -> RecordSet {
    RecordSet::from_rows(
        &["id", "label"],
        (0..rows).map(|i| vec![Value::from(i as i64), Value::from(format!("row {i}"))]),
    )
}

fn id_and_label() -> Vec<Column> {
    vec![
        Column::new("id").with_data_type(DataType::Int).with_width(40),
        Column::new("label").with_width(120),
    ]
}

#[test]
fn test_setting_identical_columns_is_a_no_op() {
    init_tracing();
    let source = Arc::new(CountingSource::new(numbered(4)));
    let surface = RecordingSurface::new();
    let mut grid = GridBuilder::new("f", "g")
        .surface(surface.clone())
        .data_source(source.clone())
        .columns(id_and_label())
        .build();

    grid.cell_value(0, 1);
    let generation = grid.columns().generation();
    let cached = grid.cache().len();
    let reads = source.reads();
    surface.clear();

    assert!(!grid.set_columns(id_and_label()));
    assert_eq!(grid.columns().generation(), generation);
    assert_eq!(grid.cache().len(), cached);
    assert!(surface.events().is_empty());

    grid.cell_value(0, 1);
    assert_eq!(source.reads(), reads);
}

#[test]
fn test_setting_identical_columns_with_saved_order_is_a_no_op() {
    init_tracing();
    let settings = Arc::new(Settings::new());
    settings.set("f.g.column_label.Order", 0);
    settings.set("f.g.column_id.Order", 10);
    let source = Arc::new(CountingSource::new(numbered(4)));
    let surface = RecordingSurface::new();
    let mut grid = GridBuilder::new("f", "g")
        .settings(settings)
        .surface(surface.clone())
        .data_source(source.clone())
        .columns(id_and_label())
        .build();

    let fields: Vec<&str> = grid.columns().iter().map(|c| c.data_field.as_str()).collect();
    assert_eq!(fields, vec!["label", "id"]);

    grid.cell_value(0, 0);
    let generation = grid.columns().generation();
    let cached = grid.cache().len();
    let reads = source.reads();
    surface.clear();

    assert!(!grid.set_columns(id_and_label()));
    assert!(!grid.set_columns(id_and_label()));
    assert_eq!(grid.columns().generation(), generation);
    assert_eq!(grid.cache().len(), cached);
    assert!(surface.events().is_empty());
    grid.cell_value(0, 0);
    assert_eq!(source.reads(), reads);
}

#[test]
fn test_physical_mapping_round_trips_in_order() {
    let visible = [true, false, true, true, false, true];
    let columns = visible
        .iter()
        .enumerate()
        .map(|(i, v)| Column::new(format!("c{i}")).with_visible(*v))
        .collect();
    let grid = GridBuilder::new("f", "g").columns(columns).build();
    let adapter = grid.adapter();

    assert_eq!(adapter.visible_count(), 4);
    let mut previous = None;
    for physical in 0..adapter.visible_count() {
        let logical = adapter.physical_to_logical(physical).unwrap();
        assert_eq!(adapter.logical_to_physical(logical), Some(physical));
        assert!(previous.is_none_or(|p| logical > p));
        previous = Some(logical);
    }
    assert_eq!(adapter.logical_to_physical(1), None);
    assert_eq!(adapter.logical_to_physical(4), None);
    assert_eq!(adapter.physical_to_logical(4), None);
}

#[test]
fn test_sort_toggle_cycle_and_column_switch() {
    let mut grid = GridBuilder::new("f", "g")
        .data_source(Arc::new(numbered(3)))
        .columns(id_and_label())
        .build();

    let mut orders = Vec::new();
    for _ in 0..3 {
        grid.process_sort(0, true);
        orders.push(grid.sort_state().order());
    }
    assert_eq!(orders, vec![Some(SortOrder::Ascending), Some(SortOrder::Descending), None]);

    grid.process_sort(0, true);
    grid.process_sort(0, true);
    grid.process_sort(1, true);
    assert_eq!(grid.sort_state().sorted_column(), Some("label"));
    assert_eq!(grid.sort_state().order(), Some(SortOrder::Ascending));
}

#[test]
fn test_sort_puts_none_first_and_folds_case() {
    let data = Arc::new(RecordSet::from_rows(
        &["fruit"],
        vec![
            vec![Value::from("banana")],
            vec![Value::from("Apple")],
            vec![Value::Null],
            vec![Value::from("cherry")],
        ],
    ));
    let mut grid = GridBuilder::new("f", "g")
        .data_source(data)
        .columns(vec![Column::new("fruit")])
        .build();

    grid.process_sort(0, true);
    let texts: Vec<String> = (0..4).filter_map(|row| grid.cell_text(row, 0)).collect();
    assert_eq!(texts, vec!["< None >", "Apple", "banana", "cherry"]);
}

#[test]
fn test_incremental_search_lands_on_nearest_below() {
    init_tracing();
    let data = Arc::new(RecordSet::from_rows(
        &["n"],
        [10, 25, 30, 42].map(|n| vec![Value::from(n)]),
    ));
    let mut grid = GridBuilder::new("f", "g")
        .data_source(data)
        .columns(vec![Column::new("n").with_data_type(DataType::Int)])
        .build();
    grid.set_current_cell(0, 0);

    let start = Instant::now();
    let delay = Duration::from_millis(grid.config().search_delay);
    for (i, ch) in "28".chars().enumerate() {
        assert!(grid.handle_char_at(ch, start + Duration::from_millis(i as u64 * 100)));
    }
    assert_eq!(grid.time_until_deferred_at(start + Duration::from_millis(100)), Some(delay));
    assert_eq!(grid.process_deferred_at(start + Duration::from_millis(100) + delay), 1);
    assert_eq!(grid.current_cell(), Some((1, 0)));

    for ch in "30".chars() {
        grid.handle_char_at(ch, start);
    }
    grid.process_deferred_at(start + delay);
    assert_eq!(grid.current_cell(), Some((2, 0)));
}

#[test]
fn test_committed_value_is_served_from_cache_until_stale() {
    init_tracing();
    let source = Arc::new(CountingSource::new(numbered(3)));
    let mut grid = GridBuilder::new("f", "g")
        .config(GridConfig {
            editable: true,
            ..GridConfig::default()
        })
        .data_source(source.clone())
        .columns(id_and_label())
        .build();

    assert!(grid.set_cell_value(1, 1, Value::from("renamed")).is_committed());
    let written = Instant::now();
    let reads = source.reads();

    assert_eq!(grid.cell_value_at(1, 1, written), Some(Value::from("renamed")));
    assert_eq!(source.reads(), reads);

    let stale = written + grid.cache().staleness() + Duration::from_secs(1);
    assert_eq!(grid.cell_value_at(1, 1, stale), Some(Value::from("renamed")));
    assert_eq!(source.reads(), reads + 1);

    grid.refresh();
    assert_eq!(grid.cell_value(1, 1), Some(Value::from("renamed")));
    assert_eq!(source.reads(), reads + 2);
}

#[test]
fn test_removing_a_column_renumbers_and_shifts_selection() {
    let data = Arc::new(RecordSet::from_rows(
        &["a", "b", "c", "d"],
        vec![vec![Value::from(1), Value::from(2), Value::from(3), Value::from(4)]],
    ));
    let mut grid = GridBuilder::new("f", "g")
        .data_source(data)
        .columns(["a", "b", "c", "d"].map(Column::new).to_vec())
        .build();
    grid.set_current_cell(0, 3);
    grid.select(0, 1, false);
    grid.select(0, 3, true);

    let removed = grid.remove_column(1).unwrap();
    assert_eq!(removed.data_field, "b");
    assert!(removed.grid.is_none());

    let orders: Vec<i32> = grid.columns().iter().map(|c| c.order).collect();
    assert_eq!(orders, vec![0, 10, 20]);
    assert!(grid.is_selected(0, 2));
    assert!(!grid.is_selected(0, 1));
    assert_eq!(grid.current_cell(), Some((0, 2)));
    assert_eq!(grid.cell_text(0, 2).as_deref(), Some("4"));
    assert!(grid.remove_column(7).is_none());
}

#[test]
fn test_row_growth_is_appended_and_keeps_selection() {
    init_tracing();
    let data = Arc::new(numbered(5));
    let surface = RecordingSurface::new();
    let mut grid = GridBuilder::new("f", "g")
        .config(GridConfig {
            selection_mode: SelectionMode::Row,
            ..GridConfig::default()
        })
        .surface(surface.clone())
        .data_source(data.clone())
        .columns(id_and_label())
        .build();
    grid.select(4, 0, false);
    assert!(grid.update().is_empty());
    surface.clear();

    for i in 5..8 {
        data.push(
            [
                ("id".to_string(), Value::from(i as i64)),
                ("label".to_string(), Value::from(format!("row {i}"))),
            ]
            .into(),
        );
    }
    let delta = grid.update();
    assert_eq!(delta.rows, 3);
    assert_eq!(surface.messages(), vec![TableMessage::RowsAppended(3)]);
    assert!(grid.is_selected(4, 1));
    assert_eq!(grid.row_count(), 8);

    data.truncate_by(4);
    grid.update();
    assert_eq!(surface.messages()[1], TableMessage::RowsDeleted { pos: 4, count: 4 });
    assert!(grid.selection().is_empty());
}
