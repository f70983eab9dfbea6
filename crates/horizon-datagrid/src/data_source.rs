//! Data sources the grid reads from and writes to.
//!
//! The grid never owns row data. It holds an `Arc<dyn DataSource>` and
//! addresses rows purely by index. Two kinds of source exist:
//!
//! - a business-object cursor ([`SourceKind::Cursor`]) that knows its own
//!   field structure, tracks a current row, and usually sorts natively
//! - a plain ordered sequence of records ([`SourceKind::Records`]) that the
//!   grid sorts in memory by reordering
//!
//! [`MemoryCursor`] and [`RecordSet`] are in-memory implementations of each.

use std::cmp::Ordering;
use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{GridError, Result};
use crate::sort::SortOrder;
use crate::value::{DataType, Value};

/// Which kind of collaborator backs the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A business-object cursor.
    Cursor,
    /// A plain ordered sequence of key/value records.
    Records,
}

/// Row data the grid displays and edits.
///
/// All methods take `&self`; implementations use interior mutability so a
/// source can be shared with the rest of the application.
pub trait DataSource: Send + Sync {
    /// The kind of source.
    fn kind(&self) -> SourceKind;

    /// Current number of rows.
    fn row_count(&self) -> usize;

    /// Read one field of one row.
    fn field_value(&self, field: &str, row: usize) -> Result<Value>;

    /// Write one field of one row.
    fn set_field_value(&self, field: &str, row: usize, value: Value) -> Result<()>;

    /// Whether [`sort`](DataSource::sort) is implemented.
    fn supports_sort(&self) -> bool {
        false
    }

    /// Sort rows natively on `field`.
    fn sort(&self, _field: &str, _order: SortOrder, _case_sensitive: bool) -> Result<()> {
        Err(GridError::Unsupported { operation: "sort" })
    }

    /// Field names and types, if the source knows them.
    fn data_structure(&self) -> Vec<(String, DataType)> {
        Vec::new()
    }

    /// Field names in source order.
    fn field_names(&self) -> Vec<String> {
        self.data_structure()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Append `count` blank rows.
    fn append_empty(&self, _count: usize) -> Result<()> {
        Err(GridError::Unsupported {
            operation: "appending rows",
        })
    }

    /// Reorder rows so that new row `i` is old row `permutation[i]`.
    fn reorder(&self, _permutation: &[usize]) -> Result<()> {
        Err(GridError::Unsupported {
            operation: "reordering rows",
        })
    }

    /// The cursor's current row, if the source tracks one.
    fn current_row(&self) -> Option<usize> {
        None
    }
}

/// A single record of a [`RecordSet`].
pub type Record = HashMap<String, Value>;

/// A plain ordered sequence of records.
pub struct RecordSet {
    fields: Vec<String>,
    records: RwLock<Vec<Record>>,
}

impl RecordSet {
    /// Create a record set with an explicit field order.
    pub fn new(fields: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            fields,
            records: RwLock::new(records),
        }
    }

    /// Create a record set whose field order is the sorted key set of the
    /// first record.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut fields: Vec<String> = records
            .first()
            .map(|rec| rec.keys().cloned().collect())
            .unwrap_or_default();
        fields.sort();
        Self::new(fields, records)
    }

    /// Build a record set from rows of values in field order.
    pub fn from_rows<I, R>(fields: &[&str], rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Value>,
    {
        let records = rows
            .into_iter()
            .map(|row| {
                fields
                    .iter()
                    .map(|f| f.to_string())
                    .zip(row)
                    .collect::<Record>()
            })
            .collect();
        Self::new(fields.iter().map(|f| f.to_string()).collect(), records)
    }

    /// Append a record.
    pub fn push(&self, record: Record) {
        self.records.write().push(record);
    }

    /// Remove the last `count` records.
    pub fn truncate_by(&self, count: usize) {
        let mut records = self.records.write();
        let len = records.len().saturating_sub(count);
        records.truncate(len);
    }

    /// A copy of one record.
    pub fn record(&self, row: usize) -> Option<Record> {
        self.records.read().get(row).cloned()
    }
}

impl DataSource for RecordSet {
    fn kind(&self) -> SourceKind {
        SourceKind::Records
    }

    fn row_count(&self) -> usize {
        self.records.read().len()
    }

    fn field_value(&self, field: &str, row: usize) -> Result<Value> {
        let records = self.records.read();
        let record = records.get(row).ok_or(GridError::RowOutOfRange {
            row,
            row_count: records.len(),
        })?;
        record
            .get(field)
            .cloned()
            .ok_or_else(|| GridError::field_not_found(field))
    }

    fn set_field_value(&self, field: &str, row: usize, value: Value) -> Result<()> {
        let mut records = self.records.write();
        let row_count = records.len();
        let record = records
            .get_mut(row)
            .ok_or(GridError::RowOutOfRange { row, row_count })?;
        record.insert(field.to_string(), value);
        Ok(())
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn append_empty(&self, count: usize) -> Result<()> {
        let blank: Record = self
            .fields
            .iter()
            .map(|f| (f.clone(), Value::Null))
            .collect();
        let mut records = self.records.write();
        records.extend(std::iter::repeat_n(blank, count));
        Ok(())
    }

    fn reorder(&self, permutation: &[usize]) -> Result<()> {
        let mut records = self.records.write();
        apply_permutation(&mut records, permutation)
    }
}

/// Reorder `items` so that new index `i` holds old item `permutation[i]`.
pub(crate) fn apply_permutation<T: Clone>(items: &mut Vec<T>, permutation: &[usize]) -> Result<()> {
    if permutation.len() != items.len() {
        return Err(GridError::DataSource(format!(
            "permutation of length {} for {} rows",
            permutation.len(),
            items.len()
        )));
    }
    let mut reordered = Vec::with_capacity(items.len());
    for &old in permutation {
        let item = items.get(old).ok_or(GridError::RowOutOfRange {
            row: old,
            row_count: items.len(),
        })?;
        reordered.push(item.clone());
    }
    *items = reordered;
    Ok(())
}

struct CursorState {
    rows: Vec<Vec<Value>>,
    row_number: usize,
}

/// An in-memory business-object cursor.
///
/// Fields are typed; writes are checked against the declared type and a
/// field can be marked read-only. Writing moves the cursor to the written
/// row first. Sorting is native and keeps the cursor on the same record.
pub struct MemoryCursor {
    structure: Vec<(String, DataType)>,
    read_only: Vec<String>,
    state: RwLock<CursorState>,
}

impl MemoryCursor {
    /// Create a cursor over `rows`, each holding values in `structure` order.
    pub fn new(structure: Vec<(String, DataType)>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            structure,
            read_only: Vec::new(),
            state: RwLock::new(CursorState {
                rows,
                row_number: 0,
            }),
        }
    }

    /// Mark a field read-only.
    pub fn with_read_only(mut self, field: impl Into<String>) -> Self {
        self.read_only.push(field.into());
        self
    }

    /// Move the cursor.
    pub fn set_row_number(&self, row: usize) -> Result<()> {
        let mut state = self.state.write();
        if row >= state.rows.len() {
            return Err(GridError::RowOutOfRange {
                row,
                row_count: state.rows.len(),
            });
        }
        state.row_number = row;
        Ok(())
    }

    fn field_index(&self, field: &str) -> Result<(usize, DataType)> {
        self.structure
            .iter()
            .position(|(name, _)| name == field)
            .map(|idx| (idx, self.structure[idx].1))
            .ok_or_else(|| GridError::field_not_found(field))
    }
}

impl DataSource for MemoryCursor {
    fn kind(&self) -> SourceKind {
        SourceKind::Cursor
    }

    fn row_count(&self) -> usize {
        self.state.read().rows.len()
    }

    fn field_value(&self, field: &str, row: usize) -> Result<Value> {
        let (idx, _) = self.field_index(field)?;
        let state = self.state.read();
        let values = state.rows.get(row).ok_or(GridError::RowOutOfRange {
            row,
            row_count: state.rows.len(),
        })?;
        Ok(values.get(idx).cloned().unwrap_or_default())
    }

    fn set_field_value(&self, field: &str, row: usize, value: Value) -> Result<()> {
        let (idx, dtype) = self.field_index(field)?;
        if self.read_only.iter().any(|f| f == field) {
            return Err(GridError::ReadOnly {
                field: field.to_string(),
            });
        }
        if !dtype.accepts(&value) {
            let found = DataType::of(&value).map_or("null".to_string(), |t| t.to_string());
            return Err(GridError::type_mismatch(field, dtype, found));
        }

        let mut state = self.state.write();
        let row_count = state.rows.len();
        if row >= row_count {
            return Err(GridError::RowOutOfRange { row, row_count });
        }
        state.row_number = row;
        let values = &mut state.rows[row];
        if values.len() <= idx {
            values.resize(idx + 1, Value::Null);
        }
        values[idx] = value;
        Ok(())
    }

    fn supports_sort(&self) -> bool {
        true
    }

    fn sort(&self, field: &str, order: SortOrder, case_sensitive: bool) -> Result<()> {
        let (idx, _) = self.field_index(field)?;
        let mut state = self.state.write();
        if state.rows.is_empty() {
            return Ok(());
        }

        let mut keyed: Vec<(usize, Vec<Value>)> =
            std::mem::take(&mut state.rows).into_iter().enumerate().collect();
        keyed.sort_by(|(_, a), (_, b)| {
            let a = a.get(idx).unwrap_or(&Value::Null);
            let b = b.get(idx).unwrap_or(&Value::Null);
            compare_field(a, b, order, case_sensitive)
        });

        let current = state.row_number;
        state.row_number = keyed
            .iter()
            .position(|(old, _)| *old == current)
            .unwrap_or(0);
        state.rows = keyed.into_iter().map(|(_, values)| values).collect();
        Ok(())
    }

    fn data_structure(&self) -> Vec<(String, DataType)> {
        self.structure.clone()
    }

    fn append_empty(&self, count: usize) -> Result<()> {
        let width = self.structure.len();
        let mut state = self.state.write();
        state
            .rows
            .extend(std::iter::repeat_n(vec![Value::Null; width], count));
        Ok(())
    }

    fn current_row(&self) -> Option<usize> {
        let state = self.state.read();
        (!state.rows.is_empty()).then_some(state.row_number)
    }
}

/// Compare two field values in the direction of `order`.
///
/// Descending reverses the comparison rather than the result, so equal
/// values keep their relative order under a stable sort.
pub(crate) fn compare_field(a: &Value, b: &Value, order: SortOrder, case_sensitive: bool) -> Ordering {
    let ord = a.sort_cmp(b, case_sensitive);
    match order {
        SortOrder::Ascending => ord,
        SortOrder::Descending => ord.reverse(),
    }
}

static_assertions::assert_impl_all!(RecordSet: Send, Sync);
static_assertions::assert_impl_all!(MemoryCursor: Send, Sync);
