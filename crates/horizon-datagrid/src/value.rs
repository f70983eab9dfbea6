//! Cell values and data type tags.
//!
//! [`Value`] is what a data source hands the grid for one field of one row.
//! [`DataType`] is the canonical tag a column declares for its field; it
//! drives renderer/editor selection, search coercion and sort comparison.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A missing value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A fixed-point number held as a float and displayed with the column
    /// precision.
    Decimal(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    List(Vec<Value>),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string slice of a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a numeric value as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) | Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// The display text for this value.
    ///
    /// `Null` shows as `none_display`; floats and decimals use `precision`
    /// fractional digits; dates use ISO 8601.
    pub fn display_text(&self, none_display: &str, precision: usize) -> String {
        match self {
            Value::Null => none_display.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) | Value::Decimal(v) => format!("{v:.precision$}"),
            Value::Str(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
            Value::List(items) => items
                .iter()
                .map(|item| item.display_text(none_display, precision))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// The raw text of this value, used for string searches and find.
    ///
    /// Unlike [`display_text`](Self::display_text), no precision is applied
    /// and `Null` is empty.
    pub fn plain_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Float(v) | Value::Decimal(v) => v.to_string(),
            other => other.display_text("", 0),
        }
    }

    /// Compare two values for sorting.
    ///
    /// `Null` sorts below every other value. Numbers compare numerically
    /// across int/float/decimal. Strings compare case-insensitively unless
    /// `case_sensitive` is set. Values of unrelated types fall back to a fixed
    /// order of their type tags so the comparison stays total.
    pub fn sort_cmp(&self, other: &Value, case_sensitive: bool) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Str(a), Value::Str(b)) => {
                if case_sensitive {
                    a.cmp(b)
                } else {
                    a.to_lowercase().cmp(&b.to_lowercase())
                }
            }
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Date(a), Value::DateTime(b)) => a.and_time(NaiveTime::MIN).cmp(b),
            (Value::DateTime(a), Value::Date(b)) => a.cmp(&b.and_time(NaiveTime::MIN)),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.sort_cmp(y, case_sensitive);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.type_rank().cmp(&b.type_rank()),
            },
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) | Value::Decimal(_) => 2,
            Value::Str(_) => 3,
            Value::Date(_) | Value::DateTime(_) => 4,
            Value::Time(_) => 5,
            Value::List(_) => 6,
        }
    }

    /// Coerce typed search text to a value comparable with fields of `dtype`.
    ///
    /// Numeric text that does not parse becomes zero, so a search for a
    /// non-number in a numeric column looks for 0. Types compared as text
    /// (strings and dates) keep the text as a `Str`.
    pub fn coerce_search_text(text: &str, dtype: DataType) -> Value {
        let trimmed = text.trim();
        match dtype {
            DataType::Int | DataType::Long => Value::Int(trimmed.parse().unwrap_or(0)),
            DataType::Float => Value::Float(trimmed.parse().unwrap_or(0.0)),
            DataType::Decimal => Value::Decimal(trimmed.parse().unwrap_or(0.0)),
            DataType::Bool => Value::Bool(parse_bool(trimmed).unwrap_or(false)),
            _ => Value::Str(text.to_string()),
        }
    }

    /// Parse edit text into a value of `dtype`.
    ///
    /// Returns `None` if the text is not a valid literal of the type. Empty
    /// text parses as `Null` for every non-string type.
    pub fn parse_as(text: &str, dtype: DataType) -> Option<Value> {
        let trimmed = text.trim();
        if trimmed.is_empty() && dtype != DataType::Str {
            return Some(Value::Null);
        }
        match dtype {
            DataType::Str | DataType::List => Some(Value::Str(text.to_string())),
            DataType::Bool => parse_bool(trimmed).map(Value::Bool),
            DataType::Int | DataType::Long => trimmed.parse().ok().map(Value::Int),
            DataType::Float => trimmed.parse().ok().map(Value::Float),
            DataType::Decimal => trimmed.parse().ok().map(Value::Decimal),
            DataType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            DataType::DateTime => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(Value::DateTime),
            DataType::Time => NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
                .ok()
                .map(Value::Time),
        }
    }
}

/// Parse the usual spellings of a boolean.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Canonical data type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    #[default]
    Str,
    Bool,
    Int,
    Long,
    Float,
    Decimal,
    Date,
    DateTime,
    Time,
    List,
}

impl DataType {
    /// Parse a type tag, accepting the common names and abbreviations.
    ///
    /// Returns `None` for an unrecognized tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        let dtype = match tag.as_str() {
            "bool" | "boolean" | "logical" | "l" => DataType::Bool,
            "int" | "integer" | "i" => DataType::Int,
            "long" | "bigint" => DataType::Long,
            "char" | "varchar" | "text" | "str" | "string" | "unicode" | "c" | "s" | "" => {
                DataType::Str
            }
            "float" | "f" => DataType::Float,
            "decimal" | "numeric" | "n" => DataType::Decimal,
            "date" | "d" => DataType::Date,
            "datetime" | "t" => DataType::DateTime,
            "time" => DataType::Time,
            "list" => DataType::List,
            _ => return None,
        };
        Some(dtype)
    }

    /// Parse a type tag, falling back to `Str` with a warning.
    pub fn parse_tag(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_else(|| {
            tracing::warn!(
                target: "horizon_datagrid::column",
                tag,
                "unrecognized data type, using string"
            );
            DataType::Str
        })
    }

    /// Infer the tag of a value. `Null` has no type.
    pub fn of(value: &Value) -> Option<Self> {
        let dtype = match value {
            Value::Null => return None,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Decimal(_) => DataType::Decimal,
            Value::Str(_) => DataType::Str,
            Value::Date(_) => DataType::Date,
            Value::DateTime(_) => DataType::DateTime,
            Value::Time(_) => DataType::Time,
            Value::List(_) => DataType::List,
        };
        Some(dtype)
    }

    /// Whether values of this type are numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Int | DataType::Long | DataType::Float | DataType::Decimal
        )
    }

    /// Whether a value fits a field of this type. `Null` fits every type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (DataType::Int | DataType::Long, Value::Int(_)) => true,
            (DataType::Float | DataType::Decimal, Value::Int(_) | Value::Float(_) | Value::Decimal(_)) => {
                true
            }
            (DataType::List, _) => true,
            (dtype, value) => DataType::of(value) == Some(dtype),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Str => "string",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Time => "time",
            DataType::List => "list",
        };
        f.write_str(name)
    }
}
