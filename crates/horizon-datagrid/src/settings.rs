//! Persisted user settings.
//!
//! Grids remember column widths, column order, the sorted column and the row
//! height between sessions. They do it through the [`UserSettingsStore`]
//! trait, handed to them at construction as a [`SharedSettings`]. [`Settings`]
//! is the stock implementation: a hierarchical, path-keyed store that can be
//! persisted as JSON or TOML.
//!
//! # Keys
//!
//! [`SettingsKey`] builds the keys a grid uses:
//!
//! ```
//! use horizon_datagrid::SettingsKey;
//!
//! let key = SettingsKey::new("orders_form", "lines");
//! assert_eq!(key.grid("RowSize"), "orders_form.lines.RowSize");
//! assert_eq!(key.column("qty", "Width"), "orders_form.lines.column_qty.Width");
//! ```
//!
//! # Persistence
//!
//! ```ignore
//! let settings = Settings::load_json("user.json")?;
//! settings.set_auto_save("user.json", SettingsFormat::Json);
//! settings.set("orders_form.lines.RowSize", 24);
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use horizon_datagrid_core::Signal;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

use crate::error::SettingsError;
use crate::value::Value;

/// A value held in settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingsValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<SettingsValue>),
    Object(HashMap<String, SettingsValue>),
}

impl SettingsValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SettingsValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingsValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SettingsValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; integers convert.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingsValue::Float(v) => Some(*v),
            SettingsValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingsValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SettingsValue]> {
        match self {
            SettingsValue::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HashMap<String, SettingsValue>> {
        match self {
            SettingsValue::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for SettingsValue {
    fn from(v: bool) -> Self {
        SettingsValue::Bool(v)
    }
}

impl From<i32> for SettingsValue {
    fn from(v: i32) -> Self {
        SettingsValue::Integer(v.into())
    }
}

impl From<i64> for SettingsValue {
    fn from(v: i64) -> Self {
        SettingsValue::Integer(v)
    }
}

impl From<usize> for SettingsValue {
    fn from(v: usize) -> Self {
        SettingsValue::Integer(v as i64)
    }
}

impl From<f64> for SettingsValue {
    fn from(v: f64) -> Self {
        SettingsValue::Float(v)
    }
}

impl From<&str> for SettingsValue {
    fn from(v: &str) -> Self {
        SettingsValue::String(v.to_string())
    }
}

impl From<String> for SettingsValue {
    fn from(v: String) -> Self {
        SettingsValue::String(v)
    }
}

impl<T: Into<SettingsValue>> From<Option<T>> for SettingsValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SettingsValue::Null, Into::into)
    }
}

impl<T: Into<SettingsValue>> From<Vec<T>> for SettingsValue {
    fn from(v: Vec<T>) -> Self {
        SettingsValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for SettingsValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => SettingsValue::Null,
            Value::Bool(b) => SettingsValue::Bool(*b),
            Value::Int(i) => SettingsValue::Integer(*i),
            Value::Float(f) | Value::Decimal(f) => SettingsValue::Float(*f),
            Value::Str(s) => SettingsValue::String(s.clone()),
            Value::List(items) => SettingsValue::Array(items.iter().map(Into::into).collect()),
            other => SettingsValue::String(other.plain_text()),
        }
    }
}

/// Types readable from a [`SettingsValue`].
pub trait FromSettingsValue: Sized {
    fn from_settings_value(value: &SettingsValue) -> Option<Self>;
}

impl FromSettingsValue for bool {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromSettingsValue for i32 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromSettingsValue for i64 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer()
    }
}

impl FromSettingsValue for u64 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer().and_then(|v| u64::try_from(v).ok())
    }
}

impl FromSettingsValue for f64 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromSettingsValue for String {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl<T: FromSettingsValue> FromSettingsValue for Vec<T> {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_array()?.iter().map(T::from_settings_value).collect()
    }
}

impl FromSettingsValue for SettingsValue {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        Some(value.clone())
    }
}

/// The key/value store grids persist user preferences in.
pub trait UserSettingsStore: Send + Sync {
    /// The value at `key`, if set.
    fn get(&self, key: &str) -> Option<SettingsValue>;

    /// Store `value` at `key`.
    fn set(&self, key: &str, value: SettingsValue);
}

/// Settings store shared between grids.
pub type SharedSettings = Arc<dyn UserSettingsStore>;

/// Builds the settings keys of one grid on one form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsKey {
    form: String,
    grid: String,
}

impl SettingsKey {
    pub fn new(form: &str, grid: &str) -> Self {
        Self {
            form: sanitize(form),
            grid: sanitize(grid),
        }
    }

    /// `"{form}.{grid}.{property}"`
    pub fn grid(&self, property: &str) -> String {
        format!("{}.{}.{}", self.form, self.grid, sanitize(property))
    }

    /// `"{form}.{grid}.column_{field}.{property}"`
    pub fn column(&self, field: &str, property: &str) -> String {
        format!(
            "{}.{}.column_{}.{}",
            self.form,
            self.grid,
            sanitize(field),
            sanitize(property)
        )
    }
}

/// Keep a key segment from splitting on path separators.
fn sanitize(segment: &str) -> String {
    segment.replace(['.', '/'], "_")
}

/// File format of persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

#[derive(Debug, Clone)]
struct AutoSave {
    path: PathBuf,
    format: SettingsFormat,
}

/// Hierarchical settings keyed by `.` or `/` separated paths.
pub struct Settings {
    data: RwLock<HashMap<String, SettingsValue>>,
    changed: Signal<String>,
    auto_save: RwLock<Option<AutoSave>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::from_data(HashMap::new())
    }

    pub fn from_data(data: HashMap<String, SettingsValue>) -> Self {
        Self {
            data: RwLock::new(data),
            changed: Signal::new(),
            auto_save: RwLock::new(None),
        }
    }

    /// Emitted with the key path after every change.
    pub fn changed(&self) -> &Signal<String> {
        &self.changed
    }

    /// Save to `path` after every change.
    pub fn set_auto_save(&self, path: impl AsRef<Path>, format: SettingsFormat) {
        *self.auto_save.write() = Some(AutoSave {
            path: path.as_ref().to_path_buf(),
            format,
        });
    }

    pub fn disable_auto_save(&self) {
        *self.auto_save.write() = None;
    }

    pub fn is_auto_save_enabled(&self) -> bool {
        self.auto_save.read().is_some()
    }

    /// Store a value, creating intermediate groups.
    pub fn set<V: Into<SettingsValue>>(&self, path: &str, value: V) {
        let parts = split_path(path);
        if parts.is_empty() {
            return;
        }
        insert_at(&mut self.data.write(), &parts, value.into());
        tracing::trace!(target: "horizon_datagrid::settings", key = path, "setting changed");
        self.changed.emit(path.to_string());
        self.try_auto_save();
    }

    /// Store any serializable value.
    pub fn set_serialized<T: Serialize>(&self, path: &str, value: &T) -> Result<(), SettingsError> {
        let json = serde_json::to_value(value).map_err(|e| SettingsError::Serialize(e.to_string()))?;
        self.set(path, from_json(json));
        Ok(())
    }

    /// Typed read; `None` if missing or of another type.
    pub fn get<T: FromSettingsValue>(&self, path: &str) -> Option<T> {
        T::from_settings_value(&self.get_raw(path)?)
    }

    pub fn get_or<T: FromSettingsValue>(&self, path: &str, default: T) -> T {
        self.get(path).unwrap_or(default)
    }

    /// Read any deserializable value.
    pub fn get_deserialized<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        serde_json::from_value(to_json(self.get_raw(path)?)).ok()
    }

    pub fn get_raw(&self, path: &str) -> Option<SettingsValue> {
        lookup(&self.data.read(), &split_path(path)).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        lookup(&self.data.read(), &split_path(path)).is_some()
    }

    pub fn remove(&self, path: &str) -> Option<SettingsValue> {
        let removed = remove_at(&mut self.data.write(), &split_path(path));
        if removed.is_some() {
            self.changed.emit(path.to_string());
            self.try_auto_save();
        }
        removed
    }

    pub fn clear(&self) {
        self.data.write().clear();
        self.changed.emit(String::new());
        self.try_auto_save();
    }

    /// Keys directly under the group at `path`.
    pub fn group_keys(&self, path: &str) -> Vec<String> {
        match lookup(&self.data.read(), &split_path(path)) {
            Some(SettingsValue::Object(group)) => group.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::io(path, e))?;
        let data = serde_json::from_str(&text).map_err(|e| SettingsError::format(path, e))?;
        Ok(Self::from_data(data))
    }

    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::io(path, e))?;
        let table: toml::Table = text.parse().map_err(|e| SettingsError::format(path, e))?;
        let data = table.into_iter().map(|(k, v)| (k, from_toml(v))).collect();
        Ok(Self::from_data(data))
    }

    /// Write JSON atomically.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(&*self.data.read())
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        atomic_write(path.as_ref(), text.as_bytes())
    }

    /// Write TOML atomically. Nulls are written as empty strings.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let table: toml::Table = self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), to_toml(v)))
            .collect();
        let text = toml::to_string_pretty(&table).map_err(|e| SettingsError::Serialize(e.to_string()))?;
        atomic_write(path.as_ref(), text.as_bytes())
    }

    /// Save now if auto-save is on.
    pub fn sync(&self) -> Result<(), SettingsError> {
        let target = self.auto_save.read().clone();
        match target {
            Some(AutoSave { path, format: SettingsFormat::Json }) => self.save_json(path),
            Some(AutoSave { path, format: SettingsFormat::Toml }) => self.save_toml(path),
            None => Ok(()),
        }
    }

    fn try_auto_save(&self) {
        if let Err(err) = self.sync() {
            tracing::error!(target: "horizon_datagrid::settings", error = %err, "failed to auto-save settings");
        }
    }
}

impl UserSettingsStore for Settings {
    fn get(&self, key: &str) -> Option<SettingsValue> {
        self.get_raw(key)
    }

    fn set(&self, key: &str, value: SettingsValue) {
        Settings::set(self, key, value);
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("keys", &self.data.read().len())
            .field("auto_save", &*self.auto_save.read())
            .finish()
    }
}

static_assertions::assert_impl_all!(Settings: Send, Sync);

fn split_path(path: &str) -> Vec<&str> {
    path.split(['.', '/']).filter(|s| !s.is_empty()).collect()
}

fn lookup<'a>(data: &'a HashMap<String, SettingsValue>, parts: &[&str]) -> Option<&'a SettingsValue> {
    let (last, groups) = parts.split_last()?;
    let mut current = data;
    for part in groups {
        current = current.get(*part)?.as_object()?;
    }
    current.get(*last)
}

fn insert_at(data: &mut HashMap<String, SettingsValue>, parts: &[&str], value: SettingsValue) {
    let Some((last, groups)) = parts.split_last() else {
        return;
    };
    let mut current = data;
    for part in groups {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| SettingsValue::Object(HashMap::new()));
        if !matches!(entry, SettingsValue::Object(_)) {
            *entry = SettingsValue::Object(HashMap::new());
        }
        let SettingsValue::Object(group) = entry else {
            return;
        };
        current = group;
    }
    current.insert(last.to_string(), value);
}

fn remove_at(data: &mut HashMap<String, SettingsValue>, parts: &[&str]) -> Option<SettingsValue> {
    let (last, groups) = parts.split_last()?;
    let mut current = data;
    for part in groups {
        match current.get_mut(*part)? {
            SettingsValue::Object(group) => current = group,
            _ => return None,
        }
    }
    current.remove(*last)
}

/// Replace `path` with `bytes` through a temporary file in the same directory.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), SettingsError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| SettingsError::io(path, e))?;
    file.write_all(bytes).map_err(|e| SettingsError::io(path, e))?;
    file.as_file().sync_all().map_err(|e| SettingsError::io(path, e))?;
    file.persist(path).map_err(|e| SettingsError::io(path, e.error))?;
    tracing::debug!(target: "horizon_datagrid::settings", path = %path.display(), "settings saved");
    Ok(())
}

fn from_json(json: serde_json::Value) -> SettingsValue {
    use serde_json::Value as Json;
    match json {
        Json::Null => SettingsValue::Null,
        Json::Bool(b) => SettingsValue::Bool(b),
        Json::Number(n) => n
            .as_i64()
            .map(SettingsValue::Integer)
            .or_else(|| n.as_f64().map(SettingsValue::Float))
            .unwrap_or_default(),
        Json::String(s) => SettingsValue::String(s),
        Json::Array(items) => SettingsValue::Array(items.into_iter().map(from_json).collect()),
        Json::Object(map) => SettingsValue::Object(map.into_iter().map(|(k, v)| (k, from_json(v))).collect()),
    }
}

fn to_json(value: SettingsValue) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        SettingsValue::Null => Json::Null,
        SettingsValue::Bool(b) => Json::Bool(b),
        SettingsValue::Integer(i) => Json::from(i),
        SettingsValue::Float(f) => serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number),
        SettingsValue::String(s) => Json::String(s),
        SettingsValue::Array(items) => Json::Array(items.into_iter().map(to_json).collect()),
        SettingsValue::Object(map) => Json::Object(map.into_iter().map(|(k, v)| (k, to_json(v))).collect()),
    }
}

fn from_toml(value: toml::Value) -> SettingsValue {
    match value {
        toml::Value::String(s) => SettingsValue::String(s),
        toml::Value::Integer(i) => SettingsValue::Integer(i),
        toml::Value::Float(f) => SettingsValue::Float(f),
        toml::Value::Boolean(b) => SettingsValue::Bool(b),
        toml::Value::Datetime(dt) => SettingsValue::String(dt.to_string()),
        toml::Value::Array(items) => SettingsValue::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => {
            SettingsValue::Object(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}

fn to_toml(value: &SettingsValue) -> toml::Value {
    match value {
        SettingsValue::Null => toml::Value::String(String::new()),
        SettingsValue::Bool(b) => toml::Value::Boolean(*b),
        SettingsValue::Integer(i) => toml::Value::Integer(*i),
        SettingsValue::Float(f) => toml::Value::Float(*f),
        SettingsValue::String(s) => toml::Value::String(s.clone()),
        SettingsValue::Array(items) => toml::Value::Array(items.iter().map(to_toml).collect()),
        SettingsValue::Object(map) => {
            toml::Value::Table(map.iter().map(|(k, v)| (k.clone(), to_toml(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_paths_and_types() {
        let settings = Settings::new();
        settings.set("form.grid.RowSize", 24);
        settings.set("form/grid/sortOrder", "DESC");
        settings.set("form.grid.sortedColumn", SettingsValue::Null);

        assert_eq!(settings.get::<i32>("form/grid/RowSize"), Some(24));
        assert_eq!(settings.get::<String>("form.grid.sortOrder"), Some("DESC".into()));
        assert_eq!(settings.get::<String>("form.grid.RowSize"), None);
        assert!(settings.contains("form.grid.sortedColumn"));

        let mut keys = settings.group_keys("form.grid");
        keys.sort();
        assert_eq!(keys, vec!["RowSize", "sortOrder", "sortedColumn"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let settings = Settings::new();
        settings.set("a.b", 1);
        assert_eq!(settings.remove("a.b"), Some(SettingsValue::Integer(1)));
        assert_eq!(settings.remove("a.b"), None);
        settings.set("c", true);
        settings.clear();
        assert!(settings.is_empty());
    }

    #[test]
    fn test_changed_signal() {
        let settings = Settings::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        settings.changed().connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        settings.set("x", 1);
        settings.set("y", 2);
        settings.remove("missing");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_settings_key_sanitizes_segments() {
        let key = SettingsKey::new("main.form", "grid/1");
        assert_eq!(key.grid("RowSize"), "main_form.grid_1.RowSize");
        assert_eq!(key.column("unit.price", "Width"), "main_form.grid_1.column_unit_price.Width");
    }

    #[test]
    fn test_store_trait_round_trip() {
        let store: SharedSettings = Arc::new(Settings::new());
        store.set("f.g.column_qty.Width", SettingsValue::Integer(80));
        assert_eq!(store.get("f.g.column_qty.Width"), Some(SettingsValue::Integer(80)));
        assert_eq!(store.get("f.g.column_qty.Order"), None);
    }

    #[test]
    fn test_json_and_toml_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new();
        settings.set("form.grid.RowSize", 30);
        settings.set("form.grid.column_name.Width", 120);
        settings.set("form.grid.sortOrder", "ASC");

        let json = dir.path().join("user.json");
        settings.save_json(&json).unwrap();
        let loaded = Settings::load_json(&json).unwrap();
        assert_eq!(loaded.get::<i32>("form.grid.column_name.Width"), Some(120));

        let toml = dir.path().join("user.toml");
        settings.save_toml(&toml).unwrap();
        let loaded = Settings::load_toml(&toml).unwrap();
        assert_eq!(loaded.get::<String>("form.grid.sortOrder"), Some("ASC".into()));
        assert_eq!(loaded.get::<i32>("form.grid.RowSize"), Some(30));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(Settings::load_json(&missing), Err(SettingsError::Io { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(Settings::load_json(&broken), Err(SettingsError::Format { .. })));
    }

    #[test]
    fn test_auto_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.json");
        let settings = Settings::new();
        settings.set_auto_save(&path, SettingsFormat::Json);
        assert!(settings.is_auto_save_enabled());

        settings.set("form.grid.RowSize", 22);
        let loaded = Settings::load_json(&path).unwrap();
        assert_eq!(loaded.get::<i32>("form.grid.RowSize"), Some(22));
    }

    #[test]
    fn test_serialized_values() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Widths {
            name: i32,
            qty: i32,
        }

        let settings = Settings::new();
        settings.set_serialized("widths", &Widths { name: 100, qty: 40 }).unwrap();
        assert_eq!(
            settings.get_deserialized::<Widths>("widths"),
            Some(Widths { name: 100, qty: 40 })
        );
    }
}
