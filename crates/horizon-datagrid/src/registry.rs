//! Renderer and editor dispatch.
//!
//! Each data type has a default [`CellRenderer`] and [`CellEditor`]. A column
//! may override them as a whole, and per row. Lookups follow one chain:
//! per-row override, then the column override, then the data type default.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::column::Column;
use crate::value::{DataType, Value};

/// Formatting inputs for a renderer.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    /// Text shown for a null value.
    pub none_display: &'a str,
    /// Fractional digits for floats and decimals.
    pub precision: usize,
}

/// Turns a cell value into display text.
pub trait CellRenderer: Send + Sync + fmt::Debug {
    /// Short name identifying the renderer.
    fn name(&self) -> &'static str;

    /// The text to draw for `value`.
    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String;

    /// Whether long text wraps onto several lines.
    fn wraps(&self) -> bool {
        false
    }
}

/// Plain text.
#[derive(Debug, Default)]
pub struct TextRenderer;

impl CellRenderer for TextRenderer {
    fn name(&self) -> &'static str {
        "text"
    }

    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String {
        value.display_text(options.none_display, options.precision)
    }
}

/// Text that wraps at the cell width.
#[derive(Debug, Default)]
pub struct WrapTextRenderer;

impl CellRenderer for WrapTextRenderer {
    fn name(&self) -> &'static str {
        "wrap_text"
    }

    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String {
        value.display_text(options.none_display, options.precision)
    }

    fn wraps(&self) -> bool {
        true
    }
}

/// Integers, shown without grouping.
#[derive(Debug, Default)]
pub struct NumberRenderer;

impl CellRenderer for NumberRenderer {
    fn name(&self) -> &'static str {
        "number"
    }

    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String {
        match value {
            // `+ 0.0` turns a rounded negative zero into zero.
            Value::Float(v) | Value::Decimal(v) => format!("{:.0}", v.round() + 0.0),
            other => other.display_text(options.none_display, 0),
        }
    }
}

/// Floats and decimals, shown with the column precision.
#[derive(Debug, Default)]
pub struct FloatRenderer;

impl CellRenderer for FloatRenderer {
    fn name(&self) -> &'static str {
        "float"
    }

    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String {
        let precision = options.precision;
        match value.as_f64() {
            Some(v) => format!("{v:.precision$}"),
            None => value.display_text(options.none_display, precision),
        }
    }
}

/// Booleans, shown as a check mark.
#[derive(Debug, Default)]
pub struct BoolRenderer;

impl CellRenderer for BoolRenderer {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String {
        match value {
            Value::Bool(true) => "[x]".to_string(),
            Value::Bool(false) => "[ ]".to_string(),
            other => other.display_text(options.none_display, 0),
        }
    }
}

/// Dates, datetimes and times in ISO 8601.
#[derive(Debug, Default)]
pub struct DateRenderer;

impl CellRenderer for DateRenderer {
    fn name(&self) -> &'static str {
        "date"
    }

    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String {
        value.display_text(options.none_display, 0)
    }
}

/// List values and choice cells.
#[derive(Debug, Default)]
pub struct ListRenderer;

impl CellRenderer for ListRenderer {
    fn name(&self) -> &'static str {
        "list"
    }

    fn render(&self, value: &Value, options: &RenderOptions<'_>) -> String {
        value.display_text(options.none_display, options.precision)
    }
}

/// Edits one cell at a time.
///
/// An editor holds the value being edited between `begin_edit` and
/// `end_edit`. `end_edit` reports whether the value changed; the caller only
/// writes to the data source when it did.
pub trait CellEditor: Send + fmt::Debug {
    /// Start editing the cell, seeded with its current value.
    fn begin_edit(&mut self, row: usize, col: usize, value: &Value);

    /// Replace the pending value. Returns `false` if the editor rejects it.
    fn set_value(&mut self, value: Value) -> bool;

    /// Replace the pending value from typed text. Returns `false` if the text
    /// does not parse.
    fn set_text(&mut self, text: &str) -> bool;

    /// The pending value.
    fn value(&self) -> Value;

    /// Finish editing. Returns `true` if the value should be committed.
    fn end_edit(&mut self, row: usize, col: usize) -> bool;

    /// Restore the value the edit started with.
    fn reset(&mut self);

    /// Set the valid choices, for choice editors.
    fn set_choices(&mut self, _choices: Vec<Value>) {}

    /// The valid choices; empty for free-form editors.
    fn choices(&self) -> &[Value] {
        &[]
    }
}

/// Free-form editor for one data type.
#[derive(Debug)]
pub struct ValueEditor {
    data_type: DataType,
    original: Value,
    current: Value,
    cell: Option<(usize, usize)>,
}

impl ValueEditor {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            original: Value::Null,
            current: Value::Null,
            cell: None,
        }
    }
}

impl CellEditor for ValueEditor {
    fn begin_edit(&mut self, row: usize, col: usize, value: &Value) {
        self.original = value.clone();
        self.current = value.clone();
        self.cell = Some((row, col));
    }

    fn set_value(&mut self, value: Value) -> bool {
        if !self.data_type.accepts(&value) {
            return false;
        }
        self.current = value;
        true
    }

    fn set_text(&mut self, text: &str) -> bool {
        match Value::parse_as(text, self.data_type) {
            Some(value) => {
                self.current = value;
                true
            }
            None => false,
        }
    }

    fn value(&self) -> Value {
        self.current.clone()
    }

    fn end_edit(&mut self, _row: usize, _col: usize) -> bool {
        self.cell = None;
        self.current != self.original
    }

    fn reset(&mut self) {
        self.current = self.original.clone();
    }
}

/// Editor restricted to a list of valid choices.
///
/// Ending an edit on a value outside the list reverts quietly and reports no
/// change.
#[derive(Debug, Default)]
pub struct ChoiceEditor {
    choices: Vec<Value>,
    original: Value,
    current: Value,
}

impl ChoiceEditor {
    pub fn new(choices: Vec<Value>) -> Self {
        Self {
            choices,
            ..Default::default()
        }
    }
}

impl CellEditor for ChoiceEditor {
    fn begin_edit(&mut self, _row: usize, _col: usize, value: &Value) {
        self.original = value.clone();
        self.current = value.clone();
    }

    fn set_value(&mut self, value: Value) -> bool {
        self.current = value;
        true
    }

    fn set_text(&mut self, text: &str) -> bool {
        self.current = self
            .choices
            .iter()
            .find(|choice| choice.plain_text() == text)
            .cloned()
            .unwrap_or_else(|| Value::Str(text.to_string()));
        true
    }

    fn value(&self) -> Value {
        self.current.clone()
    }

    fn end_edit(&mut self, row: usize, col: usize) -> bool {
        if !self.choices.contains(&self.current) {
            tracing::debug!(
                target: "horizon_datagrid::edit",
                row,
                col,
                value = ?self.current,
                "value is not a valid choice, reverting"
            );
            self.reset();
            return false;
        }
        self.current != self.original
    }

    fn reset(&mut self) {
        self.current = self.original.clone();
    }

    fn set_choices(&mut self, choices: Vec<Value>) {
        self.choices = choices;
    }

    fn choices(&self) -> &[Value] {
        &self.choices
    }
}

/// Creates a fresh editor per edit session.
#[derive(Clone)]
pub struct EditorFactory(Arc<dyn Fn() -> Box<dyn CellEditor> + Send + Sync>);

impl EditorFactory {
    pub fn new<F>(create: F) -> Self
    where
        F: Fn() -> Box<dyn CellEditor> + Send + Sync + 'static,
    {
        Self(Arc::new(create))
    }

    /// Factory for a [`ValueEditor`] of `data_type`.
    pub fn value(data_type: DataType) -> Self {
        Self::new(move || Box::new(ValueEditor::new(data_type)))
    }

    /// Factory for an empty [`ChoiceEditor`].
    pub fn choice() -> Self {
        Self::new(|| Box::new(ChoiceEditor::default()))
    }

    pub fn create(&self) -> Box<dyn CellEditor> {
        (self.0)()
    }
}

impl PartialEq for EditorFactory {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EditorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EditorFactory").finish_non_exhaustive()
    }
}

/// Default renderers and editors by data type, with column overrides.
#[derive(Debug, Clone)]
pub struct RendererEditorRegistry {
    renderers: HashMap<DataType, Arc<dyn CellRenderer>>,
    editors: HashMap<DataType, EditorFactory>,
    wrap_renderer: Arc<dyn CellRenderer>,
}

impl Default for RendererEditorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererEditorRegistry {
    /// Create a registry with the built-in type table.
    pub fn new() -> Self {
        let text: Arc<dyn CellRenderer> = Arc::new(TextRenderer);
        let number: Arc<dyn CellRenderer> = Arc::new(NumberRenderer);
        let float: Arc<dyn CellRenderer> = Arc::new(FloatRenderer);
        let date: Arc<dyn CellRenderer> = Arc::new(DateRenderer);

        let renderers: HashMap<DataType, Arc<dyn CellRenderer>> = [
            (DataType::Str, text),
            (DataType::Bool, Arc::new(BoolRenderer) as Arc<dyn CellRenderer>),
            (DataType::Int, number.clone()),
            (DataType::Long, number),
            (DataType::Float, float.clone()),
            (DataType::Decimal, float),
            (DataType::Date, date.clone()),
            (DataType::DateTime, date.clone()),
            (DataType::Time, date),
            (DataType::List, Arc::new(ListRenderer)),
        ]
        .into_iter()
        .collect();

        let editors = [
            DataType::Str,
            DataType::Bool,
            DataType::Int,
            DataType::Long,
            DataType::Float,
            DataType::Decimal,
            DataType::Date,
            DataType::DateTime,
            DataType::Time,
        ]
        .into_iter()
        .map(|dtype| (dtype, EditorFactory::value(dtype)))
        .chain(std::iter::once((DataType::List, EditorFactory::choice())))
        .collect();

        Self {
            renderers,
            editors,
            wrap_renderer: Arc::new(WrapTextRenderer),
        }
    }

    /// Replace the default renderer of a data type.
    pub fn set_renderer(&mut self, data_type: DataType, renderer: Arc<dyn CellRenderer>) {
        self.renderers.insert(data_type, renderer);
    }

    /// Replace the default editor of a data type.
    pub fn set_editor(&mut self, data_type: DataType, editor: EditorFactory) {
        self.editors.insert(data_type, editor);
    }

    /// The renderer a column uses when no override applies.
    pub fn column_renderer(&self, column: &Column) -> Arc<dyn CellRenderer> {
        if let Some(renderer) = &column.custom_renderer {
            return renderer.clone();
        }
        if column.word_wrap && column.data_type == DataType::Str {
            return self.wrap_renderer.clone();
        }
        self.renderers
            .get(&column.data_type)
            .cloned()
            .unwrap_or_else(|| Arc::new(TextRenderer))
    }

    /// The renderer for one cell of `column`.
    pub fn renderer_for(&self, column: &Column, row: usize) -> Arc<dyn CellRenderer> {
        column
            .custom_renderers
            .get(&row)
            .cloned()
            .unwrap_or_else(|| self.column_renderer(column))
    }

    /// A new editor for one cell of `column`, with its choices set.
    pub fn editor_for(&self, column: &Column, row: usize) -> Box<dyn CellEditor> {
        let factory = column
            .custom_editors
            .get(&row)
            .or(column.custom_editor.as_ref())
            .or_else(|| self.editors.get(&column.data_type));

        let mut editor = match factory {
            Some(factory) => factory.create(),
            None => Box::new(ValueEditor::new(column.data_type)),
        };
        editor.set_choices(column.list_choices_for_row(row).to_vec());
        editor
    }
}
