//! Computed column and cell properties.
//!
//! A [`DynamicBinding`] computes one property from the current state instead
//! of storing it. Column-level bindings are evaluated when the grid refreshes;
//! cell-level bindings are evaluated per row just before a cell is painted.
//! Evaluation never mutates the column, so the result does not depend on the
//! order in which cells are painted.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::paint::Color;
use crate::value::Value;

/// A property a binding can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DynamicProperty {
    ForeColor,
    BackColor,
    FontBold,
    Visible,
    Caption,
    CellForeColor,
    CellBackColor,
    CellFontBold,
}

impl DynamicProperty {
    /// Whether the property is evaluated per cell.
    pub fn is_cell_level(self) -> bool {
        matches!(
            self,
            DynamicProperty::CellForeColor
                | DynamicProperty::CellBackColor
                | DynamicProperty::CellFontBold
        )
    }
}

/// A computed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Color(Color),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// What a binding sees when it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct DynamicContext<'a> {
    /// The row for cell-level bindings; `None` for column-level ones.
    pub row: Option<usize>,
    /// The column's data field.
    pub field: &'a str,
    /// The cell value for cell-level bindings.
    pub value: Option<&'a Value>,
    /// Extra arguments stored with the binding.
    pub args: &'a [Value],
}

type ComputeFn = Arc<dyn Fn(&DynamicContext<'_>) -> Option<PropertyValue> + Send + Sync>;

/// A property computed by a function.
#[derive(Clone)]
pub struct DynamicBinding {
    pub property: DynamicProperty,
    compute: ComputeFn,
    pub args: Vec<Value>,
}

impl DynamicBinding {
    /// Bind `property` to `compute`.
    pub fn new<F>(property: DynamicProperty, compute: F) -> Self
    where
        F: Fn(&DynamicContext<'_>) -> Option<PropertyValue> + Send + Sync + 'static,
    {
        Self {
            property,
            compute: Arc::new(compute),
            args: Vec::new(),
        }
    }

    /// Attach extra arguments passed to every evaluation.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Evaluate for a column.
    pub fn evaluate_column(&self, field: &str) -> Option<PropertyValue> {
        (self.compute)(&DynamicContext {
            row: None,
            field,
            value: None,
            args: &self.args,
        })
    }

    /// Evaluate for one cell.
    pub fn evaluate_cell(&self, field: &str, row: usize, value: &Value) -> Option<PropertyValue> {
        (self.compute)(&DynamicContext {
            row: Some(row),
            field,
            value: Some(value),
            args: &self.args,
        })
    }

    /// Whether two bindings share the same function and arguments.
    pub fn same_as(&self, other: &DynamicBinding) -> bool {
        self.property == other.property
            && Arc::ptr_eq(&self.compute, &other.compute)
            && self.args == other.args
    }
}

impl fmt::Debug for DynamicBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBinding")
            .field("property", &self.property)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Bindings of one column, keyed by property.
pub type DynamicBindings = BTreeMap<DynamicProperty, DynamicBinding>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_binding_sees_row_and_value() {
        let binding = DynamicBinding::new(DynamicProperty::CellBackColor, |ctx| {
            match ctx.value {
                Some(Value::Int(n)) if *n < 0 => Some(PropertyValue::Color(Color::from_rgb(255, 0, 0))),
                _ => None,
            }
        });

        assert!(binding.property.is_cell_level());
        assert_eq!(
            binding
                .evaluate_cell("balance", 3, &Value::Int(-5))
                .and_then(|v| v.as_color()),
            Some(Color::from_rgb(255, 0, 0))
        );
        assert_eq!(binding.evaluate_cell("balance", 3, &Value::Int(5)), None);
    }

    #[test]
    fn test_column_binding_uses_args() {
        let binding = DynamicBinding::new(DynamicProperty::Caption, |ctx| {
            let suffix = ctx.args.first()?.as_str()?;
            Some(PropertyValue::Text(format!("{} ({suffix})", ctx.field)))
        })
        .with_args(vec!["USD".into()]);

        assert!(!binding.property.is_cell_level());
        assert_eq!(
            binding.evaluate_column("price"),
            Some(PropertyValue::Text("price (USD)".into()))
        );
    }

    #[test]
    fn test_same_as() {
        let a = DynamicBinding::new(DynamicProperty::Visible, |_| Some(PropertyValue::Bool(true)));
        let b = a.clone();
        let c = DynamicBinding::new(DynamicProperty::Visible, |_| Some(PropertyValue::Bool(true)));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
