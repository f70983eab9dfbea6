//! Controls bound to the same data fields as a grid.
//!
//! A form may show a field of the current row in a separate control, such as
//! a checkbox next to the grid. After the grid commits an edit it refreshes
//! every bound control of that field. The grid only holds weak handles, so a
//! dropped control simply stops being refreshed.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::value::Value;

/// A control that displays one data field.
pub trait BoundControl: Send + Sync {
    /// The field the control shows.
    fn data_field(&self) -> &str;

    /// Show `value`, the field's new value in `row`.
    fn refresh(&self, row: usize, value: &Value);
}

/// Weak handles to bound controls.
#[derive(Default)]
pub struct BoundControls {
    controls: Vec<Weak<dyn BoundControl>>,
}

impl BoundControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, control: &Arc<dyn BoundControl>) {
        self.controls.push(Arc::downgrade(control));
    }

    /// Number of controls still alive.
    pub fn len(&self) -> usize {
        self.controls.iter().filter(|c| c.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refresh the live controls of `field` and drop dead handles.
    ///
    /// Returns how many controls were refreshed.
    pub fn notify(&mut self, field: &str, row: usize, value: &Value) -> usize {
        let mut refreshed = 0;
        self.controls.retain(|handle| match handle.upgrade() {
            Some(control) => {
                if control.data_field() == field {
                    control.refresh(row, value);
                    refreshed += 1;
                }
                true
            }
            None => false,
        });
        refreshed
    }
}

impl std::fmt::Debug for BoundControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundControls")
            .field("live", &self.len())
            .finish()
    }
}

/// A bound control that remembers the last value it was shown.
#[derive(Debug)]
pub struct ValueLabel {
    field: String,
    last: Mutex<Option<(usize, Value)>>,
}

impl ValueLabel {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            last: Mutex::new(None),
        }
    }

    /// The last row and value shown.
    pub fn last(&self) -> Option<(usize, Value)> {
        self.last.lock().clone()
    }
}

impl BoundControl for ValueLabel {
    fn data_field(&self) -> &str {
        &self.field
    }

    fn refresh(&self, row: usize, value: &Value) {
        *self.last.lock() = Some((row, value.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_matching_field_and_prune() {
        let active: Arc<dyn BoundControl> = Arc::new(ValueLabel::new("active"));
        let other: Arc<dyn BoundControl> = Arc::new(ValueLabel::new("name"));

        let mut controls = BoundControls::new();
        controls.bind(&active);
        controls.bind(&other);
        {
            let dropped: Arc<dyn BoundControl> = Arc::new(ValueLabel::new("active"));
            controls.bind(&dropped);
        }

        assert_eq!(controls.notify("active", 2, &Value::Bool(true)), 1);
        assert_eq!(controls.len(), 2);
    }

    #[test]
    fn test_value_label_records() {
        let label = ValueLabel::new("qty");
        label.refresh(4, &Value::Int(9));
        assert_eq!(label.last(), Some((4, Value::Int(9))));
    }
}
