//! Cell edit sessions.
//!
//! One [`EditSession`] exists per grid. It walks
//! `Idle -> Editing -> {Committed | Cancelled} -> Idle`: `end` decides whether
//! the edit produced a change, and the grid then either completes the commit
//! after writing to the data source or reverts it when the write fails.

use crate::registry::CellEditor;
use crate::value::Value;

/// Where an edit session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing,
    /// The value changed and is being written to the data source.
    Committed,
    /// The edit ended without a change, or the write failed.
    Cancelled,
}

/// How an edit session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The new value was written to the data source.
    Committed { row: usize, col: usize, value: Value },
    /// Nothing was written.
    Cancelled,
}

impl EditOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, EditOutcome::Committed { .. })
    }
}

/// A change accepted by the editor and awaiting write-through.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub row: usize,
    pub col: usize,
    pub old: Value,
    pub new: Value,
}

/// The edit state machine of one grid.
#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
    cell: Option<(usize, usize)>,
    original: Value,
    editor: Option<Box<dyn CellEditor>>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    /// Whether an editor is open.
    pub fn is_editing(&self) -> bool {
        self.state == EditState::Editing
    }

    /// The cell being edited.
    pub fn cell(&self) -> Option<(usize, usize)> {
        self.cell
    }

    /// Open `editor` on a cell holding `value`.
    ///
    /// Returns `false` if another edit is still open.
    pub fn begin(&mut self, row: usize, col: usize, mut editor: Box<dyn CellEditor>, value: &Value) -> bool {
        if self.is_editing() {
            return false;
        }
        editor.begin_edit(row, col, value);
        self.state = EditState::Editing;
        self.cell = Some((row, col));
        self.original = value.clone();
        self.editor = Some(editor);
        tracing::debug!(target: "horizon_datagrid::edit", row, col, "edit started");
        true
    }

    /// The open editor.
    pub fn editor_mut(&mut self) -> Option<&mut (dyn CellEditor + 'static)> {
        if self.is_editing() {
            self.editor.as_deref_mut()
        } else {
            None
        }
    }

    /// Close the editor.
    ///
    /// Returns the change to write when the editor reports one; the session
    /// is then `Committed` until [`complete`](Self::complete) or
    /// [`revert`](Self::revert). Otherwise the session returns to `Idle`.
    pub fn end(&mut self) -> Option<PendingCommit> {
        if !self.is_editing() {
            return None;
        }
        let (row, col) = self.cell?;
        let editor = self.editor.as_mut()?;

        if editor.end_edit(row, col) {
            self.state = EditState::Committed;
            Some(PendingCommit {
                row,
                col,
                old: self.original.clone(),
                new: editor.value(),
            })
        } else {
            tracing::debug!(target: "horizon_datagrid::edit", row, col, "edit ended without change");
            self.state = EditState::Cancelled;
            self.finish();
            None
        }
    }

    /// Finish a commit whose write succeeded.
    pub fn complete(&mut self) -> EditOutcome {
        if self.state != EditState::Committed {
            return EditOutcome::Cancelled;
        }
        let outcome = match (self.cell, self.editor.as_ref()) {
            (Some((row, col)), Some(editor)) => EditOutcome::Committed {
                row,
                col,
                value: editor.value(),
            },
            _ => EditOutcome::Cancelled,
        };
        self.finish();
        outcome
    }

    /// Abandon a commit whose write failed, restoring the editor value.
    pub fn revert(&mut self) -> EditOutcome {
        if let Some(editor) = self.editor.as_mut() {
            editor.reset();
        }
        self.state = EditState::Cancelled;
        self.finish();
        EditOutcome::Cancelled
    }

    /// Close the editor without committing.
    pub fn cancel(&mut self) -> EditOutcome {
        if !self.is_editing() {
            return EditOutcome::Cancelled;
        }
        if let Some((row, col)) = self.cell {
            tracing::debug!(target: "horizon_datagrid::edit", row, col, "edit cancelled");
        }
        self.revert()
    }

    fn finish(&mut self) {
        self.state = EditState::Idle;
        self.cell = None;
        self.editor = None;
        self.original = Value::Null;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ChoiceEditor, ValueEditor};
    use crate::value::DataType;

    #[test]
    fn test_commit_path() {
        let mut session = EditSession::new();
        assert!(session.begin(1, 2, Box::new(ValueEditor::new(DataType::Int)), &Value::Int(3)));
        assert!(!session.begin(0, 0, Box::new(ValueEditor::new(DataType::Int)), &Value::Null));
        assert_eq!(session.state(), EditState::Editing);

        session.editor_mut().map(|e| e.set_text("4"));
        let pending = session.end().unwrap();
        assert_eq!(pending.old, Value::Int(3));
        assert_eq!(pending.new, Value::Int(4));
        assert_eq!(session.state(), EditState::Committed);

        let outcome = session.complete();
        assert_eq!(
            outcome,
            EditOutcome::Committed { row: 1, col: 2, value: Value::Int(4) }
        );
        assert_eq!(session.state(), EditState::Idle);
    }

    #[test]
    fn test_unchanged_value_is_not_committed() {
        let mut session = EditSession::new();
        session.begin(0, 0, Box::new(ValueEditor::new(DataType::Str)), &Value::from("a"));
        assert!(session.end().is_none());
        assert_eq!(session.state(), EditState::Idle);
        assert_eq!(session.complete(), EditOutcome::Cancelled);
    }

    #[test]
    fn test_invalid_choice_never_commits() {
        let mut session = EditSession::new();
        let editor = ChoiceEditor::new(vec!["red".into(), "blue".into()]);
        session.begin(0, 0, Box::new(editor), &Value::from("red"));
        session.editor_mut().map(|e| e.set_text("green"));
        assert!(session.end().is_none());
    }

    #[test]
    fn test_revert_after_failed_write() {
        let mut session = EditSession::new();
        session.begin(0, 0, Box::new(ValueEditor::new(DataType::Int)), &Value::Int(1));
        session.editor_mut().map(|e| e.set_value(Value::Int(2)));
        assert!(session.end().is_some());
        assert_eq!(session.revert(), EditOutcome::Cancelled);
        assert!(!session.is_editing());
        assert!(session.cell().is_none());
    }
}
