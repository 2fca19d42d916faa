//! Application state definitions
//!
//! Everything the console remembers between key presses that is not part of
//! the form itself: mode, focus and cursors, open editors and prompts, and
//! the status line.

use crate::theme::Severity;

/// Console operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppMode {
    /// Moving between the fields of the current step
    Editing,
    /// Editing the sub-fields of one array item
    ItemEditor,
    /// Typing a file path for a file field
    PathPrompt,
    /// The form was submitted; waiting to close
    Submitted,
}

/// The array item being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEditorState {
    pub field_id: String,
    pub index: usize,
    /// Focus among the item's visible sub-fields
    pub focus: usize,
}

/// A value the console edits: a top-level field or one sub-field of an
/// array item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Field(String),
    Item {
        field_id: String,
        index: usize,
        sub_field: String,
    },
}

/// File path prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPromptState {
    pub target: EditTarget,
    pub label: String,
    pub input: String,
    /// Mode to go back to when the prompt closes
    pub return_mode: AppMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

/// Main console state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    /// Index of the focused field among the visible fields of the step
    pub focus: usize,
    /// Option under the cursor of a multi-select
    pub option_cursor: usize,
    /// Selected item of an array field
    pub item_cursor: usize,
    pub item_editor: Option<ItemEditorState>,
    pub path_prompt: Option<PathPromptState>,
    pub status: Option<StatusMessage>,
    pub help_visible: bool,
    /// Whether the last successful submission was a draft
    pub submitted_draft: Option<bool>,
    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Editing,
            focus: 0,
            option_cursor: 0,
            item_cursor: 0,
            item_editor: None,
            path_prompt: None,
            status: None,
            help_visible: false,
            submitted_draft: None,
            should_quit: false,
        }
    }
}

impl AppState {
    pub fn set_status(&mut self, severity: Severity, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            severity,
            text: text.into(),
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Reset the per-field cursors after focus moves
    pub fn reset_cursors(&mut self) {
        self.option_cursor = 0;
        self.item_cursor = 0;
    }

    /// Focus the first field, e.g. after a step change
    pub fn focus_first(&mut self) {
        self.focus = 0;
        self.reset_cursors();
    }
}
