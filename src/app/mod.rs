//! Application module
//!
//! The interactive console: owns one [`FormEngine`], walks its steps with a
//! [`StepNavigator`] and turns key presses into engine operations.
//!
//! # Module Structure
//! - `state` - Console state types (AppState, AppMode, EditTarget, ...)
//! - Main module - App struct, key handling and the event loop

mod state;

pub use state::{AppMode, AppState, EditTarget, ItemEditorState, PathPromptState, StatusMessage};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::Backend};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::components::keybindings::{KeyAction, KeybindingContext};
use crate::engine::path::get_path;
use crate::engine::{
    ArraySection, FORM_ERROR_KEY, FormEngine, NavigationError, StepNavigator, SubmitOutcome,
    is_visible, item_error_key,
};
use crate::error::{FormError, Result};
use crate::field::{FieldKind, FormField};
use crate::theme::{Severity, UiText};
use crate::types::InputType;
use crate::ui::UiRenderer;
use crate::value::{FileAttachment, FormValue};

/// The character a key press types, if it is plain text input
fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() => Some(c),
        _ => None,
    }
}

/// Value stored for typed text: whole numbers become numbers in number inputs
fn coerce_text(field: &FormField, text: String) -> FormValue {
    if let FieldKind::Input {
        input_type: InputType::Number,
    } = field.kind
    {
        if let Ok(n) = text.parse::<i64>() {
            return FormValue::from(n);
        }
    }
    FormValue::String(text)
}

/// Main application struct
pub struct App {
    engine: FormEngine,
    navigator: StepNavigator,
    state: AppState,
    keybinding_context: KeybindingContext,
    sections: HashMap<String, ArraySection>,
    ui_renderer: UiRenderer,
}

impl App {
    /// Create a console for `engine`, starting at the first step
    pub fn new(engine: FormEngine) -> Self {
        info!(form = %engine.config().id, "Creating new App instance");
        let navigator = StepNavigator::for_engine(&engine);
        Self {
            engine,
            navigator,
            state: AppState::default(),
            keybinding_context: KeybindingContext::new(),
            sections: HashMap::new(),
            ui_renderer: UiRenderer::new(),
        }
    }

    pub fn engine(&self) -> &FormEngine {
        &self.engine
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn keybinding_context(&self) -> &KeybindingContext {
        &self.keybinding_context
    }

    /// Hand the engine back, e.g. to read the final document
    pub fn into_engine(self) -> FormEngine {
        self.engine
    }

    // ------------------------------------------------------------------
    // Queries used by the renderer
    // ------------------------------------------------------------------

    /// Fields of the current step that are shown for the current data
    pub fn visible_fields(&self) -> Vec<&FormField> {
        let data = self.engine.data();
        self.engine
            .config()
            .steps
            .get(self.navigator.current())
            .map(|step| step.fields.iter().filter(|f| is_visible(f, data)).collect())
            .unwrap_or_default()
    }

    pub fn focused_field(&self) -> Option<&FormField> {
        self.visible_fields().get(self.state.focus).copied()
    }

    /// Id of the freshly added item of array field `field_id`
    pub fn highlighted_item(&self, field_id: &str) -> Option<&str> {
        self.sections.get(field_id).and_then(ArraySection::last_added)
    }

    /// The array field, item and visible sub-fields open in the item editor
    pub fn editing_item(&self) -> Option<(&FormField, FormValue, Vec<&FormField>)> {
        let editor = self.state.item_editor.as_ref()?;
        let field = self.engine.field(&editor.field_id)?;
        let item = self
            .engine
            .value(&editor.field_id)?
            .as_array()?
            .get(editor.index)?
            .clone();
        let subs = field
            .items()?
            .item_fields
            .iter()
            .filter(|sub| is_visible(sub, &item))
            .collect();
        Some((field, item, subs))
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Run the console until the user quits
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("Starting main application loop");
        loop {
            terminal.draw(|f| self.ui_renderer.render(f, self))?;

            if crossterm::event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = crossterm::event::read()? {
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        info!("Leaving main application loop");
        Ok(())
    }

    /// Handle one key press. Returns whether the console should exit.
    ///
    /// Failures are reported on the status line, never propagated.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return self.state.should_quit;
        }
        self.clamp_focus();

        let action = self.keybinding_context.resolve(&self.state.mode, &key);
        if self.state.help_visible {
            if action == Some(KeyAction::Help) || key.code == KeyCode::Esc {
                self.state.help_visible = false;
            }
            return self.state.should_quit;
        }
        if action == Some(KeyAction::Help) {
            self.state.help_visible = true;
            return self.state.should_quit;
        }

        let result = match self.state.mode {
            AppMode::Editing => self.handle_editing(action, &key),
            AppMode::ItemEditor => self.handle_item_editor(action, &key),
            AppMode::PathPrompt => self.handle_path_prompt(action, &key),
            AppMode::Submitted => {
                if matches!(action, Some(KeyAction::Dismiss | KeyAction::Quit)) {
                    self.state.should_quit = true;
                }
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(error = %err, "Key handling failed");
            self.state.set_status(Severity::Danger, err.to_string());
        }
        self.state.should_quit
    }

    fn clamp_focus(&mut self) {
        let count = self.visible_fields().len();
        if self.state.focus >= count {
            self.state.focus = count.saturating_sub(1);
        }
    }

    // ------------------------------------------------------------------
    // Editing mode
    // ------------------------------------------------------------------

    fn handle_editing(&mut self, action: Option<KeyAction>, key: &KeyEvent) -> Result<()> {
        let field = self.focused_field().cloned();
        let target = field.as_ref().map(|f| EditTarget::Field(f.id.clone()));

        if let (Some(field), Some(target), Some(c)) = (&field, &target, typed_char(key)) {
            if field.field_type().is_text_like() {
                return self.type_char(target, field, c);
            }
        }

        match action {
            Some(KeyAction::NextField) => self.move_focus(1),
            Some(KeyAction::PrevField) => self.move_focus(-1),
            Some(KeyAction::NextStep) => self.next_step(),
            Some(KeyAction::PrevStep) => self.previous_step(),
            Some(KeyAction::Submit) => return self.submit(false),
            Some(KeyAction::SaveDraft) => return self.submit(true),
            Some(KeyAction::Quit) => {
                info!("Quit requested");
                self.state.should_quit = true;
            }
            Some(action) => {
                if let (Some(field), Some(target)) = (field, target) {
                    return self.edit(action, &target, &field);
                }
            }
            None => {}
        }
        Ok(())
    }

    fn move_focus(&mut self, delta: isize) {
        let count = self.visible_fields().len();
        if count == 0 {
            return;
        }
        if let Some(id) = self.focused_field().map(|f| f.id.clone()) {
            self.engine.handle_blur(&id);
        }
        self.state.focus = (self.state.focus as isize + delta).rem_euclid(count as isize) as usize;
        self.state.reset_cursors();
    }

    fn next_step(&mut self) {
        match self.navigator.next(&mut self.engine) {
            Ok(step) => {
                debug!(step, "Advanced to next step");
                self.state.focus_first();
                self.state.clear_status();
            }
            Err(NavigationError::StepInvalid { .. }) => {
                self.state.set_status(Severity::Warning, UiText::FIX_ERRORS);
                self.focus_first_error();
            }
            Err(NavigationError::AtLastStep) => {
                self.state.set_status(
                    Severity::Info,
                    "Last step: Ctrl+S to publish, Ctrl+D to save a draft",
                );
            }
            Err(err) => self.state.set_status(Severity::Warning, err.to_string()),
        }
    }

    fn previous_step(&mut self) {
        if self.navigator.previous().is_ok() {
            self.state.focus_first();
            self.state.clear_status();
        }
    }

    /// Focus the first visible field of the current step with a visible error
    fn focus_first_error(&mut self) {
        let position = self.visible_fields().iter().position(|f| {
            let prefix = format!("{}.", f.id);
            self.engine
                .errors()
                .keys()
                .any(|k| (k == &f.id || k.starts_with(&prefix)) && self.engine.is_touched(k))
        });
        if let Some(position) = position {
            self.state.focus = position;
            self.state.reset_cursors();
        }
    }

    fn submit(&mut self, is_draft: bool) -> Result<()> {
        match self.engine.handle_submit(is_draft) {
            Ok(SubmitOutcome::Submitted) if is_draft => {
                info!("Draft saved");
                self.state.set_status(Severity::Success, UiText::DRAFT_SAVED);
                self.state.submitted_draft = Some(true);
            }
            Ok(SubmitOutcome::Submitted) => {
                info!("Form submitted");
                self.state.set_status(Severity::Success, UiText::SUBMITTED);
                self.state.submitted_draft = Some(false);
                self.state.mode = AppMode::Submitted;
            }
            Ok(SubmitOutcome::Invalid) => {
                self.state.set_status(Severity::Warning, UiText::FIX_ERRORS);
                if let Some(step) = self.first_step_with_errors() {
                    // Steps before the first invalid one are valid, so the jump
                    // succeeds in either direction
                    if self.navigator.jump_to(step, &mut self.engine).is_ok() {
                        self.state.focus_first();
                    }
                }
                self.focus_first_error();
            }
            Err(FormError::Submit(err)) => {
                warn!(error = %err, "Submission failed");
                let message = self.engine.error(FORM_ERROR_KEY).unwrap_or(UiText::FIX_ERRORS);
                self.state.set_status(Severity::Danger, message.to_string());
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn first_step_with_errors(&self) -> Option<usize> {
        let errors = self.engine.errors();
        self.engine.config().steps.iter().position(|step| {
            step.fields.iter().any(|f| {
                let prefix = format!("{}.", f.id);
                errors.keys().any(|k| k == &f.id || k.starts_with(&prefix))
            })
        })
    }

    // ------------------------------------------------------------------
    // Item editor mode
    // ------------------------------------------------------------------

    fn open_item_editor(&mut self, field: &FormField) {
        let count = self
            .engine
            .value(&field.id)
            .and_then(FormValue::as_array)
            .map_or(0, Vec::len);
        if self.state.item_cursor >= count {
            self.state
                .set_status(Severity::Info, "Press Ctrl+A to add an item first");
            return;
        }
        debug!(field = %field.id, index = self.state.item_cursor, "Opening item editor");
        self.state.item_editor = Some(ItemEditorState {
            field_id: field.id.clone(),
            index: self.state.item_cursor,
            focus: 0,
        });
        self.state.option_cursor = 0;
        self.state.mode = AppMode::ItemEditor;
    }

    fn close_item_editor(&mut self) {
        // The focused sub-field resolves through the open editor, so blur first
        if let Some(editor) = self.state.item_editor.clone() {
            self.blur_item_sub_field(&editor);
            self.engine.handle_blur(&editor.field_id);
            self.state.item_cursor = editor.index;
        }
        self.state.item_editor = None;
        self.state.option_cursor = 0;
        self.state.mode = AppMode::Editing;
    }

    fn blur_item_sub_field(&mut self, editor: &ItemEditorState) {
        let sub_id = self
            .editing_item()
            .and_then(|(_, _, subs)| subs.get(editor.focus).map(|s| s.id.clone()));
        if let Some(sub_id) = sub_id {
            self.engine
                .handle_blur(&item_error_key(&editor.field_id, editor.index, &sub_id));
        }
    }

    fn handle_item_editor(&mut self, action: Option<KeyAction>, key: &KeyEvent) -> Result<()> {
        let Some(editor) = self.state.item_editor.clone() else {
            self.state.mode = AppMode::Editing;
            return Ok(());
        };
        let Some((count, sub)) = self
            .editing_item()
            .map(|(_, _, subs)| (subs.len(), subs.get(editor.focus).map(|s| (*s).clone())))
        else {
            // The item disappeared underneath the editor
            self.close_item_editor();
            return Ok(());
        };

        let target = sub.as_ref().map(|s| EditTarget::Item {
            field_id: editor.field_id.clone(),
            index: editor.index,
            sub_field: s.id.clone(),
        });

        if let (Some(sub), Some(target), Some(c)) = (&sub, &target, typed_char(key)) {
            if sub.field_type().is_text_like() {
                return self.type_char(target, sub, c);
            }
        }

        match action {
            Some(KeyAction::Back) => self.close_item_editor(),
            Some(KeyAction::NextField | KeyAction::PrevField) if count > 0 => {
                self.blur_item_sub_field(&editor);
                let delta = if action == Some(KeyAction::NextField) { 1 } else { -1 };
                let focus = (editor.focus as isize + delta).rem_euclid(count as isize) as usize;
                if let Some(editor) = self.state.item_editor.as_mut() {
                    editor.focus = focus;
                }
                self.state.option_cursor = 0;
            }
            Some(action) => {
                if let (Some(sub), Some(target)) = (sub, target) {
                    return self.edit(action, &target, &sub);
                }
            }
            None => {}
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Field edits shared by both modes
    // ------------------------------------------------------------------

    fn edit(&mut self, action: KeyAction, target: &EditTarget, field: &FormField) -> Result<()> {
        match action {
            KeyAction::OptionPrev => self.cycle(target, field, -1),
            KeyAction::OptionNext => self.cycle(target, field, 1),
            KeyAction::Toggle => self.toggle_option(target, field),
            KeyAction::Activate => self.activate(target, field),
            KeyAction::DeleteChar => {
                if field.field_type().is_text_like() {
                    let mut text = self.read_text(target);
                    text.pop();
                    self.write_value(target, coerce_text(field, text))?;
                }
                Ok(())
            }
            KeyAction::AddItem => self.add_item(field),
            KeyAction::RemoveItem => self.remove_at_cursor(target, field),
            _ => Ok(()),
        }
    }

    fn read_value(&self, target: &EditTarget) -> Option<FormValue> {
        match target {
            EditTarget::Field(id) => self.engine.value(id).cloned(),
            EditTarget::Item {
                field_id,
                index,
                sub_field,
            } => {
                let item = self.engine.value(field_id)?.as_array()?.get(*index)?;
                get_path(item, sub_field).cloned()
            }
        }
    }

    fn read_text(&self, target: &EditTarget) -> String {
        self.read_value(target)
            .map(|v| v.display_text())
            .unwrap_or_default()
    }

    fn ensure_section(&mut self, field_id: &str) -> Result<()> {
        if !self.sections.contains_key(field_id) {
            let section = ArraySection::for_field(&self.engine, field_id)?;
            self.sections.insert(field_id.to_string(), section);
        }
        Ok(())
    }

    fn write_value(&mut self, target: &EditTarget, value: FormValue) -> Result<()> {
        match target {
            EditTarget::Field(id) => {
                self.engine.handle_input_change(id, value);
            }
            EditTarget::Item {
                field_id,
                index,
                sub_field,
            } => {
                self.ensure_section(field_id)?;
                let section = self
                    .sections
                    .get_mut(field_id)
                    .ok_or_else(|| FormError::unknown_field(field_id.as_str()))?;
                section.update_item_field(&mut self.engine, *index, sub_field, value)?;

                let key = item_error_key(field_id, *index, sub_field);
                if self.engine.is_touched(&key) {
                    self.engine.handle_blur(&key);
                }
            }
        }
        Ok(())
    }

    fn type_char(&mut self, target: &EditTarget, field: &FormField, c: char) -> Result<()> {
        let mut text = self.read_text(target);
        text.push(c);
        self.write_value(target, coerce_text(field, text))
    }

    fn cycle(&mut self, target: &EditTarget, field: &FormField, delta: isize) -> Result<()> {
        match &field.kind {
            FieldKind::Select { options } | FieldKind::IconSelect { icons: options } => {
                if options.is_empty() {
                    return Ok(());
                }
                let len = options.len() as isize;
                let current = self
                    .read_value(target)
                    .and_then(|v| v.as_str().map(str::to_string))
                    .and_then(|v| options.iter().position(|o| o.value == v));
                let next = match current {
                    Some(i) => (i as isize + delta).rem_euclid(len),
                    None if delta > 0 => 0,
                    None => len - 1,
                };
                let value = FormValue::from(options[next as usize].value.as_str());
                self.write_value(target, value)
            }
            FieldKind::MultiSelect { options } if !options.is_empty() => {
                let len = options.len() as isize;
                self.state.option_cursor =
                    (self.state.option_cursor as isize + delta).rem_euclid(len) as usize;
                Ok(())
            }
            FieldKind::CustomArray(_) | FieldKind::DynamicSection(_) => {
                let count = self
                    .read_value(target)
                    .and_then(|v| v.as_array().map(Vec::len))
                    .unwrap_or(0);
                if count > 0 {
                    self.state.item_cursor =
                        (self.state.item_cursor as isize + delta).rem_euclid(count as isize) as usize;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn toggle_option(&mut self, target: &EditTarget, field: &FormField) -> Result<()> {
        let FieldKind::MultiSelect { options } = &field.kind else {
            return Ok(());
        };
        let Some(option) = options.get(self.state.option_cursor) else {
            return Ok(());
        };
        let mut selected: Vec<FormValue> = self
            .read_value(target)
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();
        let chosen = FormValue::from(option.value.as_str());
        if let Some(pos) = selected.iter().position(|v| v == &chosen) {
            selected.remove(pos);
        } else {
            selected.push(chosen);
        }
        self.write_value(target, FormValue::Array(selected))
    }

    fn activate(&mut self, target: &EditTarget, field: &FormField) -> Result<()> {
        match &field.kind {
            FieldKind::File { .. } => {
                self.state.path_prompt = Some(PathPromptState {
                    target: target.clone(),
                    label: field.label.clone(),
                    input: String::new(),
                    return_mode: self.state.mode,
                });
                self.state.mode = AppMode::PathPrompt;
                Ok(())
            }
            FieldKind::Textarea { .. } | FieldKind::RichText => self.type_char(target, field, '\n'),
            FieldKind::CustomArray(_) | FieldKind::DynamicSection(_)
                if matches!(target, EditTarget::Field(_)) =>
            {
                self.open_item_editor(field);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn add_item(&mut self, field: &FormField) -> Result<()> {
        let Some(items) = field.items() else {
            return Ok(());
        };
        self.ensure_section(&field.id)?;
        let section = self
            .sections
            .get_mut(&field.id)
            .ok_or_else(|| FormError::unknown_field(field.id.as_str()))?;
        match section.add(&mut self.engine)? {
            Some(_) => {
                let len = section.len(&self.engine);
                let title = section.item_title(len.saturating_sub(1));
                self.state.item_cursor = len.saturating_sub(1);
                self.state.set_status(Severity::Success, format!("Added {title}"));
            }
            None => {
                let max = items.max_items.unwrap_or_default();
                self.state
                    .set_status(Severity::Warning, format!("{} allows at most {max} items", field.label));
            }
        }
        Ok(())
    }

    fn remove_at_cursor(&mut self, target: &EditTarget, field: &FormField) -> Result<()> {
        match &field.kind {
            FieldKind::File { multiple, .. } => {
                let value = if *multiple {
                    let mut files: Vec<FormValue> = self
                        .read_value(target)
                        .and_then(|v| v.as_array().cloned())
                        .unwrap_or_default();
                    files.pop();
                    FormValue::Array(files)
                } else {
                    FormValue::Null
                };
                self.write_value(target, value)
            }
            FieldKind::CustomArray(items) | FieldKind::DynamicSection(items) => {
                self.ensure_section(&field.id)?;
                let section = self
                    .sections
                    .get_mut(&field.id)
                    .ok_or_else(|| FormError::unknown_field(field.id.as_str()))?;
                if section.is_empty(&self.engine) {
                    return Ok(());
                }
                if section.remove(&mut self.engine, self.state.item_cursor)? {
                    let len = section.len(&self.engine);
                    self.state.item_cursor = self.state.item_cursor.min(len.saturating_sub(1));
                    self.state.set_status(Severity::Info, "Item removed");
                } else {
                    self.state.set_status(
                        Severity::Warning,
                        format!("{} needs at least {} items", field.label, items.min_items),
                    );
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // File path prompt
    // ------------------------------------------------------------------

    fn handle_path_prompt(&mut self, action: Option<KeyAction>, key: &KeyEvent) -> Result<()> {
        let Some(prompt) = self.state.path_prompt.as_mut() else {
            self.state.mode = AppMode::Editing;
            return Ok(());
        };
        if let Some(c) = typed_char(key) {
            prompt.input.push(c);
            return Ok(());
        }
        match action {
            Some(KeyAction::DeleteChar) => {
                prompt.input.pop();
            }
            Some(KeyAction::Cancel) => self.close_path_prompt(),
            Some(KeyAction::Confirm) => return self.attach_file(),
            _ => {}
        }
        Ok(())
    }

    fn close_path_prompt(&mut self) {
        let return_mode = self
            .state
            .path_prompt
            .take()
            .map_or(AppMode::Editing, |p| p.return_mode);
        self.state.mode = return_mode;
    }

    /// Field definition behind an edit target
    fn target_field(&self, target: &EditTarget) -> Option<FormField> {
        match target {
            EditTarget::Field(id) => self.engine.field(id).cloned(),
            EditTarget::Item {
                field_id,
                sub_field,
                ..
            } => self
                .engine
                .field(field_id)?
                .items()?
                .item_fields
                .iter()
                .find(|s| &s.id == sub_field)
                .cloned(),
        }
    }

    fn attach_file(&mut self) -> Result<()> {
        let Some(prompt) = self.state.path_prompt.clone() else {
            return Ok(());
        };
        let path = prompt.input.trim();
        if path.is_empty() {
            self.close_path_prompt();
            return Ok(());
        }
        let Some(field) = self.target_field(&prompt.target) else {
            self.close_path_prompt();
            return Ok(());
        };
        let FieldKind::File { accept, multiple } = &field.kind else {
            self.close_path_prompt();
            return Ok(());
        };

        let attachment = match FileAttachment::from_path(path) {
            Ok(attachment) => attachment,
            Err(err) => {
                self.state
                    .set_status(Severity::Danger, format!("Cannot attach {path}: {err}"));
                return Ok(());
            }
        };
        if !attachment.matches_accept(accept) {
            self.state.set_status(
                Severity::Warning,
                format!("{} is not an accepted file type ({})", attachment.name, accept.join(", ")),
            );
            return Ok(());
        }

        let name = attachment.name.clone();
        let value = if *multiple {
            let mut files: Vec<FormValue> = self
                .read_value(&prompt.target)
                .and_then(|v| v.as_array().cloned())
                .unwrap_or_default();
            files.push(FormValue::from(attachment));
            FormValue::Array(files)
        } else {
            FormValue::from(attachment)
        };
        self.write_value(&prompt.target, value)?;
        if let EditTarget::Field(id) = &prompt.target {
            self.engine.handle_blur(id);
        }
        info!(field = %field.id, file = %name, "File attached");
        self.state.set_status(Severity::Success, format!("Attached {name}"));
        self.close_path_prompt();
        Ok(())
    }
}
