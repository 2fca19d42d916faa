//! Keybinding system for context-aware keyboard shortcuts
//!
//! Provides a registry of keybindings that change with the console mode, and
//! resolves raw key events to [`KeyAction`]s.

use crate::app::AppMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    NextField,
    PrevField,
    OptionPrev,
    OptionNext,
    Toggle,
    Activate,
    DeleteChar,
    AddItem,
    RemoveItem,
    NextStep,
    PrevStep,
    Submit,
    SaveDraft,
    Confirm,
    Cancel,
    Back,
    Dismiss,
    Help,
    Quit,
}

/// A keybinding definition
#[derive(Debug, Clone)]
pub struct Keybinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: KeyAction,
    pub display: String,
    pub description: String,
}

impl Keybinding {
    /// Create a new keybinding with no modifiers
    pub fn new(key: KeyCode, action: KeyAction, display: &str, description: &str) -> Self {
        Self::with_modifiers(key, KeyModifiers::NONE, action, display, description)
    }

    /// Create a keybinding with modifiers
    pub fn with_modifiers(
        key: KeyCode,
        modifiers: KeyModifiers,
        action: KeyAction,
        display: &str,
        description: &str,
    ) -> Self {
        Self {
            key,
            modifiers,
            action,
            display: display.to_string(),
            description: description.to_string(),
        }
    }

    fn ctrl(c: char, action: KeyAction, description: &str) -> Self {
        Self::with_modifiers(
            KeyCode::Char(c),
            KeyModifiers::CONTROL,
            action,
            &format!("Ctrl+{}", c.to_ascii_uppercase()),
            description,
        )
    }

    /// Whether `event` triggers this binding.
    ///
    /// Bindings without modifiers tolerate Shift, which terminals report for
    /// Shift-Tab and uppercase letters.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if event.code != self.key {
            return false;
        }
        if self.modifiers.is_empty() {
            event.modifiers.difference(KeyModifiers::SHIFT).is_empty()
        } else {
            event.modifiers == self.modifiers
        }
    }
}

/// Context-aware keybinding registry
pub struct KeybindingContext {
    /// Mode-specific keybindings
    mode_bindings: HashMap<AppMode, Vec<Keybinding>>,
    /// Global keybindings (available in all modes)
    global_bindings: Vec<Keybinding>,
}

impl Default for KeybindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl KeybindingContext {
    /// Create a new keybinding context with default bindings
    pub fn new() -> Self {
        let mut ctx = Self {
            mode_bindings: HashMap::new(),
            global_bindings: Vec::new(),
        };
        ctx.register_defaults();
        ctx
    }

    fn register_defaults(&mut self) {
        self.global_bindings = vec![
            Keybinding::new(KeyCode::F(1), KeyAction::Help, "F1", "Help"),
            Keybinding::ctrl('q', KeyAction::Quit, "Quit"),
        ];

        let focus_bindings = vec![
            Keybinding::new(KeyCode::Tab, KeyAction::NextField, "Tab", "Next field"),
            Keybinding::new(KeyCode::BackTab, KeyAction::PrevField, "Shift+Tab", "Previous field"),
            Keybinding::new(KeyCode::Down, KeyAction::NextField, "Down", "Next field"),
            Keybinding::new(KeyCode::Up, KeyAction::PrevField, "Up", "Previous field"),
            Keybinding::new(KeyCode::Left, KeyAction::OptionPrev, "Left", "Previous option / item"),
            Keybinding::new(KeyCode::Right, KeyAction::OptionNext, "Right", "Next option / item"),
            Keybinding::new(KeyCode::Char(' '), KeyAction::Toggle, "Space", "Toggle option"),
            Keybinding::new(KeyCode::Enter, KeyAction::Activate, "Enter", "Pick file / edit item"),
            Keybinding::new(KeyCode::Backspace, KeyAction::DeleteChar, "Bksp", "Delete character"),
        ];

        let mut editing = focus_bindings.clone();
        editing.extend([
            Keybinding::ctrl('a', KeyAction::AddItem, "Add item"),
            Keybinding::ctrl('x', KeyAction::RemoveItem, "Remove item / file"),
            Keybinding::new(KeyCode::PageDown, KeyAction::NextStep, "PgDn", "Next step"),
            Keybinding::new(KeyCode::PageUp, KeyAction::PrevStep, "PgUp", "Previous step"),
            Keybinding::ctrl('s', KeyAction::Submit, "Publish"),
            Keybinding::ctrl('d', KeyAction::SaveDraft, "Save draft"),
            Keybinding::new(KeyCode::Esc, KeyAction::Quit, "Esc", "Quit"),
        ]);
        self.mode_bindings.insert(AppMode::Editing, editing);

        let mut item_editor = focus_bindings;
        item_editor.push(Keybinding::new(KeyCode::Esc, KeyAction::Back, "Esc", "Done"));
        self.mode_bindings.insert(AppMode::ItemEditor, item_editor);

        self.mode_bindings.insert(
            AppMode::PathPrompt,
            vec![
                Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Attach file"),
                Keybinding::new(KeyCode::Backspace, KeyAction::DeleteChar, "Bksp", "Delete character"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Cancel"),
            ],
        );

        self.mode_bindings.insert(
            AppMode::Submitted,
            vec![
                Keybinding::new(KeyCode::Enter, KeyAction::Dismiss, "Enter", "Close"),
                Keybinding::new(KeyCode::Esc, KeyAction::Dismiss, "Esc", "Close"),
            ],
        );
    }

    /// Get keybindings for a specific mode (includes global bindings)
    pub fn get_bindings(&self, mode: &AppMode) -> Vec<&Keybinding> {
        let mut bindings: Vec<&Keybinding> = Vec::new();
        if let Some(mode_bindings) = self.mode_bindings.get(mode) {
            bindings.extend(mode_bindings.iter());
        }
        bindings.extend(self.global_bindings.iter());
        bindings
    }

    /// Action bound to `event` in `mode`, if any
    pub fn resolve(&self, mode: &AppMode, event: &KeyEvent) -> Option<KeyAction> {
        self.get_bindings(mode)
            .into_iter()
            .find(|b| b.matches(event))
            .map(|b| b.action)
    }

    /// Get navigation bar items for display
    pub fn get_nav_items(&self, mode: &AppMode) -> Vec<NavBarItem> {
        let bindings = self.get_bindings(mode);

        let priority_actions = match mode {
            AppMode::Editing => vec![
                KeyAction::NextField,
                KeyAction::NextStep,
                KeyAction::PrevStep,
                KeyAction::Submit,
                KeyAction::SaveDraft,
                KeyAction::Help,
                KeyAction::Quit,
            ],
            AppMode::ItemEditor => vec![
                KeyAction::NextField,
                KeyAction::OptionNext,
                KeyAction::Back,
                KeyAction::Help,
            ],
            AppMode::PathPrompt => vec![KeyAction::Confirm, KeyAction::Cancel],
            AppMode::Submitted => vec![KeyAction::Dismiss],
        };

        let mut items: Vec<NavBarItem> = Vec::new();
        for action in priority_actions {
            if let Some(binding) = bindings.iter().find(|b| b.action == action) {
                // Collapse the field focus pair into one hint
                if action == KeyAction::NextField {
                    items.push(NavBarItem {
                        key_display: "Tab/Up/Dn".to_string(),
                        action_label: "Field".to_string(),
                    });
                } else if action == KeyAction::OptionNext {
                    items.push(NavBarItem {
                        key_display: "Left/Right".to_string(),
                        action_label: "Choose".to_string(),
                    });
                } else {
                    items.push(NavBarItem {
                        key_display: binding.display.clone(),
                        action_label: binding.description.clone(),
                    });
                }
            }
        }

        items
    }

    /// Get full help content for a mode (for help overlay)
    pub fn get_help_content(&self, mode: &AppMode) -> Vec<HelpSection> {
        let groups: [(&str, fn(KeyAction) -> bool); 3] = [
            ("Navigation", |a| {
                matches!(
                    a,
                    KeyAction::NextField
                        | KeyAction::PrevField
                        | KeyAction::OptionPrev
                        | KeyAction::OptionNext
                        | KeyAction::NextStep
                        | KeyAction::PrevStep
                )
            }),
            ("Editing", |a| {
                matches!(
                    a,
                    KeyAction::Toggle
                        | KeyAction::Activate
                        | KeyAction::DeleteChar
                        | KeyAction::AddItem
                        | KeyAction::RemoveItem
                        | KeyAction::Confirm
                        | KeyAction::Cancel
                        | KeyAction::Back
                )
            }),
            ("General", |a| {
                matches!(
                    a,
                    KeyAction::Submit
                        | KeyAction::SaveDraft
                        | KeyAction::Dismiss
                        | KeyAction::Help
                        | KeyAction::Quit
                )
            }),
        ];

        let bindings = self.get_bindings(mode);
        groups
            .iter()
            .filter_map(|(title, in_group)| {
                let items: Vec<(String, String)> = bindings
                    .iter()
                    .filter(|b| in_group(b.action))
                    .map(|b| (b.display.clone(), b.description.clone()))
                    .collect();
                (!items.is_empty()).then(|| HelpSection {
                    title: title.to_string(),
                    items,
                })
            })
            .collect()
    }
}

/// Navigation bar item for display
#[derive(Debug, Clone)]
pub struct NavBarItem {
    pub key_display: String,
    pub action_label: String,
}

/// Help section for the help overlay
#[derive(Debug, Clone)]
pub struct HelpSection {
    pub title: String,
    pub items: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_resolve_editing_keys() {
        let ctx = KeybindingContext::new();
        let mode = AppMode::Editing;
        assert_eq!(
            ctx.resolve(&mode, &key(KeyCode::Tab, KeyModifiers::NONE)),
            Some(KeyAction::NextField)
        );
        assert_eq!(
            ctx.resolve(&mode, &key(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(KeyAction::PrevField)
        );
        assert_eq!(
            ctx.resolve(&mode, &key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(KeyAction::Submit)
        );
        assert_eq!(ctx.resolve(&mode, &key(KeyCode::Char('s'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_esc_depends_on_mode() {
        let ctx = KeybindingContext::new();
        let esc = key(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(ctx.resolve(&AppMode::Editing, &esc), Some(KeyAction::Quit));
        assert_eq!(ctx.resolve(&AppMode::ItemEditor, &esc), Some(KeyAction::Back));
        assert_eq!(ctx.resolve(&AppMode::PathPrompt, &esc), Some(KeyAction::Cancel));
    }

    #[test]
    fn test_global_bindings_everywhere() {
        let ctx = KeybindingContext::new();
        let f1 = key(KeyCode::F(1), KeyModifiers::NONE);
        for mode in [AppMode::Editing, AppMode::ItemEditor, AppMode::PathPrompt, AppMode::Submitted] {
            assert_eq!(ctx.resolve(&mode, &f1), Some(KeyAction::Help));
        }
    }

    #[test]
    fn test_help_content_groups() {
        let ctx = KeybindingContext::new();
        let sections = ctx.get_help_content(&AppMode::Editing);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Navigation", "Editing", "General"]);
        assert!(!ctx.get_nav_items(&AppMode::Editing).is_empty());
    }
}
