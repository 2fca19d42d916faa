//! Tests for the form console
//!
//! Drives `App::handle_key` with synthetic key events; no terminal needed.
//!
//! These tests verify:
//! - AppState defaults
//! - Typing, focus moves and blur validation
//! - Select, multi-select and number editing
//! - Step navigation and submission from the keyboard
//! - Array items, the item editor and the file path prompt

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use formwright::app::{App, AppMode, AppState};
use formwright::config::{FormConfig, FormStep};
use formwright::engine::{DiscardSubmit, FormEngine, on_submit};
use formwright::field::{FormField, ItemsSpec, SelectOption};
use formwright::theme::{Severity, UiText};
use formwright::types::InputType;
use formwright::value::FormValue;
use serde_json::json;
use tempfile::TempDir;

fn form() -> FormConfig {
    FormConfig::new(
        "console",
        "Console",
        vec![
            FormStep::new(
                "basics",
                "Basics",
                vec![
                    FormField::input("name", "Name").required().min_length(2),
                    FormField::select("kind", "Kind", SelectOption::plain(&["a", "b"])),
                    FormField::multi_select("tags", "Tags", SelectOption::plain(&["x", "y", "z"])),
                    FormField::typed_input("count", "Count", InputType::Number),
                ],
            ),
            FormStep::new(
                "more",
                "More",
                vec![
                    FormField::custom_array(
                        "features",
                        "Features",
                        ItemsSpec::new(vec![FormField::input("title", "Title").required()])
                            .bounds(1, Some(2))
                            .item_label("Feature"),
                    ),
                    FormField::file("doc", "Document", &[".txt"], false),
                ],
            ),
        ],
    )
}

fn app() -> App {
    App::new(FormEngine::new(form(), DiscardSubmit))
}

fn app_with(data: serde_json::Value) -> App {
    App::new(FormEngine::new(form(), DiscardSubmit).with_data(FormValue::from(data)))
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
}

fn status_text(app: &App) -> Option<String> {
    app.state().status.as_ref().map(|s| s.text.clone())
}

// =============================================================================
// AppState Default Tests
// =============================================================================

#[test]
fn test_app_state_default_is_editing_first_field() {
    let state = AppState::default();
    assert_eq!(state.mode, AppMode::Editing);
    assert_eq!(state.focus, 0);
    assert!(state.status.is_none());
    assert!(!state.help_visible);
    assert!(!state.should_quit);
}

#[test]
fn test_set_and_clear_status() {
    let mut state = AppState::default();
    state.set_status(Severity::Warning, "careful");
    assert_eq!(state.status.as_ref().unwrap().severity, Severity::Warning);
    state.clear_status();
    assert!(state.status.is_none());
}

// =============================================================================
// Typing and focus
// =============================================================================

#[test]
fn test_typing_edits_focused_field() {
    let mut app = app();
    type_text(&mut app, "Wix");
    app.handle_key(key(KeyCode::Backspace));
    app.handle_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT));
    assert_eq!(app.engine().value("name"), Some(&FormValue::from("WiA")));
}

#[test]
fn test_tab_blurs_and_reveals_error() {
    let mut app = app();
    assert!(app.engine().visible_error("name").is_none());

    app.handle_key(key(KeyCode::Tab));

    assert_eq!(app.state().focus, 1);
    assert_eq!(app.engine().visible_error("name"), Some("Name is required"));
    assert_eq!(app.focused_field().map(|f| f.id.as_str()), Some("kind"));
}

#[test]
fn test_focus_wraps_around() {
    let mut app = app();
    app.handle_key(key(KeyCode::BackTab));
    assert_eq!(app.state().focus, 3);
    app.handle_key(key(KeyCode::Down));
    assert_eq!(app.state().focus, 0);
}

#[test]
fn test_select_cycles_options() {
    let mut app = app();
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.engine().value("kind"), Some(&FormValue::from("a")));
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.engine().value("kind"), Some(&FormValue::from("b")));
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.engine().value("kind"), Some(&FormValue::from("a")));
    app.handle_key(key(KeyCode::Left));
    assert_eq!(app.engine().value("kind"), Some(&FormValue::from("b")));
}

#[test]
fn test_multi_select_toggles_option_under_cursor() {
    let mut app = app();
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.state().option_cursor, 1);

    app.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(app.engine().value("tags"), Some(&FormValue::from(json!(["y"]))));
    app.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(app.engine().value("tags"), Some(&FormValue::from(json!([]))));
}

#[test]
fn test_number_input_stores_whole_numbers() {
    let mut app = app();
    app.handle_key(key(KeyCode::BackTab));
    type_text(&mut app, "42");
    assert_eq!(app.engine().value("count"), Some(&FormValue::from(42i64)));
    type_text(&mut app, ".");
    assert_eq!(app.engine().value("count"), Some(&FormValue::from("42.")));
}

#[test]
fn test_key_release_is_ignored() {
    let mut app = app();
    let mut release = key(KeyCode::Char('z'));
    release.kind = KeyEventKind::Release;
    app.handle_key(release);
    assert!(app.engine().value("name").is_none());
}

// =============================================================================
// Steps and submission
// =============================================================================

#[test]
fn test_next_step_blocked_by_invalid_fields() {
    let mut app = app();
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::PageDown));

    assert_eq!(app.navigator().current(), 0);
    assert_eq!(status_text(&app).as_deref(), Some(UiText::FIX_ERRORS));
    // Focus jumps back to the failing field
    assert_eq!(app.state().focus, 0);
}

#[test]
fn test_next_and_previous_step() {
    let mut app = app();
    type_text(&mut app, "Al");
    app.handle_key(key(KeyCode::PageDown));
    assert_eq!(app.navigator().current(), 1);
    assert_eq!(app.focused_field().map(|f| f.id.as_str()), Some("features"));

    app.handle_key(key(KeyCode::PageUp));
    assert_eq!(app.navigator().current(), 0);
}

#[test]
fn test_submit_moves_to_submitted_and_enter_quits() {
    let mut app = app_with(json!({ "name": "Al", "features": [{ "id": "f1", "title": "Fast" }] }));
    assert!(!app.handle_key(ctrl('s')));
    assert_eq!(app.state().mode, AppMode::Submitted);
    assert_eq!(app.state().submitted_draft, Some(false));
    assert!(app.handle_key(key(KeyCode::Enter)));
}

#[test]
fn test_invalid_submit_jumps_to_failing_step() {
    let mut app = app_with(json!({ "name": "Al", "features": [{ "id": "f1", "title": "" }] }));
    app.handle_key(ctrl('s'));
    assert_eq!(app.state().mode, AppMode::Editing);
    assert_eq!(app.navigator().current(), 1);
    assert_eq!(app.engine().visible_error("features.0.title"), Some("Title is required"));
}

#[test]
fn test_draft_keeps_editing() {
    let mut app = app();
    app.handle_key(ctrl('d'));
    assert_eq!(app.state().mode, AppMode::Editing);
    assert_eq!(app.state().submitted_draft, Some(true));
    assert_eq!(status_text(&app).as_deref(), Some(UiText::DRAFT_SAVED));
}

#[test]
fn test_failing_handler_shows_error() {
    let engine = FormEngine::new(form(), on_submit(|_, _| Err(anyhow::anyhow!("boom"))));
    let mut app = App::new(engine);
    app.handle_key(ctrl('d'));
    let status = app.state().status.clone().unwrap();
    assert_eq!(status.severity, Severity::Danger);
    assert_eq!(status.text, "boom");
    assert!(!app.engine().is_submitting());
}

// =============================================================================
// Help and quit
// =============================================================================

#[test]
fn test_help_overlay_swallows_escape() {
    let mut app = app();
    app.handle_key(key(KeyCode::F(1)));
    assert!(app.state().help_visible);
    assert!(!app.handle_key(key(KeyCode::Esc)));
    assert!(!app.state().help_visible);
    assert!(app.handle_key(key(KeyCode::Esc)));
}

#[test]
fn test_ctrl_q_quits() {
    let mut app = app();
    assert!(app.handle_key(ctrl('q')));
}

// =============================================================================
// Arrays and the item editor
// =============================================================================

fn app_on_second_step() -> App {
    let mut app = app_with(json!({ "name": "Al" }));
    app.handle_key(key(KeyCode::PageDown));
    assert_eq!(app.navigator().current(), 1);
    app
}

#[test]
fn test_add_and_remove_items_respect_bounds() {
    let mut app = app_on_second_step();

    app.handle_key(ctrl('a'));
    assert_eq!(status_text(&app).as_deref(), Some("Added Feature 1"));
    assert!(app.highlighted_item("features").is_some());
    app.handle_key(ctrl('a'));
    app.handle_key(ctrl('a'));
    assert_eq!(app.engine().array_items("features").unwrap().len(), 2);
    assert!(status_text(&app).unwrap().contains("at most 2"));

    app.handle_key(ctrl('x'));
    assert_eq!(app.engine().array_items("features").unwrap().len(), 1);
    app.handle_key(ctrl('x'));
    assert_eq!(app.engine().array_items("features").unwrap().len(), 1);
    assert!(status_text(&app).unwrap().contains("at least 1"));
}

#[test]
fn test_item_editor_edits_sub_field() {
    let mut app = app_on_second_step();
    app.handle_key(ctrl('a'));
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.state().mode, AppMode::ItemEditor);

    type_text(&mut app, "Fast");
    let items = app.engine().array_items("features").unwrap();
    assert_eq!(
        items[0].as_object().unwrap().get("title"),
        Some(&FormValue::from("Fast"))
    );

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.state().mode, AppMode::Editing);
    assert!(app.state().item_editor.is_none());
}

#[test]
fn test_item_editor_blur_reveals_sub_field_error() {
    let mut app = app_on_second_step();
    app.handle_key(ctrl('a'));
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.engine().visible_error("features.0.title"), Some("Title is required"));

    type_text(&mut app, "X");
    assert!(app.engine().visible_error("features.0.title").is_none());
}

#[test]
fn test_closing_item_editor_blurs_focused_sub_field() {
    let mut app = app_with(json!({ "name": "Al", "features": [{ "id": "a", "title": "" }] }));
    app.handle_key(key(KeyCode::PageDown));
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.state().mode, AppMode::ItemEditor);

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.state().mode, AppMode::Editing);
    assert!(app.engine().is_touched("features.0.title"));
    assert_eq!(app.engine().visible_error("features.0.title"), Some("Title is required"));
}

#[test]
fn test_removing_item_keeps_error_on_remaining_item() {
    let mut app = app_with(json!({
        "name": "Al",
        "features": [{ "id": "a", "title": "ok" }, { "id": "b", "title": "" }]
    }));
    app.handle_key(key(KeyCode::PageDown));
    app.handle_key(key(KeyCode::Right));
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.engine().visible_error("features.1.title"), Some("Title is required"));

    app.handle_key(key(KeyCode::Left));
    app.handle_key(ctrl('x'));
    assert_eq!(app.engine().array_items("features").unwrap().len(), 1);
    assert_eq!(app.engine().visible_error("features.0.title"), Some("Title is required"));
    assert!(app.engine().error("features.1.title").is_none());
}

#[test]
fn test_enter_without_items_does_not_open_editor() {
    let mut app = app_on_second_step();
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.state().mode, AppMode::Editing);
}

// =============================================================================
// File path prompt
// =============================================================================

#[test]
fn test_attach_file_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    let mut app = app_on_second_step();
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.state().mode, AppMode::PathPrompt);

    type_text(&mut app, path.to_str().unwrap());
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.state().mode, AppMode::Editing);
    let file = app.engine().value("doc").and_then(FormValue::as_file).unwrap();
    assert_eq!(file.name, "notes.txt");
    assert_eq!(file.size, 5);
}

#[test]
fn test_rejected_file_type_keeps_prompt_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.png");
    std::fs::write(&path, [0u8; 4]).unwrap();

    let mut app = app_on_second_step();
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Enter));
    type_text(&mut app, path.to_str().unwrap());
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.state().mode, AppMode::PathPrompt);
    assert_eq!(app.state().status.as_ref().unwrap().severity, Severity::Warning);
    assert!(app.engine().value("doc").is_none());

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.state().mode, AppMode::Editing);
}

#[test]
fn test_missing_file_reports_error() {
    let mut app = app_on_second_step();
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Enter));
    type_text(&mut app, "/definitely/not/here.txt");
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.state().mode, AppMode::PathPrompt);
    assert_eq!(app.state().status.as_ref().unwrap().severity, Severity::Danger);
}
