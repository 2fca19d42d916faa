//! Rendering tests for the form console
//!
//! Draws `App` into ratatui's in-memory backend and inspects the text.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use formwright::app::{App, AppMode};
use formwright::config::{FormConfig, FormStep};
use formwright::engine::{DiscardSubmit, FormEngine};
use formwright::field::{FormField, ItemsSpec};
use formwright::value::FormValue;
use formwright::presets::Preset;
use formwright::theme::UiText;
use formwright::ui::UiRenderer;
use ratatui::{Terminal, backend::TestBackend};

fn draw(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
    let renderer = UiRenderer::new();
    terminal.draw(|f| renderer.render(f, app)).unwrap();

    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn post_app() -> App {
    App::new(FormEngine::new(Preset::Post.config().unwrap(), DiscardSubmit))
}

#[test]
fn test_first_step_shows_header_and_labels() {
    let app = post_app();
    let screen = draw(&app);

    let config = Preset::Post.config().unwrap();
    assert!(screen.contains(&config.title));
    assert!(screen.contains(&format!("Step 1 of {}", config.steps.len())));
    for field in &config.steps[0].fields {
        if app.engine().is_field_visible(&field.id) {
            assert!(screen.contains(&field.label), "missing label {}", field.label);
        }
    }
    assert!(screen.contains("0% complete"));
}

#[test]
fn test_typed_text_is_drawn() {
    let mut app = post_app();
    for c in "Hello".chars() {
        press(&mut app, KeyCode::Char(c));
    }
    assert!(draw(&app).contains("Hello"));
}

#[test]
fn test_blocked_next_shows_status_and_error() {
    let mut app = post_app();
    press(&mut app, KeyCode::PageDown);

    let screen = draw(&app);
    assert!(screen.contains(UiText::FIX_ERRORS));
    assert!(screen.contains("is required"));
}

#[test]
fn test_help_overlay_draws_over_form() {
    let mut app = post_app();
    press(&mut app, KeyCode::F(1));

    let screen = draw(&app);
    assert!(screen.contains("Help"));
    assert!(screen.contains("Current: Editing"));
}

#[test]
fn test_submitted_summary_shows_tag_names() {
    let config = FormConfig::new(
        "note",
        "Note",
        vec![FormStep::new(
            "only",
            "Only",
            vec![FormField::input("title", "Title").required(), FormField::input("tags", "Tags")],
        )],
    );
    let engine = FormEngine::new(config, DiscardSubmit).with_data(FormValue::from(
        serde_json::json!({ "title": "Launch notes", "tags": "ai, github,  ai" }),
    ));
    let mut app = App::new(engine);
    app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    assert_eq!(app.state().mode, AppMode::Submitted);

    let screen = draw(&app);
    assert!(screen.contains(UiText::SUBMITTED));
    assert!(screen.contains("Title: Launch notes"));
    assert!(screen.contains("Tags: AI, GitHub"));
}

#[test]
fn test_array_box_reports_items_with_errors() {
    let config = FormConfig::new(
        "list",
        "List",
        vec![FormStep::new(
            "only",
            "Only",
            vec![FormField::custom_array(
                "features",
                "Features",
                ItemsSpec::new(vec![FormField::input("title", "Title").required()]),
            )],
        )],
    );
    let engine = FormEngine::new(config, DiscardSubmit).with_data(FormValue::from(serde_json::json!({
        "features": [{ "id": "a", "title": "" }, { "id": "b", "title": "ok" }]
    })));
    let mut app = App::new(engine);
    app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    assert_eq!(app.state().mode, AppMode::Editing);

    let screen = draw(&app);
    assert!(screen.contains("1 item has errors"));
}

#[test]
fn test_tiny_terminal_does_not_panic() {
    let app = post_app();
    let mut terminal = Terminal::new(TestBackend::new(20, 6)).unwrap();
    let renderer = UiRenderer::new();
    terminal.draw(|f| renderer.render(f, &app)).unwrap();
}
