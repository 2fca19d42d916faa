//! User interface rendering module
//!
//! - `header` - Title, step indicator, progress gauge and nav bar
//! - `fields` - One box per field kind
//!
//! The renderer reads an [`App`] and never mutates it.

pub mod fields;
pub mod header;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::components::help_overlay::{HelpOverlay, centered_rect};
use crate::engine::{FORM_ERROR_KEY, get_path, is_visible, item_error_key};
use crate::field::FormField;
use crate::tags::{TAGS_FIELD, display_name, parse_tag_list};
use crate::theme::{Styles, Theme, UiConstants, UiText};
use crate::value::FormValue;
use fields::{FieldView, field_height, field_lines, render_field};

/// Group consecutive fields into rows whose column spans fit 100%.
///
/// Takes the span percent of each field in order and returns the field
/// indices of each row.
pub fn pack_rows(spans: &[u16]) -> Vec<Vec<usize>> {
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut used = 0u16;
    for (i, &span) in spans.iter().enumerate() {
        match rows.last_mut() {
            Some(row) if used + span <= 100 => {
                row.push(i);
                used += span;
            }
            _ => {
                rows.push(vec![i]);
                used = span;
            }
        }
    }
    rows
}

/// First row to draw so that row `focus_row` is fully inside `available`
/// lines, given the height of every row
pub fn scroll_start(heights: &[u16], focus_row: usize, available: u16) -> usize {
    let Some(&focus_height) = heights.get(focus_row) else {
        return 0;
    };
    let mut start = focus_row;
    let mut used = focus_height;
    while start > 0 && used + heights[start - 1] <= available {
        start -= 1;
        used += heights[start];
    }
    start
}

/// One laid-out field box
struct FieldBox<'a> {
    field: &'a FormField,
    lines: Vec<Line<'static>>,
    view: FieldView<'a>,
}

/// UI renderer for the application
#[derive(Debug, Default)]
pub struct UiRenderer;

impl UiRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the complete UI for `app`
    pub fn render(&self, f: &mut Frame, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(UiConstants::HEADER_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(UiConstants::STATUS_BAR_HEIGHT),
                Constraint::Length(UiConstants::NAV_BAR_HEIGHT),
            ])
            .split(f.area());

        header::render_header(f, chunks[0], app.engine(), app.navigator());

        let state = app.state();
        match state.mode {
            AppMode::Submitted => self.render_submitted(f, chunks[1], app),
            AppMode::Editing => self.render_step(f, chunks[1], app),
            AppMode::ItemEditor => {
                self.render_step(f, chunks[1], app);
                self.render_item_editor(f, chunks[1], app);
            }
            AppMode::PathPrompt => {
                self.render_step(f, chunks[1], app);
                if state.item_editor.is_some() {
                    self.render_item_editor(f, chunks[1], app);
                }
                self.render_path_prompt(f, chunks[1], app);
            }
        }

        self.render_status(f, chunks[2], app);
        let nav_items = app.keybinding_context().get_nav_items(&state.mode);
        header::render_nav_bar(f, chunks[3], &nav_items);

        if state.help_visible {
            HelpOverlay::new(&state.mode, app.keybinding_context()).render(f, f.area());
        }
    }

    /// Field boxes of the current step, packed into rows and scrolled to
    /// keep the focused field visible
    fn render_step(&self, f: &mut Frame, area: Rect, app: &App) {
        let engine = app.engine();
        let state = app.state();
        let editing = state.mode == AppMode::Editing;

        let boxes: Vec<FieldBox> = app
            .visible_fields()
            .into_iter()
            .enumerate()
            .map(|(i, field)| {
                let view = FieldView {
                    focused: i == state.focus,
                    option_cursor: if editing { state.option_cursor } else { usize::MAX },
                    item_cursor: state.item_cursor,
                    error: engine.visible_error(&field.id),
                    highlighted: app.highlighted_item(&field.id),
                    item_errors: if field.items().is_some() { engine.items_with_errors(&field.id) } else { 0 },
                };
                let lines = field_lines(field, engine.value(&field.id), &view);
                FieldBox { field, lines, view }
            })
            .collect();

        if boxes.is_empty() {
            let empty = Paragraph::new(Span::styled("Nothing to fill in on this step", Styles::text_muted()));
            f.render_widget(empty, area);
            return;
        }

        let spans: Vec<u16> = boxes.iter().map(|b| b.field.layout.span.percent()).collect();
        let rows = pack_rows(&spans);
        let heights: Vec<u16> = rows
            .iter()
            .map(|row| row.iter().map(|&i| field_height(boxes[i].lines.len())).max().unwrap_or(0))
            .collect();
        let focus_row = rows.iter().position(|row| row.contains(&state.focus)).unwrap_or(0);
        let start = scroll_start(&heights, focus_row, area.height);

        let mut y = area.y;
        let bottom = area.y.saturating_add(area.height);
        for (row, &height) in rows.iter().zip(&heights).skip(start) {
            if y >= bottom {
                break;
            }
            let row_area = Rect::new(area.x, y, area.width, height.min(bottom - y));
            let constraints: Vec<Constraint> = row
                .iter()
                .map(|&i| Constraint::Percentage(spans[i]))
                .collect();
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(constraints)
                .split(row_area);
            for (&i, cell) in row.iter().zip(cells.iter()) {
                let b = &boxes[i];
                render_field(f, *cell, b.field, b.lines.clone(), &b.view);
            }
            y = y.saturating_add(height);
        }
    }

    /// Floating editor for the sub-fields of one array item
    fn render_item_editor(&self, f: &mut Frame, area: Rect, app: &App) {
        let (Some(editor), Some((field, item, subs))) = (app.state().item_editor.as_ref(), app.editing_item())
        else {
            return;
        };
        let engine = app.engine();
        let popup = centered_rect(UiConstants::DIALOG_WIDTH_PCT, 90, area);
        f.render_widget(Clear, popup);

        let noun = field
            .items()
            .and_then(|items| items.item_label.clone())
            .unwrap_or_else(|| "Item".to_string());
        let block = Block::default()
            .title(Span::styled(format!(" Editing {noun} {} ", editor.index + 1), Styles::title()))
            .borders(Borders::ALL)
            .border_style(Styles::border_active())
            .style(Styles::panel_bg());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let mut boxes = Vec::with_capacity(subs.len());
        for (i, sub) in subs.iter().enumerate() {
            let key = item_error_key(&field.id, editor.index, &sub.id);
            let view = FieldView {
                focused: i == editor.focus,
                option_cursor: app.state().option_cursor,
                error: engine.visible_error(&key),
                ..FieldView::default()
            };
            let value = get_path(&item, &sub.id);
            let lines = field_lines(sub, value, &view);
            boxes.push(FieldBox { field: *sub, lines, view });
        }

        let heights: Vec<u16> = boxes.iter().map(|b| field_height(b.lines.len())).collect();
        let start = scroll_start(&heights, editor.focus, inner.height);
        let mut y = inner.y;
        let bottom = inner.y.saturating_add(inner.height);
        for (b, &height) in boxes.iter().zip(&heights).skip(start) {
            if y >= bottom {
                break;
            }
            let cell = Rect::new(inner.x, y, inner.width, height.min(bottom - y));
            render_field(f, cell, b.field, b.lines.clone(), &b.view);
            y = y.saturating_add(height);
        }
    }

    fn render_path_prompt(&self, f: &mut Frame, area: Rect, app: &App) {
        let Some(prompt) = app.state().path_prompt.as_ref() else {
            return;
        };
        let popup = centered_rect(UiConstants::DIALOG_WIDTH_PCT, 30, area);
        f.render_widget(Clear, popup);
        let lines = vec![
            Line::from(Span::styled("Path of the file to attach:", Styles::text_secondary())),
            Line::from(vec![
                Span::styled(prompt.input.clone(), Styles::text()),
                Span::styled("▏", Styles::title()),
            ]),
            Line::from(""),
            Line::from(Span::styled("Enter attach  ·  Esc cancel", Styles::nav_hint())),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(Span::styled(format!(" Attach: {} ", prompt.label), Styles::title()))
                .borders(Borders::ALL)
                .border_style(Styles::border_active())
                .style(Styles::panel_bg()),
        );
        f.render_widget(paragraph, popup);
    }

    /// Summary shown after a successful publish
    fn render_submitted(&self, f: &mut Frame, area: Rect, app: &App) {
        let engine = app.engine();
        let data = engine.data();
        let mut lines = vec![
            Line::from(Span::styled(UiText::SUBMITTED, Styles::success())),
            Line::from(""),
        ];
        for field in engine.config().fields().filter(|f| is_visible(f, data)) {
            let Some(value) = engine.value(&field.id).filter(|v| !v.is_blank()) else {
                continue;
            };
            let text = match value {
                FormValue::Array(items) if field.items().is_some() => format!("{} items", items.len()),
                FormValue::String(text) if field.id == TAGS_FIELD => parse_tag_list(text)
                    .iter()
                    .map(|tag| display_name(tag))
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.display_text(),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", field.label), Styles::label()),
                Span::styled(text, Styles::text()),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Press Enter to close", Styles::nav_hint())));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border_active()),
        );
        f.render_widget(paragraph, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect, app: &App) {
        let engine = app.engine();
        let line = if let Some(message) = engine.error(FORM_ERROR_KEY) {
            Line::from(Span::styled(format!("✗ {message}"), Styles::error()))
        } else if let Some(status) = &app.state().status {
            Line::from(Span::styled(status.text.clone(), Theme::severity_style(status.severity)))
        } else {
            Line::from("")
        };
        f.render_widget(Paragraph::new(line), area);
    }
}
