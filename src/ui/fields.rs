//! Field renderer
//!
//! Turns one field definition and its current value into styled lines, one
//! arm per field kind, and wraps them in a bordered box whose title carries
//! the label and whose border reflects focus and errors.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::engine::path::get_path;
use crate::field::{FieldKind, FormField, ItemsSpec, SelectOption};
use crate::theme::{Styles, Theme, UiConstants, UiText};
use crate::types::InputType;
use crate::value::FormValue;

/// Presentation state of one field box
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldView<'a> {
    pub focused: bool,
    /// Cursor inside a multi-select option list
    pub option_cursor: usize,
    /// Selected row of an array field
    pub item_cursor: usize,
    /// Error to show, already filtered by touched state
    pub error: Option<&'a str>,
    /// Id of the array item to highlight
    pub highlighted: Option<&'a str>,
    /// Array items with a visible sub-field error
    pub item_errors: usize,
}

const CURSOR: &str = "▏";

/// Body lines of a field, without the surrounding box
pub fn field_lines(field: &FormField, value: Option<&FormValue>, view: &FieldView) -> Vec<Line<'static>> {
    let mut lines = match &field.kind {
        FieldKind::Input { input_type } => vec![text_line(field, value, *input_type, view.focused)],
        FieldKind::Textarea { rows } => multiline(field, value, *rows as usize, view.focused),
        FieldKind::RichText => {
            let mut lines = multiline(field, value, UiConstants::RICH_TEXT_PREVIEW_LINES, view.focused);
            lines.push(Line::from(Span::styled("Markdown supported", Styles::text_muted())));
            lines
        }
        FieldKind::Select { options } => vec![choice_line(field, value, options, view.focused)],
        FieldKind::IconSelect { icons } => vec![choice_line(field, value, icons, view.focused)],
        FieldKind::MultiSelect { options } => checkbox_lines(options, value, view),
        FieldKind::File { accept, multiple } => file_lines(value, accept, *multiple, view.focused),
        FieldKind::CustomArray(items) | FieldKind::DynamicSection(items) => item_lines(items, value, view),
        FieldKind::CustomComponent { component } => vec![
            Line::from(vec![
                Span::styled(format!("<{component}> "), Styles::text_secondary()),
                Span::styled(UiText::CUSTOM_COMPONENT, Styles::text_muted()),
            ]),
            Line::from(value.map(FormValue::display_text).unwrap_or_default()),
        ],
    };

    if !field.layout.compact {
        if let Some(help) = &field.help_text {
            lines.push(Line::from(Span::styled(help.clone(), Styles::text_muted())));
        }
    }
    if let Some(error) = view.error {
        lines.push(Line::from(Span::styled(format!("✗ {error}"), Styles::error())));
    }
    lines
}

fn text_of(value: Option<&FormValue>) -> String {
    value.map(FormValue::display_text).unwrap_or_default()
}

fn placeholder(field: &FormField) -> Span<'static> {
    let text = field.placeholder.as_deref().unwrap_or(UiText::EMPTY_VALUE);
    Span::styled(text.to_string(), Styles::placeholder())
}

fn text_line(field: &FormField, value: Option<&FormValue>, input_type: InputType, focused: bool) -> Line<'static> {
    let text = text_of(value);
    let mut spans = Vec::new();
    if text.is_empty() {
        if !focused {
            spans.push(placeholder(field));
        }
    } else if input_type.is_masked() {
        let masked: String = std::iter::repeat_n(UiConstants::MASK_CHAR, text.chars().count()).collect();
        spans.push(Span::styled(masked, Styles::text()));
    } else {
        spans.push(Span::styled(text, Styles::text()));
    }
    if focused {
        spans.push(Span::styled(CURSOR, Styles::checked()));
    }
    Line::from(spans)
}

fn multiline(field: &FormField, value: Option<&FormValue>, rows: usize, focused: bool) -> Vec<Line<'static>> {
    let text = text_of(value);
    if text.is_empty() {
        return vec![if focused {
            Line::from(Span::styled(CURSOR, Styles::checked()))
        } else {
            Line::from(placeholder(field))
        }];
    }
    let all: Vec<&str> = text.lines().collect();
    // Keep the tail visible while typing
    let start = all.len().saturating_sub(rows.max(1));
    let mut lines: Vec<Line<'static>> = all[start..]
        .iter()
        .map(|l| Line::from(Span::styled(l.to_string(), Styles::text())))
        .collect();
    if focused {
        if let Some(last) = lines.last_mut() {
            last.push_span(Span::styled(CURSOR, Styles::checked()));
        }
    }
    lines
}

fn choice_line(field: &FormField, value: Option<&FormValue>, options: &[SelectOption], focused: bool) -> Line<'static> {
    let current = value.and_then(FormValue::as_str).unwrap_or_default();
    let label = options
        .iter()
        .find(|o| o.value == current)
        .map(|o| Span::styled(o.label.clone(), Styles::text()))
        .unwrap_or_else(|| placeholder(field));
    if focused {
        Line::from(vec![
            Span::styled("◀ ", Styles::nav_key()),
            label,
            Span::styled(" ▶", Styles::nav_key()),
        ])
    } else {
        Line::from(label)
    }
}

fn checkbox_lines(options: &[SelectOption], value: Option<&FormValue>, view: &FieldView) -> Vec<Line<'static>> {
    let checked: Vec<&str> = value
        .and_then(FormValue::as_array)
        .map(|items| items.iter().filter_map(FormValue::as_str).collect())
        .unwrap_or_default();
    options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let is_checked = checked.contains(&option.value.as_str());
            let mark = if is_checked { "[x] " } else { "[ ] " };
            let style = if view.focused && i == view.option_cursor {
                Styles::selected()
            } else if is_checked {
                Styles::checked()
            } else {
                Styles::text_secondary()
            };
            Line::from(Span::styled(format!("{mark}{}", option.label), style))
        })
        .collect()
}

fn file_lines(value: Option<&FormValue>, accept: &[String], multiple: bool, focused: bool) -> Vec<Line<'static>> {
    let files = value.map(FormValue::attachments).unwrap_or_default();
    let mut lines: Vec<Line<'static>> = if files.is_empty() {
        vec![Line::from(Span::styled(UiText::NO_FILE, Styles::placeholder()))]
    } else {
        files
            .iter()
            .map(|file| {
                Line::from(vec![
                    Span::styled(file.name.clone(), Styles::text()),
                    Span::styled(format!("  {}", file.display_size()), Styles::text_muted()),
                ])
            })
            .collect()
    };

    let mut hint = Vec::new();
    if !accept.is_empty() {
        hint.push(format!("Accepts {}", accept.join(", ")));
    }
    if multiple {
        hint.push("multiple files".to_string());
    }
    if focused {
        hint.push("Enter to attach, Ctrl+X to remove".to_string());
    }
    if !hint.is_empty() {
        lines.push(Line::from(Span::styled(hint.join(" · "), Styles::text_muted())));
    }
    lines
}

/// One-line summary of an array item: its first non-blank text sub-field
pub fn item_summary(items: &ItemsSpec, item: &FormValue) -> String {
    items
        .item_fields
        .iter()
        .filter_map(|sub| get_path(item, &sub.id))
        .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
        .map(FormValue::display_text)
        .next()
        .unwrap_or_else(|| UiText::EMPTY_VALUE.to_string())
}

fn bounds_text(items: &ItemsSpec, count: usize) -> String {
    match items.max_items {
        Some(max) => format!("{count} of {max} (min {})", items.min_items),
        None if items.min_items > 0 => format!("{count} (min {})", items.min_items),
        None => format!("{count}"),
    }
}

fn item_lines(items: &ItemsSpec, value: Option<&FormValue>, view: &FieldView) -> Vec<Line<'static>> {
    let values = value.and_then(FormValue::as_array).map(Vec::as_slice).unwrap_or_default();
    let noun = items.item_label.as_deref().unwrap_or("Item");

    let mut lines: Vec<Line<'static>> = if values.is_empty() {
        vec![Line::from(Span::styled(UiText::NO_ITEMS, Styles::placeholder()))]
    } else {
        values
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let highlighted = view.highlighted.is_some() && item.item_id() == view.highlighted;
                let style = if view.focused && i == view.item_cursor {
                    Styles::selected()
                } else if highlighted {
                    Styles::highlight()
                } else {
                    Styles::text()
                };
                Line::from(Span::styled(
                    format!("{noun} {}: {}", i + 1, item_summary(items, item)),
                    style,
                ))
            })
            .collect()
    };

    match view.item_errors {
        0 => {}
        1 => lines.push(Line::from(Span::styled("✗ 1 item has errors", Styles::error()))),
        n => lines.push(Line::from(Span::styled(format!("✗ {n} items have errors"), Styles::error()))),
    }

    let mut footer = bounds_text(items, values.len());
    if view.focused {
        footer.push_str(" · Ctrl+A add, Enter edit, Ctrl+X remove");
    }
    lines.push(Line::from(Span::styled(footer, Styles::text_muted())));
    lines
}

/// Box around a field: label title, required marker, focus and error border
pub fn field_block(field: &FormField, view: &FieldView) -> Block<'static> {
    let label_style = if view.focused { Styles::title() } else { Styles::label() };
    let mut title = vec![Span::styled(format!(" {}", field.label), label_style)];
    if field.is_required() {
        title.push(Span::styled(" *", Styles::required_mark()));
    }
    title.push(Span::raw(" "));

    Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Theme::field_border(view.focused, view.error.is_some() || view.item_errors > 0))
        .style(if view.focused { Styles::panel_bg() } else { Style::default() })
}

/// Rows needed by a field box with `body` lines
pub fn field_height(body: usize) -> u16 {
    (body as u16).saturating_add(2)
}

/// Draw a field box into `area`
pub fn render_field(f: &mut Frame, area: Rect, field: &FormField, lines: Vec<Line<'static>>, view: &FieldView) {
    let paragraph = Paragraph::new(lines).block(field_block(field, view));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FileAttachment;
    use serde_json::json;

    fn text(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_password_is_masked() {
        let field = FormField::typed_input("pw", "Password", InputType::Password);
        let lines = field_lines(&field, Some(&"secret".into()), &FieldView::default());
        assert_eq!(text(&lines), vec!["••••••"]);
    }

    #[test]
    fn test_placeholder_when_empty() {
        let field = FormField::input("name", "Name").placeholder("Acme");
        let lines = field_lines(&field, None, &FieldView::default());
        assert_eq!(text(&lines), vec!["Acme"]);
    }

    #[test]
    fn test_select_shows_option_label() {
        let field = FormField::select("s", "S", vec![SelectOption::new("a", "Alpha")]);
        let view = FieldView {
            focused: true,
            ..FieldView::default()
        };
        let lines = field_lines(&field, Some(&"a".into()), &view);
        assert_eq!(text(&lines), vec!["◀ Alpha ▶"]);
    }

    #[test]
    fn test_multi_select_checkboxes() {
        let field = FormField::multi_select("t", "T", SelectOption::plain(&["a", "b"]));
        let value = FormValue::from(json!(["b"]));
        let lines = field_lines(&field, Some(&value), &FieldView::default());
        assert_eq!(text(&lines), vec!["[ ] a", "[x] b"]);
    }

    #[test]
    fn test_file_list_and_error() {
        let field = FormField::file("doc", "Doc", &[".pdf"], false);
        let value = FormValue::from(FileAttachment::new("spec.pdf", 2048));
        let view = FieldView {
            error: Some("Doc is required"),
            ..FieldView::default()
        };
        let lines = text(&field_lines(&field, Some(&value), &view));
        assert_eq!(lines[0], "spec.pdf  2.0 KB");
        assert_eq!(lines[1], "Accepts .pdf");
        assert_eq!(lines[2], "✗ Doc is required");
    }

    #[test]
    fn test_array_summary_and_bounds() {
        let field = FormField::custom_array(
            "features",
            "Features",
            ItemsSpec::new(vec![FormField::input("title", "Title")])
                .bounds(1, Some(3))
                .item_label("Feature"),
        );
        let value = FormValue::from(json!([{ "id": "x", "title": "Fast" }, { "id": "y", "title": "" }]));
        let lines = text(&field_lines(&field, Some(&value), &FieldView::default()));
        assert_eq!(lines, vec!["Feature 1: Fast", "Feature 2: (empty)", "2 of 3 (min 1)"]);
    }

    #[test]
    fn test_array_reports_items_with_errors() {
        let field = FormField::custom_array(
            "features",
            "Features",
            ItemsSpec::new(vec![FormField::input("title", "Title").required()]),
        );
        let value = FormValue::from(json!([{ "id": "x", "title": "" }, { "id": "y", "title": "" }]));
        let view = FieldView {
            item_errors: 2,
            ..FieldView::default()
        };
        let lines = text(&field_lines(&field, Some(&value), &view));
        assert_eq!(lines[2], "✗ 2 items have errors");

        let view = FieldView {
            item_errors: 1,
            ..FieldView::default()
        };
        let lines = text(&field_lines(&field, Some(&value), &view));
        assert_eq!(lines[2], "✗ 1 item has errors");
    }

    #[test]
    fn test_field_height() {
        assert_eq!(field_height(1), 3);
    }
}
