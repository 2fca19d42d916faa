//! Header, step indicator and bottom bars

use crate::components::keybindings::NavBarItem;
use crate::engine::{FormEngine, StepNavigator};
use crate::theme::{Colors, Styles, Theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Form title with the current step's title and subtitle
pub fn title_line(engine: &FormEngine, navigator: &StepNavigator) -> Line<'static> {
    let config = engine.config();
    let mut spans = vec![Span::styled(config.title.clone(), Styles::title())];
    if let Some(step) = config.steps.get(navigator.current()) {
        spans.push(Span::styled(
            format!("  ·  Step {} of {}: {}", navigator.current() + 1, navigator.count(), step.title),
            Styles::text(),
        ));
        if let Some(subtitle) = &step.subtitle {
            spans.push(Span::styled(format!("  {subtitle}"), Styles::text_muted()));
        }
    }
    Line::from(spans)
}

/// Every step with its completion marker
pub fn step_indicator_line(engine: &FormEngine, navigator: &StepNavigator) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, step) in engine.config().steps.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ─ ", Styles::text_muted()));
        }
        let status = navigator.step_status(i, engine);
        spans.push(Span::styled(
            format!("{} {}", Theme::step_icon(status), step.title),
            Theme::step_style(status),
        ));
    }
    Line::from(spans)
}

/// Render title, step indicator and progress gauge
pub fn render_header(f: &mut Frame, area: Rect, engine: &FormEngine, navigator: &StepNavigator) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::border_active());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    f.render_widget(Paragraph::new(title_line(engine, navigator)), rows[0]);
    f.render_widget(Paragraph::new(step_indicator_line(engine, navigator)), rows[1]);

    let percent = navigator.progress_percent(engine);
    let gauge = Gauge::default()
        .gauge_style(Styles::progress())
        .label(Span::styled(format!("{percent}% complete"), Style::default().fg(Colors::FG_PRIMARY)))
        .percent(u16::from(percent.min(100)));
    f.render_widget(gauge, rows[2]);
}

/// Key hints shown on the last row
pub fn nav_bar_line(items: &[NavBarItem]) -> Line<'static> {
    let mut spans = Vec::new();
    for item in items {
        spans.push(Span::styled(format!(" {} ", item.key_display), Styles::nav_key()));
        spans.push(Span::styled(format!("{}  ", item.action_label), Styles::nav_hint()));
    }
    Line::from(spans)
}

pub fn render_nav_bar(f: &mut Frame, area: Rect, items: &[NavBarItem]) {
    f.render_widget(Paragraph::new(nav_bar_line(items)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FormConfig, FormStep};
    use crate::engine::DiscardSubmit;
    use crate::field::FormField;

    #[test]
    fn test_step_indicator_marks_current() {
        let config = FormConfig::new(
            "f",
            "Form",
            vec![
                FormStep::new("a", "Basics", vec![FormField::input("x", "X")]),
                FormStep::new("b", "Media", vec![FormField::input("y", "Y")]),
            ],
        );
        let engine = FormEngine::new(config, DiscardSubmit);
        let nav = StepNavigator::for_engine(&engine);
        assert_eq!(step_indicator_line(&engine, &nav).to_string(), "● Basics ─ ○ Media");
        assert_eq!(title_line(&engine, &nav).to_string(), "Form  ·  Step 1 of 2: Basics");
    }
}
