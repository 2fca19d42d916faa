//! Centralized theme and styling for the console
//!
//! Single source of truth for the colors, styles and text constants used by
//! the renderer. Widgets look styles up here instead of building them inline.
//!
//! # Usage
//! ```rust
//! use formwright::theme::{Colors, Styles, Theme};
//! use formwright::engine::StepStatus;
//! use ratatui::style::Style;
//!
//! let style = Style::default().fg(Colors::PRIMARY);
//! let title_style = Styles::title();
//! let step_style = Theme::step_style(StepStatus::Complete);
//! ```

use ratatui::style::{Color, Modifier, Style};

use crate::engine::StepStatus;

// =============================================================================
// COLOR PALETTE
// =============================================================================

/// Core color palette
pub struct Colors;

impl Colors {
    // -------------------------------------------------------------------------
    // Base Colors
    // -------------------------------------------------------------------------

    /// Panel background
    pub const BG_PRIMARY: Color = Color::Rgb(20, 20, 30);

    /// Background of the field being edited
    pub const BG_FOCUSED: Color = Color::Rgb(30, 30, 40);

    /// Gauge background
    pub const BG_GAUGE: Color = Color::Rgb(40, 40, 50);

    pub const FG_PRIMARY: Color = Color::White;

    pub const FG_SECONDARY: Color = Color::Gray;

    /// Placeholders, help text, disabled controls
    pub const FG_MUTED: Color = Color::DarkGray;

    // -------------------------------------------------------------------------
    // Accent Colors
    // -------------------------------------------------------------------------

    /// Borders, titles, highlights
    pub const PRIMARY: Color = Color::Cyan;

    /// Selected options, cursor
    pub const SECONDARY: Color = Color::Yellow;

    // -------------------------------------------------------------------------
    // Semantic Colors
    // -------------------------------------------------------------------------

    pub const SUCCESS: Color = Color::Green;

    pub const WARNING: Color = Color::Yellow;

    pub const ERROR: Color = Color::Red;

    pub const INFO: Color = Color::Blue;

    // -------------------------------------------------------------------------
    // Form Element Colors
    // -------------------------------------------------------------------------

    pub const BORDER_ACTIVE: Color = Color::Cyan;

    pub const BORDER_INACTIVE: Color = Color::DarkGray;

    /// Border of a touched field with an error
    pub const BORDER_ERROR: Color = Color::Red;

    /// Required marker after a label
    pub const REQUIRED_MARK: Color = Color::LightRed;

    /// Freshly added array item
    pub const HIGHLIGHT: Color = Color::LightGreen;

    pub const SELECTED_BG: Color = Color::Yellow;

    pub const SELECTED_FG: Color = Color::Black;

    pub const NAV_HINT: Color = Color::DarkGray;

    // -------------------------------------------------------------------------
    // Step Indicator Colors
    // -------------------------------------------------------------------------

    pub const STEP_CURRENT: Color = Color::Yellow;

    pub const STEP_COMPLETE: Color = Color::Green;

    pub const STEP_INCOMPLETE: Color = Color::Red;

    pub const STEP_PENDING: Color = Color::Gray;

    pub const PROGRESS: Color = Color::Green;
}

// =============================================================================
// PRE-BUILT STYLES
// =============================================================================

/// Pre-built styles for common UI patterns
pub struct Styles;

impl Styles {
    pub fn text() -> Style {
        Style::default().fg(Colors::FG_PRIMARY)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    pub fn text_secondary() -> Style {
        Style::default().fg(Colors::FG_SECONDARY)
    }

    /// Main title style (cyan, bold)
    pub fn title() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn label() -> Style {
        Style::default()
            .fg(Colors::FG_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn required_mark() -> Style {
        Style::default()
            .fg(Colors::REQUIRED_MARK)
            .add_modifier(Modifier::BOLD)
    }

    pub fn placeholder() -> Style {
        Style::default()
            .fg(Colors::FG_MUTED)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn border_active() -> Style {
        Style::default().fg(Colors::BORDER_ACTIVE)
    }

    pub fn border_inactive() -> Style {
        Style::default().fg(Colors::BORDER_INACTIVE)
    }

    pub fn border_error() -> Style {
        Style::default().fg(Colors::BORDER_ERROR)
    }

    pub fn panel_bg() -> Style {
        Style::default().bg(Colors::BG_PRIMARY)
    }

    /// Option under the cursor
    pub fn selected() -> Style {
        Style::default()
            .fg(Colors::SELECTED_FG)
            .bg(Colors::SELECTED_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Checked option of a multi-select
    pub fn checked() -> Style {
        Style::default().fg(Colors::SECONDARY)
    }

    pub fn highlight() -> Style {
        Style::default()
            .fg(Colors::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Colors::SUCCESS)
    }

    pub fn warning() -> Style {
        Style::default().fg(Colors::WARNING)
    }

    pub fn error() -> Style {
        Style::default().fg(Colors::ERROR)
    }

    pub fn info() -> Style {
        Style::default().fg(Colors::INFO)
    }

    pub fn progress() -> Style {
        Style::default()
            .fg(Colors::PROGRESS)
            .bg(Colors::BG_GAUGE)
    }

    /// Navigation hint (keybindings)
    pub fn nav_hint() -> Style {
        Style::default().fg(Colors::NAV_HINT)
    }

    pub fn nav_key() -> Style {
        Style::default()
            .fg(Colors::SECONDARY)
            .add_modifier(Modifier::BOLD)
    }
}

// =============================================================================
// THEME CONTEXT
// =============================================================================

/// Severity of a status line message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

/// Semantic style lookups
pub struct Theme;

impl Theme {
    /// Style of a step in the step indicator
    pub fn step_style(status: StepStatus) -> Style {
        match status {
            StepStatus::Current => Style::default()
                .fg(Colors::STEP_CURRENT)
                .add_modifier(Modifier::BOLD),
            StepStatus::Complete => Style::default().fg(Colors::STEP_COMPLETE),
            StepStatus::Incomplete => Style::default().fg(Colors::STEP_INCOMPLETE),
            StepStatus::Pending => Style::default().fg(Colors::STEP_PENDING),
        }
    }

    /// Marker drawn before a step title
    pub fn step_icon(status: StepStatus) -> &'static str {
        match status {
            StepStatus::Current => "●",
            StepStatus::Complete => "✓",
            StepStatus::Incomplete => "✗",
            StepStatus::Pending => "○",
        }
    }

    /// Border of a field box. A visible error wins over focus.
    pub fn field_border(focused: bool, has_error: bool) -> Style {
        if has_error {
            Styles::border_error()
        } else if focused {
            Styles::border_active()
        } else {
            Styles::border_inactive()
        }
    }

    pub fn severity_style(severity: Severity) -> Style {
        match severity {
            Severity::Info => Styles::info(),
            Severity::Success => Style::default().fg(Colors::SUCCESS),
            Severity::Warning => Style::default().fg(Colors::WARNING),
            Severity::Danger => Style::default()
                .fg(Colors::ERROR)
                .add_modifier(Modifier::BOLD),
        }
    }
}

// =============================================================================
// UI CONSTANTS
// =============================================================================

/// UI dimension and layout constants
pub struct UiConstants;

impl UiConstants {
    /// Help overlay width percentage
    pub const DIALOG_WIDTH_PCT: u16 = 60;

    /// Help overlay height percentage
    pub const DIALOG_HEIGHT_PCT: u16 = 70;

    pub const NAV_BAR_HEIGHT: u16 = 1;

    /// Title, step indicator and gauge
    pub const HEADER_HEIGHT: u16 = 5;

    pub const STATUS_BAR_HEIGHT: u16 = 1;

    /// Collapsed size of a rich-text editor
    pub const RICH_TEXT_PREVIEW_LINES: usize = 3;

    /// Character used to mask passwords
    pub const MASK_CHAR: char = '•';
}

// =============================================================================
// TEXT CONSTANTS
// =============================================================================

/// Common UI text strings
pub struct UiText;

impl UiText {
    pub const EMPTY_VALUE: &'static str = "(empty)";
    pub const NO_FILE: &'static str = "No file selected";
    pub const NO_ITEMS: &'static str = "No items yet";
    pub const CUSTOM_COMPONENT: &'static str = "Edited outside the console";
    pub const SUBMITTED: &'static str = "Published!";
    pub const DRAFT_SAVED: &'static str = "Draft saved";
    pub const FIX_ERRORS: &'static str = "Please fix the highlighted fields";
}
