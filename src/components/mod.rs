//! Reusable console components

pub mod help_overlay;
pub mod keybindings;

pub use help_overlay::HelpOverlay;
pub use keybindings::{HelpSection, KeyAction, Keybinding, KeybindingContext, NavBarItem};
