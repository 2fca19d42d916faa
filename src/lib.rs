//! formwright Library
//!
//! A declarative multi-step form engine for content management forms,
//! with a terminal console that renders and drives it.

pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod presets;
pub mod tags;
pub mod theme;
pub mod types;
pub mod ui;
pub mod uploads;
pub mod value;

// Re-export main types for convenience
pub use app::App;
pub use config::{ConfigWarning, FormConfig, FormStep, load_document, save_document};
pub use engine::{
    ArraySection, DiscardSubmit, FORM_ERROR_KEY, FormEngine, ItemKey, NavigationError, StepNavigator,
    StepStatus, SubmitHandler, SubmitOutcome, on_submit,
};
pub use error::{FormError, Result};
pub use field::{Condition, FieldKind, FormField, ItemsSpec, SelectOption};
pub use presets::Preset;
pub use types::{ColumnSpan, ContentStatus, FieldType, InputType};
pub use uploads::UploadPlan;
pub use value::{FileAttachment, FormValue};
