//! Engine modules: form state, step navigation and array sections.
//!
//! Nothing in here touches the terminal. The console in [`crate::app`] and
//! the CLI drive these types; tests drive them directly.

pub mod array;
pub mod form;
pub mod navigator;
pub mod path;

pub use array::ArraySection;
pub use form::{
    DiscardSubmit, ErrorMap, FORM_ERROR_KEY, FormEngine, ItemKey, SubmitHandler, SubmitOutcome,
    TouchedMap, is_visible, item_error_key, on_submit,
};
pub use navigator::{NavigationError, StepNavigator, StepStatus};
pub use path::{get_path, set_path};
