//! Form state engine
//!
//! [`FormEngine`] is the single source of truth for one open form: the
//! document being edited, per-field error messages, which fields the user
//! has touched, and whether a submission is in flight. Every user action
//! goes through one of its operations; validation results are recorded in
//! the error map and never returned as `Err`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::FormConfig;
use crate::engine::path::{get_path, set_path};
use crate::error::{FormError, Result};
use crate::field::FormField;
use crate::value::FormValue;

/// Field id (or item key) to error message
pub type ErrorMap = BTreeMap<String, String>;

/// Field id to "the user has left this field"
pub type TouchedMap = BTreeMap<String, bool>;

/// Error key holding submission failures
pub const FORM_ERROR_KEY: &str = "_form";

/// Recorded when a failed submission carries no message of its own
pub const SUBMIT_FALLBACK_MESSAGE: &str = "An error occurred while submitting the form";

/// Receives the validated document when the form is submitted.
///
/// Persistence, uploads and navigation after a submit are the handler's
/// business. Returning `Err` records the message under [`FORM_ERROR_KEY`]
/// and hands the error back to the caller of [`FormEngine::handle_submit`].
pub trait SubmitHandler {
    fn submit(&mut self, data: &FormValue, is_draft: bool) -> anyhow::Result<()>;
}

impl<F> SubmitHandler for F
where
    F: FnMut(&FormValue, bool) -> anyhow::Result<()>,
{
    fn submit(&mut self, data: &FormValue, is_draft: bool) -> anyhow::Result<()> {
        self(data, is_draft)
    }
}

/// Pin a closure's signature so it can be passed where a [`SubmitHandler`]
/// is expected.
pub fn on_submit<F>(f: F) -> F
where
    F: FnMut(&FormValue, bool) -> anyhow::Result<()>,
{
    f
}

/// Handler that accepts every submission and keeps nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSubmit;

impl SubmitHandler for DiscardSubmit {
    fn submit(&mut self, _data: &FormValue, _is_draft: bool) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Result of a submission attempt that did not fail in the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The handler accepted the document
    Submitted,
    /// Validation failed; every field is now touched and the handler was not called
    Invalid,
}

/// Addresses one item of an array field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    Index(usize),
    /// The item's synthetic `id`
    Id(String),
}

impl ItemKey {
    fn matches(&self, index: usize, item: &FormValue) -> bool {
        match self {
            Self::Index(i) => *i == index,
            Self::Id(id) => item.item_id() == Some(id.as_str()),
        }
    }
}

impl From<usize> for ItemKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ItemKey {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// Fresh synthetic id for an array item
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Whether `field` is shown for `data`.
///
/// A field without `depends_on` is always shown. With one, `show_if` is
/// evaluated against the dependency's value; without `show_if` a truthy
/// dependency shows the field. Missing dependencies count as null.
pub fn is_visible(field: &FormField, data: &FormValue) -> bool {
    let Some(dep) = &field.depends_on else {
        return true;
    };
    let dep_value = get_path(data, dep);
    match &field.show_if {
        Some(condition) => condition.evaluate(dep_value),
        None => dep_value.is_some_and(FormValue::is_truthy),
    }
}

/// Key under which an array item's sub-field error is stored
pub fn item_error_key(field_id: &str, index: usize, sub_field_id: &str) -> String {
    format!("{field_id}.{index}.{sub_field_id}")
}

/// Errors of one field, including the sub-fields of every array item
fn field_errors(field: &FormField, data: &FormValue, errors: &mut ErrorMap) {
    let value = get_path(data, &field.id);
    if let Some(message) = field.check(value, data) {
        errors.insert(field.id.clone(), message);
    }

    let (Some(items), Some(values)) = (field.items(), value.and_then(FormValue::as_array)) else {
        return;
    };
    for (index, item) in values.iter().enumerate() {
        for sub in &items.item_fields {
            // Item sub-fields resolve their dependencies inside the item
            if !is_visible(sub, item) {
                continue;
            }
            if let Some(message) = sub.check(get_path(item, &sub.id), data) {
                errors.insert(item_error_key(&field.id, index, &sub.id), message);
            }
        }
    }
}

/// State of one open form
pub struct FormEngine {
    config: FormConfig,
    data: FormValue,
    errors: ErrorMap,
    touched: TouchedMap,
    is_submitting: bool,
    handler: Box<dyn SubmitHandler>,
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("form", &self.config.id)
            .field("data", &self.data)
            .field("errors", &self.errors)
            .field("touched", &self.touched)
            .field("is_submitting", &self.is_submitting)
            .finish_non_exhaustive()
    }
}

impl FormEngine {
    /// Open a form on a copy of the configuration's initial data
    pub fn new(config: FormConfig, handler: impl SubmitHandler + 'static) -> Self {
        let data = config.initial_data.clone();
        Self {
            config,
            data,
            errors: ErrorMap::new(),
            touched: TouchedMap::new(),
            is_submitting: false,
            handler: Box::new(handler),
        }
    }

    /// Replace the working document, e.g. with a saved draft
    pub fn with_data(mut self, data: FormValue) -> Self {
        self.data = data;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn data(&self) -> &FormValue {
        &self.data
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn touched(&self) -> &TouchedMap {
        &self.touched
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.config.field(id)
    }

    pub fn value(&self, id: &str) -> Option<&FormValue> {
        get_path(&self.data, id)
    }

    pub fn error(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }

    pub fn is_touched(&self, id: &str) -> bool {
        self.touched.get(id).copied().unwrap_or(false)
    }

    /// The error to show for `id`: only once the field has been touched
    pub fn visible_error(&self, id: &str) -> Option<&str> {
        if self.is_touched(id) {
            self.error(id)
        } else {
            None
        }
    }

    /// Number of items of the array field `id` with a visible sub-field error
    pub fn items_with_errors(&self, id: &str) -> usize {
        let prefix = format!("{id}.");
        self.errors
            .keys()
            .filter(|key| self.is_touched(key.as_str()))
            .filter_map(|key| key.strip_prefix(prefix.as_str())?.split_once('.'))
            .map(|(index, _)| index)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Whether the field `id` is currently shown
    pub fn is_field_visible(&self, id: &str) -> bool {
        self.field(id).is_none_or(|field| is_visible(field, &self.data))
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validate one field against `data`.
    ///
    /// Also accepts item keys of the form `"{array}.{index}.{sub_field}"`.
    /// Unknown ids always pass.
    pub fn validate_field(&self, id: &str, data: &FormValue) -> Option<String> {
        if let Some(field) = self.config.field(id) {
            return field.check(get_path(data, id), data);
        }
        self.validate_item_field(id, data)
    }

    fn validate_item_field(&self, key: &str, data: &FormValue) -> Option<String> {
        let field = self
            .config
            .fields()
            .filter(|f| f.items().is_some())
            .find(|f| key.starts_with(&format!("{}.", f.id)))?;
        let rest = &key[field.id.len() + 1..];
        let (index, sub_id) = rest.split_once('.')?;
        let index: usize = index.parse().ok()?;
        let sub = field.items()?.item_fields.iter().find(|s| s.id == sub_id)?;
        let item = get_path(data, &field.id)?.as_array()?.get(index)?;
        sub.check(get_path(item, &sub.id), data)
    }

    /// Errors of every visible field in declaration order, without storing them
    pub fn collect_errors(&self, data: &FormValue) -> ErrorMap {
        let mut errors = ErrorMap::new();
        for step in 0..self.config.steps.len() {
            self.collect_step_errors(step, data, &mut errors);
        }
        errors
    }

    fn collect_step_errors(&self, step: usize, data: &FormValue, errors: &mut ErrorMap) {
        let Some(step) = self.config.steps.get(step) else {
            return;
        };
        for field in step.fields.iter().filter(|f| is_visible(f, data)) {
            field_errors(field, data, errors);
        }
    }

    /// Validate the whole form and store the result as the error map
    pub fn validate_form(&mut self) -> ErrorMap {
        let errors = self.collect_errors(&self.data);
        debug!(form = %self.config.id, errors = errors.len(), "Validated form");
        self.errors = errors.clone();
        errors
    }

    /// Whether every visible field of `step` passes. Hidden fields pass vacuously.
    pub fn is_step_valid(&self, step: usize) -> bool {
        let mut errors = ErrorMap::new();
        self.collect_step_errors(step, &self.data, &mut errors);
        errors.is_empty()
    }

    /// Touch and validate every visible field of `step`, storing the results.
    ///
    /// Returns whether the step is valid.
    pub fn reveal_step_errors(&mut self, step: usize) -> bool {
        let mut errors = ErrorMap::new();
        self.collect_step_errors(step, &self.data, &mut errors);

        let ids: Vec<String> = self
            .config
            .steps
            .get(step)
            .map(|s| s.fields.iter().map(|f| f.id.clone()).collect())
            .unwrap_or_default();
        for id in ids {
            self.errors.remove(&id);
            let prefix = format!("{id}.");
            self.errors.retain(|key, _| !key.starts_with(&prefix));
            self.touched.insert(id, true);
        }
        for key in errors.keys() {
            self.touched.insert(key.clone(), true);
        }
        let valid = errors.is_empty();
        self.errors.extend(errors);
        valid
    }

    fn revalidate(&mut self, id: &str) {
        match self.validate_field(id, &self.data) {
            Some(message) => {
                self.errors.insert(id.to_string(), message);
            }
            None => {
                self.errors.remove(id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Store a new value for `id`.
    ///
    /// Re-validates immediately when the field is touched or already shows
    /// an error; otherwise validation waits for blur.
    pub fn handle_input_change(&mut self, id: &str, value: impl Into<FormValue>) {
        // Attachments are shared by the clone, never copied
        let mut next = self.data.clone();
        set_path(&mut next, id, value.into());
        self.data = next;
        trace!(field = id, "Field changed");

        if self.is_touched(id) || self.errors.contains_key(id) {
            self.revalidate(id);
        }
    }

    /// Mark `id` touched and validate it
    pub fn handle_blur(&mut self, id: &str) {
        self.touched.insert(id.to_string(), true);
        self.revalidate(id);
    }

    /// Mark every field (and every item key with an error) touched
    pub fn touch_all(&mut self) {
        let ids: Vec<String> = self.config.fields().map(|f| f.id.clone()).collect();
        for id in ids {
            self.touched.insert(id, true);
        }
        let keys: Vec<String> = self.errors.keys().cloned().collect();
        for key in keys {
            self.touched.insert(key, true);
        }
    }

    /// Submit the form.
    ///
    /// A non-draft submission validates first; with errors, every field is
    /// touched and `Ok(SubmitOutcome::Invalid)` is returned without calling
    /// the handler. Drafts skip validation. A handler failure is recorded
    /// under [`FORM_ERROR_KEY`] and returned as [`FormError::Submit`].
    ///
    /// The handler runs synchronously under `&mut self`, so
    /// [`Self::is_submitting`] is only `true` while it runs and a second
    /// submit cannot start meanwhile.
    pub fn handle_submit(&mut self, is_draft: bool) -> Result<SubmitOutcome> {
        if !is_draft {
            let errors = self.validate_form();
            if !errors.is_empty() {
                self.touch_all();
                debug!(form = %self.config.id, errors = errors.len(), "Submit blocked by validation");
                return Ok(SubmitOutcome::Invalid);
            }
        }

        self.errors.clear();
        self.is_submitting = true;
        let result = self.handler.submit(&self.data, is_draft);
        self.is_submitting = false;

        match result {
            Ok(()) => {
                debug!(form = %self.config.id, is_draft, "Form submitted");
                Ok(SubmitOutcome::Submitted)
            }
            Err(err) => {
                let message = err.to_string();
                let message = if message.trim().is_empty() {
                    SUBMIT_FALLBACK_MESSAGE.to_string()
                } else {
                    message
                };
                debug!(form = %self.config.id, error = %message, "Submit handler failed");
                self.errors.insert(FORM_ERROR_KEY.to_string(), message);
                Err(FormError::Submit(err))
            }
        }
    }

    /// Return to the configuration's initial data with no errors or touches
    pub fn reset(&mut self) {
        self.data = self.config.initial_data.clone();
        self.errors.clear();
        self.touched.clear();
        self.is_submitting = false;
    }

    // ------------------------------------------------------------------
    // Array fields
    // ------------------------------------------------------------------

    /// Copy of the array at `id`; missing and null count as empty
    pub fn array_items(&self, id: &str) -> Result<Vec<FormValue>> {
        match self.value(id) {
            None | Some(FormValue::Null) => Ok(Vec::new()),
            Some(FormValue::Array(items)) => Ok(items.clone()),
            Some(_) => Err(FormError::NotAnArray(id.to_string())),
        }
    }

    fn commit_array(&mut self, id: &str, items: Vec<FormValue>) {
        self.handle_input_change(id, FormValue::Array(items));
    }

    /// Append `item` to the array at `id`.
    ///
    /// An object without an `id` gets a fresh synthetic one. Returns the new
    /// item's id.
    pub fn add_to_array_field(&mut self, id: &str, item: FormValue) -> Result<Option<String>> {
        let mut item = item;
        if let Some(map) = item.as_object_mut() {
            if !map.contains_key("id") {
                map.insert("id".to_string(), FormValue::String(new_item_id()));
            }
        }
        self.push_item(id, item)
    }

    /// Append the item produced by `factory`, which sees the current items.
    ///
    /// The produced item is stored as is.
    pub fn add_to_array_field_with<F>(&mut self, id: &str, factory: F) -> Result<Option<String>>
    where
        F: FnOnce(&[FormValue]) -> FormValue,
    {
        let current = self.array_items(id)?;
        let item = factory(&current);
        self.push_item(id, item)
    }

    fn push_item(&mut self, id: &str, item: FormValue) -> Result<Option<String>> {
        let mut items = self.array_items(id)?;
        let item_id = item.item_id().map(str::to_string);
        items.push(item);
        debug!(field = id, len = items.len(), "Array item added");
        self.commit_array(id, items);
        Ok(item_id)
    }

    /// Remove the item matching `key`. Returns whether anything was removed.
    pub fn remove_from_array_field(&mut self, id: &str, key: impl Into<ItemKey>) -> Result<bool> {
        let key = key.into();
        let mut removed = Vec::new();
        let mut kept = Vec::new();
        for (index, item) in self.array_items(id)?.into_iter().enumerate() {
            if key.matches(index, &item) {
                removed.push(index);
            } else {
                kept.push(item);
            }
        }
        if removed.is_empty() {
            return Ok(false);
        }
        debug!(field = id, ?key, "Array item removed");
        self.commit_array(id, kept);
        self.shift_item_state(id, &removed);
        Ok(true)
    }

    /// Move item errors and touches of `id` past the `removed` positions,
    /// then re-validate the items whose keys were tracked.
    fn shift_item_state(&mut self, id: &str, removed: &[usize]) {
        let prefix = format!("{id}.");
        let shift = |key: &str| -> Option<String> {
            let (index, sub) = key.strip_prefix(prefix.as_str())?.split_once('.')?;
            let index: usize = index.parse().ok()?;
            if removed.contains(&index) {
                return None;
            }
            let below = removed.iter().filter(|r| **r < index).count();
            Some(item_error_key(id, index - below, sub))
        };

        let tracked: BTreeSet<String> = self.errors.keys().filter_map(|k| shift(k.as_str())).collect();
        let touched: Vec<(String, bool)> = self
            .touched
            .iter()
            .filter_map(|(k, v)| Some((shift(k.as_str())?, *v)))
            .collect();
        self.errors.retain(|key, _| !key.starts_with(prefix.as_str()));
        self.touched.retain(|key, _| !key.starts_with(prefix.as_str()));
        self.touched.extend(touched);

        let mut fresh = ErrorMap::new();
        if let Some(field) = self.config.field(id) {
            field_errors(field, &self.data, &mut fresh);
        }
        for (key, message) in fresh {
            if key.starts_with(prefix.as_str()) && (tracked.contains(&key) || self.is_touched(&key)) {
                self.errors.insert(key, message);
            }
        }
    }

    /// Merge `partial` into the item matching `key`, leaving the others untouched
    pub fn update_array_field_item(
        &mut self,
        id: &str,
        key: impl Into<ItemKey>,
        partial: FormValue,
    ) -> Result<bool> {
        self.update_array_field_item_with(id, key, move |_| partial)
    }

    /// Merge the result of `updater` (which receives the current item) into it
    pub fn update_array_field_item_with<F>(
        &mut self,
        id: &str,
        key: impl Into<ItemKey>,
        updater: F,
    ) -> Result<bool>
    where
        F: FnOnce(&FormValue) -> FormValue,
    {
        let key = key.into();
        let mut items = self.array_items(id)?;
        let Some(item) = items
            .iter_mut()
            .enumerate()
            .find(|(index, item)| key.matches(*index, item))
            .map(|(_, item)| item)
        else {
            return Ok(false);
        };
        let partial = updater(item);
        item.merge(partial);
        trace!(field = id, ?key, "Array item updated");
        self.commit_array(id, items);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormStep;
    use crate::field::FormField;
    use serde_json::json;

    fn engine() -> FormEngine {
        let config = FormConfig::new(
            "t",
            "T",
            vec![FormStep::new(
                "s",
                "S",
                vec![FormField::input("name", "Name").required().min_length(2)],
            )],
        );
        FormEngine::new(config, DiscardSubmit)
    }

    #[test]
    fn test_change_before_blur_does_not_validate() {
        let mut engine = engine();
        engine.handle_input_change("name", "A");
        assert!(engine.error("name").is_none());

        engine.handle_blur("name");
        assert!(engine.error("name").is_some());
        assert!(engine.is_touched("name"));

        engine.handle_input_change("name", "Al");
        assert!(engine.error("name").is_none());
    }

    #[test]
    fn test_visible_error_requires_touch() {
        let mut engine = engine();
        engine.validate_form();
        assert!(engine.error("name").is_some());
        assert!(engine.visible_error("name").is_none());
        engine.handle_blur("name");
        assert!(engine.visible_error("name").is_some());
    }

    #[test]
    fn test_array_on_scalar_is_error() {
        let mut engine = engine();
        engine.handle_input_change("name", "scalar");
        assert!(matches!(
            engine.add_to_array_field("name", FormValue::object()),
            Err(FormError::NotAnArray(_))
        ));
    }

    #[test]
    fn test_add_assigns_synthetic_id() {
        let mut engine = engine();
        let id = engine
            .add_to_array_field("items", FormValue::from(json!({ "title": "" })))
            .unwrap()
            .unwrap();
        let items = engine.array_items("items").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id(), Some(id.as_str()));
    }

    #[test]
    fn test_factory_output_is_kept_as_is() {
        let mut engine = engine();
        let id = engine
            .add_to_array_field_with("items", |current| {
                FormValue::from(json!({ "id": format!("row-{}", current.len()) }))
            })
            .unwrap();
        assert_eq!(id.as_deref(), Some("row-0"));
    }

    #[test]
    fn test_reset_restores_initial_data() {
        let mut engine = engine();
        engine.handle_input_change("name", "Zed");
        engine.handle_blur("name");
        engine.reset();
        assert_eq!(engine.data(), &FormValue::object());
        assert!(engine.touched().is_empty());
    }
}
