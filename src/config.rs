//! Form configuration: steps, fields and initial data
//!
//! A [`FormConfig`] is the static description of one multi-step form. It is
//! either built in code (see [`crate::presets`]) or saved to and loaded from
//! JSON files.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{FormError, Result};
use crate::field::FormField;
use crate::types::ContentStatus;
use crate::value::FormValue;

/// One page of a multi-step form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormStep {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub fields: Vec<FormField>,
}

impl FormStep {
    pub fn new(id: impl Into<String>, title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            fields,
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// A non-fatal problem found in a configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    DuplicateFieldId(String),
    UnknownDependency { field: String, depends_on: String },
    ConditionWithoutDependency(String),
    InvertedItemBounds { field: String, min: usize, max: usize },
    EmptyStep(String),
    NoSteps,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateFieldId(id) => write!(f, "field id {id:?} is declared more than once"),
            Self::UnknownDependency { field, depends_on } => {
                write!(f, "field {field:?} depends on unknown field {depends_on:?}")
            }
            Self::ConditionWithoutDependency(id) => {
                write!(f, "field {id:?} has show_if but no depends_on")
            }
            Self::InvertedItemBounds { field, min, max } => {
                write!(f, "field {field:?} has min_items {min} above max_items {max}")
            }
            Self::EmptyStep(id) => write!(f, "step {id:?} has no fields"),
            Self::NoSteps => write!(f, "form has no steps"),
        }
    }
}

impl ConfigWarning {
    /// Warnings that make the form unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateFieldId(_) | Self::InvertedItemBounds { .. } | Self::NoSteps
        )
    }
}

/// Complete description of a multi-step form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<FormStep>,
    /// Snapshot the form opens with
    #[serde(default = "FormValue::object")]
    pub initial_data: FormValue,
}

impl FormConfig {
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<FormStep>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            steps,
            initial_data: FormValue::object(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn initial_data(mut self, data: impl Into<FormValue>) -> Self {
        self.initial_data = data.into();
        self
    }

    /// Every top-level field in step order
    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.steps.iter().flat_map(|step| step.fields.iter())
    }

    /// Find a top-level field by id
    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields().find(|f| f.id == id)
    }

    /// Index of the step declaring `id`
    pub fn step_of(&self, id: &str) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.fields.iter().any(|f| f.id == id))
    }

    /// Collect configuration problems without failing
    pub fn lint(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.steps.is_empty() {
            warnings.push(ConfigWarning::NoSteps);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.fields.is_empty() {
                warnings.push(ConfigWarning::EmptyStep(step.id.clone()));
            }
            for field in &step.fields {
                if !seen.insert(field.id.as_str()) {
                    warnings.push(ConfigWarning::DuplicateFieldId(field.id.clone()));
                }
            }
        }

        for field in self.fields() {
            match &field.depends_on {
                Some(dep) if !seen.contains(dep.as_str()) => {
                    warnings.push(ConfigWarning::UnknownDependency {
                        field: field.id.clone(),
                        depends_on: dep.clone(),
                    });
                }
                None if field.show_if.is_some() => {
                    warnings.push(ConfigWarning::ConditionWithoutDependency(field.id.clone()));
                }
                _ => {}
            }
            if let Some(items) = field.items() {
                if let Some(max) = items.max_items {
                    if items.min_items > max {
                        warnings.push(ConfigWarning::InvertedItemBounds {
                            field: field.id.clone(),
                            min: items.min_items,
                            max,
                        });
                    }
                }
            }
        }

        warnings
    }

    /// Fail on problems that make the form unusable; log the rest
    pub fn validate(&self) -> Result<()> {
        let warnings = self.lint();
        for warning in warnings.iter().filter(|w| !w.is_fatal()) {
            warn!(form = %self.id, "{}", warning);
        }
        if let Some(fatal) = warnings.iter().find(|w| w.is_fatal()) {
            return Err(FormError::config(fatal.to_string()));
        }
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize form configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write form configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read form configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse form configuration JSON")?;

        info!(form = %config.id, steps = config.steps.len(), "Loaded form configuration");
        Ok(config)
    }
}

/// Load a data document (e.g. a saved draft) from a JSON file
pub fn load_document<P: AsRef<Path>>(path: P) -> anyhow::Result<FormValue> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read document from {:?}", path.as_ref()))?;
    let value: FormValue = serde_json::from_str(&content).context("Failed to parse document JSON")?;
    Ok(value)
}

/// The JSON written for a submission: the document plus its draft flag and
/// publishing status
pub fn submission_document(data: &FormValue, is_draft: bool) -> serde_json::Value {
    let mut json = data.to_json();
    if let Some(map) = json.as_object_mut() {
        map.insert("_draft".to_string(), serde_json::Value::Bool(is_draft));
        map.insert(
            "status".to_string(),
            serde_json::Value::String(ContentStatus::for_submission(is_draft).to_string()),
        );
    }
    json
}

/// Write a submission as pretty JSON
pub fn save_document<P: AsRef<Path>>(path: P, data: &FormValue, is_draft: bool) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&submission_document(data, is_draft))
        .context("Failed to serialize document to JSON")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write document to {:?}", path.as_ref()))?;
    info!(path = ?path.as_ref(), is_draft, "Saved document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Condition, ItemsSpec};

    fn sample() -> FormConfig {
        FormConfig::new(
            "sample",
            "Sample",
            vec![
                FormStep::new("one", "One", vec![FormField::input("a", "A")]),
                FormStep::new(
                    "two",
                    "Two",
                    vec![FormField::input("b", "B").shown_when("a", Condition::Truthy)],
                ),
            ],
        )
    }

    #[test]
    fn test_field_lookup() {
        let config = sample();
        assert_eq!(config.fields().count(), 2);
        assert_eq!(config.field("b").map(|f| f.label.as_str()), Some("B"));
        assert_eq!(config.step_of("b"), Some(1));
        assert!(config.field("zzz").is_none());
    }

    #[test]
    fn test_lint_clean_config() {
        assert!(sample().lint().is_empty());
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_lint_unknown_dependency_is_not_fatal() {
        let mut config = sample();
        config.steps[1].fields[0].depends_on = Some("typo".into());
        let warnings = config.lint();
        assert_eq!(warnings.len(), 1);
        assert!(!warnings[0].is_fatal());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_ids_fail_validation() {
        let mut config = sample();
        config.steps[1].fields.push(FormField::input("a", "Again"));
        assert!(matches!(config.validate(), Err(FormError::Config(_))));
    }

    #[test]
    fn test_inverted_item_bounds() {
        let config = FormConfig::new(
            "x",
            "X",
            vec![FormStep::new(
                "s",
                "S",
                vec![FormField::custom_array(
                    "items",
                    "Items",
                    ItemsSpec::new(vec![FormField::input("title", "Title")]).bounds(3, Some(1)),
                )],
            )],
        );
        assert!(config.lint().iter().any(|w| w.is_fatal()));
    }

    #[test]
    fn test_submission_document_flags() {
        let data = FormValue::from(serde_json::json!({ "name": "Widget" }));
        let draft = submission_document(&data, true);
        assert_eq!(draft["_draft"], serde_json::json!(true));
        assert_eq!(draft["status"], serde_json::json!("draft"));
        let published = submission_document(&data, false);
        assert_eq!(published["status"], serde_json::json!("published"));
        assert_eq!(published["name"], serde_json::json!("Widget"));
    }
}
