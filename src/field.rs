//! Field registry: declarative field definitions and their validation rules
//!
//! A [`FormField`] describes one input: where its value lives (a dotted
//! path), what kind of control edits it, which rules its value must satisfy
//! and when it is shown at all. Definitions are plain data, loaded from JSON
//! or built in code, and never change while a form is open.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::types::{ColumnSpan, FieldType, InputType};
use crate::value::FormValue;

/// One choice of a select, multi-select or icon-select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Options whose label equals their value
    pub fn plain(values: &[&str]) -> Vec<Self> {
        values.iter().map(|v| Self::new(*v, *v)).collect()
    }
}

/// Layout of a repeating group of sub-documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemsSpec {
    /// Template applied to every item
    pub item_fields: Vec<FormField>,
    /// Removal is refused at or below this many items
    #[serde(default)]
    pub min_items: usize,
    /// Adding is a no-op at this many items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Singular noun for one item, e.g. "Feature"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_label: Option<String>,
}

impl ItemsSpec {
    pub fn new(item_fields: Vec<FormField>) -> Self {
        Self {
            item_fields,
            ..Self::default()
        }
    }

    pub fn bounds(mut self, min_items: usize, max_items: Option<usize>) -> Self {
        self.min_items = min_items;
        self.max_items = max_items;
        self
    }

    pub fn item_label(mut self, label: impl Into<String>) -> Self {
        self.item_label = Some(label.into());
        self
    }
}

/// The control kind of a field, with its kind-specific attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Input {
        #[serde(default)]
        input_type: InputType,
    },
    Textarea {
        #[serde(default = "default_rows")]
        rows: u16,
    },
    Select {
        options: Vec<SelectOption>,
    },
    MultiSelect {
        options: Vec<SelectOption>,
    },
    File {
        #[serde(default)]
        accept: Vec<String>,
        #[serde(default)]
        multiple: bool,
    },
    RichText,
    IconSelect {
        icons: Vec<SelectOption>,
    },
    CustomArray(ItemsSpec),
    DynamicSection(ItemsSpec),
    /// Rendered by the embedding application; the engine only stores its value
    CustomComponent {
        component: String,
    },
}

fn default_rows() -> u16 {
    4
}

impl FieldKind {
    /// The payload-free tag of this kind
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Input { .. } => FieldType::Input,
            Self::Textarea { .. } => FieldType::Textarea,
            Self::Select { .. } => FieldType::Select,
            Self::MultiSelect { .. } => FieldType::MultiSelect,
            Self::File { .. } => FieldType::File,
            Self::RichText => FieldType::RichText,
            Self::IconSelect { .. } => FieldType::IconSelect,
            Self::CustomArray(_) => FieldType::CustomArray,
            Self::DynamicSection(_) => FieldType::DynamicSection,
            Self::CustomComponent { .. } => FieldType::CustomComponent,
        }
    }
}

/// A compiled `pattern` rule. Serializes as its source text.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Self)
            .map_err(|e| FormError::config(format!("invalid pattern {source:?}: {e}")))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.0.as_str())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

type CustomFn = dyn Fn(&FormValue, &FormValue) -> Option<String> + Send + Sync;

/// Custom predicate: receives the field value and the whole document and
/// returns an error message. Must be pure.
#[derive(Clone)]
pub struct CustomRule(Arc<CustomFn>);

impl CustomRule {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&FormValue, &FormValue) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn check(&self, value: &FormValue, data: &FormValue) -> Option<String> {
        (self.0)(value, data)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(..)")
    }
}

/// Validation rules of one field, checked in declaration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRules {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    /// Message used when `pattern` does not match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    #[serde(skip)]
    pub custom: Option<CustomRule>,
}

impl FieldRules {
    /// Whether any rule is configured at all
    pub fn is_empty(&self) -> bool {
        !self.required
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.custom.is_none()
    }

    /// Run the rules against `value` (missing values count as null).
    ///
    /// Order: required, min length, max length, pattern, custom. The first
    /// failing rule's message is returned. Length and pattern rules only
    /// look at non-blank values so optional fields may stay empty.
    pub fn check(&self, label: &str, value: Option<&FormValue>, data: &FormValue) -> Option<String> {
        let null = FormValue::Null;
        let value = value.unwrap_or(&null);

        if self.required && value.is_blank() {
            return Some(format!("{label} is required"));
        }

        if !value.is_blank() {
            let unit = |bound: usize| match (value.as_array().is_some(), bound == 1) {
                (true, true) => "item",
                (true, false) => "items",
                (false, true) => "character",
                (false, false) => "characters",
            };
            if let (Some(min), Some(len)) = (self.min_length, value.measured_len()) {
                if len < min {
                    let noun = unit(min);
                    return Some(match value {
                        FormValue::Array(_) => format!("{label} must have at least {min} {noun}"),
                        _ => format!("{label} must be at least {min} {noun}"),
                    });
                }
            }
            if let (Some(max), Some(len)) = (self.max_length, value.measured_len()) {
                if len > max {
                    let noun = unit(max);
                    return Some(match value {
                        FormValue::Array(_) => format!("{label} must have no more than {max} {noun}"),
                        _ => format!("{label} must be no more than {max} {noun}"),
                    });
                }
            }
            if let (Some(pattern), Some(text)) = (&self.pattern, value.as_str()) {
                if !pattern.is_match(text) {
                    return Some(
                        self.pattern_message
                            .clone()
                            .unwrap_or_else(|| format!("{label} has an invalid format")),
                    );
                }
            }
        }

        self.custom.as_ref().and_then(|rule| rule.check(value, data))
    }
}

type ConditionFn = dyn Fn(&FormValue) -> bool + Send + Sync;

/// Predicate over the dependency field's value deciding visibility
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equals(FormValue),
    NotEquals(FormValue),
    OneOf(Vec<FormValue>),
    Truthy,
    Falsy,
    #[serde(skip)]
    Custom(Arc<ConditionFn>),
}

impl Condition {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&FormValue) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, value: Option<&FormValue>) -> bool {
        let null = FormValue::Null;
        let value = value.unwrap_or(&null);
        match self {
            Self::Equals(expected) => value == expected,
            Self::NotEquals(expected) => value != expected,
            Self::OneOf(choices) => choices.iter().any(|c| c == value),
            Self::Truthy => value.is_truthy(),
            Self::Falsy => !value.is_truthy(),
            Self::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Self::NotEquals(v) => f.debug_tuple("NotEquals").field(v).finish(),
            Self::OneOf(v) => f.debug_tuple("OneOf").field(v).finish(),
            Self::Truthy => f.write_str("Truthy"),
            Self::Falsy => f.write_str("Falsy"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Layout hints for the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutHints {
    #[serde(default)]
    pub span: ColumnSpan,
    #[serde(default)]
    pub compact: bool,
}

/// Declarative definition of one form input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    /// Unique key and dotted path of the value inside the document
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "FieldRules::is_empty")]
    pub rules: FieldRules,
    #[serde(default)]
    pub layout: LayoutHints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FormValue>,
    /// Id of the field whose value decides whether this one is shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    /// Visibility predicate; without one, a truthy dependency shows the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<Condition>,
}

impl FormField {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            rules: FieldRules::default(),
            layout: LayoutHints::default(),
            placeholder: None,
            help_text: None,
            default_value: None,
            depends_on: None,
            show_if: None,
        }
    }

    pub fn input(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldKind::Input { input_type: InputType::Text })
    }

    pub fn typed_input(id: impl Into<String>, label: impl Into<String>, input_type: InputType) -> Self {
        Self::new(id, label, FieldKind::Input { input_type })
    }

    pub fn textarea(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldKind::Textarea { rows: default_rows() })
    }

    pub fn select(id: impl Into<String>, label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(id, label, FieldKind::Select { options })
    }

    pub fn multi_select(
        id: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self::new(id, label, FieldKind::MultiSelect { options })
    }

    pub fn file(id: impl Into<String>, label: impl Into<String>, accept: &[&str], multiple: bool) -> Self {
        Self::new(
            id,
            label,
            FieldKind::File {
                accept: accept.iter().map(|a| a.to_string()).collect(),
                multiple,
            },
        )
    }

    pub fn rich_text(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, FieldKind::RichText)
    }

    pub fn icon_select(id: impl Into<String>, label: impl Into<String>, icons: Vec<SelectOption>) -> Self {
        Self::new(id, label, FieldKind::IconSelect { icons })
    }

    pub fn custom_array(id: impl Into<String>, label: impl Into<String>, items: ItemsSpec) -> Self {
        Self::new(id, label, FieldKind::CustomArray(items))
    }

    pub fn dynamic_section(id: impl Into<String>, label: impl Into<String>, items: ItemsSpec) -> Self {
        Self::new(id, label, FieldKind::DynamicSection(items))
    }

    pub fn custom_component(
        id: impl Into<String>,
        label: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            label,
            FieldKind::CustomComponent {
                component: component.into(),
            },
        )
    }

    // Builder-style modifiers

    pub fn required(mut self) -> Self {
        self.rules.required = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.rules.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.rules.max_length = Some(max);
        self
    }

    /// Add a `pattern` rule; fails if the expression does not compile
    pub fn pattern(mut self, source: &str, message: impl Into<String>) -> Result<Self> {
        self.rules.pattern = Some(Pattern::new(source)?);
        self.rules.pattern_message = Some(message.into());
        Ok(self)
    }

    pub fn custom<F>(mut self, rule: F) -> Self
    where
        F: Fn(&FormValue, &FormValue) -> Option<String> + Send + Sync + 'static,
    {
        self.rules.custom = Some(CustomRule::new(rule));
        self
    }

    pub fn span(mut self, span: ColumnSpan) -> Self {
        self.layout.span = span;
        self
    }

    pub fn compact(mut self) -> Self {
        self.layout.compact = true;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<FormValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn shown_when(mut self, depends_on: impl Into<String>, condition: Condition) -> Self {
        self.depends_on = Some(depends_on.into());
        self.show_if = Some(condition);
        self
    }

    // Queries

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    pub fn is_required(&self) -> bool {
        self.rules.required
    }

    /// Item template of array kinds
    pub fn items(&self) -> Option<&ItemsSpec> {
        match &self.kind {
            FieldKind::CustomArray(items) | FieldKind::DynamicSection(items) => Some(items),
            _ => None,
        }
    }

    /// Choices of select-like kinds
    pub fn options(&self) -> Option<&[SelectOption]> {
        match &self.kind {
            FieldKind::Select { options } | FieldKind::MultiSelect { options } => Some(options),
            FieldKind::IconSelect { icons } => Some(icons),
            _ => None,
        }
    }

    /// Label of the option whose value is `value`
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options()?
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }

    /// Value a freshly created item or an untouched field starts with.
    ///
    /// An explicit `default_value` wins; otherwise multi-select and array
    /// kinds start empty, files start as `[]` or null by multiplicity, and
    /// everything else starts as an empty string.
    pub fn empty_value(&self) -> FormValue {
        if let Some(default) = &self.default_value {
            return default.clone();
        }
        match &self.kind {
            FieldKind::MultiSelect { .. } | FieldKind::CustomArray(_) | FieldKind::DynamicSection(_) => {
                FormValue::Array(Vec::new())
            }
            FieldKind::File { multiple: true, .. } => FormValue::Array(Vec::new()),
            FieldKind::File { multiple: false, .. } => FormValue::Null,
            FieldKind::RichText => FormValue::empty_string(),
            FieldKind::Input { .. }
            | FieldKind::Textarea { .. }
            | FieldKind::Select { .. }
            | FieldKind::IconSelect { .. }
            | FieldKind::CustomComponent { .. } => FormValue::empty_string(),
        }
    }

    /// Validate `value` against this field's rules
    pub fn check(&self, value: Option<&FormValue>, data: &FormValue) -> Option<String> {
        self.rules.check(&self.label, value, data)
    }
}
