//! Type-safe field metadata for formwright
//!
//! Small closed sets used by the field registry: the field type tags,
//! input flavours, layout spans and content publishing states. Each one
//! round-trips through strings with strum so config files and the CLI can
//! name them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Tag naming every field kind the registry knows about.
///
/// Mirrors the variants of [`crate::field::FieldKind`] without their
/// payloads, so it can be listed, parsed and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Input,
    Textarea,
    Select,
    MultiSelect,
    File,
    RichText,
    IconSelect,
    CustomArray,
    DynamicSection,
    CustomComponent,
}

impl FieldType {
    /// Whether values of this type are arrays of sub-documents
    pub fn is_array_section(&self) -> bool {
        matches!(self, Self::CustomArray | Self::DynamicSection)
    }

    /// Whether the console edits this type by typing characters
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Input | Self::Textarea | Self::RichText)
    }
}

/// Flavour of a single-line input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Email,
    Url,
    Number,
    Password,
    Date,
}

impl InputType {
    /// Passwords are masked when rendered
    pub fn is_masked(&self) -> bool {
        matches!(self, Self::Password)
    }
}

/// How much of the row a field occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ColumnSpan {
    #[default]
    Full,
    Half,
    Third,
}

impl ColumnSpan {
    /// Width as a percentage of the content area
    pub fn percent(&self) -> u16 {
        match self {
            Self::Full => 100,
            Self::Half => 50,
            Self::Third => 33,
        }
    }
}

/// Publishing state of a content document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    /// Status recorded for a submission
    pub fn for_submission(is_draft: bool) -> Self {
        if is_draft {
            Self::Draft
        } else {
            Self::Published
        }
    }
}
