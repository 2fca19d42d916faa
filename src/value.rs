//! Form document model
//!
//! A form's data is an open document: nested objects and arrays of plain
//! values, plus file attachments. Attachments are held behind an `Arc` so a
//! structural `clone()` of the document copies every container but shares
//! the attachments themselves. Upload progress and anything else keyed on
//! an attachment's identity survives every edit of the surrounding document.
//!
//! Documents convert to and from `serde_json::Value`. An attachment is
//! written as a single-key object `{"$file": {...}}` so saved documents can
//! be loaded back without losing their attachments.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key under which a file attachment is encoded in JSON
pub const FILE_MARKER: &str = "$file";

/// Object payload of a [`FormValue`]
pub type Document = BTreeMap<String, FormValue>;

/// A binary attachment selected for upload.
///
/// Only metadata lives here; the bytes stay on disk until the embedding
/// application uploads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// File name as shown to the user
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type guessed from the extension
    pub content_type: String,
    /// Source location, when picked from the local filesystem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl FileAttachment {
    /// Create an attachment from metadata alone
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            name,
            size,
            content_type,
            path: None,
        }
    }

    /// Build an attachment from a file on disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut attachment = Self::new(name, metadata.len());
        attachment.path = Some(path.to_path_buf());
        Ok(attachment)
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Check the attachment against an accept list such as `["image/*", ".pdf"]`.
    ///
    /// An empty list accepts everything.
    pub fn matches_accept(&self, accept: &[String]) -> bool {
        if accept.is_empty() {
            return true;
        }
        let extension = self.extension();
        accept.iter().any(|pattern| {
            let pattern = pattern.trim().to_lowercase();
            if let Some(ext) = pattern.strip_prefix('.') {
                extension.as_deref() == Some(ext)
            } else if let Some(family) = pattern.strip_suffix("/*") {
                self.content_type
                    .split('/')
                    .next()
                    .is_some_and(|top| top == family)
            } else {
                self.content_type == pattern
            }
        })
    }

    /// Human-readable size, e.g. `1.5 MB`
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", self.size, UNITS[0])
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

/// Guess a MIME type from a file name's extension
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// A value inside a form document
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<FormValue>),
    Object(Document),
    /// Shared leaf; cloning the document clones the `Arc`, not the attachment
    File(Arc<FileAttachment>),
}

impl FormValue {
    /// An empty object
    pub fn object() -> Self {
        Self::Object(Document::new())
    }

    /// An empty string
    pub fn empty_string() -> Self {
        Self::String(String::new())
    }

    /// Counts as "not filled in" for the `required` rule:
    /// null, empty string or empty array.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Loose truthiness used by visibility conditions
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::File(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<FormValue>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Document> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&Arc<FileAttachment>> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// Length used by `min_length`/`max_length`: characters of a string or
    /// items of an array.
    pub fn measured_len(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    /// The synthetic `id` of an array item, if it carries one
    pub fn item_id(&self) -> Option<&str> {
        self.as_object()
            .and_then(|map| map.get("id"))
            .and_then(FormValue::as_str)
    }

    /// Shallow merge: copy every key of `partial` onto this object.
    ///
    /// A non-object receiver is replaced by `partial` wholesale, and a
    /// non-object `partial` replaces the receiver.
    pub fn merge(&mut self, partial: FormValue) {
        match partial {
            FormValue::Object(source) => match self {
                FormValue::Object(target) => target.extend(source),
                other => *other = FormValue::Object(source),
            },
            other => *self = other,
        }
    }

    /// Every file attachment directly held by this value (a single file or
    /// an array of files).
    pub fn attachments(&self) -> Vec<&Arc<FileAttachment>> {
        match self {
            Self::File(file) => vec![file],
            Self::Array(items) => items.iter().filter_map(FormValue::as_file).collect(),
            _ => Vec::new(),
        }
    }

    /// Short single-line text for summaries and list rows
    pub fn display_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "Yes".to_string(),
            Self::Bool(false) => "No".to_string(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.clone(),
            Self::Array(items) => items
                .iter()
                .map(FormValue::display_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Self::Object(map) => format!("{{{} fields}}", map.len()),
            Self::File(file) => file.name.clone(),
        }
    }

    /// Convert to plain JSON; attachments become `{"$file": {...}}`
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(FormValue::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::File(file) => {
                let mut map = Map::new();
                map.insert(
                    FILE_MARKER.to_string(),
                    serde_json::to_value(file.as_ref()).unwrap_or(Value::Null),
                );
                Value::Object(map)
            }
        }
    }

    /// Whether both values are the very same attachment (not just equal)
    pub fn same_file(a: &FormValue, b: &FormValue) -> bool {
        match (a, b) {
            (Self::File(x), Self::File(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(FormValue::from).collect()),
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(raw) = map.get(FILE_MARKER) {
                        if let Ok(file) = serde_json::from_value::<FileAttachment>(raw.clone()) {
                            return Self::File(Arc::new(file));
                        }
                    }
                }
                Self::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, FormValue::from(v)))
                        .collect(),
                )
            }
        }
    }
}

impl From<&FormValue> for Value {
    fn from(value: &FormValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FormValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<Vec<FormValue>> for FormValue {
    fn from(items: Vec<FormValue>) -> Self {
        Self::Array(items)
    }
}

impl From<Document> for FormValue {
    fn from(map: Document) -> Self {
        Self::Object(map)
    }
}

impl From<FileAttachment> for FormValue {
    fn from(file: FileAttachment) -> Self {
        Self::File(Arc::new(file))
    }
}

impl From<Arc<FileAttachment>> for FormValue {
    fn from(file: Arc<FileAttachment>) -> Self {
        Self::File(file)
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FormValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values() {
        assert!(FormValue::Null.is_blank());
        assert!(FormValue::from("").is_blank());
        assert!(FormValue::Array(vec![]).is_blank());
        assert!(!FormValue::from(" ").is_blank());
        assert!(!FormValue::from(0i64).is_blank());
        assert!(!FormValue::from(false).is_blank());
    }

    #[test]
    fn test_clone_shares_attachments() {
        let doc = FormValue::from(json!({ "title": "Pump" }));
        let mut doc = doc;
        doc.as_object_mut()
            .unwrap()
            .insert("brochure".into(), FileAttachment::new("a.pdf", 10).into());

        let copy = doc.clone();
        let original = &doc.as_object().unwrap()["brochure"];
        let cloned = &copy.as_object().unwrap()["brochure"];
        assert!(FormValue::same_file(original, cloned));
    }

    #[test]
    fn test_json_round_trip_keeps_files() {
        let mut map = Document::new();
        map.insert("cover".into(), FileAttachment::new("cover.png", 2048).into());
        map.insert("title".into(), "Hello".into());
        let value = FormValue::Object(map);

        let text = serde_json::to_string(&value).unwrap();
        let back: FormValue = serde_json::from_str(&text).unwrap();
        assert_eq!(value, back);
        assert!(back.as_object().unwrap()["cover"].as_file().is_some());
    }

    #[test]
    fn test_merge_objects() {
        let mut item = FormValue::from(json!({ "id": "a", "title": "Old", "icon": "bolt" }));
        item.merge(FormValue::from(json!({ "title": "New" })));
        assert_eq!(item, FormValue::from(json!({ "id": "a", "title": "New", "icon": "bolt" })));
    }

    #[test]
    fn test_accept_patterns() {
        let png = FileAttachment::new("photo.PNG", 10);
        assert!(png.matches_accept(&["image/*".to_string()]));
        assert!(png.matches_accept(&[".png".to_string()]));
        assert!(!png.matches_accept(&["application/pdf".to_string()]));
        assert!(png.matches_accept(&[]));
    }

    #[test]
    fn test_display_size() {
        assert_eq!(FileAttachment::new("a", 512).display_size(), "512 B");
        assert_eq!(FileAttachment::new("a", 1536).display_size(), "1.5 KB");
    }

    #[test]
    fn test_measured_len_counts_chars() {
        assert_eq!(FormValue::from("héllo").measured_len(), Some(5));
        assert_eq!(FormValue::from(json!([1, 2])).measured_len(), Some(2));
        assert_eq!(FormValue::from(3i64).measured_len(), None);
    }
}
