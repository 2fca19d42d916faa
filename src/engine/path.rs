//! Nested value accessor
//!
//! Addresses values inside a form document with dotted paths (`"seo.title"`).
//! Segments are always object keys: `"items.0"` looks up a key named `"0"`,
//! it does not index into an array. Array items are addressed through the
//! array helpers on the engine instead.

use crate::value::{Document, FormValue};

/// Look up the value at `path`.
///
/// Returns `None` when any segment is missing or an intermediate value is
/// not an object. An empty path returns the document itself.
pub fn get_path<'a>(doc: &'a FormValue, path: &str) -> Option<&'a FormValue> {
    if path.is_empty() {
        return Some(doc);
    }
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

/// Store `value` at `path`, creating intermediate objects as needed.
///
/// Missing or non-object intermediates (and a non-object root) are replaced
/// by empty objects. An empty path replaces the whole document.
pub fn set_path(doc: &mut FormValue, path: &str, value: FormValue) {
    if path.is_empty() {
        *doc = value;
        return;
    }

    let mut segments = path.split('.').peekable();
    let mut current = doc;
    while let Some(segment) = segments.next() {
        let map = ensure_object(current);
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(FormValue::object);
    }
}

fn ensure_object(value: &mut FormValue) -> &mut Document {
    if value.as_object().is_none() {
        *value = FormValue::object();
    }
    match value {
        FormValue::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let doc = FormValue::from(json!({ "seo": { "title": "Hi" }, "name": "x" }));
        assert_eq!(get_path(&doc, "seo.title"), Some(&FormValue::from("Hi")));
        assert_eq!(get_path(&doc, "name"), Some(&FormValue::from("x")));
        assert_eq!(get_path(&doc, "seo.missing"), None);
        assert_eq!(get_path(&doc, "name.deeper"), None);
        assert_eq!(get_path(&doc, ""), Some(&doc));
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut doc = FormValue::object();
        set_path(&mut doc, "a.b.c", FormValue::from(5i64));
        assert_eq!(doc, FormValue::from(json!({ "a": { "b": { "c": 5 } } })));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut doc = FormValue::from(json!({ "a": "scalar" }));
        set_path(&mut doc, "a.b", FormValue::from(true));
        assert_eq!(doc, FormValue::from(json!({ "a": { "b": true } })));
    }

    #[test]
    fn test_array_index_segments_are_keys() {
        let doc = FormValue::from(json!({ "items": [{ "title": "x" }] }));
        assert_eq!(get_path(&doc, "items.0.title"), None);
    }
}
