//! Form configuration and document files
//!
//! Saves and loads configurations and documents through real files in a
//! temporary directory.

use formwright::config::{ConfigWarning, FormConfig, load_document, save_document};
use formwright::engine::{DiscardSubmit, FormEngine};
use formwright::field::FieldKind;
use formwright::presets::Preset;
use formwright::value::{FileAttachment, FormValue};
use serde_json::json;
use std::fs;
use strum::IntoEnumIterator;
use tempfile::TempDir;

#[test]
fn test_every_preset_round_trips_through_a_file() {
    let dir = TempDir::new().unwrap();
    for preset in Preset::iter() {
        let path = dir.path().join(format!("{preset}.json"));
        let config = preset.config().unwrap();
        config.save_to_file(&path).unwrap();

        let loaded = FormConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.id, config.id);
        assert_eq!(loaded.steps.len(), config.steps.len());
        let ids: Vec<_> = loaded.fields().map(|f| f.id.clone()).collect();
        let expected: Vec<_> = config.fields().map(|f| f.id.clone()).collect();
        assert_eq!(ids, expected);
        assert!(loaded.validate().is_ok());
    }
}

#[test]
fn test_hand_written_config_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("event.json");
    fs::write(
        &path,
        json!({
            "id": "event",
            "title": "Event",
            "steps": [{
                "id": "details",
                "title": "Details",
                "fields": [
                    { "id": "name", "label": "Name", "type": "input", "rules": { "required": true } },
                    { "id": "kind", "label": "Kind", "type": "select",
                      "options": [{ "value": "live", "label": "Live" }, { "value": "online", "label": "Online" }] },
                    { "id": "venue", "label": "Venue", "type": "textarea", "rows": 2,
                      "depends_on": "kind", "show_if": { "equals": "live" } },
                    { "id": "speakers", "label": "Speakers", "type": "custom-array",
                      "item_fields": [{ "id": "name", "label": "Name", "type": "input" }],
                      "max_items": 3 }
                ]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let config = FormConfig::load_from_file(&path).unwrap();
    assert!(config.lint().is_empty());
    assert!(matches!(config.field("venue").unwrap().kind, FieldKind::Textarea { rows: 2 }));
    assert_eq!(config.field("speakers").unwrap().items().unwrap().max_items, Some(3));

    let mut engine = FormEngine::new(config, DiscardSubmit);
    assert!(!engine.is_field_visible("venue"));
    engine.handle_input_change("kind", "live");
    assert!(engine.is_field_visible("venue"));
    assert_eq!(engine.data(), &FormValue::from(json!({ "kind": "live" })));
}

#[test]
fn test_invalid_pattern_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"{"id":"b","title":"B","steps":[{"id":"s","title":"S","fields":[
            {"id":"slug","label":"Slug","type":"input","rules":{"pattern":"("}}]}]}"#,
    )
    .unwrap();

    let err = FormConfig::load_from_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("invalid pattern"));
}

#[test]
fn test_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.json");
    let err = FormConfig::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn test_lint_reports_unknown_dependency() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("typo.json");
    fs::write(
        &path,
        r#"{"id":"t","title":"T","steps":[{"id":"s","title":"S","fields":[
            {"id":"a","label":"A","type":"input"},
            {"id":"b","label":"B","type":"input","depends_on":"aa"}]}]}"#,
    )
    .unwrap();

    let config = FormConfig::load_from_file(&path).unwrap();
    assert_eq!(
        config.lint(),
        vec![ConfigWarning::UnknownDependency {
            field: "b".to_string(),
            depends_on: "aa".to_string(),
        }]
    );
    // Missing paths stay lenient: the form still validates
    assert!(config.validate().is_ok());
}

#[test]
fn test_saved_document_loads_back_with_attachments() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("draft.json");
    let mut data = FormValue::from(json!({ "name": "Widget", "gallery": [] }));
    if let Some(map) = data.as_object_mut() {
        map.insert("hero".to_string(), FileAttachment::new("hero.png", 512).into());
    }

    save_document(&path, &data, true).unwrap();
    let loaded = load_document(&path).unwrap();

    let hero = loaded.as_object().unwrap().get("hero").unwrap();
    let file = hero.as_file().unwrap();
    assert_eq!(file.name, "hero.png");
    assert_eq!(file.size, 512);
    assert_eq!(loaded.as_object().unwrap().get("_draft"), Some(&FormValue::Bool(true)));
    assert_eq!(
        loaded.as_object().unwrap().get("status"),
        Some(&FormValue::from("draft"))
    );
}

#[test]
fn test_document_resumes_in_engine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("post.json");
    fs::write(&path, json!({ "title": "Hello", "slug": "hello" }).to_string()).unwrap();

    let engine = FormEngine::new(Preset::Post.config().unwrap(), DiscardSubmit)
        .with_data(load_document(&path).unwrap());
    assert_eq!(engine.value("title"), Some(&FormValue::from("Hello")));
    assert!(engine.errors().is_empty());
}
