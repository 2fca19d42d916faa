//! Upload slot planning
//!
//! Works out where every attached file of a submitted document would be
//! stored: `{collection}/{slug}/{slot}`. The upload itself is left to the
//! embedding application.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::FormConfig;
use crate::engine::form::is_visible;
use crate::engine::path::get_path;
use crate::field::{FieldKind, FormField};
use crate::tags::slugify;
use crate::value::{FileAttachment, FormValue};

/// Replace anything outside `[A-Za-z0-9._-]` with `_` and strip leading dots.
///
/// Path separators never survive, so a sanitized name cannot leave its
/// directory.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Storage name of one file: field path with dots as dashes, the position
/// when the field holds several files, then the sanitized file name.
pub fn slot_name(field_id: &str, index: Option<usize>, file_name: &str) -> String {
    let field = field_id.replace('.', "-");
    let file = sanitize_file_name(file_name);
    match index {
        Some(index) => format!("{field}-{index}-{file}"),
        None => format!("{field}-{file}"),
    }
}

/// One file and where it goes
#[derive(Debug, Clone, Serialize)]
pub struct UploadSlot {
    /// Field path, with the item position for files inside array items
    /// (`"gallery"`, `"features.2.image"`)
    pub field: String,
    pub path: String,
    pub file: Arc<FileAttachment>,
}

/// Every upload a document needs
#[derive(Debug, Clone, Serialize)]
pub struct UploadPlan {
    pub collection: String,
    pub slug: String,
    pub slots: Vec<UploadSlot>,
}

impl UploadPlan {
    /// Plan uploads for every visible file field of `data`, including file
    /// fields inside array items.
    pub fn from_data(collection: &str, slug: &str, config: &FormConfig, data: &FormValue) -> Self {
        let collection = slugify(collection);
        let slug = slugify(slug);
        let base = format!("{collection}/{slug}");
        let mut slots = Vec::new();

        for field in config.fields().filter(|f| is_visible(f, data)) {
            let value = get_path(data, &field.id);
            collect_slots(&base, &field.id, field, value, &mut slots);

            let (Some(items), Some(values)) = (field.items(), value.and_then(FormValue::as_array)) else {
                continue;
            };
            for (index, item) in values.iter().enumerate() {
                for sub in items.item_fields.iter().filter(|s| is_visible(s, item)) {
                    let key = format!("{}.{index}.{}", field.id, sub.id);
                    collect_slots(&base, &key, sub, get_path(item, &sub.id), &mut slots);
                }
            }
        }

        Self {
            collection,
            slug,
            slots,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.slots.iter().map(|s| s.file.size).sum()
    }
}

fn collect_slots(
    base: &str,
    key: &str,
    field: &FormField,
    value: Option<&FormValue>,
    slots: &mut Vec<UploadSlot>,
) {
    let FieldKind::File { multiple, .. } = &field.kind else {
        return;
    };
    let Some(value) = value else {
        return;
    };
    for (index, file) in value.attachments().into_iter().enumerate() {
        let position = multiple.then_some(index);
        slots.push(UploadSlot {
            field: key.to_string(),
            path: format!("{base}/{}", slot_name(key, position, &file.name)),
            file: Arc::clone(file),
        });
    }
}

impl fmt::Display for UploadPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slots.is_empty() {
            return writeln!(f, "No files to upload for {}/{}", self.collection, self.slug);
        }
        for slot in &self.slots {
            writeln!(f, "{:<28} {:>10}  {}", slot.field, slot.file.display_size(), slot.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormStep;
    use crate::field::{Condition, ItemsSpec};

    fn config() -> FormConfig {
        FormConfig::new(
            "p",
            "P",
            vec![FormStep::new(
                "s",
                "S",
                vec![
                    FormField::file("hero", "Hero", &["image/*"], false),
                    FormField::file("gallery", "Gallery", &[], true),
                    FormField::file("datasheet", "Datasheet", &[], false)
                        .shown_when("has_sheet", Condition::Truthy),
                    FormField::custom_array(
                        "features",
                        "Features",
                        ItemsSpec::new(vec![FormField::file("image", "Image", &[], false)]),
                    ),
                ],
            )],
        )
    }

    fn file(name: &str) -> FormValue {
        FormValue::from(FileAttachment::new(name, 2048))
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_file_name("My Photo (1).PNG"), "My_Photo__1_.PNG");
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[test]
    fn test_slot_name() {
        assert_eq!(slot_name("seo.og_image", None, "og.png"), "seo-og_image-og.png");
        assert_eq!(slot_name("gallery", Some(2), "a b.jpg"), "gallery-2-a_b.jpg");
    }

    #[test]
    fn test_plan_walks_fields_and_items() {
        let mut data = FormValue::object();
        let map = data.as_object_mut().unwrap();
        map.insert("hero".into(), file("hero.png"));
        map.insert("gallery".into(), FormValue::Array(vec![file("a.jpg"), file("b.jpg")]));
        map.insert("datasheet".into(), file("hidden.pdf"));
        map.insert(
            "features".into(),
            FormValue::Array(vec![FormValue::object(), {
                let mut item = FormValue::object();
                item.as_object_mut().unwrap().insert("image".into(), file("f.png"));
                item
            }]),
        );

        let plan = UploadPlan::from_data("Products", "Super Widget", &config(), &data);
        let paths: Vec<&str> = plan.slots.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "products/super-widget/hero-hero.png",
                "products/super-widget/gallery-0-a.jpg",
                "products/super-widget/gallery-1-b.jpg",
                "products/super-widget/features-1-image-f.png",
            ]
        );
        assert_eq!(plan.total_bytes(), 4 * 2048);
    }

    #[test]
    fn test_slots_share_attachments() {
        let mut data = FormValue::object();
        let hero = file("hero.png");
        data.as_object_mut().unwrap().insert("hero".into(), hero.clone());
        let plan = UploadPlan::from_data("c", "s", &config(), &data);
        assert!(FormValue::same_file(&hero, &FormValue::File(plan.slots[0].file.clone())));
    }
}
