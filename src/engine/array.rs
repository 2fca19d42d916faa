//! Array section controller
//!
//! Binds one custom-array or dynamic-section field to the engine's array
//! helpers and enforces the field's item bounds. The most recently added
//! item is remembered so the console can highlight it.

use tracing::debug;

use crate::engine::form::{FormEngine, ItemKey, new_item_id};
use crate::error::{FormError, Result};
use crate::field::ItemsSpec;
use crate::value::{Document, FormValue};

#[derive(Debug, Clone)]
pub struct ArraySection {
    field_id: String,
    spec: ItemsSpec,
    last_added: Option<String>,
}

impl ArraySection {
    /// Controller for the array field `id`.
    ///
    /// Fails with [`FormError::UnknownField`] when `id` is not declared or is
    /// not an array kind.
    pub fn for_field(engine: &FormEngine, id: &str) -> Result<Self> {
        let spec = engine
            .field(id)
            .and_then(|f| f.items())
            .ok_or_else(|| FormError::unknown_field(id))?;
        Ok(Self {
            field_id: id.to_string(),
            spec: spec.clone(),
            last_added: None,
        })
    }

    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn spec(&self) -> &ItemsSpec {
        &self.spec
    }

    pub fn len(&self, engine: &FormEngine) -> usize {
        engine
            .value(&self.field_id)
            .and_then(FormValue::as_array)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, engine: &FormEngine) -> bool {
        self.len(engine) == 0
    }

    pub fn can_add(&self, engine: &FormEngine) -> bool {
        self.spec.max_items.is_none_or(|max| self.len(engine) < max)
    }

    pub fn can_remove(&self, engine: &FormEngine) -> bool {
        self.len(engine) > self.spec.min_items
    }

    /// Fresh item: every sub-field at its empty value plus a synthetic id
    pub fn default_item(&self) -> FormValue {
        let mut item = Document::new();
        item.insert("id".to_string(), FormValue::String(new_item_id()));
        for sub in &self.spec.item_fields {
            item.insert(sub.id.clone(), sub.empty_value());
        }
        FormValue::Object(item)
    }

    /// Append a default item. Returns its id, or `None` at the maximum.
    pub fn add(&mut self, engine: &mut FormEngine) -> Result<Option<String>> {
        if !self.can_add(engine) {
            debug!(field = %self.field_id, "Add ignored at max_items");
            return Ok(None);
        }
        let id = engine.add_to_array_field(&self.field_id, self.default_item())?;
        self.last_added = id.clone();
        Ok(id)
    }

    /// Remove the item at `key` unless that would go below `min_items`
    pub fn remove(&mut self, engine: &mut FormEngine, key: impl Into<ItemKey>) -> Result<bool> {
        if !self.can_remove(engine) {
            debug!(field = %self.field_id, "Remove refused at min_items");
            return Ok(false);
        }
        let key = key.into();
        if let (ItemKey::Id(id), Some(last)) = (&key, &self.last_added) {
            if id == last {
                self.last_added = None;
            }
        }
        engine.remove_from_array_field(&self.field_id, key)
    }

    /// Set one sub-field of one item
    pub fn update_item_field(
        &self,
        engine: &mut FormEngine,
        key: impl Into<ItemKey>,
        sub_field: &str,
        value: impl Into<FormValue>,
    ) -> Result<bool> {
        let mut partial = Document::new();
        partial.insert(sub_field.to_string(), value.into());
        engine.update_array_field_item(&self.field_id, key, FormValue::Object(partial))
    }

    /// Id of the item added last, while it is highlighted
    pub fn last_added(&self) -> Option<&str> {
        self.last_added.as_deref()
    }

    /// Display title of the item at `index`, e.g. "Feature 2"
    pub fn item_title(&self, index: usize) -> String {
        let noun = self.spec.item_label.as_deref().unwrap_or("Item");
        format!("{noun} {}", index + 1)
    }
}
