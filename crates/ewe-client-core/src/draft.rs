//! Locally persisted form drafts
//!
//! A draft is the latest value of every named control in a form, stored as a
//! JSON object under `autosave_<formId>`. Forms without an id share the
//! fallback key, last writer wins.

use crate::error::{ClientError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

pub const DRAFT_KEY_PREFIX: &str = "autosave_";

/// Id used for forms that have none
pub const FALLBACK_FORM_ID: &str = "auto-save-form";

/// String key/value storage, `localStorage` in the browser
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and non-browser hosts
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Storage key for a form id, falling back to the shared key
pub fn draft_key(form_id: Option<&str>) -> String {
    let id = form_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(FALLBACK_FORM_ID);
    format!("{}{}", DRAFT_KEY_PREFIX, id)
}

/// Snapshot of a form's named values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftRecord {
    form_id: Option<String>,
    fields: BTreeMap<String, String>,
}

impl DraftRecord {
    pub fn new(form_id: Option<&str>) -> Self {
        Self {
            form_id: form_id.map(str::to_string),
            fields: BTreeMap::new(),
        }
    }

    /// Record a control's value; a later control with the same name wins
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn key(&self) -> String {
        draft_key(self.form_id.as_deref())
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    /// Parse a stored value. Non-string JSON values are kept in their JSON text form.
    pub fn from_json(form_id: Option<&str>, json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or_else(|| {
            ClientError::Serialization("draft is not a JSON object".to_string())
        })?;

        let mut record = Self::new(form_id);
        for (name, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            record.insert(name.clone(), text);
        }
        Ok(record)
    }
}

/// Reads and writes drafts through a [`KeyValueStore`]
#[derive(Debug)]
pub struct DraftStore<S> {
    store: S,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Synchronously overwrite the form's draft
    pub fn save(&self, record: &DraftRecord) -> Result<()> {
        let key = record.key();
        self.store.set(&key, &record.to_json()?)?;
        tracing::debug!(key = %key, fields = record.fields().len(), "draft saved");
        Ok(())
    }

    /// Load a draft; a malformed stored value counts as no draft
    pub fn load(&self, form_id: Option<&str>) -> Result<Option<DraftRecord>> {
        let key = draft_key(form_id);
        let Some(json) = self.store.get(&key)? else {
            return Ok(None);
        };

        match DraftRecord::from_json(form_id, &json) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "ignoring malformed draft");
                Ok(None)
            }
        }
    }

    pub fn clear(&self, form_id: Option<&str>) -> Result<()> {
        self.store.remove(&draft_key(form_id))
    }
}
