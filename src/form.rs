//! Form payloads and client-side validation.
//!
//! Validation runs before any request is built; a failing form never
//! reaches the transport.

#[cfg(test)]
#[path = "form_test.rs"]
mod form_test;

use serde_json::{Map, Value};

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::PortalError;
use crate::preview::human_size;
use crate::record::Record;

// =============================================================================
// FORM DATA
// =============================================================================

/// A file chosen for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Submitted form: ordered text fields plus at most one file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
    file: Option<(String, SelectedFile)>,
}

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text field, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, file: SelectedFile) -> Self {
        self.file = Some((field.into(), file));
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The attached file and the form field it is posted under.
    #[must_use]
    pub fn file(&self) -> Option<(&str, &SelectedFile)> {
        self.file.as_ref().map(|(field, file)| (field.as_str(), file))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.file.is_none()
    }

    /// Text fields as a JSON object for non-multipart submission.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }

    /// Pre-fill an edit form from an existing record.
    #[must_use]
    pub fn from_record(record: &Record, fields: &[&str]) -> Self {
        let mut form = Self::new();
        for field in fields {
            form.set(*field, record.text(field));
        }
        form
    }

    /// Parse a `key=value` assignment as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Validation`] when there is no `=` or the key is empty.
    pub fn parse_assignment(raw: &str) -> Result<(String, String), PortalError> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| PortalError::Validation(format!("expected key=value, got `{raw}`")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(PortalError::Validation(format!("missing field name in `{raw}`")));
        }
        Ok((key.to_owned(), value.to_owned()))
    }
}

// =============================================================================
// RULES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredField {
    pub field: &'static str,
    pub label: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRule {
    pub field: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub max_bytes: u64,
}

impl FileRule {
    #[must_use]
    pub fn new(field: &'static str, label: &'static str, required: bool) -> Self {
        Self { field, label, required, max_bytes: DEFAULT_MAX_UPLOAD_BYTES }
    }
}

/// Client-side checks for one resource's create/edit form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormRules {
    pub required: Vec<RequiredField>,
    pub file: Option<FileRule>,
}

impl FormRules {
    #[must_use]
    pub fn require(mut self, field: &'static str, label: &'static str) -> Self {
        self.required.push(RequiredField { field, label });
        self
    }

    #[must_use]
    pub fn with_file(mut self, rule: FileRule) -> Self {
        self.file = Some(rule);
        self
    }

    /// Apply the configured upload ceiling to the file rule, if any.
    #[must_use]
    pub fn with_max_upload(mut self, max_bytes: u64) -> Self {
        if let Some(rule) = self.file.as_mut() {
            rule.max_bytes = max_bytes;
        }
        self
    }

    /// Rules for editing an existing record: a stored file may be kept, so
    /// re-uploading is optional, but the size ceiling still applies.
    #[must_use]
    pub fn for_update(&self) -> Self {
        let mut rules = self.clone();
        if let Some(rule) = rules.file.as_mut() {
            rule.required = false;
        }
        rules
    }

    /// Check `form`; the first failing rule wins.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Validation`] naming the offending field.
    pub fn validate(&self, form: &FormData) -> Result<(), PortalError> {
        for req in &self.required {
            let filled = form.get(req.field).is_some_and(|v| !v.trim().is_empty());
            if !filled {
                return Err(PortalError::Validation(format!("{} is required", req.label)));
            }
        }

        let Some(rule) = &self.file else {
            return Ok(());
        };
        match form.file() {
            None if rule.required => Err(PortalError::Validation(format!("Please choose a file for {}", rule.label))),
            None => Ok(()),
            Some((_, file)) if file.size() > rule.max_bytes => Err(PortalError::Validation(format!(
                "{} is too large ({}); the limit is {}",
                file.name,
                human_size(file.size()),
                human_size(rule.max_bytes)
            ))),
            Some(_) => Ok(()),
        }
    }
}
