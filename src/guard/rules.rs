//! Field validation rules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// Custom predicate: returns an error message when the value is invalid.
pub type CustomRule = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Validation rules for one field, checked in a fixed order:
/// required, pattern, min length, max length, custom.
///
/// An empty value on a non-required field skips the remaining rules.
#[derive(Clone, Default)]
pub struct FieldRules {
    required: Option<String>,
    pattern: Option<(Regex, String)>,
    min_length: Option<(usize, String)>,
    max_length: Option<(usize, String)>,
    custom: Option<CustomRule>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some((pattern, message.into()));
        self
    }

    /// Minimum length in characters.
    #[must_use]
    pub fn min_length(mut self, min: usize, message: impl Into<String>) -> Self {
        self.min_length = Some((min, message.into()));
        self
    }

    /// Maximum length in characters.
    #[must_use]
    pub fn max_length(mut self, max: usize, message: impl Into<String>) -> Self {
        self.max_length = Some((max, message.into()));
        self
    }

    #[must_use]
    pub fn custom<F>(mut self, rule: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(rule));
        self
    }

    /// First failing rule's message, or `None` when the value is valid.
    pub fn check(&self, value: &str) -> Option<String> {
        if value.trim().is_empty() {
            return self.required.clone();
        }

        if let Some((pattern, message)) = &self.pattern {
            if !pattern.is_match(value) {
                return Some(message.clone());
            }
        }

        let length = value.chars().count();
        if let Some((min, message)) = &self.min_length {
            if length < *min {
                return Some(message.clone());
            }
        }
        if let Some((max, message)) = &self.max_length {
            if length > *max {
                return Some(message.clone());
            }
        }

        self.custom.as_ref().and_then(|rule| rule(value))
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required.is_some())
            .field("pattern", &self.pattern.as_ref().map(|(p, _)| p.as_str()))
            .field("min_length", &self.min_length.as_ref().map(|(n, _)| n))
            .field("max_length", &self.max_length.as_ref().map(|(n, _)| n))
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Rules for every field of a form, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: BTreeMap<String, FieldRules>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.insert(name.into(), rules);
        self
    }

    /// Names of all declared fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Validate one value against the rules of `name`.
    ///
    /// Pure; fields without rules are always valid.
    pub fn validate_field(&self, name: &str, value: &str) -> Option<String> {
        self.fields.get(name).and_then(|rules| rules.check(value))
    }
}
