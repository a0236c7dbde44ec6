//! Per-field form state.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::guard::rules::FormSchema;

/// Payload of a form submission, field name → value.
pub type FormValues = Map<String, Value>;

/// Text a validation rule sees for a payload value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// State of one field as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldState {
    pub value: String,
    /// Set on first blur or submit; never cleared except by [`FormState::reset`].
    pub touched: bool,
    pub error: Option<String>,
}

/// Field states of one form instance, validated against its schema.
#[derive(Debug, Clone)]
pub struct FormState {
    schema: FormSchema,
    fields: BTreeMap<String, FieldState>,
}

impl FormState {
    pub fn new(schema: FormSchema) -> Self {
        let fields = schema
            .field_names()
            .map(|name| (name.to_string(), FieldState::default()))
            .collect();
        Self { schema, fields }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name)
    }

    /// Update a value; revalidates only once the field has been touched.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        let field = self.fields.entry(name.to_string()).or_default();
        field.value = value.into();
        if field.touched {
            field.error = self.schema.validate_field(name, &field.value);
        }
    }

    /// Mark a field touched and validate it.
    pub fn blur(&mut self, name: &str) {
        let field = self.fields.entry(name.to_string()).or_default();
        field.touched = true;
        field.error = self.schema.validate_field(name, &field.value);
    }

    /// Load a submitted payload, touch every field and validate all of them.
    ///
    /// Schema fields missing from the payload are validated as empty, never
    /// against a value left over from an earlier edit or submission.
    /// Returns the errors keyed by field name; empty when the form is valid.
    pub fn validate_submission(&mut self, payload: &FormValues) -> BTreeMap<String, String> {
        for name in self.schema.field_names() {
            let value = payload.get(name).map(value_text).unwrap_or_default();
            self.fields.entry(name.to_string()).or_default().value = value;
        }
        for (name, value) in payload {
            self.fields.entry(name.clone()).or_default().value = value_text(value);
        }
        self.touch_all()
    }

    /// Touch and validate every field, returning the errors found.
    pub fn touch_all(&mut self) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        for (name, field) in &mut self.fields {
            field.touched = true;
            field.error = self.schema.validate_field(name, &field.value);
            if let Some(error) = &field.error {
                errors.insert(name.clone(), error.clone());
            }
        }
        errors
    }

    /// Current errors of touched fields.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.error.clone().map(|e| (name.clone(), e)))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|field| field.error.is_none())
    }

    /// Back to pristine: empty values, untouched, no errors.
    pub fn reset(&mut self) {
        for field in self.fields.values_mut() {
            *field = FieldState::default();
        }
    }
}
