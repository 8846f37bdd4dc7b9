//! Per-session form state driven by a [`Validator`].

use super::Validator;
use crate::record::{FieldValue, Record};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::future::Future;

/// Result of [`Form::submit`]: the handler's own output, or `Invalid` when
/// validation stopped the submission before the handler ran.
#[derive(Debug, PartialEq)]
pub enum SubmitOutcome<T> {
    Invalid,
    Submitted(T),
}

impl<T> SubmitOutcome<T> {
    pub fn is_invalid(&self) -> bool {
        matches!(self, SubmitOutcome::Invalid)
    }
}

#[derive(Clone, Debug)]
pub struct Form {
    validator: Validator,
    initial: Record,
    values: Record,
    errors: IndexMap<String, String>,
    touched: HashSet<String>,
    is_submitting: bool,
    global_error: Option<String>,
}

impl Form {
    pub fn new(initial: Record, validator: Validator) -> Self {
        Form {
            validator,
            values: initial.clone(),
            initial,
            errors: IndexMap::new(),
            touched: HashSet::new(),
            is_submitting: false,
            global_error: None,
        }
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    pub fn value(&self, name: &str) -> FieldValue {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    /// Error not tied to a single field, e.g. the backend rejecting a save.
    pub fn global_error(&self) -> Option<&str> {
        self.global_error.as_deref()
    }

    pub fn set_global_error(&mut self, message: impl Into<String>) {
        self.global_error = Some(message.into());
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn validate_field(&self, name: &str, value: &FieldValue) -> String {
        self.validator.validate_field(name, value)
    }

    /// Re-check every ruled field against the current values, replacing the
    /// whole error map.
    pub fn validate_all(&mut self) -> bool {
        let mut errors = IndexMap::new();
        for name in self.validator.names() {
            let msg = self.validator.validate_field(name, &self.value(name));
            if !msg.is_empty() {
                errors.insert(name.clone(), msg);
            }
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    pub fn on_change(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.values.insert(name, value);
        if self.touched.contains(name) {
            self.revalidate(name);
        }
    }

    pub fn on_blur(&mut self, name: &str) {
        self.touched.insert(name.to_string());
        self.revalidate(name);
    }

    fn revalidate(&mut self, name: &str) {
        let msg = self.validator.validate_field(name, &self.value(name));
        if msg.is_empty() {
            self.errors.shift_remove(name);
        } else {
            self.errors.insert(name.to_string(), msg);
        }
    }

    /// Set a value without validating, regardless of touched state.
    pub fn set_field_value(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.values.insert(name, value);
    }

    /// Show `message` on a field. It stays until that field is validated again.
    pub fn set_field_error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.insert(name.to_string(), message.into());
    }

    pub fn set_values(&mut self, values: Record) {
        self.values = values;
    }

    /// First half of a submission: mark every ruled field touched and
    /// validate. Returns the values to send when valid, and flags the form as
    /// submitting until [`Form::finish_submit`].
    pub fn begin_submit(&mut self) -> Option<Record> {
        self.touched.extend(self.validator.names().cloned());
        self.global_error = None;
        if !self.validate_all() {
            return None;
        }
        self.is_submitting = true;
        Some(self.values.clone())
    }

    pub fn finish_submit(&mut self) {
        self.is_submitting = false;
    }

    /// Validate, then run `handler` with the values only when everything
    /// passes. Whatever the handler returns (including its errors) is handed
    /// back to the caller as-is.
    pub async fn submit<F, Fut, T>(&mut self, handler: F) -> SubmitOutcome<T>
    where
        F: FnOnce(Record) -> Fut,
        Fut: Future<Output = T>,
    {
        let Some(values) = self.begin_submit() else {
            return SubmitOutcome::Invalid;
        };
        let out = handler(values).await;
        self.finish_submit();
        SubmitOutcome::Submitted(out)
    }

    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors.clear();
        self.touched.clear();
        self.is_submitting = false;
        self.global_error = None;
    }
}
