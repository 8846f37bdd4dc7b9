//! Per-field rule definitions. Rules are closed per kind: text fields carry
//! length/pattern limits, number fields carry bounds.

use crate::error::ConfigError;
use crate::record::FieldValue;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Message shown when a required field is left empty and no message was configured.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "Este campo es requerido";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limit<T> {
    pub value: T,
    pub message: String,
}

impl<T> Limit<T> {
    pub fn new(value: T, message: impl Into<String>) -> Self {
        Limit {
            value,
            message: message.into(),
        }
    }
}

/// Compiled regular expression plus the message reported on mismatch.
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: Regex,
    message: String,
}

impl Pattern {
    pub fn new(source: &str, message: impl Into<String>) -> Result<Self, ConfigError> {
        let regex = Regex::new(source).map_err(|e| ConfigError::InvalidPattern {
            field: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Pattern {
            regex,
            message: message.into(),
        })
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.message == other.message
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Limit::new(self.regex.as_str(), self.message.as_str()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Limit::<String>::deserialize(deserializer)?;
        Pattern::new(&raw.value, raw.message).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Limit<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Limit<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
}

impl TextRules {
    pub fn min_length(mut self, value: usize, message: impl Into<String>) -> Self {
        self.min_length = Some(Limit::new(value, message));
        self
    }

    pub fn max_length(mut self, value: usize, message: impl Into<String>) -> Self {
        self.max_length = Some(Limit::new(value, message));
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min_length.is_none() && self.max_length.is_none() && self.pattern.is_none()
    }

    fn check(&self, value: &FieldValue) -> Option<String> {
        let s = value.to_string();
        let len = s.chars().count();
        if let Some(min) = &self.min_length {
            if len < min.value {
                return Some(min.message.clone());
            }
        }
        if let Some(max) = &self.max_length {
            if len > max.value {
                return Some(max.message.clone());
            }
        }
        if let Some(p) = &self.pattern {
            if !p.is_match(&s) {
                return Some(p.message.clone());
            }
        }
        None
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Limit<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Limit<f64>>,
}

impl NumberRules {
    pub fn min(mut self, value: f64, message: impl Into<String>) -> Self {
        self.min = Some(Limit::new(value, message));
        self
    }

    pub fn max(mut self, value: f64, message: impl Into<String>) -> Self {
        self.max = Some(Limit::new(value, message));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    // Values that do not read as numbers are left to `custom` rules.
    fn check(&self, value: &FieldValue) -> Option<String> {
        let n = value.as_f64()?;
        if let Some(min) = &self.min {
            if n < min.value {
                return Some(min.message.clone());
            }
        }
        if let Some(max) = &self.max {
            if n > max.value {
                return Some(max.message.clone());
            }
        }
        None
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Constraint {
    #[default]
    None,
    Text(TextRules),
    Number(NumberRules),
}

pub type CustomRule = Arc<dyn Fn(&FieldValue) -> Option<String> + Send + Sync>;

/// Everything checked for one field, evaluated in a fixed order.
#[derive(Clone, Default)]
pub struct FieldRules {
    pub required: Option<String>,
    pub constraint: Constraint,
    pub custom: Option<CustomRule>,
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("constraint", &self.constraint)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    pub fn text(mut self, rules: TextRules) -> Self {
        self.constraint = Constraint::Text(rules);
        self
    }

    pub fn number(mut self, rules: NumberRules) -> Self {
        self.constraint = Constraint::Number(rules);
        self
    }

    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue) -> Option<String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(f));
        self
    }

    /// Overlay `other` on top of these rules: its `required` message and
    /// constraint win. Custom checks chain, these rules' first.
    pub fn merge(mut self, other: FieldRules) -> Self {
        if other.required.is_some() {
            self.required = other.required;
        }
        if other.constraint != Constraint::None {
            self.constraint = other.constraint;
        }
        self.custom = match (self.custom.take(), other.custom) {
            (Some(base), Some(over)) => {
                let chained: CustomRule = Arc::new(move |v: &FieldValue| base(v).or_else(|| over(v)));
                Some(chained)
            }
            (base, over) => over.or(base),
        };
        self
    }

    /// First failing rule's message, or `None` when the value passes.
    /// Order: required, then (skipping the rest for empty values) length,
    /// pattern, bounds, custom.
    pub fn check(&self, value: &FieldValue) -> Option<String> {
        if value.is_empty() {
            return self.required.clone();
        }
        let failed = match &self.constraint {
            Constraint::None => None,
            Constraint::Text(t) => t.check(value),
            Constraint::Number(n) => n.check(value),
        };
        if failed.is_some() {
            return failed;
        }
        self.custom.as_ref().and_then(|f| f(value))
    }
}
