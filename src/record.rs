//! Open record shape: an ordered map of field name to a small tagged union of
//! scalar values. Any resource, any fields.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Non-scalar JSON from the server. Carried through untouched, never searched.
    Nested(Value),
}

impl FieldValue {
    pub fn from_json(v: Value) -> Self {
        match v {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else {
                    n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null)
                }
            }
            Value::String(s) => FieldValue::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => FieldValue::Nested(other),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Nested(v) => v.clone(),
        }
    }

    /// Null or the empty string. `0` and `false` are values.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldValue::Nested(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of the value: numbers as-is, text parsed after
    /// trimming. `None` when the value is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Value as it appears in an id path segment or a query string.
    pub fn as_path_segment(&self) -> Option<String> {
        match self {
            FieldValue::Null | FieldValue::Nested(_) => None,
            FieldValue::Text(s) if s.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Nested(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(FieldValue::from_json(Value::deserialize(deserializer)?))
    }
}

/// One entity instance as returned by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object bodies become records; anything else is `None`.
    pub fn from_json(v: Value) -> Option<Self> {
        match v {
            Value::Object(map) => Some(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from_json(v)))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy without `Null` and empty-string entries: what gets sent on
    /// create/update.
    pub fn without_empty(&self) -> Record {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// True when any scalar value, stringified and lowercased, contains
    /// `needle_lower`.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.fields
            .values()
            .filter(|v| v.is_scalar())
            .any(|v| v.to_string().to_lowercase().contains(needle_lower))
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Convert a list response into records. Non-array bodies are treated as an
/// empty collection; non-object items are skipped.
pub fn records_from_json(v: Value) -> Vec<Record> {
    match v {
        Value::Array(items) => items.into_iter().filter_map(Record::from_json).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_keeps_order_and_types() {
        let r = Record::from_json(json!({"id": 3, "nombre": "Uno", "activo": true, "nota": 4.5, "x": null}))
            .unwrap();
        let keys: Vec<_> = r.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["id", "nombre", "activo", "nota", "x"]);
        assert_eq!(r.get("id"), Some(&FieldValue::Int(3)));
        assert_eq!(r.get("nota"), Some(&FieldValue::Float(4.5)));
        assert_eq!(r.get("x"), Some(&FieldValue::Null));
    }

    #[test]
    fn without_empty_drops_null_and_blank() {
        let mut r = Record::new();
        r.insert("nombre", "Grado 1");
        r.insert("descripcion", "");
        r.insert("codigo", FieldValue::Null);
        r.insert("cupo", 0i64);
        r.insert("activo", false);
        let cleaned = r.without_empty();
        assert_eq!(cleaned.len(), 3);
        assert!(cleaned.get("descripcion").is_none());
        assert!(cleaned.get("codigo").is_none());
        assert_eq!(cleaned.get("cupo"), Some(&FieldValue::Int(0)));
    }

    #[test]
    fn nested_values_are_not_searched() {
        let r = Record::from_json(json!({"id": 1, "grupo": {"nombre": "Item"}})).unwrap();
        assert!(!r.matches("item"));
        assert!(r.matches("1"));
    }

    #[test]
    fn non_array_list_body_is_empty() {
        assert!(records_from_json(json!({"data": []})).is_empty());
        assert_eq!(records_from_json(json!([{"id": 1}, 7])).len(), 1);
    }

    #[test]
    fn serializes_back_to_the_same_json() {
        let v = json!({"id": 1, "grupo": {"nombre": "A"}, "activo": false});
        let r: Record = serde_json::from_value(v.clone()).unwrap();
        assert_eq!(serde_json::to_value(&r).unwrap(), v);
    }
}
