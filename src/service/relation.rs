//! Options for select fields: static lists, or lists fetched once from a
//! related resource.

use crate::client::ApiClient;
use crate::config::{FieldDescriptor, FieldKind, FilterPolicy, Relation, SelectOption};
use crate::record::Record;
use std::collections::HashMap;

/// Per-engine option cache. Each relation field is fetched at most once
/// until [`RelationOptions::invalidate`].
#[derive(Debug, Default)]
pub struct RelationOptions {
    loaded: HashMap<String, Vec<SelectOption>>,
}

impl RelationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for `field`: static options, or the related resource's items
    /// mapped through `label_field`/`value_field`. Fetch failures are logged
    /// and leave the field without options (not cached, so the next call
    /// tries again).
    pub async fn options_for(&mut self, client: &ApiClient, field: &FieldDescriptor) -> Vec<SelectOption> {
        let (static_options, relation) = match &field.kind {
            FieldKind::Select { options, relation, .. } => (options, relation),
            _ => return Vec::new(),
        };
        let Some(relation) = relation else {
            return static_options.clone();
        };
        if let Some(cached) = self.loaded.get(&field.name) {
            return cached.clone();
        }
        match client.get_records(&relation.endpoint).await {
            Ok(items) => {
                let options = map_options(&items, relation);
                tracing::debug!(field = %field.name, count = options.len(), "relation options loaded");
                self.loaded.insert(field.name.clone(), options.clone());
                options
            }
            Err(e) => {
                tracing::warn!(field = %field.name, endpoint = %relation.endpoint, error = %e, "relation options failed to load");
                Vec::new()
            }
        }
    }

    /// Load every relation field of a resource up front.
    pub async fn preload(&mut self, client: &ApiClient, fields: &[FieldDescriptor]) {
        for field in fields.iter().filter(|f| f.relation_spec().is_some()) {
            self.options_for(client, field).await;
        }
    }

    pub fn cached(&self, field: &str) -> Option<&[SelectOption]> {
        self.loaded.get(field).map(Vec::as_slice)
    }

    pub fn invalidate(&mut self) {
        self.loaded.clear();
    }
}

pub fn map_options(items: &[Record], relation: &Relation) -> Vec<SelectOption> {
    items
        .iter()
        .map(|item| SelectOption {
            value: item.get(&relation.value_field).cloned().unwrap_or_default(),
            label: item
                .get(&relation.label_field)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// Filter box input after applying the field's policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionFilter {
    pub text: String,
    /// The policy removed something the user typed.
    pub rejected_input: bool,
}

impl OptionFilter {
    pub fn new(raw: &str, policy: FilterPolicy) -> Self {
        match policy {
            FilterPolicy::Any => OptionFilter {
                text: raw.to_string(),
                rejected_input: false,
            },
            FilterPolicy::DigitsOnly => {
                let text: String = raw.chars().filter(char::is_ascii_digit).collect();
                let rejected_input = text.len() != raw.len();
                OptionFilter { text, rejected_input }
            }
        }
    }
}

/// Options whose label contains `filter`, case-insensitively. Empty filter
/// keeps all.
pub fn filter_options<'a>(options: &'a [SelectOption], filter: &str) -> Vec<&'a SelectOption> {
    if filter.is_empty() {
        return options.iter().collect();
    }
    let needle = filter.to_lowercase();
    options
        .iter()
        .filter(|o| o.label.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use serde_json::json;

    #[test]
    fn maps_items_through_relation_fields() {
        let items = vec![
            Record::from_json(json!({"id_anio_lectivo": 4, "anio": 2024})).unwrap(),
            Record::from_json(json!({"id_anio_lectivo": 5, "anio": 2025})).unwrap(),
        ];
        let rel = Relation {
            endpoint: "/aniolectivo".into(),
            label_field: "anio".into(),
            value_field: "id_anio_lectivo".into(),
        };
        let opts = map_options(&items, &rel);
        assert_eq!(opts[1], SelectOption::new(FieldValue::Int(5), "2025"));
    }

    #[test]
    fn filter_narrows_by_label() {
        let opts = vec![
            SelectOption::new(1i64, "Sexto A"),
            SelectOption::new(2i64, "Sexto B"),
            SelectOption::new(3i64, "Once"),
        ];
        assert_eq!(filter_options(&opts, "sexto").len(), 2);
        assert_eq!(filter_options(&opts, "").len(), 3);
        assert!(filter_options(&opts, "zzz").is_empty());
    }

    #[test]
    fn digits_only_policy_strips_and_flags() {
        let f = OptionFilter::new("12a3", FilterPolicy::DigitsOnly);
        assert_eq!(f.text, "123");
        assert!(f.rejected_input);
        let f = OptionFilter::new("12a3", FilterPolicy::Any);
        assert_eq!(f.text, "12a3");
        assert!(!f.rejected_input);
    }
}
