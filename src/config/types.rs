//! Declarative resource configuration: field descriptors and the per-resource
//! `{title, endpoint, fields, display_fields, id_field}` block.

use crate::record::FieldValue;
use crate::validation::{NumberRules, TextRules};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: FieldValue,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<FieldValue>, label: impl Into<String>) -> Self {
        SelectOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

fn default_label_field() -> String {
    "nombre".into()
}

fn default_value_field() -> String {
    "id".into()
}

/// Options fetched from another resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub endpoint: String,
    #[serde(default = "default_label_field", alias = "labelField")]
    pub label_field: String,
    #[serde(default = "default_value_field", alias = "valueField")]
    pub value_field: String,
}

/// What the option filter box accepts. Caller policy, not engine policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    #[default]
    Any,
    DigitsOnly,
}

/// One level of a cascading select. Level 0 has no parent; every other
/// level is fetched with `?{parent_param}={selected parent id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadeLevel {
    pub label: String,
    pub endpoint: String,
    #[serde(default)]
    pub parent_param: Option<String>,
    pub id_field: String,
    #[serde(default = "default_label_field")]
    pub label_field: String,
    /// Field on one of this level's items holding the parent level's id.
    #[serde(default)]
    pub parent_field: Option<String>,
    /// Preselect the first option whose label contains this (case-insensitive).
    #[serde(default)]
    pub default_match: Option<String>,
}

impl CascadeLevel {
    pub fn new(label: impl Into<String>, endpoint: impl Into<String>, id_field: impl Into<String>) -> Self {
        CascadeLevel {
            label: label.into(),
            endpoint: endpoint.into(),
            parent_param: None,
            id_field: id_field.into(),
            label_field: default_label_field(),
            parent_field: None,
            default_match: None,
        }
    }

    pub fn child_of(mut self, parent_param: impl Into<String>, parent_field: impl Into<String>) -> Self {
        self.parent_param = Some(parent_param.into());
        self.parent_field = Some(parent_field.into());
        self
    }

    pub fn default_match(mut self, needle: impl Into<String>) -> Self {
        self.default_match = Some(needle.into());
        self
    }

    /// Country, department, city under `/locations`.
    pub fn location_levels() -> Vec<CascadeLevel> {
        vec![
            CascadeLevel::new("País", "/locations/countries", "id_pais").default_match("colombia"),
            CascadeLevel::new("Departamento", "/locations/departments", "id_departamento")
                .child_of("country_id", "id_pais"),
            CascadeLevel::new("Ciudad/Municipio", "/locations/cities", "id_ciudad")
                .child_of("department_id", "id_departamento"),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text {
        #[serde(default)]
        rules: TextRules,
    },
    Number {
        #[serde(default)]
        rules: NumberRules,
    },
    Date,
    Boolean,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
        #[serde(default)]
        relation: Option<Relation>,
        #[serde(default)]
        filter: FilterPolicy,
    },
    CascadingSelect {
        levels: Vec<CascadeLevel>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        FieldDescriptor {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text { rules: TextRules::default() })
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Number { rules: NumberRules::default() })
    }

    pub fn date(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub fn boolean(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Boolean)
    }

    pub fn select(name: impl Into<String>, label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select {
                options,
                relation: None,
                filter: FilterPolicy::Any,
            },
        )
    }

    pub fn relation(name: impl Into<String>, label: impl Into<String>, relation: Relation) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Select {
                options: Vec::new(),
                relation: Some(relation),
                filter: FilterPolicy::Any,
            },
        )
    }

    pub fn cascading(name: impl Into<String>, label: impl Into<String>, levels: Vec<CascadeLevel>) -> Self {
        Self::new(name, label, FieldKind::CascadingSelect { levels })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn relation_spec(&self) -> Option<&Relation> {
        match &self.kind {
            FieldKind::Select { relation, .. } => relation.as_ref(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub title: String,
    #[serde(alias = "apiEndpoint")]
    pub endpoint: String,
    #[serde(alias = "fieldConfig")]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, alias = "displayFields")]
    pub display_fields: Vec<String>,
    #[serde(alias = "idField")]
    pub id_field: String,
}

impl ResourceConfig {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column header for a display field: the descriptor's label, or the
    /// raw name when no descriptor exists.
    pub fn label_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.field(name).map(|f| f.label.as_str()).unwrap_or(name)
    }
}

/// Every configured resource, keyed by a short name (e.g. `periods`).
#[derive(Clone, Debug, Default)]
pub struct ConsoleConfig {
    pub resources: IndexMap<String, ResourceConfig>,
}

impl ConsoleConfig {
    pub fn resource(&self, key: &str) -> Option<&ResourceConfig> {
        self.resources.get(key)
    }
}

/// Where the backend lives and how long to wait for it.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Persist the session token here instead of keeping it in memory only.
    pub token_file: Option<PathBuf>,
}

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_API_URL.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            token_file: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// From `CONSOLE_API_URL`, `CONSOLE_API_TIMEOUT_MS` and `CONSOLE_TOKEN_FILE`,
    /// after loading `.env` if there is one. Unset or unparseable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("CONSOLE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let timeout_ms = std::env::var("CONSOLE_API_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let token_file = std::env::var("CONSOLE_TOKEN_FILE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        ClientConfig {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
            token_file,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
