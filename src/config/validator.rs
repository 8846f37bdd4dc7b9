//! Config validation: field references and per-kind consistency.

use crate::config::{ConsoleConfig, FieldKind, ResourceConfig};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate_resource(config: &ResourceConfig) -> Result<(), ConfigError> {
    if config.endpoint.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{}: endpoint is empty", config.title)));
    }
    if !config.endpoint.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{}: endpoint must start with '/' (got '{}')",
            config.title, config.endpoint
        )));
    }
    if config.id_field.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{}: id_field is empty", config.title)));
    }

    let mut names = HashSet::new();
    for field in &config.fields {
        if field.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{}: field with empty name", config.title)));
        }
        if !names.insert(field.name.as_str()) {
            return Err(ConfigError::DuplicateField(field.name.clone()));
        }
        match &field.kind {
            FieldKind::Select {
                relation: Some(rel), ..
            } if rel.endpoint.trim().is_empty() => {
                return Err(ConfigError::MissingReference {
                    kind: "relation endpoint",
                    name: field.name.clone(),
                });
            }
            FieldKind::CascadingSelect { levels } => {
                if levels.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "{}: cascading select needs at least one level",
                        field.name
                    )));
                }
                for (i, level) in levels.iter().enumerate().skip(1) {
                    if level.parent_param.is_none() {
                        return Err(ConfigError::MissingReference {
                            kind: "cascade parent_param",
                            name: format!("{}[{}]", field.name, i),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    // Display columns may name backend fields that have no descriptor.
    for display in &config.display_fields {
        if display.trim().is_empty() {
            return Err(ConfigError::MissingReference {
                kind: "display field",
                name: display.clone(),
            });
        }
    }

    Ok(())
}

pub fn validate(config: &ConsoleConfig) -> Result<(), ConfigError> {
    let mut endpoints = HashSet::new();
    for (key, resource) in &config.resources {
        validate_resource(resource)?;
        if !endpoints.insert(resource.endpoint.as_str()) {
            tracing::warn!(resource = %key, endpoint = %resource.endpoint, "endpoint shared by several resources");
        }
    }
    Ok(())
}
