//! Load resource configs from JSON on disk.
//!
//! Either a single file holding `{ "<key>": { ...resource... }, ... }`, or a
//! directory with one `<key>.json` file per resource.

use crate::config::{validate, ConsoleConfig, ResourceConfig};
use crate::error::ConfigError;
use indexmap::IndexMap;
use std::path::Path;

pub fn parse_resource(json: &str) -> Result<ResourceConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub fn parse_console(json: &str) -> Result<ConsoleConfig, ConfigError> {
    let resources: IndexMap<String, ResourceConfig> =
        serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
    let config = ConsoleConfig { resources };
    validate(&config)?;
    Ok(config)
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ConsoleConfig, ConfigError> {
    let path = path.as_ref();
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    if meta.is_file() {
        let text = read(path).await?;
        return parse_console(&text);
    }

    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?
    {
        let p = entry.path();
        if p.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(p);
        }
    }
    files.sort();

    let mut resources = IndexMap::new();
    for file in files {
        let key = file
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::Load(format!("bad file name: {}", file.display())))?
            .to_string();
        let resource = parse_resource(&read(&file).await?)
            .map_err(|e| ConfigError::Load(format!("{}: {}", file.display(), e)))?;
        tracing::debug!(resource = %key, endpoint = %resource.endpoint, "loaded resource config");
        if resources.insert(key.clone(), resource).is_some() {
            return Err(ConfigError::DuplicateResource(key));
        }
    }

    let config = ConsoleConfig { resources };
    validate(&config)?;
    Ok(config)
}

async fn read(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldKind, FilterPolicy};

    const GRADES: &str = r#"{
        "title": "Grupos",
        "apiEndpoint": "/grupos",
        "idField": "id_grupo",
        "fieldConfig": [
            { "name": "nombre", "label": "Nombre", "type": "text", "required": true,
              "rules": { "min_length": { "value": 2, "message": "Mínimo 2" } } },
            { "name": "id_grado", "label": "Grado", "type": "select",
              "relation": { "endpoint": "/grados", "labelField": "nombre_grado", "valueField": "id_grado" },
              "filter": "digits_only" },
            { "name": "cupo", "label": "Cupo", "type": "number",
              "rules": { "min": { "value": 1, "message": "Al menos 1" } } },
            { "name": "activo", "label": "Activo", "type": "boolean" }
        ],
        "displayFields": ["nombre", "cupo", "activo"]
    }"#;

    #[test]
    fn parses_camel_case_resource_json() {
        let r = parse_resource(GRADES).unwrap();
        assert_eq!(r.endpoint, "/grupos");
        assert_eq!(r.id_field, "id_grupo");
        assert_eq!(r.fields.len(), 4);
        assert!(r.fields[0].required);
        match &r.fields[1].kind {
            FieldKind::Select { relation: Some(rel), filter, .. } => {
                assert_eq!(rel.label_field, "nombre_grado");
                assert_eq!(rel.value_field, "id_grado");
                assert_eq!(*filter, FilterPolicy::DigitsOnly);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(r.label_for("cupo"), "Cupo");
        assert_eq!(r.label_for("creado"), "creado");
    }

    #[test]
    fn relation_fields_default_to_nombre_and_id() {
        let json = r#"{"title":"x","endpoint":"/x","id_field":"id","fields":[
            {"name":"a","label":"A","type":"select","relation":{"endpoint":"/a"}}]}"#;
        let r = parse_resource(json).unwrap();
        let rel = r.fields[0].relation_spec().unwrap();
        assert_eq!(rel.label_field, "nombre");
        assert_eq!(rel.value_field, "id");
    }

    #[tokio::test]
    async fn loads_a_directory_of_resources() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("groups.json"), GRADES).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();
        let config = load_from_path(dir.path()).await.unwrap();
        assert_eq!(config.resources.len(), 1);
        assert_eq!(config.resource("groups").unwrap().title, "Grupos");
    }

    #[tokio::test]
    async fn single_file_is_keyed_by_resource() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("console.json");
        tokio::fs::write(&file, format!(r#"{{"groups": {}}}"#, GRADES)).await.unwrap();
        let config = load_from_path(&file).await.unwrap();
        assert!(config.resource("groups").is_some());
    }

    #[tokio::test]
    async fn missing_path_is_a_load_error() {
        let err = load_from_path("/definitely/not/here").await.unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
