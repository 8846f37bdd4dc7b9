#![allow(dead_code)]

use academic_console::{
    ApiClient, ClientConfig, FieldDescriptor, Notifier, Relation, ResourceConfig, Session,
};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ClientConfig::new(server.uri()), Session::in_memory()).unwrap()
}

pub fn materias() -> ResourceConfig {
    ResourceConfig {
        title: "Materias".into(),
        endpoint: "/materias".into(),
        fields: vec![
            FieldDescriptor::text("nombre", "Nombre").required(),
            FieldDescriptor::text("descripcion", "Descripción"),
            FieldDescriptor::boolean("activo", "Activo"),
            FieldDescriptor::relation(
                "id_anio_lectivo",
                "Año lectivo",
                Relation {
                    endpoint: "/aniolectivo".into(),
                    label_field: "anio".into(),
                    value_field: "id_anio_lectivo".into(),
                },
            ),
        ],
        display_fields: vec!["nombre".into(), "activo".into()],
        id_field: "id_materia".into(),
    }
}

/// Keeps every message it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
