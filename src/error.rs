//! Typed errors and mapping from HTTP responses.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{name}'")]
    MissingReference { kind: &'static str, name: String },
    #[error("duplicate field name: {0}")]
    DuplicateField(String),
    #[error("duplicate resource key: {0}")]
    DuplicateResource(String),
    #[error("invalid pattern for {field}: {reason}")]
    InvalidPattern { field: String, reason: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("token storage: {0}")]
    Storage(String),
    #[error("validation: {0}")]
    Validation(String),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl ConsoleError {
    /// Message meant for the person in front of the console: the server's
    /// own wording when it sent one, a short description otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Api { message, .. } => message.clone(),
            ConsoleError::Unauthorized(msg) => msg.clone(),
            ConsoleError::Transport(e) => format!("Error de conexión: {}", e),
            ConsoleError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Api { status, .. } => Some(*status),
            ConsoleError::Unauthorized(_) => Some(401),
            ConsoleError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build the error for a non-2xx response from its status and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.message())
            .unwrap_or_else(|| format!("Error {}", status));
        if status == 401 {
            ConsoleError::Unauthorized(message)
        } else {
            ConsoleError::Api { status, message }
        }
    }
}

/// Error body sent by the backend: `{ "detail": "..." }` or
/// `{ "detail": [{ "loc": [...], "msg": "..." }] }`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Items(Vec<DetailItem>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct DetailItem {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    #[serde(default)]
    pub msg: String,
}

impl ApiErrorBody {
    /// Flatten `detail` into one readable string; array items become
    /// `loc.path: msg` lines.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            ErrorDetail::Message(s) => Some(s.clone()),
            ErrorDetail::Items(items) => Some(
                items
                    .iter()
                    .map(DetailItem::to_line)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ErrorDetail::Other(_) => None,
        }
    }
}

impl DetailItem {
    fn to_line(&self) -> String {
        let loc = self
            .loc
            .iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        format!("{}: {}", loc, self.msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_array_is_joined_as_loc_lines() {
        let body = r#"{"detail":[{"loc":["body","nombre"],"msg":"too short"}]}"#;
        let err = ConsoleError::from_response(422, body);
        assert_eq!(err.user_message(), "body.nombre: too short");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn several_detail_items_become_lines() {
        let body = r#"{"detail":[{"loc":["body","a"],"msg":"x"},{"loc":["query",0],"msg":"y"}]}"#;
        let err = ConsoleError::from_response(422, body);
        assert_eq!(err.user_message(), "body.a: x\nquery.0: y");
    }

    #[test]
    fn string_detail_is_used_verbatim() {
        let err = ConsoleError::from_response(400, r#"{"detail":"Grado ya existe"}"#);
        assert_eq!(err.user_message(), "Grado ya existe");
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        let err = ConsoleError::from_response(500, "<html>oops</html>");
        assert_eq!(err.user_message(), "Error 500");
    }

    #[test]
    fn unauthorized_is_its_own_variant() {
        let err = ConsoleError::from_response(401, r#"{"detail":"Not authenticated"}"#);
        assert!(matches!(err, ConsoleError::Unauthorized(_)));
        assert_eq!(err.status(), Some(401));
    }
}
