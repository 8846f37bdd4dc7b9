//! Academic console core: configuration-driven CRUD over the school records
//! REST API, and a declarative form validator.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod service;
pub mod session;
pub mod validation;

pub use client::ApiClient;
pub use config::{
    load_from_path, validate, validate_resource, CascadeLevel, ClientConfig, ConsoleConfig, FieldDescriptor,
    FieldKind, FilterPolicy, Relation, ResourceConfig, SelectOption,
};
pub use error::{ConfigError, ConsoleError, ConsoleResult};
pub use logging::init_tracing;
pub use record::{FieldValue, Record};
pub use service::{CascadingSelect, Confirmer, CrudEngine, EditorSession, ListView, Notifier, TableModel};
pub use session::{Credentials, FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use validation::{FieldRules, Form, SubmitOutcome, Validator};
