//! CrudEngine: generic list/create/update/delete for one configured resource.

use crate::client::ApiClient;
use crate::config::{validate_resource, FieldKind, ResourceConfig, SelectOption};
use crate::error::{ConfigError, ConsoleError, ConsoleResult};
use crate::record::{FieldValue, Record};
use crate::service::cascade::CascadingSelect;
use crate::service::relation::RelationOptions;
use crate::service::view::{ListView, TableModel};
use crate::validation::{Form, SubmitOutcome, Validator};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DELETE_PROMPT: &str = "¿Está seguro de eliminar este registro?";

/// Where user-facing failures go (an alert, a banner, a log line).
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Yes/no gate asked before anything destructive.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmer for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Reports through `tracing` only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        warn!(message = %message, "user-facing error");
    }
}

/// Declines everything; deletes stay disabled until a real confirmer is wired.
pub struct DeclineAll;

impl Confirmer for DeclineAll {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditorMode {
    Create,
    Edit { id: FieldValue },
}

/// One open create/edit form.
pub struct EditorSession {
    pub mode: EditorMode,
    pub form: Form,
    cascades: Vec<CascadingSelect>,
    closed: bool,
}

impl EditorSession {
    pub fn is_edit(&self) -> bool {
        matches!(self.mode, EditorMode::Edit { .. })
    }

    /// Set after a successful submit.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn cascade(&self, field: &str) -> Option<&CascadingSelect> {
        self.cascades.iter().find(|c| c.field() == field)
    }

    /// Copy each cascading select's current leaf choice into the form. A
    /// cascade nobody has picked from leaves the form's value alone, so a
    /// stored id survives a chain that could not be rebuilt.
    pub async fn sync_cascades(&mut self) {
        for cascade in &self.cascades {
            if !cascade.is_touched().await {
                continue;
            }
            let value = cascade.value().await;
            self.form.set_field_value(cascade.field(), value);
        }
    }
}

pub struct CrudEngine {
    config: ResourceConfig,
    client: ApiClient,
    view: ListView,
    relations: RelationOptions,
    rules: Validator,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    last_error: Option<String>,
}

impl CrudEngine {
    /// Check the config and build an engine for it. No I/O.
    pub fn configure(config: ResourceConfig, client: ApiClient) -> Result<Self, ConfigError> {
        validate_resource(&config)?;
        Ok(CrudEngine {
            config,
            client,
            view: ListView::default(),
            relations: RelationOptions::new(),
            rules: Validator::new(),
            notifier: Arc::new(LogNotifier),
            confirmer: Arc::new(DeclineAll),
            last_error: None,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    /// Extra rules layered over the ones the field descriptors imply.
    pub fn with_rules(mut self, rules: Validator) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn view(&self) -> &ListView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ListView {
        &mut self.view
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Message of the last failed operation, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail(&mut self, message: String) {
        self.notifier.error(&message);
        self.last_error = Some(message);
    }

    fn item_id(&self, id: &FieldValue) -> ConsoleResult<String> {
        id.as_path_segment().ok_or_else(|| {
            ConsoleError::Validation(format!("{}: record has no {}", self.config.title, self.config.id_field))
        })
    }

    /// Fetch the collection. Failures are reported and leave the list empty.
    pub async fn list(&mut self) -> &[Record] {
        match self.client.get_records(&self.config.endpoint).await {
            Ok(items) => {
                debug!(endpoint = %self.config.endpoint, count = items.len(), "list loaded");
                self.view.set_items(items);
                self.last_error = None;
            }
            Err(e) => {
                self.view.clear();
                self.fail(format!("Error al cargar datos: {}", e.user_message()));
            }
        }
        self.view.items()
    }

    pub fn search(&mut self, term: &str) -> Vec<&Record> {
        self.view.search(term)
    }

    pub fn paginate(&mut self, page_size: usize) -> (usize, usize) {
        self.view.paginate(page_size)
    }

    pub fn table(&self) -> TableModel {
        self.view.table(&self.config)
    }

    /// POST the non-empty values, then re-list.
    pub async fn create(&mut self, values: &Record) -> ConsoleResult<Record> {
        let path = format!("{}/", self.config.endpoint);
        let body = values.without_empty().to_json();
        let result = self.client.post_json(&path, &body).await;
        self.after_save(result).await
    }

    /// PUT the non-empty values to `{endpoint}/{id}`, then re-list.
    pub async fn update(&mut self, id: &FieldValue, values: &Record) -> ConsoleResult<Record> {
        let result = match self.item_id(id) {
            Ok(id) => {
                let body = values.without_empty().to_json();
                self.client.put_item(&self.config.endpoint, &id, &body).await
            }
            Err(e) => Err(e),
        };
        self.after_save(result).await
    }

    async fn after_save(&mut self, result: ConsoleResult<serde_json::Value>) -> ConsoleResult<Record> {
        match result {
            Ok(body) => {
                self.last_error = None;
                self.list().await;
                Ok(Record::from_json(body).unwrap_or_default())
            }
            Err(e) => {
                let message = match &e {
                    ConsoleError::Api { .. } | ConsoleError::Unauthorized(_) | ConsoleError::Validation(_) => {
                        e.user_message()
                    }
                    _ => format!("Error al guardar: {}", e.user_message()),
                };
                self.fail(message);
                Err(e)
            }
        }
    }

    /// Ask the confirmer, then DELETE and re-list. `Ok(false)` when the user
    /// declined and nothing was sent.
    pub async fn delete(&mut self, id: &FieldValue) -> ConsoleResult<bool> {
        if !self.confirmer.confirm(DELETE_PROMPT) {
            debug!(endpoint = %self.config.endpoint, "delete declined");
            return Ok(false);
        }
        let result = match self.item_id(id) {
            Ok(id) => self.client.delete_item(&self.config.endpoint, &id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                self.last_error = None;
                self.list().await;
                Ok(true)
            }
            Err(e) => {
                self.fail(format!("Error al eliminar: {}", e.user_message()));
                Err(e)
            }
        }
    }

    pub async fn delete_record(&mut self, record: &Record) -> ConsoleResult<bool> {
        let id = record.get(&self.config.id_field).cloned().unwrap_or_default();
        self.delete(&id).await
    }

    /// Options for a select field; relation fields are fetched once.
    pub async fn options(&mut self, field: &str) -> Vec<SelectOption> {
        match self.config.field(field) {
            Some(descriptor) => self.relations.options_for(&self.client, descriptor).await,
            None => Vec::new(),
        }
    }

    /// Load every relation field's options, as a form does when it mounts.
    pub async fn preload_options(&mut self) {
        self.relations.preload(&self.client, &self.config.fields).await;
    }

    fn validator(&self) -> Validator {
        Validator::from_descriptors(&self.config.fields).merge(self.rules.clone())
    }

    fn blank_values(&self) -> Record {
        self.config
            .fields
            .iter()
            .map(|f| {
                let v = match f.kind {
                    FieldKind::Boolean => FieldValue::Bool(false),
                    FieldKind::Number { .. } => FieldValue::Null,
                    _ => FieldValue::from(""),
                };
                (f.name.clone(), v)
            })
            .collect()
    }

    fn cascades(&self) -> Vec<CascadingSelect> {
        self.config
            .fields
            .iter()
            .filter_map(|f| CascadingSelect::for_field(f, self.client.clone()))
            .collect()
    }

    pub async fn open_create(&self) -> EditorSession {
        let cascades = self.cascades();
        for cascade in &cascades {
            cascade.load_root().await;
        }
        EditorSession {
            mode: EditorMode::Create,
            form: Form::new(self.blank_values(), self.validator()),
            cascades,
            closed: false,
        }
    }

    /// Form over an existing record. Cascading selects are rebuilt from the
    /// stored leaf id; failing that they start from the root.
    pub async fn open_edit(&self, record: &Record) -> ConsoleResult<EditorSession> {
        let id = record
            .get(&self.config.id_field)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| {
                ConsoleError::Validation(format!("{}: record has no {}", self.config.title, self.config.id_field))
            })?;
        let cascades = self.cascades();
        for cascade in &cascades {
            let leaf = record.get(cascade.field()).cloned().unwrap_or_default();
            if leaf.is_empty() {
                cascade.load_root().await;
            } else if let Err(e) = cascade.hydrate(leaf).await {
                warn!(field = %cascade.field(), error = %e, "could not rebuild cascade from record");
                cascade.load_root().await;
            }
        }
        Ok(EditorSession {
            mode: EditorMode::Edit { id },
            form: Form::new(record.clone(), self.validator()),
            cascades,
            closed: false,
        })
    }

    /// Validate the editor's form; when valid, create or update. A backend
    /// failure is shown as the form's global error and the editor stays open.
    pub async fn submit_editor(&mut self, editor: &mut EditorSession) -> SubmitOutcome<ConsoleResult<Record>> {
        editor.sync_cascades().await;
        let Some(values) = editor.form.begin_submit() else {
            debug!(errors = ?editor.form.errors(), "form rejected before sending");
            return SubmitOutcome::Invalid;
        };
        let result = match editor.mode.clone() {
            EditorMode::Create => self.create(&values).await,
            EditorMode::Edit { id } => self.update(&id, &values).await,
        };
        editor.form.finish_submit();
        match &result {
            Ok(_) => editor.closed = true,
            Err(e) => editor.form.set_global_error(e.user_message()),
        }
        SubmitOutcome::Submitted(result)
    }
}
