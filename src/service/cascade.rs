//! Cascading select: a chain of dependent selects (e.g. country, department,
//! city) where each level's options are fetched for the level above's choice.
//!
//! Each level carries a generation counter. Every load bumps it and a
//! response is applied only if its generation is still the latest, so a slow
//! answer for a superseded choice never overwrites a newer one.

use crate::client::ApiClient;
use crate::config::{CascadeLevel, FieldDescriptor, FieldKind, SelectOption};
use crate::error::{ConsoleError, ConsoleResult};
use crate::record::FieldValue;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct LevelState {
    selected: Option<FieldValue>,
    options: Vec<SelectOption>,
    generation: u64,
}

#[derive(Debug)]
struct CascadeState {
    levels: Vec<LevelState>,
    /// Set once a choice comes from outside (not a default or a rebuild).
    touched: bool,
}

/// Clones share state; the lock is never held across a request.
#[derive(Clone)]
pub struct CascadingSelect {
    field: String,
    levels: Arc<Vec<CascadeLevel>>,
    client: ApiClient,
    state: Arc<Mutex<CascadeState>>,
}

impl CascadingSelect {
    pub fn new(field: impl Into<String>, levels: Vec<CascadeLevel>, client: ApiClient) -> Self {
        let state = CascadeState {
            levels: levels.iter().map(|_| LevelState::default()).collect(),
            touched: false,
        };
        CascadingSelect {
            field: field.into(),
            levels: Arc::new(levels),
            client,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// `None` unless the descriptor is a cascading select.
    pub fn for_field(field: &FieldDescriptor, client: ApiClient) -> Option<Self> {
        match &field.kind {
            FieldKind::CascadingSelect { levels } => Some(Self::new(field.name.clone(), levels.clone(), client)),
            _ => None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn levels(&self) -> &[CascadeLevel] {
        &self.levels
    }

    fn last(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Load the first level and apply its `default_match`, if any, which in
    /// turn loads the next level.
    pub async fn load_root(&self) {
        if self.levels.is_empty() {
            return;
        }
        let generation = self.bump(0).await;
        self.load_level(0, generation, None).await;

        let Some(needle) = self.levels[0].default_match.as_deref().map(str::to_lowercase) else {
            return;
        };
        let preset = {
            let state = self.state.lock().await;
            if state.levels[0].selected.is_some() {
                None
            } else {
                state.levels[0]
                    .options
                    .iter()
                    .find(|o| o.label.to_lowercase().contains(&needle))
                    .map(|o| o.value.clone())
            }
        };
        if let Some(value) = preset {
            self.apply(0, Some(value)).await;
        }
    }

    /// Choose `value` at `level`. Every lower level is cleared (which also
    /// empties the bound value) and the next level is loaded for the new
    /// choice.
    pub async fn select(&self, level: usize, value: Option<FieldValue>) {
        if level >= self.levels.len() {
            return;
        }
        self.state.lock().await.touched = true;
        self.apply(level, value).await;
    }

    async fn apply(&self, level: usize, value: Option<FieldValue>) {
        let value = value.filter(|v| !v.is_empty());
        let next_generation = {
            let mut state = self.state.lock().await;
            state.levels[level].selected = value.clone();
            for lower in state.levels.iter_mut().skip(level + 1) {
                lower.selected = None;
                lower.options.clear();
                lower.generation += 1;
            }
            if level < self.last() && value.is_some() {
                Some(state.levels[level + 1].generation)
            } else {
                None
            }
        };
        if let (Some(generation), Some(parent)) = (next_generation, value) {
            self.load_level(level + 1, generation, Some(&parent)).await;
        }
    }

    async fn bump(&self, level: usize) -> u64 {
        let mut state = self.state.lock().await;
        state.levels[level].generation += 1;
        state.levels[level].generation
    }

    /// Fetch `level`'s options and store them if `generation` is still current.
    /// Returns whether the response was applied.
    async fn load_level(&self, level: usize, generation: u64, parent: Option<&FieldValue>) -> bool {
        let def = &self.levels[level];
        let parent_id = parent.and_then(FieldValue::as_path_segment);
        let query: Vec<(&str, &str)> = match (def.parent_param.as_deref(), parent_id.as_deref()) {
            (Some(param), Some(id)) => vec![(param, id)],
            _ => Vec::new(),
        };
        let options = match self.client.get_records_where(&def.endpoint, &query).await {
            Ok(items) => items
                .iter()
                .map(|item| SelectOption {
                    value: item.get(&def.id_field).cloned().unwrap_or_default(),
                    label: item.get(&def.label_field).map(|v| v.to_string()).unwrap_or_default(),
                })
                .collect(),
            Err(e) => {
                warn!(field = %self.field, level = %def.label, error = %e, "cascade level failed to load");
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        let current = &mut state.levels[level];
        if current.generation != generation {
            debug!(
                field = %self.field,
                level = %def.label,
                generation,
                latest = current.generation,
                "discarding stale cascade response"
            );
            return false;
        }
        current.options = options;
        true
    }

    /// Rebuild the whole chain from a stored leaf id, as when opening an edit
    /// form: walk up through each level's `parent_field`, then select top-down.
    pub async fn hydrate(&self, leaf: FieldValue) -> ConsoleResult<()> {
        if self.levels.is_empty() || leaf.is_empty() {
            return Ok(());
        }
        let last = self.last();
        let mut ids = vec![FieldValue::Null; self.levels.len()];
        ids[last] = leaf;
        for level in (1..=last).rev() {
            let def = &self.levels[level];
            let id = ids[level].as_path_segment().unwrap_or_default();
            let item = self.client.get_item(&def.endpoint, &id).await?;
            let parent_field = def.parent_field.as_deref().ok_or_else(|| {
                ConsoleError::Validation(format!("{}: level '{}' has no parent_field", self.field, def.label))
            })?;
            ids[level - 1] = item
                .get(parent_field)
                .cloned()
                .map(FieldValue::from_json)
                .unwrap_or_default();
            if ids[level - 1].is_empty() {
                return Err(ConsoleError::Validation(format!(
                    "{}: '{}' {} has no {}",
                    self.field, def.label, id, parent_field
                )));
            }
        }

        let generation = self.bump(0).await;
        self.load_level(0, generation, None).await;
        for (level, id) in ids.into_iter().enumerate() {
            self.apply(level, Some(id)).await;
        }
        Ok(())
    }

    pub async fn options(&self, level: usize) -> Vec<SelectOption> {
        let state = self.state.lock().await;
        state.levels.get(level).map(|l| l.options.clone()).unwrap_or_default()
    }

    pub async fn selected(&self, level: usize) -> Option<FieldValue> {
        let state = self.state.lock().await;
        state.levels.get(level).and_then(|l| l.selected.clone())
    }

    /// Whether any level was chosen through [`CascadingSelect::select`].
    pub async fn is_touched(&self) -> bool {
        self.state.lock().await.touched
    }

    /// A level can be used once the level above has a choice.
    pub async fn is_enabled(&self, level: usize) -> bool {
        level == 0 || self.selected(level - 1).await.is_some()
    }

    /// The value written to the record: the last level's choice, or empty.
    pub async fn value(&self) -> FieldValue {
        self.selected(self.last()).await.unwrap_or(FieldValue::from(""))
    }

    /// Drop every choice and every lower level's options; root options stay.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.touched = false;
        for (i, level) in state.levels.iter_mut().enumerate() {
            level.selected = None;
            if i > 0 {
                level.options.clear();
                level.generation += 1;
            }
        }
    }
}
