//! Session state: the bearer credentials every request carries, and where
//! they are persisted between runs.

use crate::error::{ConsoleError, ConsoleResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const TOKEN_TYPE_KEY: &str = "token_type";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".into()
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials {
            access_token: token.into(),
            token_type: default_token_type(),
        }
    }
}

/// Persistent key-value storage for session data.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> ConsoleResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> ConsoleResult<()>;
    async fn remove(&self, key: &str) -> ConsoleResult<()>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> ConsoleResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ConsoleResult<()> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> ConsoleResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on every change. A missing file
/// reads as empty.
pub struct FileTokenStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenStore {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    async fn load(&self) -> ConsoleResult<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ConsoleError::Storage(format!("{}: {}", self.path.display(), e))),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> ConsoleResult<()> {
        let text = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| ConsoleError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> ConsoleResult<Option<String>> {
        let _guard = self.lock.read().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> ConsoleResult<()> {
        let _guard = self.lock.write().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> ConsoleResult<()> {
        let _guard = self.lock.write().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

/// Process-wide session. Clones share state; login and logout are the only
/// transitions.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    current: Arc<RwLock<Option<Credentials>>>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Session {
            store,
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Pick up credentials left in the store by an earlier run.
    pub async fn restore(&self) -> ConsoleResult<Option<Credentials>> {
        let token = self.store.get(ACCESS_TOKEN_KEY).await?;
        let restored = match token {
            Some(access_token) if !access_token.is_empty() => {
                let token_type = self
                    .store
                    .get(TOKEN_TYPE_KEY)
                    .await?
                    .unwrap_or_else(default_token_type);
                Some(Credentials {
                    access_token,
                    token_type,
                })
            }
            _ => None,
        };
        *self.current.write().await = restored.clone();
        Ok(restored)
    }

    pub async fn credentials(&self) -> Option<Credentials> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn login(&self, credentials: Credentials) -> ConsoleResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, &credentials.access_token).await?;
        self.store.set(TOKEN_TYPE_KEY, &credentials.token_type).await?;
        *self.current.write().await = Some(credentials);
        tracing::info!("session started");
        Ok(())
    }

    pub async fn logout(&self) -> ConsoleResult<()> {
        *self.current.write().await = None;
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(TOKEN_TYPE_KEY).await?;
        tracing::info!("session cleared");
        Ok(())
    }
}
