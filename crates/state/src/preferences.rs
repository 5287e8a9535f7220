//! Persisted user preferences

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use vernal_errors::{Error, StateError};

/// Set once an installation finished; decides the state at start-up
pub const COMPLETE_KEY: &str = "complete";

/// Overrides the selected server's base URL
pub const PRODUCTION_URL_KEY: &str = "production url";

/// Small key/value store that survives restarts
#[async_trait]
pub trait Preferences: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    async fn bool(&self, key: &str) -> Result<Option<bool>, Error>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    async fn set_bool(&self, key: &str, value: bool) -> Result<(), Error>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    async fn string(&self, key: &str) -> Result<Option<String>, Error>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    async fn set_string(&self, key: &str, value: &str) -> Result<(), Error>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    async fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Preferences stored as one JSON object on disk.
///
/// Writes go to a sibling temp file that is renamed over the original.
/// A missing file reads as empty.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FilePreferences {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, Value>, Error> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StateError::PreferencesRead {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        };
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&contents).map_err(|e| {
            StateError::PreferencesCorrupted {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    async fn store(&self, values: &BTreeMap<String, Value>) -> Result<(), Error> {
        let write_err = |e: &dyn std::fmt::Display| -> Error {
            StateError::PreferencesWrite {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| write_err(&e))?;
        }
        let body = serde_json::to_vec_pretty(values).map_err(|e| write_err(&e))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, body).await.map_err(|e| write_err(&e))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| write_err(&e))
    }

    async fn modify<F>(&self, change: F) -> Result<(), Error>
    where
        F: FnOnce(&mut BTreeMap<String, Value>) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        change(&mut values);
        self.store(&values).await?;
        tracing::debug!(path = %self.path.display(), "preferences written");
        Ok(())
    }
}

#[async_trait]
impl Preferences for FilePreferences {
    async fn bool(&self, key: &str) -> Result<Option<bool>, Error> {
        Ok(self.load().await?.get(key).and_then(Value::as_bool))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), Error> {
        let key = key.to_string();
        self.modify(move |values| {
            values.insert(key, Value::Bool(value));
        })
        .await
    }

    async fn string(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self
            .load()
            .await?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();
        self.modify(move |values| {
            values.insert(key, Value::String(value));
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.modify(move |values| {
            values.remove(&key);
        })
        .await
    }
}

/// In-memory preferences for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, Value>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `complete` already set to `value`
    #[must_use]
    pub fn with_complete(value: bool) -> Self {
        let prefs = Self::default();
        prefs.put(COMPLETE_KEY, Value::Bool(value));
        prefs
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: Value) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

#[async_trait]
impl Preferences for MemoryPreferences {
    async fn bool(&self, key: &str) -> Result<Option<bool>, Error> {
        Ok(self.get(key).and_then(|v| v.as_bool()))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), Error> {
        self.put(key, Value::Bool(value));
        Ok(())
    }

    async fn string(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.get(key).and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), Error> {
        self.put(key, Value::String(value.to_string()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
