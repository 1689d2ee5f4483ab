//! Key-value session storage with change notifications.
//!
//! Holds the bearer token, the signed-in user profile and per-user
//! wishlists. Every write is announced on a broadcast channel so other
//! components (wishlist, notification poller) notice sign-in and sign-out.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Key of the bearer token.
pub const TOKEN_KEY: &str = "jwt_token";

/// Key of the signed-in user profile (JSON).
pub const USER_KEY: &str = "user";

const EVENT_CAPACITY: usize = 64;

/// A change to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Set(String),
    Removed(String),
    Cleared,
}

impl StoreEvent {
    /// Whether this event may have changed the value under `key`.
    pub fn touches(&self, key: &str) -> bool {
        match self {
            StoreEvent::Set(k) | StoreEvent::Removed(k) => k == key,
            StoreEvent::Cleared => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Process-wide keyed state.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
    /// Receive every change made after this call.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Volatile store, lost when the process exits.
pub struct MemoryStore {
    entries: DashMap<String, String>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: DashMap::new(),
            events,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        let _ = self.events.send(StoreEvent::Set(key.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            let _ = self.events.send(StoreEvent::Removed(key.to_string()));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.clear();
        let _ = self.events.send(StoreEvent::Cleared);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// Store persisted as a JSON object on disk after every write.
pub struct FileStore {
    path: PathBuf,
    entries: DashMap<String, String>,
    events: broadcast::Sender<StoreEvent>,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading it if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let map: BTreeMap<String, String> = serde_json::from_reader(reader)?;
            for (k, v) in map {
                entries.insert(k, v);
            }
            tracing::debug!(path = ?path, entries = entries.len(), "Loaded session file");
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            path,
            entries,
            events,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let map: BTreeMap<_, _> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, &map)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()?;
        let _ = self.events.send(StoreEvent::Set(key.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
            let _ = self.events.send(StoreEvent::Removed(key.to_string()));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.clear();
        self.persist()?;
        let _ = self.events.send(StoreEvent::Cleared);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
