//! Session persistence.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;

/// Errors from a session backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session backend unavailable: {0}")]
    Backend(String),

    #[error("session value could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Data held for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

/// Backend for server-side session state.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load an unexpired record by token.
    async fn load(&self, token: &str) -> Result<Option<Record>, StoreError>;

    /// Insert or replace the record for `token`.
    async fn save(&self, token: &str, record: &Record, expiry: DateTime<Utc>) -> Result<(), StoreError>;

    async fn delete(&self, token: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    expiry: DateTime<Utc>,
}

/// In-memory session store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired record.
    pub fn remove_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expiry > now);
        before.saturating_sub(self.entries.len())
    }

    /// Periodically sweep expired records until the returned handle is aborted.
    pub fn spawn_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = store.remove_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Expired sessions swept");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, token: &str) -> Result<Option<Record>, StoreError> {
        let Some(entry) = self.entries.get(token).map(|e| e.value().clone()) else {
            return Ok(None);
        };

        if entry.expiry <= Utc::now() {
            self.entries.remove(token);
            return Ok(None);
        }

        Ok(Some(entry.record))
    }

    async fn save(&self, token: &str, record: &Record, expiry: DateTime<Utc>) -> Result<(), StoreError> {
        self.entries.insert(
            token.to_string(),
            Entry {
                record: record.clone(),
                expiry,
            },
        );
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.entries.remove(token);
        Ok(())
    }
}
