//! Snippet records.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::models::ModelError;

/// Number of snippets returned by [`SnippetStore::latest`].
pub const LATEST_LIMIT: usize = 10;

/// A stored text snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// Record store for snippets.
#[async_trait]
pub trait SnippetStore: Send + Sync + 'static {
    /// The most recently created unexpired snippets, newest first.
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError>;

    /// Fetch an unexpired snippet by ID.
    async fn get(&self, id: i64) -> Result<Snippet, ModelError>;

    /// Store a new snippet that expires after `expires_days` days, returning its ID.
    async fn insert(&self, title: &str, content: &str, expires_days: i64) -> Result<i64, ModelError>;
}

/// A thread-safe in-memory snippet store.
#[derive(Clone, Default)]
pub struct MemorySnippetStore {
    records: Arc<DashMap<i64, Snippet>>,
    next_id: Arc<AtomicI64>,
}

impl MemorySnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SnippetStore for MemorySnippetStore {
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError> {
        let now = Utc::now();
        let mut snippets: Vec<Snippet> = self
            .records
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value().clone())
            .collect();

        snippets.sort_by(|a, b| b.id.cmp(&a.id));
        snippets.truncate(LATEST_LIMIT);
        Ok(snippets)
    }

    async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        match self.records.get(&id) {
            Some(entry) if !entry.is_expired(Utc::now()) => Ok(entry.value().clone()),
            _ => Err(ModelError::NoRecord),
        }
    }

    async fn insert(&self, title: &str, content: &str, expires_days: i64) -> Result<i64, ModelError> {
        let lifetime = Duration::try_days(expires_days)
            .ok_or_else(|| ModelError::Backend(format!("expiry out of range: {expires_days} days")))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Utc::now();
        let snippet = Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + lifetime,
        };

        self.records.insert(id, snippet);
        tracing::debug!(snippet_id = id, expires_days, "Snippet stored");
        Ok(id)
    }
}
