//! User accounts.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};

use crate::models::ModelError;

pub type UserId = i64;

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

/// User store consulted by the authentication pipeline.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Whether a user with this ID still exists.
    async fn exists(&self, id: UserId) -> Result<bool, ModelError>;

    /// Register a user. Fails with [`ModelError::DuplicateEmail`] when the email is taken.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<UserId, ModelError>;

    /// Check credentials, returning the user's ID or [`ModelError::InvalidCredentials`].
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, ModelError>;
}

/// In-memory user store with Argon2 password hashes.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<UserId, User>>,
    by_email: Arc<DashMap<String, UserId>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, leaving any sessions that reference it stale.
    pub fn remove(&self, id: UserId) -> Option<User> {
        let (_, user) = self.users.remove(&id)?;
        self.by_email.remove(&email_key(&user.email));
        Some(user)
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: &str) -> Result<String, ModelError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ModelError::Backend(format!("hash password: {e}")))
    })
    .await
    .map_err(|e| ModelError::Backend(format!("hash task failed: {e}")))?
}

async fn verify_password(password: &str, hash: &str) -> Result<bool, ModelError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| ModelError::Backend(format!("parse hash: {e}")))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| ModelError::Backend(format!("verify task failed: {e}")))?
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn exists(&self, id: UserId) -> Result<bool, ModelError> {
        Ok(self.users.contains_key(&id))
    }

    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<UserId, ModelError> {
        let hashed_password = hash_password(password).await?;

        let id = match self.by_email.entry(email_key(email)) {
            Entry::Occupied(_) => return Err(ModelError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(id);
                id
            }
        };

        self.users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                hashed_password,
                created: Utc::now(),
            },
        );

        tracing::info!(user_id = id, "User registered");
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, ModelError> {
        let Some(id) = self.by_email.get(&email_key(email)).map(|entry| *entry.value()) else {
            return Err(ModelError::InvalidCredentials);
        };

        let Some(hash) = self.users.get(&id).map(|user| user.hashed_password.clone()) else {
            return Err(ModelError::InvalidCredentials);
        };

        if verify_password(password, &hash).await? {
            Ok(id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }
}
