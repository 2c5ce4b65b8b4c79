//! Storage factory
//!
//! Builds one repository per record type for the configured backend.

use std::sync::Arc;
use tracing::info;

use crate::config::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{ConversationState, HistoryEntry, Message, Notification, Otp, Reminder, User};
use crate::storage::memory::MemoryRepository;
use crate::storage::repository::Repository;

#[cfg(feature = "surrealdb")]
use crate::storage::surrealdb::{SurrealPool, SurrealRepository};

/// Backend behind a [`Repositories`] bundle
#[derive(Clone)]
pub enum StorageBackend {
    Memory,
    #[cfg(feature = "surrealdb")]
    SurrealDB(SurrealPool),
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            #[cfg(feature = "surrealdb")]
            StorageBackend::SurrealDB(_) => "surrealdb",
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        match self {
            StorageBackend::Memory => Ok(()),
            #[cfg(feature = "surrealdb")]
            StorageBackend::SurrealDB(pool) => pool.health_check().await,
        }
    }
}

/// One repository per record type
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn Repository<User>>,
    pub messages: Arc<dyn Repository<Message>>,
    pub history: Arc<dyn Repository<HistoryEntry>>,
    pub reminders: Arc<dyn Repository<Reminder>>,
    pub otps: Arc<dyn Repository<Otp>>,
    pub notifications: Arc<dyn Repository<Notification>>,
    pub conversations: Arc<dyn Repository<ConversationState>>,
    pub backend: StorageBackend,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryRepository::new()),
            messages: Arc::new(MemoryRepository::new()),
            history: Arc::new(MemoryRepository::new()),
            reminders: Arc::new(MemoryRepository::new()),
            otps: Arc::new(MemoryRepository::new()),
            notifications: Arc::new(MemoryRepository::new()),
            conversations: Arc::new(MemoryRepository::new()),
            backend: StorageBackend::Memory,
        }
    }

    #[cfg(feature = "surrealdb")]
    pub fn surreal(pool: SurrealPool) -> Self {
        Self {
            users: Arc::new(SurrealRepository::new(&pool)),
            messages: Arc::new(SurrealRepository::new(&pool)),
            history: Arc::new(SurrealRepository::new(&pool)),
            reminders: Arc::new(SurrealRepository::new(&pool)),
            otps: Arc::new(SurrealRepository::new(&pool)),
            notifications: Arc::new(SurrealRepository::new(&pool)),
            conversations: Arc::new(SurrealRepository::new(&pool)),
            backend: StorageBackend::SurrealDB(pool),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Storage factory
pub struct StorageFactory;

impl StorageFactory {
    /// Create repositories for the configured backend
    pub async fn create(config: &DatabaseConfig) -> Result<Repositories> {
        if config.is_memory() {
            info!("Using in-memory storage");
            return Ok(Repositories::in_memory());
        }
        Self::create_persistent(config).await
    }

    #[cfg(feature = "surrealdb")]
    async fn create_persistent(config: &DatabaseConfig) -> Result<Repositories> {
        let pool = SurrealPool::new(config.clone()).await?;
        Ok(Repositories::surreal(pool))
    }

    #[cfg(not(feature = "surrealdb"))]
    async fn create_persistent(config: &DatabaseConfig) -> Result<Repositories> {
        Err(crate::error::AppError::Config(format!(
            "database url {} needs the 'surrealdb' feature; use \"memory\" instead",
            config.url
        )))
    }
}
