//! Interaction history service

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::HistoryEntry;
use crate::storage::repository::{Repository, SortOrder};

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number, from 1
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

impl Pagination {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Items before this page; saturates for pages far past the end.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn is_valid(&self) -> bool {
        self.page > 0 && self.per_page > 0
    }

    /// Number of pages holding `total` items.
    pub fn pages(&self, total: u64) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        total.div_ceil(self.per_page)
    }
}

/// One page of history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub data: Vec<HistoryEntry>,
    pub total: u64,
    pub pages: u64,
    pub page: u64,
}

/// Interaction to record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHistoryEntry {
    pub user_message: String,
    pub bot_reply: String,
    pub detected_intent: Option<String>,
    pub confidence: Option<f64>,
}

#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn record(&self, user_id: &str, entry: NewHistoryEntry) -> Result<HistoryEntry>;

    /// Entries of a user, newest first.
    async fn list(&self, user_id: &str, pagination: Pagination) -> Result<HistoryPage>;
}

pub struct HistoryServiceImpl {
    repository: Arc<dyn Repository<HistoryEntry>>,
    clock: Arc<dyn Clock>,
}

impl HistoryServiceImpl {
    pub fn new(repository: Arc<dyn Repository<HistoryEntry>>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl HistoryService for HistoryServiceImpl {
    async fn record(&self, user_id: &str, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let entry = HistoryEntry::new(
            user_id,
            &entry.user_message,
            &entry.bot_reply,
            entry.detected_intent,
            entry.confidence,
            self.clock.now(),
        );
        self.repository.create(&entry).await
    }

    async fn list(&self, user_id: &str, pagination: Pagination) -> Result<HistoryPage> {
        let total = self.repository.count_by_owner(user_id).await?;
        let data = self
            .repository
            .list_by_owner(
                user_id,
                SortOrder::Descending,
                pagination.per_page as usize,
                pagination.offset() as usize,
            )
            .await?;

        Ok(HistoryPage {
            data,
            total,
            pages: pagination.pages(total),
            page: pagination.page,
        })
    }
}

pub fn create_history_service(
    repository: Arc<dyn Repository<HistoryEntry>>,
    clock: Arc<dyn Clock>,
) -> Arc<dyn HistoryService> {
    Arc::new(HistoryServiceImpl::new(repository, clock))
}
