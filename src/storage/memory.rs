//! In-process storage backend
//!
//! Used when `database.url = "memory"` and by tests. Data lives for the
//! lifetime of the process.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{AppError, Result};
use crate::storage::repository::{Entity, Repository, SortOrder, sort_and_page};

/// DashMap-backed repository
pub struct MemoryRepository<T: Entity> {
    /// id -> (insertion sequence, record)
    items: DashMap<String, (u64, T)>,
    next_seq: AtomicU64,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Matching records in insertion order.
    fn collect(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut matched: Vec<(u64, T)> = self
            .items
            .iter()
            .filter(|entry| predicate(&entry.value().1))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        matched.into_iter().map(|(_, item)| item).collect()
    }
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn create(&self, entity: &T) -> Result<T> {
        use dashmap::mapref::entry::Entry;

        match self.items.entry(entity.id().to_string()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "{} {} already exists",
                T::TABLE,
                entity.id()
            ))),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert((seq, entity.clone()));
                Ok(entity.clone())
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        Ok(self.items.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn update(&self, id: &str, entity: &T) -> Result<Option<T>> {
        Ok(self.items.get_mut(id).map(|mut entry| {
            entry.value_mut().1 = entity.clone();
            entity.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.items.remove(id).is_some())
    }

    async fn find_by_field(&self, field: &str, value: &Value) -> Result<Vec<T>> {
        let mut failure = None;
        let found = self.collect(|item| match serde_json::to_value(item) {
            Ok(json) => json.get(field) == Some(value),
            Err(e) => {
                failure = Some(e);
                false
            }
        });
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(found),
        }
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        order: SortOrder,
        limit: usize,
        start: usize,
    ) -> Result<Vec<T>> {
        let owned = self.collect(|item| item.owner_id() == owner_id);
        Ok(sort_and_page(owned, order, limit, start))
    }

    async fn count_by_owner(&self, owner_id: &str) -> Result<u64> {
        Ok(self
            .items
            .iter()
            .filter(|entry| entry.value().1.owner_id() == owner_id)
            .count() as u64)
    }
}
