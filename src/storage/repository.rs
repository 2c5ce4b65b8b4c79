use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// A persisted record with a string id and an owning user.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table (or collection) name
    const TABLE: &'static str;

    /// Field holding the owner's user id
    const OWNER_FIELD: &'static str = "user_id";

    fn id(&self) -> &str;

    fn owner_id(&self) -> &str;

    /// Timestamp that owner listings are ordered by
    fn sort_key(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Repository trait
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Insert a new record; fails with `Conflict` when the id exists.
    async fn create(&self, entity: &T) -> Result<T>;

    async fn get_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Replace an existing record; `None` when it does not exist.
    async fn update(&self, id: &str, entity: &T) -> Result<Option<T>>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// Records whose top-level `field` equals `value`.
    async fn find_by_field(&self, field: &str, value: &Value) -> Result<Vec<T>>;

    /// Records of one owner ordered by [`Entity::sort_key`].
    async fn list_by_owner(
        &self,
        owner_id: &str,
        order: SortOrder,
        limit: usize,
        start: usize,
    ) -> Result<Vec<T>>;

    async fn count_by_owner(&self, owner_id: &str) -> Result<u64>;

    async fn list_all_by_owner(&self, owner_id: &str, order: SortOrder) -> Result<Vec<T>> {
        self.list_by_owner(owner_id, order, usize::MAX, 0).await
    }

    /// Create or replace.
    async fn upsert(&self, entity: &T) -> Result<T> {
        match self.update(entity.id(), entity).await? {
            Some(updated) => Ok(updated),
            None => self.create(entity).await,
        }
    }
}

/// Order by sort key and cut one page. Equal keys keep their input order.
pub fn sort_and_page<T: Entity>(
    mut items: Vec<T>,
    order: SortOrder,
    limit: usize,
    start: usize,
) -> Vec<T> {
    match order {
        SortOrder::Ascending => items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key())),
        SortOrder::Descending => items.sort_by(|a, b| b.sort_key().cmp(&a.sort_key())),
    }
    items.into_iter().skip(start).take(limit).collect()
}
