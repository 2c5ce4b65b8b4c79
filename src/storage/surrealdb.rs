use async_trait::async_trait;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tracing::info;

use crate::config::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::storage::repository::{Entity, Repository, SortOrder, sort_and_page};

/// Field holding the entity id; the record id itself is never read back.
const KEY_FIELD: &str = "key";

/// SurrealDB connection
#[derive(Clone)]
pub struct SurrealPool {
    db: Surreal<Any>,
    config: DatabaseConfig,
}

impl SurrealPool {
    /// Connect, authenticate when credentials are set, and select namespace
    /// and database.
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let db: Surreal<Any> = connect(&config.url).await?;

        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!(
            "Connected to SurrealDB at {} ({}/{})",
            config.url, config.namespace, config.database
        );

        Ok(Self { db, config })
    }

    pub fn inner(&self) -> Surreal<Any> {
        self.db.clone()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub async fn health_check(&self) -> Result<()> {
        self.db.health().await?;
        Ok(())
    }
}

/// Generic SurrealDB repository
#[derive(Clone)]
pub struct SurrealRepository<T> {
    db: Surreal<Any>,
    _marker: PhantomData<T>,
}

impl<T: Entity> SurrealRepository<T> {
    pub fn new(pool: &SurrealPool) -> Self {
        Self {
            db: pool.inner(),
            _marker: PhantomData,
        }
    }

    fn to_record(entity: &T) -> Result<Value> {
        let mut value = serde_json::to_value(entity)?;
        if let Value::Object(map) = &mut value {
            if let Some(id) = map.remove("id") {
                map.insert(KEY_FIELD.to_string(), id);
            }
        }
        Ok(value)
    }

    fn from_record(value: Value) -> Result<T> {
        let mut map: Map<String, Value> = match value {
            Value::Object(map) => map,
            other => {
                return Err(AppError::Database(format!(
                    "unexpected {} record: {}",
                    T::TABLE,
                    other
                )));
            }
        };
        map.remove("id");
        if let Some(key) = map.remove(KEY_FIELD) {
            map.insert("id".to_string(), key);
        }
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    fn column(field: &str) -> String {
        if field == "id" {
            KEY_FIELD.to_string()
        } else {
            field.to_string()
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for SurrealRepository<T> {
    async fn create(&self, entity: &T) -> Result<T> {
        if self.get_by_id(entity.id()).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "{} {} already exists",
                T::TABLE,
                entity.id()
            )));
        }

        self.db
            .query("CREATE type::thing($table, $id) CONTENT $content RETURN NONE")
            .bind(("table", T::TABLE))
            .bind(("id", entity.id().to_string()))
            .bind(("content", Self::to_record(entity)?))
            .await?
            .check()?;
        Ok(entity.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        let rows: Vec<Value> = self
            .db
            .query("SELECT * OMIT id FROM type::thing($table, $id)")
            .bind(("table", T::TABLE))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        rows.into_iter().next().map(Self::from_record).transpose()
    }

    async fn update(&self, id: &str, entity: &T) -> Result<Option<T>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        self.db
            .query("UPDATE type::thing($table, $id) CONTENT $content RETURN NONE")
            .bind(("table", T::TABLE))
            .bind(("id", id.to_string()))
            .bind(("content", Self::to_record(entity)?))
            .await?
            .check()?;
        Ok(Some(entity.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(false);
        }

        self.db
            .query("DELETE type::thing($table, $id) RETURN NONE")
            .bind(("table", T::TABLE))
            .bind(("id", id.to_string()))
            .await?
            .check()?;
        Ok(true)
    }

    async fn find_by_field(&self, field: &str, value: &Value) -> Result<Vec<T>> {
        let rows: Vec<Value> = self
            .db
            .query("SELECT * OMIT id FROM type::table($table) WHERE type::field($field) = $value")
            .bind(("table", T::TABLE))
            .bind(("field", Self::column(field)))
            .bind(("value", value.clone()))
            .await?
            .take(0)?;
        rows.into_iter().map(Self::from_record).collect()
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        order: SortOrder,
        limit: usize,
        start: usize,
    ) -> Result<Vec<T>> {
        // Timestamps are stored as RFC 3339 strings, which do not sort
        // lexically, so ordering happens after the fetch.
        let owned = self
            .find_by_field(T::OWNER_FIELD, &Value::String(owner_id.to_string()))
            .await?;
        Ok(sort_and_page(owned, order, limit, start))
    }

    async fn count_by_owner(&self, owner_id: &str) -> Result<u64> {
        let result: Vec<Value> = self
            .db
            .query("SELECT count() FROM type::table($table) WHERE type::field($field) = $owner GROUP ALL")
            .bind(("table", T::TABLE))
            .bind(("field", Self::column(T::OWNER_FIELD)))
            .bind(("owner", owner_id.to_string()))
            .await?
            .take(0)?;

        Ok(result
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}
