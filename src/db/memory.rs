//! In-process store used by the handler tests.

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DbInfo, ProductStore};
use crate::error::{AppError, AppResult};
use crate::models::Product;

#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<IndexMap<Uuid, Product>>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails like an unreachable database.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    fn ensure_online(&self) -> AppResult<()> {
        if self.offline {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Product>> {
        self.ensure_online()?;
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Product>> {
        self.ensure_online()?;
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, product: &Product) -> AppResult<Product> {
        self.ensure_online()?;
        self.rows.write().await.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn update(&self, product: &Product) -> AppResult<Option<Product>> {
        self.ensure_online()?;
        let mut rows = self.rows.write().await;
        let Some(row) = rows.get_mut(&product.id) else {
            return Ok(None);
        };

        let created_at = row.created_at;
        *row = Product {
            id: row.id,
            created_at,
            updated_at: Some(Utc::now().max(created_at)),
            ..product.clone()
        };
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        self.ensure_online()?;
        Ok(self.rows.write().await.shift_remove(&id).is_some())
    }

    async fn check(&self) -> AppResult<DbInfo> {
        self.ensure_online()?;
        Ok(DbInfo {
            database: "memory".to_string(),
            server_addr: None,
        })
    }
}
