use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use crate::models::Product;

#[cfg(test)]
pub mod memory;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, quantity, created_at, updated_at";

const CREATE_PRODUCT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS product (
    id          UUID PRIMARY KEY,
    name        VARCHAR(255) NOT NULL,
    description TEXT,
    price       NUMERIC(10, 2),
    quantity    INTEGER,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ
)
"#;

/// `host()` strips the `/32` or `/128` mask the bare `inet` text would carry.
const CONNECTION_INFO: &str = "SELECT current_database()::text, host(inet_server_addr())";

/// Where the service is connected, as reported by the server itself.
#[derive(Debug, Clone)]
pub struct DbInfo {
    pub database: String,
    pub server_addr: Option<String>,
}

/// Persistence operations the handlers depend on.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Product>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn insert(&self, product: &Product) -> AppResult<Product>;

    /// Overwrite the mutable columns of `product.id` and stamp `updated_at`.
    /// Returns `None` if the row no longer exists.
    async fn update(&self, product: &Product) -> AppResult<Option<Product>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn check(&self) -> AppResult<DbInfo>;
}

/// Lazily connected pool; the first query opens the first connection.
pub fn connect(config: &DatabaseConfig) -> PgPool {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name);

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy_with(options)
}

pub async fn bootstrap_schema(pool: &PgPool) -> AppResult<()> {
    sqlx::query(CREATE_PRODUCT_TABLE).execute(pool).await?;
    info!("Product table ready.");
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn insert(&self, product: &Product) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO product (id, name, description, price, quantity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.quantity)
        .bind(product.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn update(&self, product: &Product) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE product
            SET name        = $2,
                description = $3,
                price       = $4,
                quantity    = $5,
                updated_at  = GREATEST($6, created_at)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.quantity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn check(&self) -> AppResult<DbInfo> {
        let (database, server_addr): (String, Option<String>) =
            sqlx::query_as(CONNECTION_INFO)
                .fetch_one(&self.pool)
                .await?;

        Ok(DbInfo {
            database,
            server_addr,
        })
    }
}
