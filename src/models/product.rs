use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const NAME_MAX_CHARS: usize = 255;

/// Largest magnitude a `NUMERIC(10,2)` column accepts is 99 999 999.99.
const PRICE_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Core product entity, one row of the `product` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Fixed-point price; rendered as a JSON number at the boundary.
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Merge a partial update into this product. Absent fields keep their
    /// value, explicit nulls clear optional columns.
    pub fn apply(&mut self, update: UpdateProduct) -> AppResult<()> {
        if let Some(name) = update.name {
            let name = name.ok_or_else(|| AppError::BadRequest("'name' cannot be null".to_string()))?;
            self.name = validate_name(name)?;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price.map(validate_price).transpose()?;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        Ok(())
    }
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
}

impl TryFrom<Map<String, Value>> for CreateProduct {
    type Error = AppError;

    fn try_from(body: Map<String, Value>) -> AppResult<Self> {
        decode(body)
    }
}

impl CreateProduct {
    /// Validate the payload and mint a new product with a fresh id.
    pub fn into_product(self) -> AppResult<Product> {
        let name = self
            .name
            .ok_or_else(|| AppError::BadRequest("Missing required field 'name'".to_string()))?;

        Ok(Product {
            id: Uuid::new_v4(),
            name: validate_name(name)?,
            description: self.description,
            price: self.price.map(validate_price).transpose()?,
            quantity: Some(self.quantity.unwrap_or(0)),
            created_at: Utc::now(),
            updated_at: None,
        })
    }
}

/// Partial update. The outer `Option` records presence of the key, the inner
/// one whether it was `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_price")]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present")]
    pub quantity: Option<Option<i32>>,
}

/// Keys outside the payload are ignored; only an empty object carries no update.
impl TryFrom<Map<String, Value>> for UpdateProduct {
    type Error = AppError;

    fn try_from(body: Map<String, Value>) -> AppResult<Self> {
        if body.is_empty() {
            return Err(AppError::BadRequest("No update data provided".to_string()));
        }
        decode(body)
    }
}

fn decode<T: DeserializeOwned>(body: Map<String, Value>) -> AppResult<T> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present_price<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: Deserializer<'de>,
{
    rust_decimal::serde::float_option::deserialize(deserializer).map(Some)
}

fn validate_name(name: String) -> AppResult<String> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("'name' must not be empty".to_string()));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "'name' must be at most {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(name)
}

fn validate_price(price: Decimal) -> AppResult<Decimal> {
    let price = price.round_dp(2);
    if price.abs() >= PRICE_LIMIT {
        return Err(AppError::BadRequest(
            "'price' must be below 100000000".to_string(),
        ));
    }
    Ok(price)
}
