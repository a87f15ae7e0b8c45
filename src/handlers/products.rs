use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    handlers::JsonObject,
    models::{CreateProduct, Product, UpdateProduct},
    AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// Malformed ids cannot name a stored product, so they are not-found too.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = state.store.list().await?;
    info!(count = products.len(), "Listed products");
    Ok(Json(products))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let id = parse_id(&id)?;
    let product = state.store.get(id).await?.ok_or_else(not_found)?;
    Ok(Json(product))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let product = CreateProduct::try_from(body)?.into_product()?;
    let product = state.store.insert(&product).await?;

    info!(id = %product.id, name = %product.name, "Created product");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "product": product,
        })),
    ))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonObject, AppError>,
) -> AppResult<Json<serde_json::Value>> {
    let id = parse_id(&id)?;
    let mut product = state.store.get(id).await?.ok_or_else(not_found)?;

    // Existence is checked first so an unknown id reports 404 even without a body.
    let JsonObject(body) = body?;
    product.apply(UpdateProduct::try_from(body)?)?;

    let product = state.store.update(&product).await?.ok_or_else(not_found)?;

    info!(id = %id, "Updated product");

    Ok(Json(json!({
        "message": "Product updated successfully",
        "product": product,
    })))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let id = parse_id(&id)?;
    if !state.store.delete(id).await? {
        return Err(not_found());
    }

    info!(id = %id, "Deleted product");

    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
